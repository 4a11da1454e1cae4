//! Suppression of hidden branches from the graph.
//!
//! Hiding a commit hides the part of its ancestry that no visible commit can
//! reach. Tags are propagated to parents at the moment a commit is fed, so an
//! ancestor can collect competing tags from several descendants before its
//! own turn comes; a visible descendant always wins over a tentative hide.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Pending verdict for a commit that hasn't been fed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideTag {
    /// Inherited from a hidden child; overridden by any visible child.
    MaybeHide,
    /// Explicit request to hide this commit.
    ForceHide,
    /// Reachable from a visible commit, or explicitly kept.
    ForceShow,
}

/// Streaming filter deciding which commits are hidden.
///
/// Feed commits in the same child-before-parent order as the
/// [`LaneGenerator`](super::LaneGenerator).
#[derive(Debug)]
pub struct HiddenCommitSolver<Id> {
    tags: HashMap<Id, HideTag>,
    hidden: HashSet<Id>,
}

impl<Id> Default for HiddenCommitSolver<Id> {
    fn default() -> Self {
        Self {
            tags: HashMap::new(),
            hidden: HashSet::new(),
        }
    }
}

impl<Id> HiddenCommitSolver<Id>
where
    Id: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide `commit` and whatever ancestry only it reaches.
    pub fn hide(&mut self, commit: Id) {
        self.tags.insert(commit, HideTag::ForceHide);
    }

    /// Keep `commit` visible even if it is only reachable from hidden commits.
    pub fn show(&mut self, commit: Id) {
        self.tags.insert(commit, HideTag::ForceShow);
    }

    /// Nothing left to propagate: no further commit can become hidden.
    pub fn done(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn is_hidden(&self, commit: &Id) -> bool {
        self.hidden.contains(commit)
    }

    pub fn hidden(&self) -> &HashSet<Id> {
        &self.hidden
    }

    pub fn into_hidden(self) -> HashSet<Id> {
        self.hidden
    }

    /// Visit `commit`. Returns whether it ended up hidden.
    pub fn feed(&mut self, commit: &Id, parents: &[Id]) -> bool {
        match self.tags.remove(commit) {
            Some(HideTag::MaybeHide | HideTag::ForceHide) => {
                log::trace!("hiding commit with {} parent(s)", parents.len());
                self.hidden.insert(commit.clone());
                for parent in parents {
                    self.tags
                        .entry(parent.clone())
                        .or_insert(HideTag::MaybeHide);
                }
                true
            }
            None | Some(HideTag::ForceShow) => {
                for parent in parents {
                    let tag = self
                        .tags
                        .entry(parent.clone())
                        .or_insert(HideTag::ForceShow);
                    if *tag != HideTag::ForceHide {
                        *tag = HideTag::ForceShow;
                    }
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn solve(
        history: &[(&'static str, &[&'static str])],
        hide: &[&'static str],
        show: &[&'static str],
    ) -> HiddenCommitSolver<&'static str> {
        let mut solver = HiddenCommitSolver::new();
        for commit in hide {
            solver.hide(*commit);
        }
        for commit in show {
            solver.show(*commit);
        }
        for (commit, parents) in history {
            solver.feed(commit, parents);
        }
        solver
    }

    fn sorted(solver: &HiddenCommitSolver<&'static str>) -> Vec<&'static str> {
        let mut hidden: Vec<_> = solver.hidden().iter().copied().collect();
        hidden.sort_unstable();
        hidden
    }

    #[test]
    fn hidden_tip_hides_exclusive_ancestry() {
        let solver = solve(
            &[
                ("main", &["base"]),
                ("topic", &["t1"]),
                ("t1", &["base"]),
                ("base", &[]),
            ],
            &["topic"],
            &[],
        );
        assert_eq!(sorted(&solver), vec!["t1", "topic"]);
        assert!(solver.done());
    }

    #[test]
    fn visible_sibling_keeps_shared_parent() {
        // A and C both have parent B; A is hidden, C isn't.
        let solver = solve(&[("A", &["B"]), ("C", &["B"]), ("B", &[])], &["A"], &[]);
        assert!(solver.is_hidden(&"A"));
        assert!(!solver.is_hidden(&"B"));
        assert!(!solver.is_hidden(&"C"));
    }

    #[test]
    fn visible_child_fed_first_also_keeps_parent() {
        let solver = solve(&[("C", &["B"]), ("A", &["B"]), ("B", &[])], &["A"], &[]);
        assert_eq!(sorted(&solver), vec!["A"]);
    }

    #[test]
    fn force_hide_beats_visible_child() {
        // B is hidden on request even though C is visible, and B's own
        // ancestry follows it.
        let solver = solve(&[("C", &["B"]), ("B", &["root"]), ("root", &[])], &["B"], &[]);
        assert_eq!(sorted(&solver), vec!["B", "root"]);
    }

    #[test]
    fn show_override_keeps_commit_inside_hidden_branch() {
        let solver = solve(
            &[("tip", &["mid"]), ("mid", &["low"]), ("low", &[])],
            &["tip"],
            &["mid"],
        );
        assert_eq!(sorted(&solver), vec!["tip"]);
    }

    #[test]
    fn hidden_merge_hides_both_parent_chains() {
        let solver = solve(
            &[
                ("main", &["root"]),
                ("merge", &["left", "right"]),
                ("left", &["root"]),
                ("right", &["root"]),
                ("root", &[]),
            ],
            &["merge"],
            &[],
        );
        assert_eq!(sorted(&solver), vec!["left", "merge", "right"]);
    }

    #[test]
    fn untagged_history_is_done_only_after_last_parent() {
        let mut solver = HiddenCommitSolver::new();
        assert!(solver.done());
        solver.feed(&"b", &["a"]);
        assert!(!solver.done());
        solver.feed(&"a", &[]);
        assert!(solver.done());
        assert!(solver.hidden().is_empty());
    }
}
