//! Two-pass traversal driver producing graph rows.
//!
//! The hidden-commit pass runs first and is the only writer of the hidden
//! set; the lane pass then owns the rows and their frames. Both passes see
//! the history in the same order.

use super::{HiddenCommitSolver, LaneConfig, LaneFrame, LaneGenerator};
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

/// Which pass a [`Progress`] report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Hidden,
    Lanes,
}

/// Progress report handed to the traversal callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub pass: Pass,
    pub done: usize,
    pub total: usize,
}

/// Everything the traversal needs besides the history itself.
#[derive(Debug, Clone)]
pub struct WalkOptions<Id> {
    pub lanes: LaneConfig,
    /// Branch tips whose exclusive ancestry is left out of the graph.
    pub hide: Vec<Id>,
    /// Commits kept visible even when only hidden commits reach them.
    pub show: Vec<Id>,
    /// Report progress every this many commits. Zero disables reporting.
    pub progress_interval: usize,
}

impl<Id> Default for WalkOptions<Id> {
    fn default() -> Self {
        Self {
            lanes: LaneConfig::default(),
            hide: Vec::new(),
            show: Vec::new(),
            progress_interval: 0,
        }
    }
}

/// One visible commit of the graph.
///
/// `parents` lists only the visible parents, which are the ones the lane
/// engine saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphRow<Id> {
    pub id: Id,
    pub parents: Vec<Id>,
    pub frame: LaneFrame<Id>,
}

/// Lay out `history` (child-before-parent order) into rows.
///
/// `progress` is called every `options.progress_interval` commits of each
/// pass and once at the end of each pass.
pub fn build_graph<Id, F>(
    history: &[(Id, Vec<Id>)],
    options: &WalkOptions<Id>,
    mut progress: F,
) -> Vec<GraphRow<Id>>
where
    Id: Clone + Eq + Hash,
    F: FnMut(Progress),
{
    let hidden = solve_hidden(history, options, &mut progress);
    log::debug!("{} of {} commits hidden", hidden.len(), history.len());

    let mut lanes = LaneGenerator::new(options.lanes);
    let mut rows = Vec::with_capacity(history.len().saturating_sub(hidden.len()));

    for (done, (id, parents)) in history.iter().enumerate() {
        report(&mut progress, options, Pass::Lanes, done, history.len());
        if hidden.contains(id) {
            continue;
        }
        let parents: Vec<Id> = parents
            .iter()
            .filter(|parent| !hidden.contains(*parent))
            .cloned()
            .collect();
        let frame = lanes.step(id, &parents);
        rows.push(GraphRow {
            id: id.clone(),
            parents,
            frame,
        });
    }
    progress(Progress {
        pass: Pass::Lanes,
        done: history.len(),
        total: history.len(),
    });

    rows
}

fn solve_hidden<Id, F>(
    history: &[(Id, Vec<Id>)],
    options: &WalkOptions<Id>,
    progress: &mut F,
) -> HashSet<Id>
where
    Id: Clone + Eq + Hash,
    F: FnMut(Progress),
{
    if options.hide.is_empty() {
        return HashSet::new();
    }

    let mut solver = HiddenCommitSolver::new();
    for id in &options.hide {
        solver.hide(id.clone());
    }
    for id in &options.show {
        solver.show(id.clone());
    }

    for (done, (id, parents)) in history.iter().enumerate() {
        // Seeds are all in place up front, so once nothing is pending no
        // later commit can be hidden.
        if solver.done() {
            break;
        }
        report(progress, options, Pass::Hidden, done, history.len());
        solver.feed(id, parents);
    }
    progress(Progress {
        pass: Pass::Hidden,
        done: history.len(),
        total: history.len(),
    });

    solver.into_hidden()
}

fn report<Id, F>(
    progress: &mut F,
    options: &WalkOptions<Id>,
    pass: Pass,
    done: usize,
    total: usize,
) where
    F: FnMut(Progress),
{
    if options.progress_interval > 0 && done > 0 && done % options.progress_interval == 0 {
        progress(Progress { pass, done, total });
    }
}
