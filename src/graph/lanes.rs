//! Incremental lane assignment for commit graphs.
//!
//! Commits are fed one at a time, children before parents (the order produced
//! by `git log --topo-order`). Each lane holds the commit it expects to see
//! next; when that commit arrives it takes over the leftmost lane waiting for
//! it and hands the lane down to its first parent. Extra parents (merges) get
//! a lane of their own unless another child already reserved one for them.
//!
//! ```
//! use git_weave::graph::{LaneConfig, LaneGenerator};
//!
//! let mut lanes = LaneGenerator::new(LaneConfig::default());
//! let tip = lanes.step(&"c", &["b"]);
//! let middle = lanes.step(&"b", &["a"]);
//! let root = lanes.step(&"a", &[]);
//!
//! assert_eq!((tip.lane, middle.lane, root.lane), (0, 0, 0));
//! assert!(root.below.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Default truncation bound for the snapshots stored in a [`LaneFrame`].
pub const DEFAULT_MAX_LANES: usize = 64;

/// Lane allocation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneConfig {
    /// Snapshots in each [`LaneFrame`] are cut off after this many lanes.
    pub max_lanes: usize,
    /// Never reuse a vacant lane for a new branch tip; always grow to the right.
    pub force_rightmost: bool,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            max_lanes: DEFAULT_MAX_LANES,
            force_rightmost: false,
        }
    }
}

/// Drawing data for one row of the graph.
///
/// `above` is the lane occupancy between the previous row and this one,
/// `below` the occupancy between this row and the next. A `None` entry is a
/// vacant lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneFrame<Id> {
    pub lane: usize,
    pub above: Vec<Option<Id>>,
    pub below: Vec<Option<Id>>,
}

/// Streaming lane allocator for one traversal.
#[derive(Debug)]
pub struct LaneGenerator<Id> {
    config: LaneConfig,
    lanes: Vec<Option<Id>>,
    lane_lookup: HashMap<Id, BTreeSet<usize>>,
    free_lanes: BTreeSet<usize>,
    previous: Vec<Option<Id>>,
    finished: HashSet<Id>,
}

impl<Id> LaneGenerator<Id>
where
    Id: Clone + Eq + Hash,
{
    pub fn new(config: LaneConfig) -> Self {
        Self {
            config,
            lanes: Vec::new(),
            lane_lookup: HashMap::new(),
            free_lanes: BTreeSet::new(),
            previous: Vec::new(),
            finished: HashSet::new(),
        }
    }

    pub fn config(&self) -> LaneConfig {
        self.config
    }

    /// Current lane occupancy (untruncated).
    pub fn lanes(&self) -> &[Option<Id>] {
        &self.lanes
    }

    /// Number of lanes still waiting for a commit.
    pub fn live_lanes(&self) -> usize {
        self.lanes.iter().filter(|lane| lane.is_some()).count()
    }

    /// Vacant lanes available for reuse, in ascending order.
    pub fn free_lanes(&self) -> impl Iterator<Item = usize> + '_ {
        self.free_lanes.iter().copied()
    }

    /// Forget everything and start a new traversal.
    pub fn reset(&mut self) {
        self.lanes.clear();
        self.lane_lookup.clear();
        self.free_lanes.clear();
        self.previous.clear();
        self.finished.clear();
    }

    /// Place `commit` and reserve lanes for its parents.
    ///
    /// # Panics
    ///
    /// Panics when a commit is visited twice, when one of `parents` was
    /// already visited, or when the free-lane bookkeeping breaks. All of them
    /// mean the caller fed commits out of topological order.
    pub fn step(&mut self, commit: &Id, parents: &[Id]) -> LaneFrame<Id> {
        assert!(
            self.finished.insert(commit.clone()),
            "commit visited twice in one traversal"
        );
        assert!(
            parents.iter().all(|parent| !self.finished.contains(parent)),
            "parent visited before its child"
        );

        let has_parents = !parents.is_empty();

        let my_lane = match self.lane_lookup.remove(commit) {
            Some(waiting) => {
                let my_lane = waiting.first().copied().unwrap_or(self.lanes.len());
                for &lane in &waiting {
                    debug_assert!(self.lanes[lane].as_ref() == Some(commit));
                    self.lanes[lane] = None;
                    if lane != my_lane || !has_parents {
                        self.free_lanes.insert(lane);
                    }
                }
                if waiting.len() > 1 {
                    log::trace!("merging {} lanes into lane {my_lane}", waiting.len());
                }
                my_lane
            }
            // Isolated commit: nothing will ever claim this lane again.
            None if !has_parents => self.lanes.len(),
            None => self.find_free_lane(),
        };

        if let Some((first, rest)) = parents.split_first() {
            self.occupy(my_lane, first);

            for parent in rest {
                if self
                    .lane_lookup
                    .get(parent)
                    .is_some_and(|waiting| !waiting.is_empty())
                {
                    continue;
                }
                let lane = self.find_free_lane();
                self.occupy(lane, parent);
            }
        }

        while matches!(self.lanes.last(), Some(None)) {
            self.lanes.pop();
            let freed = self.free_lanes.pop_last();
            assert_eq!(
                freed,
                Some(self.lanes.len()),
                "trailing vacant lane missing from the free list"
            );
        }

        let below: Vec<Option<Id>> = self
            .lanes
            .iter()
            .take(self.config.max_lanes)
            .cloned()
            .collect();
        let above = std::mem::replace(&mut self.previous, below.clone());

        LaneFrame {
            lane: my_lane,
            above,
            below,
        }
    }

    fn occupy(&mut self, lane: usize, parent: &Id) {
        self.lanes[lane] = Some(parent.clone());
        self.lane_lookup
            .entry(parent.clone())
            .or_default()
            .insert(lane);
    }

    fn find_free_lane(&mut self) -> usize {
        if !self.config.force_rightmost
            && let Some(lane) = self.free_lanes.pop_first()
        {
            return lane;
        }
        self.lanes.push(None);
        let lane = self.lanes.len() - 1;
        log::trace!("allocated new lane {lane}");
        lane
    }
}
