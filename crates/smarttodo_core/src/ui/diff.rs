//! Incremental list updates for task rows.
//!
//! # Responsibility
//! - Decide when two rows show the same task and when its content changed.
//! - Compute an ordered op list turning the old rows into the new rows.
//!
//! # Invariants
//! - Ops are emitted as removes (descending), moves, inserts (ascending),
//!   then changes; each index refers to the list as it is at that op.
//! - Only tasks outside the longest run already in target order are moved.

use crate::model::task::{Task, TaskId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Which part of a row must be redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangePayload {
    /// Only the completion flag changed.
    Completion,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiffOp {
    Remove { index: usize },
    /// Remove at `from`, then insert at `to`.
    Move { from: usize, to: usize },
    /// Insert `new[index]` at `index`.
    Insert { index: usize },
    /// Rebind row `index` from `new[index]`.
    Change { index: usize, payload: ChangePayload },
}

/// Identity and content rules for task rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskDiffCallback;

impl TaskDiffCallback {
    /// Rows show the same task when both carry the same id.
    pub fn are_items_the_same(&self, old: &Task, new: &Task) -> bool {
        old.id.is_some() && old.id == new.id
    }

    pub fn are_contents_the_same(&self, old: &Task, new: &Task) -> bool {
        old.same_content(new)
    }

    /// `None` when nothing visible changed.
    pub fn change_payload(&self, old: &Task, new: &Task) -> Option<ChangePayload> {
        if self.are_contents_the_same(old, new) {
            None
        } else if old.is_completed != new.is_completed && old.toggled().same_content(new) {
            Some(ChangePayload::Completion)
        } else {
            Some(ChangePayload::Full)
        }
    }
}

/// Ordered edit script between two task lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListDiff {
    pub ops: Vec<DiffOp>,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Replays the ops on `old`, sourcing inserted and changed rows from `new`.
    ///
    /// Returns `None` when an op points outside the lists, i.e. the lists are
    /// not the pair this diff was computed from.
    pub fn apply(&self, old: &[Task], new: &[Task]) -> Option<Vec<Task>> {
        let mut rows = old.to_vec();
        for op in &self.ops {
            match *op {
                DiffOp::Remove { index } => {
                    if index >= rows.len() {
                        return None;
                    }
                    rows.remove(index);
                }
                DiffOp::Move { from, to } => {
                    if from >= rows.len() || to >= rows.len() {
                        return None;
                    }
                    let row = rows.remove(from);
                    rows.insert(to, row);
                }
                DiffOp::Insert { index } => {
                    if index > rows.len() {
                        return None;
                    }
                    rows.insert(index, new.get(index)?.clone());
                }
                DiffOp::Change { index, .. } => {
                    *rows.get_mut(index)? = new.get(index)?.clone();
                }
            }
        }
        Some(rows)
    }
}

/// Computes the edit script from `old` to `new`.
pub fn diff_tasks(old: &[Task], new: &[Task]) -> ListDiff {
    let callback = TaskDiffCallback;
    let mut ops = Vec::new();

    let new_positions: HashMap<TaskId, usize> = new
        .iter()
        .enumerate()
        .filter_map(|(index, task)| task.id.map(|id| (id, index)))
        .collect();
    let survives = |task: &Task| {
        task.id
            .and_then(|id| new_positions.get(&id))
            .is_some_and(|&index| callback.are_items_the_same(task, &new[index]))
    };

    for (index, task) in old.iter().enumerate().rev() {
        if !survives(task) {
            ops.push(DiffOp::Remove { index });
        }
    }

    // Survivors in their current order, keyed by target position.
    let mut working: Vec<usize> = old
        .iter()
        .filter(|&task| survives(task))
        .filter_map(|task| task.id.and_then(|id| new_positions.get(&id).copied()))
        .collect();
    let stable: HashSet<usize> = longest_increasing_run(&working).into_iter().collect();

    let mut targets = working.clone();
    targets.sort_unstable();
    for (rank, &target) in targets.iter().enumerate() {
        if stable.contains(&target) {
            continue;
        }
        let Some(from) = working.iter().position(|&pos| pos == target) else {
            continue;
        };
        working.remove(from);
        let to = match rank.checked_sub(1).map(|prev| targets[prev]) {
            Some(prev_target) => working
                .iter()
                .position(|&pos| pos == prev_target)
                .map_or(0, |index| index + 1),
            None => 0,
        };
        working.insert(to, target);
        ops.push(DiffOp::Move { from, to });
    }

    let surviving: HashSet<usize> = targets.iter().copied().collect();
    for index in 0..new.len() {
        if !surviving.contains(&index) {
            ops.push(DiffOp::Insert { index });
        }
    }

    let mut changes: Vec<DiffOp> = old
        .iter()
        .filter(|&task| survives(task))
        .filter_map(|old_task| {
            let index = old_task.id.and_then(|id| new_positions.get(&id).copied())?;
            callback
                .change_payload(old_task, &new[index])
                .map(|payload| DiffOp::Change { index, payload })
        })
        .collect();
    changes.sort_by_key(|op| match op {
        DiffOp::Change { index, .. } => *index,
        _ => usize::MAX,
    });
    ops.extend(changes);

    ListDiff { ops }
}

/// Values of one longest strictly increasing subsequence of `values`.
fn longest_increasing_run(values: &[usize]) -> Vec<usize> {
    // tails[k] = index into `values` of the smallest tail of a run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut parents: Vec<Option<usize>> = vec![None; values.len()];

    for (index, &value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&tail| values[tail] < value);
        if slot > 0 {
            parents[index] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(index);
        } else {
            tails[slot] = index;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        run.push(values[index]);
        cursor = parents[index];
    }
    run.reverse();
    run
}
