//! Deferred work
//!
//! The controller never sleeps. Follow-up work is handed to a `Scheduler` as a
//! `Task` and delivered back through `EvasionController::on_task` once its
//! delay has elapsed. Tasks cannot be cancelled; each one re-checks the
//! controller state when it runs.

use std::collections::BinaryHeap;
use std::cmp::Reverse;

/// Follow-up work the controller can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    /// Settle delay after an activation has elapsed; move the control
    Reposition,
    /// Hover delay has elapsed; move if the pointer is still on the control
    HoverCheck,
    /// A reposition transition has finished
    TransitionEnd,
    /// Terminal sequence: take the control off the page
    Detach,
}

/// Registers deferred callbacks
pub trait Scheduler {
    fn schedule(&mut self, delay_ms: u32, task: Task);
}

/// Manually advanced clock for deterministic runs
///
/// Tasks due at the same instant run in the order they were scheduled.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now_ms: u64,
    seq: u64,
    pending: BinaryHeap<Reverse<(u64, u64, Task)>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of tasks not yet delivered
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pop the next task due at or before `until`, moving the clock to its due time
    pub fn pop_due(&mut self, until: u64) -> Option<Task> {
        let Reverse((due, _, _)) = *self.pending.peek()?;
        if due > until {
            return None;
        }
        let Reverse((due, _, task)) = self.pending.pop()?;
        self.now_ms = self.now_ms.max(due);
        Some(task)
    }

    /// Move the clock forward without delivering anything
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl Scheduler for VirtualClock {
    fn schedule(&mut self, delay_ms: u32, task: Task) {
        let due = self.now_ms + delay_ms as u64;
        self.pending.push(Reverse((due, self.seq, task)));
        self.seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_delivered_in_due_order() {
        let mut clock = VirtualClock::new();
        clock.schedule(300, Task::TransitionEnd);
        clock.schedule(100, Task::Reposition);
        clock.schedule(100, Task::HoverCheck);

        assert_eq!(clock.pop_due(50), None);
        assert_eq!(clock.pop_due(1000), Some(Task::Reposition));
        assert_eq!(clock.now_ms(), 100);
        // Same due time: insertion order wins
        assert_eq!(clock.pop_due(1000), Some(Task::HoverCheck));
        assert_eq!(clock.pop_due(1000), Some(Task::TransitionEnd));
        assert_eq!(clock.now_ms(), 300);
        assert!(clock.is_idle());
    }

    #[test]
    fn test_schedule_is_relative_to_now() {
        let mut clock = VirtualClock::new();
        clock.set_now(500);
        clock.schedule(100, Task::Detach);
        assert_eq!(clock.pop_due(599), None);
        assert_eq!(clock.pop_due(600), Some(Task::Detach));
    }
}
