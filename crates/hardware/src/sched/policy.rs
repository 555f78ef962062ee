//! Next-Task Selection.

use crate::config::SchedulePolicy;
use crate::sched::tcb::TaskId;

impl SchedulePolicy {
    /// Picks the task to run after `current` out of `count` registered tasks.
    ///
    /// The fixed-pair policy with anything but two tasks is a defect; callers
    /// validate the table before the first yield.
    pub fn next(self, current: TaskId, count: usize) -> TaskId {
        assert!(count > 0, "scheduling with no registered tasks");
        assert!(current.0 < count, "{current} is not registered");
        match self {
            Self::FixedPair => {
                assert_eq!(count, 2, "fixed-pair policy with {count} tasks");
                if current.0 == 0 { TaskId(1) } else { TaskId(0) }
            }
            Self::Rotating => TaskId((current.0 + 1) % count),
        }
    }

    /// Required task count, if the policy fixes one.
    pub const fn arity(self) -> Option<usize> {
        match self {
            Self::FixedPair => Some(2),
            Self::Rotating => None,
        }
    }
}
