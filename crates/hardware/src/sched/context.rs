//! Scheduler Context.
//!
//! `SchedulerContext` owns the task table and the current-task pointer. There is
//! exactly one per simulated hart and it is handed by `&mut` into the trap glue,
//! so the scheduler cannot be re-entered while it runs.

use tracing::debug;

use crate::common::{ConfigError, Trap};
use crate::config::{Config, SchedulePolicy};
use crate::core::Cpu;
use crate::core::arch::csr;
use crate::core::arch::mode::PrivilegeMode;
use crate::sched::tcb::{TaskId, TaskRegistry};

/// Scheduler state: task table, selection policy, and the running task.
#[derive(Debug)]
pub struct SchedulerContext {
    tasks: TaskRegistry,
    policy: SchedulePolicy,
    current: TaskId,
}

impl SchedulerContext {
    /// Creates a context with an empty task table. Task 0, once registered, is
    /// the running task.
    pub fn new(config: &Config) -> Self {
        Self {
            tasks: TaskRegistry::new(config),
            policy: config.scheduler.policy,
            current: TaskId(0),
        }
    }

    /// The task table.
    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Mutable access to the task table, for registration and late window binding.
    pub fn tasks_mut(&mut self) -> &mut TaskRegistry {
        &mut self.tasks
    }

    /// Selection policy.
    pub fn policy(&self) -> SchedulePolicy {
        self.policy
    }

    /// The running task.
    pub fn current(&self) -> TaskId {
        self.current
    }

    /// Checks the table against the policy before the first yield.
    ///
    /// # Errors
    ///
    /// `NoTasks` for an empty table; `PairPolicyArity` for a fixed pair without two tasks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks.is_empty() {
            return Err(ConfigError::NoTasks);
        }
        match self.policy.arity() {
            Some(n) if n != self.tasks.len() => Err(ConfigError::PairPolicyArity {
                found: self.tasks.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Runs one scheduling decision inside the yield trap.
    ///
    /// Saves `old_pc` as the yielding task's resume address, picks the next task,
    /// stages its window through the staging CSR, makes it current, points
    /// `mscratch` at its TCB, and returns its resume address. The window is not
    /// switched until the caller's `mret`.
    ///
    /// Must be called in Machine mode with `mstatus.MIE` clear, as trap entry leaves it.
    ///
    /// # Errors
    ///
    /// Propagates a trap from the CSR writes.
    pub fn schedule(&mut self, cpu: &mut Cpu, old_pc: u64) -> Result<u64, Trap> {
        assert_eq!(
            cpu.privilege,
            PrivilegeMode::Machine,
            "scheduler entered outside the yield trap"
        );
        assert_eq!(
            cpu.csrs.mstatus & csr::MSTATUS_MIE,
            0,
            "scheduler entered with traps enabled"
        );

        let prev = self.current;
        self.tasks.get_mut(prev).saved_pc = old_pc;

        let next = self.policy.next(prev, self.tasks.len());
        let window = self.tasks.get(next).window_cfg;

        cpu.csr_write(csr::WINDOW_STAGED, window.raw() as u64)?;
        cpu.retire(1);

        self.current = next;

        cpu.csr_write(csr::MSCRATCH, self.tasks.address_of(next))?;
        cpu.retire(1);

        if next != prev {
            cpu.stats.context_switches += 1;
        }
        let resume = self.tasks.get(next).saved_pc;
        debug!(
            from = %prev,
            to = %next,
            window = %window,
            saved = format_args!("{old_pc:#x}"),
            resume = format_args!("{resume:#x}"),
            "schedule"
        );
        Ok(resume)
    }

    /// Re-arms a task so its next run starts from scratch.
    ///
    /// The running task cannot be re-armed; it has not yielded its `saved_pc` yet.
    pub fn rearm(&mut self, id: TaskId) {
        assert_ne!(id, self.current, "{id} is running and cannot be re-armed");
        self.tasks.rearm(id);
    }

    /// Locates the running task through the scratch back-reference, without a table scan.
    pub fn locate_current(&self, cpu: &Cpu) -> TaskId {
        self.tasks.id_at(cpu.csrs.mscratch)
    }
}
