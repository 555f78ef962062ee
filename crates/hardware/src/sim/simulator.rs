//! Simulator: owns the hart and the scheduler side-by-side.
//!
//! The yield path is modeled instruction by instruction so it has a fixed,
//! measurable cost:
//!
//! | instruction             | where                     |
//! |-------------------------|---------------------------|
//! | `ecall`                 | yielding task             |
//! | `csrr a0, mepc`         | trap entry                |
//! | `csrw 0x801, cfg`       | scheduler, stage          |
//! | `csrw mscratch, tcb`    | scheduler, back-reference |
//! | `csrw mepc, a0`         | trap exit                 |
//! | `mret`                  | trap exit, commit         |
//!
//! A never-run task then executes the bootstrap stub
//! (`csrr t0, mscratch; lw sp, 0(t0); jr entry`) in its freshly committed window.

use serde::Serialize;
use tracing::{debug, info};

use crate::common::constants::{INSTRUCTION_SIZE_32, REG_SP, TCB_SP_OFFSET};
use crate::common::{ConfigError, Trap};
use crate::config::Config;
use crate::core::Cpu;
use crate::core::arch::csr;
use crate::sched::{SchedulerContext, TaskId};

/// Number of instructions in the bootstrap stub.
pub const BOOTSTRAP_INSTRUCTIONS: u64 = 3;

/// How a task body stopped running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The body issued a yield trap and expects to be resumed later.
    Yield,
    /// The body signaled the end of the simulation.
    Exit,
}

/// Code of a cooperative task.
///
/// A body runs on the hart from its current resume point until it yields or
/// exits. It only sees architectural state; the scheduler's TCBs are off limits.
pub trait TaskBody {
    /// Runs until the next yield or exit.
    ///
    /// # Errors
    ///
    /// Any trap the body's instructions raise.
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap>;
}

/// Result of [`Simulator::run`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Yield traps serviced.
    pub yields: u64,
    /// Task that exited, or `None` if the yield budget ran out first.
    pub exited: Option<TaskId>,
    /// Ids of the tasks resumed after each yield, in order.
    pub resume_order: Vec<TaskId>,
}

/// Top-level simulator: hart state + scheduler.
#[derive(Debug)]
pub struct Simulator {
    /// Architectural state of the hart.
    pub cpu: Cpu,
    /// Task table and current-task pointer.
    pub sched: SchedulerContext,
}

impl Simulator {
    /// Creates a simulator in its reset state with an empty task table.
    pub fn new(config: &Config) -> Self {
        Self {
            cpu: Cpu::new(config),
            sched: SchedulerContext::new(config),
        }
    }

    /// The running task.
    pub fn current_task(&self) -> TaskId {
        self.sched.current()
    }

    /// Validates the task table and points `mscratch` at the running task.
    ///
    /// # Errors
    ///
    /// See [`SchedulerContext::validate`].
    pub fn start(&mut self) -> Result<(), ConfigError> {
        self.sched.validate()?;
        let current = self.sched.current();
        self.cpu.csrs.mscratch = self.sched.tasks().address_of(current);
        info!(
            tasks = self.sched.tasks().len(),
            policy = ?self.sched.policy(),
            "scheduler started"
        );
        Ok(())
    }

    /// Issues a yield trap from the running task and returns once the next task
    /// is running in its committed window.
    ///
    /// # Errors
    ///
    /// A trap raised by the glue itself, e.g. a yield while already in the handler.
    pub fn yield_trap(&mut self) -> Result<(), Trap> {
        self.cpu.exec_ecall();

        let mepc = self.cpu.csr_read(csr::MEPC)?;
        self.cpu.retire(1);

        let resume = self
            .sched
            .schedule(&mut self.cpu, mepc.wrapping_add(INSTRUCTION_SIZE_32))?;

        self.cpu.csr_write(csr::MEPC, resume)?;
        self.cpu.retire(1);
        let _ = self.cpu.exec_mret()?;

        if self.cpu.pc == self.sched.tasks().bootstrap_entry() {
            self.bootstrap();
        }
        Ok(())
    }

    /// Bootstrap stub: locate the TCB through `mscratch`, load `sp` in the new
    /// window, jump to the task entry.
    fn bootstrap(&mut self) {
        let tcb_addr = self.cpu.csrs.mscratch;
        let id = self.sched.tasks().id_at(tcb_addr);
        self.cpu.retire(1);

        let sp = self.sched.tasks().load_word(tcb_addr + TCB_SP_OFFSET);
        debug_assert_eq!(
            sp as u64,
            self.sched.tasks().get(id).stack_pointer,
            "{id} stack pointer does not fit its TCB image"
        );
        self.cpu.regs.write(REG_SP, sp as u64);
        self.cpu.retire(1);

        self.cpu.pc = self.sched.tasks().get(id).entry;
        self.cpu.retire(1);

        self.cpu.stats.bootstraps += 1;
        debug!(%id, sp = format_args!("{sp:#x}"), "bootstrap");
    }

    /// Re-arms a task so its next run starts from the bootstrap entry.
    pub fn rearm(&mut self, id: TaskId) {
        self.sched.rearm(id);
    }

    /// Runs task bodies cooperatively until one exits or `max_yields` yields were serviced.
    ///
    /// `bodies[n]` is the code of task `n`.
    ///
    /// # Errors
    ///
    /// Configuration problems found by [`start`](Self::start) are returned before
    /// anything runs; traps from bodies or glue abort the run.
    pub fn run(
        &mut self,
        bodies: &mut [&mut dyn TaskBody],
        max_yields: u64,
    ) -> Result<RunOutcome, RunError> {
        assert_eq!(
            bodies.len(),
            self.sched.tasks().len(),
            "one body per registered task"
        );
        self.start()?;

        let mut outcome = RunOutcome {
            yields: 0,
            exited: None,
            resume_order: Vec::new(),
        };
        while outcome.yields < max_yields {
            let id = self.sched.current();
            match bodies[id.0].resume(&mut self.cpu)? {
                Step::Exit => {
                    info!(%id, yields = outcome.yields, "task exited");
                    outcome.exited = Some(id);
                    return Ok(outcome);
                }
                Step::Yield => {
                    self.yield_trap()?;
                    outcome.yields += 1;
                    outcome.resume_order.push(self.sched.current());
                }
            }
        }
        Ok(outcome)
    }
}

/// Failure of a [`Simulator::run`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The task table does not suit the policy.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A body or the trap glue raised an unexpected trap.
    #[error("unexpected trap: {0}")]
    Trap(#[from] Trap),
}
