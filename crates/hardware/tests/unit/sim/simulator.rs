//! # Simulator Tests
//!
//! The yield path is a fixed instruction sequence; these tests pin its cost and
//! its architectural effects.

use pretty_assertions::assert_eq;

use crate::common::harness::{Spin, TASK_ENTRY, TestContext, YieldN};
use rvwin_core::bench::InstructionCounter;
use rvwin_core::common::{ConfigError, Trap};
use rvwin_core::config::SchedulePolicy;
use rvwin_core::core::Cpu;
use rvwin_core::core::arch::WindowConfig;
use rvwin_core::core::arch::csr;
use rvwin_core::sched::TaskId;
use rvwin_core::sim::{BOOTSTRAP_INSTRUCTIONS, RunError, Step, TaskBody};
use rvwin_core::Simulator;

#[test]
fn test_first_yield_bootstraps_peer() {
    let mut ctx = TestContext::pair();
    ctx.start_and_yield();

    let stack_top = ctx.sim.sched.tasks().stack_region(TaskId(1)).unwrap().top();
    let cpu = ctx.cpu();
    assert_eq!(cpu.pc, TASK_ENTRY);
    assert_eq!(cpu.regs.active(), WindowConfig::new(32, 32));
    assert_eq!(cpu.regs.read(2), stack_top);
    assert_eq!(cpu.regs.read_physical(32 + 2), stack_top);
    assert_eq!(cpu.csrs.mscratch, 0x8000_2010);
    assert_eq!(cpu.stats.bootstraps, 1);
}

#[test]
fn test_yield_glue_cost() {
    let mut ctx = TestContext::pair();
    ctx.sim.start().unwrap();

    let before = ctx.cpu_mut().read_instret().unwrap();
    ctx.sim.yield_trap().unwrap();
    let after = ctx.cpu_mut().read_instret().unwrap();
    assert_eq!(after - before, 1 + 6 + BOOTSTRAP_INSTRUCTIONS);

    let before = ctx.cpu_mut().read_instret().unwrap();
    ctx.sim.yield_trap().unwrap();
    let after = ctx.cpu_mut().read_instret().unwrap();
    assert_eq!(after - before, 1 + 6);
}

#[test]
fn test_yield_back_resumes_after_ecall() {
    let mut ctx = TestContext::pair();
    let start_pc = ctx.cpu().pc;
    ctx.start_and_yield();
    ctx.sim.yield_trap().unwrap();

    assert_eq!(ctx.current(), TaskId(0));
    assert_eq!(ctx.cpu().pc, start_pc + 4);
    assert_eq!(ctx.cpu().regs.active(), WindowConfig::RESET);
    assert_eq!(ctx.cpu().csr_read(csr::WINDOW_ACTIVE).unwrap(), 0x0020_0000);
    assert_eq!(ctx.cpu().stats.bootstraps, 1);
    assert_eq!(ctx.cpu().stats.context_switches, 2);
}

#[test]
fn test_every_yield_commits_exactly_once() {
    let mut ctx = TestContext::rotating(3);
    ctx.sim.start().unwrap();
    for _ in 0..10 {
        ctx.sim.yield_trap().unwrap();
    }
    let stats = &ctx.cpu().stats;
    assert_eq!(stats.traps_taken, 10);
    assert_eq!(stats.trap_returns, 10);
    assert_eq!(stats.window_stages, 10);
    assert_eq!(stats.window_commits, 10);
    assert_eq!(ctx.cpu().regs.commits(), 10);
}

#[test]
fn test_run_until_exit() {
    let mut ctx = TestContext::pair();
    let mut a = YieldN { remaining: 3 };
    let outcome = ctx.sim.run(&mut [&mut a, &mut Spin], 100).unwrap();

    assert_eq!(outcome.exited, Some(TaskId(0)));
    assert_eq!(outcome.yields, 6);
    assert_eq!(outcome.resume_order, vec![
        TaskId(1),
        TaskId(0),
        TaskId(1),
        TaskId(0),
        TaskId(1),
        TaskId(0)
    ]);
}

#[test]
fn test_run_stops_at_yield_budget() {
    let mut ctx = TestContext::pair();
    let outcome = ctx.sim.run(&mut [&mut Spin, &mut Spin], 5).unwrap();
    assert_eq!(outcome.exited, None);
    assert_eq!(outcome.yields, 5);
    assert_eq!(ctx.current(), TaskId(1));
}

#[test]
fn test_run_rejects_bad_table_before_running() {
    let mut ctx = TestContext::new(SchedulePolicy::FixedPair).with_tasks(&[]);
    let err = ctx.sim.run(&mut [&mut Spin], 5).unwrap_err();
    assert!(matches!(
        err,
        RunError::Config(ConfigError::PairPolicyArity { found: 1 })
    ));
    assert_eq!(ctx.cpu().stats.instructions_retired, 0);
}

struct WritesMirror;

impl TaskBody for WritesMirror {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        cpu.csr_write(csr::WINDOW_ACTIVE, 0)?;
        Ok(Step::Yield)
    }
}

#[test]
fn test_run_propagates_body_trap() {
    let mut ctx = TestContext::pair();
    let err = ctx.sim.run(&mut [&mut Spin, &mut WritesMirror], 5).unwrap_err();
    assert!(matches!(
        err,
        RunError::Trap(Trap::IllegalInstruction(csr::WINDOW_ACTIVE))
    ));
}

#[test]
fn test_rearmed_task_bootstraps_again() {
    let mut ctx = TestContext::pair();
    ctx.start_and_yield();
    ctx.sim.yield_trap().unwrap();
    ctx.sim.rearm(TaskId(1));
    ctx.sim.yield_trap().unwrap();

    assert_eq!(ctx.cpu().pc, TASK_ENTRY);
    assert_eq!(ctx.cpu().stats.bootstraps, 2);
}

#[test]
fn test_user_mode_hart_keeps_tasks_in_machine_mode() {
    let mut ctx = TestContext::new(SchedulePolicy::FixedPair);
    ctx.config.general.user_mode = true;
    ctx.sim = rvwin_core::Simulator::new(&ctx.config);
    let mut ctx = ctx.with_tasks(&[WindowConfig::new(32, 32)]);
    ctx.start_and_yield();
    ctx.sim.yield_trap().unwrap();
    assert_eq!(ctx.cpu().privilege, rvwin_core::core::arch::mode::PrivilegeMode::Machine);
}

#[test]
fn test_bootstrap_sp_matches_tcb_at_top_of_address_space() {
    let mut ctx = TestContext::new(SchedulePolicy::FixedPair);
    ctx.config.scheduler.stack_base = 0xFFFF_8000;
    ctx.config.validate().unwrap();
    ctx.sim = Simulator::new(&ctx.config);
    let mut ctx = ctx.with_tasks(&[WindowConfig::new(32, 32)]);
    ctx.start_and_yield();

    let tcb_sp = ctx.sim.sched.tasks().get(TaskId(1)).stack_pointer;
    assert_eq!(tcb_sp, 0xFFFF_9FFC);
    assert_eq!(ctx.cpu().regs.read(2), tcb_sp);
}
