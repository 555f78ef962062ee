//! # Scheduling Decision Tests

use crate::common::harness::{TASK_ENTRY, TestContext};
use rvwin_core::common::ConfigError;
use rvwin_core::config::{Config, SchedulePolicy};
use rvwin_core::core::arch::WindowConfig;
use rvwin_core::core::arch::csr;
use rvwin_core::core::arch::mode::PrivilegeMode;
use rvwin_core::sched::{SchedulerContext, TaskId};

#[test]
fn test_schedule_stages_but_does_not_commit() {
    let mut ctx = TestContext::pair();
    ctx.cpu_mut().exec_ecall();
    let TestContext { sim, .. } = &mut ctx;

    let resume = sim.sched.schedule(&mut sim.cpu, 0x8000_0008).unwrap();

    assert_eq!(resume, 0x8000_0100);
    assert_eq!(sim.sched.current(), TaskId(1));
    assert_eq!(sim.cpu.regs.staged(), WindowConfig::new(32, 32));
    assert_eq!(sim.cpu.regs.active(), WindowConfig::RESET);
    assert_eq!(sim.cpu.csrs.window_active, 0x0020_0000);
    assert_eq!(sim.cpu.csrs.mscratch, 0x8000_2010);
    assert_eq!(sim.sched.tasks().get(TaskId(0)).saved_pc, 0x8000_0008);
    assert_eq!(sim.cpu.stats.context_switches, 1);
}

#[test]
fn test_schedule_with_single_rotating_task_restages_itself() {
    let mut ctx = TestContext::new(SchedulePolicy::Rotating).with_tasks(&[]);
    ctx.cpu_mut().exec_ecall();
    let TestContext { sim, .. } = &mut ctx;

    let resume = sim.sched.schedule(&mut sim.cpu, 0x8000_0004).unwrap();

    assert_eq!(resume, 0x8000_0004);
    assert_eq!(sim.sched.current(), TaskId(0));
    assert_eq!(sim.cpu.stats.context_switches, 0);
}

#[test]
#[should_panic(expected = "outside the yield trap")]
fn test_schedule_outside_machine_mode_panics() {
    let mut ctx = TestContext::pair();
    let TestContext { sim, .. } = &mut ctx;
    sim.cpu.privilege = PrivilegeMode::User;
    let _ = sim.sched.schedule(&mut sim.cpu, 0);
}

#[test]
#[should_panic(expected = "with traps enabled")]
fn test_schedule_with_interrupts_enabled_panics() {
    let mut ctx = TestContext::pair();
    let TestContext { sim, .. } = &mut ctx;
    sim.cpu.csrs.mstatus |= csr::MSTATUS_MIE;
    let _ = sim.sched.schedule(&mut sim.cpu, 0);
}

#[test]
fn test_validate_rejects_empty_table() {
    let sched = SchedulerContext::new(&Config::default());
    assert!(matches!(sched.validate(), Err(ConfigError::NoTasks)));
}

#[test]
fn test_validate_rejects_pair_policy_arity() {
    let ctx = TestContext::new(SchedulePolicy::FixedPair).with_tasks(&[
        WindowConfig::new(32, 32),
        WindowConfig::new(64, 32),
    ]);
    assert!(matches!(
        ctx.sim.sched.validate(),
        Err(ConfigError::PairPolicyArity { found: 3 })
    ));
}

#[test]
fn test_locate_current_follows_mscratch() {
    let mut ctx = TestContext::pair();
    ctx.start_and_yield();
    assert_eq!(ctx.sim.sched.locate_current(ctx.cpu()), TaskId(1));
    assert_eq!(ctx.current(), TaskId(1));
}

#[test]
fn test_rearm_idle_task_restores_bootstrap_state() {
    let mut ctx = TestContext::pair();
    ctx.start_and_yield();
    ctx.start_and_yield();
    assert_eq!(ctx.current(), TaskId(0));
    assert_ne!(ctx.sim.sched.tasks().get(TaskId(1)).saved_pc, 0x8000_0100);

    ctx.sim.rearm(TaskId(1));
    ctx.sim.rearm(TaskId(1));

    let tcb = ctx.sim.sched.tasks().get(TaskId(1));
    assert_eq!(tcb.saved_pc, 0x8000_0100);
    assert_eq!(tcb.entry, TASK_ENTRY);
}

#[test]
#[should_panic(expected = "is running and cannot be re-armed")]
fn test_rearm_running_task_panics() {
    let mut ctx = TestContext::pair();
    ctx.start_and_yield();
    ctx.sim.rearm(TaskId(1));
}
