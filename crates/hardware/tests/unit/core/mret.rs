//! # Trap Entry and `mret` Tests
//!
//! `mret` is the only instruction that commits a staged window.

use rvwin_core::common::Trap;
use rvwin_core::config::Config;
use rvwin_core::core::Cpu;
use rvwin_core::core::arch::WindowConfig;
use rvwin_core::core::arch::csr;
use rvwin_core::core::arch::mode::PrivilegeMode;
use rvwin_core::core::cpu::trap::MRET_INSTRUCTION;

fn create_test_cpu(user_mode: bool) -> Cpu {
    let mut config = Config::default();
    config.general.user_mode = user_mode;
    Cpu::new(&config)
}

fn mpp(cpu: &Cpu) -> u64 {
    (cpu.csrs.mstatus >> csr::MSTATUS_MPP_SHIFT) & csr::MSTATUS_MPP_MASK
}

#[test]
fn test_ecall_enters_machine_trap_vector() {
    let mut cpu = create_test_cpu(false);
    cpu.csrs.mstatus |= csr::MSTATUS_MIE;
    let pc = cpu.pc;
    cpu.exec_ecall();

    assert_eq!(cpu.pc, 0x8000_0040);
    assert_eq!(cpu.csrs.mepc, pc);
    assert_eq!(cpu.csrs.mcause, 11);
    assert_eq!(cpu.privilege, PrivilegeMode::Machine);
    assert_eq!(cpu.csrs.mstatus & csr::MSTATUS_MIE, 0);
    assert_ne!(cpu.csrs.mstatus & csr::MSTATUS_MPIE, 0);
    assert_eq!(mpp(&cpu), 3);
    assert_eq!(cpu.stats.traps_taken, 1);
}

#[test]
fn test_ecall_cause_follows_privilege() {
    let mut cpu = create_test_cpu(true);
    cpu.privilege = PrivilegeMode::User;
    cpu.exec_ecall();
    assert_eq!(cpu.csrs.mcause, 8);
    assert_eq!(mpp(&cpu), 0);
}

#[test]
fn test_mret_commits_staged_window_and_updates_mirror() {
    let mut cpu = create_test_cpu(false);
    cpu.csrs.mepc = 0x8000_0200;
    cpu.csr_write(csr::WINDOW_STAGED, 0x0020_0020).unwrap();

    let committed = cpu.exec_mret().unwrap();

    assert_eq!(committed, WindowConfig::new(32, 32));
    assert_eq!(cpu.pc, 0x8000_0200);
    assert_eq!(cpu.regs.active(), WindowConfig::new(32, 32));
    assert_eq!(cpu.csr_read(csr::WINDOW_ACTIVE).unwrap(), 0x0020_0020);
    assert_eq!(cpu.stats.window_commits, 1);
    assert_eq!(cpu.stats.trap_returns, 1);
}

#[test]
fn test_mret_without_stage_recommits_active_window() {
    let mut cpu = create_test_cpu(false);
    cpu.exec_li(9, 0x99);
    let committed = cpu.exec_mret().unwrap();
    assert_eq!(committed, WindowConfig::RESET);
    assert_eq!(cpu.regs.read(9), 0x99);
}

#[test]
fn test_mret_restores_interrupt_enable_stack() {
    let mut cpu = create_test_cpu(false);
    cpu.csrs.mstatus |= csr::MSTATUS_MIE;
    cpu.exec_ecall();
    let _ = cpu.exec_mret().unwrap();

    assert_ne!(cpu.csrs.mstatus & csr::MSTATUS_MIE, 0);
    assert_ne!(cpu.csrs.mstatus & csr::MSTATUS_MPIE, 0);
    assert_eq!(cpu.csrs.mstatus & csr::MSTATUS_MDT, 0);
    assert_eq!(mpp(&cpu), 3);
    assert_eq!(cpu.privilege, PrivilegeMode::Machine);
}

#[test]
fn test_mret_to_user_mode_commits_before_dropping_privilege() {
    let mut cpu = create_test_cpu(true);
    cpu.csrs.mstatus =
        (cpu.csrs.mstatus & !csr::MSTATUS_MPP) | csr::MSTATUS_MPRV | csr::MSTATUS_MDT;
    cpu.csr_write(csr::WINDOW_STAGED, 0x0020_0040).unwrap();

    let committed = cpu.exec_mret().unwrap();

    assert_eq!(committed, WindowConfig::new(64, 32));
    assert_eq!(cpu.privilege, PrivilegeMode::User);
    assert_eq!(cpu.csrs.mstatus & csr::MSTATUS_MPRV, 0);
    assert_eq!(cpu.csrs.mstatus & csr::MSTATUS_MDT, 0);
    assert_eq!(mpp(&cpu), 0);
    assert_eq!(cpu.csr_read(csr::WINDOW_ACTIVE).unwrap(), 0x0020_0040);
}

#[test]
fn test_mret_below_machine_mode_is_illegal_and_commits_nothing() {
    let mut cpu = create_test_cpu(true);
    cpu.csr_write(csr::WINDOW_STAGED, 0x0020_0020).unwrap();
    cpu.privilege = PrivilegeMode::User;
    let retired = cpu.stats.instructions_retired;

    assert_eq!(
        cpu.exec_mret(),
        Err(Trap::IllegalInstruction(MRET_INSTRUCTION))
    );
    assert_eq!(MRET_INSTRUCTION, 0x3020_0073);
    assert_eq!(cpu.regs.active(), WindowConfig::RESET);
    assert_eq!(cpu.stats.window_commits, 0);
    assert_eq!(cpu.stats.instructions_retired, retired);
}

#[test]
fn test_reset_mstatus_returns_to_machine_mode() {
    let mut cpu = create_test_cpu(false);
    let _ = cpu.exec_mret().unwrap();
    assert_eq!(cpu.privilege, PrivilegeMode::Machine);
}
