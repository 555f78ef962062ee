//! Benchmark scenarios.
//!
//! Each scenario builds a fresh [`Simulator`] from a copy of the caller's
//! configuration, forces the policy it was written for, and returns a
//! serializable report whose `passed` flag says whether the hardware behaved.

use std::cell::Cell;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{InstructionCounter, InstretSpan, measure};
use crate::common::Trap;
use crate::common::constants::{REG_GP, REG_RA, REG_S1, REG_S2, REG_S3, REG_SP, REG_T0, REG_TP};
use crate::config::{Config, SchedulePolicy};
use crate::core::Cpu;
use crate::core::arch::csr;
use crate::core::arch::window::WindowConfig;
use crate::sched::TaskId;
use crate::sim::{RunError, Simulator, Step, TaskBody};
use crate::stats::SimStats;

/// Entry point of the second task in the two-task scenarios.
const PEER_ENTRY: u64 = 0x8000_1000;

/// Entry points of the scale scenario's nano tasks, one per 0x100 bytes.
const NANO_ENTRY_BASE: u64 = 0x8000_1800;

/// Window of the second task in the two-task scenarios: base 32, size 32.
const PEER_WINDOW: WindowConfig = WindowConfig::new(32, 32);

const CANARIES: [(usize, u64); 3] = [
    (REG_S1, 0xAAAA_AAAA),
    (REG_S2, 0xBBBB_BBBB),
    (REG_S3, 0xCCCC_CCCC),
];

const INTERFERERS: [(usize, u64); 3] = [
    (REG_S1, 0x1111_1111),
    (REG_S2, 0x2222_2222),
    (REG_S3, 0x3333_3333),
];

/// Nano task windows of the scale scenario: `(base, size)`.
const NANO_WINDOWS: [(u16, u16); 3] = [(32, 10), (42, 10), (52, 10)];

/// Yields issued by the scale scenario's boot task before it exits.
const SCALE_ROUNDS: u64 = 3;

/// The runnable scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Scenario {
    /// Context isolation of callee-saved registers across a yield.
    Canary,
    /// Average cost of a yield over many round trips.
    Stress,
    /// Cost of one hardware switch against a software save/restore baseline.
    Latency,
    /// Four tasks sharing the bank under rotating selection.
    Scale,
    /// Raw stage/commit sequence without the scheduler.
    ViewRegs,
}

impl Scenario {
    /// Every scenario, in the order `all` runs them.
    pub const ALL: [Self; 5] = [
        Self::Canary,
        Self::Stress,
        Self::Latency,
        Self::Scale,
        Self::ViewRegs,
    ];

    /// Short name used in logs and reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Canary => "canary",
            Self::Stress => "stress",
            Self::Latency => "latency",
            Self::Scale => "scale",
            Self::ViewRegs => "view-regs",
        }
    }

    /// Runs the scenario.
    ///
    /// # Errors
    ///
    /// A configuration that cannot host the scenario's tasks, or an unexpected trap.
    pub fn run(self, config: &Config) -> Result<ScenarioReport, RunError> {
        info!(scenario = self.name(), "running scenario");
        let report = match self {
            Self::Canary => ScenarioReport::Canary(canary(config)?),
            Self::Stress => ScenarioReport::Stress(stress(config)?),
            Self::Latency => ScenarioReport::Latency(latency(config)?),
            Self::Scale => ScenarioReport::Scale(scale(config)?),
            Self::ViewRegs => ScenarioReport::ViewRegs(view_regs(config)?),
        };
        if report.passed() {
            info!(scenario = self.name(), "scenario passed");
        } else {
            warn!(scenario = self.name(), "scenario FAILED");
        }
        Ok(report)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Report of any scenario.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "scenario", rename_all = "kebab-case")]
pub enum ScenarioReport {
    /// See [`canary`].
    Canary(CanaryReport),
    /// See [`stress`].
    Stress(StressReport),
    /// See [`latency`].
    Latency(LatencyReport),
    /// See [`scale`].
    Scale(ScaleReport),
    /// See [`view_regs`].
    ViewRegs(ViewRegsReport),
}

impl ScenarioReport {
    /// Whether the scenario's checks held.
    pub const fn passed(&self) -> bool {
        match self {
            Self::Canary(r) => r.passed,
            Self::Stress(r) => r.passed,
            Self::Latency(r) => r.passed,
            Self::Scale(r) => r.passed,
            Self::ViewRegs(r) => r.passed,
        }
    }

    /// Prints a human-readable summary to stdout.
    pub fn print(&self) {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        match self {
            Self::Canary(r) => {
                println!("[canary] {verdict}");
                println!("  peer saw csr[0x800] = {:#010x}", r.peer_window);
                for c in &r.checks {
                    println!(
                        "  x{:<2} expected {:#010x} found {:#010x}",
                        c.reg, c.expected, c.found
                    );
                }
            }
            Self::Stress(r) => {
                println!("[stress] {verdict}");
                println!("  iterations        {}", r.iterations);
                println!("  total instret     {}", r.total_instructions);
                println!("  avg per switch    {}", r.per_switch);
            }
            Self::Latency(r) => {
                println!("[latency] {verdict}");
                println!("  hardware switch   {} instructions", r.hardware_instructions);
                println!("  software baseline {} instructions", r.software_instructions);
                println!("  improvement       {}x", r.improvement);
            }
            Self::Scale(r) => {
                println!("[scale] {verdict}");
                let order: Vec<String> = r.resume_order.iter().map(ToString::to_string).collect();
                println!("  resume order      {}", order.join(" "));
                for w in &r.windows {
                    println!(
                        "  {} {}  x1={:#010x} x2={:#010x}",
                        w.task, w.window, w.ra, w.sp
                    );
                }
            }
            Self::ViewRegs(r) => {
                println!("[view-regs] {verdict}");
                println!(
                    "  window 0: x3={:#010x} x4={:#010x}",
                    r.window0[0], r.window0[1]
                );
                println!(
                    "  window 1: x3={:#010x} x4={:#010x}",
                    r.window1[0], r.window1[1]
                );
                println!(
                    "  after restage: active={:#010x} staged={:#010x}",
                    r.active_after_restage, r.staged_after_restage
                );
            }
        }
    }
}

/// One register compared against its expected value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterCheck {
    /// Architectural register index.
    pub reg: usize,
    /// Value written before the yield.
    pub expected: u64,
    /// Value read after resuming.
    pub found: u64,
}

impl RegisterCheck {
    /// Whether the register survived.
    pub const fn passed(&self) -> bool {
        self.expected == self.found
    }
}

/// Outcome of [`canary`].
#[derive(Clone, Debug, Serialize)]
pub struct CanaryReport {
    /// The boot task's canaries after it resumed.
    pub checks: Vec<RegisterCheck>,
    /// `csr[0x800]` as the peer task read it on entry.
    pub peer_window: u64,
    /// Canaries intact and the peer ran in its own window.
    pub passed: bool,
    /// Counters of the run.
    pub stats: SimStats,
}

#[derive(Default)]
struct CanaryOwner {
    resumed: bool,
    checks: Vec<RegisterCheck>,
}

impl TaskBody for CanaryOwner {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        if !self.resumed {
            for (reg, val) in CANARIES {
                cpu.exec_li(reg, val);
            }
            self.resumed = true;
            return Ok(Step::Yield);
        }
        self.checks = CANARIES
            .iter()
            .map(|&(reg, expected)| RegisterCheck {
                reg,
                expected,
                found: cpu.regs.read(reg),
            })
            .collect();
        cpu.exec_work(CANARIES.len() as u64);
        Ok(Step::Exit)
    }
}

#[derive(Default)]
struct CanaryInterferer {
    window_seen: Option<u64>,
}

impl TaskBody for CanaryInterferer {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        if self.window_seen.is_none() {
            self.window_seen = Some(cpu.exec_csrr(REG_T0, csr::WINDOW_ACTIVE)?);
            for (reg, val) in INTERFERERS {
                cpu.exec_li(reg, val);
            }
        }
        Ok(Step::Yield)
    }
}

fn with_policy(config: &Config, policy: SchedulePolicy) -> Config {
    let mut config = config.clone();
    config.scheduler.policy = policy;
    config
}

fn pair_simulator(config: &Config) -> Result<Simulator, RunError> {
    let config = with_policy(config, SchedulePolicy::FixedPair);
    config.validate()?;
    let mut sim = Simulator::new(&config);
    let tasks = sim.sched.tasks_mut();
    let _ = tasks.adopt_boot_task(config.general.start_pc, WindowConfig::RESET)?;
    let _ = tasks.spawn(PEER_ENTRY, PEER_WINDOW)?;
    Ok(sim)
}

/// Context isolation: the boot task plants canaries in `s1`-`s3` and yields;
/// the peer, bootstrapped into window 1, overwrites the same architectural
/// registers and yields back; the canaries must be intact.
///
/// # Errors
///
/// See [`Scenario::run`].
pub fn canary(config: &Config) -> Result<CanaryReport, RunError> {
    let mut sim = pair_simulator(config)?;
    let mut owner = CanaryOwner::default();
    let mut peer = CanaryInterferer::default();
    let _ = sim.run(&mut [&mut owner, &mut peer], 4)?;

    let peer_window = peer.window_seen.unwrap_or_default();
    let isolated = !owner.checks.is_empty() && owner.checks.iter().all(RegisterCheck::passed);
    let peer_in_own_window = peer_window & 0xFFFF == PEER_WINDOW.base() as u64;
    Ok(CanaryReport {
        checks: owner.checks,
        peer_window,
        passed: isolated && peer_in_own_window,
        stats: sim.cpu.stats.clone(),
    })
}

/// Outcome of [`stress`].
#[derive(Clone, Debug, Serialize)]
pub struct StressReport {
    /// Round trips performed.
    pub iterations: u64,
    /// Counter readings around the loop.
    pub span: InstretSpan,
    /// Instructions retired over the whole loop.
    pub total_instructions: u64,
    /// `total / (2 * iterations)`.
    pub per_switch: u64,
    /// Every round trip completed.
    pub passed: bool,
    /// Counters of the run.
    pub stats: SimStats,
}

struct PingLoop {
    iterations: u64,
    yields: u64,
    start: Option<u64>,
    span: Option<InstretSpan>,
}

impl TaskBody for PingLoop {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        let start = match self.start {
            Some(start) => start,
            None => {
                let start = cpu.read_instret()?;
                self.start = Some(start);
                start
            }
        };
        if self.yields < self.iterations {
            self.yields += 1;
            return Ok(Step::Yield);
        }
        let end = cpu.read_instret()?;
        self.span = Some(InstretSpan::new(start, end));
        Ok(Step::Exit)
    }
}

struct Pong;

impl TaskBody for Pong {
    fn resume(&mut self, _cpu: &mut Cpu) -> Result<Step, Trap> {
        Ok(Step::Yield)
    }
}

/// Yield throughput: the boot task yields `bench.stress_iterations` times to a
/// peer that yields straight back, bracketed by two counter reads.
///
/// # Errors
///
/// See [`Scenario::run`].
pub fn stress(config: &Config) -> Result<StressReport, RunError> {
    let iterations = config.bench.stress_iterations;
    let mut sim = pair_simulator(config)?;
    let mut ping = PingLoop {
        iterations,
        yields: 0,
        start: None,
        span: None,
    };
    let max_yields = iterations.saturating_mul(2).saturating_add(1);
    let outcome = sim.run(&mut [&mut ping, &mut Pong], max_yields)?;

    let span = ping.span.unwrap_or_else(|| InstretSpan::new(0, 0));
    let total_instructions = span.instructions();
    let per_switch = iterations
        .checked_mul(2)
        .and_then(|switches| total_instructions.checked_div(switches))
        .unwrap_or(0);
    debug!(total_instructions, per_switch, "stress done");
    Ok(StressReport {
        iterations,
        span,
        total_instructions,
        per_switch,
        passed: outcome.exited == Some(TaskId(0)) && ping.span.is_some(),
        stats: sim.cpu.stats.clone(),
    })
}

/// Outcome of [`latency`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LatencyReport {
    /// Instructions from the boot task's counter read to the first counter read
    /// in the peer's freshly committed window.
    pub hardware_instructions: u64,
    /// Cost of spilling and refilling `bench.baseline_registers` registers in
    /// software, measured with the same protocol.
    pub baseline_instructions: u64,
    /// `baseline + hardware`: a software switch pays for the trap path too.
    pub software_instructions: u64,
    /// `software / hardware`.
    pub improvement: u64,
    /// The hardware switch was measured and is cheaper.
    pub passed: bool,
}

struct LatencyStart<'a> {
    start: &'a Cell<Option<u64>>,
}

impl TaskBody for LatencyStart<'_> {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        if self.start.get().is_none() {
            self.start.set(Some(cpu.read_instret()?));
        }
        Ok(Step::Yield)
    }
}

struct LatencyEnd<'a> {
    start: &'a Cell<Option<u64>>,
    baseline_registers: u64,
    hardware: Option<InstretSpan>,
    baseline: Option<InstretSpan>,
}

impl TaskBody for LatencyEnd<'_> {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        let end = cpu.read_instret()?;
        if let Some(start) = self.start.get() {
            self.hardware = Some(InstretSpan::new(start, end));
        }
        let stores_and_loads = 2 * self.baseline_registers;
        let ((), span) = measure(cpu, |cpu| {
            cpu.exec_work(stores_and_loads);
            Ok(())
        })?;
        self.baseline = Some(span);
        Ok(Step::Exit)
    }
}

/// Switch latency: the boot task reads the counter and yields; the peer's
/// first instruction after bootstrap reads it again. The baseline spills and
/// refills the integer registers with plain stores and loads.
///
/// # Errors
///
/// See [`Scenario::run`].
pub fn latency(config: &Config) -> Result<LatencyReport, RunError> {
    let mut sim = pair_simulator(config)?;
    let start = Cell::new(None);
    let mut first = LatencyStart { start: &start };
    let mut second = LatencyEnd {
        start: &start,
        baseline_registers: config.bench.baseline_registers,
        hardware: None,
        baseline: None,
    };
    let _ = sim.run(&mut [&mut first, &mut second], 2)?;

    let hardware_instructions = second.hardware.as_ref().map_or(0, InstretSpan::instructions);
    let baseline_instructions = second.baseline.as_ref().map_or(0, InstretSpan::instructions);
    let software_instructions = baseline_instructions + hardware_instructions;
    let improvement = software_instructions
        .checked_div(hardware_instructions)
        .unwrap_or_default();
    Ok(LatencyReport {
        hardware_instructions,
        baseline_instructions,
        software_instructions,
        improvement,
        passed: hardware_instructions > 0 && hardware_instructions < software_instructions,
    })
}

/// A task's window and the two registers it wrote, read back after the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WindowSnapshot {
    /// Task.
    pub task: TaskId,
    /// Its window.
    pub window: WindowConfig,
    /// `x1` as stored in the task's physical slice.
    pub ra: u64,
    /// `x2` as stored in the task's physical slice.
    pub sp: u64,
}

/// Outcome of [`scale`].
#[derive(Clone, Debug, Serialize)]
pub struct ScaleReport {
    /// Tasks resumed after each yield.
    pub resume_order: Vec<TaskId>,
    /// Nano task windows and their contents.
    pub windows: Vec<WindowSnapshot>,
    /// No two task windows overlap.
    pub disjoint: bool,
    /// Rotation order, per-window contents and disjointness all hold.
    pub passed: bool,
    /// Counters of the run.
    pub stats: SimStats,
}

/// `x1`/`x2` values nano task `n` stores: `0xNNNN1111` and `0xNNNN2222`.
const fn nano_pattern(n: usize) -> (u64, u64) {
    let tag = ((n as u64) * 0x1111) << 16;
    (tag | 0x1111, tag | 0x2222)
}

struct Conductor {
    rounds: u64,
}

impl TaskBody for Conductor {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        if self.rounds < SCALE_ROUNDS {
            self.rounds += 1;
            cpu.exec_work(1);
            return Ok(Step::Yield);
        }
        Ok(Step::Exit)
    }
}

struct NanoTask {
    n: usize,
}

impl TaskBody for NanoTask {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        let (ra, sp) = nano_pattern(self.n);
        cpu.exec_li(REG_RA, ra);
        cpu.exec_li(REG_SP, sp);
        Ok(Step::Yield)
    }
}

/// Scaling: the boot task plus three nano tasks in small adjacent windows,
/// scheduled round-robin for three rounds.
///
/// # Errors
///
/// See [`Scenario::run`].
pub fn scale(config: &Config) -> Result<ScaleReport, RunError> {
    let config = with_policy(config, SchedulePolicy::Rotating);
    config.validate()?;
    let mut sim = Simulator::new(&config);
    let tasks = sim.sched.tasks_mut();
    let _ = tasks.adopt_boot_task(config.general.start_pc, WindowConfig::RESET)?;
    for (i, &(base, size)) in NANO_WINDOWS.iter().enumerate() {
        let entry = NANO_ENTRY_BASE + 0x100 * i as u64;
        let _ = tasks.spawn_direct(entry, WindowConfig::new(base, size))?;
    }

    let mut conductor = Conductor { rounds: 0 };
    let mut nanos: Vec<NanoTask> = (1..=NANO_WINDOWS.len()).map(|n| NanoTask { n }).collect();
    let mut bodies: Vec<&mut dyn TaskBody> = Vec::with_capacity(1 + nanos.len());
    bodies.push(&mut conductor);
    bodies.extend(nanos.iter_mut().map(|b| b as &mut dyn TaskBody));
    let outcome = sim.run(&mut bodies, 4 * (SCALE_ROUNDS + 1))?;

    let windows: Vec<WindowSnapshot> = sim
        .sched
        .tasks()
        .iter()
        .filter(|tcb| tcb.id != TaskId(0))
        .map(|tcb| {
            let slice = sim.cpu.regs.window_slice(tcb.window_cfg);
            WindowSnapshot {
                task: tcb.id,
                window: tcb.window_cfg,
                ra: slice[REG_RA],
                sp: slice[REG_SP],
            }
        })
        .collect();

    let all: Vec<WindowConfig> = sim.sched.tasks().iter().map(|t| t.window_cfg).collect();
    let disjoint = all
        .iter()
        .enumerate()
        .all(|(i, a)| all[i + 1..].iter().all(|b| !a.overlaps(*b)));

    let task_count = all.len();
    let expected_order: Vec<TaskId> = (0..SCALE_ROUNDS as usize * task_count)
        .map(|k| TaskId((k + 1) % task_count))
        .collect();
    let contents_ok = windows.iter().all(|w| {
        let (ra, sp) = nano_pattern(w.task.0);
        w.ra == ra && w.sp == sp
    });

    Ok(ScaleReport {
        passed: outcome.resume_order == expected_order && contents_ok && disjoint,
        resume_order: outcome.resume_order,
        windows,
        disjoint,
        stats: sim.cpu.stats.clone(),
    })
}

/// Outcome of [`view_regs`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewRegsReport {
    /// `x3`, `x4` in window 0's physical slice.
    pub window0: [u64; 2],
    /// `x3`, `x4` in window 1's physical slice.
    pub window1: [u64; 2],
    /// `csr[0x800]` right after the first stage, before its `mret`.
    pub active_before_commit: u64,
    /// `csr[0x800]` after the trailing stage that no `mret` followed.
    pub active_after_restage: u64,
    /// `csr[0x801]` after the trailing stage.
    pub staged_after_restage: u64,
    /// Both windows hold their own values and only `mret` switched.
    pub passed: bool,
}

/// Stages `cfg` and returns through `mret` to the instruction after it,
/// like `la t0, 1f; csrw mepc, t0; li t0, cfg; csrw 0x801, t0; mret; 1:`.
fn switch_window(cpu: &mut Cpu, cfg: WindowConfig) -> Result<u64, Trap> {
    let resume = cpu.pc + 5 * 4;
    cpu.exec_li(REG_T0, resume);
    cpu.exec_csrw(csr::MEPC, REG_T0)?;
    cpu.exec_li(REG_T0, cfg.raw() as u64);
    cpu.exec_csrw(csr::WINDOW_STAGED, REG_T0)?;
    let before = cpu.csr_read(csr::WINDOW_ACTIVE)?;
    let _ = cpu.exec_mret()?;
    Ok(before)
}

/// Drives the two window CSRs directly from Machine mode: fills `x3`/`x4`
/// in window 0, switches to window 1 and fills them again, switches back,
/// then stages window 1 once more without an `mret`.
///
/// # Errors
///
/// See [`Scenario::run`].
pub fn view_regs(config: &Config) -> Result<ViewRegsReport, RunError> {
    let mut config = config.clone();
    config.general.user_mode = false;
    config.validate()?;
    let mut cpu = Cpu::new(&config);

    cpu.exec_li(REG_GP, 0xAAAA_0003);
    cpu.exec_li(REG_TP, 0xAAAA_0004);
    let active_before_commit = switch_window(&mut cpu, PEER_WINDOW)?;

    cpu.exec_li(REG_GP, 0xBBBB_0003);
    cpu.exec_li(REG_TP, 0xBBBB_0004);
    let _ = switch_window(&mut cpu, WindowConfig::RESET)?;
    let back_in_window0 = cpu.regs.read(REG_GP) == 0xAAAA_0003;

    cpu.exec_li(REG_T0, PEER_WINDOW.raw() as u64);
    cpu.exec_csrw(csr::WINDOW_STAGED, REG_T0)?;
    let active_after_restage = cpu.csr_read(csr::WINDOW_ACTIVE)?;
    let staged_after_restage = cpu.csr_read(csr::WINDOW_STAGED)?;
    cpu.regs.dump();

    let slot = |cfg: WindowConfig, reg: usize| cpu.regs.read_physical(cfg.base() + reg);
    let window0 = [slot(WindowConfig::RESET, REG_GP), slot(WindowConfig::RESET, REG_TP)];
    let window1 = [slot(PEER_WINDOW, REG_GP), slot(PEER_WINDOW, REG_TP)];

    let reset = WindowConfig::RESET.raw() as u64;
    let passed = window0 == [0xAAAA_0003, 0xAAAA_0004]
        && window1 == [0xBBBB_0003, 0xBBBB_0004]
        && back_in_window0
        && active_before_commit == reset
        && active_after_restage == reset
        && staged_after_restage == PEER_WINDOW.raw() as u64;
    Ok(ViewRegsReport {
        window0,
        window1,
        active_before_commit,
        active_after_restage,
        staged_after_restage,
        passed,
    })
}

/// Runs every scenario in order, stopping at the first error.
///
/// # Errors
///
/// See [`Scenario::run`].
pub fn run_all(config: &Config) -> Result<Vec<ScenarioReport>, RunError> {
    Scenario::ALL.iter().map(|s| s.run(config)).collect()
}
