//! Configuration system for the windowed-register simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline constants (physical bank size, memory layout of TCBs and stacks).
//! 2. **Structures:** Hierarchical config for general, window bank, scheduler, and benchmark settings.
//! 3. **Enums:** Scheduling policy.
//!
//! Configuration is supplied as JSON (`Config::from_json` / `Config::load`) or use
//! `Config::default()`. Every field is optional in JSON.

use std::path::Path;

use serde::Deserialize;

use crate::common::ConfigError;
use crate::common::constants::{ADDRESS_LIMIT, STACK_WORD, TCB_SIZE};
use crate::core::arch::window::WindowConfig;

/// Largest `bench.stress_iterations` accepted by [`Config::validate`].
pub const MAX_STRESS_ITERATIONS: u64 = 0xFFFF_FFFF;

/// Default configuration constants for the simulator.
mod defaults {
    /// Reset program counter (start of RAM).
    pub const START_PC: u64 = 0x8000_0000;

    /// Machine trap vector (`mtvec`) installed at reset.
    pub const TRAP_VECTOR: u64 = 0x8000_0040;

    /// Physical registers in the windowed bank (four full 32-register windows).
    pub const PHYSICAL_REGISTERS: usize = 128;

    /// Slots in the fixed-size task table.
    pub const MAX_TASKS: usize = 8;

    /// Address of the first task control block.
    pub const TCB_BASE: u64 = 0x8000_2000;

    /// Address of the first task stack region.
    pub const STACK_BASE: u64 = 0x8001_0000;

    /// Words per task stack (`uint32_t stack[1024]`).
    pub const STACK_WORDS: u64 = 1024;

    /// Address of the bootstrap stub a never-run task resumes at.
    pub const BOOTSTRAP_ENTRY: u64 = 0x8000_0100;

    /// Ping-pong iterations for the stress scenario.
    pub const STRESS_ITERATIONS: u64 = 1000;

    /// Registers a software context switch spills and fills.
    pub const BASELINE_REGISTERS: u64 = 31;
}

/// Task selection policy used by the scheduler on every yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SchedulePolicy {
    /// Exactly two tasks; alternate unconditionally.
    #[default]
    #[serde(alias = "fixed_pair", alias = "pair")]
    FixedPair,
    /// `N` tasks; `next = (current + 1) mod N`.
    #[serde(alias = "rotating", alias = "round_robin")]
    Rotating,
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use rvwin_core::config::{Config, SchedulePolicy};
///
/// let json = r#"{
///     "window": { "physical_registers": 64 },
///     "scheduler": { "policy": "Rotating", "max_tasks": 4 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.window.physical_registers, 64);
/// assert_eq!(config.scheduler.policy, SchedulePolicy::Rotating);
/// assert_eq!(config.bench.stress_iterations, 1000);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Physical register bank settings
    #[serde(default)]
    pub window: WindowBankConfig,
    /// Task table and scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Benchmark harness settings
    #[serde(default)]
    pub bench: BenchConfig,
}

impl Config {
    /// Parses and validates a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed JSON or unknown enum values, otherwise any error
    /// of [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise any error of [`Config::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks that the configuration describes a model that can be built.
    ///
    /// The bank must hold the reset window. Every task stack needs a slot. The
    /// TCB table, every stack region, the reset PC and the bootstrap stub must
    /// be addressable through the 32-bit words of a TCB image.
    ///
    /// # Errors
    ///
    /// `BankTooSmall`, `EmptyStack`, `AddressOutOfRange` or `TooManyIterations`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.window.physical_registers;
        if !WindowConfig::RESET.fits(capacity) {
            return Err(ConfigError::BankTooSmall { capacity });
        }

        let sched = &self.scheduler;
        if sched.stack_words == 0 {
            return Err(ConfigError::EmptyStack);
        }
        let tasks = sched.max_tasks as u64;
        check_region(
            "task table",
            sched.tcb_base,
            tasks.checked_mul(TCB_SIZE),
        )?;
        check_region(
            "task stacks",
            sched.stack_base,
            tasks
                .checked_mul(sched.stack_words)
                .and_then(|words| words.checked_mul(STACK_WORD)),
        )?;
        check_region("reset pc", self.general.start_pc, Some(1))?;
        check_region("bootstrap entry", sched.bootstrap_entry, Some(1))?;

        let requested = self.bench.stress_iterations;
        if requested > MAX_STRESS_ITERATIONS {
            return Err(ConfigError::TooManyIterations {
                requested,
                limit: MAX_STRESS_ITERATIONS,
            });
        }
        Ok(())
    }
}

/// Fails unless `[base, base + len)` lies below [`ADDRESS_LIMIT`]. `None` is an overflowed length.
fn check_region(region: &'static str, base: u64, len: Option<u64>) -> Result<(), ConfigError> {
    let end = len.map_or(u64::MAX, |len| base.saturating_add(len));
    if end > ADDRESS_LIMIT {
        return Err(ConfigError::AddressOutOfRange { region, end });
    }
    Ok(())
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Dump the active window on every stage and log every retired instruction
    #[serde(default)]
    pub trace_instructions: bool,

    /// Whether the hart implements U-mode; `mret` then returns tasks to User mode
    #[serde(default)]
    pub user_mode: bool,

    /// Initial PC value
    #[serde(default = "GeneralConfig::default_start_pc")]
    pub start_pc: u64,

    /// Machine trap vector installed at reset
    #[serde(default = "GeneralConfig::default_trap_vector")]
    pub trap_vector: u64,
}

impl GeneralConfig {
    fn default_start_pc() -> u64 {
        defaults::START_PC
    }

    fn default_trap_vector() -> u64 {
        defaults::TRAP_VECTOR
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_instructions: false,
            user_mode: false,
            start_pc: defaults::START_PC,
            trap_vector: defaults::TRAP_VECTOR,
        }
    }
}

/// Physical register bank configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowBankConfig {
    /// Number of physical registers windows are sliced from
    #[serde(default = "WindowBankConfig::default_physical_registers")]
    pub physical_registers: usize,
}

impl WindowBankConfig {
    fn default_physical_registers() -> usize {
        defaults::PHYSICAL_REGISTERS
    }
}

impl Default for WindowBankConfig {
    fn default() -> Self {
        Self {
            physical_registers: defaults::PHYSICAL_REGISTERS,
        }
    }
}

/// Task table and scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Task selection policy
    #[serde(default)]
    pub policy: SchedulePolicy,

    /// Slots in the fixed-size task table
    #[serde(default = "SchedulerConfig::default_max_tasks")]
    pub max_tasks: usize,

    /// Address of TCB 0; TCB `n` lives at `tcb_base + 16 * n`
    #[serde(default = "SchedulerConfig::default_tcb_base")]
    pub tcb_base: u64,

    /// Address of the first stack region; task `n` owns region `n`
    #[serde(default = "SchedulerConfig::default_stack_base")]
    pub stack_base: u64,

    /// Words per stack region
    #[serde(default = "SchedulerConfig::default_stack_words")]
    pub stack_words: u64,

    /// Bootstrap stub address a never-run task first resumes at
    #[serde(default = "SchedulerConfig::default_bootstrap_entry")]
    pub bootstrap_entry: u64,
}

impl SchedulerConfig {
    fn default_max_tasks() -> usize {
        defaults::MAX_TASKS
    }

    fn default_tcb_base() -> u64 {
        defaults::TCB_BASE
    }

    fn default_stack_base() -> u64 {
        defaults::STACK_BASE
    }

    fn default_stack_words() -> u64 {
        defaults::STACK_WORDS
    }

    fn default_bootstrap_entry() -> u64 {
        defaults::BOOTSTRAP_ENTRY
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: SchedulePolicy::default(),
            max_tasks: defaults::MAX_TASKS,
            tcb_base: defaults::TCB_BASE,
            stack_base: defaults::STACK_BASE,
            stack_words: defaults::STACK_WORDS,
            bootstrap_entry: defaults::BOOTSTRAP_ENTRY,
        }
    }
}

/// Benchmark harness configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchConfig {
    /// Ping-pong iterations in the stress scenario
    #[serde(default = "BenchConfig::default_stress_iterations")]
    pub stress_iterations: u64,

    /// Registers the simulated software switch saves and restores
    #[serde(default = "BenchConfig::default_baseline_registers")]
    pub baseline_registers: u64,
}

impl BenchConfig {
    fn default_stress_iterations() -> u64 {
        defaults::STRESS_ITERATIONS
    }

    fn default_baseline_registers() -> u64 {
        defaults::BASELINE_REGISTERS
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            stress_iterations: defaults::STRESS_ITERATIONS,
            baseline_registers: defaults::BASELINE_REGISTERS,
        }
    }
}
