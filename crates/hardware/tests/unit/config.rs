//! # Configuration Tests
//!
//! Defaults, JSON deserialization and validation.

use rstest::rstest;
use rvwin_core::common::ConfigError;
use rvwin_core::config::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(!config.general.trace_instructions);
    assert!(!config.general.user_mode);
    assert_eq!(config.general.start_pc, 0x8000_0000);
    assert_eq!(config.general.trap_vector, 0x8000_0040);
    assert_eq!(config.window.physical_registers, 128);
}

#[test]
fn test_scheduler_config_defaults() {
    let sched = SchedulerConfig::default();
    assert_eq!(sched.policy, SchedulePolicy::FixedPair);
    assert_eq!(sched.max_tasks, 8);
    assert_eq!(sched.tcb_base, 0x8000_2000);
    assert_eq!(sched.stack_base, 0x8001_0000);
    assert_eq!(sched.stack_words, 1024);
    assert_eq!(sched.bootstrap_entry, 0x8000_0100);
}

#[test]
fn test_bench_config_defaults() {
    let bench = BenchConfig::default();
    assert_eq!(bench.stress_iterations, 1000);
    assert_eq!(bench.baseline_registers, 31);
}

#[test]
fn test_empty_json_is_default() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.window.physical_registers, 128);
    assert_eq!(config.scheduler.policy, SchedulePolicy::FixedPair);
}

#[test]
fn test_partial_json_keeps_other_defaults() {
    let json = r#"{
        "general": { "user_mode": true },
        "scheduler": { "policy": "round_robin", "max_tasks": 16 },
        "bench": { "stress_iterations": 10 }
    }"#;
    let config = Config::from_json(json).unwrap();
    assert!(config.general.user_mode);
    assert_eq!(config.general.start_pc, 0x8000_0000);
    assert_eq!(config.scheduler.policy, SchedulePolicy::Rotating);
    assert_eq!(config.scheduler.max_tasks, 16);
    assert_eq!(config.scheduler.tcb_base, 0x8000_2000);
    assert_eq!(config.bench.stress_iterations, 10);
    assert_eq!(config.bench.baseline_registers, 31);
}

#[test]
fn test_policy_names() {
    for (name, policy) in [
        ("\"FixedPair\"", SchedulePolicy::FixedPair),
        ("\"pair\"", SchedulePolicy::FixedPair),
        ("\"Rotating\"", SchedulePolicy::Rotating),
        ("\"rotating\"", SchedulePolicy::Rotating),
    ] {
        let parsed: SchedulePolicy = serde_json::from_str(name).unwrap();
        assert_eq!(parsed, policy);
    }
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = Config::from_json("{ \"window\": ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Config::load("/nonexistent/rvwin.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_default_config_is_valid() {
    Config::default().validate().unwrap();
}

#[test]
fn test_bank_smaller_than_reset_window_is_rejected() {
    let err = Config::from_json(r#"{ "window": { "physical_registers": 16 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::BankTooSmall { capacity: 16 }));
}

#[test]
fn test_bank_of_exactly_one_window_is_accepted() {
    let config = Config::from_json(r#"{ "window": { "physical_registers": 32 } }"#).unwrap();
    assert_eq!(config.window.physical_registers, 32);
}

#[test]
fn test_zero_stack_words_is_rejected() {
    let err = Config::from_json(r#"{ "scheduler": { "stack_words": 0 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyStack));
}

#[rstest]
#[case(r#"{ "scheduler": { "stack_base": 4294967296 } }"#, "task stacks")]
#[case(r#"{ "scheduler": { "stack_base": 4294934529 } }"#, "task stacks")]
#[case(r#"{ "scheduler": { "tcb_base": 4294967280 } }"#, "task table")]
#[case(r#"{ "scheduler": { "bootstrap_entry": 4294967296 } }"#, "bootstrap entry")]
#[case(r#"{ "general": { "start_pc": 4294967296 } }"#, "reset pc")]
fn test_region_beyond_32_bits_is_rejected(#[case] json: &str, #[case] expected: &str) {
    let err = Config::from_json(json).unwrap_err();
    match err {
        ConfigError::AddressOutOfRange { region, end } => {
            assert_eq!(region, expected);
            assert!(end > 0xFFFF_FFFF);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_stacks_ending_at_top_of_32_bit_space_are_accepted() {
    // Eight stacks of 1024 words end exactly at 4 GiB.
    let json = r#"{ "scheduler": { "stack_base": 4294934528 } }"#;
    let config = Config::from_json(json).unwrap();
    assert_eq!(config.scheduler.stack_base, 0xFFFF_8000);
}

#[test]
fn test_overflowing_stack_extent_is_rejected() {
    let mut config = Config::default();
    config.scheduler.stack_words = u64::MAX;
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::AddressOutOfRange {
            region: "task stacks",
            end: u64::MAX
        }
    ));
}

#[test]
fn test_stress_iterations_limit() {
    let mut config = Config::default();
    config.bench.stress_iterations = MAX_STRESS_ITERATIONS;
    config.validate().unwrap();

    config.bench.stress_iterations = u64::MAX;
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::TooManyIterations {
            requested: u64::MAX,
            limit: MAX_STRESS_ITERATIONS
        }
    ));
}
