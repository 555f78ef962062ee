use rvwin_core::Simulator;
use rvwin_core::common::Trap;
use rvwin_core::config::{Config, SchedulePolicy};
use rvwin_core::core::Cpu;
use rvwin_core::core::arch::WindowConfig;
use rvwin_core::sched::TaskId;
use rvwin_core::sim::{Step, TaskBody};

/// Entry address given to spawned test tasks.
pub const TASK_ENTRY: u64 = 0x8000_1000;

pub struct TestContext {
    pub sim: Simulator,
    pub config: Config,
}

impl TestContext {
    /// A simulator with no tasks registered.
    pub fn new(policy: SchedulePolicy) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let mut config = Config::default();
        config.scheduler.policy = policy;
        let sim = Simulator::new(&config);
        Self { sim, config }
    }

    /// The boot task in the reset window plus one bootstrap task in window 1.
    pub fn pair() -> Self {
        Self::new(SchedulePolicy::FixedPair).with_tasks(&[WindowConfig::new(32, 32)])
    }

    /// The boot task in the reset window plus `n` bootstrap tasks in
    /// consecutive full windows.
    pub fn rotating(n: usize) -> Self {
        let windows: Vec<WindowConfig> = (1..=n)
            .map(|i| WindowConfig::new((32 * i) as u16, 32))
            .collect();
        let mut ctx = Self::new(SchedulePolicy::Rotating);
        ctx.config.window.physical_registers = 32 * (n + 1);
        ctx.config.scheduler.max_tasks = n + 1;
        ctx.sim = Simulator::new(&ctx.config);
        ctx.with_tasks(&windows)
    }

    /// Adopts the boot task and spawns one bootstrap task per window.
    pub fn with_tasks(mut self, windows: &[WindowConfig]) -> Self {
        let start_pc = self.config.general.start_pc;
        let tasks = self.sim.sched.tasks_mut();
        let _ = tasks
            .adopt_boot_task(start_pc, WindowConfig::RESET)
            .expect("boot task");
        for (i, &w) in windows.iter().enumerate() {
            let _ = tasks
                .spawn(TASK_ENTRY + 0x100 * i as u64, w)
                .expect("spawn");
        }
        self
    }

    pub fn cpu(&self) -> &Cpu {
        &self.sim.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.sim.cpu
    }

    pub fn current(&self) -> TaskId {
        self.sim.current_task()
    }

    /// Starts the scheduler and issues one yield from the running task.
    pub fn start_and_yield(&mut self) {
        self.sim.start().expect("start");
        self.sim.yield_trap().expect("yield");
    }
}

/// A body that yields a fixed number of times, then exits.
pub struct YieldN {
    pub remaining: u64,
}

impl TaskBody for YieldN {
    fn resume(&mut self, _cpu: &mut Cpu) -> Result<Step, Trap> {
        if self.remaining == 0 {
            return Ok(Step::Exit);
        }
        self.remaining -= 1;
        Ok(Step::Yield)
    }
}

/// A body that always yields.
pub struct Spin;

impl TaskBody for Spin {
    fn resume(&mut self, _cpu: &mut Cpu) -> Result<Step, Trap> {
        Ok(Step::Yield)
    }
}

/// A body that writes `values` into the listed registers on every resume and
/// records what it found there first.
pub struct Scribbler {
    pub writes: Vec<(usize, u64)>,
    pub seen: Vec<Vec<u64>>,
}

impl Scribbler {
    pub fn new(writes: Vec<(usize, u64)>) -> Self {
        Self {
            writes,
            seen: Vec::new(),
        }
    }
}

impl TaskBody for Scribbler {
    fn resume(&mut self, cpu: &mut Cpu) -> Result<Step, Trap> {
        self.seen
            .push(self.writes.iter().map(|&(r, _)| cpu.regs.read(r)).collect());
        for &(reg, val) in &self.writes {
            cpu.exec_li(reg, val);
        }
        Ok(Step::Yield)
    }
}
