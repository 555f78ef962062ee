//! Task Control Blocks.
//!
//! Each task owns a fixed register window and, unless it is the boot task, a
//! dedicated stack region. TCBs live in a table sized once from the configuration
//! and indexed by small integer ids; they are never freed.
//!
//! The simulated memory image of a TCB is four 32-bit words:
//! `sp` at +0, `pc` at +4, `window_cfg` at +8, `id` at +12.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::common::ConfigError;
use crate::common::constants::{
    ADDRESS_LIMIT, STACK_WORD, TCB_ID_OFFSET, TCB_PC_OFFSET, TCB_SIZE, TCB_SP_OFFSET, TCB_WINDOW_OFFSET,
};
use crate::config::Config;
use crate::core::arch::window::WindowConfig;

/// Index of a task in the task table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task{}", self.0)
    }
}

/// A statically allocated stack, `words` 32-bit slots starting at `base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StackRegion {
    /// Lowest address of the region.
    pub base: u64,
    /// Number of 32-bit slots.
    pub words: u64,
}

impl StackRegion {
    /// Address of the last slot (`&stack[words - 1]`), the initial stack pointer.
    pub const fn top(self) -> u64 {
        self.base + self.words.saturating_sub(1) * STACK_WORD
    }

    /// First byte past the region.
    pub const fn end(self) -> u64 {
        self.base + self.words * STACK_WORD
    }
}

/// How a task first enters its body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Launch {
    /// Already running at reset in window 0 on the system stack.
    Boot,
    /// First resumes at the bootstrap stub, which loads `sp` and jumps to the entry.
    Bootstrap,
    /// First resumes directly at its entry; it never touches its stack.
    Direct,
}

/// Saved execution state of one cooperative task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskControlBlock {
    /// Stack pointer the task resumes with.
    pub stack_pointer: u64,
    /// Resume address; written only while the task is not running.
    pub saved_pc: u64,
    /// Register window the task runs in.
    pub window_cfg: WindowConfig,
    /// Table index.
    pub id: TaskId,
    /// Address of the task body.
    pub entry: u64,
    /// Stack region, absent for the boot task.
    pub stack: Option<StackRegion>,
    /// Entry path.
    pub launch: Launch,
}

impl TaskControlBlock {
    /// The four words of the TCB memory image.
    pub const fn to_words(&self) -> [u32; 4] {
        [
            self.stack_pointer as u32,
            self.saved_pc as u32,
            self.window_cfg.raw(),
            self.id.0 as u32,
        ]
    }
}

/// Fixed-size, id-indexed task table.
#[derive(Debug)]
pub struct TaskRegistry {
    slots: Box<[Option<TaskControlBlock>]>,
    len: usize,
    bank_capacity: usize,
    tcb_base: u64,
    stack_base: u64,
    stack_words: u64,
    bootstrap_entry: u64,
}

impl TaskRegistry {
    /// Creates an empty table with `scheduler.max_tasks` slots.
    pub fn new(config: &Config) -> Self {
        let sched = &config.scheduler;
        Self {
            slots: vec![None; sched.max_tasks].into_boxed_slice(),
            len: 0,
            bank_capacity: config.window.physical_registers,
            tcb_base: sched.tcb_base,
            stack_base: sched.stack_base,
            stack_words: sched.stack_words,
            bootstrap_entry: sched.bootstrap_entry,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no task is registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the bootstrap stub.
    pub fn bootstrap_entry(&self) -> u64 {
        self.bootstrap_entry
    }

    /// Registers the task already running at reset. Its `saved_pc` is first
    /// written when it yields.
    ///
    /// # Errors
    ///
    /// `TaskTableFull`, `WindowOutOfRange`, `EmptyStack` or `AddressOutOfRange`.
    pub fn adopt_boot_task(
        &mut self,
        entry: u64,
        window_cfg: WindowConfig,
    ) -> Result<TaskId, ConfigError> {
        self.insert(entry, window_cfg, Launch::Boot)
    }

    /// Registers a task that enters through the bootstrap stub on its first run.
    ///
    /// # Errors
    ///
    /// `TaskTableFull`, `WindowOutOfRange`, `EmptyStack` or `AddressOutOfRange`.
    pub fn spawn(&mut self, entry: u64, window_cfg: WindowConfig) -> Result<TaskId, ConfigError> {
        self.insert(entry, window_cfg, Launch::Bootstrap)
    }

    /// Registers a task that resumes straight at `entry` on its first run.
    ///
    /// # Errors
    ///
    /// `TaskTableFull`, `WindowOutOfRange`, `EmptyStack` or `AddressOutOfRange`.
    pub fn spawn_direct(
        &mut self,
        entry: u64,
        window_cfg: WindowConfig,
    ) -> Result<TaskId, ConfigError> {
        self.insert(entry, window_cfg, Launch::Direct)
    }

    fn insert(
        &mut self,
        entry: u64,
        window_cfg: WindowConfig,
        launch: Launch,
    ) -> Result<TaskId, ConfigError> {
        if !window_cfg.fits(self.bank_capacity) {
            return Err(ConfigError::WindowOutOfRange {
                config: window_cfg.raw(),
                base: window_cfg.base(),
                size: window_cfg.size(),
                capacity: self.bank_capacity,
            });
        }
        if self.len == self.capacity() {
            return Err(ConfigError::TaskTableFull {
                capacity: self.capacity(),
            });
        }

        if entry >= ADDRESS_LIMIT {
            return Err(ConfigError::AddressOutOfRange {
                region: "task entry",
                end: entry.saturating_add(1),
            });
        }

        let id = TaskId(self.len);
        let stack = match launch {
            Launch::Boot => None,
            Launch::Bootstrap | Launch::Direct => Some(self.checked_stack_region(id)?),
        };
        let mut tcb = TaskControlBlock {
            stack_pointer: 0,
            saved_pc: 0,
            window_cfg,
            id,
            entry,
            stack,
            launch,
        };
        if launch != Launch::Boot {
            self.arm(&mut tcb);
        }
        debug!(%id, window = %window_cfg, ?launch, "task registered");

        self.slots[id.0] = Some(tcb);
        self.len += 1;
        Ok(id)
    }

    /// Stack region owned by task `id`, or `None` if its address overflows.
    pub fn stack_region(&self, id: TaskId) -> Option<StackRegion> {
        let len = self.stack_words.checked_mul(STACK_WORD)?;
        let base = self.stack_base.checked_add((id.0 as u64).checked_mul(len)?)?;
        base.checked_add(len).map(|_| StackRegion {
            base,
            words: self.stack_words,
        })
    }

    fn checked_stack_region(&self, id: TaskId) -> Result<StackRegion, ConfigError> {
        if self.stack_words == 0 {
            return Err(ConfigError::EmptyStack);
        }
        match self.stack_region(id) {
            Some(region) if region.end() <= ADDRESS_LIMIT => Ok(region),
            region => Err(ConfigError::AddressOutOfRange {
                region: "task stack",
                end: region.map_or(u64::MAX, StackRegion::end),
            }),
        }
    }

    /// Resets a task to run again from scratch. Calling it twice is the same as once.
    ///
    /// The boot task has no bootstrap entry or stack to return to; re-arming it is a defect.
    pub fn rearm(&mut self, id: TaskId) {
        let bootstrap_entry = self.bootstrap_entry;
        let tcb = self.get_mut(id);
        assert!(tcb.launch != Launch::Boot, "{id} is the boot task and cannot be re-armed");
        Self::arm_with(bootstrap_entry, tcb);
        debug!(%id, pc = format_args!("{:#x}", tcb.saved_pc), "task re-armed");
    }

    fn arm(&self, tcb: &mut TaskControlBlock) {
        Self::arm_with(self.bootstrap_entry, tcb);
    }

    fn arm_with(bootstrap_entry: u64, tcb: &mut TaskControlBlock) {
        tcb.stack_pointer = tcb.stack.map_or(0, StackRegion::top);
        tcb.saved_pc = match tcb.launch {
            Launch::Bootstrap => bootstrap_entry,
            Launch::Direct | Launch::Boot => tcb.entry,
        };
    }

    /// The TCB of a registered task. An unregistered id is a defect.
    pub fn get(&self, id: TaskId) -> &TaskControlBlock {
        match self.slots.get(id.0) {
            Some(Some(tcb)) => tcb,
            _ => panic!("{id} is not registered"),
        }
    }

    /// Mutable access to the TCB of a registered task. An unregistered id is a defect.
    pub fn get_mut(&mut self, id: TaskId) -> &mut TaskControlBlock {
        match self.slots.get_mut(id.0) {
            Some(Some(tcb)) => tcb,
            _ => panic!("{id} is not registered"),
        }
    }

    /// Rebinds a task to another window.
    ///
    /// # Errors
    ///
    /// `WindowOutOfRange` if the window does not fit the bank; the TCB is unchanged.
    pub fn set_window(&mut self, id: TaskId, window_cfg: WindowConfig) -> Result<(), ConfigError> {
        if !window_cfg.fits(self.bank_capacity) {
            return Err(ConfigError::WindowOutOfRange {
                config: window_cfg.raw(),
                base: window_cfg.base(),
                size: window_cfg.size(),
                capacity: self.bank_capacity,
            });
        }
        self.get_mut(id).window_cfg = window_cfg;
        Ok(())
    }

    /// Simulated address of a task's TCB; this is what `mscratch` holds.
    pub const fn address_of(&self, id: TaskId) -> u64 {
        self.tcb_base + id.0 as u64 * TCB_SIZE
    }

    /// Inverse of [`address_of`](Self::address_of). A pointer that is not a registered
    /// TCB is a defect.
    pub fn id_at(&self, addr: u64) -> TaskId {
        let offset = addr.wrapping_sub(self.tcb_base);
        assert!(
            addr >= self.tcb_base && offset % TCB_SIZE == 0,
            "{addr:#x} is not a task control block"
        );
        let id = TaskId((offset / TCB_SIZE) as usize);
        let _ = self.get(id);
        id
    }

    /// Reads the 32-bit word at `addr` from the TCB image.
    pub fn load_word(&self, addr: u64) -> u32 {
        let offset = addr.wrapping_sub(self.tcb_base) % TCB_SIZE;
        let tcb = self.get(self.id_at(addr.wrapping_sub(offset)));
        let words = tcb.to_words();
        match offset {
            TCB_SP_OFFSET => words[0],
            TCB_PC_OFFSET => words[1],
            TCB_WINDOW_OFFSET => words[2],
            TCB_ID_OFFSET => words[3],
            _ => panic!("{addr:#x} is not word aligned"),
        }
    }

    /// Iterates registered tasks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskControlBlock> {
        self.slots.iter().flatten()
    }
}
