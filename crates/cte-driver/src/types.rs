//! Declarative schedule model: outputs, actions, events and time tables.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

/// Number of physical output lines the CTE can drive.
pub const OUTPUT_COUNT: usize = 16;
/// Maximum events in a table used alone.
pub const MAX_LARGE_TABLE_LEN: usize = 64;
/// Maximum events per table in two-table toggle mode.
pub const MAX_SMALL_TABLE_LEN: usize = 32;
/// Largest internal RFS/RCS input delay, in CTE clock ticks.
pub const MAX_INPUT_DELAY: u8 = 15;

/// CTE output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum OutputSignal {
    Spt0 = 0,
    Spt1 = 1,
    Spt2 = 2,
    Spt3 = 3,
    Ctep0 = 4,
    Ctep1 = 5,
    Ctep2 = 6,
    Ctep3 = 7,
    Ctep4 = 8,
    Ctep5 = 9,
    Ctep6 = 10,
    Ctep7 = 11,
    SptRcs = 12,
    SptRfs = 13,
    Flex0 = 14,
    Flex1 = 15,
}

impl OutputSignal {
    /// All outputs in hardware order.
    pub const ALL: [Self; OUTPUT_COUNT] = [
        Self::Spt0,
        Self::Spt1,
        Self::Spt2,
        Self::Spt3,
        Self::Ctep0,
        Self::Ctep1,
        Self::Ctep2,
        Self::Ctep3,
        Self::Ctep4,
        Self::Ctep5,
        Self::Ctep6,
        Self::Ctep7,
        Self::SptRcs,
        Self::SptRfs,
        Self::Flex0,
        Self::Flex1,
    ];

    /// Hardware index of the line (`0..16`).
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Decodes a hardware index.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < OUTPUT_COUNT {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// SPT trigger event lines, sharing one LUT mask bit.
    #[must_use]
    pub const fn is_spt(self) -> bool {
        (self as u8) < (Self::Ctep0 as u8)
    }

    /// Physical pad lines.
    #[must_use]
    pub const fn is_ctep(self) -> bool {
        (self as u8) >= (Self::Ctep0 as u8) && (self as u8) <= (Self::Ctep7 as u8)
    }

    /// Radar chirp/frame start lines.
    #[must_use]
    pub const fn is_rcs_rfs(self) -> bool {
        matches!(self, Self::SptRcs | Self::SptRfs)
    }

    /// Flextimer lines.
    #[must_use]
    pub const fn is_flex(self) -> bool {
        (self as u8) > (Self::SptRfs as u8)
    }

    /// Position relative to the first non-SPT line, for CTEP/RCS/RFS lines.
    #[must_use]
    pub const fn pad_index(self) -> Option<u8> {
        if self.is_ctep() || self.is_rcs_rfs() {
            Some(self as u8 - Self::Ctep0 as u8)
        } else {
            None
        }
    }
}

impl fmt::Display for OutputSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Electrical behaviour configured for an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum SignalType {
    /// High impedance, the reset default.
    #[default]
    HiZ = 0,
    /// Low/high/flip output.
    Toggle = 1,
    /// Divided clock output.
    Clock = 2,
    /// Low/high/high-Z level output.
    Logic = 3,
}

impl SignalType {
    /// 2-bit hardware type code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// New state for a toggle output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ToggleState {
    Low = 0,
    High = 1,
    Flip = 2,
    Unchanged = 3,
}

/// New state for a logic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum LogicState {
    Low = 0,
    High = 1,
    HiZ = 2,
    Unchanged = 3,
}

/// New state for a clock output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum ClockState {
    /// Hold the clock low.
    Low = 0,
    /// Run, synchronised on the rising edge.
    ActiveSync = 1,
    /// Run freely.
    Active = 2,
    /// Hold the clock high.
    High = 3,
}

/// Requested state change, tagged with the output type it is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ActionState {
    /// State for a [`SignalType::Toggle`] output.
    Toggle(ToggleState),
    /// State for a [`SignalType::Logic`] output.
    Logic(LogicState),
    /// State for a [`SignalType::Clock`] output.
    Clock(ClockState),
}

impl ActionState {
    /// Output type this state belongs to.
    #[must_use]
    pub const fn signal_type(self) -> SignalType {
        match self {
            Self::Toggle(_) => SignalType::Toggle,
            Self::Logic(_) => SignalType::Logic,
            Self::Clock(_) => SignalType::Clock,
        }
    }

    /// 2-bit LUT code, identical to the enum discriminant of each family.
    #[must_use]
    pub const fn mask_code(self) -> u64 {
        match self {
            Self::Toggle(state) => state as u64,
            Self::Logic(state) => state as u64,
            Self::Clock(state) => state as u64,
        }
    }
}

/// Definition of one used output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SignalDefinition {
    /// Output line.
    pub output: OutputSignal,
    /// Electrical type.
    pub signal_type: SignalType,
    /// Clock period in ns, meaningful only for [`SignalType::Clock`].
    pub clock_period_ns: u32,
}

impl SignalDefinition {
    /// Defines a non-clock output.
    #[must_use]
    pub const fn new(output: OutputSignal, signal_type: SignalType) -> Self {
        Self {
            output,
            signal_type,
            clock_period_ns: 0,
        }
    }

    /// Defines a clock output with the requested period.
    #[must_use]
    pub const fn clock(output: OutputSignal, clock_period_ns: u32) -> Self {
        Self {
            output,
            signal_type: SignalType::Clock,
            clock_period_ns,
        }
    }
}

/// One output change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Action {
    /// Output to change.
    pub output: OutputSignal,
    /// Requested state.
    pub state: ActionState,
}

impl Action {
    /// Toggle-output action.
    #[must_use]
    pub const fn toggle(output: OutputSignal, state: ToggleState) -> Self {
        Self {
            output,
            state: ActionState::Toggle(state),
        }
    }

    /// Logic-output action.
    #[must_use]
    pub const fn logic(output: OutputSignal, state: LogicState) -> Self {
        Self {
            output,
            state: ActionState::Logic(state),
        }
    }

    /// Clock-output action.
    #[must_use]
    pub const fn clock(output: OutputSignal, state: ClockState) -> Self {
        Self {
            output,
            state: ActionState::Clock(state),
        }
    }
}

/// Set of actions applied at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TimingEvent {
    /// Time relative to the trigger, in ns.
    pub abs_time_ns: u32,
    /// Output changes, at most one per output.
    pub actions: Vec<Action>,
}

impl TimingEvent {
    /// Creates an event.
    #[must_use]
    pub const fn new(abs_time_ns: u32, actions: Vec<Action>) -> Self {
        Self {
            abs_time_ns,
            actions,
        }
    }
}

/// One time table: an ordered event list and an optional duration limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TimeTable {
    /// Execution time limit in ns, 0 for unlimited.
    pub exec_time_limit_ns: u32,
    /// Events in execution order.
    pub events: Vec<TimingEvent>,
}

impl TimeTable {
    /// Creates a table without execution time limit.
    #[must_use]
    pub const fn new(events: Vec<TimingEvent>) -> Self {
        Self {
            exec_time_limit_ns: 0,
            events,
        }
    }

    /// Sets the execution time limit.
    #[must_use]
    pub const fn with_exec_time_limit(mut self, exec_time_limit_ns: u32) -> Self {
        self.exec_time_limit_ns = exec_time_limit_ns;
        self
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` for a table without events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns `true` when the table needs both LUT pages on its own.
    #[must_use]
    pub fn spans_two_pages(&self) -> bool {
        self.events.len() > MAX_SMALL_TABLE_LEN
    }
}

/// Trigger source of table execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WorkingMode {
    /// Execution is started by software only.
    #[default]
    Master,
    /// RFS/RCS triggers come from external pads.
    SlaveExternal {
        /// RFS delay from detection to use, in CTE clock ticks (`0..=15`).
        rfs_delay: u8,
        /// RCS delay from detection to use, in CTE clock ticks (`0..=15`).
        rcs_delay: u8,
    },
    /// RFS/RCS triggers come from a MIPI-CSI2 receiver.
    SlaveCsi2 {
        /// MIPI-CSI2 unit.
        unit: u8,
        /// MIPI-CSI2 virtual channel.
        virtual_channel: u8,
    },
}

impl WorkingMode {
    /// Returns `true` for the slave modes.
    #[must_use]
    pub const fn is_slave(self) -> bool {
        !matches!(self, Self::Master)
    }
}

bitflags! {
    /// CTE interrupt sources.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IrqEvents: u32 {
        /// Table 0 execution started.
        const TT0_START = 0x01;
        /// Table 1 execution started.
        const TT1_START = 0x02;
        /// Table 0 execution ended.
        const TT0_END = 0x04;
        /// Table 1 execution ended.
        const TT1_END = 0x08;
        /// Rising edge of RCS.
        const RCS = 0x40;
        /// Rising edge of RFS.
        const RFS = 0x80;
        /// Table execution finished.
        const TABLE_EXEC_END = 0x200;
    }
}

/// Application callback receiving the delivered interrupt events.
pub type IrqCallback = Arc<dyn Fn(IrqEvents) + Send + Sync>;

/// Interrupt part of the setup parameters.
#[derive(Clone, Default)]
pub struct IrqSetup {
    /// Requested events.
    pub events: IrqEvents,
    /// Callback for the requested events, required when `events` is not empty.
    pub callback: Option<IrqCallback>,
    /// Core executing the handler, where the platform supports routing.
    pub exec_core: i8,
    /// Handler priority.
    pub priority: u8,
}

impl fmt::Debug for IrqSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqSetup")
            .field("events", &self.events)
            .field("callback", &self.callback.is_some())
            .field("exec_core", &self.exec_core)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Everything needed to program the CTE.
#[derive(Debug, Clone, Default)]
pub struct SetupParams {
    /// Trigger source.
    pub mode: WorkingMode,
    /// CTE input clock in Hz.
    pub clock_hz: u32,
    /// Table executions before halting, 0 repeats forever.
    pub repeat_count: u16,
    /// Output definitions for table 0.
    pub signal_def0: Option<Vec<SignalDefinition>>,
    /// Output definitions for table 1, present exactly when `table1` is.
    pub signal_def1: Option<Vec<SignalDefinition>>,
    /// First time table.
    pub table0: Option<TimeTable>,
    /// Second time table, enabling two-table toggle mode.
    pub table1: Option<TimeTable>,
    /// Interrupt configuration.
    pub irq: IrqSetup,
}

impl SetupParams {
    /// Single-table master-mode setup.
    #[must_use]
    pub fn single_table(clock_hz: u32, signals: Vec<SignalDefinition>, table: TimeTable) -> Self {
        Self {
            clock_hz,
            signal_def0: Some(signals),
            table0: Some(table),
            ..Self::default()
        }
    }

    /// Adds the second table and its output definitions.
    #[must_use]
    pub fn with_second_table(mut self, signals: Vec<SignalDefinition>, table: TimeTable) -> Self {
        self.signal_def1 = Some(signals);
        self.table1 = Some(table);
        self
    }

    /// Sets the trigger source.
    #[must_use]
    pub const fn with_mode(mut self, mode: WorkingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the repeat count.
    #[must_use]
    pub const fn with_repeat_count(mut self, repeat_count: u16) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    /// Requests interrupt events delivered to `callback`.
    #[must_use]
    pub fn with_irq(mut self, events: IrqEvents, callback: IrqCallback) -> Self {
        self.irq.events = events;
        self.irq.callback = Some(callback);
        self
    }
}
