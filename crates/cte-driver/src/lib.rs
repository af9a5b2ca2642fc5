//! Driver core for the CTE timing-table peripheral of the S32R45/S32R294
//! radar processors.
//!
//! A [`Cte`] instance validates declarative time tables, compiles them into
//! the peripheral's look-up table, solves the output clock dividers and
//! programs everything through a [`RegisterBus`].

/// Stable driver status codes.
pub mod error;
pub use error::{CteError, ErrorClass};

/// CTE register layout and masked access primitives.
pub mod regs;
pub use regs::{
    Field, Register, RegisterBus, CKSM_MSB_MASK, CNTRL1_CHKSM_MD, CNTRL1_CKSM_RST, CNTRL1_CLKDIV,
    CNTRL1_CTECK_DV, CNTRL1_CTE_EN, CNTRL1_TIMEMODE, CNTRL_CTE_RST, CNTRL_MA_SL_ST,
    CNTRL_OPMOD_SL, CNTRL_RCS_DLY, CNTRL_REP_CNT, CNTRL_RFS_DLY, CNTRL_RFS_PGEN, DBG_REG_FSM_ST,
    LUT_PAGE_COUNT, LUT_SLOTS_PER_PAGE, SIGTYPE0_SPT_EVT_BIT, SRC_CTE_CTRL_IN_CTE,
    SRC_CTE_CTRL_MIPICSI2_ID, SRC_CTE_CTRL_VC_ID,
};

/// Declarative schedule data model.
pub mod types;
pub use types::{
    Action, ActionState, ClockState, IrqCallback, IrqEvents, IrqSetup, LogicState, OutputSignal,
    SetupParams, SignalDefinition, SignalType, TimeTable, TimingEvent, ToggleState, WorkingMode,
    MAX_INPUT_DELAY, MAX_LARGE_TABLE_LEN, MAX_SMALL_TABLE_LEN, OUTPUT_COUNT,
};

/// Per-instance platform configuration.
pub mod config;
pub use config::{
    CteConfig, Platform, CSI2_VIRTUAL_CHANNEL_COUNT, DEFAULT_INPUT_CLOCK_HZ, DEFAULT_IRQ_NUMBER,
};

/// Tick arithmetic and the main clock divider.
pub mod timing;
pub use timing::{
    main_divider, max_event_delay, ns_to_ticks, period_to_cycles, required_main_divider,
    scaled_mul_div, CLOCK_DIVIDER_LIMIT, MAX_TIME_COUNTER, TOO_BIG_TIME_DELAY,
};

/// Setup parameter validation.
pub mod validate;
pub use validate::{check_mode, check_pair_lengths, check_setup, check_signal_defs, check_table};

/// Output clock divider solver.
pub mod clock;
pub use clock::{
    divider_code, merge_periods, program_clock_select, solve, ClockPlan, INTERNAL_CLOCKS,
    MAX_CLOCK_DIVIDER,
};

/// Time table to LUT compiler.
pub mod compile;
pub use compile::{action_mask, compile_table, event_mask, CompiledTable, LutPage};

/// Output type register programming.
pub mod output;
pub use output::{output_type_words, program_output_types};

/// Interrupt enable programming and servicing.
pub mod irq;
pub use irq::{IrqRegistrar, IrqRequest, RegistrationRejected};

/// Error counters and the error hook.
pub mod diag;
pub use diag::{DiagCounters, ErrorHook};

/// Register-file simulation for tests and host tooling.
pub mod sim;
pub use sim::{SimulatedCte, FSM_EXECUTING};

/// Driver instance and run-state machine.
pub mod driver;
pub use driver::{Cte, DriverStatus, StartOutcome};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use serde_json as _;
