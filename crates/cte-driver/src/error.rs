use thiserror::Error;

/// Error classes used for diagnostics aggregation and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Malformed setup parameters, tables or signal definitions.
    Parameter,
    /// Requested clocking cannot be realised by the divider hardware.
    Capacity,
    /// Operation invoked in the wrong lifecycle state.
    State,
    /// An event action could not be mapped onto the LUT encoding.
    Mapping,
    /// Platform collaborator (register map, interrupt glue) failure.
    Hardware,
}

/// Stable status taxonomy reported by every driver entry point.
///
/// The numeric codes follow declaration order and are stable across
/// releases so that they can be forwarded over a transport as a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum CteError {
    /// Working mode is not usable on this platform.
    #[error("wrong working mode requested")]
    WrongMode = 0x00,
    /// Input clock frequency is zero.
    #[error("input clock frequency is zero")]
    ZeroFrequency = 0x01,
    /// Time table 0 is missing.
    #[error("time table 0 is missing")]
    NullPtrTable0 = 0x02,
    /// A time table has no matching signal definition table.
    #[error("signal definition table is missing")]
    NullPtrSignalDef = 0x03,
    /// A time table has no events.
    #[error("time table events are missing")]
    NullPtrEvents = 0x04,
    /// A timing event has an empty action list.
    #[error("timing event has no actions")]
    NullPtrActions = 0x05,
    /// A clock-typed output requested a zero period.
    #[error("clock output period is zero")]
    NullClockPeriod = 0x06,
    /// Interrupt events were requested without a callback.
    #[error("interrupt events requested without a callback")]
    NullCallback = 0x07,
    /// A second signal definition table was given without a second time table.
    #[error("second signal definition table given without a second time table")]
    NotNullPtrSignalDef = 0x08,
    /// MIPI-CSI2 unit is not available on this platform.
    #[error("wrong MIPI-CSI2 unit")]
    WrongCsi2Unit = 0x09,
    /// MIPI-CSI2 virtual channel is out of range.
    #[error("wrong MIPI-CSI2 virtual channel")]
    WrongCsi2Vc = 0x0A,
    /// Time table exceeds 64 events, or 32 events in two-table mode.
    #[error("time table is too long")]
    TableTooLong = 0x0B,
    /// An event carries more actions than there are outputs.
    #[error("too many actions in a single event")]
    TooManyActions = 0x0C,
    /// Requested clock periods cannot be grouped onto four dividers.
    #[error("too many different clocks requested")]
    TooManyClocks = 0x0D,
    /// A divider exceeds its hardware limit.
    #[error("clock divider out of range")]
    ClockDividerError = 0x0E,
    /// An action requested a state that does not belong to its output type.
    #[error("output state does not match the output type")]
    SigOutStateWrong = 0x0F,
    /// Output type is not allowed for this output line.
    #[error("wrong type for output")]
    SigOutWrongType = 0x10,
    /// SPT outputs of one table use different types.
    #[error("different types defined for SPT outputs")]
    SigOutDifferentType = 0x11,
    /// An action refers to an output that is not defined for the table.
    #[error("output used in actions is not defined")]
    SigNotDefined = 0x12,
    /// Driver was not set up, or the setup failed.
    #[error("driver not initialized")]
    NotInitialized = 0x13,
    /// Peripheral is already executing its tables.
    #[error("driver already running")]
    Running = 0x14,
    /// Peripheral is not executing.
    #[error("driver not running")]
    NotRunning = 0x15,
    /// Presence of table 1 differs from the configured setup.
    #[error("table 1 does not match the configured table mode")]
    WrongPtrTable1 = 0x16,
    /// Interrupt handler registration failed.
    #[error("interrupt handler registration failed")]
    IrqRegisterFailed = 0x17,
    /// A time table has zero events.
    #[error("time table is not well defined")]
    TableNotDefined = 0x18,
    /// Signal definition table is longer than the number of outputs.
    #[error("too many signal definitions")]
    TooManySignalDefs = 0x19,
    /// External RFS/RCS input delay exceeds 15 ticks.
    #[error("input delay out of range")]
    DelayOutOfRange = 0x1A,
}

impl CteError {
    /// Converts the error to its stable one-byte status code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable status code back into an error.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::WrongMode),
            0x01 => Some(Self::ZeroFrequency),
            0x02 => Some(Self::NullPtrTable0),
            0x03 => Some(Self::NullPtrSignalDef),
            0x04 => Some(Self::NullPtrEvents),
            0x05 => Some(Self::NullPtrActions),
            0x06 => Some(Self::NullClockPeriod),
            0x07 => Some(Self::NullCallback),
            0x08 => Some(Self::NotNullPtrSignalDef),
            0x09 => Some(Self::WrongCsi2Unit),
            0x0A => Some(Self::WrongCsi2Vc),
            0x0B => Some(Self::TableTooLong),
            0x0C => Some(Self::TooManyActions),
            0x0D => Some(Self::TooManyClocks),
            0x0E => Some(Self::ClockDividerError),
            0x0F => Some(Self::SigOutStateWrong),
            0x10 => Some(Self::SigOutWrongType),
            0x11 => Some(Self::SigOutDifferentType),
            0x12 => Some(Self::SigNotDefined),
            0x13 => Some(Self::NotInitialized),
            0x14 => Some(Self::Running),
            0x15 => Some(Self::NotRunning),
            0x16 => Some(Self::WrongPtrTable1),
            0x17 => Some(Self::IrqRegisterFailed),
            0x18 => Some(Self::TableNotDefined),
            0x19 => Some(Self::TooManySignalDefs),
            0x1A => Some(Self::DelayOutOfRange),
            _ => None,
        }
    }

    /// Returns the diagnostics class for this error.
    #[must_use]
    pub const fn class(self) -> ErrorClass {
        match self {
            Self::WrongMode
            | Self::ZeroFrequency
            | Self::NullPtrTable0
            | Self::NullPtrSignalDef
            | Self::NullPtrEvents
            | Self::NullPtrActions
            | Self::NullCallback
            | Self::NotNullPtrSignalDef
            | Self::WrongCsi2Unit
            | Self::WrongCsi2Vc
            | Self::TableTooLong
            | Self::TooManyActions
            | Self::SigOutWrongType
            | Self::SigOutDifferentType
            | Self::WrongPtrTable1
            | Self::TableNotDefined
            | Self::TooManySignalDefs
            | Self::DelayOutOfRange => ErrorClass::Parameter,
            Self::NullClockPeriod | Self::TooManyClocks | Self::ClockDividerError => {
                ErrorClass::Capacity
            }
            Self::NotInitialized | Self::Running | Self::NotRunning => ErrorClass::State,
            Self::SigOutStateWrong | Self::SigNotDefined => ErrorClass::Mapping,
            Self::IrqRegisterFailed => ErrorClass::Hardware,
        }
    }
}
