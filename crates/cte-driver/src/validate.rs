//! Structural checks run before any register is touched.
//!
//! Every check stops at the first violation.

use crate::config::{Platform, CSI2_VIRTUAL_CHANNEL_COUNT};
use crate::error::CteError;
use crate::types::{
    SetupParams, SignalDefinition, SignalType, TimeTable, TimingEvent, WorkingMode,
    MAX_INPUT_DELAY, MAX_LARGE_TABLE_LEN, MAX_SMALL_TABLE_LEN, OUTPUT_COUNT,
};

/// Checks the trigger source against the platform.
///
/// # Errors
///
/// [`CteError::WrongCsi2Unit`], [`CteError::WrongCsi2Vc`] or
/// [`CteError::DelayOutOfRange`].
pub const fn check_mode(mode: WorkingMode, platform: Platform) -> Result<(), CteError> {
    match mode {
        WorkingMode::Master => Ok(()),
        WorkingMode::SlaveExternal {
            rfs_delay,
            rcs_delay,
        } => {
            if rfs_delay > MAX_INPUT_DELAY || rcs_delay > MAX_INPUT_DELAY {
                Err(CteError::DelayOutOfRange)
            } else {
                Ok(())
            }
        }
        WorkingMode::SlaveCsi2 {
            unit,
            virtual_channel,
        } => {
            if unit >= platform.csi2_unit_count() {
                Err(CteError::WrongCsi2Unit)
            } else if virtual_channel >= CSI2_VIRTUAL_CHANNEL_COUNT {
                Err(CteError::WrongCsi2Vc)
            } else {
                Ok(())
            }
        }
    }
}

fn check_event(event: &TimingEvent) -> Result<(), CteError> {
    if event.actions.is_empty() {
        return Err(CteError::NullPtrActions);
    }
    if event.actions.len() > OUTPUT_COUNT {
        return Err(CteError::TooManyActions);
    }
    let mut seen = 0u16;
    for action in &event.actions {
        let bit = 1u16 << action.output.index();
        if seen & bit != 0 {
            return Err(CteError::TooManyActions);
        }
        seen |= bit;
    }
    Ok(())
}

/// Checks one time table against the single-table limits.
///
/// # Errors
///
/// [`CteError::TableNotDefined`] for an empty table,
/// [`CteError::TableTooLong`] above 64 events, or the first event error.
pub fn check_table(table: &TimeTable) -> Result<(), CteError> {
    if table.is_empty() {
        return Err(CteError::TableNotDefined);
    }
    if table.len() > MAX_LARGE_TABLE_LEN {
        return Err(CteError::TableTooLong);
    }
    table.events.iter().try_for_each(check_event)
}

/// Checks the two-table toggle mode length limit.
///
/// # Errors
///
/// [`CteError::TableTooLong`] when either table exceeds 32 events.
pub fn check_pair_lengths(table0: &TimeTable, table1: &TimeTable) -> Result<(), CteError> {
    if table0.len() > MAX_SMALL_TABLE_LEN || table1.len() > MAX_SMALL_TABLE_LEN {
        return Err(CteError::TableTooLong);
    }
    Ok(())
}

/// Checks the output types of one signal definition table.
///
/// SPT lines accept Toggle or Logic and must all share the type of the
/// first SPT entry. FLEX lines accept Logic only.
///
/// # Errors
///
/// [`CteError::TooManySignalDefs`], [`CteError::SigOutWrongType`] or
/// [`CteError::SigOutDifferentType`].
pub fn check_signal_defs(defs: &[SignalDefinition]) -> Result<(), CteError> {
    if defs.len() > OUTPUT_COUNT {
        return Err(CteError::TooManySignalDefs);
    }
    let mut spt_type: Option<SignalType> = None;
    for def in defs {
        if def.output.is_spt() {
            if !matches!(def.signal_type, SignalType::Toggle | SignalType::Logic) {
                return Err(CteError::SigOutWrongType);
            }
            match spt_type {
                None => spt_type = Some(def.signal_type),
                Some(locked) if locked != def.signal_type => {
                    return Err(CteError::SigOutDifferentType);
                }
                Some(_) => {}
            }
        }
        if def.output.is_flex() && def.signal_type != SignalType::Logic {
            return Err(CteError::SigOutWrongType);
        }
    }
    Ok(())
}

/// Checks complete setup parameters in the documented order.
///
/// # Errors
///
/// The first violation found.
pub fn check_setup(params: &SetupParams, platform: Platform) -> Result<(), CteError> {
    check_mode(params.mode, platform)?;
    if params.clock_hz == 0 {
        return Err(CteError::ZeroFrequency);
    }

    let table0 = params.table0.as_ref().ok_or(CteError::NullPtrTable0)?;
    check_table(table0)?;
    let defs0 = params
        .signal_def0
        .as_deref()
        .ok_or(CteError::NullPtrSignalDef)?;
    check_signal_defs(defs0)?;

    match (&params.table1, &params.signal_def1) {
        (Some(table1), defs1) => {
            check_pair_lengths(table0, table1)?;
            let defs1 = defs1.as_deref().ok_or(CteError::NullPtrSignalDef)?;
            check_table(table1)?;
            check_signal_defs(defs1)?;
        }
        (None, Some(_)) => return Err(CteError::NotNullPtrSignalDef),
        (None, None) => {}
    }

    if !params.irq.events.is_empty() && params.irq.callback.is_none() {
        return Err(CteError::NullCallback);
    }
    Ok(())
}
