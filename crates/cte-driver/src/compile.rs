//! Time table compilation into LUT pages.
//!
//! Each event occupies one LUT slot: the LSB word carries the tick delta to
//! the previous event ORed with the low mask bits, the MSB word the high mask
//! bits. Two-bit output fields start at bit 32; the SPT lines share bit 28
//! and the FLEX lines use bits 33 and 34.

use log::trace;

use crate::error::CteError;
use crate::regs::{Register, RegisterBus, LUT_PAGE_COUNT, LUT_SLOTS_PER_PAGE};
use crate::timing::ns_to_ticks;
use crate::types::{
    Action, ActionState, LogicState, OutputSignal, SignalDefinition, SignalType, TimeTable,
    MAX_LARGE_TABLE_LEN,
};

/// Shared mask bit of the SPT lines.
pub const SPT_SIGNAL_MASK: u64 = 0x1000_0000;
/// Mask bit of [`OutputSignal::Flex0`]; [`OutputSignal::Flex1`] uses the next bit.
pub const FLEX_SIGNAL_MASK: u64 = 1 << 33;
/// First bit of the two-bit output fields.
pub const OUTPUT_MASK_SHIFT_BASE: u32 = 32;
/// MSB word of an untouched slot: SPT low, FLEX low, all other lines unchanged.
pub const UNCHANGED_MSB_PATTERN: u32 = 0x6F_FFFF;

/// One LUT page of 32 slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LutPage {
    /// Tick delta and low mask bits per slot.
    pub lsb: [u32; LUT_SLOTS_PER_PAGE],
    /// High mask bits per slot.
    pub msb: [u32; LUT_SLOTS_PER_PAGE],
}

impl LutPage {
    /// Page with every word cleared.
    pub const ZEROED: Self = Self {
        lsb: [0; LUT_SLOTS_PER_PAGE],
        msb: [0; LUT_SLOTS_PER_PAGE],
    };

    /// First page of a table before events are placed: slot 0 drives every
    /// output to its default, the rest leave outputs unchanged.
    #[must_use]
    pub const fn with_defaults() -> Self {
        let mut msb = [UNCHANGED_MSB_PATTERN; LUT_SLOTS_PER_PAGE];
        msb[0] = 0;
        Self {
            lsb: [0; LUT_SLOTS_PER_PAGE],
            msb,
        }
    }

    /// Writes the page into LUT page `page`, LSB then MSB per slot.
    pub fn write_to<B: RegisterBus + ?Sized>(&self, bus: &mut B, page: usize) {
        trace!("writing lut page {page}");
        for slot in 0..LUT_SLOTS_PER_PAGE {
            bus.write32(Register::LutLsb { page, slot }, self.lsb[slot]);
            bus.write32(Register::LutMsb { page, slot }, self.msb[slot]);
        }
    }
}

impl Default for LutPage {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// LUT image of one time table, one page or two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTable {
    pages: Vec<LutPage>,
}

impl CompiledTable {
    /// Compiled pages in LUT order.
    #[must_use]
    pub fn pages(&self) -> &[LutPage] {
        &self.pages
    }

    /// Returns `true` when the table occupies both LUT pages.
    #[must_use]
    pub fn spans_two_pages(&self) -> bool {
        self.pages.len() == LUT_PAGE_COUNT
    }

    /// Writes the pages starting at LUT page `first_page`.
    pub fn write_to<B: RegisterBus + ?Sized>(&self, bus: &mut B, first_page: usize) {
        for (offset, page) in self.pages.iter().enumerate() {
            page.write_to(bus, first_page + offset);
        }
    }
}

fn flex_mask(action: &Action, bit: u64) -> Result<u64, CteError> {
    match action.state {
        ActionState::Logic(LogicState::Low) => Ok(0),
        ActionState::Logic(_) => Ok(bit),
        _ => Err(CteError::SigOutStateWrong),
    }
}

/// Mask bits contributed by one action.
///
/// # Errors
///
/// [`CteError::SigNotDefined`] when the output has no definition,
/// [`CteError::SigOutStateWrong`] when the state belongs to another type.
pub fn action_mask(action: &Action, defs: &[SignalDefinition]) -> Result<u64, CteError> {
    match action.output {
        OutputSignal::Flex0 => return flex_mask(action, FLEX_SIGNAL_MASK),
        OutputSignal::Flex1 => return flex_mask(action, FLEX_SIGNAL_MASK << 1),
        _ => {}
    }
    let def = defs
        .iter()
        .find(|def| def.output == action.output)
        .ok_or(CteError::SigNotDefined)?;
    if def.signal_type == SignalType::HiZ {
        return Ok(0);
    }
    if action.state.signal_type() != def.signal_type {
        return Err(CteError::SigOutStateWrong);
    }

    let code = action.state.mask_code();
    if action.output.is_spt() {
        return Ok(if code == 0 { 0 } else { SPT_SIGNAL_MASK });
    }
    Ok(action.output.pad_index().map_or(0, |pad| {
        code << (OUTPUT_MASK_SHIFT_BASE + u32::from(pad) * 2)
    }))
}

/// Combined mask of one event's actions.
///
/// # Errors
///
/// The first [`action_mask`] error.
pub fn event_mask(actions: &[Action], defs: &[SignalDefinition]) -> Result<u64, CteError> {
    actions
        .iter()
        .try_fold(0u64, |mask, action| Ok(mask | action_mask(action, defs)?))
}

/// Compiles a time table with the given timing resolution.
///
/// # Errors
///
/// [`CteError::NullPtrEvents`] for an empty table,
/// [`CteError::TableTooLong`] above 64 events, or the first mask error.
#[allow(clippy::cast_possible_truncation)]
pub fn compile_table(
    table: &TimeTable,
    defs: &[SignalDefinition],
    clock_hz: u32,
    main_divider: u8,
) -> Result<CompiledTable, CteError> {
    if table.is_empty() {
        return Err(CteError::NullPtrEvents);
    }
    if table.len() > MAX_LARGE_TABLE_LEN {
        return Err(CteError::TableTooLong);
    }

    let mut pages = vec![LutPage::with_defaults()];
    if table.spans_two_pages() {
        pages.push(LutPage::ZEROED);
    }

    let mut previous_tick = 0u32;
    for (index, event) in table.events.iter().enumerate() {
        let mask = event_mask(&event.actions, defs)?;
        let tick = ns_to_ticks(event.abs_time_ns, clock_hz, main_divider);
        let delta = match tick.wrapping_sub(previous_tick) {
            0 => 1,
            delta => delta,
        };
        previous_tick = tick;

        let page = &mut pages[index / LUT_SLOTS_PER_PAGE];
        let slot = index % LUT_SLOTS_PER_PAGE;
        page.lsb[slot] = delta | mask as u32;
        page.msb[slot] = (mask >> 32) as u32;
    }
    Ok(CompiledTable { pages })
}
