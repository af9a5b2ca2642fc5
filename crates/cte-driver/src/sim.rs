//! Register-level simulation of the CTE block.
//!
//! Models the behaviour the driver depends on: the module reset bit, the
//! LUT checksum accumulator, the execution FSM status and the
//! write-one-to-clear interrupt status. Every write is recorded.

use std::collections::BTreeMap;

use crate::compile::LutPage;
use crate::regs::{
    Register, RegisterBus, CKSM_MSB_MASK, CNTRL1_CHKSM_MD, CNTRL1_CKSM_RST, CNTRL1_CTE_EN,
    CNTRL_CTE_RST, LUT_SLOTS_PER_PAGE,
};
use crate::types::IrqEvents;

const CHECKSUM_MASK: u64 = (1 << 40) - 1;
/// FSM state reported while a table executes.
pub const FSM_EXECUTING: u32 = 1;

/// In-memory CTE register file.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCte {
    regs: BTreeMap<u32, u32>,
    writes: Vec<(Register, u32)>,
    checksum: u64,
    fsm: u32,
}

impl SimulatedCte {
    /// Creates a register file in its reset state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write since creation or the last [`Self::clear_writes`].
    #[must_use]
    pub fn writes(&self) -> &[(Register, u32)] {
        &self.writes
    }

    /// Forgets the recorded writes.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Stored value of `reg` without side effects.
    #[must_use]
    pub fn peek(&self, reg: Register) -> u32 {
        match reg {
            Register::CksmLsb => self.checksum_lsb(),
            Register::CksmMsb => self.checksum_msb(),
            Register::DbgReg => self.fsm,
            _ => self.regs.get(&reg.offset()).copied().unwrap_or(0),
        }
    }

    /// Contents of LUT page `page`.
    #[must_use]
    pub fn lut_page(&self, page: usize) -> LutPage {
        let mut image = LutPage::ZEROED;
        for slot in 0..LUT_SLOTS_PER_PAGE {
            image.lsb[slot] = self.peek(Register::LutLsb { page, slot });
            image.msb[slot] = self.peek(Register::LutMsb { page, slot });
        }
        image
    }

    /// Returns `true` while a table is executing.
    #[must_use]
    pub const fn is_executing(&self) -> bool {
        self.fsm != 0
    }

    /// Ends table execution, as after the last repetition.
    pub fn finish_execution(&mut self) {
        self.fsm = 0;
    }

    /// Latches interrupt status bits.
    pub fn raise_interrupt(&mut self, events: IrqEvents) {
        *self.regs.entry(Register::IntStat.offset()).or_default() |= events.bits();
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn checksum_lsb(&self) -> u32 {
        self.checksum as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn checksum_msb(&self) -> u32 {
        (self.checksum >> 32) as u32 & CKSM_MSB_MASK
    }

    fn reset(&mut self) {
        self.regs.clear();
        self.checksum = 0;
        self.fsm = 0;
    }

    fn write_cntrl1(&mut self, value: u32) {
        let previous = self.peek(Register::Cntrl1);
        if CNTRL1_CKSM_RST.decode(value) != 0 {
            self.checksum = 0;
        }
        let was_enabled = CNTRL1_CTE_EN.decode(previous) != 0;
        let enabled = CNTRL1_CTE_EN.decode(value) != 0;
        if enabled && !was_enabled {
            self.fsm = FSM_EXECUTING;
        } else if !enabled {
            self.fsm = 0;
        }
    }

    fn accumulate_checksum(&mut self, value: u32) {
        if CNTRL1_CHKSM_MD.decode(self.peek(Register::Cntrl1)) != 0 {
            self.checksum = self.checksum.wrapping_add(u64::from(value)) & CHECKSUM_MASK;
        }
    }
}

impl RegisterBus for SimulatedCte {
    fn read32(&mut self, reg: Register) -> u32 {
        self.peek(reg)
    }

    fn write32(&mut self, reg: Register, value: u32) {
        self.writes.push((reg, value));
        match reg {
            Register::Cntrl if CNTRL_CTE_RST.decode(value) != 0 => self.reset(),
            Register::Cntrl1 => self.write_cntrl1(value),
            Register::IntStat => {
                let status = self.peek(Register::IntStat) & !value;
                self.regs.insert(reg.offset(), status);
                return;
            }
            Register::CksmLsb | Register::CksmMsb | Register::DbgReg => return,
            _ if reg.is_lut() => self.accumulate_checksum(value),
            _ => {}
        }
        self.regs.insert(reg.offset(), value);
    }
}
