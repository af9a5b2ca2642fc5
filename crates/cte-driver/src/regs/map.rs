//! CTE register layout and bit-field descriptors.

/// Number of LUT pages (one per hardware table slot).
pub const LUT_PAGE_COUNT: usize = 2;
/// Number of event slots in one LUT page.
pub const LUT_SLOTS_PER_PAGE: usize = 32;
/// Byte offset of the first LUT page.
pub const LUT_BASE_OFFSET: u32 = 0x100;
/// Byte stride between LUT pages.
pub const LUT_PAGE_STRIDE: u32 = 0x100;
/// Byte offset of the MSB half inside a LUT page.
pub const LUT_MSB_OFFSET: u32 = 0x80;
/// Bus offset of the system-reset-controller CTE input selection register.
pub const SRC_CTE_CTRL_OFFSET: u32 = 0x1000;

/// Registers reachable through a [`crate::RegisterBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Main control: reset, master/slave, run mode, repeat count, input delays.
    Cntrl,
    /// Secondary control: enable, checksum, time mode, dividers.
    Cntrl1,
    /// Interrupt enable mask.
    IntEn,
    /// Interrupt status, write one to clear.
    IntStat,
    /// Execution time limit for table 0, in ticks.
    LutDur,
    /// Execution time limit for table 1, in ticks.
    LutDur1,
    /// Per-output clock divider selection.
    ClkSel,
    /// SPT and CTEP output types for one table slot.
    SigType0(usize),
    /// RCS/RFS output types for one table slot.
    SigType1(usize),
    /// LUT checksum, low 32 bits.
    CksmLsb,
    /// LUT checksum, high bits.
    CksmMsb,
    /// Debug register carrying the execution FSM state.
    DbgReg,
    /// LSB word of a LUT slot: tick delta and low mask bits.
    LutLsb {
        /// LUT page (`0..LUT_PAGE_COUNT`).
        page: usize,
        /// Slot inside the page (`0..LUT_SLOTS_PER_PAGE`).
        slot: usize,
    },
    /// MSB word of a LUT slot: high mask bits.
    LutMsb {
        /// LUT page (`0..LUT_PAGE_COUNT`).
        page: usize,
        /// Slot inside the page (`0..LUT_SLOTS_PER_PAGE`).
        slot: usize,
    },
    /// CTE input selection in the system reset controller.
    SrcCteCtrl,
}

impl Register {
    /// Returns the bus byte offset for this register.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn offset(self) -> u32 {
        match self {
            Self::Cntrl => 0x00,
            Self::Cntrl1 => 0x04,
            Self::IntEn => 0x08,
            Self::IntStat => 0x0C,
            Self::LutDur => 0x10,
            Self::LutDur1 => 0x14,
            Self::ClkSel => 0x18,
            Self::SigType0(slot) => 0x20 + (slot as u32) * 4,
            Self::SigType1(slot) => 0x28 + (slot as u32) * 4,
            Self::CksmLsb => 0x30,
            Self::CksmMsb => 0x34,
            Self::DbgReg => 0x38,
            Self::LutLsb { page, slot } => {
                LUT_BASE_OFFSET + (page as u32) * LUT_PAGE_STRIDE + (slot as u32) * 4
            }
            Self::LutMsb { page, slot } => {
                LUT_BASE_OFFSET
                    + (page as u32) * LUT_PAGE_STRIDE
                    + LUT_MSB_OFFSET
                    + (slot as u32) * 4
            }
            Self::SrcCteCtrl => SRC_CTE_CTRL_OFFSET,
        }
    }

    /// Returns `true` for registers inside the LUT memory.
    #[must_use]
    pub const fn is_lut(self) -> bool {
        matches!(self, Self::LutLsb { .. } | Self::LutMsb { .. })
    }
}

/// A contiguous bit field inside one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    /// Owning register.
    pub reg: Register,
    /// Aligned mask of the field.
    pub mask: u32,
    /// Position of the least significant field bit.
    pub shift: u32,
}

impl Field {
    const fn new(reg: Register, width: u32, shift: u32) -> Self {
        Self {
            reg,
            mask: ((1u32 << width) - 1) << shift,
            shift,
        }
    }

    /// Aligns `value` into the field position, discarding excess bits.
    #[must_use]
    pub const fn encode(self, value: u32) -> u32 {
        (value << self.shift) & self.mask
    }

    /// Extracts the field from a full register value.
    #[must_use]
    pub const fn decode(self, raw: u32) -> u32 {
        (raw & self.mask) >> self.shift
    }

    /// Largest value the field can hold.
    #[must_use]
    pub const fn max_value(self) -> u32 {
        self.mask >> self.shift
    }
}

/// Module reset.
pub const CNTRL_CTE_RST: Field = Field::new(Register::Cntrl, 1, 0);
/// Master (0) or slave (1) trigger source.
pub const CNTRL_MA_SL_ST: Field = Field::new(Register::Cntrl, 1, 1);
/// Operating mode: 2 single table, 3 table toggle.
pub const CNTRL_OPMOD_SL: Field = Field::new(Register::Cntrl, 2, 2);
/// Software RFS pulse generation.
pub const CNTRL_RFS_PGEN: Field = Field::new(Register::Cntrl, 1, 4);
/// Internal RFS input delay in CTE clock ticks.
pub const CNTRL_RFS_DLY: Field = Field::new(Register::Cntrl, 4, 8);
/// Internal RCS input delay in CTE clock ticks.
pub const CNTRL_RCS_DLY: Field = Field::new(Register::Cntrl, 4, 12);
/// Table repeat count, 0 repeats forever.
pub const CNTRL_REP_CNT: Field = Field::new(Register::Cntrl, 16, 16);

/// Table execution enable.
pub const CNTRL1_CTE_EN: Field = Field::new(Register::Cntrl1, 1, 0);
/// LUT checksum computation mode.
pub const CNTRL1_CHKSM_MD: Field = Field::new(Register::Cntrl1, 1, 1);
/// LUT checksum reset.
pub const CNTRL1_CKSM_RST: Field = Field::new(Register::Cntrl1, 1, 2);
/// Time mode: 0 relative, 1 absolute.
pub const CNTRL1_TIMEMODE: Field = Field::new(Register::Cntrl1, 1, 3);
/// Main table clock divider.
pub const CNTRL1_CTECK_DV: Field = Field::new(Register::Cntrl1, 6, 8);
/// Output clock divider codes, one per internal clock.
pub const CNTRL1_CLKDIV: [Field; 4] = [
    Field::new(Register::Cntrl1, 3, 16),
    Field::new(Register::Cntrl1, 3, 20),
    Field::new(Register::Cntrl1, 3, 24),
    Field::new(Register::Cntrl1, 3, 28),
];

/// SPT events used as toggle (pulse) outputs.
pub const SIGTYPE0_SPT_EVT_BIT: u32 = 0;

/// Execution FSM state, 0 when halted.
pub const DBG_REG_FSM_ST: Field = Field::new(Register::DbgReg, 4, 0);

/// Input from external pads (0) or MIPI-CSI2 (1).
pub const SRC_CTE_CTRL_IN_CTE: Field = Field::new(Register::SrcCteCtrl, 1, 0);
/// MIPI-CSI2 virtual channel used as trigger source.
pub const SRC_CTE_CTRL_VC_ID: Field = Field::new(Register::SrcCteCtrl, 2, 1);
/// MIPI-CSI2 unit used as trigger source.
pub const SRC_CTE_CTRL_MIPICSI2_ID: Field = Field::new(Register::SrcCteCtrl, 2, 3);

/// Mask of the significant checksum MSB bits (40-bit checksum).
pub const CKSM_MSB_MASK: u32 = 0xFF;

const _: () = assert_register_layout();

const fn assert_register_layout() {
    assert!(
        Register::LutMsb {
            page: LUT_PAGE_COUNT - 1,
            slot: LUT_SLOTS_PER_PAGE - 1
        }
        .offset()
            < SRC_CTE_CTRL_OFFSET,
        "lut must not overlap the input selection window"
    );
    assert!(
        Register::DbgReg.offset() < LUT_BASE_OFFSET,
        "control block must end before the lut"
    );
    assert!(
        LUT_MSB_OFFSET == (LUT_SLOTS_PER_PAGE as u32) * 4,
        "msb half must follow the lsb half"
    );
    assert!(
        CNTRL1_CTECK_DV.max_value() == 63,
        "main divider field must hold values below 64"
    );
}
