//! Register layout of the CTE block and the access primitives built on it.

/// Masked read/modify/write primitives.
pub mod access;
/// Register offsets and bit fields.
pub mod map;

pub use access::RegisterBus;
pub use map::{
    Field, Register, CKSM_MSB_MASK, CNTRL1_CHKSM_MD, CNTRL1_CKSM_RST, CNTRL1_CLKDIV,
    CNTRL1_CTECK_DV, CNTRL1_CTE_EN, CNTRL1_TIMEMODE, CNTRL_CTE_RST, CNTRL_MA_SL_ST,
    CNTRL_OPMOD_SL, CNTRL_RCS_DLY, CNTRL_REP_CNT, CNTRL_RFS_DLY, CNTRL_RFS_PGEN, DBG_REG_FSM_ST,
    LUT_PAGE_COUNT, LUT_SLOTS_PER_PAGE, SIGTYPE0_SPT_EVT_BIT, SRC_CTE_CTRL_IN_CTE,
    SRC_CTE_CTRL_MIPICSI2_ID, SRC_CTE_CTRL_VC_ID,
};
