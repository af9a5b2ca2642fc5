//! Output type registers (`SIGTYPE0`/`SIGTYPE1`) of one table slot.

use crate::regs::{Register, RegisterBus, SIGTYPE0_SPT_EVT_BIT};
use crate::types::{OutputSignal, SignalDefinition, SignalType};

/// First bit of the CTEP type fields in `SIGTYPE0`.
const CTEP_TYPE_SHIFT_BASE: u32 = 16;

/// `SIGTYPE0`/`SIGTYPE1` words for one signal definition table.
///
/// FLEX lines carry no type field.
#[must_use]
pub fn output_type_words(defs: &[SignalDefinition]) -> (u32, u32) {
    defs.iter().fold((0u32, 0u32), |(sigtype0, sigtype1), def| {
        let output = def.output;
        if output.is_spt() {
            if def.signal_type == SignalType::Toggle {
                return (sigtype0 | (1 << SIGTYPE0_SPT_EVT_BIT), sigtype1);
            }
        } else if output.is_ctep() {
            let index = u32::from(output.index() - OutputSignal::Ctep0.index());
            let shift = CTEP_TYPE_SHIFT_BASE + index * 2;
            return (sigtype0 | (def.signal_type.code() << shift), sigtype1);
        } else if output.is_rcs_rfs() {
            let shift = u32::from(output.index() - OutputSignal::SptRcs.index()) * 2;
            return (sigtype0, sigtype1 | (def.signal_type.code() << shift));
        }
        (sigtype0, sigtype1)
    })
}

/// Resets the type registers of `slot` to HiZ, then programs `defs`.
pub fn program_output_types<B: RegisterBus + ?Sized>(
    bus: &mut B,
    defs: &[SignalDefinition],
    slot: usize,
) {
    bus.write32(Register::SigType0(slot), 0);
    bus.write32(Register::SigType1(slot), 0);
    let (sigtype0, sigtype1) = output_type_words(defs);
    if sigtype0 != 0 {
        bus.write_masked_field(Register::SigType0(slot), sigtype0, sigtype0);
    }
    if sigtype1 != 0 {
        bus.write_masked_field(Register::SigType1(slot), sigtype1, sigtype1);
    }
}

#[cfg(test)]
mod tests {
    use super::output_type_words;
    use crate::types::{OutputSignal, SignalDefinition, SignalType};

    #[test]
    fn toggle_spt_sets_the_event_bit_and_logic_spt_does_not() {
        let toggle = [SignalDefinition::new(OutputSignal::Spt2, SignalType::Toggle)];
        let logic = [SignalDefinition::new(OutputSignal::Spt2, SignalType::Logic)];
        assert_eq!(output_type_words(&toggle), (1, 0));
        assert_eq!(output_type_words(&logic), (0, 0));
    }

    #[test]
    fn pad_types_land_in_their_fields() {
        let defs = [
            SignalDefinition::new(OutputSignal::Ctep0, SignalType::Toggle),
            SignalDefinition::clock(OutputSignal::Ctep3, 100),
            SignalDefinition::new(OutputSignal::Ctep7, SignalType::Logic),
            SignalDefinition::new(OutputSignal::SptRcs, SignalType::Logic),
            SignalDefinition::new(OutputSignal::SptRfs, SignalType::Toggle),
            SignalDefinition::new(OutputSignal::Flex1, SignalType::Logic),
        ];
        let (sigtype0, sigtype1) = output_type_words(&defs);
        assert_eq!(sigtype0, (1 << 16) | (2 << 22) | (3 << 30));
        assert_eq!(sigtype1, 3 | (1 << 2));
    }
}
