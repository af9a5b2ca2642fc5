//! Output clock divider solver and clock selection.
//!
//! All Clock-typed outputs of both tables share four hardware dividers. The
//! requested periods are sorted and deduplicated; when more than four remain,
//! neighbours below twice a cluster representative are merged and the
//! representative is pulled toward the largest merged period.

use crate::error::CteError;
use crate::regs::{Register, RegisterBus, CNTRL1_CLKDIV};
use crate::timing::{period_to_cycles, scaled_mul_div};
use crate::types::{SignalDefinition, SignalType};

/// Number of output clock dividers.
pub const INTERNAL_CLOCKS: usize = 4;
/// Largest realisable output clock divider.
pub const MAX_CLOCK_DIVIDER: u32 = 192;

/// Dividers chosen for the Clock-typed outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockPlan {
    periods_ns: [u32; INTERNAL_CLOCKS],
    codes: [u8; INTERNAL_CLOCKS],
    used: usize,
}

impl ClockPlan {
    /// Representative period of every used divider, in divider order.
    #[must_use]
    pub fn periods_ns(&self) -> &[u32] {
        &self.periods_ns[..self.used]
    }

    /// `CLKDIV_n` code of every used divider.
    #[must_use]
    pub fn codes(&self) -> &[u8] {
        &self.codes[..self.used]
    }

    /// Number of programmed dividers.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Returns `true` when no output needs a clock.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Divider index serving `period_ns`.
    ///
    /// The first divider within ±50% of the request wins; otherwise the
    /// nearest one. `None` for an empty plan.
    #[must_use]
    pub fn select(&self, period_ns: u32) -> Option<usize> {
        let low = period_ns - period_ns / 2;
        let high = period_ns.saturating_add(period_ns / 2);
        let periods = self.periods_ns();
        periods
            .iter()
            .position(|period| (low..=high).contains(period))
            .or_else(|| {
                periods
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, period)| period.abs_diff(period_ns))
                    .map(|(index, _)| index)
            })
    }

    /// Writes the `CLKDIV_n` fields of the used dividers.
    pub fn program<B: RegisterBus + ?Sized>(&self, bus: &mut B) {
        for (field, code) in CNTRL1_CLKDIV.iter().zip(self.codes()) {
            bus.write_field(*field, u32::from(*code));
        }
    }
}

/// Collects the periods of all Clock-typed outputs, table 0 first.
///
/// # Errors
///
/// [`CteError::NullClockPeriod`] for a clock output with a zero period.
pub fn collect_periods(
    defs0: &[SignalDefinition],
    defs1: Option<&[SignalDefinition]>,
) -> Result<Vec<u32>, CteError> {
    defs0
        .iter()
        .chain(defs1.unwrap_or_default())
        .filter(|def| def.signal_type == SignalType::Clock)
        .map(|def| {
            if def.clock_period_ns == 0 {
                Err(CteError::NullClockPeriod)
            } else {
                Ok(def.clock_period_ns)
            }
        })
        .collect()
}

/// Merges sorted distinct periods into at most [`INTERNAL_CLOCKS`] clusters.
///
/// # Errors
///
/// [`CteError::TooManyClocks`] when a fifth cluster would be opened.
pub fn merge_periods(sorted: &[u32]) -> Result<Vec<u32>, CteError> {
    let Some((&first, rest)) = sorted.split_first() else {
        return Ok(Vec::new());
    };
    let mut clusters = vec![first];
    let mut merged = 1u32;
    let mut last = first;
    for &period in rest {
        let representative = clusters[clusters.len() - 1];
        if u64::from(period) < 2 * u64::from(representative) {
            merged += 1;
        } else {
            if merged > 1 {
                close_cluster(&mut clusters, last);
                merged = 1;
            }
            if clusters.len() >= INTERNAL_CLOCKS {
                return Err(CteError::TooManyClocks);
            }
            clusters.push(period);
        }
        last = period;
    }
    if merged > 1 {
        close_cluster(&mut clusters, last);
    }
    Ok(clusters)
}

fn close_cluster(clusters: &mut [u32], last_merged: u32) {
    if let Some(representative) = clusters.last_mut() {
        *representative = scaled_mul_div(
            *representative,
            last_merged,
            8,
            10,
            *representative,
        );
    }
}

/// Encodes a linear divider into the 3-bit `CLKDIV` code.
///
/// Codes step through dividers 1, 3, 6, 12, 24, 48, 96, 192; the first
/// value not below `divider` is selected.
#[must_use]
pub fn divider_code(divider: u32) -> u8 {
    let mut code = 0u8;
    let mut rotation = 1u32;
    let mut realised = 1u32;
    while divider > realised {
        code += 1;
        realised = realised * 2 + (rotation & 1);
        rotation <<= 2;
    }
    code
}

/// Chooses the output clock dividers for both signal tables.
///
/// # Errors
///
/// [`CteError::NullClockPeriod`], [`CteError::TooManyClocks`] or
/// [`CteError::ClockDividerError`] when a divider exceeds 192.
pub fn solve(
    defs0: &[SignalDefinition],
    defs1: Option<&[SignalDefinition]>,
    clock_hz: u32,
) -> Result<ClockPlan, CteError> {
    let mut periods = collect_periods(defs0, defs1)?;
    periods.sort_unstable();
    periods.dedup();
    let clusters = if periods.len() > INTERNAL_CLOCKS {
        merge_periods(&periods)?
    } else {
        periods
    };

    let mut plan = ClockPlan::default();
    for (slot, period) in clusters.into_iter().enumerate() {
        let divider = period_to_cycles(period, clock_hz);
        if divider > MAX_CLOCK_DIVIDER {
            return Err(CteError::ClockDividerError);
        }
        plan.periods_ns[slot] = period;
        plan.codes[slot] = divider_code(divider);
        plan.used = slot + 1;
    }
    Ok(plan)
}

/// Routes every Clock-typed output onto its divider in `CLKSEL`.
///
/// Outputs already routed by an earlier definition keep their divider.
pub fn program_clock_select<B: RegisterBus + ?Sized>(
    bus: &mut B,
    plan: &ClockPlan,
    defs0: &[SignalDefinition],
    defs1: Option<&[SignalDefinition]>,
) {
    let mut routed = 0u16;
    for def in defs0.iter().chain(defs1.unwrap_or_default()) {
        if def.signal_type != SignalType::Clock {
            continue;
        }
        let (Some(pad), Some(index)) = (def.output.pad_index(), plan.select(def.clock_period_ns))
        else {
            continue;
        };
        if routed & (1 << pad) != 0 {
            continue;
        }
        routed |= 1 << pad;
        let shift = u32::from(pad) * 2;
        #[allow(clippy::cast_possible_truncation)]
        let value = (index as u32) << shift;
        bus.write_masked_field(Register::ClkSel, 0b11 << shift, value);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{divider_code, merge_periods, solve, ClockPlan, INTERNAL_CLOCKS};
    use crate::error::CteError;
    use crate::types::{OutputSignal, SignalDefinition};

    fn clocks(periods: &[u32]) -> Vec<SignalDefinition> {
        periods
            .iter()
            .zip(OutputSignal::ALL.iter().skip(4))
            .map(|(period, output)| SignalDefinition::clock(*output, *period))
            .collect()
    }

    #[rstest]
    #[case(1, 0)]
    #[case(2, 1)]
    #[case(3, 1)]
    #[case(4, 2)]
    #[case(6, 2)]
    #[case(7, 3)]
    #[case(12, 3)]
    #[case(24, 4)]
    #[case(48, 5)]
    #[case(96, 6)]
    #[case(97, 7)]
    #[case(192, 7)]
    fn divider_codes_follow_the_hardware_ladder(#[case] divider: u32, #[case] code: u8) {
        assert_eq!(divider_code(divider), code);
    }

    #[test]
    fn five_periods_with_one_outlier_form_two_clusters() {
        assert_eq!(merge_periods(&[100, 110, 120, 130, 1000]), Ok(vec![104, 1000]));
    }

    #[test]
    fn widely_spread_periods_exceed_the_divider_count() {
        assert_eq!(
            merge_periods(&[10, 30, 90, 270, 810]),
            Err(CteError::TooManyClocks)
        );
    }

    #[test]
    fn duplicates_collapse_before_clustering() {
        let plan = solve(&clocks(&[200, 100, 200, 100]), None, 80_000_000).expect("solvable");
        assert_eq!(plan.periods_ns(), &[100, 200]);
        assert_eq!(plan.codes(), &[divider_code(8), divider_code(16)]);
    }

    #[test]
    fn zero_period_is_rejected() {
        assert_eq!(
            solve(&clocks(&[100, 0]), None, 80_000_000),
            Err(CteError::NullClockPeriod)
        );
    }

    #[test]
    fn no_clock_outputs_give_an_empty_plan() {
        let plan = solve(&[], None, 80_000_000).expect("solvable");
        assert!(plan.is_empty());
        assert_eq!(plan.select(100), None);
    }

    #[test]
    fn divider_of_192_is_accepted_and_193_rejected() {
        let plan = solve(&clocks(&[192]), None, 1_000_000_000).expect("192 fits");
        assert_eq!(plan.codes(), &[7]);
        assert_eq!(
            solve(&clocks(&[193]), None, 1_000_000_000),
            Err(CteError::ClockDividerError)
        );
    }

    #[test]
    fn selection_prefers_the_window_then_the_nearest() {
        let plan = solve(&clocks(&[100, 1000]), None, 80_000_000).expect("solvable");
        assert_eq!(plan.select(140), Some(0));
        assert_eq!(plan.select(800), Some(1));
        assert_eq!(plan.select(400), Some(0));
        assert_eq!(ClockPlan::default().used(), 0);
    }

    proptest! {
        #[test]
        fn up_to_four_distinct_periods_are_kept_verbatim(
            periods in proptest::collection::btree_set(1u32..2_400, 1..=INTERNAL_CLOCKS)
        ) {
            let periods: Vec<u32> = periods.into_iter().collect();
            let plan = solve(&clocks(&periods), None, 80_000_000).expect("within divider range");
            prop_assert_eq!(plan.used(), periods.len());
            prop_assert_eq!(plan.periods_ns(), periods.as_slice());
        }

        #[test]
        fn merged_plans_never_exceed_four_dividers(
            periods in proptest::collection::vec(1u32..5_000, 0..12)
        ) {
            if let Ok(plan) = solve(&clocks(&periods), None, 20_000_000) {
                prop_assert!(plan.used() <= INTERNAL_CLOCKS);
                prop_assert_eq!(plan.is_empty(), periods.is_empty());
            }
        }
    }
}
