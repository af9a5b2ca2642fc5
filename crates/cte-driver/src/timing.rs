//! Nanosecond/tick arithmetic and main clock divider selection.

use crate::error::CteError;
use crate::types::TimeTable;

/// Nanoseconds per second.
pub const NS_PER_SECOND: u32 = 1_000_000_000;
/// Range of the internal event time counter.
pub const MAX_TIME_COUNTER: u32 = 0x1_0000;
/// Exclusive upper bound of the main clock divider.
pub const CLOCK_DIVIDER_LIMIT: u8 = 0x40;
/// Delay reported for a decreasing event time sequence.
pub const TOO_BIG_TIME_DELAY: u32 = u32::MAX;

/// Computes `value * mul1 * mul2 / div1 / div2` with 64-bit intermediates.
///
/// Products wrap at 64 bits and the result is truncated to 32 bits. A zero
/// divisor yields 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
pub const fn scaled_mul_div(value: u32, mul1: u32, mul2: u32, div1: u32, div2: u32) -> u32 {
    if div1 == 0 || div2 == 0 {
        return 0;
    }
    let product = (value as u64)
        .wrapping_mul(mul1 as u64)
        .wrapping_mul(mul2 as u64);
    (product / div1 as u64 / div2 as u64) as u32
}

/// Converts nanoseconds into CTE ticks at `clock_hz / main_divider`, rounding down.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn ns_to_ticks(ns: u32, clock_hz: u32, main_divider: u8) -> u32 {
    scaled_mul_div(ns, clock_hz, 1, main_divider as u32, NS_PER_SECOND)
}

/// Converts a period into input clock cycles, rounding up.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
pub const fn period_to_cycles(period_ns: u32, clock_hz: u32) -> u32 {
    let product = period_ns as u64 * clock_hz as u64;
    let cycles = product.div_ceil(NS_PER_SECOND as u64);
    if cycles > u32::MAX as u64 {
        u32::MAX
    } else {
        cycles as u32
    }
}

/// Largest delay between consecutive events of one table.
///
/// The first event is measured from 0. Equal times give a zero delay; a
/// time lower than its predecessor yields [`TOO_BIG_TIME_DELAY`].
#[must_use]
pub fn max_event_delay(table: &TimeTable) -> u32 {
    let mut previous = 0u32;
    let mut max_delay = 0u32;
    for event in &table.events {
        let Some(delay) = event.abs_time_ns.checked_sub(previous) else {
            return TOO_BIG_TIME_DELAY;
        };
        max_delay = max_delay.max(delay);
        previous = event.abs_time_ns;
    }
    max_delay
}

/// Smallest main divider letting the time counter cover every inter-event
/// delay of both tables, clamped to [`CLOCK_DIVIDER_LIMIT`].
#[must_use]
pub fn required_main_divider(table0: &TimeTable, table1: Option<&TimeTable>, clock_hz: u32) -> u8 {
    let mut max_delay = max_event_delay(table0);
    if let Some(table1) = table1 {
        if max_delay != TOO_BIG_TIME_DELAY {
            max_delay = max_delay.max(max_event_delay(table1));
        }
    }
    let divider = scaled_mul_div(max_delay, clock_hz, 1, NS_PER_SECOND, MAX_TIME_COUNTER)
        .saturating_add(1);
    u8::try_from(divider)
        .map_or(CLOCK_DIVIDER_LIMIT, |divider| divider.min(CLOCK_DIVIDER_LIMIT))
}

/// Main divider for the given tables.
///
/// # Errors
///
/// Returns [`CteError::ClockDividerError`] when the delays cannot be covered
/// by a divider below [`CLOCK_DIVIDER_LIMIT`].
pub fn main_divider(
    table0: &TimeTable,
    table1: Option<&TimeTable>,
    clock_hz: u32,
) -> Result<u8, CteError> {
    let divider = required_main_divider(table0, table1, clock_hz);
    if divider >= CLOCK_DIVIDER_LIMIT {
        return Err(CteError::ClockDividerError);
    }
    Ok(divider)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        main_divider, max_event_delay, ns_to_ticks, period_to_cycles, scaled_mul_div,
        CLOCK_DIVIDER_LIMIT, TOO_BIG_TIME_DELAY,
    };
    use crate::error::CteError;
    use crate::types::{TimeTable, TimingEvent};

    fn table(times: &[u32]) -> TimeTable {
        TimeTable::new(
            times
                .iter()
                .map(|time| TimingEvent::new(*time, Vec::new()))
                .collect(),
        )
    }

    #[test]
    fn scaled_mul_div_keeps_64_bit_intermediates() {
        assert_eq!(scaled_mul_div(4_000_000_000, 4, 1, 8, 1), 2_000_000_000);
        assert_eq!(scaled_mul_div(100, 130, 8, 10, 100), 104);
        assert_eq!(scaled_mul_div(7, 1, 1, 0, 1), 0);
    }

    #[rstest]
    #[case(0, 80_000_000, 1, 0)]
    #[case(1000, 80_000_000, 1, 80)]
    #[case(1000, 80_000_000, 3, 26)]
    #[case(12, 1_000_000_000, 5, 2)]
    fn ticks_round_down(#[case] ns: u32, #[case] clock: u32, #[case] div: u8, #[case] ticks: u32) {
        assert_eq!(ns_to_ticks(ns, clock, div), ticks);
    }

    #[rstest]
    #[case(192, 1_000_000_000, 192)]
    #[case(1, 80_000_000, 1)]
    #[case(25, 80_000_000, 2)]
    #[case(100, 80_000_000, 8)]
    fn cycles_round_up(#[case] period: u32, #[case] clock: u32, #[case] cycles: u32) {
        assert_eq!(period_to_cycles(period, clock), cycles);
    }

    #[test]
    fn equal_times_are_a_zero_delay_and_decreasing_times_are_penalised() {
        assert_eq!(max_event_delay(&table(&[0, 0, 500, 1500])), 1000);
        assert_eq!(max_event_delay(&table(&[100, 50])), TOO_BIG_TIME_DELAY);
    }

    #[test]
    fn divider_grows_with_the_longest_gap() {
        assert_eq!(main_divider(&table(&[0, 1000]), None, 80_000_000), Ok(1));
        // 1 ms at 80 MHz is 80_000 ticks, beyond the 16-bit counter.
        assert_eq!(
            main_divider(&table(&[0, 1_000_000]), None, 80_000_000),
            Ok(2)
        );
        assert_eq!(
            main_divider(&table(&[0, 10]), Some(&table(&[0, 1_000_000])), 80_000_000),
            Ok(2)
        );
    }

    #[test]
    fn decreasing_times_exceed_the_divider_limit() {
        assert_eq!(
            main_divider(&table(&[10, 5]), None, 80_000_000),
            Err(CteError::ClockDividerError)
        );
        assert_eq!(
            super::required_main_divider(&table(&[10, 5]), None, 80_000_000),
            CLOCK_DIVIDER_LIMIT
        );
    }
}
