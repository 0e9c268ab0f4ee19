//! Usage update engine
//!
//! Pure arithmetic shared by the simulator and the background updater:
//! - Apply a non-negative increment to a consumption record, clamped at its cap
//! - Recompute the derived percentage
//! - Draw increments for a record type from an increment policy
//!
//! Nothing here touches storage; callers persist the returned records.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use telcox_core::models::{Consumption, ConsumptionType};

/// Apply an increment to a record
///
/// Returns the updated record and a change description such as
/// `"Data: +0.25GB"`. The description shows the requested increment, not the
/// clamped delta. A sum beyond the decimal range saturates at the cap. The
/// record's `version` is left untouched so the caller can commit it against
/// the version it was read with.
pub fn apply_increment(record: &Consumption, increment: Decimal) -> (Consumption, String) {
    let increment = increment.max(Decimal::ZERO);
    let cap = record.total.max(Decimal::ZERO);
    let used = record
        .used
        .max(Decimal::ZERO)
        .checked_add(increment)
        .unwrap_or(cap)
        .min(cap);

    let mut updated = Consumption {
        used,
        ..record.clone()
    };
    updated.refresh_percentage();

    let description = format!(
        "{}: +{}{}",
        record.kind.label(),
        increment.normalize(),
        record.kind.suffix()
    );

    (updated, description)
}

/// Source of uniformly distributed integers
pub trait IncrementSource: Send {
    /// Next value in the inclusive range `[low, high]`
    fn next_in_range(&mut self, low: i64, high: i64) -> i64;
}

/// `IncrementSource` backed by a standard RNG
#[derive(Debug)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// Seeded from operating system entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl IncrementSource for RandomSource {
    fn next_in_range(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// `IncrementSource` replaying a fixed list of values
///
/// Each value is clamped into the requested range. Once the list is used up
/// the last value is repeated, so `ScriptedSource::new([i64::MAX])` always
/// draws the range maximum and `ScriptedSource::new([0])` the minimum of any
/// non-negative range.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: VecDeque<i64>,
    last: Option<i64>,
}

impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            last: None,
        }
    }
}

impl IncrementSource for ScriptedSource {
    fn next_in_range(&mut self, low: i64, high: i64) -> i64 {
        let value = match self.values.pop_front() {
            Some(value) => {
                self.last = Some(value);
                value
            }
            None => self.last.unwrap_or(low),
        };
        value.clamp(low, high.max(low))
    }
}

/// Inclusive draw range on a decimal grid
///
/// `low` and `high` are expressed in units of `10^-scale`, so a range of
/// 10..=50 at scale 2 covers 0.10 to 0.50 in steps of 0.01.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub low: i64,
    pub high: i64,
    pub scale: u32,
}

impl DrawRange {
    pub const fn new(low: i64, high: i64, scale: u32) -> Self {
        Self { low, high, scale }
    }

    /// Smallest value that can be drawn
    pub fn min(&self) -> Decimal {
        Decimal::new(self.low, self.scale)
    }

    /// Largest value that can be drawn
    pub fn max(&self) -> Decimal {
        Decimal::new(self.high, self.scale)
    }

    pub fn draw(&self, source: &mut dyn IncrementSource) -> Decimal {
        Decimal::new(source.next_in_range(self.low, self.high), self.scale)
    }
}

/// Increment ranges per consumption type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementPolicy {
    pub data: DrawRange,
    pub minutes: DrawRange,
    pub sms: DrawRange,
}

impl IncrementPolicy {
    /// Range used for a record type
    pub fn range(&self, kind: ConsumptionType) -> DrawRange {
        match kind {
            ConsumptionType::Data => self.data,
            ConsumptionType::Minutes => self.minutes,
            ConsumptionType::Sms => self.sms,
        }
    }

    /// Draw one increment for a record type
    pub fn draw(&self, kind: ConsumptionType, source: &mut dyn IncrementSource) -> Decimal {
        self.range(kind).draw(source)
    }
}

/// One-shot increments applied by the simulate endpoint
pub const BURST: IncrementPolicy = IncrementPolicy {
    data: DrawRange::new(10, 50, 2),
    minutes: DrawRange::new(5, 15, 0),
    sms: DrawRange::new(1, 3, 0),
};

/// Small increments applied by each background pass
pub const TRICKLE: IncrementPolicy = IncrementPolicy {
    data: DrawRange::new(10, 50, 3),
    minutes: DrawRange::new(1, 3, 0),
    sms: DrawRange::new(0, 1, 0),
};

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(kind: ConsumptionType, used: Decimal, total: Decimal) -> Consumption {
        Consumption {
            id: 1,
            customer_id: "CUST001".to_string(),
            kind,
            used,
            total,
            unit: kind.default_unit().to_string(),
            percentage: Consumption::compute_percentage(used, total),
            version: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_increment_below_cap() {
        let before = record(ConsumptionType::Data, dec!(1.0), dec!(5.0));
        let (after, description) = apply_increment(&before, dec!(0.25));

        assert_eq!(after.used, dec!(1.25));
        assert_eq!(after.percentage, Some(dec!(25.0)));
        assert_eq!(after.version, 4);
        assert_eq!(description, "Data: +0.25GB");
    }

    #[test]
    fn test_apply_increment_clamps_at_cap() {
        let before = record(ConsumptionType::Minutes, dec!(495), dec!(500));
        let (after, description) = apply_increment(&before, dec!(15));

        assert_eq!(after.used, dec!(500));
        assert_eq!(after.percentage, Some(dec!(100.0)));
        assert_eq!(description, "Minutes: +15min");
    }

    #[test]
    fn test_apply_increment_idempotent_at_cap() {
        let capped = record(ConsumptionType::Sms, dec!(100), dec!(100));
        let (once, _) = apply_increment(&capped, dec!(3));
        let (twice, _) = apply_increment(&once, dec!(3));

        assert_eq!(once.used, capped.used);
        assert_eq!(twice.used, capped.used);
        assert_eq!(twice.percentage, Some(dec!(100.0)));
    }

    #[test]
    fn test_apply_increment_saturates_at_decimal_max() {
        let before = record(ConsumptionType::Minutes, Decimal::MAX - dec!(1), Decimal::MAX);
        let (after, description) = apply_increment(&before, dec!(3));

        assert_eq!(after.used, Decimal::MAX);
        assert_eq!(after.percentage, Some(dec!(100.0)));
        assert_eq!(description, "Minutes: +3min");
    }

    #[test]
    fn test_sms_description_has_no_suffix() {
        let before = record(ConsumptionType::Sms, dec!(10), dec!(100));
        let (_, description) = apply_increment(&before, dec!(2));
        assert_eq!(description, "SMS: +2");
    }

    #[test]
    fn test_description_drops_trailing_zeros() {
        let before = record(ConsumptionType::Data, dec!(0), dec!(5));
        let (_, description) = apply_increment(&before, Decimal::new(30, 2));
        assert_eq!(description, "Data: +0.3GB");
    }

    #[test]
    fn test_zero_total_has_no_percentage() {
        let before = record(ConsumptionType::Data, dec!(0), dec!(0));
        let (after, _) = apply_increment(&before, dec!(0.5));

        assert_eq!(after.used, dec!(0));
        assert_eq!(after.percentage, None);
    }

    #[test]
    fn test_negative_used_is_lifted() {
        let before = record(ConsumptionType::Minutes, dec!(-10), dec!(500));
        let (after, _) = apply_increment(&before, dec!(5));
        assert_eq!(after.used, dec!(5));
        assert_eq!(after.percentage, Some(dec!(1.0)));
    }

    #[test]
    fn test_used_stays_within_bounds() {
        let mut source = RandomSource::seeded(7);
        let mut current = record(ConsumptionType::Data, dec!(4.2), dec!(5.0));

        for _ in 0..50 {
            let increment = BURST.draw(current.kind, &mut source);
            let (next, _) = apply_increment(&current, increment);
            assert!(next.used >= current.used);
            assert!(next.used >= Decimal::ZERO && next.used <= next.total);
            assert_eq!(
                next.percentage,
                Consumption::compute_percentage(next.used, next.total)
            );
            current = next;
        }
        assert_eq!(current.used, dec!(5.0));
    }

    #[test]
    fn test_draws_respect_policy_precision() {
        let mut source = RandomSource::seeded(42);

        for policy in [BURST, TRICKLE] {
            for kind in ConsumptionType::ALL {
                let range = policy.range(kind);
                for _ in 0..200 {
                    let value = policy.draw(kind, &mut source);
                    assert!(value >= range.min() && value <= range.max());
                    assert_eq!(value.scale(), range.scale);
                }
            }
        }
    }

    #[test]
    fn test_policy_bounds() {
        assert_eq!(BURST.data.min(), dec!(0.10));
        assert_eq!(BURST.data.max(), dec!(0.50));
        assert_eq!(TRICKLE.data.min(), dec!(0.010));
        assert_eq!(TRICKLE.data.max(), dec!(0.050));
        assert_eq!(TRICKLE.sms.min(), dec!(0));
    }

    #[test]
    fn test_scripted_source_clamps_and_repeats() {
        let mut source = ScriptedSource::new([2, i64::MAX]);
        assert_eq!(source.next_in_range(1, 3), 2);
        assert_eq!(source.next_in_range(1, 3), 3);
        assert_eq!(source.next_in_range(5, 15), 15);

        let mut empty = ScriptedSource::default();
        assert_eq!(empty.next_in_range(5, 15), 5);
    }
}
