use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::reservations::ResourceType;

/// Hours before start inside which a late-cancellation fee applies
pub const FEE_WINDOW_HOURS: i64 = 72;

/// Late fee for the sky lounge (150.00)
pub const SKY_LOUNGE_LATE_FEE: Decimal = Decimal::from_parts(15000, 0, 0, false, 2);

/// Late fee for the guest suite (75.00)
pub const GUEST_SUITE_LATE_FEE: Decimal = Decimal::from_parts(7500, 0, 0, false, 2);

/// What cancelling will do to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CancelDisposition {
    /// Record kept as Cancelled with the fee attached
    SoftCancel,
    /// Record removed outright
    HardDelete,
}

/// Fee preview shown before a cancellation is confirmed
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CancellationQuote {
    pub resource_type: ResourceType,
    pub hours_until_start: i64,
    pub fee: Decimal,
    pub disposition: CancelDisposition,
}

/// Late-cancellation fee rules
pub struct CancellationPolicy;

impl CancellationPolicy {
    /// Time remaining until `start`, never negative
    pub fn time_until_start(start: NaiveDateTime, now: NaiveDateTime) -> Duration {
        let remaining = start - now;
        if remaining < Duration::zero() {
            Duration::zero()
        } else {
            remaining
        }
    }

    /// Whole hours remaining until `start`, never negative
    pub fn hours_until_start(start: NaiveDateTime, now: NaiveDateTime) -> i64 {
        Self::time_until_start(start, now).num_hours()
    }

    /// Whether `now` falls inside the late-cancellation window
    pub fn within_fee_window(start: NaiveDateTime, now: NaiveDateTime) -> bool {
        Self::time_until_start(start, now) < Duration::hours(FEE_WINDOW_HOURS)
    }

    /// Late fee charged for the resource type, regardless of timing
    pub fn late_fee(resource_type: ResourceType) -> Decimal {
        match resource_type {
            ResourceType::SkyLounge => SKY_LOUNGE_LATE_FEE,
            ResourceType::GuestSuite => GUEST_SUITE_LATE_FEE,
            ResourceType::GearShed => Decimal::ZERO,
        }
    }

    /// Calculate the cancellation fee
    ///
    /// # Arguments
    /// * `resource_type` - Resource that was booked
    /// * `start` - Reservation start (property-local)
    /// * `now` - Current property-local time
    ///
    /// # Returns
    /// The late fee when fewer than 72 hours remain, zero otherwise
    pub fn fee(resource_type: ResourceType, start: NaiveDateTime, now: NaiveDateTime) -> Decimal {
        if Self::within_fee_window(start, now) {
            Self::late_fee(resource_type)
        } else {
            Decimal::ZERO
        }
    }

    /// Fee plus the disposition it implies
    pub fn quote(
        resource_type: ResourceType,
        start: NaiveDateTime,
        now: NaiveDateTime,
    ) -> CancellationQuote {
        let fee = Self::fee(resource_type, start, now);
        CancellationQuote {
            resource_type,
            hours_until_start: Self::hours_until_start(start, now),
            fee,
            disposition: Self::disposition(fee),
        }
    }

    /// Zero fee deletes the record, any other fee keeps it as Cancelled
    pub fn disposition(fee: Decimal) -> CancelDisposition {
        if fee > Decimal::ZERO {
            CancelDisposition::SoftCancel
        } else {
            CancelDisposition::HardDelete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 20)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_sky_lounge_late_cancel() {
        let now = start() - Duration::hours(20);
        let quote = CancellationPolicy::quote(ResourceType::SkyLounge, start(), now);
        assert_eq!(quote.fee, dec!(150.00));
        assert_eq!(quote.hours_until_start, 20);
        assert_eq!(quote.disposition, CancelDisposition::SoftCancel);
    }

    #[test]
    fn test_guest_suite_early_cancel_is_free() {
        let now = start() - Duration::hours(100);
        let quote = CancellationPolicy::quote(ResourceType::GuestSuite, start(), now);
        assert_eq!(quote.fee, dec!(0.00));
        assert_eq!(quote.disposition, CancelDisposition::HardDelete);
    }

    #[test]
    fn test_guest_suite_late_cancel() {
        let now = start() - Duration::hours(71);
        assert_eq!(
            CancellationPolicy::fee(ResourceType::GuestSuite, start(), now),
            dec!(75.00)
        );
    }

    #[test]
    fn test_gear_shed_never_charged() {
        let now = start() - Duration::hours(1);
        let quote = CancellationPolicy::quote(ResourceType::GearShed, start(), now);
        assert_eq!(quote.fee, dec!(0.00));
        assert_eq!(quote.disposition, CancelDisposition::HardDelete);
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let exactly = start() - Duration::hours(72);
        let just_inside = exactly + Duration::seconds(1);
        assert_eq!(
            CancellationPolicy::fee(ResourceType::SkyLounge, start(), exactly),
            dec!(0.00)
        );
        assert_eq!(
            CancellationPolicy::fee(ResourceType::SkyLounge, start(), just_inside),
            dec!(150.00)
        );
    }

    #[test]
    fn test_past_start_counts_as_zero_hours() {
        let now = start() + Duration::hours(5);
        assert_eq!(CancellationPolicy::hours_until_start(start(), now), 0);
        assert_eq!(
            CancellationPolicy::fee(ResourceType::SkyLounge, start(), now),
            dec!(150.00)
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn resource_type_strategy() -> impl Strategy<Value = ResourceType> {
        prop_oneof![
            Just(ResourceType::GuestSuite),
            Just(ResourceType::SkyLounge),
            Just(ResourceType::GearShed),
        ]
    }

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 20)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    /// As `now` approaches `start` the fee never decreases
    #[test]
    fn prop_fee_is_monotonic() {
        proptest!(|(
            resource_type in resource_type_strategy(),
            earlier in 0i64..20_000,
            step in 0i64..20_000
        )| {
            let first = start() - Duration::minutes(earlier + step);
            let later = start() - Duration::minutes(earlier);
            let fee_first = CancellationPolicy::fee(resource_type, start(), first);
            let fee_later = CancellationPolicy::fee(resource_type, start(), later);
            prop_assert!(fee_later >= fee_first);
        });
    }

    /// The fee is either zero or the full late fee, never partial
    #[test]
    fn prop_fee_is_all_or_nothing() {
        proptest!(|(resource_type in resource_type_strategy(), minutes in -5_000i64..20_000)| {
            let now = start() - Duration::minutes(minutes);
            let fee = CancellationPolicy::fee(resource_type, start(), now);
            prop_assert!(fee == Decimal::ZERO || fee == CancellationPolicy::late_fee(resource_type));
            prop_assert_eq!(
                fee > Decimal::ZERO,
                minutes < FEE_WINDOW_HOURS * 60 && resource_type != ResourceType::GearShed
            );
        });
    }
}
