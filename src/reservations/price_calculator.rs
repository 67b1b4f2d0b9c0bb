use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::reservations::{ReservationError, ResourcePolicy, ResourceType};

/// Friday and Saturday night rate (175.00)
pub const WEEKEND_NIGHT_RATE: Decimal = Decimal::from_parts(17500, 0, 0, false, 2);

/// Sunday through Thursday night rate (125.00)
pub const WEEKDAY_NIGHT_RATE: Decimal = Decimal::from_parts(12500, 0, 0, false, 2);

/// Safety cap on an accumulated guest suite total (10,000.00)
pub const PRICE_CAP: Decimal = Decimal::from_parts(1000000, 0, 0, false, 2);

/// Charge for one guest suite night
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NightlyCharge {
    #[schema(value_type = String, example = "2025-06-13")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "Fri")]
    pub weekday: String,
    pub rate: Decimal,
}

/// Price with its per-night breakdown
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PriceQuote {
    pub resource_type: ResourceType,
    pub nights: Vec<NightlyCharge>,
    pub total: Decimal,
}

/// Service for pricing reservations
pub struct PriceCalculator;

impl PriceCalculator {
    /// Rate for the night beginning on `date`
    ///
    /// Weekday comes straight from the calendar date, no timezone applied.
    pub fn nightly_rate(date: NaiveDate) -> Decimal {
        match date.weekday() {
            Weekday::Fri | Weekday::Sat => WEEKEND_NIGHT_RATE,
            _ => WEEKDAY_NIGHT_RATE,
        }
    }

    /// Calculate the price of a window with its breakdown
    ///
    /// # Arguments
    /// * `resource_type` - Resource being booked
    /// * `start` - Window start (property-local)
    /// * `end` - Window end (property-local)
    ///
    /// # Returns
    /// A quote whose total is rounded half-up to cents
    pub fn quote(
        resource_type: ResourceType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<PriceQuote, ReservationError> {
        if end <= start {
            return Err(ReservationError::InvalidDateRange(format!(
                "End {} must be after start {}",
                end, start
            )));
        }

        let policy = ResourcePolicy::for_type(resource_type);
        let (nights, total) = match resource_type {
            ResourceType::GuestSuite => {
                let nights = Self::guest_suite_nights(start.date(), end.date())?;
                let total = Self::calculate_total(&nights);
                (nights, total)
            }
            ResourceType::SkyLounge => (Vec::new(), policy.flat_rate.unwrap_or(Decimal::ZERO)),
            ResourceType::GearShed => (Vec::new(), Decimal::ZERO),
        };

        Ok(PriceQuote {
            resource_type,
            nights,
            total: Self::round_to_cents(total),
        })
    }

    /// Calculate the total price of a window
    pub fn price(
        resource_type: ResourceType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Decimal, ReservationError> {
        Self::quote(resource_type, start, end).map(|quote| quote.total)
    }

    /// Sum of nightly charges
    pub fn calculate_total(nights: &[NightlyCharge]) -> Decimal {
        nights.iter().map(|night| night.rate).sum()
    }

    /// Round half-up to two decimal places
    pub fn round_to_cents(amount: Decimal) -> Decimal {
        let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        rounded
    }

    fn guest_suite_nights(
        first: NaiveDate,
        checkout: NaiveDate,
    ) -> Result<Vec<NightlyCharge>, ReservationError> {
        let mut nights = Vec::new();
        let mut running = Decimal::ZERO;

        for date in first.iter_days().take_while(|d| *d < checkout) {
            let rate = Self::nightly_rate(date);
            running += rate;
            if running > PRICE_CAP {
                return Err(ReservationError::PriceOverflow { cap: PRICE_CAP });
            }
            nights.push(NightlyCharge {
                date,
                weekday: date.weekday().to_string(),
                rate,
            });
        }

        Ok(nights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_weekend_stay() {
        // Fri 2025-06-13 15:00 -> Sun 2025-06-15 11:00
        let price =
            PriceCalculator::price(ResourceType::GuestSuite, at(2025, 6, 13, 15), at(2025, 6, 15, 11))
                .unwrap();
        assert_eq!(price, dec!(350.00));
    }

    #[test]
    fn test_weekday_stay() {
        // Mon 2025-06-16 15:00 -> Wed 2025-06-18 11:00
        let price =
            PriceCalculator::price(ResourceType::GuestSuite, at(2025, 6, 16, 15), at(2025, 6, 18, 11))
                .unwrap();
        assert_eq!(price, dec!(250.00));
    }

    #[test]
    fn test_mixed_week() {
        // Thu, Fri, Sat, Sun nights
        let quote =
            PriceCalculator::quote(ResourceType::GuestSuite, at(2025, 6, 12, 15), at(2025, 6, 16, 11))
                .unwrap();
        assert_eq!(quote.total, dec!(600.00));
        let weekdays: Vec<&str> = quote.nights.iter().map(|n| n.weekday.as_str()).collect();
        assert_eq!(weekdays, vec!["Thu", "Fri", "Sat", "Sun"]);
    }

    #[test]
    fn test_sky_lounge_flat() {
        let price =
            PriceCalculator::price(ResourceType::SkyLounge, at(2025, 6, 14, 10), at(2025, 6, 14, 14))
                .unwrap();
        assert_eq!(price, dec!(300.00));
    }

    #[test]
    fn test_gear_shed_free() {
        let quote =
            PriceCalculator::quote(ResourceType::GearShed, at(2025, 6, 14, 10), at(2025, 6, 16, 18))
                .unwrap();
        assert_eq!(quote.total, dec!(0.00));
        assert!(quote.nights.is_empty());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let result =
            PriceCalculator::price(ResourceType::SkyLounge, at(2025, 6, 14, 14), at(2025, 6, 14, 10));
        assert!(matches!(result, Err(ReservationError::InvalidDateRange(_))));
    }

    #[test]
    fn test_price_cap() {
        // 80 nights always exceed the cap
        let result =
            PriceCalculator::price(ResourceType::GuestSuite, at(2025, 1, 1, 15), at(2025, 3, 22, 11));
        assert!(matches!(result, Err(ReservationError::PriceOverflow { .. })));
    }

    #[test]
    fn test_round_to_cents_half_up() {
        assert_eq!(PriceCalculator::round_to_cents(dec!(10.005)), dec!(10.01));
        assert_eq!(PriceCalculator::round_to_cents(dec!(10.004)), dec!(10.00));
        assert_eq!(PriceCalculator::round_to_cents(dec!(7)).to_string(), "7.00");
    }
}
