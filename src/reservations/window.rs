use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::reservations::{ReservationError, ResourcePolicy, ResourceType};

/// Normalized property-local booking window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookingWindow {
    #[schema(value_type = String, example = "2025-06-13T15:00:00")]
    pub start: NaiveDateTime,
    #[schema(value_type = String, example = "2025-06-15T11:00:00")]
    pub end: NaiveDateTime,
}

impl BookingWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Calendar nights covered by the window
    pub fn nights(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open overlap test
    pub fn overlaps(&self, other: &BookingWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Turns a raw date/time selection into a concrete window
pub struct WindowNormalizer;

impl WindowNormalizer {
    /// Normalize a selection into start/end instants for the resource type
    ///
    /// # Arguments
    /// * `resource_type` - Resource being booked
    /// * `start_date` - First calendar day of the booking
    /// * `user_start_time` - Caller-selected start, honoured for the sky lounge only
    /// * `user_end_date` - Caller-selected last day, ignored by the sky lounge unless it differs
    ///
    /// # Errors
    /// * `InvalidDateRange` - end date before (or, for guest suites, on) the start date
    /// * `InvalidStayLength` - guest suite stay shorter than the minimum
    /// * `InvalidTimeWindow` - sky lounge start outside its bounds, or the block crosses midnight
    pub fn normalize(
        resource_type: ResourceType,
        start_date: NaiveDate,
        user_start_time: Option<NaiveTime>,
        user_end_date: Option<NaiveDate>,
    ) -> Result<BookingWindow, ReservationError> {
        let policy = ResourcePolicy::for_type(resource_type);
        match resource_type {
            ResourceType::GuestSuite => Self::guest_suite(&policy, start_date, user_end_date),
            ResourceType::SkyLounge => {
                Self::sky_lounge(&policy, start_date, user_start_time, user_end_date)
            }
            ResourceType::GearShed => Self::gear_shed(&policy, start_date, user_end_date),
        }
    }

    fn guest_suite(
        policy: &ResourcePolicy,
        start_date: NaiveDate,
        user_end_date: Option<NaiveDate>,
    ) -> Result<BookingWindow, ReservationError> {
        let min_nights = u64::from(policy.min_stay_nights);
        let end_date = match user_end_date {
            Some(end) if end <= start_date => {
                return Err(ReservationError::InvalidDateRange(format!(
                    "Check-out {} must be after check-in {}",
                    end, start_date
                )))
            }
            Some(end) => end,
            None => start_date.checked_add_days(Days::new(min_nights)).ok_or_else(|| {
                ReservationError::InvalidDateRange(format!("Start date {} is out of range", start_date))
            })?,
        };

        let window = BookingWindow::new(
            start_date.and_time(policy.fixed_start_time.unwrap_or(policy.default_start_time)),
            end_date.and_time(policy.fixed_end_time.unwrap_or_default()),
        );

        let nights = window.nights();
        if nights < i64::from(policy.min_stay_nights) {
            return Err(ReservationError::InvalidStayLength {
                nights,
                minimum: policy.min_stay_nights,
            });
        }

        Ok(window)
    }

    fn sky_lounge(
        policy: &ResourcePolicy,
        start_date: NaiveDate,
        user_start_time: Option<NaiveTime>,
        user_end_date: Option<NaiveDate>,
    ) -> Result<BookingWindow, ReservationError> {
        if let Some(end) = user_end_date {
            if end != start_date {
                return Err(ReservationError::InvalidDateRange(format!(
                    "Sky lounge bookings end on the day they start ({}), got {}",
                    start_date, end
                )));
            }
        }

        let start_time = user_start_time.unwrap_or(policy.default_start_time);
        if let Some(bounds) = policy.selectable_start {
            if !bounds.accepts(start_time) {
                return Err(ReservationError::InvalidTimeWindow(format!(
                    "Start time {} must be between {} and {} in {}-minute steps",
                    start_time.format("%H:%M"),
                    bounds.earliest.format("%H:%M"),
                    bounds.latest.format("%H:%M"),
                    bounds.step_minutes
                )));
            }
        }

        let start = start_date.and_time(start_time);
        let block = Duration::hours(i64::from(policy.default_block_hours.unwrap_or(0)));
        let end = start
            .checked_add_signed(block)
            .ok_or_else(|| ReservationError::InvalidTimeWindow("Block end is out of range".to_string()))?;

        if policy.same_day_only && end.date() != start_date {
            return Err(ReservationError::InvalidTimeWindow(format!(
                "A block starting at {} would run past midnight",
                start_time.format("%H:%M")
            )));
        }

        Ok(BookingWindow::new(start, end))
    }

    fn gear_shed(
        policy: &ResourcePolicy,
        start_date: NaiveDate,
        user_end_date: Option<NaiveDate>,
    ) -> Result<BookingWindow, ReservationError> {
        let end_date = user_end_date.unwrap_or(start_date);
        if end_date < start_date {
            return Err(ReservationError::InvalidDateRange(format!(
                "Return date {} is before pick-up date {}",
                end_date, start_date
            )));
        }

        Ok(BookingWindow::new(
            start_date.and_time(policy.fixed_start_time.unwrap_or(policy.default_start_time)),
            end_date.and_time(policy.fixed_end_time.unwrap_or_default()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_guest_suite_defaults_to_two_nights() {
        let window =
            WindowNormalizer::normalize(ResourceType::GuestSuite, date(2025, 6, 13), None, None)
                .unwrap();
        assert_eq!(window.start, at(2025, 6, 13, 15, 0));
        assert_eq!(window.end, at(2025, 6, 15, 11, 0));
        assert_eq!(window.nights(), 2);
    }

    #[test]
    fn test_guest_suite_ignores_start_time() {
        let window = WindowNormalizer::normalize(
            ResourceType::GuestSuite,
            date(2025, 6, 13),
            NaiveTime::from_hms_opt(9, 0, 0),
            Some(date(2025, 6, 17)),
        )
        .unwrap();
        assert_eq!(window.start, at(2025, 6, 13, 15, 0));
        assert_eq!(window.end, at(2025, 6, 17, 11, 0));
    }

    #[test]
    fn test_guest_suite_single_night_rejected() {
        let result = WindowNormalizer::normalize(
            ResourceType::GuestSuite,
            date(2025, 6, 13),
            None,
            Some(date(2025, 6, 14)),
        );
        assert!(matches!(
            result,
            Err(ReservationError::InvalidStayLength { nights: 1, minimum: 2 })
        ));
    }

    #[test]
    fn test_guest_suite_end_before_start_rejected() {
        for end in [date(2025, 6, 13), date(2025, 6, 10)] {
            let result = WindowNormalizer::normalize(
                ResourceType::GuestSuite,
                date(2025, 6, 13),
                None,
                Some(end),
            );
            assert!(matches!(result, Err(ReservationError::InvalidDateRange(_))));
        }
    }

    #[test]
    fn test_sky_lounge_default_block() {
        let window =
            WindowNormalizer::normalize(ResourceType::SkyLounge, date(2025, 6, 13), None, None)
                .unwrap();
        assert_eq!(window.start, at(2025, 6, 13, 10, 0));
        assert_eq!(window.end, at(2025, 6, 13, 14, 0));
        assert_eq!(window.duration(), Duration::hours(4));
    }

    #[test]
    fn test_sky_lounge_latest_start() {
        let window = WindowNormalizer::normalize(
            ResourceType::SkyLounge,
            date(2025, 6, 13),
            NaiveTime::from_hms_opt(18, 0, 0),
            Some(date(2025, 6, 13)),
        )
        .unwrap();
        assert_eq!(window.end, at(2025, 6, 13, 22, 0));
    }

    #[test]
    fn test_sky_lounge_rejects_out_of_bounds_start() {
        for (h, m) in [(9, 45), (18, 15), (12, 5), (21, 0)] {
            let result = WindowNormalizer::normalize(
                ResourceType::SkyLounge,
                date(2025, 6, 13),
                NaiveTime::from_hms_opt(h, m, 0),
                None,
            );
            assert!(
                matches!(result, Err(ReservationError::InvalidTimeWindow(_))),
                "{:02}:{:02} should be rejected",
                h,
                m
            );
        }
    }

    #[test]
    fn test_sky_lounge_rejects_multi_day() {
        let result = WindowNormalizer::normalize(
            ResourceType::SkyLounge,
            date(2025, 6, 13),
            None,
            Some(date(2025, 6, 14)),
        );
        assert!(matches!(result, Err(ReservationError::InvalidDateRange(_))));
    }

    #[test]
    fn test_gear_shed_same_day_default() {
        let window =
            WindowNormalizer::normalize(ResourceType::GearShed, date(2025, 6, 13), None, None)
                .unwrap();
        assert_eq!(window.start, at(2025, 6, 13, 10, 0));
        assert_eq!(window.end, at(2025, 6, 13, 18, 0));
    }

    #[test]
    fn test_gear_shed_multi_day() {
        let window = WindowNormalizer::normalize(
            ResourceType::GearShed,
            date(2025, 6, 13),
            NaiveTime::from_hms_opt(7, 0, 0),
            Some(date(2025, 6, 16)),
        )
        .unwrap();
        assert_eq!(window.start, at(2025, 6, 13, 10, 0));
        assert_eq!(window.end, at(2025, 6, 16, 18, 0));
    }

    #[test]
    fn test_gear_shed_end_before_start_rejected() {
        let result = WindowNormalizer::normalize(
            ResourceType::GearShed,
            date(2025, 6, 13),
            None,
            Some(date(2025, 6, 12)),
        );
        assert!(matches!(result, Err(ReservationError::InvalidDateRange(_))));
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let a = BookingWindow::new(at(2025, 6, 13, 10, 0), at(2025, 6, 13, 14, 0));
        let b = BookingWindow::new(at(2025, 6, 13, 14, 0), at(2025, 6, 13, 18, 0));
        let c = BookingWindow::new(at(2025, 6, 13, 13, 0), at(2025, 6, 13, 15, 0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }
}
