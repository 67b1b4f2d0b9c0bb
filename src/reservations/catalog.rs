// Resource catalog
// Fixed booking policy for each resource type

use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::reservations::{ResourceType, StartTimeOptions};

/// Sky lounge flat rate (300.00)
pub const SKY_LOUNGE_FLAT_RATE: Decimal = Decimal::from_parts(30000, 0, 0, false, 2);

/// Bounds on a caller-selected start time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTimeBounds {
    pub earliest: NaiveTime,
    pub latest: NaiveTime,
    pub step_minutes: u32,
}

impl StartTimeBounds {
    /// Whether `time` lies inside the bounds and on the step grid
    pub fn accepts(&self, time: NaiveTime) -> bool {
        use chrono::Timelike;

        time >= self.earliest
            && time <= self.latest
            && time.second() == 0
            && time.nanosecond() == 0
            && time.minute() % self.step_minutes == 0
    }
}

/// Booking policy for one resource type
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePolicy {
    pub resource_type: ResourceType,
    pub min_stay_nights: u32,
    pub fixed_start_time: Option<NaiveTime>,
    pub fixed_end_time: Option<NaiveTime>,
    pub same_day_only: bool,
    pub default_block_hours: Option<u32>,
    pub requires_item_selection: bool,
    pub flat_rate: Option<Decimal>,
    /// Item booked implicitly when the resource itself is the item
    pub default_item: Option<&'static str>,
    /// Start time used when the caller supplies none
    pub default_start_time: NaiveTime,
    /// Present when the start time is caller-selectable
    pub selectable_start: Option<StartTimeBounds>,
}

impl ResourcePolicy {
    /// Look up the policy for a resource type
    pub fn for_type(resource_type: ResourceType) -> Self {
        match resource_type {
            ResourceType::GuestSuite => Self {
                resource_type,
                min_stay_nights: 2,
                fixed_start_time: Some(time(15, 0)),
                fixed_end_time: Some(time(11, 0)),
                same_day_only: false,
                default_block_hours: None,
                requires_item_selection: false,
                flat_rate: None,
                default_item: Some("Guest Suite"),
                default_start_time: time(15, 0),
                selectable_start: None,
            },
            ResourceType::SkyLounge => Self {
                resource_type,
                min_stay_nights: 0,
                fixed_start_time: None,
                fixed_end_time: None,
                same_day_only: true,
                default_block_hours: Some(4),
                requires_item_selection: false,
                flat_rate: Some(SKY_LOUNGE_FLAT_RATE),
                default_item: Some("Sky Lounge"),
                default_start_time: time(10, 0),
                // An 18:00 start ends at 22:00, so the last slot only takes :00
                selectable_start: Some(StartTimeBounds {
                    earliest: time(10, 0),
                    latest: time(18, 0),
                    step_minutes: 15,
                }),
            },
            ResourceType::GearShed => Self {
                resource_type,
                min_stay_nights: 0,
                fixed_start_time: Some(time(10, 0)),
                fixed_end_time: Some(time(18, 0)),
                same_day_only: false,
                default_block_hours: None,
                requires_item_selection: true,
                flat_rate: None,
                default_item: None,
                default_start_time: time(10, 0),
                selectable_start: None,
            },
        }
    }

    /// Start-time options offered to staff, in order
    pub fn start_time_options(&self) -> Vec<NaiveTime> {
        let Some(bounds) = self.selectable_start else {
            return vec![self.default_start_time];
        };

        let step = chrono::Duration::minutes(i64::from(bounds.step_minutes));
        let mut options = Vec::new();
        let mut current = bounds.earliest;
        while current <= bounds.latest {
            options.push(current);
            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            current = next;
        }
        options
    }

    /// Start-time menu in the "HH:MM" form shown to staff
    pub fn start_time_menu(&self) -> StartTimeOptions {
        StartTimeOptions {
            resource_type: self.resource_type,
            default_start: self.default_start_time.format("%H:%M").to_string(),
            selectable: self.selectable_start.is_some(),
            options: self
                .start_time_options()
                .iter()
                .map(|t| t.format("%H:%M").to_string())
                .collect(),
        }
    }
}

/// Policy literal clock time
fn time(hour: u32, minute: u32) -> NaiveTime {
    debug_assert!(hour < 24 && minute < 60, "invalid policy time {}:{}", hour, minute);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}
