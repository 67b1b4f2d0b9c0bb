use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::reservations::ResourceType;

/// Service status of a bookable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text")]
pub enum ServiceStatus {
    #[serde(rename = "In Service")]
    #[sqlx(rename = "In Service")]
    InService,
    #[serde(rename = "Not In Service")]
    #[sqlx(rename = "Not In Service")]
    NotInService,
}

impl ServiceStatus {
    /// Convert status to its stored string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::InService => "In Service",
            ServiceStatus::NotInService => "Not In Service",
        }
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::InService
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bookable unit: one kayak, the guest suite, the sky lounge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub item_id: String,
    pub name: String,
    pub resource_type: ResourceType,
    pub description: String,
    pub service_status: ServiceStatus,
    pub service_notes: String,
}

impl Item {
    /// Build an in-service item with empty description and notes
    pub fn new(item_id: &str, name: &str, resource_type: ResourceType) -> Self {
        Self {
            item_id: item_id.to_string(),
            name: name.to_string(),
            resource_type,
            description: String::new(),
            service_status: ServiceStatus::InService,
            service_notes: String::new(),
        }
    }

    pub fn is_in_service(&self) -> bool {
        self.service_status == ServiceStatus::InService
    }

    /// Whether a caller-supplied reference (id or display name) points at this item.
    /// Names compare case-insensitively, ids exactly.
    pub fn matches(&self, reference: &str) -> bool {
        self.item_id == reference || self.name.eq_ignore_ascii_case(reference)
    }
}

/// Query parameters for listing inventory
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ItemListQuery {
    /// Optional resource type filter
    pub resource_type: Option<ResourceType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_status_serialization() {
        let json = serde_json::to_string(&ServiceStatus::InService).unwrap();
        assert_eq!(json, "\"In Service\"");

        let status: ServiceStatus = serde_json::from_str("\"Not In Service\"").unwrap();
        assert_eq!(status, ServiceStatus::NotInService);
    }

    #[test]
    fn test_item_matches_by_id_or_name() {
        let item = Item::new("kayak-1", "Kayak 1", ResourceType::GearShed);
        assert!(item.matches("kayak-1"));
        assert!(item.matches("Kayak 1"));
        assert!(item.matches("kayak 1"));
        assert!(!item.matches("Kayak 2"));
    }

    #[test]
    fn test_new_item_is_in_service() {
        let item = Item::new("bike-1", "Mountain Bike 1", ResourceType::GearShed);
        assert!(item.is_in_service());
        assert!(item.description.is_empty());
    }
}
