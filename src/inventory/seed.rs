// Default inventory used to bootstrap an empty item store

use crate::inventory::Item;
use crate::reservations::ResourceType;

/// Items seeded on first run when the inventory is empty
pub fn default_items() -> Vec<Item> {
    vec![
        Item::new("gs-1", "Guest Suite", ResourceType::GuestSuite),
        Item::new("sl-1", "Sky Lounge", ResourceType::SkyLounge),
        Item::new("kayak-1", "Kayak 1", ResourceType::GearShed),
        Item::new("kayak-2", "Kayak 2", ResourceType::GearShed),
        Item::new("bike-1", "Mountain Bike 1", ResourceType::GearShed),
        Item::new("bike-2", "Mountain Bike 2", ResourceType::GearShed),
    ]
}
