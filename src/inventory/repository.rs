use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::inventory::{seed, InventoryError, Item};
use crate::reservations::ResourceType;

/// Read access to the item inventory plus the first-run seed bootstrap
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// List items, optionally restricted to one resource type, ordered by name
    async fn list(&self, resource_type: Option<ResourceType>) -> Result<Vec<Item>, InventoryError>;

    /// Insert the default items when the store holds none.
    /// Returns the number of items inserted.
    async fn seed_defaults_if_empty(&self) -> Result<usize, InventoryError>;
}

/// Postgres-backed inventory
#[derive(Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn list(&self, resource_type: Option<ResourceType>) -> Result<Vec<Item>, InventoryError> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT item_id, name, resource_type, description, service_status, service_notes
            FROM items
            WHERE ($1::text IS NULL OR resource_type = $1)
            ORDER BY name
            "#,
        )
        .bind(resource_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn seed_defaults_if_empty(&self) -> Result<usize, InventoryError> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&mut *tx)
            .await?;

        if count > 0 {
            return Ok(0);
        }

        let defaults = seed::default_items();
        for item in &defaults {
            sqlx::query(
                r#"
                INSERT INTO items (item_id, name, resource_type, description, service_status, service_notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&item.item_id)
            .bind(&item.name)
            .bind(item.resource_type)
            .bind(&item.description)
            .bind(item.service_status)
            .bind(&item.service_notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(defaults.len())
    }
}

/// In-process inventory used when no database is configured, and by tests
#[derive(Clone, Default)]
pub struct InMemoryItemRepository {
    items: Arc<RwLock<Vec<Item>>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn list(&self, resource_type: Option<ResourceType>) -> Result<Vec<Item>, InventoryError> {
        let items = self.items.read().await;
        let mut matching: Vec<Item> = items
            .iter()
            .filter(|item| resource_type.map_or(true, |rt| item.resource_type == rt))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matching)
    }

    async fn seed_defaults_if_empty(&self) -> Result<usize, InventoryError> {
        let mut items = self.items.write().await;
        if !items.is_empty() {
            return Ok(0);
        }
        items.extend(seed::default_items());
        Ok(items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_populates_empty_store_once() {
        let repo = InMemoryItemRepository::new();

        let inserted = repo.seed_defaults_if_empty().await.unwrap();
        assert_eq!(inserted, seed::default_items().len());

        let again = repo.seed_defaults_if_empty().await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_resource_type() {
        let repo = InMemoryItemRepository::new();
        repo.seed_defaults_if_empty().await.unwrap();

        let gear = repo.list(Some(ResourceType::GearShed)).await.unwrap();
        assert_eq!(gear.len(), 4);
        assert!(gear.iter().all(|i| i.resource_type == ResourceType::GearShed));

        // Sorted by name
        let names: Vec<&str> = gear.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Kayak 1", "Kayak 2", "Mountain Bike 1", "Mountain Bike 2"]);
    }
}
