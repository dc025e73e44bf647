use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "item_type", rename_all = "lowercase")]
pub enum ItemType {
    Lost,
    Found,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Approved,
    Resolved,
}

/// A reported lost/found item. Rows are never physically removed through
/// the API; `deleted` hides them from every read path.
#[derive(Debug, Clone, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub item_type: ItemType,
    pub category: String,
    pub date: String,
    pub location: String,
    pub contact: String,
    pub image: Option<String>,
    pub reported_by: String,
    pub reported_at: OffsetDateTime,
    pub status: ItemStatus,
    pub is_flagged: bool,
    pub deleted: bool,
    pub deleted_at: Option<OffsetDateTime>,
}

pub struct NewItem<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub item_type: ItemType,
    pub category: &'a str,
    pub date: &'a str,
    pub location: &'a str,
    pub contact: &'a str,
    pub image: Option<&'a str>,
    pub reported_by: &'a str,
}

pub struct ItemUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub item_type: Option<ItemType>,
    pub category: Option<&'a str>,
    pub date: Option<&'a str>,
    pub location: Option<&'a str>,
    pub contact: Option<&'a str>,
    pub image: Option<&'a str>,
    pub status: Option<ItemStatus>,
    pub is_flagged: Option<bool>,
}

const ITEM_COLUMNS: &str = "id, name, description, item_type, category, date, location, contact, \
     image, reported_by, reported_at, status, is_flagged, deleted, deleted_at";

/// Escape LIKE metacharacters in user-supplied search input, then match
/// anywhere in the field.
pub fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl Item {
    pub async fn create(db: &PgPool, item: NewItem<'_>) -> anyhow::Result<Item> {
        let row = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO lost_items
                (name, description, item_type, category, date, location, contact, image, reported_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item.name)
        .bind(item.description)
        .bind(item.item_type)
        .bind(item.category)
        .bind(item.date)
        .bind(item.location)
        .bind(item.contact)
        .bind(item.image)
        .bind(item.reported_by)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Live items only, optionally narrowed by type and/or category.
    pub async fn list(
        db: &PgPool,
        item_type: Option<ItemType>,
        category: Option<&str>,
    ) -> anyhow::Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, Item>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM lost_items
            WHERE NOT deleted
              AND ($1::item_type IS NULL OR item_type = $1)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY reported_at DESC
            "#
        ))
        .bind(item_type)
        .bind(category)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Item>> {
        let row = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM lost_items WHERE id = $1 AND NOT deleted"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn update(db: &PgPool, id: Uuid, update: ItemUpdate<'_>) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE lost_items
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                item_type = COALESCE($4, item_type),
                category = COALESCE($5, category),
                date = COALESCE($6, date),
                location = COALESCE($7, location),
                contact = COALESCE($8, contact),
                image = COALESCE($9, image),
                status = COALESCE($10, status),
                is_flagged = COALESCE($11, is_flagged)
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.item_type)
        .bind(update.category)
        .bind(update.date)
        .bind(update.location)
        .bind(update.contact)
        .bind(update.image)
        .bind(update.status)
        .bind(update.is_flagged)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft delete; repeat deletion of the same item reports not-found.
    pub async fn soft_delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE lost_items SET deleted = true, deleted_at = now() WHERE id = $1 AND NOT deleted",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn search(db: &PgPool, query: &str) -> anyhow::Result<Vec<Item>> {
        let pattern = like_pattern(query);
        let rows = sqlx::query_as::<_, Item>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM lost_items
            WHERE NOT deleted
              AND (name ILIKE $1 OR description ILIKE $1 OR location ILIKE $1 OR category ILIKE $1)
            ORDER BY reported_at DESC
            "#
        ))
        .bind(pattern)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod pattern_tests {
    use super::*;

    #[test]
    fn wraps_in_wildcards() {
        assert_eq!(like_pattern("wallet"), "%wallet%");
    }

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern(r"back\slash"), "%back\\\\slash%");
    }
}

#[cfg(test)]
mod soft_delete_tests {
    use super::*;

    async fn wallet(db: &PgPool) -> Item {
        Item::create(
            db,
            NewItem {
                name: "Wallet",
                description: "Brown leather wallet",
                item_type: ItemType::Lost,
                category: "accessories",
                date: "2025-06-01",
                location: "Library",
                contact: "555-0101",
                image: None,
                reported_by: "alice",
            },
        )
        .await
        .expect("create item")
    }

    #[sqlx::test]
    async fn deleted_item_disappears_from_every_read_path(pool: PgPool) {
        let item = wallet(&pool).await;

        assert!(Item::soft_delete(&pool, item.id).await.unwrap());

        assert!(Item::list(&pool, None, None).await.unwrap().is_empty());
        assert!(Item::find(&pool, item.id).await.unwrap().is_none());
        assert!(Item::search(&pool, "wallet").await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn repeat_delete_reports_not_found(pool: PgPool) {
        let item = wallet(&pool).await;

        assert!(Item::soft_delete(&pool, item.id).await.unwrap());
        assert!(!Item::soft_delete(&pool, item.id).await.unwrap());
    }

    #[sqlx::test]
    async fn update_skips_deleted_rows(pool: PgPool) {
        let item = wallet(&pool).await;
        Item::soft_delete(&pool, item.id).await.unwrap();

        let touched = Item::update(
            &pool,
            item.id,
            ItemUpdate {
                name: Some("Black wallet"),
                description: None,
                item_type: None,
                category: None,
                date: None,
                location: None,
                contact: None,
                image: None,
                status: None,
                is_flagged: None,
            },
        )
        .await
        .unwrap();
        assert!(!touched);
    }

    #[sqlx::test]
    async fn live_items_stay_searchable(pool: PgPool) {
        let item = wallet(&pool).await;

        let hits = Item::search(&pool, "WALLET").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, item.id);
    }
}
