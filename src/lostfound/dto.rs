use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::lostfound::repo::{Item, ItemStatus, ItemType};

/// Report body. Every field is optional at the serde level so the
/// handler can answer with the single required-fields message instead of
/// a deserializer error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub image: Option<String>,
}

/// `reportedBy`, `reportedAt` and `deleted` are not client-settable;
/// unknown fields are rejected at the boundary.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub image: Option<String>,
    pub status: Option<ItemStatus>,
    pub is_flagged: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// Public item view: the reporter's contact detail is stripped from
/// every list/get/search response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub category: String,
    pub date: String,
    pub location: String,
    pub image: Option<String>,
    pub reported_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub reported_at: OffsetDateTime,
    pub status: ItemStatus,
    pub is_flagged: bool,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            item_type: item.item_type,
            category: item.category.clone(),
            date: item.date.clone(),
            location: item.location.clone(),
            image: item.image.clone(),
            reported_by: item.reported_by.clone(),
            reported_at: item.reported_at,
            status: item.status,
            is_flagged: item.is_flagged,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemsBody {
    pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
pub struct ItemBody {
    pub item: ItemView,
}

#[derive(Debug, Serialize)]
pub struct CreatedItemBody {
    pub message: String,
    pub item: ItemView,
}

#[cfg(test)]
mod view_tests {
    use super::*;
    use time::macros::datetime;

    fn item() -> Item {
        Item {
            id: Uuid::new_v4(),
            name: "Wallet".into(),
            description: "Brown leather".into(),
            item_type: ItemType::Lost,
            category: "accessories".into(),
            date: "2025-06-01".into(),
            location: "Library".into(),
            contact: "555-0101".into(),
            image: None,
            reported_by: "alice".into(),
            reported_at: datetime!(2025-06-01 10:00 UTC),
            status: ItemStatus::Pending,
            is_flagged: false,
            deleted: false,
            deleted_at: None,
        }
    }

    #[test]
    fn view_strips_contact() {
        let json = serde_json::to_string(&ItemView::from(&item())).unwrap();
        assert!(!json.contains("contact"));
        assert!(!json.contains("555-0101"));
        assert!(json.contains("Wallet"));
    }

    #[test]
    fn view_renames_item_type_to_type() {
        let v = serde_json::to_value(ItemView::from(&item())).unwrap();
        assert_eq!(v["type"], "lost");
        assert!(v.get("itemType").is_none());
        assert_eq!(v["isFlagged"], false);
    }

    #[test]
    fn update_request_rejects_deleted_flag() {
        let err =
            serde_json::from_str::<UpdateItemRequest>(r#"{"name":"x","deleted":true}"#).unwrap_err();
        assert!(err.to_string().contains("deleted"));
    }
}
