use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::groups::repo::{GroupMessage, GroupStatus, PendingRequest, StudyGroup};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `createdBy` and `createdAt` are not updatable; unknown fields are
/// rejected at the boundary instead of being silently dropped.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<GroupStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub members: Vec<String>,
    pub requests: Vec<String>,
    pub status: GroupStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&StudyGroup> for GroupView {
    fn from(g: &StudyGroup) -> Self {
        Self {
            id: g.id,
            name: g.name.clone(),
            description: g.description.clone(),
            created_by: g.created_by.clone(),
            members: g.members.clone(),
            requests: g.requests.clone(),
            status: g.status,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub sender: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<&GroupMessage> for MessageView {
    fn from(m: &GroupMessage) -> Self {
        Self {
            sender: m.sender.clone(),
            text: m.body.clone(),
            timestamp: m.sent_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetailView {
    #[serde(flatten)]
    pub group: GroupView,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct GroupsBody {
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Serialize)]
pub struct GroupBody {
    pub group: GroupDetailView,
}

#[derive(Debug, Serialize)]
pub struct CreatedGroupBody {
    pub message: String,
    pub group: GroupView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    pub group_id: Uuid,
    pub group_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
}

impl From<&PendingRequest> for PendingRequestView {
    fn from(p: &PendingRequest) -> Self {
        Self {
            group_id: p.group_id,
            group_name: p.group_name.clone(),
            requested_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PendingRequestsBody {
    pub requests: Vec<PendingRequestView>,
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn message_view_maps_body_to_text() {
        let m = GroupMessage {
            id: 1,
            group_id: Uuid::new_v4(),
            sender: "alice".into(),
            body: "meet at 6?".into(),
            sent_at: datetime!(2025-06-01 18:00 UTC),
        };
        let v = serde_json::to_value(MessageView::from(&m)).unwrap();
        assert_eq!(v["sender"], "alice");
        assert_eq!(v["text"], "meet at 6?");
        assert!(v.get("body").is_none());
    }

    #[test]
    fn update_request_rejects_protected_fields() {
        let err = serde_json::from_str::<UpdateGroupRequest>(
            r#"{"name":"x","createdBy":"mallory"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("createdBy"));
    }

    #[test]
    fn pending_view_exposes_group_updated_at_as_request_time() {
        let p = PendingRequest {
            group_id: Uuid::new_v4(),
            group_name: "Algo Study".into(),
            updated_at: datetime!(2025-06-02 09:30 UTC),
        };
        let v = serde_json::to_value(PendingRequestView::from(&p)).unwrap();
        assert_eq!(v["groupName"], "Algo Study");
        assert!(v.get("requestedAt").is_some());
    }
}
