use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::CurrentUser,
    error::{message, ok, ApiError, MessageBody, Success},
    groups::{
        dto::{
            CreateGroupRequest, CreatedGroupBody, GroupBody, GroupDetailView, GroupView,
            GroupsBody, MemberRequest, MessageView, PendingRequestView, PendingRequestsBody,
            PostMessageRequest, UpdateGroupRequest,
        },
        repo::{GroupMessage, StudyGroup},
    },
    state::AppState,
    users::repo::Role,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/studygroups", get(list_groups).post(create_group))
        .route("/studygroups/requests", get(pending_requests))
        .route(
            "/studygroups/:id",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/studygroups/:id/messages", post(post_message))
        .route(
            "/studygroups/:id/members",
            post(add_member).delete(remove_member),
        )
        .route("/studygroups/:id/request", post(request_join))
        .route("/studygroups/:id/accept", post(accept_request))
        .route("/studygroups/:id/reject", post(reject_request))
}

/// Admins and the group creator may manage membership and delete the
/// group; nobody else.
pub fn can_manage(actor: &CurrentUser, created_by: &str) -> bool {
    actor.role == Role::Admin || actor.username == created_by
}

async fn load_group(state: &AppState, id: Uuid) -> Result<StudyGroup, ApiError> {
    StudyGroup::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Study group not found".into()))
}

#[instrument(skip(state, payload))]
pub async fn create_group(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Success<CreatedGroupBody>>), ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("Group name is required".into()))?;

    let group = StudyGroup::create(
        &state.db,
        name,
        payload.description.as_deref(),
        &user.username,
    )
    .await?;

    info!(group_id = %group.id, creator = %user.username, "study group created");
    Ok((
        StatusCode::CREATED,
        ok(CreatedGroupBody {
            message: "Study group created successfully".into(),
            group: GroupView::from(&group),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_groups(
    State(state): State<AppState>,
) -> Result<Json<Success<GroupsBody>>, ApiError> {
    let groups = StudyGroup::list_active(&state.db).await?;
    Ok(ok(GroupsBody {
        groups: groups.iter().map(GroupView::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Success<GroupBody>>, ApiError> {
    let group = load_group(&state, id).await?;
    let messages = GroupMessage::list_for_group(&state.db, id).await?;
    Ok(ok(GroupBody {
        group: GroupDetailView {
            group: GroupView::from(&group),
            messages: messages.iter().map(MessageView::from).collect(),
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_group(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let updated = StudyGroup::update(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.description.as_deref(),
        payload.status,
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound("Study group not found".into()));
    }
    Ok(message("Study group updated successfully"))
}

#[instrument(skip(state))]
pub async fn delete_group(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let group = load_group(&state, id).await?;

    if !can_manage(&user, &group.created_by) {
        warn!(group_id = %id, actor = %user.username, "unauthorized group delete");
        return Err(ApiError::Forbidden(
            "Only administrators or group creators can delete groups".into(),
        ));
    }

    if !StudyGroup::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Study group not found".into()));
    }

    info!(group_id = %id, actor = %user.username, "study group deleted");
    Ok(message("Study group deleted successfully"))
}

/// No membership check here: any authenticated user may post. Gating on
/// membership is an open product decision, not a server rule today.
#[instrument(skip(state, payload))]
pub async fn post_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::Validation("Message text is required".into()));
    }

    if !GroupMessage::append(&state.db, id, &user.username, &payload.text).await? {
        return Err(ApiError::NotFound("Study group not found".into()));
    }
    Ok(message("Message added successfully"))
}

#[instrument(skip(state, payload))]
pub async fn add_member(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberRequest>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    if !StudyGroup::add_member(&state.db, id, &payload.username).await? {
        return Err(ApiError::NotFound("Study group not found".into()));
    }
    Ok(message("User added to group successfully"))
}

#[instrument(skip(state, payload))]
pub async fn remove_member(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberRequest>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    if !StudyGroup::remove_member(&state.db, id, &payload.username).await? {
        return Err(ApiError::NotFound("Study group not found".into()));
    }
    Ok(message("User removed from group successfully"))
}

#[instrument(skip(state))]
pub async fn request_join(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let group = load_group(&state, id).await?;

    if group.members.iter().any(|m| m == &user.username) {
        return Err(ApiError::Validation(
            "User is already a member of this group".into(),
        ));
    }

    // The conditional update is the duplicate guard: under concurrent
    // identical requests exactly one wins.
    if !StudyGroup::add_join_request(&state.db, id, &user.username).await? {
        return Err(ApiError::Validation(
            "Failed to send join request. You may have already requested to join.".into(),
        ));
    }

    info!(group_id = %id, username = %user.username, "join request sent");
    Ok(message("Join request sent successfully"))
}

#[instrument(skip(state, payload))]
pub async fn accept_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberRequest>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let group = load_group(&state, id).await?;

    if !can_manage(&user, &group.created_by) {
        warn!(group_id = %id, actor = %user.username, "unauthorized accept");
        return Err(ApiError::Forbidden(
            "Only administrators or group creators can accept join requests".into(),
        ));
    }

    // Single statement moves the user from requests to members.
    if !StudyGroup::add_member(&state.db, id, &payload.username).await? {
        return Err(ApiError::NotFound("Study group not found".into()));
    }

    info!(group_id = %id, username = %payload.username, actor = %user.username, "join request accepted");
    Ok(message("Join request accepted successfully"))
}

#[instrument(skip(state, payload))]
pub async fn reject_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberRequest>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let group = load_group(&state, id).await?;

    if !can_manage(&user, &group.created_by) {
        warn!(group_id = %id, actor = %user.username, "unauthorized reject");
        return Err(ApiError::Forbidden(
            "Only administrators or group creators can reject join requests".into(),
        ));
    }

    if !StudyGroup::remove_join_request(&state.db, id, &payload.username).await? {
        return Err(ApiError::NotFound("Study group not found".into()));
    }

    info!(group_id = %id, username = %payload.username, actor = %user.username, "join request rejected");
    Ok(message("Join request rejected successfully"))
}

#[instrument(skip(state))]
pub async fn pending_requests(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Success<PendingRequestsBody>>, ApiError> {
    let pending = StudyGroup::pending_for_user(&state.db, &user.username).await?;
    Ok(ok(PendingRequestsBody {
        requests: pending.iter().map(PendingRequestView::from).collect(),
    }))
}
