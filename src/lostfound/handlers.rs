use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::{AdminUser, CurrentUser, OptionalUser},
    error::{message, ok, ApiError, MessageBody, Success},
    lostfound::{
        dto::{
            CreateItemRequest, CreatedItemBody, ItemBody, ItemView, ItemsBody, ListQuery,
            SearchQuery, UpdateItemRequest,
        },
        repo::{Item, ItemUpdate, NewItem},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lostfound", get(list_items).post(create_item))
        .route("/lostfound/search", get(search_items))
        .route(
            "/lostfound/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Success<CreatedItemBody>>), ApiError> {
    let (name, description, item_type, category, date, location, contact) = match (
        payload.name.as_deref(),
        payload.description.as_deref(),
        payload.item_type,
        payload.category.as_deref(),
        payload.date.as_deref(),
        payload.location.as_deref(),
        payload.contact.as_deref(),
    ) {
        (Some(n), Some(d), Some(t), Some(c), Some(dt), Some(l), Some(ct))
            if ![n, d, c, dt, l, ct].iter().any(|f| f.trim().is_empty()) =>
        {
            (n, d, t, c, dt, l, ct)
        }
        _ => return Err(ApiError::Validation("All fields are required".into())),
    };

    let reported_by = user
        .as_ref()
        .map(|u| u.username.as_str())
        .unwrap_or("anonymous");

    let item = Item::create(
        &state.db,
        NewItem {
            name,
            description,
            item_type,
            category,
            date,
            location,
            contact,
            image: payload.image.as_deref(),
            reported_by,
        },
    )
    .await?;

    info!(item_id = %item.id, reported_by = %item.reported_by, "item reported");
    Ok((
        StatusCode::CREATED,
        ok(CreatedItemBody {
            message: "Item reported successfully".into(),
            item: ItemView::from(&item),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Success<ItemsBody>>, ApiError> {
    let items = Item::list(&state.db, q.item_type, q.category.as_deref()).await?;
    Ok(ok(ItemsBody {
        items: items.iter().map(ItemView::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Success<ItemBody>>, ApiError> {
    let item = Item::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Item not found".into()))?;
    Ok(ok(ItemBody {
        item: ItemView::from(&item),
    }))
}

/// Empty query falls back to the full live listing.
#[instrument(skip(state))]
pub async fn search_items(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Success<ItemsBody>>, ApiError> {
    let items = match q.query.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => Item::search(&state.db, query).await?,
        _ => Item::list(&state.db, None, None).await?,
    };
    Ok(ok(ItemsBody {
        items: items.iter().map(ItemView::from).collect(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let updated = Item::update(
        &state.db,
        id,
        ItemUpdate {
            name: payload.name.as_deref(),
            description: payload.description.as_deref(),
            item_type: payload.item_type,
            category: payload.category.as_deref(),
            date: payload.date.as_deref(),
            location: payload.location.as_deref(),
            contact: payload.contact.as_deref(),
            image: payload.image.as_deref(),
            status: payload.status,
            is_flagged: payload.is_flagged,
        },
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound("Item not found".into()));
    }
    Ok(message("Item updated successfully"))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    if !Item::soft_delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Item not found".into()));
    }

    info!(item_id = %id, admin = %admin.username, "item soft-deleted");
    Ok(message("Item deleted successfully"))
}
