use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::services;
use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    response::Envelope,
    state::AppState,
    store::{ItemKind, ItemSnapshot, SavedItem},
};

/// A catalog mounted under `/user/:id/<SEGMENT>`.
pub trait Catalog: Send + Sync + 'static {
    const KIND: ItemKind;
    const SEGMENT: &'static str;
}

pub struct Universities;

impl Catalog for Universities {
    const KIND: ItemKind = ItemKind::University;
    const SEGMENT: &'static str = "universities";
}

pub struct Scholarships;

impl Catalog for Scholarships {
    const KIND: ItemKind = ItemKind::Scholarship;
    const SEGMENT: &'static str = "scholarships";
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub kind: ItemKind,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SavedStatus {
    pub saved: bool,
}

fn catalog_routes<C: Catalog>() -> Router<AppState> {
    let base = format!("/user/:id/{}", C::SEGMENT);
    Router::new()
        .route(
            &base,
            get(list_items::<C>)
                .post(save_item::<C>)
                .delete(unsave_by_name::<C>),
        )
        .route(&format!("{base}/:item_id"), delete(unsave_by_id::<C>))
}

pub fn saved_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes::<Universities>())
        .merge(catalog_routes::<Scholarships>())
        .route("/user/:id/saved-status", get(saved_status))
}

#[instrument(skip(state, current), fields(kind = %C::KIND))]
pub async fn list_items<C: Catalog>(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<SavedItem>>>, ApiError> {
    current.ensure_self(id)?;
    let items = services::list_saved(state.store.as_ref(), id, C::KIND).await?;
    Ok(Envelope::ok(items))
}

#[instrument(skip(state, current, snapshot), fields(kind = %C::KIND))]
pub async fn save_item<C: Catalog>(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(snapshot): Json<ItemSnapshot>,
) -> Result<(StatusCode, Json<Envelope<SavedItem>>), ApiError> {
    current.ensure_self(id)?;
    let outcome = services::save(state.store.as_ref(), id, C::KIND, snapshot).await?;
    if outcome.created {
        Ok((StatusCode::CREATED, Envelope::ok_with("Saved", outcome.item)))
    } else {
        Ok((StatusCode::OK, Envelope::ok_with("Already saved", outcome.item)))
    }
}

#[instrument(skip(state, current), fields(kind = %C::KIND))]
pub async fn unsave_by_name<C: Catalog>(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Envelope<()>>, ApiError> {
    current.ensure_self(id)?;
    services::unsave(state.store.as_ref(), id, C::KIND, &query.name).await?;
    Ok(Envelope::message("Removed"))
}

#[instrument(skip(state, current), fields(kind = %C::KIND))]
pub async fn unsave_by_id<C: Catalog>(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Envelope<()>>, ApiError> {
    current.ensure_self(id)?;
    services::unsave_by_id(state.store.as_ref(), id, C::KIND, item_id).await?;
    Ok(Envelope::message("Removed"))
}

#[instrument(skip(state, current))]
pub async fn saved_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Envelope<SavedStatus>>, ApiError> {
    current.ensure_self(id)?;
    let saved = services::is_saved(state.store.as_ref(), id, query.kind, &query.name).await?;
    Ok(Envelope::ok(SavedStatus { saved }))
}
