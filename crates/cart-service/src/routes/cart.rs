//! Cart route handlers.
//!
//! Every handler owns its [`RequestContext`], so the request span closes on
//! every exit path including validation failures.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use catalog_core::{Cart, CartId};
use catalog_observe::RequestContext;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Body of `PUT /cart/{cart_id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub items: Vec<String>,
}

/// Body of `POST /cart/{cart_id}/items/`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub item: String,
}

/// Response of `GET /cart/{cart_id}/`.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Cart,
}

fn bad_body(rejection: &JsonRejection) -> AppError {
    AppError::BadRequest(format!("invalid request body: {}", rejection.body_text()))
}

/// Get a cart. A cart that was never written comes back empty.
#[instrument(skip_all, fields(cart_id = %cart_id, request_id = %ctx.request_id()))]
pub async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(cart_id): Path<String>,
) -> Result<Json<CartResponse>> {
    let id = CartId::parse(&cart_id)?;
    let cart = state.carts().get_cart(&ctx, &id).await?;
    tracing::info!(items = cart.items().len(), "cart fetched");
    Ok(Json(CartResponse { cart }))
}

/// Replace the cart's items wholesale.
#[instrument(skip_all, fields(cart_id = %cart_id, request_id = %ctx.request_id()))]
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(cart_id): Path<String>,
    body: std::result::Result<Json<UpdateCartRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let id = CartId::parse(&cart_id)?;
    let Json(request) = body.map_err(|e| bad_body(&e))?;
    let count = request.items.len();
    state.carts().update_cart(&ctx, &id, request.items).await?;
    tracing::info!(items = count, "cart updated");
    Ok(StatusCode::ACCEPTED)
}

/// Append one item to the cart.
#[instrument(skip_all, fields(cart_id = %cart_id, request_id = %ctx.request_id()))]
pub async fn add_item(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(cart_id): Path<String>,
    body: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let id = CartId::parse(&cart_id)?;
    let Json(request) = body.map_err(|e| bad_body(&e))?;
    if request.item.trim().is_empty() {
        return Err(AppError::BadRequest("item is required".to_string()));
    }
    tracing::info!(item_id = %request.item, "adding item");
    state.carts().add_to_cart(&ctx, &id, request.item).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Delete the cart. Deleting a missing cart still returns 202.
#[instrument(skip_all, fields(cart_id = %cart_id, request_id = %ctx.request_id()))]
pub async fn remove(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(cart_id): Path<String>,
) -> Result<StatusCode> {
    let id = CartId::parse(&cart_id)?;
    state.carts().delete_cart(&ctx, &id).await?;
    tracing::info!("cart deleted");
    Ok(StatusCode::ACCEPTED)
}
