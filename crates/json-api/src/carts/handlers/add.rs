//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    carts::{errors::into_status_error, handlers::CartContentsResponse},
    extensions::*,
    state::State,
};

/// Add Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddItemRequest {
    pub subproduct_uuid: Uuid,
    pub quantity: u32,
}

/// Add Item Handler
///
/// Adds units of a subproduct to the shopper's cart, creating the cart on
/// first use. Re-adding an existing line increments its quantity.
#[endpoint(
    tags("cart"),
    summary = "Add Item to Cart",
    responses(
        (status_code = StatusCode::CREATED, description = "Item added, updated contents returned"),
        (status_code = StatusCode::NOT_FOUND, description = "Subproduct not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Out of stock, unavailable or invalid quantity"),
        (status_code = StatusCode::CONFLICT, description = "Concurrent modification, retry"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<AddItemRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartContentsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_key_or_401()?;

    let request = json.into_inner();

    let cart = state
        .app
        .carts
        .add_item(owner, request.subproduct_uuid.into(), request.quantity)
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(CartContentsResponse::from_cart(cart)))
}
