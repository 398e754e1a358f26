//! Cart Contents Handler

use std::sync::Arc;

use salvo::prelude::*;

use trolley_app::domain::carts::CartsServiceError;

use crate::{
    carts::{errors::into_status_error, handlers::CartContentsResponse},
    extensions::*,
    state::State,
};

/// Get Cart Contents Handler
///
/// Returns the shopper's cart items and pre-discount total. A shopper with
/// no cart yet sees an empty cart, not an error.
#[endpoint(
    tags("cart"),
    summary = "Get Cart Contents",
    responses(
        (status_code = StatusCode::OK, description = "Cart contents"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No shopper identity"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartContentsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_key_or_401()?;

    match state.app.carts.get_cart(owner).await {
        Ok(cart) => Ok(Json(CartContentsResponse::from_cart(cart))),
        Err(CartsServiceError::NotFound) => {
            Ok(Json(CartContentsResponse::empty(state.app.currency)))
        }
        Err(error) => Err(into_status_error(error)),
    }
}
