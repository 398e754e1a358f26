//! Decrement Cart Item Handler

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

/// Decrement Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DecrementItemRequest {
    pub subproduct_uuid: Uuid,
}

/// Decrement Item Handler
///
/// Takes one unit off a line; the line disappears when it reaches zero.
#[endpoint(
    tags("cart"),
    summary = "Decrement Cart Item",
    responses(
        (status_code = StatusCode::OK, description = "Quantity reduced, updated contents returned"),
        (status_code = StatusCode::NOT_FOUND, description = "No active cart"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Line not in cart"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<DecrementItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartContentsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_key_or_401()?;

    let cart = state
        .app
        .carts
        .decrement_item(owner, json.into_inner().subproduct_uuid.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(CartContentsResponse::from_cart(cart)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use trolley_app::{
        domain::{
            carts::{CartsServiceError, MockCartsService},
            catalog::models::SubproductUuid,
        },
        identity::OwnerKey,
    };

    use crate::test_helpers::{
        TEST_SESSION_UUID, carts_service, make_cart, make_item,
    };

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        carts_service(carts, Router::with_path("cart/decrement").post(handler))
    }

    #[tokio::test]
    async fn decrements_item_and_returns_contents() -> TestResult {
        let subproduct = SubproductUuid::new();
        let cart = make_cart(
            TEST_SESSION_UUID,
            vec![make_item(subproduct, 10_00, 1)],
            10_00,
        );

        let mut carts = MockCartsService::new();

        carts
            .expect_decrement_item()
            .once()
            .withf(move |owner, sub| {
                *owner == OwnerKey::Session(TEST_SESSION_UUID) && *sub == subproduct
            })
            .return_once(move |_, _| Ok(cart));

        let mut res = TestClient::post("http://example.com/cart/decrement")
            .json(&json!({ "subproduct_uuid": subproduct.into_uuid() }))
            .send(&make_service(carts))
            .await;

        let body: CartContentsResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.items.first().map(|item| item.quantity), Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn missing_cart_returns_404() -> TestResult {
        let mut carts = MockCartsService::new();

        carts
            .expect_decrement_item()
            .once()
            .return_once(|_, _| Err(CartsServiceError::NotFound));

        let res = TestClient::post("http://example.com/cart/decrement")
            .json(&json!({ "subproduct_uuid": Uuid::now_v7() }))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
