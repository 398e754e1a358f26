//! Checkout Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trolley_app::domain::checkout::models::CheckoutRequest;

use crate::{
    checkout::{
        errors::into_status_error,
        handlers::{AddressBody, OrderResponse},
    },
    extensions::*,
    state::State,
};

/// Checkout Request Body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutBody {
    pub shipping_address: AddressBody,

    /// Defaults to the shipping address when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<AddressBody>,
}

impl From<CheckoutBody> for CheckoutRequest {
    fn from(body: CheckoutBody) -> Self {
        Self {
            shipping_address: body.shipping_address.into(),
            billing_address: body.billing_address.map(Into::into),
        }
    }
}

/// Checkout Handler
///
/// Converts the cart into an order in one atomic step: ownership, contents
/// and stock are re-validated, totals and the applied deal are locked in,
/// and the cart becomes immutable. Any failure leaves everything as it was.
#[endpoint(
    tags("checkout"),
    summary = "Checkout Cart",
    responses(
        (status_code = StatusCode::OK, description = "Order placed"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Cart belongs to someone else"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Empty cart or stock changed"),
        (status_code = StatusCode::CONFLICT, description = "Concurrent checkout, retry"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    cart: PathParam<Uuid>,
    json: JsonBody<CheckoutBody>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let shopper = depot.shopper_or_401()?;

    let order = state
        .app
        .checkout
        .checkout(
            shopper,
            cart.into_inner().into(),
            json.into_inner().into(),
            Timestamp::now(),
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use trolley_app::{
        domain::{
            carts::models::CartUuid,
            catalog::models::SubproductUuid,
            checkout::{CheckoutServiceError, MockCheckoutService},
        },
        identity::Shopper,
    };

    use crate::{
        checkout::handlers::tests::make_order,
        test_helpers::{TEST_SESSION_UUID, checkout_service},
    };

    use super::*;

    fn make_service(checkout: MockCheckoutService) -> Service {
        checkout_service(checkout, Router::with_path("checkout/{cart}").post(handler))
    }

    fn body() -> serde_json::Value {
        json!({
            "shipping_address": {
                "name": "Sam Doe",
                "line1": "1 High Street",
                "city": "Springfield",
                "postal_code": "12345",
                "country": "US"
            }
        })
    }

    #[tokio::test]
    async fn checkout_returns_order() -> TestResult {
        let cart = CartUuid::new();
        let order = make_order(TEST_SESSION_UUID, 25_00);

        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout()
            .once()
            .withf(move |shopper, requested_cart, request, _| {
                *shopper == Shopper::for_session(TEST_SESSION_UUID)
                    && *requested_cart == cart
                    && request.billing_address.is_none()
                    && request.shipping_address.city == "Springfield"
            })
            .return_once(move |_, _, _, _| Ok(order));

        checkout.expect_get_order().never();

        let mut res = TestClient::post(format!("http://example.com/checkout/{cart}"))
            .json(&body())
            .send(&make_service(checkout))
            .await;

        let response: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(response.final_total, 25_00);
        assert_eq!(response.final_total_formatted.as_deref(), Some("$25.00"));
        assert_eq!(response.payment_status, "pending");
        assert_eq!(response.items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_returns_422() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout()
            .once()
            .return_once(|_, _, _, _| Err(CheckoutServiceError::EmptyCart));

        checkout.expect_get_order().never();

        let res = TestClient::post(format!("http://example.com/checkout/{}", CartUuid::new()))
            .json(&body())
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn stock_changed_returns_422() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout.expect_checkout().once().return_once(|_, _, _, _| {
            Err(CheckoutServiceError::StockChanged {
                subproduct: SubproductUuid::new(),
            })
        });

        checkout.expect_get_order().never();

        let res = TestClient::post(format!("http://example.com/checkout/{}", CartUuid::new()))
            .json(&body())
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn foreign_cart_returns_403() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout()
            .once()
            .return_once(|_, _, _, _| Err(CheckoutServiceError::CartNotOwned));

        checkout.expect_get_order().never();

        let res = TestClient::post(format!("http://example.com/checkout/{}", CartUuid::new()))
            .json(&body())
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn missing_address_returns_400() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout.expect_checkout().never();
        checkout.expect_get_order().never();

        let res = TestClient::post(format!("http://example.com/checkout/{}", CartUuid::new()))
            .json(&json!({}))
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
