//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use jiff::Timestamp;

use trolley_app::{
    context::AppContext,
    domain::{
        carts::{
            MockCartsService,
            models::{Cart, CartItem, CartItemUuid, CartStatus, CartUuid},
        },
        catalog::models::SubproductUuid,
        checkout::MockCheckoutService,
        pricing::MockPricingService,
    },
    identity::{SessionUuid, Shopper},
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_CURRENCY: &str = "USD";

pub(crate) const TEST_SESSION_UUID: SessionUuid = SessionUuid::from_uuid(Uuid::nil());

/// Stands in for the session middleware: every request is the same
/// anonymous shopper.
#[salvo::handler]
pub(crate) async fn inject_shopper(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_shopper(Shopper::for_session(TEST_SESSION_UUID));
    ctrl.call_next(req, depot, res).await;
}

fn strict_carts_mock() -> MockCartsService {
    let mut carts = MockCartsService::new();

    carts.expect_get_cart().never();
    carts.expect_resolve_cart().never();
    carts.expect_add_item().never();
    carts.expect_decrement_item().never();
    carts.expect_remove_line().never();
    carts.expect_clear_cart().never();
    carts.expect_merge_guest_cart_into_user().never();

    carts
}

fn strict_pricing_mock() -> MockPricingService {
    let mut pricing = MockPricingService::new();

    pricing.expect_price_cart().never();

    pricing
}

fn strict_checkout_mock() -> MockCheckoutService {
    let mut checkout = MockCheckoutService::new();

    checkout.expect_checkout().never();
    checkout.expect_get_order().never();

    checkout
}

fn make_state(
    carts: MockCartsService,
    pricing: MockPricingService,
    checkout: MockCheckoutService,
) -> Arc<State> {
    Arc::new(State::new(AppContext {
        carts: Arc::new(carts),
        pricing: Arc::new(pricing),
        checkout: Arc::new(checkout),
        currency: TEST_CURRENCY,
    }))
}

pub(crate) fn state_with_carts(carts: MockCartsService) -> Arc<State> {
    make_state(carts, strict_pricing_mock(), strict_checkout_mock())
}

pub(crate) fn state_with_pricing(pricing: MockPricingService) -> Arc<State> {
    make_state(strict_carts_mock(), pricing, strict_checkout_mock())
}

pub(crate) fn state_with_checkout(checkout: MockCheckoutService) -> Arc<State> {
    make_state(strict_carts_mock(), strict_pricing_mock(), checkout)
}

fn service_with_state(state: Arc<State>, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state))
            .hoop(inject_shopper)
            .push(route),
    )
}

pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    service_with_state(state_with_carts(carts), route)
}

pub(crate) fn make_cart(session: SessionUuid, items: Vec<CartItem>, total: u64) -> Cart {
    Cart {
        uuid: CartUuid::new(),
        user_uuid: None,
        session_uuid: Some(session),
        currency: TEST_CURRENCY.to_string(),
        status: CartStatus::Active,
        total,
        items,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
        deleted_at: None,
    }
}

pub(crate) fn make_item(subproduct: SubproductUuid, unit_price: u64, quantity: u32) -> CartItem {
    CartItem {
        uuid: CartItemUuid::new(),
        subproduct_uuid: subproduct,
        name: "Variant".to_string(),
        unit_price,
        quantity,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn pricing_service(pricing: MockPricingService, route: Router) -> Service {
    service_with_state(state_with_pricing(pricing), route)
}

pub(crate) fn checkout_service(checkout: MockCheckoutService, route: Router) -> Service {
    service_with_state(state_with_checkout(checkout), route)
}
