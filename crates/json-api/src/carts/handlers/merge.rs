//! Merge Guest Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, handlers::CartContentsResponse},
    extensions::*,
    state::State,
};

/// Merge Guest Cart Handler
///
/// Invoked right after login, while the request still carries both the
/// anonymous session and the freshly-authenticated user. Sums the guest
/// cart's quantities into the user's cart; safe to re-run.
#[endpoint(
    tags("cart"),
    summary = "Merge Guest Cart Into User Cart",
    responses(
        (status_code = StatusCode::OK, description = "Merged cart returned"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Requires both a user and a session identity"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartContentsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let shopper = depot.shopper_or_401()?;

    let (Some(user), Some(session)) = (shopper.user, shopper.session) else {
        return Err(StatusError::unauthorized()
            .brief("Merging requires both a user and a session identity"));
    };

    let cart = state
        .app
        .carts
        .merge_guest_cart_into_user(session, user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(CartContentsResponse::from_cart(cart)))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use trolley_app::{
        domain::carts::MockCartsService,
        identity::{SessionUuid, Shopper, UserUuid},
    };

    use crate::test_helpers::{carts_service, make_cart, state_with_carts};

    use super::*;

    #[tokio::test]
    async fn merges_when_both_identities_present() -> TestResult {
        let user = UserUuid::new();
        let session = SessionUuid::new();
        let cart = make_cart(session, Vec::new(), 0);

        let mut carts = MockCartsService::new();

        carts
            .expect_merge_guest_cart_into_user()
            .once()
            .withf(move |s, u| *s == session && *u == user)
            .return_once(move |_, _| Ok(cart));

        #[salvo::handler]
        async fn inject_logged_in_shopper(
            req: &mut Request,
            depot: &mut Depot,
            res: &mut Response,
            ctrl: &mut FlowCtrl,
        ) {
            let (user, session) = depot
                .obtain::<(UserUuid, SessionUuid)>()
                .copied()
                .unwrap_or((UserUuid::new(), SessionUuid::new()));

            depot.insert_shopper(Shopper {
                user: Some(user),
                session: Some(session),
            });

            ctrl.call_next(req, depot, res).await;
        }

        let service = Service::new(
            Router::new()
                .hoop(inject(state_with_carts(carts)))
                .hoop(inject((user, session)))
                .hoop(inject_logged_in_shopper)
                .push(Router::with_path("cart/merge").post(handler)),
        );

        let mut res = TestClient::post("http://example.com/cart/merge")
            .send(&service)
            .await;

        let body: CartContentsResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn session_only_shopper_gets_401() -> TestResult {
        let carts = MockCartsService::new();

        // The default test shopper is session-only.
        let res = TestClient::post("http://example.com/cart/merge")
            .send(&carts_service(
                carts,
                Router::with_path("cart/merge").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
