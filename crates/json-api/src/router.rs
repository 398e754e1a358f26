//! App Router

use salvo::Router;

use crate::{carts, checkout, session};

pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(session::middleware::handler)
        .push(
            Router::with_path("cart")
                .push(Router::with_path("items").get(carts::items::handler))
                .push(Router::with_path("add").post(carts::add::handler))
                .push(Router::with_path("remove").post(carts::remove::handler))
                .push(Router::with_path("decrement").post(carts::decrement::handler))
                .push(Router::with_path("clear").post(carts::clear::handler))
                .push(Router::with_path("merge").post(carts::merge::handler))
                .push(Router::with_path("withdeals").get(carts::with_deals::handler)),
        )
        .push(Router::with_path("checkout/{cart}").post(checkout::create::handler))
        .push(Router::with_path("orders/{order}").get(checkout::get_order::handler))
}
