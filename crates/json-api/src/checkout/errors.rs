//! Errors

use salvo::http::StatusError;
use tracing::error;

use trolley_app::domain::checkout::CheckoutServiceError;

pub(crate) fn into_status_error(error: CheckoutServiceError) -> StatusError {
    match error {
        CheckoutServiceError::NotFound => StatusError::not_found().brief("Cart not found"),
        CheckoutServiceError::OrderNotFound => StatusError::not_found().brief("Order not found"),
        CheckoutServiceError::CartNotOwned => StatusError::forbidden().brief(error.to_string()),
        CheckoutServiceError::CartNotActive
        | CheckoutServiceError::EmptyCart
        | CheckoutServiceError::StockChanged { .. } => {
            StatusError::unprocessable_entity().brief(error.to_string())
        }
        CheckoutServiceError::Conflict => StatusError::conflict().brief(error.to_string()),
        CheckoutServiceError::Evaluation(source) => {
            error!("deal evaluation failed during checkout: {source}");

            StatusError::internal_server_error()
        }
        CheckoutServiceError::Deals(source) => {
            error!("failed to load deals during checkout: {source}");

            StatusError::internal_server_error()
        }
        CheckoutServiceError::Sql(source) => {
            error!("checkout storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
