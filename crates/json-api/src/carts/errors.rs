//! Errors

use salvo::http::StatusError;
use tracing::error;

use trolley_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::NotFound => StatusError::not_found().brief("No active cart"),
        CartsServiceError::UnknownSubproduct => {
            StatusError::not_found().brief("Subproduct not found")
        }
        CartsServiceError::LineNotFound
        | CartsServiceError::InvalidQuantity
        | CartsServiceError::Unavailable { .. }
        | CartsServiceError::OutOfStock { .. } => {
            StatusError::unprocessable_entity().brief(error.to_string())
        }
        CartsServiceError::Conflict => StatusError::conflict().brief(error.to_string()),
        CartsServiceError::InvalidReference
        | CartsServiceError::MissingRequiredData
        | CartsServiceError::InvalidData => StatusError::bad_request().brief("Invalid cart payload"),
        CartsServiceError::Sql(source) => {
            error!("cart storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
