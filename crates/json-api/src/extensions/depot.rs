//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use trolley_app::identity::{OwnerKey, Shopper};

const SHOPPER_KEY: &str = "trolley.shopper";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_shopper(&mut self, shopper: Shopper);

    /// The request's shopper identity; 401 when the session middleware did
    /// not run.
    fn shopper_or_401(&self) -> Result<Shopper, StatusError>;

    /// The cart owner key; 401 when the request carries no identity at all.
    fn owner_key_or_401(&self) -> Result<OwnerKey, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_shopper(&mut self, shopper: Shopper) {
        self.insert(SHOPPER_KEY, shopper);
    }

    fn shopper_or_401(&self) -> Result<Shopper, StatusError> {
        self.get::<Shopper>(SHOPPER_KEY)
            .copied()
            .map_err(|_ignored| {
                StatusError::unauthorized().brief("Request carries no shopper identity")
            })
    }

    fn owner_key_or_401(&self) -> Result<OwnerKey, StatusError> {
        self.shopper_or_401()?.owner_key().map_err(|_ignored| {
            StatusError::unauthorized().brief("Request carries no shopper identity")
        })
    }
}
