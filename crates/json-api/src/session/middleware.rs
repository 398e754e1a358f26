//! Shopper middleware.
//!
//! Every request resolves to a [`Shopper`]. An authenticating gateway in
//! front of this service asserts the user via `X-User-Id`; anonymous
//! browsers are tracked by `X-Session-Id`, generated here when absent and
//! always echoed back so the same browser session keeps the same cart.

use salvo::prelude::*;
use uuid::Uuid;

use trolley_app::identity::{SessionUuid, Shopper, UserUuid};

use crate::extensions::*;

pub(crate) const USER_HEADER: &str = "x-user-id";
pub(crate) const SESSION_HEADER: &str = "x-session-id";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let user = match header_uuid(req, USER_HEADER) {
        Ok(user) => user,
        Err(()) => {
            res.render(StatusError::unauthorized().brief("Invalid X-User-Id header"));

            return;
        }
    };

    let session = match header_uuid(req, SESSION_HEADER) {
        Ok(session) => session,
        Err(()) => {
            res.render(StatusError::bad_request().brief("Invalid X-Session-Id header"));

            return;
        }
    };

    // Anonymous shoppers always get a stable session identifier.
    let session = match (user, session) {
        (None, None) => Some(Uuid::now_v7()),
        (_, session) => session,
    };

    if let Some(session) = session
        && res
            .add_header(SESSION_HEADER, session.to_string(), true)
            .is_err()
    {
        res.render(StatusError::internal_server_error());

        return;
    }

    depot.insert_shopper(Shopper {
        user: user.map(UserUuid::from_uuid),
        session: session.map(SessionUuid::from_uuid),
    });

    ctrl.call_next(req, depot, res).await;
}

fn header_uuid(req: &Request, name: &str) -> Result<Option<Uuid>, ()> {
    let Some(value) = req.headers().get(name) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|value| value.parse::<Uuid>().ok())
        .map(Some)
        .ok_or(())
}
