//! `AuthUser` extractor: reads the credential cookie, authenticates it,
//! and hands the handler the caller's identity.
//!
//! Every game route takes an `AuthUser`, so no game data (long polls
//! included) is reachable without a current credential. A rejected
//! credential gets a 401 *and* both credential cookies expired, so the
//! client stops presenting it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use netgo_game::Seat;
use netgo_protocol::UserId;
use netgo_session::{Authenticator, Identity, SessionConfig};

use crate::cookies;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }

    /// The caller as a game seat.
    pub fn seat(&self) -> Seat {
        Seat {
            user_id: self.0.user_id,
            username: self.0.display_name.clone(),
        }
    }
}

impl std::ops::Deref for AuthUser {
    type Target = Identity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// 401 that also expires the credential cookies.
#[derive(Debug)]
pub struct AuthRejection {
    config: SessionConfig,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let jar = cookies::clear(CookieJar::new(), &self.config);
        (jar, ApiError::unauthenticated()).into_response()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let reject = || AuthRejection {
            config: state.config.session.clone(),
        };

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(credential) = cookies::credential(&jar).map(str::to_owned) else {
            tracing::debug!(path = %parts.uri.path(), "request without credential cookie");
            return Err(reject());
        };

        match state.authenticator.authenticate(&credential).await {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(e) => {
                tracing::debug!(path = %parts.uri.path(), error = %e, "credential rejected");
                Err(reject())
            }
        }
    }
}
