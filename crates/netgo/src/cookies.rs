//! Credential cookies.
//!
//! Two cookies travel together:
//!
//! - `ngo_auth` holds the credential (`"<id>::<token>"`). `HttpOnly`.
//! - `ngo_viewer_data` holds `{"id":..,"username":".."}` so client script
//!   can tell whether it is signed in without a round trip.
//!
//! Both are set on sign-up and sign-in and expired together on sign-out
//! and whenever a presented credential is rejected.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use netgo_protocol::UserId;
use netgo_session::{Credential, Session, SessionConfig};
use serde::{Deserialize, Serialize};

pub const AUTH_COOKIE: &str = "ngo_auth";
pub const VIEWER_COOKIE: &str = "ngo_viewer_data";

/// Contents of the viewer cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerData {
    pub id: UserId,
    pub username: String,
}

/// Adds both cookies for a freshly rotated session.
pub fn issue(jar: CookieJar, config: &SessionConfig, session: &Session) -> CookieJar {
    let max_age = time::Duration::seconds(
        i64::try_from(config.credential_max_age_secs).unwrap_or(i64::MAX),
    );
    let viewer = ViewerData {
        id: session.user_id,
        username: session.username.clone(),
    };
    // Serializing two plain fields cannot fail.
    let viewer = serde_json::to_string(&viewer).unwrap_or_default();

    let mut auth = base(AUTH_COOKIE, Credential::for_session(session).to_string(), config);
    auth.set_http_only(true);
    auth.set_max_age(max_age);

    let mut viewer = base(VIEWER_COOKIE, viewer, config);
    viewer.set_http_only(false);
    viewer.set_max_age(max_age);

    jar.add(auth).add(viewer)
}

/// Expires both cookies immediately.
pub fn clear(jar: CookieJar, config: &SessionConfig) -> CookieJar {
    let mut auth = base(AUTH_COOKIE, String::new(), config);
    auth.set_http_only(true);
    auth.make_removal();

    let mut viewer = base(VIEWER_COOKIE, String::new(), config);
    viewer.set_http_only(false);
    viewer.make_removal();

    jar.add(auth).add(viewer)
}

/// The raw credential the client presented, if any.
pub fn credential(jar: &CookieJar) -> Option<&str> {
    jar.get(AUTH_COOKIE).map(Cookie::value)
}

fn base(name: &'static str, value: String, config: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .path("/")
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax);
    if let Some(domain) = &config.cookie_domain {
        cookie = cookie.domain(domain.clone());
    }
    cookie.build()
}
