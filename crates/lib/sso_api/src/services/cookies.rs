//! Cookie service: build and clear the session and OAuth state cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";
/// Cookie carrying the OAuth `state` between initiation and callback.
pub const STATE_COOKIE: &str = "oauth_state";
/// Lifetime of the OAuth state cookie (10 minutes).
pub const STATE_COOKIE_MAX_AGE_SECS: i64 = 600;

fn base(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// httpOnly cookie for the session token, living as long as the token.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = base(SESSION_COOKIE, token.to_string(), secure);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie
}

pub fn state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = base(STATE_COOKIE, state.to_string(), secure);
    cookie.set_max_age(Duration::seconds(STATE_COOKIE_MAX_AGE_SECS));
    cookie
}

/// Expired session cookie.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = base(SESSION_COOKIE, String::new(), secure);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

/// Expired state cookie.
pub fn clear_state_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = base(STATE_COOKIE, String::new(), secure);
    cookie.set_max_age(Duration::ZERO);
    cookie
}
