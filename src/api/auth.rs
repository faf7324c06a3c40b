use log::info;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};
use serde::Deserialize;

use crate::{
    client::AwardsService,
    config::Config,
    error::Result,
    model::{
        auth::{AuthToken, AUTH_TOKEN_COOKIE},
        session::{SessionStore, SESSION_COOKIE},
    },
};

use super::common::{remount, session_cookie};

pub fn routes() -> Vec<Route> {
    routes![sign_in, sign_out]
}

/// The bearer credential handed over by the sign-in provider.
#[derive(Debug, Deserialize)]
pub struct SignIn {
    pub token: String,
}

/// Store the credential in the auth cookie. A flow already mounted in this
/// browser is remounted for the new viewer, which also closes the sign-in prompt.
#[post("/auth/session", data = "<credentials>", format = "json")]
pub async fn sign_in(
    credentials: Json<SignIn>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Result<Status> {
    let token = AuthToken::new(credentials.into_inner().token)?;

    if let Some(id) = session_cookie(cookies) {
        if sessions.with(&id, |_| ()).await.is_some() {
            remount(service, sessions, &id, Some(&token)).await?;
        }
    }

    info!("Signed in as {token:?}");
    cookies.add(token.into_cookie(config)?);
    Ok(Status::Ok)
}

/// Forget the credential and the flow mounted for it.
#[delete("/auth")]
pub async fn sign_out(cookies: &CookieJar<'_>, sessions: &State<SessionStore>) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    if let Some(id) = session_cookie(cookies) {
        sessions.remove(&id).await;
        cookies.remove_private(Cookie::named(SESSION_COOKIE));
    }
    Status::Ok
}
