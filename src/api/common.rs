use log::{debug, info};
use rocket::http::CookieJar;

use crate::client::AwardsService;
use crate::error::{Error, Result};
use crate::model::{
    auth::AuthToken,
    session::{FlowSession, SessionId, SessionStore, SESSION_COOKIE},
};

/// The session id carried by the request, if it is well formed.
pub fn session_cookie(cookies: &CookieJar<'_>) -> Option<SessionId> {
    cookies
        .get_private(SESSION_COOKIE)
        .and_then(|cookie| SessionId::parse(cookie.value()))
}

/// Return the caller's flow session. A fresh flow is mounted when the browser
/// has none, when its session has been pruned, or when it was mounted for
/// someone else.
pub async fn current_session(
    cookies: &CookieJar<'_>,
    token: Option<&AuthToken>,
    service: &AwardsService,
    sessions: &SessionStore,
) -> Result<SessionId> {
    if let Some(id) = session_cookie(cookies) {
        match sessions.with(&id, |session| session.belongs_to(token)).await {
            Some(true) => return Ok(id),
            Some(false) => {
                info!("Awards session {id} changed viewer, remounting");
                remount(service, sessions, &id, token).await?;
                return Ok(id);
            }
            None => debug!("Awards session {id} expired, mounting a new one"),
        }
    }

    let flow = service.mount(token).await?;
    let id = SessionId::random();
    sessions
        .insert(id.clone(), FlowSession::new(flow, token))
        .await;
    cookies.add_private(id.clone().into_cookie());
    Ok(id)
}

/// Mount a fresh flow for `token` into an existing session. Refused while a
/// submission is in flight, checked before fetching and again before swapping.
pub async fn remount(
    service: &AwardsService,
    sessions: &SessionStore,
    id: &SessionId,
    token: Option<&AuthToken>,
) -> Result<()> {
    with_session(sessions, id, |session| session.ensure_idle()).await??;
    let flow = service.mount(token).await?;
    with_session(sessions, id, |session| session.remount(flow, token)).await?
}

/// Run `f` against a session that was looked up earlier in the request.
pub async fn with_session<R>(
    sessions: &SessionStore,
    id: &SessionId,
    f: impl FnOnce(&mut FlowSession) -> R,
) -> Result<R> {
    sessions
        .with(id, f)
        .await
        .ok_or_else(|| Error::not_found("Awards session expired"))
}
