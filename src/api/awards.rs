use log::{debug, info, warn};
use rocket::{http::CookieJar, serde::json::Json, Route, State};
use serde::Deserialize;

use crate::{
    client::AwardsService,
    error::{Error, Result},
    model::{
        auth::AuthToken,
        awards::{CategoryId, OptionId},
        dialogs::SIGN_IN_DIALOG,
        flow::VotingSession,
        session::{Notice, RenderedPage, SessionStore},
    },
};

use super::common::{current_session, remount, with_session};

/// Notice shown once the API has accepted a batch.
pub const SUBMITTED_MESSAGE: &str = "Your votes have been submitted.";

type Page = Result<Json<RenderedPage>>;

pub fn routes() -> Vec<Route> {
    routes![
        show,
        mount,
        vote,
        next,
        back,
        submit,
        restart,
        dismiss_dialog
    ]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub category_id: CategoryId,
    pub option_id: OptionId,
}

#[get("/awards")]
pub async fn show(
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Page {
    let id = current_session(cookies, token.as_ref(), service, sessions).await?;
    with_session(sessions, &id, |session| Json(session.render())).await
}

/// Refetch the edition and replace the flow, picking up changed flags.
#[post("/awards/mount")]
pub async fn mount(
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Page {
    let id = current_session(cookies, token.as_ref(), service, sessions).await?;
    service.refresh_awards();
    remount(service, sessions, &id, token.as_ref()).await?;
    with_session(sessions, &id, |session| Json(session.render())).await
}

#[post("/awards/votes", data = "<request>", format = "json")]
pub async fn vote(
    request: Json<VoteRequest>,
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Page {
    let id = current_session(cookies, token.as_ref(), service, sessions).await?;
    with_session(sessions, &id, |session| -> Page {
        let result = session
            .flow
            .session_mut()
            .and_then(|voting| voting.vote(token.as_ref(), &request.category_id, &request.option_id));
        match result {
            Ok(()) => Ok(Json(session.render())),
            Err(Error::AuthRequired) => {
                session.dialogs.open(SIGN_IN_DIALOG);
                Err(Error::AuthRequired)
            }
            Err(e) => Err(e),
        }
    })
    .await?
}

#[post("/awards/next")]
pub async fn next(
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Page {
    navigate(cookies, token, service, sessions, VotingSession::next).await
}

#[post("/awards/back")]
pub async fn back(
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Page {
    navigate(cookies, token, service, sessions, VotingSession::back).await
}

/// Move the step and close any open dialogs.
async fn navigate(
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &AwardsService,
    sessions: &SessionStore,
    step: fn(&mut VotingSession) -> usize,
) -> Page {
    let id = current_session(cookies, token.as_ref(), service, sessions).await?;
    with_session(sessions, &id, |session| -> Page {
        let now = step(session.flow.session_mut()?);
        debug!("Awards session {id} at step {now}");
        session.dialogs.clear();
        Ok(Json(session.render()))
    })
    .await?
}

/// Submit every vote in one mutation. The session is marked in flight while
/// the request is out, so a second submit is refused rather than queued.
#[post("/awards/submit")]
pub async fn submit(
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Page {
    let id = current_session(cookies, token.as_ref(), service, sessions).await?;

    let (awards_id, batch) = with_session(sessions, &id, |session| -> Result<_> {
        let voting = session.flow.session_mut()?;
        match voting.begin_submit(token.as_ref()) {
            Ok(batch) => Ok((voting.awards().id.clone(), batch)),
            Err(Error::AuthRequired) => {
                session.dialogs.open(SIGN_IN_DIALOG);
                Err(Error::AuthRequired)
            }
            Err(e) => Err(e),
        }
    })
    .await??;

    let outcome = match token.as_ref() {
        Some(token) => service.cast_votes(token, &awards_id, &batch).await,
        None => Err(Error::AuthRequired),
    };

    with_session(sessions, &id, |session| -> Page {
        // The flow may have been replaced while the request was out.
        let voting = session
            .flow
            .session_mut()
            .ok()
            .filter(|voting| voting.is_submitting());

        match outcome {
            Ok(stored) => {
                info!("Awards session {id} submitted {} votes", stored.len());
                match voting {
                    Some(voting) => voting.complete_submit(),
                    None => warn!("Awards session {id} changed during submission"),
                }
                session.notice = Some(Notice::success(SUBMITTED_MESSAGE));
                Ok(Json(session.render()))
            }
            Err(e) => {
                if let Some(voting) = voting {
                    voting.abort_submit();
                }
                session.notice = Some(Notice::error(e.to_string()));
                Err(e)
            }
        }
    })
    .await?
}

#[post("/awards/restart")]
pub async fn restart(
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Page {
    let id = current_session(cookies, token.as_ref(), service, sessions).await?;
    with_session(sessions, &id, |session| -> Page {
        session.flow.session_mut()?.restart()?;
        session.dialogs.clear();
        Ok(Json(session.render()))
    })
    .await?
}

#[delete("/awards/dialogs/<dialog>")]
pub async fn dismiss_dialog(
    dialog: &str,
    cookies: &CookieJar<'_>,
    token: Option<AuthToken>,
    service: &State<AwardsService>,
    sessions: &State<SessionStore>,
) -> Page {
    let id = current_session(cookies, token.as_ref(), service, sessions).await?;
    with_session(sessions, &id, |session| {
        session.dialogs.close(dialog);
        Json(session.render())
    })
    .await
}
