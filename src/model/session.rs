use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, Utc};
use data_encoding::HEXLOWER;
use log::{debug, info};
use rand::RngCore;
use rocket::{
    http::{Cookie, SameSite},
    tokio::sync::Mutex,
};
use serde::Serialize;

use crate::error::{Error, Result};

use super::{
    auth::AuthToken,
    dialogs::DialogStates,
    flow::{AwardsFlow, AwardsPage},
};

pub const SESSION_COOKIE: &str = "awards_session";

/// Identifies one browser's voting flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh random 128-bit identifier.
    pub fn random() -> Self {
        let mut bytes = [0_u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(HEXLOWER.encode(&bytes))
    }

    /// Accept only identifiers of the shape we hand out.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == 32 && raw.bytes().all(|b| b.is_ascii_hexdigit());
        valid.then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn into_cookie(self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, self.0)
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Enough to correlate log lines without exposing the whole id.
        write!(f, "{}", &self.0[..8])
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A one-shot, non-blocking notification shown with the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// What every flow route answers with.
#[derive(Debug, Serialize)]
pub struct RenderedPage {
    pub page: AwardsPage,
    pub notice: Option<Notice>,
    pub dialogs: Vec<String>,
}

/// Per-browser UI state around a flow, mounted for one viewer.
#[derive(Debug)]
pub struct FlowSession {
    pub flow: AwardsFlow,
    pub dialogs: DialogStates,
    pub notice: Option<Notice>,
    /// Fingerprint of the credential the flow was mounted with, `None` when anonymous.
    viewer: Option<String>,
    last_seen: DateTime<Utc>,
}

impl FlowSession {
    pub fn new(flow: AwardsFlow, token: Option<&AuthToken>) -> Self {
        Self {
            flow,
            dialogs: DialogStates::default(),
            notice: None,
            viewer: token.map(AuthToken::fingerprint),
            last_seen: Utc::now(),
        }
    }

    /// Whether the flow was mounted for this caller.
    pub fn belongs_to(&self, token: Option<&AuthToken>) -> bool {
        self.viewer == token.map(AuthToken::fingerprint)
    }

    /// Refuse while a submission is in flight.
    pub fn ensure_idle(&self) -> Result<()> {
        match self.flow.session() {
            Ok(voting) if voting.is_submitting() => Err(Error::conflict(
                "Your votes are already being submitted.",
            )),
            _ => Ok(()),
        }
    }

    /// Swap in a flow freshly mounted for `token`. Dialogs are closed; a
    /// pending notice survives. Refused while a submission is in flight.
    pub fn remount(&mut self, flow: AwardsFlow, token: Option<&AuthToken>) -> Result<()> {
        self.ensure_idle()?;
        self.flow = flow;
        self.viewer = token.map(AuthToken::fingerprint);
        self.dialogs.clear();
        Ok(())
    }

    /// Render the flow. The pending notice is shown once and then dropped.
    pub fn render(&mut self) -> RenderedPage {
        RenderedPage {
            page: self.flow.render(),
            notice: self.notice.take(),
            dialogs: self.dialogs.open_ids(),
        }
    }

    fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

/// All live flows. The lock is only held for in-memory work, never across
/// a call to the awards API.
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, FlowSession>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Store a session, dropping any that have been idle for longer than the TTL.
    pub async fn insert(&self, id: SessionId, session: FlowSession) {
        let mut sessions = self.sessions.lock().await;
        let cutoff = Utc::now() - self.ttl;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_seen >= cutoff);
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!("Pruned {pruned} idle awards sessions");
        }
        debug!("Storing awards session {id}");
        sessions.insert(id, session);
    }

    /// Run `f` against a session, if it exists.
    pub async fn with<R>(&self, id: &SessionId, f: impl FnOnce(&mut FlowSession) -> R) -> Option<R> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(id).map(|session| {
            session.touch();
            f(session)
        })
    }

    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.lock().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
