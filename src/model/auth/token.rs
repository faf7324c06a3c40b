use std::fmt::{Debug, Formatter};

use chrono::{serde::ts_seconds, DateTime, Utc};
use data_encoding::HEXLOWER;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::debug;
use rocket::{
    http::{Cookie, SameSite},
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// The bearer credential issued by the sign-in provider, carried between
/// requests in a signed cookie and attached to every authenticated API call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "crd")]
    credential: String,
}

impl AuthToken {
    /// Wrap a credential. Blank credentials are rejected.
    pub fn new(credential: impl Into<String>) -> Result<Self> {
        let credential = credential.into().trim().to_string();
        if credential.is_empty() {
            return Err(Error::validation("Missing sign-in token."));
        }
        Ok(Self { credential })
    }

    /// The raw bearer credential.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// A stable, non-reversible identifier for this credential, safe to use
    /// in cache keys and logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.credential.as_bytes());
        HEXLOWER.encode(digest.as_slice())
    }

    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        Ok(Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish())
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

impl Debug for AuthToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let fingerprint = self.fingerprint();
        f.debug_struct("AuthToken")
            .field("fingerprint", &&fingerprint[..8])
            .finish()
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Read the token from its cookie. Anonymous visitors and stale cookies
    /// forward, so routes take `Option<AuthToken>` and decide for themselves.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => return Outcome::Forward(()),
        };

        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => return Outcome::Forward(()),
        };

        match Self::from_cookie(cookie, config) {
            Ok(token) => Outcome::Success(token),
            Err(e) => {
                debug!("Ignoring auth cookie: {e}");
                Outcome::Forward(())
            }
        }
    }
}
