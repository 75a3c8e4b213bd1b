//! Verification of admin tokens issued by the external admin service.

use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::debug;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

/// The authentication scheme expected in the `Authorization` header.
const BEARER: &str = "Bearer ";

/// A verified admin identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// Who the token was issued to.
    pub subject: String,
}

/// Token claims: the subject plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// Sign this token, valid for `ttl` from now.
    pub fn encode(&self, config: &Config, ttl: Duration) -> String {
        let claims = Claims {
            sub: self.subject.clone(),
            expire_at: Utc::now() + ttl,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings")
    }

    /// Verify and decode a signed token.
    pub fn decode(token: &str, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| Self::new(claims.claims.sub))?;
        Ok(token)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the `Authorization: Bearer` header.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.guard::<&State<Config>>().await {
            Outcome::Success(config) => config,
            _ => {
                return Outcome::Failure((
                    Status::InternalServerError,
                    Error::Internal("Config is not managed".to_string()),
                ))
            }
        };

        let token = match req
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix(BEARER))
        {
            Some(token) => token,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::Unauthorized("Missing bearer token".to_string()),
                ))
            }
        };

        match Self::decode(token, config) {
            Ok(token) => {
                debug!("Authenticated admin {}", token.subject);
                Outcome::Success(token)
            }
            Err(e) => Outcome::Failure((Status::Unauthorized, e)),
        }
    }
}
