//! Glucose sources.
//!
//! A [`GlucoseSource`] yields one time-ordered batch of readings per call.
//! The scheduler treats it as opaque and every failure as transient.
//!
//! [`ProviderSource`] is the usual shape of a cloud CGM provider: log in,
//! work out whose data to read, fetch raw values, convert them to mg/dL.
//! The provider-specific HTTP calls sit behind [`Authenticator`] and
//! [`ReadingFeed`].

use async_trait::async_trait;
use sgv_core::{mmol_to_mgdl, user_id_from_token, ClaimError};
use sgv_types::Reading;
use std::path::PathBuf;
use thiserror::Error;

/// Error type returned by provider collaborators.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Login was refused or failed.
    #[error("failed to login: {0}")]
    Login(#[source] ProviderError),

    /// No user id configured and none found in the session token.
    #[error("failed to resolve user ID from token: {0}")]
    UserId(#[from] ClaimError),

    /// Fetching the readings failed.
    #[error("failed to get glucose data: {0}")]
    Fetch(#[source] ProviderError),

    /// A local readings file could not be read.
    #[error("failed to read readings file {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Readings were not in the expected format.
    #[error("invalid readings data: {0}")]
    Decode(String),
}

/// Anything that can produce a batch of readings.
#[async_trait]
pub trait GlucoseSource: Send + Sync {
    /// Fetch the current batch, oldest first.
    async fn fetch(&self) -> Result<Vec<Reading>, SourceError>;
}

/// Logs in to a provider and returns a session token (a JWT).
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Perform the login.
    async fn login(&self) -> Result<String, ProviderError>;
}

/// A raw provider value before unit conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// Provider timestamp, passed through untouched.
    pub timestamp: String,
    /// Glucose in mmol/L.
    pub mmol: f64,
}

/// Fetches raw readings for a logged-in user.
#[async_trait]
pub trait ReadingFeed: Send + Sync {
    /// Fetch readings using the session token for the given user.
    async fn readings(&self, token: &str, user_id: &str) -> Result<Vec<RawReading>, ProviderError>;
}

/// Login → resolve user → fetch → convert.
pub struct ProviderSource<A, F> {
    auth: A,
    feed: F,
    user_id: Option<String>,
}

impl<A: Authenticator, F: ReadingFeed> ProviderSource<A, F> {
    /// Create a source that reads the user id from the session token.
    pub fn new(auth: A, feed: F) -> Self {
        Self {
            auth,
            feed,
            user_id: None,
        }
    }

    /// Use a fixed user id instead of the token's claims.
    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string()).filter(|id| !id.is_empty());
        self
    }
}

#[async_trait]
impl<A: Authenticator, F: ReadingFeed> GlucoseSource for ProviderSource<A, F> {
    async fn fetch(&self) -> Result<Vec<Reading>, SourceError> {
        let token = self.auth.login().await.map_err(SourceError::Login)?;

        let user_id = match &self.user_id {
            Some(id) => id.clone(),
            None => user_id_from_token(&token)?,
        };

        let raw = self
            .feed
            .readings(&token, &user_id)
            .await
            .map_err(SourceError::Fetch)?;

        Ok(raw
            .into_iter()
            .map(|r| Reading::new(r.timestamp, mmol_to_mgdl(r.mmol)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use std::sync::Mutex;

    struct FixedLogin(Result<String, String>);

    #[async_trait]
    impl Authenticator for FixedLogin {
        async fn login(&self) -> Result<String, ProviderError> {
            self.0.clone().map_err(Into::into)
        }
    }

    #[derive(Default)]
    struct RecordingFeed {
        user_ids: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ReadingFeed for RecordingFeed {
        async fn readings(
            &self,
            _token: &str,
            user_id: &str,
        ) -> Result<Vec<RawReading>, ProviderError> {
            self.user_ids.lock().unwrap().push(user_id.to_string());
            if self.fail {
                return Err("provider returned 503".into());
            }
            Ok(vec![
                RawReading {
                    timestamp: "1704067200000".into(),
                    mmol: 5.5,
                },
                RawReading {
                    timestamp: "1704067500000".into(),
                    mmol: 6.1,
                },
            ])
        }
    }

    fn token(claims: &str) -> String {
        format!("h.{}.s", URL_SAFE_NO_PAD.encode(claims))
    }

    #[tokio::test]
    async fn resolves_user_from_token_and_converts() {
        let source = ProviderSource::new(
            FixedLogin(Ok(token(r#"{"userId":"abc-123"}"#))),
            RecordingFeed::default(),
        );

        let readings = source.fetch().await.unwrap();

        assert_eq!(*source.feed.user_ids.lock().unwrap(), vec!["abc-123"]);
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0], Reading::new("1704067200000", 99.0));
        assert_eq!(readings[1].value, 110.0);
    }

    #[tokio::test]
    async fn configured_user_id_wins() {
        let source = ProviderSource::new(FixedLogin(Ok("opaque".into())), RecordingFeed::default())
            .with_user_id("configured");

        source.fetch().await.unwrap();

        assert_eq!(*source.feed.user_ids.lock().unwrap(), vec!["configured"]);
    }

    #[tokio::test]
    async fn empty_configured_user_id_falls_back_to_token() {
        let source = ProviderSource::new(
            FixedLogin(Ok(token(r#"{"sub":"from-token"}"#))),
            RecordingFeed::default(),
        )
        .with_user_id("");

        source.fetch().await.unwrap();

        assert_eq!(*source.feed.user_ids.lock().unwrap(), vec!["from-token"]);
    }

    #[tokio::test]
    async fn login_failure_is_wrapped() {
        let source =
            ProviderSource::new(FixedLogin(Err("bad password".into())), RecordingFeed::default());

        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, SourceError::Login(_)));
        assert_eq!(err.to_string(), "failed to login: bad password");
    }

    #[tokio::test]
    async fn missing_user_claim_is_an_error() {
        let source = ProviderSource::new(
            FixedLogin(Ok(token(r#"{"role":"user"}"#))),
            RecordingFeed::default(),
        );

        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, SourceError::UserId(ClaimError::MissingUserId)));
        assert!(source.feed.user_ids.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn feed_failure_is_wrapped() {
        let feed = RecordingFeed {
            fail: true,
            ..Default::default()
        };
        let source = ProviderSource::new(FixedLogin(Ok("t".into())), feed).with_user_id("u");

        let err = source.fetch().await.unwrap_err();

        assert_eq!(err.to_string(), "failed to get glucose data: provider returned 503");
    }
}
