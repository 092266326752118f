//! Login, token verification and session reuse.

use crate::config::Credentials;
use crate::error::{AuthError, Error, Result};
use crate::provider::endpoint;
use crate::provider::models::{LOGIN_OK, SignInData, SignInRequest};
use crate::types::Session;
use chrono::Utc;

use super::Pan123Driver;

/// Account type sent with email logins
const EMAIL_LOGIN_TYPE: u8 = 2;

impl Pan123Driver {
    /// Make sure a usable session is cached
    ///
    /// Unless `force_refresh` is set, a cached token for the configured account
    /// that is not yet within the refresh lead is verified and reused.
    /// Otherwise (or when verification fails) a full login replaces the cached
    /// session. Returns false on any failure; the cause is logged.
    pub async fn authenticate(&self, force_refresh: bool) -> bool {
        let credentials = &self.config.credentials;
        if credentials.is_blank() {
            tracing::warn!(error = %AuthError::MissingCredentials, "cannot log in");
            return false;
        }

        if !force_refresh {
            if let Some(session) = self.reusable_session().await {
                if self
                    .api
                    .verify_token(endpoint::USER_INFO, &session.access_token)
                    .await
                {
                    tracing::debug!(username = %session.username, "reusing cached session");
                    return true;
                }
                tracing::info!(username = %session.username, "cached token rejected, logging in again");
                self.state.sessions.invalidate().await;
            }
        }

        match self.sign_in(credentials).await {
            Ok(session) => {
                tracing::info!(
                    username = %session.username,
                    expires_at = %session.expires_at,
                    "logged in"
                );
                self.state.sessions.replace(session).await;
                true
            }
            Err(e) => {
                tracing::error!(username = %credentials.username, error = %e, "login failed");
                false
            }
        }
    }

    /// True when the cached token is still accepted by the provider
    ///
    /// Makes no login attempt; an empty cache reports false.
    pub async fn verify_session(&self) -> bool {
        match self.state.sessions.token().await {
            Some(token) => self.api.verify_token(endpoint::USER_INFO, &token).await,
            None => false,
        }
    }

    /// Fail with [`AuthError::NoSession`] unless a usable session is cached or
    /// can be established
    ///
    /// A cached session within its validity window is trusted without a
    /// verification round trip; a rejected token surfaces as a failed call.
    pub(crate) async fn ensure_session(&self) -> Result<()> {
        if self.reusable_session().await.is_some() {
            return Ok(());
        }
        if self.authenticate(false).await {
            Ok(())
        } else {
            Err(AuthError::NoSession.into())
        }
    }

    /// Cached session for the configured account, if it is not near expiry
    async fn reusable_session(&self) -> Option<Session> {
        self.state.sessions.get().await.filter(|session| {
            session.username == self.config.credentials.username
                && session.is_usable_at(Utc::now(), self.config.session.refresh_lead)
        })
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let body = if credentials.is_email() {
            SignInRequest::Email {
                mail: &credentials.username,
                password: &credentials.password,
                kind: EMAIL_LOGIN_TYPE,
            }
        } else {
            SignInRequest::Phone {
                passport: &credentials.username,
                password: &credentials.password,
                remember: true,
            }
        };

        let envelope = self.api.post_login(endpoint::SIGN_IN, &body).await?;
        if envelope.code != LOGIN_OK {
            return Err(AuthError::Rejected {
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("code {}", envelope.code)),
            }
            .into());
        }

        let token = envelope
            .into_data::<SignInData>(endpoint::SIGN_IN, LOGIN_OK)?
            .and_then(|data| data.token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::missing(endpoint::SIGN_IN, "token"))?;

        let validity =
            chrono::Duration::from_std(self.config.session.validity).map_err(|e| {
                Error::Config {
                    message: format!("session validity out of range: {e}"),
                    key: Some("session.validity".into()),
                }
            })?;

        Ok(Session {
            username: credentials.username.clone(),
            access_token: token,
            expires_at: Utc::now() + validity,
        })
    }
}
