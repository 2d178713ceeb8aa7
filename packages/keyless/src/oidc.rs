//! Provider registry, token acquisition, and the token manager (C2 + C10).
//!
//! Provider *detection* lives in `keyless-ci`; this module is what turns
//! a detected provider into a validated [`crate::jwt::Token`] and keeps
//! one alive across a publish.

use std::time::{SystemTime, UNIX_EPOCH};

use keyless_ci::{Provider, TokenSource};

use crate::error::{Error, Result};
use crate::jwt::{self, Jwks, Token};

/// Acquire a raw (unvalidated) JWT from a provider for the given
/// audience. Direct providers hand back whatever is in their env var
/// verbatim; exchange providers mint a fresh token scoped to `audience`.
pub async fn acquire_token(client: &reqwest::Client, provider: &Provider, audience: &str) -> Result<String> {
    match &provider.token_source {
        TokenSource::Direct { env } => {
            std::env::var(env).map_err(|_| Error::InvalidToken(format!("{env} is not set")))
        }
        TokenSource::Exchange { request_url_env, request_token_env } => {
            let base_url = std::env::var(request_url_env)
                .map_err(|_| Error::InvalidToken(format!("{request_url_env} is not set")))?;
            let request_token = std::env::var(request_token_env)
                .map_err(|_| Error::InvalidToken(format!("{request_token_env} is not set")))?;

            let separator = if base_url.contains('?') { "&" } else { "?" };
            let url = format!("{base_url}{separator}audience={}", urlencoding::encode(audience));

            let response = client.get(&url).bearer_auth(request_token).send().await?;
            if !response.status().is_success() {
                return Err(Error::InvalidToken(format!("token exchange returned status {}", response.status())));
            }

            let body: serde_json::Value = response.json().await?;
            body.get("value")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| Error::InvalidToken("token exchange response missing `value`".to_string()))
        }
    }
}

fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// Holds a live, validated token for one provider/audience pair and
/// refreshes it proactively before it expires.
pub struct TokenManager {
    provider: Provider,
    audience: String,
    current: Option<Token>,
    refresh_threshold_seconds: i64,
}

impl TokenManager {
    pub fn new(provider: Provider, audience: impl Into<String>, refresh_threshold_seconds: i64) -> Self {
        TokenManager { provider, audience: audience.into(), current: None, refresh_threshold_seconds }
    }

    /// Returns the held token if it has enough TTL left, otherwise fetches
    /// and fully validates a new one first.
    pub async fn get_valid_token(
        &mut self,
        client: &reqwest::Client,
        jwks: &Jwks,
        skew_seconds: i64,
    ) -> Result<&Token> {
        let needs_refresh = match &self.current {
            Some(token) => now_unix() >= token.claims.exp - self.refresh_threshold_seconds,
            None => true,
        };

        if needs_refresh {
            self.refresh_token(client, jwks, skew_seconds).await?;
        }

        Ok(self.current.as_ref().expect("just populated above"))
    }

    /// Unconditionally fetches and validates a new token.
    pub async fn refresh_token(
        &mut self,
        client: &reqwest::Client,
        jwks: &Jwks,
        skew_seconds: i64,
    ) -> Result<&Token> {
        self.current = None;
        let raw = acquire_token(client, &self.provider, &self.audience).await?;
        let token = jwt::validate_complete(&raw, self.provider.issuer, jwks, None, skew_seconds)?;
        self.current = Some(token);
        Ok(self.current.as_ref().expect("just assigned"))
    }

    /// `max(0, exp - now)`, or 0 if no token is currently held.
    pub fn get_token_ttl(&self) -> i64 {
        match &self.current {
            Some(token) => (token.claims.exp - now_unix()).max(0),
            None => 0,
        }
    }

    /// True if the held token won't outlive an operation of the given
    /// duration plus the refresh threshold — or if no token is held yet.
    pub fn needs_refresh_for_operation(&self, duration_seconds: i64) -> bool {
        if self.current.is_none() {
            return true;
        }
        self.get_token_ttl() < duration_seconds + self.refresh_threshold_seconds
    }

    #[cfg(test)]
    fn with_token_for_test(mut self, token: Token) -> Self {
        self.current = Some(token);
        self
    }
}

#[cfg(test)]
#[path = "./oidc.test.rs"]
mod tests;
