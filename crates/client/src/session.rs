//! Session bootstrap: launch parameters, token exchange, session context.

use chrono::{DateTime, Utc};
use pl_domain::config::ClientConfig;
use pl_domain::error::{Error, Result};
use reqwest::Url;
use serde_json::{Map, Value};

use crate::client::{ApiRequest, Auth, ParalegalClient};
use crate::types::{TokenExchangeRequest, TokenExchangeResponse};

/// An authenticated session for one firm and matter.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub session_token: String,
    pub firm_id: String,
    pub matter_id: String,
    pub parameters: Map<String, Value>,
    pub chat_id: Option<String>,
    pub conversation_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl From<TokenExchangeResponse> for SessionContext {
    fn from(resp: TokenExchangeResponse) -> Self {
        Self {
            session_token: resp.session_token,
            firm_id: resp.firm_id,
            matter_id: resp.matter_id,
            parameters: resp.parameters,
            chat_id: resp.chat_id,
            conversation_id: resp.conversation_id,
            expires_at: resp.expires_at,
        }
    }
}

/// Values the host passes to an embedded app in its launch URL:
/// `?token=…&baseUrl=…&apiKey=…`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl LaunchParams {
    /// Parse a full URL or a bare query string (with or without `?`).
    /// Empty values count as absent.
    pub fn from_url(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(_) => {
                let query = input.trim_start_matches('?');
                Url::parse("http://launch.invalid/")
                    .and_then(|base| base.join(&format!("?{query}")))
                    .map_err(|e| Error::Config(format!("invalid launch URL '{input}': {e}")))?
            }
        };

        let mut params = LaunchParams::default();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            let slot = match &*key {
                "token" => &mut params.token,
                "baseUrl" => &mut params.base_url,
                "apiKey" => &mut params.api_key,
                _ => continue,
            };
            // First occurrence wins.
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        Ok(params)
    }

    /// Overlay launch values onto `overrides`. Values already set in
    /// `overrides` win; launch values fill the gaps.
    pub fn client_config(&self, overrides: &ClientConfig) -> ClientConfig {
        let mut cfg = overrides.clone();
        if cfg.base_url.trim().is_empty() {
            if let Some(url) = &self.base_url {
                cfg.base_url = url.clone();
            }
        }
        if cfg.api_key.as_deref().map_or(true, str::is_empty) && self.api_key.is_some() {
            cfg.api_key = self.api_key.clone();
        }
        cfg
    }
}

impl ParalegalClient {
    /// POST /api/sdk/v1/token/exchange
    pub async fn exchange_token(&self, exchange_token: &str) -> Result<TokenExchangeResponse> {
        let req = ApiRequest::post("Token exchange", "/api/sdk/v1/token/exchange", Auth::ApiKey).json(
            &TokenExchangeRequest {
                exchange_token: exchange_token.to_owned(),
            },
        )?;
        self.fetch_json(&req).await
    }

    /// Exchange a launch token and wrap the result as a [`SessionContext`].
    pub async fn start_session(&self, exchange_token: &str) -> Result<SessionContext> {
        let session = SessionContext::from(self.exchange_token(exchange_token).await?);
        tracing::debug!(
            firm_id = %session.firm_id,
            matter_id = %session.matter_id,
            expires_at = %session.expires_at,
            "session started"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(expires_at: DateTime<Utc>) -> SessionContext {
        SessionContext {
            session_token: "s".into(),
            firm_id: "f".into(),
            matter_id: "m".into(),
            parameters: Map::new(),
            chat_id: None,
            conversation_id: None,
            expires_at,
        }
    }

    #[test]
    fn expiry_is_inclusive() {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let s = session(at);
        assert!(!s.is_expired_at(at - chrono::Duration::seconds(1)));
        assert!(s.is_expired_at(at));
    }

    #[test]
    fn launch_params_from_full_url() {
        let p = LaunchParams::from_url(
            "https://app.example.com/embed?token=xch-1&baseUrl=https%3A%2F%2Fhost.example.com&apiKey=k",
        )
        .unwrap();
        assert_eq!(p.token.as_deref(), Some("xch-1"));
        assert_eq!(p.base_url.as_deref(), Some("https://host.example.com"));
        assert_eq!(p.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn launch_params_from_bare_query() {
        let p = LaunchParams::from_url("?token=abc&other=1&apiKey=").unwrap();
        assert_eq!(p.token.as_deref(), Some("abc"));
        assert_eq!(p.base_url, None);
        assert_eq!(p.api_key, None);

        let p = LaunchParams::from_url("token=abc").unwrap();
        assert_eq!(p.token.as_deref(), Some("abc"));
    }

    #[test]
    fn explicit_config_wins_over_launch_values() {
        let p = LaunchParams {
            token: Some("t".into()),
            base_url: Some("https://from-url.example.com".into()),
            api_key: Some("url-key".into()),
        };

        let mut explicit = ClientConfig::with_base_url("https://explicit.example.com");
        explicit.api_key = Some("explicit-key".into());
        let cfg = p.client_config(&explicit);
        assert_eq!(cfg.base_url, "https://explicit.example.com");
        assert_eq!(cfg.api_key.as_deref(), Some("explicit-key"));

        let cfg = p.client_config(&ClientConfig::default());
        assert_eq!(cfg.base_url, "https://from-url.example.com");
        assert_eq!(cfg.api_key.as_deref(), Some("url-key"));
    }

    #[test]
    fn session_context_from_exchange_response() {
        let resp: TokenExchangeResponse = serde_json::from_value(serde_json::json!({
            "session_token": "sess",
            "firm_id": "f1",
            "matter_id": "m1",
            "parameters": {"tone": "formal"},
            "chat_id": "c1",
            "expires_at": "2030-01-01T00:00:00Z"
        }))
        .unwrap();
        let s = SessionContext::from(resp);
        assert_eq!(s.parameters["tone"], "formal");
        assert_eq!(s.chat_id.as_deref(), Some("c1"));
        assert!(s.conversation_id.is_none());
    }
}
