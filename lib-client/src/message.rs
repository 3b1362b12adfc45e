use crate::{constants::DEFAULT_TOKEN_TYPE, embed::EmbedSessionType, token::Token};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
/// Token endpoint response. Every field is optional here so that a malformed body can be
/// reported as an authorization failure instead of a decode error.
pub(super) struct TokenResponse {
  pub access_token: Option<String>,
  pub token_type: Option<String>,
  pub expires_in: Option<i64>,
  pub scope: Option<String>,
  pub refresh_token: Option<String>,
  pub error: Option<String>,
  pub error_description: Option<String>,
}

impl TokenResponse {
  /// Build a token issued at `issued_at`, or describe why the response is unusable
  pub fn into_token(self, issued_at: DateTime<Utc>) -> Result<Token, String> {
    if let Some(error) = self.error {
      return Err(match self.error_description {
        Some(description) => format!("{error}: {description}"),
        None => error,
      });
    }
    let Some(access_token) = self.access_token.filter(|t| !t.trim().is_empty()) else {
      return Err("no access_token in token response".to_string());
    };
    let Some(expires_in) = self.expires_in.filter(|e| *e >= 0) else {
      return Err("no valid expires_in in token response".to_string());
    };
    let Some(expires_at) = Duration::try_seconds(expires_in).and_then(|d| issued_at.checked_add_signed(d)) else {
      return Err("expires_in out of range".to_string());
    };

    Ok(Token {
      access_token,
      token_type: self
        .token_type
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
      expires_at,
      refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
      scope: self.scope,
    })
  }
}

#[derive(Deserialize, Debug, Default)]
/// Grant code endpoint response
pub(super) struct GrantCodeResponse {
  pub grant_code: Option<String>,
  pub error: Option<String>,
}

#[derive(Serialize, Debug)]
/// Embed session creation request
pub(super) struct EmbedRequest<'a> {
  pub session_type: EmbedSessionType,
  pub user_ip: &'a str,
  pub options: EmbedRequestOptions<'a>,
}

#[derive(Serialize, Debug)]
/// Embed options in the field names the API expects
pub(super) struct EmbedRequestOptions<'a> {
  pub lang: &'a str,
  pub css: Option<&'a str>,
  pub skip_recipients_step: bool,
}

#[derive(Deserialize, Debug, Default)]
/// Embed endpoint body of API revisions returning the session url as JSON
pub(super) struct EmbedResponse {
  pub url: Option<String>,
}
