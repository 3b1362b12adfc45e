use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Kinds of tokens kept per end-user session
pub enum TokenKind {
  /// Client credentials token of the integration partner itself
  Backend,
  /// Token scoped to a single end-user account
  User,
}

impl TokenKind {
  pub const ALL: [TokenKind; 2] = [TokenKind::Backend, TokenKind::User];

  pub fn as_str(&self) -> &'static str {
    match self {
      TokenKind::Backend => "backend",
      TokenKind::User => "user",
    }
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Access token obtained from the token endpoint. Replaced as a whole, never patched.
pub struct Token {
  pub access_token: String,
  pub token_type: String,
  pub expires_at: DateTime<Utc>,
  pub refresh_token: Option<String>,
  pub scope: Option<String>,
}

impl Token {
  /// Valid strictly before `expires_at`
  pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
    now < self.expires_at
  }

  pub fn is_valid(&self) -> bool {
    self.is_valid_at(Utc::now())
  }

  /// Remaining seconds until expiration, negative once expired
  pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> i64 {
    (self.expires_at - now).num_seconds()
  }
}

impl fmt::Debug for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Token")
      .field("token_type", &self.token_type)
      .field("expires_at", &self.expires_at)
      .field("has_refresh_token", &self.refresh_token.is_some())
      .field("scope", &self.scope)
      .finish_non_exhaustive()
  }
}
