use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Describes things that can go wrong while acquiring tokens and creating embed sessions
#[derive(Debug, Error)]
pub enum ClientError {
  /// The token or grant code endpoint rejected the request or returned no usable token
  #[error("Authorization failed (status {status}): {reason}")]
  AuthFailure { status: u16, reason: String },

  /// No usable token is stored and none can be acquired without user interaction
  #[error("Authorization of the {0} token is required")]
  AuthorizationRequired(crate::token::TokenKind),

  /// A previously valid token was rejected by a downstream call
  #[error("Access token rejected with status {status}")]
  TokenExpired { status: u16 },

  #[error("Embed session creation failed (status {status}): {body}")]
  EmbedCreationFailure { status: u16, body: String },

  #[error("Invalid configuration: {0}")]
  ConfigurationError(String),

  #[error("Invalid embed request: {0}")]
  InvalidEmbedRequest(String),

  #[error("Failed to build endpoint url: {0}")]
  UrlError(#[from] url::ParseError),

  #[error("OAuthHttpClient failed to complete the request: {source}")]
  HttpTransport {
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ClientError {
  /// True when the caller should run the token refresh path (or send the user through
  /// the authorization flow again) before retrying.
  pub fn is_reauthorization_required(&self) -> bool {
    matches!(
      self,
      Self::TokenExpired { .. } | Self::AuthFailure { .. } | Self::AuthorizationRequired(_)
    )
  }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ClientError {
  fn from(e: reqwest::Error) -> Self {
    Self::HttpTransport { source: Box::new(e) }
  }
}
