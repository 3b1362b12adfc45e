mod auth;
mod constants;
mod embed;
mod error;
mod grant;
mod http;
mod log;
mod message;
mod store;
mod token;

use url::Url;

pub use auth::TokenClient;
pub use constants::{DEFAULT_API_BASE_URL, DEFAULT_LOCALES, DEFAULT_SCOPE, ENDPOINT_EMBED_PATH};
pub use embed::{EmbedClient, EmbedConfig, EmbedOptions, EmbedSession, EmbedSessionType};
pub use error::{ClientError, ClientResult};
pub use grant::TokenGrant;
pub use http::{HttpAuth, HttpResponse, OAuthHttpClient};
pub use store::{ensure_valid, ensure_valid_at, invalidate, invalidate_all, MemoryTokenStore, TokenStore};
pub use token::{Token, TokenKind};

#[cfg(feature = "reqwest")]
pub use http::ReqwestHttpClient;

#[derive(PartialEq, Eq, Clone)]
/// Client credential issued to the integration partner
pub struct Credential {
  client_id: String,
  client_secret: String,
}

impl Credential {
  pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> ClientResult<Self> {
    let client_id = client_id.into();
    let client_secret = client_secret.into();
    if client_id.trim().is_empty() {
      return Err(ClientError::ConfigurationError("client id is missing".to_string()));
    }
    if client_secret.is_empty() {
      return Err(ClientError::ConfigurationError("client secret is missing".to_string()));
    }
    Ok(Self {
      client_id,
      client_secret,
    })
  }
  pub fn client_id(&self) -> &str {
    &self.client_id
  }
  pub fn client_secret(&self) -> &str {
    &self.client_secret
  }
}

impl std::fmt::Debug for Credential {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credential")
      .field("client_id", &self.client_id)
      .field("client_secret", &"<redacted>")
      .finish()
  }
}

#[derive(PartialEq, Eq, Debug, Clone)]
/// Where and as whom to talk to the newsletter API
pub struct OAuthConfig {
  pub credential: Credential,
  /// API base url, always ending with a slash so that endpoint paths are joined below it
  api_base: Url,
}

impl OAuthConfig {
  pub fn new(credential: Credential, api_base: &str) -> ClientResult<Self> {
    let mut api_base = Url::parse(api_base)?;
    if api_base.cannot_be_a_base() || !matches!(api_base.scheme(), "http" | "https") {
      return Err(ClientError::ConfigurationError(format!(
        "api base url must be an http(s) url: {api_base}"
      )));
    }
    if !api_base.path().ends_with('/') {
      let path = format!("{}/", api_base.path());
      api_base.set_path(&path);
    }
    Ok(Self { credential, api_base })
  }

  pub fn api_base(&self) -> &Url {
    &self.api_base
  }

  /// Resolve an endpoint path relative to the api base
  pub(crate) fn endpoint(&self, path: &str) -> ClientResult<Url> {
    Ok(self.api_base.join(path.trim_start_matches('/'))?)
  }
}
