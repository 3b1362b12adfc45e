use crate::{
  constants::{DEFAULT_LOCALES, ENDPOINT_EMBED_PATH},
  error::*,
  http::OAuthHttpClient,
  log::*,
  message::*,
  OAuthConfig,
};
use serde::{Deserialize, Serialize};
use std::{net::IpAddr, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Kind of embedded session. Newsletter creation is the only one offered by the API.
pub enum EmbedSessionType {
  Newsletters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Per-session options of the embedded newsletter UI
pub struct EmbedOptions {
  pub locale: String,
  /// Inject `custom_css_url` into the embedded page
  pub theme_enabled: bool,
  pub show_recipients_step: bool,
  pub custom_css_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedConfig {
  /// Embed endpoint path relative to the api base
  pub endpoint_path: String,
  /// Locales the deployment accepts
  pub allowed_locales: Vec<String>,
}

impl Default for EmbedConfig {
  fn default() -> Self {
    Self {
      endpoint_path: ENDPOINT_EMBED_PATH.to_string(),
      allowed_locales: DEFAULT_LOCALES.iter().map(|l| l.to_string()).collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a successful embed creation. The url is single-use and expires within minutes.
pub struct EmbedSession {
  pub redirect_url: String,
  /// Response body, kept for diagnostics
  pub content: Option<String>,
}

/// Client creating embed sessions with a user access token
pub struct EmbedClient<H>
where
  H: OAuthHttpClient,
{
  oauth_config: OAuthConfig,
  config: EmbedConfig,
  http_client: Arc<H>,
}

impl<H> EmbedClient<H>
where
  H: OAuthHttpClient,
{
  pub fn new(oauth_config: &OAuthConfig, config: &EmbedConfig, http_client: Arc<H>) -> Self {
    Self {
      oauth_config: oauth_config.clone(),
      config: config.clone(),
      http_client,
    }
  }

  pub fn config(&self) -> &EmbedConfig {
    &self.config
  }

  /// Create a newsletter embed session usable from `user_ip` only.
  /// Expiry of `access_token` is not checked here; a rejection surfaces as `TokenExpired`.
  pub async fn create_embed_session(
    &self,
    access_token: &str,
    user_ip: &str,
    options: &EmbedOptions,
  ) -> ClientResult<EmbedSession> {
    self.validate(access_token, user_ip, options)?;

    let embed_endpoint = self.oauth_config.endpoint(&self.config.endpoint_path)?;
    let css = if options.theme_enabled {
      options.custom_css_url.as_deref()
    } else {
      None
    };
    let request = EmbedRequest {
      session_type: EmbedSessionType::Newsletters,
      user_ip,
      options: EmbedRequestOptions {
        lang: &options.locale,
        css,
        skip_recipients_step: !options.show_recipients_step,
      },
    };

    let res = self
      .http_client
      .post_json(&embed_endpoint, access_token, &request)
      .await?;

    if matches!(res.status, 401 | 403) {
      // most likely an expired token
      warn!("Access token rejected by embed endpoint ({})", res.status);
      return Err(ClientError::TokenExpired { status: res.status });
    }
    if !res.is_success() {
      error!("Embed endpoint responded {}", res.status);
      return Err(ClientError::EmbedCreationFailure {
        status: res.status,
        body: res.body,
      });
    }

    let redirect_url = match res.location.clone().filter(|l| !l.is_empty()) {
      Some(location) => location,
      None => match res.json::<EmbedResponse>().and_then(|r| r.url).filter(|u| !u.is_empty()) {
        Some(url) => url,
        None => {
          return Err(ClientError::EmbedCreationFailure {
            status: res.status,
            body: res.body,
          });
        }
      },
    };
    info!("Embed session created for {user_ip}");

    Ok(EmbedSession {
      redirect_url,
      content: Some(res.body).filter(|b| !b.is_empty()),
    })
  }

  fn validate(&self, access_token: &str, user_ip: &str, options: &EmbedOptions) -> ClientResult<()> {
    if access_token.is_empty() {
      return Err(ClientError::InvalidEmbedRequest("access token is empty".to_string()));
    }
    if user_ip.parse::<IpAddr>().is_err() {
      return Err(ClientError::InvalidEmbedRequest(format!(
        "user ip is not an ip address: {user_ip:?}"
      )));
    }
    if !self.config.allowed_locales.iter().any(|l| l == &options.locale) {
      return Err(ClientError::InvalidEmbedRequest(format!(
        "unsupported locale: {}",
        options.locale
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    auth::TokenClient,
    constants::DEFAULT_SCOPE,
    http::{
      mock::{json_response, MockHttpClient},
      HttpResponse,
    },
    Credential,
  };
  use serde_json::json;

  fn oauth_config() -> OAuthConfig {
    let credential = Credential::new("client-id", "client-secret").unwrap();
    OAuthConfig::new(credential, "https://api.example").unwrap()
  }

  fn embed_client(responses: Vec<HttpResponse>) -> (EmbedClient<MockHttpClient>, Arc<MockHttpClient>) {
    let http_client = Arc::new(MockHttpClient::with_responses(responses));
    let client = EmbedClient::new(&oauth_config(), &EmbedConfig::default(), http_client.clone());
    (client, http_client)
  }

  fn options() -> EmbedOptions {
    EmbedOptions {
      locale: "nb".to_string(),
      theme_enabled: true,
      show_recipients_step: false,
      custom_css_url: None,
    }
  }

  fn created(location: &str) -> HttpResponse {
    HttpResponse {
      status: 201,
      location: Some(location.to_string()),
      body: String::new(),
    }
  }

  #[tokio::test]
  async fn location_header_becomes_redirect_url() {
    let (client, http) = embed_client(vec![created("https://embed.example/s/xyz")]);

    let session = client
      .create_embed_session("user-token", "127.0.0.1", &options())
      .await
      .unwrap();
    assert_eq!(session.redirect_url, "https://embed.example/s/xyz");
    assert_eq!(session.content, None);

    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.as_str(), "https://api.example/v1/embed/");
    assert_eq!(requests[0].auth, "Bearer user-token");
    assert_eq!(
      requests[0].json,
      Some(json!({
        "session_type": "newsletters",
        "user_ip": "127.0.0.1",
        "options": {"lang": "nb", "css": null, "skip_recipients_step": true}
      }))
    );
  }

  #[tokio::test]
  async fn css_is_only_sent_when_theme_is_enabled() {
    let (client, http) = embed_client(vec![created("https://embed.example/s/1"), created("https://embed.example/s/2")]);
    let mut themed = options();
    themed.custom_css_url = Some("https://example.org/example.css".to_string());
    themed.show_recipients_step = true;
    let mut plain = themed.clone();
    plain.theme_enabled = false;

    client.create_embed_session("t", "10.0.0.1", &themed).await.unwrap();
    client.create_embed_session("t", "10.0.0.1", &plain).await.unwrap();

    let requests = http.requests();
    let themed_options = &requests[0].json.as_ref().unwrap()["options"];
    assert_eq!(themed_options["css"], json!("https://example.org/example.css"));
    assert_eq!(themed_options["skip_recipients_step"], json!(false));
    assert_eq!(requests[1].json.as_ref().unwrap()["options"]["css"], json!(null));
  }

  #[tokio::test]
  async fn json_body_url_is_accepted_without_location() {
    let (client, _) = embed_client(vec![json_response(
      201,
      json!({"url": "https://embed.example/s/body", "html": "<iframe></iframe>"}),
    )]);

    let session = client
      .create_embed_session("user-token", "::1", &options())
      .await
      .unwrap();
    assert_eq!(session.redirect_url, "https://embed.example/s/body");
    assert!(session.content.unwrap().contains("iframe"));
  }

  #[tokio::test]
  async fn rejected_token_is_reported_as_expired() {
    let (client, _) = embed_client(vec![
      json_response(401, json!({"error": "invalid_token"})),
      json_response(403, json!({"error": "insufficient_scope"})),
    ]);

    for expected in [401, 403] {
      match client.create_embed_session("old-token", "127.0.0.1", &options()).await {
        Err(ClientError::TokenExpired { status }) => assert_eq!(status, expected),
        other => panic!("unexpected result {other:?}"),
      }
    }
  }

  #[tokio::test]
  async fn other_failures_carry_the_body() {
    let (client, _) = embed_client(vec![
      json_response(400, json!({"user_ip": ["invalid"]})),
      HttpResponse {
        status: 201,
        location: None,
        body: String::new(),
      },
    ]);

    match client.create_embed_session("t", "127.0.0.1", &options()).await {
      Err(ClientError::EmbedCreationFailure { status, body }) => {
        assert_eq!(status, 400);
        assert!(body.contains("user_ip"));
      }
      other => panic!("unexpected result {other:?}"),
    }
    assert!(matches!(
      client.create_embed_session("t", "127.0.0.1", &options()).await,
      Err(ClientError::EmbedCreationFailure { status: 201, .. })
    ));
  }

  #[tokio::test]
  async fn invalid_requests_are_refused_locally() {
    let (client, http) = embed_client(vec![]);
    let mut swedish = options();
    swedish.locale = "sv".to_string();

    for res in [
      client.create_embed_session("", "127.0.0.1", &options()).await,
      client.create_embed_session("t", "localhost", &options()).await,
      client.create_embed_session("t", "127.0.0.1", &swedish).await,
    ] {
      assert!(matches!(res, Err(ClientError::InvalidEmbedRequest(_))));
    }
    assert!(http.requests().is_empty());
  }

  #[tokio::test]
  async fn authorization_code_flow_yields_usable_token() {
    let config = oauth_config();
    let http_client = Arc::new(MockHttpClient::with_responses(vec![
      json_response(200, json!({"access_token": "user", "expires_in": 3600})),
      created("https://embed.example/s/xyz"),
    ]));
    let token_client = TokenClient::new(&config, http_client.clone());
    let embed_client = EmbedClient::new(&config, &EmbedConfig::default(), http_client.clone());

    let redirect_uri = "http://localhost:8000";
    let authorize = token_client
      .get_authorization_url(redirect_uri, DEFAULT_SCOPE, None)
      .unwrap();
    assert!(authorize.query_pairs().any(|(k, v)| k == "redirect_uri" && v == redirect_uri));

    let token = token_client.get_user_token_by_code("code", redirect_uri).await.unwrap();
    assert!(token.is_valid());
    let session = embed_client
      .create_embed_session(&token.access_token, "127.0.0.1", &options())
      .await
      .unwrap();
    assert_eq!(session.redirect_url, "https://embed.example/s/xyz");
    assert_eq!(http_client.requests()[1].auth, "Bearer user");
  }
}
