use crate::{error::*, session::SessionStore};
use libclient::{
  EmbedClient, EmbedConfig, OAuthConfig, ReqwestHttpClient, Token, TokenClient, TokenGrant,
};
use std::{net::IpAddr, net::SocketAddr, str::FromStr, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a user token is obtained for a username entered in the form
pub enum UserFlow {
  /// Grant code requested with the backend token, then redeemed
  GrantCode,
  /// Legacy password grant with the backend access token as password
  Password,
}

impl UserFlow {
  pub fn grant(&self, username: &str, backend_token: &Token) -> TokenGrant {
    match self {
      UserFlow::GrantCode => TokenGrant::GrantCode {
        username: username.to_string(),
        backend_token: backend_token.clone(),
      },
      UserFlow::Password => TokenGrant::Password {
        username: username.to_string(),
        password: backend_token.access_token.clone(),
      },
    }
  }
}

impl FromStr for UserFlow {
  type Err = anyhow::Error;
  fn from_str(s: &str) -> Result<Self> {
    match s {
      "grant-code" => Ok(UserFlow::GrantCode),
      "password" => Ok(UserFlow::Password),
      _ => bail!("Unsupported user flow: {s}"),
    }
  }
}

#[derive(Debug, Clone)]
/// Settings of the demo itself
pub struct DemoSettings {
  pub app_version: String,
  /// Scope requested for backend tokens and in the authorization code flow
  pub scope: String,
  pub user_flow: UserFlow,
  /// Stylesheet injected into the embed when the theme option is checked
  pub css_url: Option<String>,
  /// End-user ip sent to the API instead of the peer address, for local development
  pub user_ip: Option<IpAddr>,
  /// Externally visible url of this app, used as OAuth2 redirect uri
  pub public_url: Option<String>,
}

pub struct AppState {
  pub listen_socket: SocketAddr,
  pub settings: DemoSettings,
  pub token_client: TokenClient<ReqwestHttpClient>,
  pub embed_client: EmbedClient<ReqwestHttpClient>,
  pub sessions: SessionStore,
}

impl AppState {
  pub fn new(
    listen_socket: SocketAddr,
    settings: DemoSettings,
    oauth_config: &OAuthConfig,
    embed_config: &EmbedConfig,
  ) -> Result<Self> {
    let http_client = Arc::new(ReqwestHttpClient::new()?);
    Ok(Self {
      listen_socket,
      settings,
      token_client: TokenClient::new(oauth_config, http_client.clone()),
      embed_client: EmbedClient::new(oauth_config, embed_config, http_client),
      sessions: SessionStore::default(),
    })
  }

  pub fn allowed_locales(&self) -> &[String] {
    &self.embed_client.config().allowed_locales
  }
}
