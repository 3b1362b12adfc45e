use crate::{
  constants::*,
  error::*,
  grant::TokenGrant,
  http::{HttpAuth, HttpResponse, OAuthHttpClient},
  log::*,
  message::*,
  store::{ensure_valid, TokenStore},
  token::{Token, TokenKind},
  OAuthConfig,
};
use chrono::Utc;
use std::sync::Arc;
use url::Url;

/// Token client acquiring backend and user tokens from the OAuth2 endpoints of the API
pub struct TokenClient<H>
where
  H: OAuthHttpClient,
{
  config: OAuthConfig,
  http_client: Arc<H>,
}

impl<H> TokenClient<H>
where
  H: OAuthHttpClient,
{
  pub fn new(config: &OAuthConfig, http_client: Arc<H>) -> Self {
    Self {
      config: config.clone(),
      http_client,
    }
  }

  pub fn config(&self) -> &OAuthConfig {
    &self.config
  }

  /// Url of the authorization endpoint starting the authorization code flow in the browser.
  /// No request is made.
  pub fn get_authorization_url(&self, redirect_uri: &str, scope: &str, state: Option<&str>) -> ClientResult<Url> {
    let mut authorize_endpoint = self.config.endpoint(ENDPOINT_AUTHORIZE_PATH)?;
    {
      let mut query = authorize_endpoint.query_pairs_mut();
      query
        .append_pair("response_type", "code")
        .append_pair("client_id", self.config.credential.client_id())
        .append_pair("redirect_uri", redirect_uri);
      if !scope.is_empty() {
        query.append_pair("scope", scope);
      }
      if let Some(state) = state {
        query.append_pair("state", state);
      }
    }
    Ok(authorize_endpoint)
  }

  /// Client credentials grant for the integration partner itself
  pub async fn get_backend_token(&self, scope: &str) -> ClientResult<Token> {
    self
      .acquire(&TokenGrant::ClientCredentials {
        scope: scope.to_string(),
      })
      .await
  }

  /// Request a grant code for `username` with the backend token, then redeem it for a user token
  pub async fn get_user_token_by_grant(&self, username: &str, backend_token: &Token) -> ClientResult<Token> {
    self
      .acquire(&TokenGrant::GrantCode {
        username: username.to_string(),
        backend_token: backend_token.clone(),
      })
      .await
  }

  /// Legacy password grant
  pub async fn get_user_token_by_password(&self, username: &str, password: &str) -> ClientResult<Token> {
    self
      .acquire(&TokenGrant::Password {
        username: username.to_string(),
        password: password.to_string(),
      })
      .await
  }

  /// Redeem the code handed to `redirect_uri` at the end of the authorization code flow
  pub async fn get_user_token_by_code(&self, code: &str, redirect_uri: &str) -> ClientResult<Token> {
    self
      .acquire(&TokenGrant::AuthorizationCode {
        code: code.to_string(),
        redirect_uri: redirect_uri.to_string(),
      })
      .await
  }

  pub async fn refresh_user_token(&self, refresh_token: &str) -> ClientResult<Token> {
    self
      .acquire(&TokenGrant::Refresh {
        refresh_token: refresh_token.to_string(),
      })
      .await
  }

  /// Acquire a new token with the given strategy
  pub async fn acquire(&self, grant: &TokenGrant) -> ClientResult<Token> {
    debug!("Requesting token via {grant} grant");
    let grant_type = grant.grant_type();

    let token = match grant {
      TokenGrant::ClientCredentials { scope } => {
        let mut form = vec![("grant_type", grant_type)];
        if !scope.is_empty() {
          form.push(("scope", scope.as_str()));
        }
        self.exchange(&form).await?
      }
      TokenGrant::Password { username, password } => {
        self
          .exchange(&[
            ("grant_type", grant_type),
            ("username", username.as_str()),
            ("password", password.as_str()),
          ])
          .await?
      }
      TokenGrant::GrantCode {
        username,
        backend_token,
      } => {
        let grant_code = self.request_grant_code(username, backend_token).await?;
        self
          .exchange(&[("grant_type", grant_type), ("code", grant_code.as_str())])
          .await?
      }
      TokenGrant::AuthorizationCode { code, redirect_uri } => {
        self
          .exchange(&[
            ("grant_type", grant_type),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
          ])
          .await?
      }
      TokenGrant::Refresh { refresh_token } => {
        let mut token = self
          .exchange(&[("grant_type", grant_type), ("refresh_token", refresh_token.as_str())])
          .await?;
        // refresh token is not rotated by every deployment
        if token.refresh_token.is_none() {
          token.refresh_token = Some(refresh_token.clone());
        }
        token
      }
    };

    info!("Token retrieved via {grant} grant");
    Ok(token)
  }

  /// Return the stored backend token, or acquire and store a new one
  pub async fn ensure_backend_token<S>(&self, store: &S, scope: &str) -> ClientResult<Token>
  where
    S: TokenStore + ?Sized,
  {
    ensure_valid(store, TokenKind::Backend, |_| self.get_backend_token(scope)).await
  }

  /// Return the stored user token, or replace it. A stale token carrying a refresh token is
  /// refreshed, otherwise `fallback` is used. Without either the user has to authorize again.
  pub async fn ensure_user_token<S>(&self, store: &S, fallback: Option<TokenGrant>) -> ClientResult<Token>
  where
    S: TokenStore + ?Sized,
  {
    ensure_valid(store, TokenKind::User, |stale| async move {
      match (stale.and_then(|t| t.refresh_token), fallback) {
        (Some(refresh_token), _) => self.refresh_user_token(&refresh_token).await,
        (None, Some(grant)) => self.acquire(&grant).await,
        (None, None) => Err(ClientError::AuthorizationRequired(TokenKind::User)),
      }
    })
    .await
  }

  /// POST the token endpoint with client credentials as basic auth
  async fn exchange(&self, form: &[(&str, &str)]) -> ClientResult<Token> {
    let token_endpoint = self.config.endpoint(ENDPOINT_TOKEN_PATH)?;
    let credential = &self.config.credential;
    let auth = HttpAuth::Basic {
      username: credential.client_id(),
      password: credential.client_secret(),
    };

    let issued_at = Utc::now();
    let res = self.http_client.post_form(&token_endpoint, auth, form).await?;
    if !res.is_success() {
      let reason = error_reason(&res);
      warn!("Token endpoint responded {}: {reason}", res.status);
      return Err(ClientError::AuthFailure {
        status: res.status,
        reason,
      });
    }

    let Some(token_res) = res.json::<TokenResponse>() else {
      return Err(ClientError::AuthFailure {
        status: res.status,
        reason: "malformed token response".to_string(),
      });
    };
    token_res
      .into_token(issued_at)
      .map_err(|reason| ClientError::AuthFailure {
        status: res.status,
        reason,
      })
  }

  /// Single-use grant code for `username`, never stored
  async fn request_grant_code(&self, username: &str, backend_token: &Token) -> ClientResult<String> {
    let grant_code_endpoint = self.config.endpoint(ENDPOINT_GRANT_CODE_PATH)?;
    let res = self
      .http_client
      .post_form(
        &grant_code_endpoint,
        HttpAuth::Bearer(&backend_token.access_token),
        &[("username", username)],
      )
      .await?;

    if matches!(res.status, 401 | 403) {
      warn!("Backend token rejected by grant code endpoint ({})", res.status);
      return Err(ClientError::TokenExpired { status: res.status });
    }
    if !res.is_success() {
      return Err(ClientError::AuthFailure {
        status: res.status,
        reason: error_reason(&res),
      });
    }

    let grant = res.json::<GrantCodeResponse>().unwrap_or_default();
    match grant.grant_code.filter(|c| !c.is_empty()) {
      Some(grant_code) => {
        debug!("Grant code issued for {username}");
        Ok(grant_code)
      }
      None => Err(ClientError::AuthFailure {
        status: res.status,
        reason: grant
          .error
          .unwrap_or_else(|| "no grant_code in grant code response".to_string()),
      }),
    }
  }
}

/// Error message of an OAuth2 error body, or the raw body
fn error_reason(res: &HttpResponse) -> String {
  match res.json::<TokenResponse>() {
    Some(TokenResponse {
      error: Some(error),
      error_description,
      ..
    }) => match error_description {
      Some(description) => format!("{error}: {description}"),
      None => error,
    },
    _ => res.body.clone(),
  }
}
