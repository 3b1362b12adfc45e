use crate::{log::*, session::Session, state::AppState};
use axum::{
  http::{header, HeaderMap},
  response::Redirect,
};
use libclient::{invalidate, ClientError, ClientResult, EmbedOptions, Token, TokenKind, TokenStore};
use uuid::Uuid;

/// Absolute site root without trailing slash, registered as OAuth2 redirect uri
pub(super) fn redirect_uri(state: &AppState, headers: &HeaderMap) -> String {
  if let Some(public_url) = state.settings.public_url.as_deref() {
    return public_url.trim_end_matches('/').to_string();
  }
  let host = headers
    .get(header::HOST)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.to_string())
    .unwrap_or_else(|| state.listen_socket.to_string());
  format!("http://{host}")
}

/// Options used when the form was never submitted
pub(super) fn default_options(state: &AppState) -> EmbedOptions {
  EmbedOptions {
    locale: state.allowed_locales().first().cloned().unwrap_or_default(),
    theme_enabled: false,
    show_recipients_step: false,
    custom_css_url: state.settings.css_url.clone(),
  }
}

pub(super) async fn backend_token(state: &AppState, session: &Session) -> ClientResult<Token> {
  state
    .token_client
    .ensure_backend_token(&session.tokens, &state.settings.scope)
    .await
}

/// Obtain and store a user token for `username` through the configured user flow.
/// A backend token rejected by the grant code endpoint is replaced once.
pub(super) async fn acquire_user_token(state: &AppState, session: &Session, username: &str) -> ClientResult<Token> {
  let backend = backend_token(state, session).await?;
  let user_flow = state.settings.user_flow;

  let token = match state.token_client.acquire(&user_flow.grant(username, &backend)).await {
    Err(ClientError::TokenExpired { status }) => {
      warn!("Backend token rejected ({status}), requesting a new one");
      invalidate(&session.tokens, TokenKind::Backend).await;
      let backend = backend_token(state, session).await?;
      state.token_client.acquire(&user_flow.grant(username, &backend)).await?
    }
    res => res?,
  };

  session.tokens.set(TokenKind::User, token.clone()).await;
  session.set_username(Some(username)).await;
  Ok(token)
}

/// Valid user token of the session. A stale one is refreshed, or acquired again for the
/// username it was issued to.
pub(super) async fn current_user_token(state: &AppState, session: &Session) -> ClientResult<Token> {
  match state.token_client.ensure_user_token(&session.tokens, None).await {
    Err(e) if e.is_reauthorization_required() => match session.data().await.username {
      Some(username) => acquire_user_token(state, session, &username).await,
      None => Err(e),
    },
    res => res,
  }
}

/// Replace a user token the API rejected even though it looked valid
pub(super) async fn renew_user_token(state: &AppState, session: &Session) -> ClientResult<Token> {
  let rejected = session.tokens.get(TokenKind::User).await;
  invalidate(&session.tokens, TokenKind::User).await;

  if let Some(refresh_token) = rejected.and_then(|t| t.refresh_token) {
    match state.token_client.refresh_user_token(&refresh_token).await {
      Ok(token) => {
        session.tokens.set(TokenKind::User, token.clone()).await;
        return Ok(token);
      }
      Err(e) => warn!("Refreshing rejected user token failed: {e}"),
    }
  }

  match session.data().await.username {
    Some(username) => acquire_user_token(state, session, &username).await,
    None => Err(ClientError::AuthorizationRequired(TokenKind::User)),
  }
}

/// Redirect the browser to the authorization page with a fresh `state`
pub(super) async fn start_authorization(
  state: &AppState,
  session: &Session,
  headers: &HeaderMap,
) -> ClientResult<Redirect> {
  let oauth_state = Uuid::new_v4().simple().to_string();
  let url = state.token_client.get_authorization_url(
    &redirect_uri(state, headers),
    &state.settings.scope,
    Some(&oauth_state),
  )?;
  session.set_oauth_state(&oauth_state).await;
  debug!("Redirecting to authorization page");
  Ok(Redirect::to(url.as_str()))
}
