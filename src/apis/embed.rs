use super::{
  flow::{current_user_token, default_options, renew_user_token},
  response::PageError,
};
use crate::{constants::HOME_PATH, log::*, session::Session, state::AppState, templates::render_embed};
use axum::{
  extract::{ConnectInfo, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use libclient::{ClientError, ClientResult, EmbedOptions, EmbedSession};
use std::{net::SocketAddr, sync::Arc};

/// Page embedding a newsletter session created for the requesting browser
pub async fn embed(
  State(state): State<Arc<AppState>>,
  ConnectInfo(peer): ConnectInfo<SocketAddr>,
  jar: CookieJar,
) -> (CookieJar, Result<Response, PageError>) {
  let (jar, session) = state.sessions.load_or_create(jar).await;
  let user_ip = state.settings.user_ip.unwrap_or(peer.ip()).to_string();
  (jar, show_embed(&state, &session, &user_ip).await)
}

async fn show_embed(state: &AppState, session: &Session, user_ip: &str) -> Result<Response, PageError> {
  let options = session
    .data()
    .await
    .options
    .unwrap_or_else(|| default_options(state));

  let token = match current_user_token(state, session).await {
    Ok(token) => token,
    Err(e) => return Ok(back_to_form(session, e).await),
  };

  let embed_session = match create(state, &token.access_token, user_ip, &options).await {
    Err(ClientError::TokenExpired { status }) => {
      info!("User token rejected by the embed endpoint ({status}), renewing once");
      let token = match renew_user_token(state, session).await {
        Ok(token) => token,
        Err(e) => return Ok(back_to_form(session, e).await),
      };
      create(state, &token.access_token, user_ip, &options).await
    }
    res => res,
  }
  .map_err(PageError::EmbedUnavailable)?;

  Ok(Html(render_embed(&embed_session.redirect_url)).into_response())
}

async fn create(
  state: &AppState,
  access_token: &str,
  user_ip: &str,
  options: &EmbedOptions,
) -> ClientResult<EmbedSession> {
  state
    .embed_client
    .create_embed_session(access_token, user_ip, options)
    .await
}

/// No usable user token: the form starts the flow again
async fn back_to_form(session: &Session, err: ClientError) -> Response {
  if !matches!(err, ClientError::AuthorizationRequired(_)) {
    warn!("User token unavailable: {err}");
    session.flash(err.to_string()).await;
  }
  Redirect::to(HOME_PATH).into_response()
}
