use super::{
  flow::{acquire_user_token, backend_token, default_options, redirect_uri, start_authorization},
  request::{HomeForm, HomeQuery},
  response::PageError,
};
use crate::{
  constants::{EMBED_PATH, FORCE_UPDATE_PATH, HOME_PATH},
  log::*,
  session::Session,
  state::AppState,
  templates::{render_home, HomeView},
};
use axum::{
  extract::{Query, State},
  http::HeaderMap,
  response::{Html, IntoResponse, Redirect, Response},
  Form,
};
use axum_extra::extract::cookie::CookieJar;
use libclient::{EmbedOptions, TokenKind, TokenStore};
use std::sync::Arc;
use validator::Validate;

/// Embed options form, also receiving the authorization code callback
pub async fn home_get(
  State(state): State<Arc<AppState>>,
  jar: CookieJar,
  headers: HeaderMap,
  Query(query): Query<HomeQuery>,
) -> (CookieJar, Result<Response, PageError>) {
  let (jar, session) = state.sessions.load_or_create(jar).await;
  (jar, show_home(&state, &session, &headers, query).await)
}

pub async fn home_post(
  State(state): State<Arc<AppState>>,
  jar: CookieJar,
  headers: HeaderMap,
  Form(form): Form<HomeForm>,
) -> (CookieJar, Response) {
  let (jar, session) = state.sessions.load_or_create(jar).await;
  (jar, submit_home(&state, &session, &headers, form).await)
}

async fn show_home(
  state: &AppState,
  session: &Session,
  headers: &HeaderMap,
  query: HomeQuery,
) -> Result<Response, PageError> {
  // tokens of sessions created under another version are discarded first
  if session.data().await.version.as_deref() != Some(state.settings.app_version.as_str()) {
    debug!("Session version differs from {}", state.settings.app_version);
    return Ok(Redirect::to(FORCE_UPDATE_PATH).into_response());
  }

  backend_token(state, session)
    .await
    .map_err(PageError::BackendTokenUnavailable)?;

  if let Some(error) = query.error {
    warn!("Authorization denied: {error}");
    session.flash(query.error_description.unwrap_or(error)).await;
  } else if let Some(code) = query.code {
    let expected = session.take_oauth_state().await;
    if expected.is_none() || expected != query.state {
      warn!("Authorization callback with unexpected state");
      session.flash("Authorization state mismatch, please try again").await;
      return Ok(Redirect::to(HOME_PATH).into_response());
    }

    return match state
      .token_client
      .get_user_token_by_code(&code, &redirect_uri(state, headers))
      .await
    {
      Ok(token) => {
        session.tokens.set(TokenKind::User, token).await;
        session.set_username(None).await;
        Ok(Redirect::to(EMBED_PATH).into_response())
      }
      Err(e) => {
        warn!("Exchanging authorization code failed: {e}");
        session.flash(e.to_string()).await;
        Ok(Redirect::to(HOME_PATH).into_response())
      }
    };
  }

  let data = session.data().await;
  let options = data.options.unwrap_or_else(|| default_options(state));
  let flash_error = session.take_flash().await;
  let view = HomeView {
    locales: state.allowed_locales(),
    selected_locale: &options.locale,
    username: data.username.as_deref().unwrap_or_default(),
    theme_enabled: options.theme_enabled,
    skip_recipients_step: !options.show_recipients_step,
    flash_error: flash_error.as_deref(),
  };
  Ok(Html(render_home(&view)).into_response())
}

async fn submit_home(state: &AppState, session: &Session, headers: &HeaderMap, form: HomeForm) -> Response {
  if let Err(e) = form.validate() {
    session.flash(format!("Invalid form: {e}")).await;
    return Redirect::to(HOME_PATH).into_response();
  }
  if !state.allowed_locales().contains(&form.lang) {
    session.flash(format!("Unsupported language: {}", form.lang)).await;
    return Redirect::to(HOME_PATH).into_response();
  }

  session
    .set_options(EmbedOptions {
      locale: form.lang,
      theme_enabled: form.css.is_some(),
      show_recipients_step: form.skip_recipients_step.is_none(),
      custom_css_url: state.settings.css_url.clone(),
    })
    .await;

  let username = form.username.trim();
  if form.auth_code_grant.is_some() || username.is_empty() {
    return match start_authorization(state, session, headers).await {
      Ok(redirect) => redirect.into_response(),
      Err(e) => {
        error!("Building authorization url failed: {e}");
        session.flash(e.to_string()).await;
        Redirect::to(HOME_PATH).into_response()
      }
    };
  }

  match acquire_user_token(state, session, username).await {
    Ok(_) => Redirect::to(EMBED_PATH).into_response(),
    Err(e) => {
      warn!("User token for the submitted username not obtained: {e}");
      session.flash(e.to_string()).await;
      Redirect::to(HOME_PATH).into_response()
    }
  }
}
