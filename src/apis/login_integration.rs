use super::flow::{default_options, start_authorization};
use crate::{constants::HOME_PATH, log::*, state::AppState};
use axum::{
  extract::State,
  http::HeaderMap,
  response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Start the authorization code flow right away with default embed options
pub async fn login_integration(
  State(state): State<Arc<AppState>>,
  jar: CookieJar,
  headers: HeaderMap,
) -> (CookieJar, Response) {
  let (jar, session) = state.sessions.load_or_create(jar).await;

  // the callback lands on the home page, which resets sessions of another version
  if session.data().await.version.as_deref() != Some(state.settings.app_version.as_str()) {
    session.flush().await;
    session.set_version(&state.settings.app_version).await;
  }
  session.set_options(default_options(&state)).await;

  let res = match start_authorization(&state, &session, &headers).await {
    Ok(redirect) => redirect.into_response(),
    Err(e) => {
      error!("Building authorization url failed: {e}");
      session.flash(e.to_string()).await;
      Redirect::to(HOME_PATH).into_response()
    }
  };
  (jar, res)
}
