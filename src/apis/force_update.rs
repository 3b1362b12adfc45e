use crate::{constants::HOME_PATH, log::*, state::AppState};
use axum::{extract::State, response::Redirect};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Drop every token and option of the session and stamp the current version
pub async fn force_update(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
  let (jar, session) = state.sessions.load_or_create(jar).await;
  session.flush().await;
  session.set_version(&state.settings.app_version).await;
  info!("Session reset to version {}", state.settings.app_version);
  (jar, Redirect::to(HOME_PATH))
}
