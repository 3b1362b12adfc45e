use crate::{constants::*, log::*};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use libclient::{invalidate_all, EmbedOptions, MemoryTokenStore};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
/// Non-token values kept per browser session
pub struct SessionData {
  /// App version the session was created under
  pub version: Option<String>,
  pub options: Option<EmbedOptions>,
  /// Username the stored user token belongs to
  pub username: Option<String>,
  /// `state` sent along the pending authorization code flow
  pub oauth_state: Option<String>,
  /// One-shot error message shown on the next page
  pub flash_error: Option<String>,
}

#[derive(Debug)]
/// Browser session: tokens in their own store plus everything else
pub struct Session {
  pub tokens: MemoryTokenStore,
  data: RwLock<SessionData>,
  last_seen: RwLock<DateTime<Utc>>,
}

impl Session {
  fn new() -> Self {
    Self {
      tokens: MemoryTokenStore::new(),
      data: RwLock::new(SessionData::default()),
      last_seen: RwLock::new(Utc::now()),
    }
  }

  pub async fn data(&self) -> SessionData {
    self.data.read().await.clone()
  }

  pub async fn set_version(&self, version: &str) {
    self.data.write().await.version = Some(version.to_string());
  }

  pub async fn set_options(&self, options: EmbedOptions) {
    self.data.write().await.options = Some(options);
  }

  /// `None` for tokens obtained without a known username, e.g. via authorization code
  pub async fn set_username(&self, username: Option<&str>) {
    self.data.write().await.username = username.map(|u| u.to_string());
  }

  pub async fn set_oauth_state(&self, oauth_state: &str) {
    self.data.write().await.oauth_state = Some(oauth_state.to_string());
  }

  /// Pending authorization `state`, consumed by the first callback
  pub async fn take_oauth_state(&self) -> Option<String> {
    self.data.write().await.oauth_state.take()
  }

  pub async fn flash(&self, message: impl Into<String>) {
    self.data.write().await.flash_error = Some(message.into());
  }

  pub async fn take_flash(&self) -> Option<String> {
    self.data.write().await.flash_error.take()
  }

  /// Forget all tokens, options and pending flows
  pub async fn flush(&self) {
    invalidate_all(&self.tokens).await;
    *self.data.write().await = SessionData::default();
  }

  async fn touch(&self, now: DateTime<Utc>) {
    *self.last_seen.write().await = now;
  }

  async fn is_idle_since(&self, deadline: DateTime<Utc>) -> bool {
    *self.last_seen.read().await < deadline
  }
}

#[derive(Debug, Default)]
/// In-memory sessions keyed by the id kept in the session cookie
pub struct SessionStore {
  inner: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionStore {
  /// Session referred to by the cookie, or a new one together with the cookie to set
  pub async fn load_or_create(&self, jar: CookieJar) -> (CookieJar, Arc<Session>) {
    let now = Utc::now();
    let session_id = jar
      .get(SESSION_COOKIE_NAME)
      .and_then(|c| Uuid::parse_str(c.value()).ok());

    if let Some(session_id) = session_id {
      let lock = self.inner.read().await;
      if let Some(session) = lock.get(&session_id).cloned() {
        drop(lock);
        session.touch(now).await;
        return (jar, session);
      }
    }

    self.prune(now).await;

    let session_id = Uuid::new_v4();
    let session = Arc::new(Session::new());
    let mut lock = self.inner.write().await;
    lock.insert(session_id, session.clone());
    debug!("New session created, {} active", lock.len());
    drop(lock);

    let cookie = Cookie::build((SESSION_COOKIE_NAME, session_id.to_string()))
      .path("/")
      .http_only(true)
      .same_site(SameSite::Lax)
      .build();
    (jar.add(cookie), session)
  }

  #[cfg(test)]
  async fn len(&self) -> usize {
    self.inner.read().await.len()
  }

  /// Drop sessions idle for longer than the timeout
  async fn prune(&self, now: DateTime<Utc>) {
    let deadline = now - Duration::hours(SESSION_IDLE_TIMEOUT_HOURS);
    let mut lock = self.inner.write().await;
    let mut idle = vec![];
    for (id, session) in lock.iter() {
      if session.is_idle_since(deadline).await {
        idle.push(*id);
      }
    }
    for id in idle.iter() {
      lock.remove(id);
    }
    if !idle.is_empty() {
      info!("Pruned {} idle sessions", idle.len());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use libclient::{Token, TokenKind, TokenStore};

  #[tokio::test]
  async fn cookie_returns_the_same_session() {
    let store = SessionStore::default();
    let (jar, session) = store.load_or_create(CookieJar::new()).await;
    let cookie = jar.get(SESSION_COOKIE_NAME).unwrap().clone();
    assert!(cookie.http_only().unwrap_or(false));
    session.set_version("1.0").await;

    let (_, again) = store.load_or_create(CookieJar::new().add(cookie)).await;
    assert!(Arc::ptr_eq(&session, &again));
    assert_eq!(again.data().await.version.as_deref(), Some("1.0"));
    assert_eq!(store.len().await, 1);
  }

  #[tokio::test]
  async fn unknown_cookie_gets_a_new_session() {
    let store = SessionStore::default();
    let stale = Cookie::new(SESSION_COOKIE_NAME, Uuid::new_v4().to_string());
    let (jar, _) = store.load_or_create(CookieJar::new().add(stale.clone())).await;
    assert_ne!(jar.get(SESSION_COOKIE_NAME).unwrap().value(), stale.value());
  }

  #[tokio::test]
  async fn flush_clears_tokens_and_data() {
    let store = SessionStore::default();
    let (_, session) = store.load_or_create(CookieJar::new()).await;
    session
      .tokens
      .set(
        TokenKind::Backend,
        Token {
          access_token: "abc".to_string(),
          token_type: "Bearer".to_string(),
          expires_at: Utc::now() + Duration::seconds(60),
          refresh_token: None,
          scope: None,
        },
      )
      .await;
    session.set_username(Some("demoapi")).await;
    session.flash("oops").await;

    session.flush().await;
    assert!(session.tokens.get(TokenKind::Backend).await.is_none());
    assert!(session.data().await.username.is_none());
    assert!(session.take_flash().await.is_none());
  }

  #[tokio::test]
  async fn oauth_state_is_single_use() {
    let store = SessionStore::default();
    let (_, session) = store.load_or_create(CookieJar::new()).await;
    session.set_oauth_state("abc").await;
    assert_eq!(session.take_oauth_state().await.as_deref(), Some("abc"));
    assert!(session.take_oauth_state().await.is_none());
  }
}
