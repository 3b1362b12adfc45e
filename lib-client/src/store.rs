use crate::{
  error::*,
  log::*,
  token::{Token, TokenKind},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{collections::HashMap, future::Future};
use tokio::sync::RwLock;

/// Key-value storage of tokens by kind, typically scoped to one end-user session.
/// Only single-key atomicity is expected from implementations.
#[async_trait]
pub trait TokenStore: Send + Sync {
  async fn get(&self, kind: TokenKind) -> Option<Token>;
  async fn set(&self, kind: TokenKind, token: Token);
  async fn delete(&self, kind: TokenKind);

  /// Delete every kind of token
  async fn clear(&self) {
    for kind in TokenKind::ALL {
      self.delete(kind).await;
    }
  }
}

#[derive(Debug, Default)]
/// In-memory token store
pub struct MemoryTokenStore {
  inner: RwLock<HashMap<TokenKind, Token>>,
}

impl MemoryTokenStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
  async fn get(&self, kind: TokenKind) -> Option<Token> {
    let lock = self.inner.read().await;
    lock.get(&kind).cloned()
  }
  async fn set(&self, kind: TokenKind, token: Token) {
    let mut lock = self.inner.write().await;
    lock.insert(kind, token);
  }
  async fn delete(&self, kind: TokenKind) {
    let mut lock = self.inner.write().await;
    lock.remove(&kind);
  }
  async fn clear(&self) {
    let mut lock = self.inner.write().await;
    lock.clear();
  }
}

/// Return the stored token of `kind` if it is still valid. Otherwise call `refresh_fn` once
/// with the stale token (if any), store its result and return it.
pub async fn ensure_valid<S, F, Fut>(store: &S, kind: TokenKind, refresh_fn: F) -> ClientResult<Token>
where
  S: TokenStore + ?Sized,
  F: FnOnce(Option<Token>) -> Fut,
  Fut: Future<Output = ClientResult<Token>>,
{
  ensure_valid_at(store, kind, Utc::now(), refresh_fn).await
}

/// [`ensure_valid`] evaluated at a given instant
pub async fn ensure_valid_at<S, F, Fut>(
  store: &S,
  kind: TokenKind,
  now: DateTime<Utc>,
  refresh_fn: F,
) -> ClientResult<Token>
where
  S: TokenStore + ?Sized,
  F: FnOnce(Option<Token>) -> Fut,
  Fut: Future<Output = ClientResult<Token>>,
{
  let current = store.get(kind).await;
  match current.as_ref() {
    Some(token) if token.is_valid_at(now) => {
      debug!(
        "{kind} token still valid for {} seconds",
        token.remaining_seconds_at(now)
      );
      return Ok(token.clone());
    }
    Some(_) => debug!("{kind} token expired"),
    None => debug!("No {kind} token stored"),
  }

  let token = refresh_fn(current).await?;
  store.set(kind, token.clone()).await;
  info!("{kind} token stored, expires at {}", token.expires_at);

  Ok(token)
}

/// Explicit reset of one token kind
pub async fn invalidate<S>(store: &S, kind: TokenKind)
where
  S: TokenStore + ?Sized,
{
  store.delete(kind).await;
  debug!("{kind} token invalidated");
}

/// Explicit reset of every token kind
pub async fn invalidate_all<S>(store: &S)
where
  S: TokenStore + ?Sized,
{
  store.clear().await;
  debug!("All tokens invalidated");
}
