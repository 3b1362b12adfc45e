use crate::{constants::*, token::Token};
use std::fmt;

#[derive(Clone)]
/// Strategy used to acquire a token from the token endpoint
pub enum TokenGrant {
  /// Token of the integration partner itself
  ClientCredentials { scope: String },
  /// Legacy resource owner password grant
  Password { username: String, password: String },
  /// Grant code issued for `username` on behalf of the backend token, then redeemed once
  GrantCode { username: String, backend_token: Token },
  /// Code returned to `redirect_uri` after the browser authorization flow
  AuthorizationCode { code: String, redirect_uri: String },
  Refresh { refresh_token: String },
}

impl TokenGrant {
  /// `grant_type` finally sent to the token endpoint
  pub fn grant_type(&self) -> &'static str {
    match self {
      TokenGrant::ClientCredentials { .. } => GRANT_TYPE_CLIENT_CREDENTIALS,
      TokenGrant::Password { .. } => GRANT_TYPE_PASSWORD,
      TokenGrant::GrantCode { .. } | TokenGrant::AuthorizationCode { .. } => GRANT_TYPE_AUTHORIZATION_CODE,
      TokenGrant::Refresh { .. } => GRANT_TYPE_REFRESH_TOKEN,
    }
  }
}

impl fmt::Display for TokenGrant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TokenGrant::ClientCredentials { .. } => "client credentials",
      TokenGrant::Password { .. } => "password",
      TokenGrant::GrantCode { .. } => "grant code",
      TokenGrant::AuthorizationCode { .. } => "authorization code",
      TokenGrant::Refresh { .. } => "refresh token",
    };
    f.write_str(name)
  }
}

impl fmt::Debug for TokenGrant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TokenGrant::ClientCredentials { scope } => f.debug_struct("ClientCredentials").field("scope", scope).finish(),
      TokenGrant::Password { username, .. } => f
        .debug_struct("Password")
        .field("username", username)
        .finish_non_exhaustive(),
      TokenGrant::GrantCode { username, .. } => f
        .debug_struct("GrantCode")
        .field("username", username)
        .finish_non_exhaustive(),
      TokenGrant::AuthorizationCode { redirect_uri, .. } => f
        .debug_struct("AuthorizationCode")
        .field("redirect_uri", redirect_uri)
        .finish_non_exhaustive(),
      TokenGrant::Refresh { .. } => f.debug_struct("Refresh").finish_non_exhaustive(),
    }
  }
}
