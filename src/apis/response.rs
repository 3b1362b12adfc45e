use crate::templates::render_error;
use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use libclient::ClientError;

#[derive(Debug)]
/// Failure of a page handler that cannot be shown as a flash message on the form
pub enum PageError {
  BackendTokenUnavailable(ClientError),
  EmbedUnavailable(ClientError),
}

impl IntoResponse for PageError {
  fn into_response(self) -> Response {
    let (status, title, err) = match self {
      PageError::BackendTokenUnavailable(e) => (StatusCode::BAD_GATEWAY, "Backend token unavailable", e),
      PageError::EmbedUnavailable(e) => {
        let status = match e {
          ClientError::InvalidEmbedRequest(_) => StatusCode::BAD_REQUEST,
          ClientError::ConfigurationError(_) | ClientError::UrlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
          _ => StatusCode::BAD_GATEWAY,
        };
        (status, "Embed session unavailable", e)
      }
    };
    (status, Html(render_error(title, &err.to_string()))).into_response()
  }
}
