use crate::constants::MAX_USERNAME_LEN;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Debug, Clone, Validate)]
/// Embed options form posted to the home page. Unchecked boxes are absent from the body.
pub struct HomeForm {
  #[serde(default)]
  #[validate(length(max = MAX_USERNAME_LEN))]
  pub username: String,
  #[validate(length(min = 1))]
  pub lang: String,
  pub css: Option<String>,
  pub skip_recipients_step: Option<String>,
  pub auth_code_grant: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
/// Query of the home page, also the authorization code callback
pub struct HomeQuery {
  pub code: Option<String>,
  pub state: Option<String>,
  pub error: Option<String>,
  pub error_description: Option<String>,
}
