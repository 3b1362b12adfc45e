mod embed;
mod flow;
mod force_update;
mod health_check;
mod home;
mod login_integration;
mod request;
mod response;

pub use embed::embed;
pub use force_update::force_update;
pub use health_check::health_check;
pub use home::{home_get, home_post};
pub use login_integration::login_integration;
