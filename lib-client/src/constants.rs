pub const ENDPOINT_TOKEN_PATH: &str = "oauth/token";
pub const ENDPOINT_GRANT_CODE_PATH: &str = "oauth/grant_code";
pub const ENDPOINT_AUTHORIZE_PATH: &str = "oauth/authorize";
/// Embed endpoint of the versioned API. Older deployments expose it at `embed`.
pub const ENDPOINT_EMBED_PATH: &str = "v1/embed/";

pub const DEFAULT_API_BASE_URL: &str = "https://api.mailmojo.no";
/// Scope required to create newsletter embed sessions
pub const DEFAULT_SCOPE: &str = "embed_newsletter_creation";
pub const DEFAULT_LOCALES: &[&str] = &["en", "nb"];

pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const GRANT_TYPE_PASSWORD: &str = "password";
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";

pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

#[cfg(feature = "reqwest")]
/// Default timeout of a single outbound request in seconds
pub const HTTP_TIMEOUT_SEC: u64 = 10;
