pub const THREAD_NAME: &str = "embed_demo";

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "8000";
pub const DEFAULT_LOCALE_LIST: &str = "en,nb";

/// Version stamped into every session. Sessions created under another version are flushed.
pub const DEFAULT_APP_VERSION: &str = "1.0";

// Credential environment variables, read when not given on the command line
pub const CLIENT_ID_VAR: &str = "MAILMOJO_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "MAILMOJO_CLIENT_SECRET";

// Session settings
pub const SESSION_COOKIE_NAME: &str = "embed_demo_session";
/// Sessions untouched for this long are dropped
pub const SESSION_IDLE_TIMEOUT_HOURS: i64 = 24;

// Routes
pub const HOME_PATH: &str = "/";
pub const EMBED_PATH: &str = "/embed/";
pub const FORCE_UPDATE_PATH: &str = "/force-update/";
pub const LOGIN_INTEGRATION_PATH: &str = "/login-integration/";
pub const HEALTH_PATH: &str = "/health";

/// Maximum length of a username accepted by the form
pub const MAX_USERNAME_LEN: u64 = 150;
