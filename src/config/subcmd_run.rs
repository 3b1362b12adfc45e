use super::{verify_url, ClapSubCommand};
use crate::{
  constants::{
    CLIENT_ID_VAR, CLIENT_SECRET_VAR, DEFAULT_ADDRESS, DEFAULT_APP_VERSION, DEFAULT_LOCALE_LIST, DEFAULT_PORT,
  },
  error::*,
  log::*,
  state::{AppState, DemoSettings, UserFlow},
};
use async_trait::async_trait;
use clap::{value_parser, Arg, ArgMatches, Command};
use libclient::{
  Credential, EmbedConfig, OAuthConfig, DEFAULT_API_BASE_URL, DEFAULT_SCOPE, ENDPOINT_EMBED_PATH,
};
use std::{env, net::IpAddr, net::SocketAddr};

pub(super) struct Run {}

#[async_trait]
impl ClapSubCommand for Run {
  fn subcmd() -> Command {
    Command::new("run").about("Run the embedded newsletter demo")
      .arg(
        Arg::new("listen_address")
          .short('l')
          .long("listen-address")
          .value_name("ADDRESS")
          .default_value(DEFAULT_ADDRESS)
          .help("Listen address"),
      )
      .arg(
        Arg::new("port")
          .short('p')
          .long("port")
          .value_name("PORT")
          .default_value(DEFAULT_PORT)
          .help("Listen port"),
      )
      .arg(
        Arg::new("api_base_url")
          .short('a')
          .long("api-base-url")
          .value_parser(verify_url)
          .value_name("URL")
          .default_value(DEFAULT_API_BASE_URL)
          .help("Base url of the MailMojo API"),
      )
      .arg(
        Arg::new("client_id")
          .long("client-id")
          .value_name("ID")
          .help(format!("OAuth2 client id. Read from {CLIENT_ID_VAR} if not specified.")),
      )
      .arg(
        Arg::new("client_secret")
          .long("client-secret")
          .value_name("SECRET")
          .help(format!("OAuth2 client secret. Read from {CLIENT_SECRET_VAR} if not specified.")),
      )
      .arg(
        Arg::new("locales")
          .long("locales")
          .value_name("LOCALES")
          .default_value(DEFAULT_LOCALE_LIST)
          .help("Locales offered in the form, split with comma like 'en,nb'"),
      )
      .arg(
        Arg::new("css_url")
          .long("css-url")
          .value_parser(verify_url)
          .value_name("URL")
          .help("Stylesheet injected into the embed when custom CSS is checked"),
      )
      .arg(
        Arg::new("user_ip")
          .long("user-ip")
          .value_parser(value_parser!(IpAddr))
          .value_name("IP")
          .help("End-user ip sent to the API instead of the browser address. For local development."),
      )
      .arg(
        Arg::new("user_flow")
          .long("user-flow")
          .value_parser(["grant-code", "password"])
          .value_name("FLOW")
          .default_value("grant-code")
          .help("How user tokens are obtained for a username"),
      )
      .arg(
        Arg::new("scope")
          .long("scope")
          .value_name("SCOPE")
          .default_value(DEFAULT_SCOPE)
          .help("Scope requested for backend tokens and authorization"),
      )
      .arg(
        Arg::new("embed_path")
          .long("embed-path")
          .value_name("PATH")
          .default_value(ENDPOINT_EMBED_PATH)
          .help("Embed endpoint path relative to the API base url"),
      )
      .arg(
        Arg::new("app_version")
          .long("app-version")
          .value_name("VERSION")
          .default_value(DEFAULT_APP_VERSION)
          .help("Session version. Sessions of another version are reset."),
      )
      .arg(
        Arg::new("public_url")
          .long("public-url")
          .value_parser(verify_url)
          .value_name("URL")
          .help("Externally visible url of this app, used as redirect uri. Derived from the Host header if not specified."),
      )
  }

  async fn exec_matches(sub_m: &ArgMatches) -> Result<AppState> {
    let RunOptions {
      listen_socket,
      settings,
      oauth_config,
      embed_config,
    } = RunOptions::from_matches(sub_m)?;

    info!(
      "Using API at {} with {} user flow",
      oauth_config.api_base(),
      match settings.user_flow {
        UserFlow::GrantCode => "grant code",
        UserFlow::Password => "password",
      }
    );
    AppState::new(listen_socket, settings, &oauth_config, &embed_config)
  }
}

/// Everything the `run` subcommand configures
struct RunOptions {
  listen_socket: SocketAddr,
  settings: DemoSettings,
  oauth_config: OAuthConfig,
  embed_config: EmbedConfig,
}

impl RunOptions {
  fn from_matches(sub_m: &ArgMatches) -> Result<Self> {
    let Some(address) = sub_m.get_one::<String>("listen_address") else {
      bail!("Listen address must be specified");
    };
    let Some(port) = sub_m.get_one::<String>("port") else {
      bail!("Port must be specified");
    };
    let listen_socket = format!("{}:{}", address, port).parse::<SocketAddr>()?;

    let client_id = arg_or_env(sub_m, "client_id", CLIENT_ID_VAR);
    let client_secret = arg_or_env(sub_m, "client_secret", CLIENT_SECRET_VAR);
    let credential = Credential::new(client_id, client_secret)?;

    let Some(api_base_url) = sub_m.get_one::<String>("api_base_url") else {
      bail!("API base url must be specified");
    };
    let oauth_config = OAuthConfig::new(credential, api_base_url)?;

    let allowed_locales = sub_m
      .get_one::<String>("locales")
      .map(|s| {
        s.split(',')
          .map(|l| l.trim().to_string())
          .filter(|l| !l.is_empty())
          .collect::<Vec<_>>()
      })
      .unwrap_or_default();
    ensure!(!allowed_locales.is_empty(), "At least one locale must be specified");

    let Some(endpoint_path) = sub_m.get_one::<String>("embed_path") else {
      bail!("Embed path must be specified");
    };
    let embed_config = EmbedConfig {
      endpoint_path: endpoint_path.to_string(),
      allowed_locales,
    };

    let user_flow = match sub_m.get_one::<String>("user_flow") {
      Some(f) => f.parse::<UserFlow>()?,
      None => UserFlow::GrantCode,
    };
    let settings = DemoSettings {
      app_version: required(sub_m, "app_version")?,
      scope: required(sub_m, "scope")?,
      user_flow,
      css_url: sub_m.get_one::<String>("css_url").cloned(),
      user_ip: sub_m.get_one::<IpAddr>("user_ip").copied(),
      public_url: sub_m.get_one::<String>("public_url").cloned(),
    };

    Ok(Self {
      listen_socket,
      settings,
      oauth_config,
      embed_config,
    })
  }
}

fn required(sub_m: &ArgMatches, id: &str) -> Result<String> {
  sub_m
    .get_one::<String>(id)
    .cloned()
    .ok_or_else(|| anyhow!("{id} must be specified"))
}

/// Command line value, falling back to the environment variable
fn arg_or_env(sub_m: &ArgMatches, id: &str, var: &str) -> String {
  sub_m
    .get_one::<String>(id)
    .cloned()
    .or_else(|| env::var(var).ok())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Result<RunOptions> {
    let matches = Run::subcmd().try_get_matches_from(std::iter::once("run").chain(args.iter().copied()))?;
    RunOptions::from_matches(&matches)
  }

  #[test]
  fn defaults_are_applied() {
    let options = parse(&["--client-id", "id", "--client-secret", "secret"]).unwrap();
    assert_eq!(options.listen_socket, "127.0.0.1:8000".parse().unwrap());
    assert_eq!(options.oauth_config.api_base().as_str(), "https://api.mailmojo.no/");
    assert_eq!(options.embed_config.allowed_locales, vec!["en", "nb"]);
    assert_eq!(options.embed_config.endpoint_path, "v1/embed/");
    assert_eq!(options.settings.scope, "embed_newsletter_creation");
    assert_eq!(options.settings.app_version, "1.0");
    assert_eq!(options.settings.user_flow, UserFlow::GrantCode);
    assert!(options.settings.user_ip.is_none());
  }

  #[test]
  fn options_are_parsed() {
    let options = parse(&[
      "--client-id",
      "id",
      "--client-secret",
      "secret",
      "--api-base-url",
      "http://localhost:9000/api",
      "--locales",
      "nb, en ,",
      "--user-ip",
      "192.0.2.10",
      "--user-flow",
      "password",
      "--css-url",
      "https://cdn.example.com/theme.css",
    ])
    .unwrap();
    assert_eq!(options.oauth_config.api_base().as_str(), "http://localhost:9000/api/");
    assert_eq!(options.embed_config.allowed_locales, vec!["nb", "en"]);
    assert_eq!(options.settings.user_ip, Some("192.0.2.10".parse().unwrap()));
    assert_eq!(options.settings.user_flow, UserFlow::Password);
    assert_eq!(
      options.settings.css_url.as_deref(),
      Some("https://cdn.example.com/theme.css")
    );
  }

  #[test]
  fn invalid_values_are_rejected() {
    assert!(parse(&["--client-id", "id", "--client-secret", "s", "--api-base-url", "ftp://x"]).is_err());
    assert!(parse(&["--client-id", "id", "--client-secret", "s", "--locales", " , "]).is_err());
    assert!(parse(&["--client-id", "id", "--client-secret", "s", "--user-flow", "implicit"]).is_err());
  }

  #[test]
  fn empty_credential_is_a_configuration_error() {
    let err = parse(&["--client-id", "", "--client-secret", "secret"]).err().unwrap();
    assert!(matches!(
      err.downcast_ref::<libclient::ClientError>(),
      Some(libclient::ClientError::ConfigurationError(_))
    ));
  }
}
