use super::{subcmd_run::Run, ClapSubCommand};
use crate::{error::*, log::*, state::AppState};
use clap::command;

pub async fn parse_opts() -> Result<AppState> {
  let _ = include_str!("../../Cargo.toml");

  // credentials may come from a .env file during development
  match dotenvy::dotenv() {
    Ok(path) => info!("Loaded environment from {}", path.display()),
    Err(e) if e.not_found() => (),
    Err(e) => bail!("Failed to load .env file: {e}"),
  }

  let options = command!().subcommand_required(true).subcommand(Run::subcmd());

  let matches = options.get_matches();

  match matches.subcommand() {
    Some(("run", sub_m)) => {
      let res = Run::exec_matches(sub_m).await?;
      Ok(res)
    }
    _ => {
      bail!("none");
    }
  }
}
