mod apis;
mod config;
mod constants;
mod error;
mod log;
mod session;
mod state;
mod templates;

use crate::{
  apis::{embed, force_update, health_check, home_get, home_post, login_integration},
  constants::*,
  error::*,
  log::*,
  state::AppState,
};
use axum::{routing::get, Router};
use config::parse_opts;
use std::{net::SocketAddr, sync::Arc};
use tokio::runtime::Builder;

fn main() -> Result<()> {
  init_logger();

  let mut runtime_builder = Builder::new_multi_thread();
  runtime_builder.enable_all();
  runtime_builder.thread_name(THREAD_NAME);
  let runtime = runtime_builder.build()?;

  runtime.block_on(async {
    match parse_opts().await {
      Ok(shared_state) => {
        if let Err(e) = serve(Arc::new(shared_state)).await {
          error!("Server is down!: {e}");
        }
      }
      Err(e) => {
        error!("{e}");
      }
    };
  });

  Ok(())
}

fn build_router(shared_state: Arc<AppState>) -> Router {
  Router::new()
    .route(HOME_PATH, get(home_get).post(home_post))
    .route(LOGIN_INTEGRATION_PATH, get(login_integration))
    .route(EMBED_PATH, get(embed))
    .route(FORCE_UPDATE_PATH, get(force_update).post(force_update))
    .route(HEALTH_PATH, get(health_check))
    .with_state(shared_state)
}

async fn serve(shared_state: Arc<AppState>) -> Result<()> {
  let addr = shared_state.listen_socket;
  let tcp_listener = tokio::net::TcpListener::bind(&addr)
    .await
    .with_context(|| format!("Failed to bind {addr}"))?;
  info!("Listening on {}", &addr);

  // peer address is the end-user ip of embed sessions
  let router = build_router(shared_state).into_make_service_with_connect_info::<SocketAddr>();
  axum::serve(tcp_listener, router).await?;
  Ok(())
}
