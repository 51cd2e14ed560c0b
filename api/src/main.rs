use clap::Parser;

use pos_backend::build_rocket;
use pos_backend::config::Config;
use pos_backend::logger::init_logger;
use pos_backend::state::AppState;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let config = Config::parse();
    init_logger(&config.log_level);

    let state = AppState::from_config(&config).await?;
    tracing::info!(storage = ?config.storage, "starting pos-backend");

    let _ = build_rocket(state).launch().await?;
    Ok(())
}
