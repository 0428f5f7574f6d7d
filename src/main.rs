use site_analyzer::{config::Settings, lifecycle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` may set RUST_LOG, so it is read before logging starts and
    // reported after.
    let dotenv = dotenv::dotenv();
    lifecycle::init_logging();
    if let Err(e) = dotenv {
        log::debug!("No .env file loaded: {}", e);
    }

    let settings = Settings::from_env()?;
    lifecycle::run(settings).await
}
