/// Entry point of the reloader.
///
/// All settings come from environment variables, see [`reloadwatch::config`]. Log
/// verbosity follows `RUST_LOG` and defaults to `info`.
///
/// # Examples
///
/// ```bash
/// RELOAD_CONTAINER=web RELOAD_DIR=/app/src cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    reloadwatch::run().await?;
    Ok(())
}
