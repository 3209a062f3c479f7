mod app;
pub use app::App;

use mentex_experiment::SessionConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // optional path to a JSON config; everything else is defaulted
    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };

    let app = App::new(config)?;
    app.run()?;

    Ok(())
}
