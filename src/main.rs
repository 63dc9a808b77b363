//! Binary entry point: load configuration, open the content database and
//! drive the Ratatui event loop until the user exits.
use anyhow::Context;
use daily_bread::{logging, run_app, App, AppConfig, ContentStore, SqliteStore};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let data_dir = config
        .resolved_data_dir()
        .context("failed to locate the data directory")?;
    let log_path = logging::init(&data_dir, &config.log_filter)?;
    info!(log = %log_path.display(), "starting daily-bread");

    let store = SqliteStore::open_default(&config).context("failed to open content database")?;
    let mut app = App::new(ContentStore::new(store), &config, data_dir)?;
    run_app(&mut app)
}
