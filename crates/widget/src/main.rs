use solva_widget::app;
use solva_widget::settings::SettingsStore;
use tracing_subscriber::EnvFilter;

/// Terminal entry point.
///
/// Logs go to stderr so the conversation on stdout stays readable; set
/// `RUST_LOG=debug` to follow the reply pipeline.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let store = SettingsStore::load();
    if let Err(error) = app::run(store).await {
        tracing::error!("chat host failed: {}", error);
        std::process::exit(1);
    }
}
