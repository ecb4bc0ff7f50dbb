use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Diagnostics go to stderr so that interactive output and the generated
/// configuration stay clean on stdout.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
