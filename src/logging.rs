use env_logger::Env;

/// Installs the stderr logger used by the command line tools.
///
/// The level comes from `RUST_LOG` and defaults to `info`.
pub fn init_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}
