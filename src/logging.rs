use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// The filter used when `RUST_LOG` is unset, by `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "regsweep=warn",
        1 => "regsweep=info",
        2 => "regsweep=debug",
        _ => "regsweep=trace",
    }
}

/// Installs a stderr subscriber so diagnostics never mix with event output.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(verbosity: u8) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "regsweep=warn");
        assert_eq!(default_directive(2), "regsweep=debug");
        assert_eq!(default_directive(9), "regsweep=trace");
    }
}
