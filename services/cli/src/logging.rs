use tracing_subscriber::EnvFilter;

/// Map a configured log level to a filter directive
///
/// Accepts the level names of the settings file (`warning`, `critical`) as
/// well as the tracing ones. Unknown names fall back to `warn`.
pub fn directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "warn",
    }
}

/// Initialize tracing once for the process
///
/// `RUST_LOG` wins over everything; otherwise `-v` selects debug and the
/// configured level is used.
pub fn init(configured_level: &str, verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        directive(configured_level)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // a second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive() {
        assert_eq!(directive("warning"), "warn");
        assert_eq!(directive("CRITICAL"), "error");
        assert_eq!(directive("info"), "info");
        assert_eq!(directive("verbose"), "warn");
    }
}
