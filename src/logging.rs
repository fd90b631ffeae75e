use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides the log filter
pub const LOG_ENV_VAR: &str = "HACKJUDGE_LOG";

/// Filter used when `HACKJUDGE_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "hackjudge=debug"
    } else {
        "hackjudge=warn"
    }
}

/// Initialize structured logging to stderr.
///
/// Calling this twice is harmless; the second call reports an error that
/// callers may ignore.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(crate::output::should_use_colors()),
        )
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "hackjudge=warn");
        assert_eq!(default_directive(true), "hackjudge=debug");
    }
}
