//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Install the global fmt subscriber, writing to stderr. `RUST_LOG` wins;
/// otherwise `level` (from `--log-level`) or `info`.
pub fn init(level: Option<&str>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn fallback_filter(level: Option<&str>) -> EnvFilter {
    level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fallback_filter() {
        assert_eq!(fallback_filter(None).to_string(), "info");
        assert_eq!(fallback_filter(Some("debug")).to_string(), "debug");
        assert_eq!(
            fallback_filter(Some("cloudcfg_monitor=trace")).to_string(),
            "cloudcfg_monitor=trace"
        );
    }
}
