//! Logging setup
//!
//! Terraform captures the plugin's stderr, so log lines go there with the
//! level taken from `TF_LOG`.

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";

/// `EnvFilter` directive for a `TF_LOG` value
fn filter_directive(tf_log: Option<&str>) -> String {
    match tf_log.map(|level| level.trim().to_ascii_lowercase()) {
        Some(level) if ["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) => level,
        // TF_LOG=JSON means trace output in Terraform's own logs
        Some(level) if level == "json" => "trace".to_string(),
        _ => DEFAULT_LEVEL.to_string(),
    }
}

/// Install the global subscriber. Later calls keep the first one.
pub fn init() {
    let directive = filter_directive(std::env::var("TF_LOG").ok().as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level = %directive, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tf_log_levels_map_to_filters() {
        assert_eq!(filter_directive(Some("DEBUG")), "debug");
        assert_eq!(filter_directive(Some(" trace ")), "trace");
        assert_eq!(filter_directive(Some("JSON")), "trace");
        assert_eq!(filter_directive(Some("verbose")), "warn");
        assert_eq!(filter_directive(None), "warn");
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
