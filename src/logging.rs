//! Log subscriber for the CLI and native tests.
//!
//! `RUST_LOG` overrides the filter. Without it the client logs at `info` and
//! the HTTP stack only at `warn`. `SIMPLEBANK_LOG_FORMAT` picks the output
//! (`compact`, `pretty` or `json`); `SIMPLEBANK_LOG_JSON=1` still means `json`.

use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_FILTER: &str = "warn,simplebank=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    /// Unknown names fall back to `Compact`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup("SIMPLEBANK_LOG_FORMAT") {
            Some(name) => Self::from_name(&name),
            None if lookup("SIMPLEBANK_LOG_JSON").as_deref() == Some("1") => LogFormat::Json,
            None => LogFormat::Compact,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Install the stderr subscriber. A second call is a no-op.
pub fn init_logging() {
    init_logging_with(LogFormat::from_env());
}

pub fn init_logging_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn format_selection() {
        assert_eq!(LogFormat::from_lookup(lookup(&[])), LogFormat::Compact);
        assert_eq!(LogFormat::from_lookup(lookup(&[("SIMPLEBANK_LOG_JSON", "1")])), LogFormat::Json);
        assert_eq!(LogFormat::from_lookup(lookup(&[("SIMPLEBANK_LOG_JSON", "0")])), LogFormat::Compact);
        assert_eq!(
            LogFormat::from_lookup(lookup(&[("SIMPLEBANK_LOG_FORMAT", "Pretty"), ("SIMPLEBANK_LOG_JSON", "1")])),
            LogFormat::Pretty
        );
        assert_eq!(LogFormat::from_name("yaml"), LogFormat::Compact);
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logging_with(LogFormat::Compact);
        init_logging_with(LogFormat::Json);
        tracing::info!("logging initialised");
    }
}
