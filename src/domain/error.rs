//! Domain error types.

/// Top-level error type for phoenix.
///
/// Only configuration, upstream data and rule-source failures are errors.
/// A malformed rule or a degenerate series is never an error: the simulation
/// just produces zero trades.
#[derive(Debug, thiserror::Error)]
pub enum PhoenixError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid interval '{value}' (expected one of 1m, 5m, 15m, 1h, 4h, 1d)")]
    InvalidInterval { value: String },

    #[error("invalid range '{value}' (expected <N>d, <N>m or <N>y, e.g. 7d, 6m, 1y)")]
    InvalidRange { value: String },

    #[error("upstream data error: {reason}")]
    Upstream { reason: String },

    #[error("no candles for {asset} ({interval})")]
    NoData { asset: String, interval: String },

    #[error("rule source error: {reason}")]
    RuleSource { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PhoenixError {
    /// True for failures raised before any data is fetched.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PhoenixError::ConfigParse { .. }
                | PhoenixError::ConfigMissing { .. }
                | PhoenixError::ConfigInvalid { .. }
                | PhoenixError::InvalidInterval { .. }
                | PhoenixError::InvalidRange { .. }
        )
    }
}

impl From<&PhoenixError> for std::process::ExitCode {
    fn from(err: &PhoenixError) -> Self {
        let code: u8 = match err {
            PhoenixError::Io(_) | PhoenixError::Report { .. } => 1,
            PhoenixError::ConfigParse { .. }
            | PhoenixError::ConfigMissing { .. }
            | PhoenixError::ConfigInvalid { .. }
            | PhoenixError::InvalidInterval { .. }
            | PhoenixError::InvalidRange { .. } => 2,
            PhoenixError::Upstream { .. } => 3,
            PhoenixError::RuleSource { .. } => 4,
            PhoenixError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_error_message() {
        let err = PhoenixError::InvalidInterval { value: "2h".into() };
        assert!(err.to_string().contains("'2h'"));
        assert!(err.is_config_error());
    }

    #[test]
    fn upstream_is_not_config_error() {
        let err = PhoenixError::Upstream {
            reason: "HTTP 418".into(),
        };
        assert!(!err.is_config_error());
        assert_eq!(err.to_string(), "upstream data error: HTTP 418");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PhoenixError = io.into();
        assert!(matches!(err, PhoenixError::Io(_)));
    }
}
