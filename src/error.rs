use crate::config::ConfigError;
use crate::store::DataAccessError;

/// System metrics could not be synthesized
#[derive(Debug)]
pub enum SynthesisError {
    /// The read snapshot could not be acquired
    Snapshot(DataAccessError),
    /// A constituent computation failed
    Metric {
        metric: &'static str,
        source: DataAccessError,
    },
}

impl SynthesisError {
    pub fn metric(&self) -> Option<&'static str> {
        match self {
            SynthesisError::Snapshot(_) => None,
            SynthesisError::Metric { metric, .. } => Some(metric),
        }
    }
}

impl std::fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisError::Snapshot(e) => write!(f, "System metrics snapshot failed: {}", e),
            SynthesisError::Metric { metric, source } => {
                write!(f, "System metric '{}' failed: {}", metric, source)
            }
        }
    }
}

impl std::error::Error for SynthesisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthesisError::Snapshot(e) | SynthesisError::Metric { source: e, .. } => Some(e),
        }
    }
}

#[derive(Debug)]
pub enum AnalyticsError {
    DataAccess(DataAccessError),
    Synthesis(SynthesisError),
    Config(ConfigError),
    UnknownReport(String),
    Serialization(serde_json::Error),
}

impl From<DataAccessError> for AnalyticsError {
    fn from(err: DataAccessError) -> Self {
        AnalyticsError::DataAccess(err)
    }
}

impl From<SynthesisError> for AnalyticsError {
    fn from(err: SynthesisError) -> Self {
        AnalyticsError::Synthesis(err)
    }
}

impl From<ConfigError> for AnalyticsError {
    fn from(err: ConfigError) -> Self {
        AnalyticsError::Config(err)
    }
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::Serialization(err)
    }
}

impl std::fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyticsError::DataAccess(e) => write!(f, "Data access error: {}", e),
            AnalyticsError::Synthesis(e) => write!(f, "{}", e),
            AnalyticsError::Config(e) => write!(f, "{}", e),
            AnalyticsError::UnknownReport(name) => write!(f, "Unknown report: {}", name),
            AnalyticsError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for AnalyticsError {}
