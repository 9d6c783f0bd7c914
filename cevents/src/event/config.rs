//! Event configuration contract
//!
//! Every CEvent carries a configuration object. The only thing the scheduler
//! needs to know about it is how many raw command tokens the event's parser
//! consumes and how to describe those tokens in a usage line.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared, immutable handle to a configuration instance.
///
/// A new instance is produced for every parse; nothing mutates one in place.
pub type SharedConfig = Arc<dyn CEventConfig>;

/// Result type for config parsing
pub type ConfigResult = Result<SharedConfig, ConfigError>;

/// Minimal shape every event configuration satisfies.
pub trait CEventConfig: Any + fmt::Debug + Send + Sync {
    /// Number of raw tokens the owning event's parser consumes.
    fn expected_args(&self) -> usize;

    /// Argument list appended to the queue command usage, e.g. `<medkits> <colas>`.
    fn usage(&self) -> &str;

    /// Upcast used by [`downcast_ref`](dyn CEventConfig::downcast_ref).
    fn as_any(&self) -> &dyn Any;
}

impl dyn CEventConfig {
    /// Typed access to a concrete config.
    pub fn downcast_ref<T: CEventConfig>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether this config is of type `T`.
    pub fn is<T: CEventConfig>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Config for events that take no arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoConfig;

impl CEventConfig for NoConfig {
    fn expected_args(&self) -> usize {
        0
    }

    fn usage(&self) -> &str {
        ""
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Content validation failure reported by an event's parser.
///
/// The message is shown verbatim to whoever issued the queue command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Rounds(u32);

    impl CEventConfig for Rounds {
        fn expected_args(&self) -> usize {
            1
        }

        fn usage(&self) -> &str {
            "<rounds>"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_no_config_contract() {
        assert_eq!(NoConfig.expected_args(), 0);
        assert_eq!(NoConfig.usage(), "");
    }

    #[test]
    fn test_downcast_shared_config() {
        let config: SharedConfig = Arc::new(Rounds(4));
        assert!(config.is::<Rounds>());
        assert!(!config.is::<NoConfig>());
        assert_eq!(config.downcast_ref::<Rounds>(), Some(&Rounds(4)));
        assert_eq!(config.usage(), "<rounds>");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::new("Medkits must be an integer.");
        assert_eq!(err.to_string(), "Medkits must be an integer.");
        assert_eq!(err.message(), "Medkits must be an integer.");
    }
}
