use serde::{Deserialize, Serialize};
use ua_sdk::{NamespaceConfig, UaError, UaResult};

/// CTT namespace configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CttNamespaceConfig {
    /// Namespace URI registered with the namespace manager.
    #[serde(default = "CttNamespaceConfig::default_namespace_uri")]
    pub namespace_uri: String,

    /// Namespace index; must not be 0.
    #[serde(default = "CttNamespaceConfig::default_namespace_index")]
    pub namespace_index: u16,

    /// Name of the root folder below `Objects`, also the first segment of
    /// every node id path.
    #[serde(default = "CttNamespaceConfig::default_root_name")]
    pub root_name: String,

    /// Floor applied to requested sampling intervals (ms).
    #[serde(default = "CttNamespaceConfig::default_min_sampling_interval")]
    pub min_sampling_interval: f64,
}

impl CttNamespaceConfig {
    fn default_namespace_uri() -> String {
        "ctt".to_string()
    }
    fn default_namespace_index() -> u16 {
        2
    }
    fn default_root_name() -> String {
        "CTT".to_string()
    }
    fn default_min_sampling_interval() -> f64 {
        100.0
    }

    pub fn validate(&self) -> UaResult<()> {
        let invalid = |message: &str| {
            Err(UaError::ConfigurationError {
                message: message.to_string(),
            })
        };
        if self.namespace_index == 0 {
            return invalid("namespaceIndex 0 is reserved for the standard namespace");
        }
        if self.namespace_uri.trim().is_empty() {
            return invalid("namespaceUri must not be empty");
        }
        if self.root_name.trim().is_empty() {
            return invalid("rootName must not be empty");
        }
        if !self.min_sampling_interval.is_finite() || self.min_sampling_interval < 0.0 {
            return invalid("minSamplingInterval must be a finite, non-negative number");
        }
        Ok(())
    }
}

impl Default for CttNamespaceConfig {
    fn default() -> Self {
        Self {
            namespace_uri: CttNamespaceConfig::default_namespace_uri(),
            namespace_index: CttNamespaceConfig::default_namespace_index(),
            root_name: CttNamespaceConfig::default_root_name(),
            min_sampling_interval: CttNamespaceConfig::default_min_sampling_interval(),
        }
    }
}

impl NamespaceConfig for CttNamespaceConfig {}
