use super::{config::CttNamespaceConfig, namespace::CttNamespace};
use opcua::server::address_space::AddressSpace;
use std::sync::Arc;
use ua_sdk::{Namespace, NamespaceConfig, NamespaceFactory, OpcUaServer, UaError, UaResult};

#[derive(Debug, Clone, Default)]
pub struct CttNamespaceFactory;

impl NamespaceFactory for CttNamespaceFactory {
    fn convert_namespace_config(
        &self,
        config: serde_json::Value,
    ) -> UaResult<Arc<dyn NamespaceConfig>> {
        let config: CttNamespaceConfig = serde_json::from_value(config)?;
        config.validate()?;
        Ok(Arc::new(config))
    }

    fn create_namespace(
        &self,
        server: &dyn OpcUaServer,
        config: Arc<dyn NamespaceConfig>,
        address_space: &mut AddressSpace,
    ) -> UaResult<Arc<dyn Namespace>> {
        let config = config
            .downcast_arc::<CttNamespaceConfig>()
            .map_err(|_| UaError::ConfigurationError {
                message: "expected a CTT namespace configuration".to_string(),
            })?;
        let namespace = CttNamespace::register(server, config, address_space)?;
        Ok(namespace as Arc<dyn Namespace>)
    }
}
