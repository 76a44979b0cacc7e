//! Host services namespaces are built against, and an in-process host that
//! owns its own address space.
use crate::{NamespaceConfig, NamespaceFactory, NamespaceManager, UaError, UaResult};
use opcua::{
    nodes::DefaultTypeTree,
    server::address_space::{AddressSpace, CoreNamespace},
    sync::RwLock,
    types::{NodeId, ReferenceTypeId},
};
use std::sync::Arc;

/// Services a namespace consumes from its hosting server.
pub trait OpcUaServer: Send + Sync {
    fn namespace_manager(&self) -> Arc<NamespaceManager>;

    /// Make `uri` known to `address_space` and return the index it lives at.
    /// Hosts that assign indices themselves may return another index than
    /// `requested_index`.
    fn register_namespace(
        &self,
        address_space: &mut AddressSpace,
        uri: &str,
        requested_index: u16,
    ) -> UaResult<u16>;

    /// Add a reference whose source may live in another namespace (typically
    /// an `Organizes` edge from the standard `Objects` folder).
    fn add_reference(
        &self,
        address_space: &mut AddressSpace,
        source: &NodeId,
        target: &NodeId,
        reference_type: ReferenceTypeId,
    ) -> UaResult<()>;
}

/// In-process `OpcUaServer` holding the standard namespace and every
/// namespace added to it in a single address space.
pub struct ServerContext {
    address_space: Arc<RwLock<AddressSpace>>,
    namespace_manager: Arc<NamespaceManager>,
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerContext {
    pub fn new() -> Self {
        let mut address_space = AddressSpace::new();
        let mut type_tree = DefaultTypeTree::new();
        address_space.import_node_set(&CoreNamespace, type_tree.namespaces_mut());
        address_space.load_into_type_tree(&mut type_tree);

        Self {
            address_space: Arc::new(RwLock::new(address_space)),
            namespace_manager: Arc::new(NamespaceManager::new(Arc::new(RwLock::new(type_tree)))),
        }
    }

    pub fn address_space(&self) -> &Arc<RwLock<AddressSpace>> {
        &self.address_space
    }

    /// Build a namespace from `config` into this host's address space.
    pub fn add_namespace(
        &self,
        factory: &dyn NamespaceFactory,
        config: Arc<dyn NamespaceConfig>,
    ) -> UaResult<Arc<dyn crate::Namespace>> {
        let namespace = {
            let mut address_space = self.address_space.write();
            factory.create_namespace(self, config, &mut address_space)?
        };
        namespace.on_attached(&self.address_space, None);
        Ok(namespace)
    }
}

impl OpcUaServer for ServerContext {
    fn namespace_manager(&self) -> Arc<NamespaceManager> {
        Arc::clone(&self.namespace_manager)
    }

    fn register_namespace(
        &self,
        address_space: &mut AddressSpace,
        uri: &str,
        requested_index: u16,
    ) -> UaResult<u16> {
        self.namespace_manager.check_available(requested_index, uri)?;
        if address_space.namespace_index(uri).is_none() {
            address_space.add_namespace(uri, requested_index);
        }
        Ok(requested_index)
    }

    fn add_reference(
        &self,
        address_space: &mut AddressSpace,
        source: &NodeId,
        target: &NodeId,
        reference_type: ReferenceTypeId,
    ) -> UaResult<()> {
        for node_id in [source, target] {
            if !address_space.node_exists(node_id) {
                return Err(UaError::NodeIdUnknown {
                    node_id: node_id.clone(),
                });
            }
        }
        if source == target || address_space.has_reference(source, target, reference_type) {
            return Err(UaError::DuplicateReference {
                source_node_id: source.clone(),
                target_node_id: target.clone(),
            });
        }
        address_space.insert_reference(source, target, reference_type);
        Ok(())
    }
}
