use crate::{
    attributes, method, CallMethodRequest, CallMethodResult, Namespace, UaError, UaResult,
};
use opcua::{
    nodes::{DefaultTypeTree, NodeType, TypeTree},
    server::address_space::AddressSpace,
    sync::RwLock,
    types::{NodeId, Variant},
};
use std::{collections::BTreeMap, sync::Arc};

/// Uri of the standard namespace, always at index 0.
pub const OPC_UA_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

struct Registry {
    namespaces: BTreeMap<u16, Arc<dyn Namespace>>,
    uris: BTreeMap<u16, String>,
}

impl Registry {
    fn conflicts(&self, index: u16, uri: &str) -> bool {
        if index == 0 {
            return uri != OPC_UA_NAMESPACE_URI || self.namespaces.contains_key(&0);
        }
        self.uris.contains_key(&index) || self.uris.values().any(|u| u == uri)
    }
}

/// Registry of namespaces by index, plus the server-wide type tree and
/// method-call routing.
pub struct NamespaceManager {
    registry: RwLock<Registry>,
    type_tree: Arc<RwLock<DefaultTypeTree>>,
}

impl NamespaceManager {
    pub fn new(type_tree: Arc<RwLock<DefaultTypeTree>>) -> Self {
        let mut uris = BTreeMap::new();
        uris.insert(0, OPC_UA_NAMESPACE_URI.to_string());
        Self {
            registry: RwLock::new(Registry {
                namespaces: BTreeMap::new(),
                uris,
            }),
            type_tree,
        }
    }

    /// Whether `index` and `uri` could be registered right now.
    pub fn check_available(&self, index: u16, uri: &str) -> UaResult<()> {
        if self.registry.read().conflicts(index, uri) {
            return Err(UaError::NamespaceConflict {
                index,
                uri: uri.to_string(),
            });
        }
        Ok(())
    }

    /// Register a namespace under its own index and uri.
    ///
    /// Fails when either is taken. Index 0 may only carry the standard uri.
    pub fn register(&self, namespace: Arc<dyn Namespace>) -> UaResult<()> {
        let index = namespace.namespace_index();
        let uri = namespace.namespace_uri().to_string();

        let mut registry = self.registry.write();
        if registry.conflicts(index, &uri) {
            return Err(UaError::NamespaceConflict { index, uri });
        }
        registry.namespaces.insert(index, namespace);
        registry.uris.insert(index, uri.clone());
        drop(registry);

        tracing::info!(index, uri = %uri, "Namespace registered");
        Ok(())
    }

    /// Remove a namespace; the standard uri stays registered at index 0.
    pub fn unregister(&self, index: u16) -> Option<Arc<dyn Namespace>> {
        let mut registry = self.registry.write();
        let namespace = registry.namespaces.remove(&index)?;
        if index != 0 {
            registry.uris.remove(&index);
        }
        Some(namespace)
    }

    pub fn namespace(&self, index: u16) -> Option<Arc<dyn Namespace>> {
        self.registry.read().namespaces.get(&index).cloned()
    }

    pub fn namespace_index(&self, uri: &str) -> Option<u16> {
        self.registry
            .read()
            .uris
            .iter()
            .find(|(_, u)| *u == uri)
            .map(|(index, _)| *index)
    }

    pub fn namespace_uri(&self, index: u16) -> Option<String> {
        self.registry.read().uris.get(&index).cloned()
    }

    /// Resolve a node through the namespace owning its index. Standard nodes
    /// are looked up in the address space directly.
    pub fn get_node<'a>(
        &self,
        address_space: &'a AddressSpace,
        node_id: &NodeId,
    ) -> Option<&'a NodeType> {
        match self.namespace(node_id.namespace) {
            Some(namespace) => namespace.get_node(address_space, node_id),
            None if node_id.namespace == 0 => address_space.find(node_id),
            None => None,
        }
    }

    pub fn type_tree(&self) -> &Arc<RwLock<DefaultTypeTree>> {
        &self.type_tree
    }

    #[inline]
    pub fn is_subtype_of(&self, data_type: &NodeId, super_type: &NodeId) -> bool {
        self.type_tree.read().is_subtype_of(data_type, super_type)
    }

    #[inline]
    pub fn value_conforms(&self, data_type: &NodeId, value: &Variant) -> bool {
        attributes::value_conforms(&*self.type_tree.read(), data_type, value)
    }

    /// Route a call to the namespace owning the method, validate its inputs
    /// and run the invocation handler.
    pub fn call_method(
        &self,
        address_space: &AddressSpace,
        request: &CallMethodRequest,
    ) -> CallMethodResult {
        if !address_space.node_exists(&request.object_id) {
            return CallMethodResult::bad(
                UaError::NodeIdUnknown {
                    node_id: request.object_id.clone(),
                }
                .status_code(),
            );
        }
        let Some(namespace) = self.namespace(request.method_id.namespace) else {
            tracing::debug!(method_id = %request.method_id, "No namespace owns method");
            return CallMethodResult::bad(
                UaError::MethodInvalid {
                    method_id: request.method_id.clone(),
                }
                .status_code(),
            );
        };
        let type_tree = self.type_tree.read();
        method::call_method(namespace.as_ref(), address_space, &*type_tree, request)
    }
}
