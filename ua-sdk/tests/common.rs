#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use opcua::{
    nodes::{DefaultTypeTree, NodeType, ReferenceRef},
    server::{
        address_space::AddressSpace,
        node_manager::{ParsedReadValueId, ParsedWriteValue},
        MonitoredItemHandle,
    },
    sync::RwLock,
    types::{
        BrowseDirection, DataEncoding, DataValue, MonitoringMode, NodeId, NumericRange,
        StatusCode, TimestampsToReturn,
    },
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Once,
};
use tracing::Level;
use ua_sdk::{
    attributes::{read_attribute, write_attribute},
    MethodInvocationHandler, Namespace, NamespaceManager, SampledItem,
};

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .without_time()
            .try_init();
    });
}

pub fn value_id(node_id: NodeId) -> ParsedReadValueId {
    ParsedReadValueId {
        node_id,
        attribute_id: opcua::types::AttributeId::Value,
        index_range: NumericRange::None,
        data_encoding: DataEncoding::Binary,
    }
}

/// Bare namespace over nodes the test inserts itself; counts batch reads.
pub struct TestNamespace {
    pub index: u16,
    pub uri: String,
    pub handlers: DashMap<NodeId, Arc<dyn MethodInvocationHandler>>,
    pub reads: AtomicUsize,
    type_tree: Arc<RwLock<DefaultTypeTree>>,
}

impl TestNamespace {
    pub fn new(index: u16, uri: &str, manager: &NamespaceManager) -> Self {
        Self {
            index,
            uri: uri.to_string(),
            handlers: DashMap::new(),
            reads: AtomicUsize::new(0),
            type_tree: Arc::clone(manager.type_tree()),
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Namespace for TestNamespace {
    fn namespace_index(&self) -> u16 {
        self.index
    }

    fn namespace_uri(&self) -> &str {
        &self.uri
    }

    fn contains_node_id(&self, address_space: &AddressSpace, node_id: &NodeId) -> bool {
        node_id.namespace == self.index && address_space.node_exists(node_id)
    }

    fn get_node<'a>(
        &self,
        address_space: &'a AddressSpace,
        node_id: &NodeId,
    ) -> Option<&'a NodeType> {
        if node_id.namespace != self.index {
            return None;
        }
        address_space.find_node(node_id)
    }

    fn get_references<'a>(
        &self,
        address_space: &'a AddressSpace,
        node_id: &NodeId,
    ) -> Option<Vec<ReferenceRef<'a>>> {
        if !self.contains_node_id(address_space, node_id) {
            return None;
        }
        let type_tree = self.type_tree.read();
        let references = address_space
            .find_references(
                node_id,
                None::<(NodeId, bool)>,
                &*type_tree,
                BrowseDirection::Forward,
            )
            .collect();
        Some(references)
    }

    async fn read(
        &self,
        address_space: &RwLock<AddressSpace>,
        nodes: &[&ParsedReadValueId],
        max_age: f64,
        timestamps: TimestampsToReturn,
    ) -> Vec<DataValue> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let address_space = address_space.read();
        nodes
            .iter()
            .map(|node| read_attribute(&address_space, node, max_age, timestamps))
            .collect()
    }

    async fn write(
        &self,
        address_space: &RwLock<AddressSpace>,
        nodes: &[&ParsedWriteValue],
    ) -> Vec<StatusCode> {
        let mut address_space = address_space.write();
        let type_tree = self.type_tree.read();
        nodes
            .iter()
            .map(|node| {
                write_attribute(&mut address_space, &*type_tree, node)
                    .map_or_else(|e| e.status_code(), |_| StatusCode::Good)
            })
            .collect()
    }

    fn on_sampled_items_created(&self, _items: &mut [SampledItem]) {}

    fn on_sampled_items_modified(&self, _items: &mut [SampledItem]) {}

    fn on_sampled_items_deleted(&self, _items: &[MonitoredItemHandle]) {}

    fn on_monitoring_mode_changed(&self, _mode: MonitoringMode, _items: &[MonitoredItemHandle]) {}

    fn get_invocation_handler(
        &self,
        method_id: &NodeId,
    ) -> Option<Arc<dyn MethodInvocationHandler>> {
        self.handlers.get(method_id).map(|h| Arc::clone(h.value()))
    }
}
