//! Namespace plugin contract.
//!
//! A namespace owns the nodes of one namespace index inside an async-opcua
//! [`AddressSpace`] and answers every lookup, read, write and subscription
//! event the host routes to it. The host guarantees that only ids of the
//! namespace's index are routed here, but implementations must still answer
//! unknown ids with `BadNodeIdUnknown`.
use crate::{MethodInvocationHandler, OpcUaServer, SampledItem, UaResult};
use async_trait::async_trait;
use downcast_rs::{impl_downcast, DowncastSync};
use opcua::{
    nodes::{NodeType, ReferenceRef},
    server::{
        address_space::AddressSpace,
        node_manager::{ParsedReadValueId, ParsedWriteValue},
        MonitoredItemHandle, SubscriptionCache,
    },
    sync::RwLock,
    types::{DataValue, MonitoringMode, NodeId, StatusCode, TimestampsToReturn},
};
use std::{fmt::Debug, sync::Arc};

#[async_trait]
pub trait Namespace: Send + Sync {
    fn namespace_index(&self) -> u16;

    fn namespace_uri(&self) -> &str;

    fn contains_node_id(&self, address_space: &AddressSpace, node_id: &NodeId) -> bool;

    fn get_node<'a>(&self, address_space: &'a AddressSpace, node_id: &NodeId)
        -> Option<&'a NodeType>;

    /// Forward references of a node, `None` when the node is not owned here.
    fn get_references<'a>(
        &self,
        address_space: &'a AddressSpace,
        node_id: &NodeId,
    ) -> Option<Vec<ReferenceRef<'a>>>;

    /// Read a batch of attributes. The result has one entry per request, in
    /// request order; failures are reported as per-item status values.
    async fn read(
        &self,
        address_space: &RwLock<AddressSpace>,
        nodes: &[&ParsedReadValueId],
        max_age: f64,
        timestamps: TimestampsToReturn,
    ) -> Vec<DataValue>;

    /// Write a batch of attributes. One status per request, in request order.
    async fn write(
        &self,
        address_space: &RwLock<AddressSpace>,
        nodes: &[&ParsedWriteValue],
    ) -> Vec<StatusCode>;

    /// Items start sampling; the namespace may revise their intervals.
    fn on_sampled_items_created(&self, items: &mut [SampledItem]);

    /// Items changed their requested interval; the namespace may revise it.
    fn on_sampled_items_modified(&self, items: &mut [SampledItem]);

    fn on_sampled_items_deleted(&self, items: &[MonitoredItemHandle]);

    fn on_monitoring_mode_changed(&self, mode: MonitoringMode, items: &[MonitoredItemHandle]);

    fn get_invocation_handler(&self, method_id: &NodeId)
        -> Option<Arc<dyn MethodInvocationHandler>>;

    /// Called once the host has placed the namespace's nodes into their final
    /// address space. `subscriptions` is present when a running server
    /// delivers sampled values to clients.
    fn on_attached(
        &self,
        _address_space: &Arc<RwLock<AddressSpace>>,
        _subscriptions: Option<Arc<SubscriptionCache>>,
    ) {
    }
}

/// Marker for namespace configuration objects handed to a factory.
pub trait NamespaceConfig: DowncastSync + Send + Sync + Debug {}

impl_downcast!(sync NamespaceConfig);

/// Creates namespaces from JSON configuration.
pub trait NamespaceFactory: Send + Sync {
    /// Parse and validate a namespace configuration.
    fn convert_namespace_config(
        &self,
        config: serde_json::Value,
    ) -> UaResult<Arc<dyn NamespaceConfig>>;

    /// Build a namespace into `address_space` and register it with the
    /// server's namespace manager.
    fn create_namespace(
        &self,
        server: &dyn OpcUaServer,
        config: Arc<dyn NamespaceConfig>,
        address_space: &mut AddressSpace,
    ) -> UaResult<Arc<dyn Namespace>>;
}
