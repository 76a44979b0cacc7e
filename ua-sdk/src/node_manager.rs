//! Hosting a namespace inside an async-opcua server.
//!
//! The namespace is built into the address space of an in-memory node
//! manager; the manager's request hooks forward to it.
use crate::{
    attributes::read_attribute, CallMethodRequest, Namespace, NamespaceConfig, NamespaceFactory,
    NamespaceManager, OpcUaServer, SampledItem, UaError, UaResult,
};
use opcua::{
    nodes::DefaultTypeTree,
    server::{
        address_space::AddressSpace,
        diagnostics::NamespaceMetadata,
        node_manager::{
            memory::{InMemoryNodeManager, InMemoryNodeManagerBuilder, InMemoryNodeManagerImpl},
            MethodCall, MonitoredItemRef, MonitoredItemUpdateRef, NodeManagerBuilder,
            ParsedReadValueId, ParsedWriteValue, RequestContext, ServerContext, WriteNode,
        },
        CreateMonitoredItem,
    },
    sync::RwLock,
    types::{
        AttributeId, DataEncoding, DataValue, MonitoringMode, NodeId, NumericRange,
        ReferenceTypeId, StatusCode, TimestampsToReturn,
    },
};
use std::sync::Arc;
use tracing::{error, warn};

pub type NamespaceNodeManager = InMemoryNodeManager<NamespaceNodeManagerImpl>;

/// Node manager builder serving the namespace `factory` creates from `config`.
///
/// Creation failures are logged and leave the node manager empty, as node
/// manager construction cannot fail.
pub fn namespace_node_manager(
    factory: Arc<dyn NamespaceFactory>,
    config: Arc<dyn NamespaceConfig>,
) -> impl NodeManagerBuilder {
    InMemoryNodeManagerBuilder::new(
        move |context: ServerContext, address_space: &mut AddressSpace| {
            let manager = Arc::new(NamespaceManager::new(context.type_tree.clone()));
            let host = EmbeddedServer {
                type_tree: context.type_tree.clone(),
                namespace_manager: Arc::clone(&manager),
            };
            match factory.create_namespace(&host, config, address_space) {
                Ok(namespace) => NamespaceNodeManagerImpl {
                    name: node_manager_name(namespace.namespace_uri()),
                    namespaces: vec![NamespaceMetadata {
                        namespace_uri: namespace.namespace_uri().to_string(),
                        namespace_index: namespace.namespace_index(),
                        ..Default::default()
                    }],
                    namespace: Some(namespace),
                    manager,
                },
                Err(e) => {
                    error!(error = %e, "Failed to create namespace");
                    NamespaceNodeManagerImpl {
                        name: node_manager_name("unavailable"),
                        namespaces: Vec::new(),
                        namespace: None,
                        manager,
                    }
                }
            }
        },
    )
}

fn node_manager_name(uri: &str) -> String {
    format!("namespace:{uri}")
}

/// Host services inside a running server. Namespace indices are assigned by
/// the server's namespace table.
struct EmbeddedServer {
    type_tree: Arc<RwLock<DefaultTypeTree>>,
    namespace_manager: Arc<NamespaceManager>,
}

impl OpcUaServer for EmbeddedServer {
    fn namespace_manager(&self) -> Arc<NamespaceManager> {
        Arc::clone(&self.namespace_manager)
    }

    fn register_namespace(
        &self,
        address_space: &mut AddressSpace,
        uri: &str,
        requested_index: u16,
    ) -> UaResult<u16> {
        let index = self.type_tree.write().namespaces_mut().add_namespace(uri);
        if index != requested_index {
            warn!(uri, requested_index, index, "Namespace index reassigned by server");
        }
        self.namespace_manager.check_available(index, uri)?;
        address_space.add_namespace(uri, index);
        Ok(index)
    }

    fn add_reference(
        &self,
        address_space: &mut AddressSpace,
        source: &NodeId,
        target: &NodeId,
        reference_type: ReferenceTypeId,
    ) -> UaResult<()> {
        // The source usually belongs to another node manager, so only the
        // edge itself is checked.
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

pub struct NamespaceNodeManagerImpl {
    name: String,
    namespaces: Vec<NamespaceMetadata>,
    namespace: Option<Arc<dyn Namespace>>,
    manager: Arc<NamespaceManager>,
}

impl NamespaceNodeManagerImpl {
    pub fn namespace(&self) -> Option<&Arc<dyn Namespace>> {
        self.namespace.as_ref()
    }
}

#[async_trait::async_trait]
impl InMemoryNodeManagerImpl for NamespaceNodeManagerImpl {
    async fn init(&self, _address_space: &mut AddressSpace, context: ServerContext) {
        let Some(namespace) = &self.namespace else {
            return;
        };
        // The address space lock is held here; the namespace only keeps a
        // handle to it.
        let Some(node_manager) = context
            .node_managers
            .get_by_name::<NamespaceNodeManager>(&self.name)
        else {
            error!(name = %self.name, "Node manager not found during init");
            return;
        };
        namespace.on_attached(
            node_manager.address_space(),
            Some(context.subscriptions.clone()),
        );
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn namespaces(&self) -> Vec<NamespaceMetadata> {
        self.namespaces.clone()
    }

    async fn read_values(
        &self,
        _context: &RequestContext,
        address_space: &RwLock<AddressSpace>,
        nodes: &[&ParsedReadValueId],
        max_age: f64,
        timestamps_to_return: TimestampsToReturn,
    ) -> Vec<DataValue> {
        match &self.namespace {
            Some(namespace) => {
                namespace
                    .read(address_space, nodes, max_age, timestamps_to_return)
                    .await
            }
            None => nodes
                .iter()
                .map(|_| DataValue {
                    status: Some(StatusCode::BadNodeIdUnknown),
                    ..Default::default()
                })
                .collect(),
        }
    }

    async fn create_value_monitored_items(
        &self,
        context: &RequestContext,
        address_space: &RwLock<AddressSpace>,
        items: &mut [&mut &mut CreateMonitoredItem],
    ) {
        let to_read: Vec<_> = items.iter().map(|r| r.item_to_monitor()).collect();
        let values = self
            .read_values(
                context,
                address_space,
                &to_read,
                0.0,
                TimestampsToReturn::Both,
            )
            .await;

        let mut sampled = Vec::new();
        for (value, item) in values.into_iter().zip(items.iter_mut()) {
            if value.status() == StatusCode::BadNodeIdUnknown {
                item.set_status(StatusCode::BadNodeIdUnknown);
                continue;
            }
            if value.status() != StatusCode::BadAttributeIdInvalid {
                item.set_initial_value(value);
            }
            item.set_status(StatusCode::Good);
            sampled.push(
                SampledItem::new(
                    item.handle(),
                    item.item_to_monitor().node_id.clone(),
                    item.item_to_monitor().attribute_id,
                    item.sampling_interval(),
                )
                .with_monitoring_mode(item.monitoring_mode()),
            );
        }

        if let Some(namespace) = &self.namespace {
            namespace.on_sampled_items_created(&mut sampled);
        }
        for item in items.iter_mut() {
            if let Some(revised) = sampled.iter().find(|s| s.handle == item.handle()) {
                item.revise_sampling_interval(revised.sampling_interval);
            }
        }
    }

    async fn modify_monitored_items(
        &self,
        _context: &RequestContext,
        items: &[&MonitoredItemUpdateRef],
    ) {
        let Some(namespace) = &self.namespace else {
            return;
        };
        let mut sampled: Vec<_> = items
            .iter()
            .filter(|item| item.status_code().is_good())
            .map(|item| {
                SampledItem::new(
                    item.handle(),
                    item.node_id().clone(),
                    item.attribute(),
                    item.update().revised_sampling_interval,
                )
            })
            .collect();
        namespace.on_sampled_items_modified(&mut sampled);
    }

    async fn set_monitoring_mode(
        &self,
        _context: &RequestContext,
        mode: MonitoringMode,
        items: &[&MonitoredItemRef],
    ) {
        if let Some(namespace) = &self.namespace {
            let handles: Vec<_> = items.iter().map(|item| item.handle()).collect();
            namespace.on_monitoring_mode_changed(mode, &handles);
        }
    }

    async fn delete_monitored_items(&self, _context: &RequestContext, items: &[&MonitoredItemRef]) {
        if let Some(namespace) = &self.namespace {
            let handles: Vec<_> = items.iter().map(|item| item.handle()).collect();
            namespace.on_sampled_items_deleted(&handles);
        }
    }

    async fn write(
        &self,
        context: &RequestContext,
        address_space: &RwLock<AddressSpace>,
        nodes_to_write: &mut [&mut WriteNode],
    ) -> Result<(), StatusCode> {
        let Some(namespace) = &self.namespace else {
            return Err(StatusCode::BadServiceUnsupported);
        };
        let statuses = {
            let values: Vec<&ParsedWriteValue> =
                nodes_to_write.iter().map(|write| write.value()).collect();
            namespace.write(address_space, &values).await
        };

        let mut changed = Vec::new();
        for (write, status) in nodes_to_write.iter_mut().zip(statuses) {
            write.set_status(status);
            if status.is_good() {
                changed.push(write.value().node_id.clone());
            }
        }

        if !changed.is_empty() {
            let address_space = address_space.read();
            let values: Vec<_> = changed
                .iter()
                .map(|node_id| {
                    let node_to_read = ParsedReadValueId {
                        node_id: node_id.clone(),
                        attribute_id: AttributeId::Value,
                        index_range: NumericRange::None,
                        data_encoding: DataEncoding::Binary,
                    };
                    read_attribute(&address_space, &node_to_read, 0.0, TimestampsToReturn::Both)
                })
                .collect();
            drop(address_space);
            context.subscriptions.notify_data_change(
                values
                    .into_iter()
                    .zip(changed.iter())
                    .map(|(dv, node_id)| (dv, node_id, AttributeId::Value)),
            );
        }
        Ok(())
    }

    async fn call(
        &self,
        _context: &RequestContext,
        address_space: &RwLock<AddressSpace>,
        methods_to_call: &mut [&mut &mut MethodCall],
    ) -> Result<(), StatusCode> {
        for call in methods_to_call.iter_mut() {
            let request = CallMethodRequest {
                object_id: call.object_id().clone(),
                method_id: call.method_id().clone(),
                input_arguments: call.arguments().to_vec(),
            };
            let result = self.manager.call_method(&address_space.read(), &request);
            if result.status_code == StatusCode::BadInvalidArgument
                && !result.input_argument_results.is_empty()
            {
                call.set_argument_error(result.input_argument_results);
                continue;
            }
            call.set_outputs(result.output_arguments);
            call.set_status(result.status_code);
        }
        Ok(())
    }
}
