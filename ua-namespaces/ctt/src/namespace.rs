//! CTT namespace: a root folder with one static variable per built-in scalar
//! type and a `Methods` folder holding `sqrt(x)`.
use crate::{
    config::CttNamespaceConfig,
    methods::{
        sqrt_input_arguments, sqrt_output_arguments, SqrtInvocationHandler, SQRT_DESCRIPTION,
        SQRT_METHOD_NAME,
    },
    node_id::CttNodeIds,
    scalars::static_scalars,
};
use async_trait::async_trait;
use dashmap::DashMap;
use opcua::{
    nodes::{DefaultTypeTree, NodeType, ReferenceRef},
    server::{
        address_space::{AccessLevel, AddressSpace, MethodBuilder, ObjectBuilder, VariableBuilder},
        node_manager::{ParsedReadValueId, ParsedWriteValue},
        MonitoredItemHandle, SubscriptionCache,
    },
    sync::RwLock,
    types::{
        BrowseDirection, DataValue, LocalizedText, MonitoringMode, NodeId, ObjectId,
        QualifiedName, ReferenceTypeId, StatusCode, TimestampsToReturn, VariableTypeId,
    },
};
use std::sync::Arc;
use ua_sdk::{
    attributes::{read_attribute, write_attribute},
    interval_duration, MethodInvocationHandler, Namespace, OpcUaServer, SampledItem,
    SubscriptionModel, UaResult, VALUE_RANK_SCALAR,
};

pub struct CttNamespace {
    config: Arc<CttNamespaceConfig>,
    namespace_index: u16,
    ids: CttNodeIds,
    node_count: usize,
    type_tree: Arc<RwLock<DefaultTypeTree>>,
    handlers: DashMap<NodeId, Arc<dyn MethodInvocationHandler>>,
    subscription_model: SubscriptionModel,
}

impl CttNamespace {
    /// Build the namespace and its whole subtree into `address_space`.
    ///
    /// Linking the root folder below `Objects` may fail; the failure is
    /// logged and the subtree stays reachable by node id only.
    pub fn new(
        server: &dyn OpcUaServer,
        config: Arc<CttNamespaceConfig>,
        address_space: &mut AddressSpace,
    ) -> UaResult<Arc<Self>> {
        config.validate()?;
        let namespace_index = server.register_namespace(
            address_space,
            &config.namespace_uri,
            config.namespace_index,
        )?;

        let mut namespace = Self {
            ids: CttNodeIds::new(namespace_index, &config.root_name),
            namespace_index,
            node_count: 0,
            type_tree: Arc::clone(server.namespace_manager().type_tree()),
            handlers: DashMap::new(),
            subscription_model: SubscriptionModel::new(),
            config,
        };

        let root_id = namespace.ids.root_folder();
        let root_name = namespace.config.root_name.as_str();
        if ObjectBuilder::new(
            &root_id,
            QualifiedName::new(namespace_index, root_name),
            LocalizedText::new("en", root_name),
        )
        .is_folder()
        .insert(address_space)
        {
            namespace.node_count += 1;
        }
        if let Err(e) = server.add_reference(
            address_space,
            &ObjectId::ObjectsFolder.into(),
            &root_id,
            ReferenceTypeId::Organizes,
        ) {
            tracing::error!(
                node_id = %root_id,
                error = %e,
                "Failed to add reference from Objects folder"
            );
        }

        namespace.add_static_scalar_nodes(address_space);
        namespace.add_method_nodes(address_space);

        tracing::info!(
            namespace_index,
            namespace_uri = %namespace.config.namespace_uri,
            nodes = namespace.node_count,
            "CTT namespace created"
        );
        Ok(Arc::new(namespace))
    }

    /// Build the namespace and register it with the server's namespace
    /// manager.
    pub fn register(
        server: &dyn OpcUaServer,
        config: Arc<CttNamespaceConfig>,
        address_space: &mut AddressSpace,
    ) -> UaResult<Arc<Self>> {
        let namespace = Self::new(server, config, address_space)?;
        server
            .namespace_manager()
            .register(Arc::clone(&namespace) as Arc<dyn Namespace>)?;
        Ok(namespace)
    }

    pub fn config(&self) -> &CttNamespaceConfig {
        &self.config
    }

    pub fn node_ids(&self) -> &CttNodeIds {
        &self.ids
    }

    pub fn root_folder_id(&self) -> NodeId {
        self.ids.root_folder()
    }

    /// Number of nodes this namespace added, argument properties included.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn subscription_model(&self) -> &SubscriptionModel {
        &self.subscription_model
    }

    fn browse_name(&self, name: &str) -> QualifiedName {
        QualifiedName::new(self.namespace_index, name)
    }

    fn owns(&self, node_id: &NodeId) -> bool {
        node_id.namespace == self.namespace_index
    }

    fn add_static_scalar_nodes(&mut self, address_space: &mut AddressSpace) {
        let root_id = self.ids.root_folder();
        let access = AccessLevel::CURRENT_READ | AccessLevel::CURRENT_WRITE;
        for scalar in static_scalars() {
            let inserted = VariableBuilder::new(
                &self.ids.scalar(scalar.name),
                self.browse_name(scalar.name),
                LocalizedText::new("en", scalar.name),
            )
            .data_type(scalar.data_type)
            .value_rank(VALUE_RANK_SCALAR)
            .access_level(access)
            .user_access_level(access)
            .minimum_sampling_interval(self.config.min_sampling_interval)
            .has_type_definition(VariableTypeId::BaseDataVariableType)
            .value(scalar.value)
            .organized_by(root_id.clone())
            .insert(address_space);
            if inserted {
                self.node_count += 1;
            }
        }
    }

    fn add_method_nodes(&mut self, address_space: &mut AddressSpace) {
        let folder_id = self.ids.methods_folder();
        if ObjectBuilder::new(
            &folder_id,
            self.browse_name("Methods"),
            LocalizedText::new("en", "Methods"),
        )
        .is_folder()
        .organized_by(self.ids.root_folder())
        .insert(address_space)
        {
            self.node_count += 1;
        }

        let method_id = self.ids.method(SQRT_METHOD_NAME);
        let input_id = self.ids.method_property(SQRT_METHOD_NAME, "InputArguments");
        let output_id = self.ids.method_property(SQRT_METHOD_NAME, "OutputArguments");
        if MethodBuilder::new(
            &method_id,
            self.browse_name(SQRT_METHOD_NAME),
            LocalizedText::new("", SQRT_METHOD_NAME),
        )
        .description(LocalizedText::new("en", SQRT_DESCRIPTION))
        .component_of(folder_id)
        .executable(true)
        .user_executable(true)
        .input_args(address_space, &input_id, &sqrt_input_arguments())
        .output_args(address_space, &output_id, &sqrt_output_arguments())
        .insert(address_space)
        {
            self.node_count += 1;
        }
        self.node_count += [&input_id, &output_id]
            .into_iter()
            .filter(|id| address_space.node_exists(id))
            .count();

        self.handlers
            .insert(method_id, Arc::new(SqrtInvocationHandler));
    }

    fn clamp_sampling_intervals(&self, items: &mut [SampledItem]) {
        let floor = self.config.min_sampling_interval;
        for item in items.iter_mut() {
            let requested = item.sampling_interval;
            if item.clamp_sampling_interval(floor) {
                tracing::debug!(
                    node_id = %item.node_id,
                    requested,
                    revised = floor,
                    "Sampling interval raised to floor"
                );
            }
        }
    }
}

fn status_value(status: StatusCode) -> DataValue {
    DataValue {
        status: Some(status),
        ..Default::default()
    }
}

#[async_trait]
impl Namespace for CttNamespace {
    fn namespace_index(&self) -> u16 {
        self.namespace_index
    }

    fn namespace_uri(&self) -> &str {
        &self.config.namespace_uri
    }

    fn contains_node_id(&self, address_space: &AddressSpace, node_id: &NodeId) -> bool {
        self.owns(node_id) && address_space.node_exists(node_id)
    }

    fn get_node<'a>(
        &self,
        address_space: &'a AddressSpace,
        node_id: &NodeId,
    ) -> Option<&'a NodeType> {
        if !self.owns(node_id) {
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
        let address_space = address_space.read();
        nodes
            .iter()
            .map(|node| {
                if self.owns(&node.node_id) {
                    read_attribute(&address_space, node, max_age, timestamps)
                } else {
                    status_value(StatusCode::BadNodeIdUnknown)
                }
            })
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
                if !self.owns(&node.node_id) {
                    return StatusCode::BadNodeIdUnknown;
                }
                match write_attribute(&mut address_space, &*type_tree, node) {
                    Ok(()) => StatusCode::Good,
                    Err(e) => {
                        tracing::debug!(node_id = %node.node_id, error = %e, "Write rejected");
                        e.status_code()
                    }
                }
            })
            .collect()
    }

    fn on_sampled_items_created(&self, items: &mut [SampledItem]) {
        self.clamp_sampling_intervals(items);
        self.subscription_model.on_sampled_items_created(items);
    }

    fn on_sampled_items_modified(&self, items: &mut [SampledItem]) {
        self.clamp_sampling_intervals(items);
        self.subscription_model.on_sampled_items_modified(items);
    }

    fn on_sampled_items_deleted(&self, items: &[MonitoredItemHandle]) {
        self.subscription_model.on_sampled_items_deleted(items);
    }

    fn on_monitoring_mode_changed(&self, mode: MonitoringMode, items: &[MonitoredItemHandle]) {
        self.subscription_model
            .on_monitoring_mode_changed(mode, items);
    }

    fn get_invocation_handler(
        &self,
        method_id: &NodeId,
    ) -> Option<Arc<dyn MethodInvocationHandler>> {
        self.handlers
            .get(method_id)
            .map(|handler| Arc::clone(handler.value()))
    }

    fn on_attached(
        &self,
        address_space: &Arc<RwLock<AddressSpace>>,
        subscriptions: Option<Arc<SubscriptionCache>>,
    ) {
        self.subscription_model.bind(address_space);
        if let Some(subscriptions) = subscriptions {
            self.subscription_model.run(
                interval_duration(self.config.min_sampling_interval),
                subscriptions,
            );
        }
    }
}
