#![allow(dead_code)]

use opcua::{
    server::{
        address_space::AddressSpace,
        node_manager::{ParsedReadValueId, ParsedWriteValue},
    },
    types::{
        AttributeId, DataEncoding, DataValue, NodeId, NumericRange, ReferenceTypeId, StatusCode,
        Variant,
    },
};
use std::sync::{Arc, Once};
use tracing::Level;
use ua_namespace_ctt::{CttNamespace, CttNamespaceConfig};
use ua_sdk::{Namespace, NamespaceManager, OpcUaServer, ServerContext, UaError, UaResult};

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

/// Server whose `Objects` folder refuses every new reference.
#[derive(Default)]
pub struct RejectingServer {
    pub inner: ServerContext,
}

impl OpcUaServer for RejectingServer {
    fn namespace_manager(&self) -> Arc<NamespaceManager> {
        self.inner.namespace_manager()
    }

    fn register_namespace(
        &self,
        address_space: &mut AddressSpace,
        uri: &str,
        requested_index: u16,
    ) -> UaResult<u16> {
        self.inner
            .register_namespace(address_space, uri, requested_index)
    }

    fn add_reference(
        &self,
        _address_space: &mut AddressSpace,
        _source: &NodeId,
        _target: &NodeId,
        _reference_type: ReferenceTypeId,
    ) -> UaResult<()> {
        Err(UaError::Status(StatusCode::BadInternalError))
    }
}

/// Build and register a CTT namespace into `server`'s address space.
pub fn register(
    server: &ServerContext,
    config: CttNamespaceConfig,
) -> UaResult<Arc<CttNamespace>> {
    let namespace = {
        let mut address_space = server.address_space().write();
        CttNamespace::register(server, Arc::new(config), &mut address_space)?
    };
    namespace.on_attached(server.address_space(), None);
    Ok(namespace)
}

/// Server with a registered default CTT namespace.
pub fn ctt_server() -> (ServerContext, Arc<CttNamespace>) {
    init_tracing();
    let server = ServerContext::new();
    let namespace =
        register(&server, CttNamespaceConfig::default()).expect("register ctt namespace");
    (server, namespace)
}

pub fn scalar_id(name: &str) -> NodeId {
    NodeId::new(2, format!("/CTT/Static/AllProfiles/Scalar/{name}"))
}

pub fn data_value(value: Variant) -> DataValue {
    DataValue {
        value: Some(value),
        ..Default::default()
    }
}

pub fn read_id(node_id: NodeId, attribute_id: AttributeId) -> ParsedReadValueId {
    ParsedReadValueId {
        node_id,
        attribute_id,
        index_range: NumericRange::None,
        data_encoding: DataEncoding::Binary,
    }
}

pub fn value_id(node_id: NodeId) -> ParsedReadValueId {
    read_id(node_id, AttributeId::Value)
}

pub fn write_id(node_id: NodeId, attribute_id: AttributeId, value: DataValue) -> ParsedWriteValue {
    ParsedWriteValue {
        node_id,
        attribute_id,
        index_range: NumericRange::None,
        value,
    }
}

pub fn value_write(node_id: NodeId, value: Variant) -> ParsedWriteValue {
    write_id(node_id, AttributeId::Value, data_value(value))
}
