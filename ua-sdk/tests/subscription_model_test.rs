mod common;

use common::init_tracing;
use opcua::{
    server::{
        address_space::{AccessLevel, AddressSpace, VariableBuilder},
        MonitoredItemHandle,
    },
    sync::RwLock,
    types::{AttributeId, DataTypeId, MonitoringMode, NodeId, StatusCode, UAString, Variant},
};
use std::sync::Arc;
use ua_sdk::{SampledItem, ServerContext, SubscriptionModel};

fn handle(id: u32) -> MonitoredItemHandle {
    MonitoredItemHandle {
        subscription_id: 3,
        monitored_item_id: id,
    }
}

fn counter_space() -> Arc<RwLock<AddressSpace>> {
    init_tracing();
    let server = ServerContext::new();
    {
        let mut address_space = server.address_space().write();
        address_space.add_namespace("urn:test:sampling", 7);
        VariableBuilder::new(&NodeId::new(7, "counter"), "counter", "Counter")
            .data_type(DataTypeId::UInt32)
            .access_level(AccessLevel::CURRENT_READ)
            .user_access_level(AccessLevel::CURRENT_READ)
            .value(Variant::UInt32(1))
            .insert(&mut *address_space);
    }
    Arc::clone(server.address_space())
}

fn item(id: u32, node: &'static str, attribute_id: AttributeId) -> SampledItem {
    SampledItem::new(handle(id), NodeId::new(7, node), attribute_id, 100.0)
}

#[test]
fn samples_follow_the_attribute() {
    let address_space = counter_space();
    let model = SubscriptionModel::new();
    model.bind(&address_space);
    model.on_sampled_items_created(&[
        item(1, "counter", AttributeId::Value),
        item(2, "counter", AttributeId::DisplayName),
        item(3, "missing", AttributeId::Value),
    ]);
    assert_eq!(model.len(), 3);

    let value = model.sample(&handle(1)).unwrap();
    assert_eq!(value.value, Some(Variant::UInt32(1)));
    assert!(value.source_timestamp.is_some());

    let name = model.sample(&handle(2)).unwrap();
    match name.value {
        Some(Variant::LocalizedText(text)) => assert_eq!(text.text, UAString::from("Counter")),
        other => panic!("unexpected display name {other:?}"),
    }
    assert!(name.source_timestamp.is_none());

    let missing = model.sample(&handle(3)).unwrap();
    assert_eq!(missing.status, Some(StatusCode::BadNodeIdUnknown));
}

#[test]
fn modify_and_mode_changes_update_tracked_items() {
    let address_space = counter_space();
    let model = SubscriptionModel::new();
    model.bind(&address_space);
    model.on_sampled_items_created(&[item(1, "counter", AttributeId::Value)]);

    let mut modified = item(1, "counter", AttributeId::Value);
    modified.sampling_interval = 750.0;
    model.on_sampled_items_modified(&[modified]);
    assert_eq!(model.get(&handle(1)).unwrap().sampling_interval, 750.0);

    model.on_monitoring_mode_changed(MonitoringMode::Sampling, &[handle(1), handle(9)]);
    assert_eq!(
        model.get(&handle(1)).unwrap().monitoring_mode,
        MonitoringMode::Sampling
    );

    model.on_sampled_items_deleted(&[handle(1)]);
    assert!(model.is_empty());
    assert!(model.sample(&handle(1)).is_none());
}

#[test]
fn sampling_ends_with_the_address_space() {
    let address_space = counter_space();
    let model = SubscriptionModel::new();
    model.bind(&address_space);
    model.on_sampled_items_created(&[item(1, "counter", AttributeId::Value)]);
    assert!(model.sample(&handle(1)).is_some());

    drop(address_space);
    assert!(model.sample(&handle(1)).is_none());
    assert_eq!(model.len(), 1);
}

#[test]
fn only_the_first_binding_counts() {
    let first = counter_space();
    let second = Arc::new(RwLock::new(AddressSpace::new()));
    let model = SubscriptionModel::new();
    model.bind(&first);
    model.bind(&second);
    model.on_sampled_items_created(&[item(1, "counter", AttributeId::Value)]);
    let value = model.sample(&handle(1)).unwrap();
    assert_eq!(value.value, Some(Variant::UInt32(1)));
}
