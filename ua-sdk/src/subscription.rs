//! Sampling of monitored items on top of async-opcua's [`SyncSampler`].
use crate::attributes::read_attribute;
use dashmap::DashMap;
use opcua::{
    server::{
        address_space::AddressSpace,
        node_manager::{ParsedReadValueId, SyncSampler},
        MonitoredItemHandle, SubscriptionCache,
    },
    sync::RwLock,
    types::{
        AttributeId, DataEncoding, DataValue, MonitoringMode, NodeId, NumericRange,
        TimestampsToReturn,
    },
};
use std::{
    sync::{Arc, OnceLock, Weak},
    time::Duration,
};

const MIN_TICK: Duration = Duration::from_millis(1);

/// A monitored item as seen by the namespace owning its node.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledItem {
    pub handle: MonitoredItemHandle,
    pub node_id: NodeId,
    pub attribute_id: AttributeId,
    /// Sampling interval in milliseconds.
    pub sampling_interval: f64,
    pub monitoring_mode: MonitoringMode,
}

impl SampledItem {
    pub fn new(
        handle: MonitoredItemHandle,
        node_id: NodeId,
        attribute_id: AttributeId,
        sampling_interval: f64,
    ) -> Self {
        Self {
            handle,
            node_id,
            attribute_id,
            sampling_interval,
            monitoring_mode: MonitoringMode::Reporting,
        }
    }

    pub fn with_monitoring_mode(mut self, monitoring_mode: MonitoringMode) -> Self {
        self.monitoring_mode = monitoring_mode;
        self
    }

    /// Raise the interval to `floor`. NaN counts as below any floor.
    ///
    /// Returns `true` when the interval was revised.
    pub fn clamp_sampling_interval(&mut self, floor: f64) -> bool {
        if !(self.sampling_interval >= floor) {
            self.sampling_interval = floor;
            true
        } else {
            false
        }
    }
}

/// Millisecond interval as a timer period. Zero, negative and NaN give zero,
/// values past the `Duration` range saturate.
pub fn interval_duration(interval: f64) -> Duration {
    if interval.is_nan() || interval <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(interval / 1000.0).unwrap_or(Duration::MAX)
}

/// Tracks the sampled items of one namespace and feeds a [`SyncSampler`]
/// that reads their nodes from the bound address space.
///
/// Values reach clients once [`SubscriptionModel::run`] has been given the
/// server's subscription cache. Dropping the model stops sampling.
pub struct SubscriptionModel {
    sampler: SyncSampler,
    items: DashMap<MonitoredItemHandle, SampledItem>,
    address_space: OnceLock<Weak<RwLock<AddressSpace>>>,
}

impl Default for SubscriptionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionModel {
    pub fn new() -> Self {
        Self {
            sampler: SyncSampler::new(),
            items: DashMap::new(),
            address_space: OnceLock::new(),
        }
    }

    /// Bind the address space samples are read from. Only the first binding
    /// counts; items created before it are tracked but not sampled.
    pub fn bind(&self, address_space: &Arc<RwLock<AddressSpace>>) {
        if self
            .address_space
            .set(Arc::downgrade(address_space))
            .is_err()
        {
            tracing::debug!("Subscription model already bound to an address space");
        }
    }

    /// Start delivering samples to `subscriptions`, checking for due items
    /// every `tick`. Must be called from within a Tokio runtime.
    pub fn run(&self, tick: Duration, subscriptions: Arc<SubscriptionCache>) {
        self.sampler.run(tick.max(MIN_TICK), subscriptions);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, handle: &MonitoredItemHandle) -> Option<SampledItem> {
        self.items.get(handle).map(|item| item.value().clone())
    }

    /// Read the current sample of an item, as the sampler would.
    pub fn sample(&self, handle: &MonitoredItemHandle) -> Option<DataValue> {
        let item = self.get(handle)?;
        let address_space = self.address_space.get()?;
        read_sample(address_space, &item.node_id, item.attribute_id)
    }

    pub fn on_sampled_items_created(&self, items: &[SampledItem]) {
        for item in items {
            self.items.insert(item.handle, item.clone());
            let Some(address_space) = self.address_space.get().cloned() else {
                tracing::debug!(node_id = %item.node_id, "Sampled item created before binding");
                continue;
            };
            let node_id = item.node_id.clone();
            let attribute_id = item.attribute_id;
            self.sampler.add_sampler(
                item.node_id.clone(),
                item.attribute_id,
                move || read_sample(&address_space, &node_id, attribute_id),
                item.monitoring_mode,
                item.handle,
                interval_duration(item.sampling_interval),
            );
        }
    }

    pub fn on_sampled_items_modified(&self, items: &[SampledItem]) {
        for item in items {
            if let Some(mut tracked) = self.items.get_mut(&item.handle) {
                tracked.sampling_interval = item.sampling_interval;
            }
            self.sampler.update_sampler(
                &item.node_id,
                item.attribute_id,
                item.handle,
                interval_duration(item.sampling_interval),
            );
        }
    }

    pub fn on_sampled_items_deleted(&self, handles: &[MonitoredItemHandle]) {
        for handle in handles {
            if let Some((_, item)) = self.items.remove(handle) {
                self.sampler
                    .remove_sampler(&item.node_id, item.attribute_id, item.handle);
            }
        }
    }

    pub fn on_monitoring_mode_changed(
        &self,
        mode: MonitoringMode,
        handles: &[MonitoredItemHandle],
    ) {
        for handle in handles {
            let Some(mut item) = self.items.get_mut(handle) else {
                continue;
            };
            item.monitoring_mode = mode;
            self.sampler
                .set_sampler_mode(&item.node_id, item.attribute_id, item.handle, mode);
        }
    }
}

fn read_sample(
    address_space: &Weak<RwLock<AddressSpace>>,
    node_id: &NodeId,
    attribute_id: AttributeId,
) -> Option<DataValue> {
    let address_space = address_space.upgrade()?;
    let node_to_read = ParsedReadValueId {
        node_id: node_id.clone(),
        attribute_id,
        index_range: NumericRange::None,
        data_encoding: DataEncoding::Binary,
    };
    let value = read_attribute(
        &address_space.read(),
        &node_to_read,
        0.0,
        TimestampsToReturn::Both,
    );
    Some(value)
}
