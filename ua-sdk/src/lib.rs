pub mod attributes;
mod error;
mod manager;
mod method;
mod namespace;
mod node_manager;
mod server;
mod subscription;

pub type UaResult<T> = Result<T, UaError>;

pub use error::UaError;
pub use manager::{NamespaceManager, OPC_UA_NAMESPACE_URI};
pub use method::{
    call_method, input_arguments, CallMethodRequest, CallMethodResult, MethodInvocationHandler,
    VALUE_RANK_SCALAR,
};
pub use namespace::{Namespace, NamespaceConfig, NamespaceFactory};
pub use node_manager::{namespace_node_manager, NamespaceNodeManager, NamespaceNodeManagerImpl};
pub use server::{OpcUaServer, ServerContext};
pub use subscription::{interval_duration, SampledItem, SubscriptionModel};
