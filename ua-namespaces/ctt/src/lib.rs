mod config;
mod factory;
mod methods;
mod namespace;
mod node_id;
mod scalars;

pub use config::CttNamespaceConfig;
pub use factory::CttNamespaceFactory;
pub use methods::{
    sqrt_input_arguments, sqrt_output_arguments, SqrtInvocationHandler, SQRT_METHOD_NAME,
};
pub use namespace::CttNamespace;
pub use node_id::{sanitize_nodeid_component, CttNodeIds};
pub use scalars::{static_scalars, StaticScalar};
