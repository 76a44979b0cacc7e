use crate::{attributes::value_conforms, Namespace, UaError, UaResult};
use opcua::{
    nodes::{NodeType, TypeTree},
    server::address_space::AddressSpace,
    types::{
        Argument, BrowseDirection, DataEncoding, NodeId, NumericRange, ReferenceTypeId,
        StatusCode, TimestampsToReturn, Variant,
    },
};

/// Value rank of a scalar variable or argument.
pub const VALUE_RANK_SCALAR: i32 = -1;

/// Executable behaviour bound to a method node.
///
/// Input validation against the declared arguments happens before `invoke`
/// is reached (see [`call_method`]), so implementations only deal with their
/// own domain rules.
pub trait MethodInvocationHandler: Send + Sync {
    fn invoke(&self, inputs: &[Variant]) -> UaResult<Vec<Variant>>;
}

impl<F> MethodInvocationHandler for F
where
    F: Fn(&[Variant]) -> UaResult<Vec<Variant>> + Send + Sync,
{
    fn invoke(&self, inputs: &[Variant]) -> UaResult<Vec<Variant>> {
        self(inputs)
    }
}

#[derive(Debug, Clone)]
pub struct CallMethodRequest {
    pub object_id: NodeId,
    pub method_id: NodeId,
    pub input_arguments: Vec<Variant>,
}

#[derive(Debug, Clone)]
pub struct CallMethodResult {
    pub status_code: StatusCode,
    pub input_argument_results: Vec<StatusCode>,
    pub output_arguments: Vec<Variant>,
}

impl CallMethodResult {
    pub fn good(output_arguments: Vec<Variant>) -> Self {
        Self {
            status_code: StatusCode::Good,
            input_argument_results: Vec::new(),
            output_arguments,
        }
    }

    pub fn bad(status_code: StatusCode) -> Self {
        Self {
            status_code,
            input_argument_results: Vec::new(),
            output_arguments: Vec::new(),
        }
    }
}

/// Argument descriptors held by the `InputArguments` property of a method.
///
/// A method without the property takes no inputs.
pub fn input_arguments(
    address_space: &AddressSpace,
    type_tree: &dyn TypeTree,
    method_id: &NodeId,
) -> Vec<Argument> {
    let Some(NodeType::Variable(property)) = address_space.find_node_by_browse_name(
        method_id,
        Some((ReferenceTypeId::HasProperty, false)),
        type_tree,
        BrowseDirection::Forward,
        "InputArguments",
    ) else {
        return Vec::new();
    };
    let value = property.value(
        TimestampsToReturn::Neither,
        &NumericRange::None,
        &DataEncoding::Binary,
        0.0,
    );
    match value.value {
        Some(Variant::Array(array)) => array
            .values
            .into_iter()
            .filter_map(|v| match v {
                Variant::ExtensionObject(o) => o.into_inner_as::<Argument>().map(|a| *a),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Validate a call against the address space and the method's declared
/// inputs, then run the handler the owning namespace registered for it.
///
/// The object must exist and hold the method through `HasComponent`.
pub fn call_method(
    namespace: &dyn Namespace,
    address_space: &AddressSpace,
    type_tree: &dyn TypeTree,
    request: &CallMethodRequest,
) -> CallMethodResult {
    match try_call_method(namespace, address_space, type_tree, request) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(
                method_id = %request.method_id,
                error = %e,
                "Method call rejected"
            );
            CallMethodResult::bad(e.status_code())
        }
    }
}

fn try_call_method(
    namespace: &dyn Namespace,
    address_space: &AddressSpace,
    type_tree: &dyn TypeTree,
    request: &CallMethodRequest,
) -> UaResult<CallMethodResult> {
    let method_id = &request.method_id;
    if !address_space.node_exists(&request.object_id) {
        return Err(UaError::NodeIdUnknown {
            node_id: request.object_id.clone(),
        });
    }

    let invalid = || UaError::MethodInvalid {
        method_id: method_id.clone(),
    };
    let Some(NodeType::Method(method)) = address_space.find(method_id) else {
        return Err(invalid());
    };
    if !address_space.has_reference(&request.object_id, method_id, ReferenceTypeId::HasComponent) {
        return Err(invalid());
    }
    if !method.executable() {
        return Err(UaError::Status(StatusCode::BadNotExecutable));
    }
    let handler = namespace
        .get_invocation_handler(method_id)
        .ok_or_else(invalid)?;

    let declared = input_arguments(address_space, type_tree, method_id);
    let inputs = &request.input_arguments;
    if inputs.len() < declared.len() {
        return Err(UaError::ArgumentsMissing {
            expected: declared.len(),
            actual: inputs.len(),
        });
    }
    if inputs.len() > declared.len() {
        return Err(UaError::TooManyArguments {
            expected: declared.len(),
            actual: inputs.len(),
        });
    }

    let input_argument_results = declared
        .iter()
        .zip(inputs)
        .map(|(argument, value)| {
            if argument.value_rank != VALUE_RANK_SCALAR
                || value_conforms(type_tree, &argument.data_type, value)
            {
                StatusCode::Good
            } else {
                StatusCode::BadTypeMismatch
            }
        })
        .collect::<Vec<StatusCode>>();

    if input_argument_results.iter().any(|s| s.is_bad()) {
        return Ok(CallMethodResult {
            status_code: StatusCode::BadInvalidArgument,
            input_argument_results,
            output_arguments: Vec::new(),
        });
    }

    let output_arguments = handler.invoke(inputs)?;
    Ok(CallMethodResult {
        status_code: StatusCode::Good,
        input_argument_results,
        output_arguments,
    })
}
