//! Attribute access on nodes held in an async-opcua `AddressSpace`.
//!
//! These are the request-context-free halves of the server's read and write
//! paths, so that they can be driven both by a node manager and by a
//! standalone host.
use crate::{UaError, UaResult};
use opcua::{
    nodes::{NodeType, TypeTree},
    server::{
        address_space::{validate_value_to_write, write_node_value, AccessLevel, AddressSpace},
        node_manager::{ParsedReadValueId, ParsedWriteValue},
    },
    types::{AttributeId, DataValue, NodeId, StatusCode, TimestampsToReturn, Variant},
};

fn status_value(status: StatusCode) -> DataValue {
    DataValue {
        status: Some(status),
        ..Default::default()
    }
}

/// Read one attribute.
///
/// The `Value` of a variable follows `timestamps`; every other attribute is
/// returned without timestamps. Failures come back as status-only values.
pub fn read_attribute(
    address_space: &AddressSpace,
    node_to_read: &ParsedReadValueId,
    max_age: f64,
    timestamps: TimestampsToReturn,
) -> DataValue {
    let Some(node) = address_space.find(&node_to_read.node_id) else {
        return status_value(StatusCode::BadNodeIdUnknown);
    };

    let is_value = node_to_read.attribute_id == AttributeId::Value;
    if let (NodeType::Variable(variable), true) = (node, is_value) {
        if !variable.access_level().contains(AccessLevel::CURRENT_READ) {
            return status_value(StatusCode::BadNotReadable);
        }
    }

    let Some(value) = node.as_node().get_attribute_max_age(
        timestamps,
        node_to_read.attribute_id,
        &node_to_read.index_range,
        &node_to_read.data_encoding,
        max_age,
    ) else {
        return status_value(StatusCode::BadAttributeIdInvalid);
    };

    if is_value {
        value
    } else {
        DataValue {
            value: value.value,
            status: value.status,
            ..Default::default()
        }
    }
}

/// Write one attribute. Only the `Value` of a writable variable can change.
pub fn write_attribute(
    address_space: &mut AddressSpace,
    type_tree: &dyn TypeTree,
    node_to_write: &ParsedWriteValue,
) -> UaResult<()> {
    let node_id = &node_to_write.node_id;
    let Some(node) = address_space.find_mut(node_id) else {
        return Err(UaError::NodeIdUnknown {
            node_id: node_id.clone(),
        });
    };

    let NodeType::Variable(variable) = &*node else {
        return Err(if node_to_write.attribute_id == AttributeId::Value {
            UaError::AttributeIdInvalid {
                node_id: node_id.clone(),
                attribute: format!("{:?}", node_to_write.attribute_id),
            }
        } else {
            UaError::NotWritable {
                node_id: node_id.clone(),
                reason: format!("{:?} is read-only", node_to_write.attribute_id),
            }
        });
    };
    if node_to_write.attribute_id != AttributeId::Value {
        return Err(UaError::NotWritable {
            node_id: node_id.clone(),
            reason: format!("{:?} is read-only", node_to_write.attribute_id),
        });
    }
    if !variable.access_level().contains(AccessLevel::CURRENT_WRITE) {
        return Err(UaError::NotWritable {
            node_id: node_id.clone(),
            reason: "access level lacks CurrentWrite".to_string(),
        });
    }
    let Some(value) = node_to_write.value.value.as_ref() else {
        return Err(UaError::NothingToDo {
            node_id: node_id.clone(),
        });
    };

    let data_type = variable.data_type();
    let mismatch = || UaError::TypeMismatch {
        expected: data_type.clone(),
        actual: variant_type_name(value),
    };
    validate_value_to_write(variable, value, type_tree).map_err(|_| mismatch())?;
    if !value_conforms(type_tree, &data_type, value) {
        return Err(mismatch());
    }

    write_node_value(node, node_to_write).map_err(UaError::Status)
}

/// Whether `value` may be stored in a variable declared as `data_type`.
///
/// The built-in type of the variant must derive from the declared type, or
/// the declared type must derive from it (a `UtcTime` travels as a
/// `DateTime`). Empty values always conform.
pub fn value_conforms(type_tree: &dyn TypeTree, data_type: &NodeId, value: &Variant) -> bool {
    if matches!(value, Variant::Empty) {
        return true;
    }
    let Some(value_type) = value
        .data_type()
        .and_then(|t| t.try_resolve(type_tree.namespaces()).map(|id| id.into_owned()))
    else {
        return false;
    };
    type_tree.is_subtype_of(&value_type, data_type)
        || type_tree.is_subtype_of(data_type, &value_type)
}

/// Short type label of a variant, used in error messages.
pub fn variant_type_name(value: &Variant) -> String {
    match value.scalar_type_id() {
        Some(type_id) => format!("{type_id:?}"),
        None => "Empty".to_string(),
    }
}
