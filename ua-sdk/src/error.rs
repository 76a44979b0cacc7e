use opcua::types::{NodeId, StatusCode};
use thiserror::Error;

/// Namespace and host-collaborator errors.
///
/// Every variant maps onto exactly one OPC UA status code so that batch
/// operations can report per-item failures without losing the reason.
#[derive(Error, Debug, Clone)]
pub enum UaError {
    /// Node id is not owned by the namespace that was asked
    #[error("Node id unknown: {node_id}")]
    NodeIdUnknown { node_id: NodeId },

    /// Attribute does not exist for the node class
    #[error("Attribute {attribute} is not valid for node {node_id}")]
    AttributeIdInvalid { node_id: NodeId, attribute: String },

    /// Value attribute read without CurrentRead access
    #[error("Node {node_id} is not readable")]
    NotReadable { node_id: NodeId },

    /// Attribute or value is not writable
    #[error("Node {node_id} is not writable: {reason}")]
    NotWritable { node_id: NodeId, reason: String },

    /// Write carried no value
    #[error("Nothing to write for node {node_id}")]
    NothingToDo { node_id: NodeId },

    /// Value does not conform to the declared data type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: NodeId, actual: String },

    /// Reference already present on the source node
    #[error("Duplicate reference from {source_node_id} to {target_node_id}")]
    DuplicateReference {
        source_node_id: NodeId,
        target_node_id: NodeId,
    },

    /// Method id does not resolve to an invocable method
    #[error("Method invalid: {method_id}")]
    MethodInvalid { method_id: NodeId },

    /// Fewer input arguments than declared
    #[error("Arguments missing: expected {expected}, got {actual}")]
    ArgumentsMissing { expected: usize, actual: usize },

    /// More input arguments than declared
    #[error("Too many arguments: expected {expected}, got {actual}")]
    TooManyArguments { expected: usize, actual: usize },

    /// Argument failed validation
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Namespace index or uri already registered
    #[error("Namespace conflict: index {index} / uri '{uri}' is already registered")]
    NamespaceConflict { index: u16, uri: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Bare status reported by a collaborator
    #[error("Bad status: {0:?}")]
    Status(StatusCode),
}

impl UaError {
    /// Status code carried by this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UaError::NodeIdUnknown { .. } => StatusCode::BadNodeIdUnknown,
            UaError::AttributeIdInvalid { .. } => StatusCode::BadAttributeIdInvalid,
            UaError::NotReadable { .. } => StatusCode::BadNotReadable,
            UaError::NotWritable { .. } => StatusCode::BadNotWritable,
            UaError::NothingToDo { .. } => StatusCode::BadNothingToDo,
            UaError::TypeMismatch { .. } => StatusCode::BadTypeMismatch,
            UaError::DuplicateReference { .. } => StatusCode::BadDuplicateReferenceNotAllowed,
            UaError::MethodInvalid { .. } => StatusCode::BadMethodInvalid,
            UaError::ArgumentsMissing { .. } => StatusCode::BadArgumentsMissing,
            UaError::TooManyArguments { .. } => StatusCode::BadTooManyArguments,
            UaError::InvalidArgument { .. } => StatusCode::BadInvalidArgument,
            UaError::NamespaceConflict { .. } => StatusCode::BadConfigurationError,
            UaError::ConfigurationError { .. } => StatusCode::BadConfigurationError,
            UaError::Status(status) => *status,
        }
    }
}

impl From<StatusCode> for UaError {
    fn from(status: StatusCode) -> Self {
        UaError::Status(status)
    }
}

impl From<serde_json::Error> for UaError {
    fn from(err: serde_json::Error) -> Self {
        UaError::ConfigurationError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_follows_variant() {
        let err = UaError::NodeIdUnknown {
            node_id: NodeId::new(2, "/missing"),
        };
        assert_eq!(err.status_code(), StatusCode::BadNodeIdUnknown);

        let err = UaError::TypeMismatch {
            expected: NodeId::new(0, 6u32),
            actual: "String".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BadTypeMismatch);
        assert!(err.to_string().starts_with("type mismatch"));
    }

    #[test]
    fn bare_status_round_trips() {
        let err = UaError::from(StatusCode::BadOutOfRange);
        assert_eq!(err.status_code(), StatusCode::BadOutOfRange);
    }

    #[test]
    fn json_errors_become_configuration_errors() {
        let err: UaError = serde_json::from_str::<u16>("\"x\"").unwrap_err().into();
        assert!(matches!(err, UaError::ConfigurationError { .. }));
    }
}
