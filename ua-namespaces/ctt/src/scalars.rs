use opcua::types::{
    ByteString, DataTypeId, DateTime, Guid, LocalizedText, NodeId, QualifiedName, UAString,
    Variant, XmlElement,
};

/// One statically valued scalar variable of the fixture.
#[derive(Debug, Clone)]
pub struct StaticScalar {
    pub name: &'static str,
    pub data_type: DataTypeId,
    pub value: Variant,
}

impl StaticScalar {
    fn new(name: &'static str, data_type: DataTypeId, value: impl Into<Variant>) -> Self {
        Self {
            name,
            data_type,
            value: value.into(),
        }
    }
}

/// Scalar fixture table, one entry per built-in scalar type.
///
/// Time-based and Guid values are generated on each call.
pub fn static_scalars() -> Vec<StaticScalar> {
    vec![
        StaticScalar::new("Bool", DataTypeId::Boolean, Variant::Boolean(false)),
        StaticScalar::new("Byte", DataTypeId::Byte, Variant::Byte(0x00)),
        StaticScalar::new(
            "ByteString",
            DataTypeId::ByteString,
            Variant::ByteString(ByteString::from(vec![0x01u8, 0x02, 0x03, 0x04])),
        ),
        StaticScalar::new(
            "DateTime",
            DataTypeId::DateTime,
            Variant::DateTime(Box::new(DateTime::now())),
        ),
        StaticScalar::new("Double", DataTypeId::Double, Variant::Double(3.5)),
        StaticScalar::new("Float", DataTypeId::Float, Variant::Float(3.5)),
        StaticScalar::new("Guid", DataTypeId::Guid, Variant::from(Guid::new())),
        StaticScalar::new("Int16", DataTypeId::Int16, Variant::Int16(16)),
        StaticScalar::new("Int32", DataTypeId::Int32, Variant::Int32(32)),
        StaticScalar::new("Int64", DataTypeId::Int64, Variant::Int64(64)),
        StaticScalar::new(
            "LocalizedText",
            DataTypeId::LocalizedText,
            Variant::from(LocalizedText::new("en", "localized text")),
        ),
        StaticScalar::new(
            "NodeId",
            DataTypeId::NodeId,
            Variant::from(NodeId::new(1234, "abcd")),
        ),
        StaticScalar::new(
            "QualifiedName",
            DataTypeId::QualifiedName,
            Variant::from(QualifiedName::new(1234, "defg")),
        ),
        StaticScalar::new("SByte", DataTypeId::SByte, Variant::SByte(0x00)),
        StaticScalar::new(
            "String",
            DataTypeId::String,
            Variant::String(UAString::from("string value")),
        ),
        StaticScalar::new(
            "UtcTime",
            DataTypeId::UtcTime,
            Variant::DateTime(Box::new(DateTime::now())),
        ),
        StaticScalar::new("UInt16", DataTypeId::UInt16, Variant::UInt16(16)),
        StaticScalar::new("UInt32", DataTypeId::UInt32, Variant::UInt32(32)),
        StaticScalar::new("UInt64", DataTypeId::UInt64, Variant::UInt64(64)),
        StaticScalar::new(
            "XmlElement",
            DataTypeId::XmlElement,
            Variant::XmlElement(XmlElement::from("<a>hello</a>")),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use ua_sdk::{OpcUaServer, ServerContext};

    #[test]
    fn table_covers_every_builtin_scalar_once() {
        let scalars = static_scalars();
        assert_eq!(scalars.len(), 20);
        let names = scalars.iter().map(|s| s.name).collect::<HashSet<_>>();
        assert_eq!(names.len(), scalars.len());
    }

    #[test]
    fn literals_conform_to_their_data_type() {
        let manager = ServerContext::new().namespace_manager();
        for scalar in static_scalars() {
            assert!(
                manager.value_conforms(&NodeId::from(scalar.data_type), &scalar.value),
                "{} does not conform",
                scalar.name
            );
        }
    }
}
