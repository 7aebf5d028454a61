//! Descriptor messages produced by the converter.
//!
//! These mirror `google/protobuf/descriptor.proto` field for field and tag
//! for tag, so the encoded output is a standard descriptor. They differ from
//! their `prost_types` counterparts in one respect: every `options` field is
//! an [`Options`] that keeps the encoded bytes verbatim, so custom options and
//! fields unknown to `prost_types` survive a round trip.
//!
//! `source_code_info` is not modelled; it is never produced by conversion and
//! is skipped when decoding.

mod options;

use prost::{DecodeError, Message};
use prost_types::field_descriptor_proto::{Label, Type};

pub use options::Options;

/// A set of file descriptors, as written by `protoc --descriptor_set_out`
#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorSet {
    /// The files, in dependency order
    #[prost(message, repeated, tag = "1")]
    pub file: Vec<FileDescriptorProto>,
}

/// Describes a complete `.proto` file
#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorProto {
    /// File name, relative to the source tree root
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Package, absent when empty
    #[prost(string, optional, tag = "2")]
    pub package: Option<String>,
    /// Names of imported files
    #[prost(string, repeated, tag = "3")]
    pub dependency: Vec<String>,
    /// Indexes into `dependency` of the public imports
    #[prost(int32, repeated, packed = "false", tag = "10")]
    pub public_dependency: Vec<i32>,
    /// Indexes into `dependency` of the weak imports
    #[prost(int32, repeated, packed = "false", tag = "11")]
    pub weak_dependency: Vec<i32>,
    /// Top-level messages
    #[prost(message, repeated, tag = "4")]
    pub message_type: Vec<DescriptorProto>,
    /// Top-level enums
    #[prost(message, repeated, tag = "5")]
    pub enum_type: Vec<EnumDescriptorProto>,
    /// Services
    #[prost(message, repeated, tag = "6")]
    pub service: Vec<ServiceDescriptorProto>,
    /// Top-level extensions
    #[prost(message, repeated, tag = "7")]
    pub extension: Vec<FieldDescriptorProto>,
    /// File options
    #[prost(message, optional, tag = "8")]
    pub options: Option<Options<prost_types::FileOptions>>,
    /// `"proto3"` for proto3 files; absent for proto2 and editions files
    #[prost(string, optional, tag = "12")]
    pub syntax: Option<String>,
    /// Edition number, present only for editions files
    #[prost(int32, optional, tag = "14")]
    pub edition: Option<i32>,
}

/// Describes a message type
#[derive(Clone, PartialEq, Message)]
pub struct DescriptorProto {
    /// Short name
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Fields in declaration order
    #[prost(message, repeated, tag = "2")]
    pub field: Vec<FieldDescriptorProto>,
    /// Extensions declared inside this message
    #[prost(message, repeated, tag = "6")]
    pub extension: Vec<FieldDescriptorProto>,
    /// Nested message types
    #[prost(message, repeated, tag = "3")]
    pub nested_type: Vec<DescriptorProto>,
    /// Nested enums
    #[prost(message, repeated, tag = "4")]
    pub enum_type: Vec<EnumDescriptorProto>,
    /// Extension number ranges
    #[prost(message, repeated, tag = "5")]
    pub extension_range: Vec<ExtensionRange>,
    /// Oneofs, synthetic ones included
    #[prost(message, repeated, tag = "8")]
    pub oneof_decl: Vec<OneofDescriptorProto>,
    /// Message options
    #[prost(message, optional, tag = "7")]
    pub options: Option<Options<prost_types::MessageOptions>>,
    /// Reserved field number ranges
    #[prost(message, repeated, tag = "9")]
    pub reserved_range: Vec<ReservedRange>,
    /// Reserved field names
    #[prost(string, repeated, tag = "10")]
    pub reserved_name: Vec<String>,
}

/// An extension number range of a message; `end` is exclusive
#[derive(Clone, PartialEq, Message)]
pub struct ExtensionRange {
    /// First number of the range
    #[prost(int32, optional, tag = "1")]
    pub start: Option<i32>,
    /// One past the last number of the range
    #[prost(int32, optional, tag = "2")]
    pub end: Option<i32>,
    /// Extension range options
    #[prost(message, optional, tag = "3")]
    pub options: Option<Options<prost_types::ExtensionRangeOptions>>,
}

/// A reserved field number range of a message; `end` is exclusive
#[derive(Clone, PartialEq, Message)]
pub struct ReservedRange {
    /// First reserved number
    #[prost(int32, optional, tag = "1")]
    pub start: Option<i32>,
    /// One past the last reserved number
    #[prost(int32, optional, tag = "2")]
    pub end: Option<i32>,
}

/// Describes a field or an extension
#[derive(Clone, PartialEq, Message)]
pub struct FieldDescriptorProto {
    /// Short name
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Field number
    #[prost(int32, optional, tag = "3")]
    pub number: Option<i32>,
    /// Cardinality
    #[prost(enumeration = "Label", optional, tag = "4")]
    pub label: Option<i32>,
    /// Field type
    #[prost(enumeration = "Type", optional, tag = "5")]
    pub r#type: Option<i32>,
    /// Leading-dot qualified name of the message or enum type
    #[prost(string, optional, tag = "6")]
    pub type_name: Option<String>,
    /// Leading-dot qualified name of the extended message
    #[prost(string, optional, tag = "2")]
    pub extendee: Option<String>,
    /// Canonical text of an explicit default
    #[prost(string, optional, tag = "7")]
    pub default_value: Option<String>,
    /// Index into the containing message's `oneof_decl`
    #[prost(int32, optional, tag = "9")]
    pub oneof_index: Option<i32>,
    /// JSON name, present only when set explicitly
    #[prost(string, optional, tag = "10")]
    pub json_name: Option<String>,
    /// Field options
    #[prost(message, optional, tag = "8")]
    pub options: Option<Options<prost_types::FieldOptions>>,
    /// Set for proto3 `optional` fields
    #[prost(bool, optional, tag = "17")]
    pub proto3_optional: Option<bool>,
}

/// Describes a oneof
#[derive(Clone, PartialEq, Message)]
pub struct OneofDescriptorProto {
    /// Short name
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Oneof options
    #[prost(message, optional, tag = "2")]
    pub options: Option<Options<prost_types::OneofOptions>>,
}

/// Describes an enum type
#[derive(Clone, PartialEq, Message)]
pub struct EnumDescriptorProto {
    /// Short name
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Values in declaration order
    #[prost(message, repeated, tag = "2")]
    pub value: Vec<EnumValueDescriptorProto>,
    /// Enum options
    #[prost(message, optional, tag = "3")]
    pub options: Option<Options<prost_types::EnumOptions>>,
    /// Reserved value number ranges
    #[prost(message, repeated, tag = "4")]
    pub reserved_range: Vec<EnumReservedRange>,
    /// Reserved value names
    #[prost(string, repeated, tag = "5")]
    pub reserved_name: Vec<String>,
}

/// A reserved value range of an enum; unlike message ranges, `end` is inclusive
#[derive(Clone, PartialEq, Message)]
pub struct EnumReservedRange {
    /// First reserved number
    #[prost(int32, optional, tag = "1")]
    pub start: Option<i32>,
    /// Last reserved number
    #[prost(int32, optional, tag = "2")]
    pub end: Option<i32>,
}

/// Describes an enum value
#[derive(Clone, PartialEq, Message)]
pub struct EnumValueDescriptorProto {
    /// Short name
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Numeric value
    #[prost(int32, optional, tag = "2")]
    pub number: Option<i32>,
    /// Enum value options
    #[prost(message, optional, tag = "3")]
    pub options: Option<Options<prost_types::EnumValueOptions>>,
}

/// Describes a service
#[derive(Clone, PartialEq, Message)]
pub struct ServiceDescriptorProto {
    /// Short name
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Methods in declaration order
    #[prost(message, repeated, tag = "2")]
    pub method: Vec<MethodDescriptorProto>,
    /// Service options
    #[prost(message, optional, tag = "3")]
    pub options: Option<Options<prost_types::ServiceOptions>>,
}

/// Describes a service method
#[derive(Clone, PartialEq, Message)]
pub struct MethodDescriptorProto {
    /// Short name
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    /// Leading-dot qualified input type
    #[prost(string, optional, tag = "2")]
    pub input_type: Option<String>,
    /// Leading-dot qualified output type
    #[prost(string, optional, tag = "3")]
    pub output_type: Option<String>,
    /// Method options
    #[prost(message, optional, tag = "4")]
    pub options: Option<Options<prost_types::MethodOptions>>,
    /// Present (and true) only for client-streaming methods
    #[prost(bool, optional, tag = "5")]
    pub client_streaming: Option<bool>,
    /// Present (and true) only for server-streaming methods
    #[prost(bool, optional, tag = "6")]
    pub server_streaming: Option<bool>,
}

impl FileDescriptorProto {
    /// Converts into the `prost_types` representation.
    ///
    /// Lossy: option fields unknown to `prost_types` are dropped.
    pub fn to_prost(&self) -> Result<prost_types::FileDescriptorProto, DecodeError> {
        prost_types::FileDescriptorProto::decode(self.encode_to_vec().as_slice())
    }
}

impl FileDescriptorSet {
    /// Converts into the `prost_types` representation, see
    /// [`FileDescriptorProto::to_prost`].
    pub fn to_prost(&self) -> Result<prost_types::FileDescriptorSet, DecodeError> {
        prost_types::FileDescriptorSet::decode(self.encode_to_vec().as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_prost_file() -> prost_types::FileDescriptorProto {
        prost_types::FileDescriptorProto {
            name: Some("shop/order.proto".to_string()),
            package: Some("shop".to_string()),
            dependency: vec!["shop/common.proto".to_string()],
            public_dependency: vec![0],
            message_type: vec![prost_types::DescriptorProto {
                name: Some("Order".to_string()),
                field: vec![prost_types::FieldDescriptorProto {
                    name: Some("state".to_string()),
                    number: Some(3),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::Enum as i32),
                    type_name: Some(".shop.State".to_string()),
                    default_value: Some("OPEN".to_string()),
                    json_name: Some("state".to_string()),
                    options: Some(prost_types::FieldOptions {
                        deprecated: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                reserved_range: vec![prost_types::descriptor_proto::ReservedRange {
                    start: Some(8),
                    end: Some(10),
                }],
                reserved_name: vec!["legacy".to_string()],
                ..Default::default()
            }],
            service: vec![prost_types::ServiceDescriptorProto {
                name: Some("Orders".to_string()),
                method: vec![prost_types::MethodDescriptorProto {
                    name: Some("Watch".to_string()),
                    input_type: Some(".shop.Order".to_string()),
                    output_type: Some(".shop.Order".to_string()),
                    server_streaming: Some(true),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            syntax: Some("proto2".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_wire_compatible_with_prost_types() {
        let original = sample_prost_file();
        let ours = FileDescriptorProto::decode(original.encode_to_vec().as_slice()).unwrap();

        assert_eq!(ours.name(), "shop/order.proto");
        assert_eq!(ours.message_type[0].field[0].r#type(), Type::Enum);
        assert_eq!(ours.message_type[0].field[0].label(), Label::Optional);
        assert_eq!(ours.service[0].method[0].server_streaming, Some(true));
        assert_eq!(ours.to_prost().unwrap(), original);
    }

    #[test]
    fn test_typed_options_view() {
        let ours =
            FileDescriptorProto::decode(sample_prost_file().encode_to_vec().as_slice()).unwrap();
        let options = ours.message_type[0].field[0].options.as_ref().unwrap();
        assert_eq!(options.value().unwrap().deprecated, Some(true));
    }
}
