//! Accessor traits for `prost_reflect` descriptor handles.
//!
//! `prost_reflect` resolves names, kinds and defaults; the explicit-presence
//! queries that it does not expose directly (json names, defaults, options,
//! proto3 `optional`) are answered from the raw descriptor protos it keeps
//! alongside each handle.
//!
//! Children are listed in declaration order, which is the order of the raw
//! protos: `prost_reflect` itself iterates fields and enum values by number.

use super::{
    DefaultValue, EnumDef, EnumValueDef, ExtensionRangeDef, FieldDef, FileDef, HasOptions,
    MessageDef, MethodDef, Named, OneofDef, ServiceDef, Syntax,
};
use crate::descriptor::{self, ExtensionRange};
use crate::error::{Error, Result};
use prost::Message;
use prost_reflect::{
    DescriptorPool, DynamicMessage, EnumDescriptor, EnumValueDescriptor, ExtensionDescriptor,
    FieldDescriptor, FileDescriptor, Kind, MessageDescriptor, MethodDescriptor, OneofDescriptor,
    ServiceDescriptor, Value,
};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::ExtensionRangeOptions;
use std::borrow::Cow;
use std::ops::{Range, RangeInclusive};
use std::path::Path;
use tracing::debug;

/// Decodes an encoded `FileDescriptorSet` into a linked pool
pub fn decode_pool(bytes: &[u8]) -> Result<DescriptorPool> {
    DescriptorPool::decode(bytes).map_err(|e| Error::descriptor_build(e.to_string()))
}

/// Reads an encoded `FileDescriptorSet` (e.g. `protoc --descriptor_set_out`)
/// from disk and links it into a pool
pub fn load_pool(path: impl AsRef<Path>) -> Result<DescriptorPool> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    debug!("Read {} bytes of descriptor set from {}", data.len(), path.display());
    decode_pool(&data)
}

/// Looks up a file of the pool by name
pub fn file_by_name(pool: &DescriptorPool, name: &str) -> Result<FileDescriptor> {
    pool.get_file_by_name(name)
        .ok_or_else(|| Error::FileNotFound(name.to_string()))
}

/// Collects an iterator so its length is known up front
fn exact<I: Iterator>(iter: I) -> std::vec::IntoIter<I::Item> {
    iter.collect::<Vec<_>>().into_iter()
}

macro_rules! impl_named {
    ($($ty:ty),* $(,)?) => {$(
        impl Named for $ty {
            fn name(&self) -> &str {
                <$ty>::name(self)
            }

            fn full_name(&self) -> &str {
                <$ty>::full_name(self)
            }
        }
    )*};
}

impl_named!(
    MessageDescriptor,
    FieldDescriptor,
    ExtensionDescriptor,
    OneofDescriptor,
    EnumDescriptor,
    EnumValueDescriptor,
    ServiceDescriptor,
    MethodDescriptor,
);

macro_rules! impl_options {
    ($($ty:ty => $proto:ident),* $(,)?) => {$(
        impl HasOptions for $ty {
            type Options = DynamicMessage;

            fn explicit_options(&self) -> Option<DynamicMessage> {
                self.$proto().options.is_some().then(|| self.options())
            }
        }
    )*};
}

impl_options!(
    FileDescriptor => file_descriptor_proto,
    MessageDescriptor => descriptor_proto,
    FieldDescriptor => field_descriptor_proto,
    ExtensionDescriptor => field_descriptor_proto,
    OneofDescriptor => oneof_descriptor_proto,
    EnumDescriptor => enum_descriptor_proto,
    EnumValueDescriptor => enum_value_descriptor_proto,
    ServiceDescriptor => service_descriptor_proto,
    MethodDescriptor => method_descriptor_proto,
);

fn message_kind(kind: Kind) -> Option<MessageDescriptor> {
    match kind {
        Kind::Message(message) => Some(message),
        _ => None,
    }
}

fn enum_kind(kind: Kind) -> Option<EnumDescriptor> {
    match kind {
        Kind::Enum(enum_type) => Some(enum_type),
        _ => None,
    }
}

fn default_from_value(value: Value) -> Option<DefaultValue<'static>> {
    Some(match value {
        Value::Bool(v) => DefaultValue::Bool(v),
        Value::I32(v) => DefaultValue::Int32(v),
        Value::I64(v) => DefaultValue::Int64(v),
        Value::U32(v) => DefaultValue::UInt32(v),
        Value::U64(v) => DefaultValue::UInt64(v),
        Value::F32(v) => DefaultValue::Float(v),
        Value::F64(v) => DefaultValue::Double(v),
        Value::String(v) => DefaultValue::String(Cow::Owned(v)),
        Value::Bytes(v) => DefaultValue::Bytes(Cow::Owned(v.to_vec())),
        Value::EnumNumber(v) => DefaultValue::Enum(v),
        _ => return None,
    })
}

impl FieldDef for FieldDescriptor {
    type Message = MessageDescriptor;
    type Enum = EnumDescriptor;

    fn number(&self) -> i32 {
        self.field_descriptor_proto().number()
    }

    fn label(&self) -> Label {
        self.field_descriptor_proto().label()
    }

    fn field_type(&self) -> Type {
        self.field_descriptor_proto().r#type()
    }

    fn explicit_json_name(&self) -> Option<&str> {
        self.field_descriptor_proto().json_name.as_deref()
    }

    fn message_type(&self) -> Option<MessageDescriptor> {
        message_kind(self.kind())
    }

    fn enum_type(&self) -> Option<EnumDescriptor> {
        enum_kind(self.kind())
    }

    fn extendee(&self) -> Option<MessageDescriptor> {
        None
    }

    fn explicit_default(&self) -> Option<DefaultValue<'_>> {
        self.field_descriptor_proto().default_value.as_ref()?;
        default_from_value(Value::default_value_for_field(self))
    }

    fn oneof_index(&self) -> Option<i32> {
        self.field_descriptor_proto().oneof_index
    }

    fn is_proto3_optional(&self) -> bool {
        self.field_descriptor_proto().proto3_optional()
    }
}

impl FieldDef for ExtensionDescriptor {
    type Message = MessageDescriptor;
    type Enum = EnumDescriptor;

    fn number(&self) -> i32 {
        self.field_descriptor_proto().number()
    }

    fn label(&self) -> Label {
        self.field_descriptor_proto().label()
    }

    fn field_type(&self) -> Type {
        self.field_descriptor_proto().r#type()
    }

    fn explicit_json_name(&self) -> Option<&str> {
        self.field_descriptor_proto().json_name.as_deref()
    }

    fn message_type(&self) -> Option<MessageDescriptor> {
        message_kind(self.kind())
    }

    fn enum_type(&self) -> Option<EnumDescriptor> {
        enum_kind(self.kind())
    }

    fn extendee(&self) -> Option<MessageDescriptor> {
        Some(self.containing_message())
    }

    fn explicit_default(&self) -> Option<DefaultValue<'_>> {
        self.field_descriptor_proto().default_value.as_ref()?;
        default_from_value(Value::default_value_for_extension(self))
    }

    fn oneof_index(&self) -> Option<i32> {
        self.field_descriptor_proto().oneof_index
    }

    fn is_proto3_optional(&self) -> bool {
        self.field_descriptor_proto().proto3_optional()
    }
}

impl OneofDef for OneofDescriptor {}

impl EnumValueDef for EnumValueDescriptor {
    fn number(&self) -> i32 {
        EnumValueDescriptor::number(self)
    }
}

impl EnumDef for EnumDescriptor {
    type Value = EnumValueDescriptor;

    fn values(&self) -> impl ExactSizeIterator<Item = EnumValueDescriptor> + '_ {
        exact(
            self.enum_descriptor_proto()
                .value
                .iter()
                .filter_map(|value| self.get_value_by_name(value.name())),
        )
    }

    fn value_by_number(&self, number: i32) -> Option<EnumValueDescriptor> {
        let first = self
            .enum_descriptor_proto()
            .value
            .iter()
            .find(|value| value.number() == number)?;
        self.get_value_by_name(first.name())
    }

    fn reserved_ranges(&self) -> impl ExactSizeIterator<Item = RangeInclusive<i32>> + '_ {
        self.enum_descriptor_proto()
            .reserved_range
            .iter()
            .map(|range| range.start()..=range.end())
    }

    fn reserved_names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.enum_descriptor_proto()
            .reserved_name
            .iter()
            .map(String::as_str)
    }
}

impl HasOptions for ExtensionRange {
    type Options = descriptor::Options<ExtensionRangeOptions>;

    fn explicit_options(&self) -> Option<Self::Options> {
        self.options.clone()
    }
}

impl ExtensionRangeDef for ExtensionRange {
    fn start(&self) -> i32 {
        ExtensionRange::start(self)
    }

    fn end(&self) -> i32 {
        ExtensionRange::end(self)
    }
}

/// Extension ranges of `message` with their options as encoded in the source.
///
/// `prost_reflect` only hands out extension range options as prost-types
/// values, which have dropped unknown fields, so the ranges are read from the
/// raw bytes of the parent file instead.
fn raw_extension_ranges(message: &MessageDescriptor) -> Vec<ExtensionRange> {
    match raw_message(message) {
        Some(raw) => raw.extension_range,
        None => message
            .descriptor_proto()
            .extension_range
            .iter()
            .filter_map(|range| ExtensionRange::decode(range.encode_to_vec().as_slice()).ok())
            .collect(),
    }
}

/// Finds the raw proto of `message` in the encoded bytes of its file
fn raw_message(message: &MessageDescriptor) -> Option<descriptor::DescriptorProto> {
    let file = message.parent_file();
    let raw = descriptor::FileDescriptorProto::decode(file.encode_to_vec().as_slice()).ok()?;

    let package = file.package_name();
    let relative = if package.is_empty() {
        message.full_name()
    } else {
        message
            .full_name()
            .strip_prefix(package)?
            .strip_prefix('.')?
    };

    let mut level = raw.message_type;
    let mut found = None;
    for name in relative.split('.') {
        let mut current = level.into_iter().find(|m| m.name() == name)?;
        level = std::mem::take(&mut current.nested_type);
        found = Some(current);
    }
    found
}

impl MessageDef for MessageDescriptor {
    type Field = FieldDescriptor;
    type Extension = ExtensionDescriptor;
    type Oneof = OneofDescriptor;
    type Enum = EnumDescriptor;
    type ExtensionRange = ExtensionRange;

    fn fields(&self) -> impl ExactSizeIterator<Item = FieldDescriptor> + '_ {
        exact(
            self.descriptor_proto()
                .field
                .iter()
                .filter_map(|field| u32::try_from(field.number()).ok())
                .filter_map(|number| self.get_field(number)),
        )
    }

    fn oneofs(&self) -> impl ExactSizeIterator<Item = OneofDescriptor> + '_ {
        exact(MessageDescriptor::oneofs(self))
    }

    fn nested_messages(&self) -> impl ExactSizeIterator<Item = MessageDescriptor> + '_ {
        exact(self.child_messages())
    }

    fn nested_enums(&self) -> impl ExactSizeIterator<Item = EnumDescriptor> + '_ {
        exact(self.child_enums())
    }

    fn nested_extensions(&self) -> impl ExactSizeIterator<Item = ExtensionDescriptor> + '_ {
        exact(self.child_extensions())
    }

    fn extension_ranges(&self) -> impl ExactSizeIterator<Item = ExtensionRange> + '_ {
        let ranges = if self.descriptor_proto().extension_range.is_empty() {
            Vec::new()
        } else {
            raw_extension_ranges(self)
        };
        ranges.into_iter()
    }

    fn reserved_ranges(&self) -> impl ExactSizeIterator<Item = Range<i32>> + '_ {
        self.descriptor_proto()
            .reserved_range
            .iter()
            .map(|range| range.start()..range.end())
    }

    fn reserved_names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.descriptor_proto()
            .reserved_name
            .iter()
            .map(String::as_str)
    }
}

impl MethodDef for MethodDescriptor {
    type Message = MessageDescriptor;

    fn input_type(&self) -> MessageDescriptor {
        self.input()
    }

    fn output_type(&self) -> MessageDescriptor {
        self.output()
    }

    fn is_client_streaming(&self) -> bool {
        MethodDescriptor::is_client_streaming(self)
    }

    fn is_server_streaming(&self) -> bool {
        MethodDescriptor::is_server_streaming(self)
    }
}

impl ServiceDef for ServiceDescriptor {
    type Method = MethodDescriptor;

    fn methods(&self) -> impl ExactSizeIterator<Item = MethodDescriptor> + '_ {
        exact(ServiceDescriptor::methods(self))
    }
}

/// Only the `edition` field of a `FileDescriptorProto`
#[derive(Clone, PartialEq, Message)]
struct EditionOnly {
    #[prost(int32, optional, tag = "14")]
    edition: Option<i32>,
}

impl FileDef for FileDescriptor {
    type Message = MessageDescriptor;
    type Enum = EnumDescriptor;
    type Service = ServiceDescriptor;
    type Extension = ExtensionDescriptor;

    fn name(&self) -> &str {
        FileDescriptor::name(self)
    }

    fn package(&self) -> &str {
        self.package_name()
    }

    fn syntax(&self) -> Syntax {
        Syntax::try_from(self.file_descriptor_proto().syntax()).unwrap_or(Syntax::Proto2)
    }

    fn edition(&self) -> Option<i32> {
        // prost-types has no edition field, so read it from the raw bytes
        EditionOnly::decode(self.encode_to_vec().as_slice())
            .ok()?
            .edition
    }

    fn dependencies(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.file_descriptor_proto()
            .dependency
            .iter()
            .map(String::as_str)
    }

    fn public_dependencies(&self) -> impl ExactSizeIterator<Item = i32> + '_ {
        self.file_descriptor_proto().public_dependency.iter().copied()
    }

    fn weak_dependencies(&self) -> impl ExactSizeIterator<Item = i32> + '_ {
        self.file_descriptor_proto().weak_dependency.iter().copied()
    }

    fn messages(&self) -> impl ExactSizeIterator<Item = MessageDescriptor> + '_ {
        exact(FileDescriptor::messages(self))
    }

    fn enums(&self) -> impl ExactSizeIterator<Item = EnumDescriptor> + '_ {
        exact(FileDescriptor::enums(self))
    }

    fn services(&self) -> impl ExactSizeIterator<Item = ServiceDescriptor> + '_ {
        exact(FileDescriptor::services(self))
    }

    fn extensions(&self) -> impl ExactSizeIterator<Item = ExtensionDescriptor> + '_ {
        exact(FileDescriptor::extensions(self))
    }
}
