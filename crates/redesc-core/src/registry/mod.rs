//! Read-only view of a linked definition pool.
//!
//! The converter never sees a concrete registry. It walks a schema through
//! the traits in this module: identity, numbers, explicit-presence queries,
//! children in declaration order with exact counts, and options when present.
//! [`reflect`] implements them for the `prost_reflect` descriptor handles, so
//! any [`prost_reflect::DescriptorPool`] can be converted.
//!
//! Implementations must behave as an immutable snapshot for as long as a
//! conversion borrows them.

pub mod reflect;

use crate::error::{Error, Result};
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use std::borrow::Cow;
use std::ops::{Range, RangeInclusive};

/// Proto syntax mode of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Proto2 syntax, also the mode of files without a syntax statement
    Proto2,
    /// Proto3 syntax
    Proto3,
    /// Editions; the concrete edition is reported by [`FileDef::edition`]
    Editions,
}

impl Syntax {
    /// Returns the syntax declaration string
    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
            Syntax::Editions => "editions",
        }
    }
}

impl TryFrom<&str> for Syntax {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "" | "proto2" => Ok(Syntax::Proto2),
            "proto3" => Ok(Syntax::Proto3),
            "editions" => Ok(Syntax::Editions),
            _ => Err(Error::UnsupportedSyntax {
                syntax: value.to_string(),
            }),
        }
    }
}

/// A field default as stored by the registry, before canonicalization
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue<'a> {
    /// `bool` default
    Bool(bool),
    /// `int32`, `sint32` and `sfixed32` defaults
    Int32(i32),
    /// `int64`, `sint64` and `sfixed64` defaults
    Int64(i64),
    /// `uint32` and `fixed32` defaults
    UInt32(u32),
    /// `uint64` and `fixed64` defaults
    UInt64(u64),
    /// `float` default
    Float(f32),
    /// `double` default
    Double(f64),
    /// `string` default, unescaped
    String(Cow<'a, str>),
    /// `bytes` default, raw
    Bytes(Cow<'a, [u8]>),
    /// Enum default, by number
    Enum(i32),
}

/// Identity of a named schema element
pub trait Named {
    /// Short name
    fn name(&self) -> &str;

    /// Fully-qualified dotted name, without a leading dot
    fn full_name(&self) -> &str;
}

/// Access to the options message of a schema element
pub trait HasOptions {
    /// The source-side options message
    type Options: Message;

    /// Returns the options only if the element declares them
    fn explicit_options(&self) -> Option<Self::Options>;
}

/// A field of a message, or an extension
pub trait FieldDef: Named + HasOptions {
    /// Referenced message type
    type Message: Named;
    /// Referenced enum type
    type Enum: EnumDef;

    /// Field number
    fn number(&self) -> i32;

    /// Cardinality
    fn label(&self) -> Label;

    /// Declared type
    fn field_type(&self) -> Type;

    /// JSON name, only when set explicitly in the source
    fn explicit_json_name(&self) -> Option<&str>;

    /// Message type of message- and group-typed fields
    fn message_type(&self) -> Option<Self::Message>;

    /// Enum type of enum-typed fields
    fn enum_type(&self) -> Option<Self::Enum>;

    /// The extended message, for extensions only
    fn extendee(&self) -> Option<Self::Message>;

    /// The default value, only when the source declares one
    fn explicit_default(&self) -> Option<DefaultValue<'_>>;

    /// Index of the containing oneof within its message
    fn oneof_index(&self) -> Option<i32>;

    /// Whether the field was declared `optional` in a proto3 file
    fn is_proto3_optional(&self) -> bool;
}

/// A oneof of a message
pub trait OneofDef: Named + HasOptions {}

/// A value of an enum
pub trait EnumValueDef: Named + HasOptions {
    /// Numeric value
    fn number(&self) -> i32;
}

/// An enum type
pub trait EnumDef: Named + HasOptions {
    /// Value handle
    type Value: EnumValueDef;

    /// Values in declaration order
    fn values(&self) -> impl ExactSizeIterator<Item = Self::Value> + '_;

    /// First value declared with `number`
    fn value_by_number(&self, number: i32) -> Option<Self::Value>;

    /// Reserved number ranges, inclusive at both ends
    fn reserved_ranges(&self) -> impl ExactSizeIterator<Item = RangeInclusive<i32>> + '_;

    /// Reserved names in declaration order
    fn reserved_names(&self) -> impl ExactSizeIterator<Item = &str> + '_;
}

/// An extension number range of a message
pub trait ExtensionRangeDef: HasOptions {
    /// First number of the range
    fn start(&self) -> i32;

    /// One past the last number of the range
    fn end(&self) -> i32;
}

/// A message type
pub trait MessageDef: Named + HasOptions + Sized {
    /// Field handle
    type Field: FieldDef;
    /// Extension handle
    type Extension: FieldDef;
    /// Oneof handle
    type Oneof: OneofDef;
    /// Enum handle
    type Enum: EnumDef;
    /// Extension range handle
    type ExtensionRange: ExtensionRangeDef;

    /// Fields in declaration order
    fn fields(&self) -> impl ExactSizeIterator<Item = Self::Field> + '_;

    /// Oneofs in declaration order
    fn oneofs(&self) -> impl ExactSizeIterator<Item = Self::Oneof> + '_;

    /// Messages declared inside this one
    fn nested_messages(&self) -> impl ExactSizeIterator<Item = Self> + '_;

    /// Enums declared inside this message
    fn nested_enums(&self) -> impl ExactSizeIterator<Item = Self::Enum> + '_;

    /// Extensions declared inside this message, whatever they extend
    fn nested_extensions(&self) -> impl ExactSizeIterator<Item = Self::Extension> + '_;

    /// Extension ranges in declaration order
    fn extension_ranges(&self) -> impl ExactSizeIterator<Item = Self::ExtensionRange> + '_;

    /// Reserved field number ranges, end exclusive
    fn reserved_ranges(&self) -> impl ExactSizeIterator<Item = Range<i32>> + '_;

    /// Reserved field names in declaration order
    fn reserved_names(&self) -> impl ExactSizeIterator<Item = &str> + '_;
}

/// A service method
pub trait MethodDef: Named + HasOptions {
    /// Message handle for input and output types
    type Message: Named;

    /// Request type
    fn input_type(&self) -> Self::Message;

    /// Response type
    fn output_type(&self) -> Self::Message;

    /// Whether the client streams requests
    fn is_client_streaming(&self) -> bool;

    /// Whether the server streams responses
    fn is_server_streaming(&self) -> bool;
}

/// A service
pub trait ServiceDef: Named + HasOptions {
    /// Method handle
    type Method: MethodDef;

    /// Methods in declaration order
    fn methods(&self) -> impl ExactSizeIterator<Item = Self::Method> + '_;
}

/// A `.proto` file
pub trait FileDef: HasOptions {
    /// Message handle
    type Message: MessageDef;
    /// Enum handle
    type Enum: EnumDef;
    /// Service handle
    type Service: ServiceDef;
    /// Extension handle
    type Extension: FieldDef;

    /// File name
    fn name(&self) -> &str;

    /// Package, empty when the file declares none
    fn package(&self) -> &str;

    /// Syntax mode
    fn syntax(&self) -> Syntax;

    /// Edition number, meaningful when [`FileDef::syntax`] is editions
    fn edition(&self) -> Option<i32>;

    /// Names of imported files in import order
    fn dependencies(&self) -> impl ExactSizeIterator<Item = &str> + '_;

    /// Indexes into the dependency list of the public imports
    fn public_dependencies(&self) -> impl ExactSizeIterator<Item = i32> + '_;

    /// Indexes into the dependency list of the weak imports
    fn weak_dependencies(&self) -> impl ExactSizeIterator<Item = i32> + '_;

    /// Top-level messages in declaration order
    fn messages(&self) -> impl ExactSizeIterator<Item = Self::Message> + '_;

    /// Top-level enums in declaration order
    fn enums(&self) -> impl ExactSizeIterator<Item = Self::Enum> + '_;

    /// Services in declaration order
    fn services(&self) -> impl ExactSizeIterator<Item = Self::Service> + '_;

    /// Top-level extensions in declaration order
    fn extensions(&self) -> impl ExactSizeIterator<Item = Self::Extension> + '_;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax() {
        assert_eq!(Syntax::try_from("").unwrap(), Syntax::Proto2);
        assert_eq!(Syntax::try_from("proto2").unwrap(), Syntax::Proto2);
        assert_eq!(Syntax::try_from("proto3").unwrap(), Syntax::Proto3);
        assert_eq!(Syntax::try_from("editions").unwrap(), Syntax::Editions);
        assert!(Syntax::try_from("proto4").is_err());
        assert_eq!(Syntax::Proto3.as_str(), "proto3");
    }
}
