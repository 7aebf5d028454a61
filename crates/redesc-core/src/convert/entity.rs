//! One converter per schema element kind.
//!
//! Each converter allocates its destination from the arena, copies the
//! required scalars, copies optional scalars only when the source has them,
//! converts children in declaration order and finally copies options.

use super::{value, Context};
use crate::descriptor::{
    DescriptorProto, EnumDescriptorProto, EnumReservedRange, EnumValueDescriptorProto,
    ExtensionRange, FieldDescriptorProto, FileDescriptorProto, MethodDescriptorProto,
    OneofDescriptorProto, ReservedRange, ServiceDescriptorProto,
};
use crate::error::Result;
use crate::registry::{
    EnumDef, EnumValueDef, ExtensionRangeDef, FieldDef, FileDef, MessageDef, MethodDef, Named,
    OneofDef, ServiceDef, Syntax,
};
use std::ops::{Range, RangeInclusive};

pub(crate) fn field<F: FieldDef>(cx: &mut Context<'_>, f: &F) -> Result<FieldDescriptorProto> {
    let mut proto: FieldDescriptorProto = cx.alloc()?;
    proto.name = Some(cx.dup(f.name())?);
    proto.number = Some(f.number());
    proto.set_label(f.label());
    proto.set_type(f.field_type());

    if let Some(json_name) = f.explicit_json_name() {
        proto.json_name = Some(cx.dup(json_name)?);
    }

    if let Some(message) = f.message_type() {
        proto.type_name = Some(cx.qualified(message.full_name())?);
    } else if let Some(enumeration) = f.enum_type() {
        proto.type_name = Some(cx.qualified(enumeration.full_name())?);
    }

    if let Some(extendee) = f.extendee() {
        proto.extendee = Some(cx.qualified(extendee.full_name())?);
    }

    proto.default_value = value::field_default(cx.arena(), f)?;
    proto.oneof_index = f.oneof_index();
    if f.is_proto3_optional() {
        proto.proto3_optional = Some(true);
    }

    proto.options = cx.options_of(f)?;
    Ok(proto)
}

pub(crate) fn oneof<O: OneofDef>(cx: &mut Context<'_>, o: &O) -> Result<OneofDescriptorProto> {
    let mut proto: OneofDescriptorProto = cx.alloc()?;
    proto.name = Some(cx.dup(o.name())?);
    proto.options = cx.options_of(o)?;
    Ok(proto)
}

pub(crate) fn enum_value<V: EnumValueDef>(
    cx: &mut Context<'_>,
    v: &V,
) -> Result<EnumValueDescriptorProto> {
    let mut proto: EnumValueDescriptorProto = cx.alloc()?;
    proto.name = Some(cx.dup(v.name())?);
    proto.number = Some(v.number());
    proto.options = cx.options_of(v)?;
    Ok(proto)
}

fn enum_reserved_range(
    cx: &mut Context<'_>,
    range: RangeInclusive<i32>,
) -> Result<EnumReservedRange> {
    let mut proto: EnumReservedRange = cx.alloc()?;
    proto.start = Some(*range.start());
    proto.end = Some(*range.end());
    Ok(proto)
}

pub(crate) fn enum_type<E: EnumDef>(cx: &mut Context<'_>, e: &E) -> Result<EnumDescriptorProto> {
    let mut proto: EnumDescriptorProto = cx.alloc()?;
    proto.name = Some(cx.dup(e.name())?);
    proto.value = cx.collect(e.values(), |cx, v| enum_value(cx, &v))?;
    proto.reserved_range = cx.collect(e.reserved_ranges(), enum_reserved_range)?;
    proto.reserved_name = cx.collect(e.reserved_names(), |cx, name| cx.dup(name))?;
    proto.options = cx.options_of(e)?;
    Ok(proto)
}

fn extension_range<R: ExtensionRangeDef>(cx: &mut Context<'_>, r: &R) -> Result<ExtensionRange> {
    let mut proto: ExtensionRange = cx.alloc()?;
    proto.start = Some(r.start());
    proto.end = Some(r.end());
    proto.options = cx.options_of(r)?;
    Ok(proto)
}

fn reserved_range(cx: &mut Context<'_>, range: Range<i32>) -> Result<ReservedRange> {
    let mut proto: ReservedRange = cx.alloc()?;
    proto.start = Some(range.start);
    proto.end = Some(range.end);
    Ok(proto)
}

pub(crate) fn message<M: MessageDef>(cx: &mut Context<'_>, m: &M) -> Result<DescriptorProto> {
    cx.enter()?;
    let result = message_body(cx, m);
    cx.leave();
    result
}

fn message_body<M: MessageDef>(cx: &mut Context<'_>, m: &M) -> Result<DescriptorProto> {
    let mut proto: DescriptorProto = cx.alloc()?;
    proto.name = Some(cx.dup(m.name())?);
    proto.field = cx.collect(m.fields(), |cx, f| field(cx, &f))?;
    proto.oneof_decl = cx.collect(m.oneofs(), |cx, o| oneof(cx, &o))?;
    proto.nested_type = cx.collect(m.nested_messages(), |cx, nested| message(cx, &nested))?;
    proto.enum_type = cx.collect(m.nested_enums(), |cx, e| enum_type(cx, &e))?;
    proto.extension = cx.collect(m.nested_extensions(), |cx, ext| field(cx, &ext))?;
    proto.extension_range = cx.collect(m.extension_ranges(), |cx, r| extension_range(cx, &r))?;
    proto.reserved_range = cx.collect(m.reserved_ranges(), reserved_range)?;
    proto.reserved_name = cx.collect(m.reserved_names(), |cx, name| cx.dup(name))?;
    proto.options = cx.options_of(m)?;
    Ok(proto)
}

pub(crate) fn method<M: MethodDef>(cx: &mut Context<'_>, m: &M) -> Result<MethodDescriptorProto> {
    let mut proto: MethodDescriptorProto = cx.alloc()?;
    proto.name = Some(cx.dup(m.name())?);
    proto.input_type = Some(cx.qualified(m.input_type().full_name())?);
    proto.output_type = Some(cx.qualified(m.output_type().full_name())?);
    if m.is_client_streaming() {
        proto.client_streaming = Some(true);
    }
    if m.is_server_streaming() {
        proto.server_streaming = Some(true);
    }
    proto.options = cx.options_of(m)?;
    Ok(proto)
}

pub(crate) fn service<S: ServiceDef>(
    cx: &mut Context<'_>,
    s: &S,
) -> Result<ServiceDescriptorProto> {
    let mut proto: ServiceDescriptorProto = cx.alloc()?;
    proto.name = Some(cx.dup(s.name())?);
    proto.method = cx.collect(s.methods(), |cx, m| method(cx, &m))?;
    proto.options = cx.options_of(s)?;
    Ok(proto)
}

pub(crate) fn file<F: FileDef>(cx: &mut Context<'_>, f: &F) -> Result<FileDescriptorProto> {
    let mut proto: FileDescriptorProto = cx.alloc()?;
    proto.name = Some(cx.dup(f.name())?);
    if !f.package().is_empty() {
        proto.package = Some(cx.dup(f.package())?);
    }

    // proto2 is the default and is never spelled out
    match f.syntax() {
        Syntax::Editions => proto.edition = f.edition(),
        Syntax::Proto3 => proto.syntax = Some(cx.dup(Syntax::Proto3.as_str())?),
        Syntax::Proto2 => {}
    }

    proto.dependency = cx.collect(f.dependencies(), |cx, name| cx.dup(name))?;
    proto.public_dependency = cx.collect(f.public_dependencies(), |_, index| Ok(index))?;
    proto.weak_dependency = cx.collect(f.weak_dependencies(), |_, index| Ok(index))?;
    proto.message_type = cx.collect(f.messages(), |cx, m| message(cx, &m))?;
    proto.enum_type = cx.collect(f.enums(), |cx, e| enum_type(cx, &e))?;
    proto.service = cx.collect(f.services(), |cx, s| service(cx, &s))?;
    proto.extension = cx.collect(f.extensions(), |cx, ext| field(cx, &ext))?;
    proto.options = cx.options_of(f)?;
    Ok(proto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::convert::ConverterConfig;
    use crate::registry::reflect::file_by_name;
    use crate::registry::HasOptions;
    use crate::testutil;
    use pretty_assertions::assert_eq;
    use prost_types::field_descriptor_proto::{Label, Type};

    /// Editions file with no elements; the pool loader only accepts proto2
    /// and proto3, so editions conversion is exercised through this handle.
    struct EditionsFile;

    impl HasOptions for EditionsFile {
        type Options = prost_types::FileOptions;

        fn explicit_options(&self) -> Option<Self::Options> {
            None
        }
    }

    impl FileDef for EditionsFile {
        type Message = prost_reflect::MessageDescriptor;
        type Enum = prost_reflect::EnumDescriptor;
        type Service = prost_reflect::ServiceDescriptor;
        type Extension = prost_reflect::ExtensionDescriptor;

        fn name(&self) -> &str {
            "editions.proto"
        }

        fn package(&self) -> &str {
            "ed"
        }

        fn syntax(&self) -> Syntax {
            Syntax::Editions
        }

        fn edition(&self) -> Option<i32> {
            Some(1000)
        }

        fn dependencies(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
            std::iter::empty()
        }

        fn public_dependencies(&self) -> impl ExactSizeIterator<Item = i32> + '_ {
            std::iter::empty()
        }

        fn weak_dependencies(&self) -> impl ExactSizeIterator<Item = i32> + '_ {
            std::iter::empty()
        }

        fn messages(&self) -> impl ExactSizeIterator<Item = Self::Message> + '_ {
            std::iter::empty()
        }

        fn enums(&self) -> impl ExactSizeIterator<Item = Self::Enum> + '_ {
            std::iter::empty()
        }

        fn services(&self) -> impl ExactSizeIterator<Item = Self::Service> + '_ {
            std::iter::empty()
        }

        fn extensions(&self) -> impl ExactSizeIterator<Item = Self::Extension> + '_ {
            std::iter::empty()
        }
    }

    fn convert_catalog() -> FileDescriptorProto {
        let pool = testutil::pool();
        let catalog = file_by_name(&pool, testutil::CATALOG_FILE).unwrap();
        let arena = Arena::new();
        let mut cx = Context::new(&arena, &ConverterConfig::default());
        file(&mut cx, &catalog).unwrap()
    }

    #[test]
    fn test_field_conditional_omission() {
        let proto = convert_catalog();
        let fields = &proto.message_type[0].field;

        let name = &fields[0];
        assert_eq!(name.json_name.as_deref(), Some("title"));
        assert_eq!(name.type_name, None);
        assert_eq!(name.default_value, None);
        assert_eq!(name.oneof_index, None);
        assert_eq!(name.extendee, None);
        assert_eq!(name.proto3_optional, None);
        assert!(name.options.is_none());

        let count = &fields[5];
        assert_eq!(count.name(), "count");
        assert_eq!(count.json_name, None);
        assert_eq!(count.default_value.as_deref(), Some("-42"));
        assert_eq!(count.label(), Label::Optional);
        assert_eq!(count.r#type(), Type::Int64);
    }

    #[test]
    fn test_field_references_are_qualified() {
        let proto = convert_catalog();
        let item = &proto.message_type[0];
        assert_eq!(item.field[1].type_name.as_deref(), Some(".shop.Color"));
        assert_eq!(item.field[1].default_value.as_deref(), Some("GREEN"));
        assert_eq!(item.field[7].type_name.as_deref(), Some(".shop.Item"));
        assert_eq!(item.field[7].oneof_index, Some(0));
        assert_eq!(
            item.nested_type[0].field[0].type_name.as_deref(),
            Some(".shop.Item.Detail.Inner")
        );
        assert_eq!(item.extension[0].extendee.as_deref(), Some(".shop.Item"));
        assert_eq!(proto.extension[0].extendee.as_deref(), Some(".shop.Item"));
    }

    #[test]
    fn test_message_children_in_order() {
        let proto = convert_catalog();
        let item = &proto.message_type[0];
        let names: Vec<_> = item.field.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            ["name", "color", "ratio", "blob", "weight", "count", "code", "child", "detail"]
        );
        assert_eq!(item.oneof_decl[0].name(), "choice");
        assert_eq!(item.nested_type[0].name(), "Detail");
        assert_eq!(item.nested_type[0].nested_type[0].name(), "Inner");
        assert_eq!(item.nested_type[0].enum_type[0].name(), "Kind");
        assert_eq!(item.extension_range[0].start, Some(100));
        assert_eq!(item.extension_range[0].end, Some(200));
        assert_eq!(item.reserved_range[0].start, Some(20));
        assert_eq!(item.reserved_range[0].end, Some(25));
        assert_eq!(item.reserved_name, vec!["old_name".to_string()]);
    }

    #[test]
    fn test_enum() {
        let proto = convert_catalog();
        let color = &proto.enum_type[0];
        assert_eq!(color.name(), "Color");
        let values: Vec<_> = color.value.iter().map(|v| (v.name(), v.number())).collect();
        assert_eq!(values, [("RED", 0), ("GREEN", 1)]);
        assert_eq!(color.reserved_range[0].start, Some(5));
        assert_eq!(color.reserved_range[0].end, Some(7));
        assert_eq!(color.reserved_name, vec!["BLUE".to_string()]);
    }

    #[test]
    fn test_service_streaming_flags() {
        let proto = convert_catalog();
        let service = &proto.service[0];
        assert_eq!(service.name(), "Catalog");

        let get = &service.method[0];
        assert_eq!(get.input_type.as_deref(), Some(".shop.Item"));
        assert_eq!(get.output_type.as_deref(), Some(".shop.Item"));
        assert_eq!(get.client_streaming, None);
        assert_eq!(get.server_streaming, None);
        assert!(get.options.is_none());

        let watch = &service.method[1];
        assert_eq!(watch.client_streaming, None);
        assert_eq!(watch.server_streaming, Some(true));
        assert_eq!(
            watch.options.as_ref().unwrap().value().unwrap().deprecated,
            Some(true)
        );
    }

    #[test]
    fn test_file_syntax_and_package() {
        let proto = convert_catalog();
        assert_eq!(proto.name(), testutil::CATALOG_FILE);
        assert_eq!(proto.package.as_deref(), Some("shop"));
        assert_eq!(proto.syntax, None);
        assert_eq!(proto.edition, None);
        assert_eq!(
            proto.options.as_ref().unwrap().value().unwrap().java_package.as_deref(),
            Some("com.shop")
        );

        let pool = testutil::pool();
        let listing = file_by_name(&pool, testutil::LISTING_FILE).unwrap();
        let arena = Arena::new();
        let mut cx = Context::new(&arena, &ConverterConfig::default());
        let proto = file(&mut cx, &listing).unwrap();
        assert_eq!(proto.syntax.as_deref(), Some("proto3"));
        assert_eq!(proto.dependency, vec![testutil::CATALOG_FILE.to_string()]);
        assert_eq!(proto.public_dependency, vec![0]);
        assert!(proto.options.is_none());

        let maybe = &proto.message_type[0].field[0];
        assert_eq!(maybe.proto3_optional, Some(true));
        assert_eq!(maybe.oneof_index, Some(0));
        assert_eq!(proto.message_type[0].oneof_decl[0].name(), "_maybe");
    }

    #[test]
    fn test_editions_file_carries_edition_only() {
        let arena = Arena::new();
        let mut cx = Context::new(&arena, &ConverterConfig::default());
        let proto = file(&mut cx, &EditionsFile).unwrap();
        assert_eq!(proto.name(), "editions.proto");
        assert_eq!(proto.package.as_deref(), Some("ed"));
        assert_eq!(proto.edition, Some(1000));
        assert_eq!(proto.syntax, None);
        assert!(proto.message_type.is_empty());
        assert!(proto.options.is_none());
    }

    #[test]
    fn test_empty_package_is_omitted() {
        let pool = testutil::pool_of(vec![prost_types::FileDescriptorProto {
            name: Some("bare.proto".to_string()),
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }]);
        let bare = file_by_name(&pool, "bare.proto").unwrap();
        let arena = Arena::new();
        let mut cx = Context::new(&arena, &ConverterConfig::default());
        let proto = file(&mut cx, &bare).unwrap();
        assert_eq!(proto.package, None);
        assert!(proto.message_type.is_empty());
    }
}
