//! Schema fixtures shared by the unit tests.

use crate::descriptor::{self, Options};
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::descriptor_proto::{ExtensionRange, ReservedRange};
use prost_types::enum_descriptor_proto::EnumReservedRange;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumOptions, EnumValueDescriptorProto,
    FieldDescriptorProto, FieldOptions, FileDescriptorProto, FileDescriptorSet, FileOptions,
    MethodDescriptorProto, MethodOptions, OneofDescriptorProto, ServiceDescriptorProto,
};

pub(crate) const CATALOG_FILE: &str = "shop/catalog.proto";
pub(crate) const LISTING_FILE: &str = "shop/listing.proto";
pub(crate) const SHUFFLED_FILE: &str = "shop/shuffled.proto";

/// Options field 9999 set to varint 42; unknown to every options message
pub(crate) const UNKNOWN_OPTION: [u8; 4] = [0xf8, 0xf0, 0x04, 0x2a];

fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn typed_field(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, ty)
    }
}

fn with_default(field: FieldDescriptorProto, default: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        default_value: Some(default.to_string()),
        ..field
    }
}

fn enum_value(name: &str, number: i32) -> EnumValueDescriptorProto {
    EnumValueDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        options: None,
    }
}

/// Proto2 file exercising every entity kind and every conditional field
pub(crate) fn catalog_file() -> FileDescriptorProto {
    let inner = DescriptorProto {
        name: Some("Inner".to_string()),
        field: vec![with_default(field("n", 1, Type::Uint32), "7")],
        ..Default::default()
    };
    let detail = DescriptorProto {
        name: Some("Detail".to_string()),
        field: vec![typed_field("inner", 1, Type::Message, ".shop.Item.Detail.Inner")],
        nested_type: vec![inner],
        enum_type: vec![EnumDescriptorProto {
            name: Some("Kind".to_string()),
            value: vec![enum_value("A", 0)],
            ..Default::default()
        }],
        ..Default::default()
    };

    let item = DescriptorProto {
        name: Some("Item".to_string()),
        field: vec![
            FieldDescriptorProto {
                json_name: Some("title".to_string()),
                ..field("name", 1, Type::String)
            },
            FieldDescriptorProto {
                options: Some(FieldOptions {
                    deprecated: Some(true),
                    ..Default::default()
                }),
                ..with_default(typed_field("color", 2, Type::Enum, ".shop.Color"), "GREEN")
            },
            with_default(field("ratio", 3, Type::Double), "0.33333333333333331"),
            with_default(field("blob", 4, Type::Bytes), "\\000\\177A"),
            with_default(field("weight", 5, Type::Float), "inf"),
            with_default(field("count", 6, Type::Int64), "-42"),
            FieldDescriptorProto {
                oneof_index: Some(0),
                ..field("code", 7, Type::String)
            },
            FieldDescriptorProto {
                oneof_index: Some(0),
                ..typed_field("child", 8, Type::Message, ".shop.Item")
            },
            typed_field("detail", 9, Type::Message, ".shop.Item.Detail"),
        ],
        extension: vec![FieldDescriptorProto {
            extendee: Some(".shop.Item".to_string()),
            ..field("nested_ext", 150, Type::Int32)
        }],
        nested_type: vec![detail],
        extension_range: vec![ExtensionRange {
            start: Some(100),
            end: Some(200),
            options: None,
        }],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("choice".to_string()),
            options: None,
        }],
        reserved_range: vec![ReservedRange {
            start: Some(20),
            end: Some(25),
        }],
        reserved_name: vec!["old_name".to_string()],
        ..Default::default()
    };

    let color = EnumDescriptorProto {
        name: Some("Color".to_string()),
        value: vec![enum_value("RED", 0), enum_value("GREEN", 1)],
        reserved_range: vec![EnumReservedRange {
            start: Some(5),
            end: Some(7),
        }],
        reserved_name: vec!["BLUE".to_string()],
        ..Default::default()
    };

    let method = |name: &str, server_streaming: bool| MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(".shop.Item".to_string()),
        output_type: Some(".shop.Item".to_string()),
        server_streaming: server_streaming.then_some(true),
        ..Default::default()
    };

    FileDescriptorProto {
        name: Some(CATALOG_FILE.to_string()),
        package: Some("shop".to_string()),
        message_type: vec![item],
        enum_type: vec![color],
        service: vec![ServiceDescriptorProto {
            name: Some("Catalog".to_string()),
            method: vec![
                method("Get", false),
                MethodDescriptorProto {
                    options: Some(MethodOptions {
                        deprecated: Some(true),
                        ..Default::default()
                    }),
                    ..method("Watch", true)
                },
            ],
            options: None,
        }],
        extension: vec![FieldDescriptorProto {
            extendee: Some(".shop.Item".to_string()),
            ..field("flagged", 100, Type::Bool)
        }],
        options: Some(FileOptions {
            java_package: Some("com.shop".to_string()),
            ..Default::default()
        }),
        syntax: Some("proto2".to_string()),
        ..Default::default()
    }
}

/// Proto3 file with a proto3 `optional` field and a public import
pub(crate) fn listing_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(LISTING_FILE.to_string()),
        package: Some("shop".to_string()),
        dependency: vec![CATALOG_FILE.to_string()],
        public_dependency: vec![0],
        message_type: vec![DescriptorProto {
            name: Some("Listing".to_string()),
            field: vec![
                FieldDescriptorProto {
                    oneof_index: Some(0),
                    proto3_optional: Some(true),
                    ..field("maybe", 1, Type::Int32)
                },
                typed_field("item", 2, Type::Message, ".shop.Item"),
            ],
            oneof_decl: vec![OneofDescriptorProto {
                name: Some("_maybe".to_string()),
                options: None,
            }],
            ..Default::default()
        }],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

/// Encodes `files` as a descriptor set and links it
pub(crate) fn pool_of(files: Vec<FileDescriptorProto>) -> DescriptorPool {
    let bytes = FileDescriptorSet { file: files }.encode_to_vec();
    DescriptorPool::decode(bytes.as_slice()).expect("fixture must link")
}

/// Pool holding both fixture files
pub(crate) fn pool() -> DescriptorPool {
    pool_of(vec![catalog_file(), listing_file()])
}

/// A chain of `depth` messages, each nested inside the previous one
pub(crate) fn nested_file(depth: usize) -> FileDescriptorProto {
    let mut message = DescriptorProto {
        name: Some(format!("Level{}", depth)),
        ..Default::default()
    };
    for level in (1..depth).rev() {
        message = DescriptorProto {
            name: Some(format!("Level{}", level)),
            nested_type: vec![message],
            ..Default::default()
        };
    }
    FileDescriptorProto {
        name: Some("deep.proto".to_string()),
        package: Some("deep".to_string()),
        message_type: vec![message],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

/// Proto2 file declaring fields and enum values out of number order, plus an
/// aliased enum
pub(crate) fn shuffled_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(SHUFFLED_FILE.to_string()),
        package: Some("shop".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Shuffled".to_string()),
            field: vec![field("second", 2, Type::Int32), field("first", 1, Type::Int32)],
            ..Default::default()
        }],
        enum_type: vec![
            EnumDescriptorProto {
                name: Some("Ordinal".to_string()),
                value: vec![enum_value("ONE", 1), enum_value("ZERO", 0)],
                ..Default::default()
            },
            EnumDescriptorProto {
                name: Some("Alias".to_string()),
                value: vec![
                    enum_value("NONE", 0),
                    enum_value("FIRST", 1),
                    enum_value("PRIMARY", 1),
                ],
                options: Some(EnumOptions {
                    allow_alias: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    }
}

fn unknown_option<T>() -> Option<Options<T>> {
    Some(Options::from_encoded(UNKNOWN_OPTION.to_vec()))
}

/// The catalog file with an unknown option field on every element kind
/// that carries no options in [`catalog_file`]
pub(crate) fn annotated_pool() -> DescriptorPool {
    let encoded = catalog_file().encode_to_vec();
    let mut file =
        descriptor::FileDescriptorProto::decode(encoded.as_slice()).expect("fixture must decode");

    let item = &mut file.message_type[0];
    item.options = unknown_option();
    item.oneof_decl[0].options = unknown_option();
    item.extension_range[0].options = unknown_option();
    item.extension[0].options = unknown_option();
    item.nested_type[0].nested_type[0].field[0].options = unknown_option();

    let color = &mut file.enum_type[0];
    color.options = unknown_option();
    color.value[1].options = unknown_option();

    let service = &mut file.service[0];
    service.options = unknown_option();
    service.method[0].options = unknown_option();

    let bytes = descriptor::FileDescriptorSet { file: vec![file] }.encode_to_vec();
    DescriptorPool::decode(bytes.as_slice()).expect("fixture must link")
}
