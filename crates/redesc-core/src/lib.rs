//! # redesc-core
//!
//! A library for turning a linked protobuf definition pool back into
//! canonical, serializable descriptor messages.
//!
//! This crate provides the core functionality for:
//! - Walking a schema registry through read-only accessor traits
//! - Rebuilding `FileDescriptorProto` trees (and every element below them)
//!   with canonical default values and qualified type references
//! - Deep-copying options messages without losing unknown fields or extensions
//! - Accounting every output allocation against a bounded [`Arena`]
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`registry`]: Accessor traits, and their implementation for `prost-reflect`
//! - [`convert`]: The converters and the value canonicalizer
//! - [`descriptor`]: Descriptor messages mirroring `descriptor.proto`
//! - [`arena`]: Allocation ledger with limits
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use redesc_core::{pool_to_proto, registry::reflect, ArenaConfig};
//! use prost::Message;
//!
//! // Load a descriptor set written by `protoc --descriptor_set_out`
//! let pool = reflect::load_pool("./schema.binpb")?;
//!
//! // Re-materialize every file of the pool
//! let set = pool_to_proto(&pool, &ArenaConfig::new().max_bytes(16 << 20))?;
//! for file in &set.file {
//!     println!("{}: {} bytes", file.name(), file.encoded_len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! The converter is generic over the traits in [`registry`]; implementing
//! [`FileDef`] and its companions for another schema representation makes it
//! convertible as well.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod arena;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod registry;

#[cfg(test)]
mod testutil;

// Re-export primary types for convenience
pub use arena::{Arena, ArenaConfig};
pub use convert::{
    enum_to_proto, enum_value_to_proto, field_to_proto, file_to_proto, message_to_proto,
    method_to_proto, oneof_to_proto, pool_to_proto, service_to_proto, Converter,
    ConverterConfig,
};
pub use descriptor::{FileDescriptorProto, FileDescriptorSet, Options};
pub use error::{Error, Result};
pub use registry::{
    EnumDef, EnumValueDef, ExtensionRangeDef, FieldDef, FileDef, HasOptions, MessageDef,
    MethodDef, Named, OneofDef, ServiceDef, Syntax,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
