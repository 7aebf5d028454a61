//! Definition pool to descriptor conversion.
//!
//! A conversion walks one schema element of a registry depth-first and builds
//! the matching descriptor message, drawing every allocation from a
//! caller-supplied [`Arena`]. The first failure aborts the whole call and is
//! returned as is; no partially built tree ever reaches the caller.
//!
//! ## Example
//!
//! ```no_run
//! use redesc_core::{registry::reflect, Arena, Converter};
//! use prost::Message;
//!
//! let pool = reflect::load_pool("schema.binpb")?;
//! let file = reflect::file_by_name(&pool, "shop/catalog.proto")?;
//!
//! let arena = Arena::new();
//! let proto = Converter::new().file_to_proto(&file, &arena)?;
//! let encoded = proto.encode_to_vec();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod entity;
pub mod value;

use crate::arena::{Arena, ArenaConfig};
use crate::descriptor::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MethodDescriptorProto, OneofDescriptorProto, Options,
    ServiceDescriptorProto,
};
use crate::error::{Error, Result};
use crate::registry::{
    EnumDef, EnumValueDef, FieldDef, FileDef, HasOptions, MessageDef, MethodDef, OneofDef,
    ServiceDef,
};
use prost::Message;
use prost_reflect::DescriptorPool;
use tracing::{debug, trace};

/// Default ceiling for message nesting
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Configuration for conversion
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Deepest message nesting accepted; a top-level message is at depth 1
    pub max_depth: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConverterConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message nesting ceiling
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// State of one top-level conversion call
pub(crate) struct Context<'a> {
    arena: &'a Arena,
    depth: usize,
    max_depth: usize,
}

impl<'a> Context<'a> {
    pub(crate) fn new(arena: &'a Arena, config: &ConverterConfig) -> Self {
        Self {
            arena,
            depth: 0,
            max_depth: config.max_depth,
        }
    }

    pub(crate) fn arena(&self) -> &'a Arena {
        self.arena
    }

    pub(crate) fn alloc<T: Default>(&self) -> Result<T> {
        self.arena.alloc()
    }

    pub(crate) fn dup(&self, s: &str) -> Result<String> {
        value::dup(self.arena, s)
    }

    pub(crate) fn qualified(&self, full_name: &str) -> Result<String> {
        value::qualified(self.arena, full_name)
    }

    /// Converts every item into a slot sized to the exact item count
    pub(crate) fn collect<I, T, F>(&mut self, items: I, mut convert: F) -> Result<Vec<T>>
    where
        I: ExactSizeIterator,
        F: FnMut(&mut Self, I::Item) -> Result<T>,
    {
        let mut out = self.arena.alloc_vec(items.len())?;
        for item in items {
            out.push(convert(self, item)?);
        }
        Ok(out)
    }

    pub(crate) fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            debug!("Message nesting exceeds {}", self.max_depth);
            return Err(Error::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Copies the options of `element` if it declares any
    pub(crate) fn options_of<E: HasOptions, T>(&self, element: &E) -> Result<Option<Options<T>>> {
        element
            .explicit_options()
            .map(|options| self.copy_options(&options))
            .transpose()
    }

    /// Deep-copies an options message by encoding it into an arena buffer and
    /// parsing that buffer into arena-backed [`Options`].
    pub(crate) fn copy_options<S: Message, T>(&self, source: &S) -> Result<Options<T>> {
        let len = source.encoded_len();
        let mut encoded = self.arena.alloc_vec::<u8>(len)?;
        source
            .encode(&mut encoded)
            .map_err(|_| Error::AllocationFailure)?;

        let mut options = Options::from_encoded(self.arena.alloc_vec(len)?);
        options
            .merge(encoded.as_slice())
            .map_err(|_| Error::AllocationFailure)?;
        Ok(options)
    }
}

/// Converts registry elements into descriptor messages
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    /// Creates a converter with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a converter with custom configuration
    pub fn with_config(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    fn run<T>(
        &self,
        arena: &Arena,
        convert: impl FnOnce(&mut Context<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut cx = Context::new(arena, &self.config);
        let result = convert(&mut cx);
        trace!(
            "Conversion used {} allocations, {} bytes",
            arena.allocation_count(),
            arena.allocated_bytes()
        );
        result
    }

    /// Converts a whole file
    pub fn file_to_proto<F: FileDef>(
        &self,
        file: &F,
        arena: &Arena,
    ) -> Result<FileDescriptorProto> {
        debug!("Converting file {}", file.name());
        self.run(arena, |cx| entity::file(cx, file))
    }

    /// Converts a message with everything nested in it
    pub fn message_to_proto<M: MessageDef>(
        &self,
        message: &M,
        arena: &Arena,
    ) -> Result<DescriptorProto> {
        self.run(arena, |cx| entity::message(cx, message))
    }

    /// Converts an enum
    pub fn enum_to_proto<E: EnumDef>(
        &self,
        enum_type: &E,
        arena: &Arena,
    ) -> Result<EnumDescriptorProto> {
        self.run(arena, |cx| entity::enum_type(cx, enum_type))
    }

    /// Converts an enum value
    pub fn enum_value_to_proto<V: EnumValueDef>(
        &self,
        value: &V,
        arena: &Arena,
    ) -> Result<EnumValueDescriptorProto> {
        self.run(arena, |cx| entity::enum_value(cx, value))
    }

    /// Converts a field or an extension
    pub fn field_to_proto<F: FieldDef>(
        &self,
        field: &F,
        arena: &Arena,
    ) -> Result<FieldDescriptorProto> {
        self.run(arena, |cx| entity::field(cx, field))
    }

    /// Converts a oneof
    pub fn oneof_to_proto<O: OneofDef>(
        &self,
        oneof: &O,
        arena: &Arena,
    ) -> Result<OneofDescriptorProto> {
        self.run(arena, |cx| entity::oneof(cx, oneof))
    }

    /// Converts a service with its methods
    pub fn service_to_proto<S: ServiceDef>(
        &self,
        service: &S,
        arena: &Arena,
    ) -> Result<ServiceDescriptorProto> {
        self.run(arena, |cx| entity::service(cx, service))
    }

    /// Converts a method
    pub fn method_to_proto<M: MethodDef>(
        &self,
        method: &M,
        arena: &Arena,
    ) -> Result<MethodDescriptorProto> {
        self.run(arena, |cx| entity::method(cx, method))
    }

    /// Converts every file of `pool`, in pool order, each on a fresh arena
    /// limited by `arena_config`.
    pub fn pool_to_proto(
        &self,
        pool: &DescriptorPool,
        arena_config: &ArenaConfig,
    ) -> Result<FileDescriptorSet> {
        let mut set = FileDescriptorSet::default();
        for file in pool.files() {
            let arena = Arena::with_config(arena_config.clone());
            set.file.push(self.file_to_proto(&file, &arena)?);
        }
        debug!("Converted {} files", set.file.len());
        Ok(set)
    }
}

/// Converts a file with the default configuration
pub fn file_to_proto<F: FileDef>(file: &F, arena: &Arena) -> Result<FileDescriptorProto> {
    Converter::new().file_to_proto(file, arena)
}

/// Converts a message with the default configuration
pub fn message_to_proto<M: MessageDef>(message: &M, arena: &Arena) -> Result<DescriptorProto> {
    Converter::new().message_to_proto(message, arena)
}

/// Converts an enum with the default configuration
pub fn enum_to_proto<E: EnumDef>(enum_type: &E, arena: &Arena) -> Result<EnumDescriptorProto> {
    Converter::new().enum_to_proto(enum_type, arena)
}

/// Converts an enum value with the default configuration
pub fn enum_value_to_proto<V: EnumValueDef>(
    value: &V,
    arena: &Arena,
) -> Result<EnumValueDescriptorProto> {
    Converter::new().enum_value_to_proto(value, arena)
}

/// Converts a field or an extension with the default configuration
pub fn field_to_proto<F: FieldDef>(field: &F, arena: &Arena) -> Result<FieldDescriptorProto> {
    Converter::new().field_to_proto(field, arena)
}

/// Converts a oneof with the default configuration
pub fn oneof_to_proto<O: OneofDef>(oneof: &O, arena: &Arena) -> Result<OneofDescriptorProto> {
    Converter::new().oneof_to_proto(oneof, arena)
}

/// Converts a service with the default configuration
pub fn service_to_proto<S: ServiceDef>(
    service: &S,
    arena: &Arena,
) -> Result<ServiceDescriptorProto> {
    Converter::new().service_to_proto(service, arena)
}

/// Converts a method with the default configuration
pub fn method_to_proto<M: MethodDef>(method: &M, arena: &Arena) -> Result<MethodDescriptorProto> {
    Converter::new().method_to_proto(method, arena)
}

/// Converts every file of a pool with the default configuration
pub fn pool_to_proto(
    pool: &DescriptorPool,
    arena_config: &ArenaConfig,
) -> Result<FileDescriptorSet> {
    Converter::new().pool_to_proto(pool, arena_config)
}
