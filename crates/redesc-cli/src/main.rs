//! redesc - Re-export protobuf descriptors from linked definition pools
//!
//! This tool loads encoded `FileDescriptorSet`s, links them with
//! prost-reflect, and writes every schema file back out as a canonical
//! `FileDescriptorProto`.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use prost::Message;
use redesc_core::registry::reflect;
use redesc_core::{
    Arena, ArenaConfig, Converter, ConverterConfig, FileDescriptorProto, FileDescriptorSet,
};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// File extensions accepted as encoded descriptor sets in directory mode
const DESCRIPTOR_SET_EXTENSIONS: [&str; 5] = ["pb", "bin", "binpb", "desc", "protoset"];

/// Re-export protobuf descriptors from encoded descriptor sets
#[derive(Parser, Debug)]
#[command(name = "redesc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Output directory for re-exported descriptors
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "descriptor")]
    format: OutputFormat,

    /// Deepest message nesting accepted
    #[arg(long, env = "REDESC_MAX_DEPTH", default_value = "100")]
    max_depth: usize,

    /// Byte budget for converting one schema file (0 = unlimited)
    #[arg(long, env = "REDESC_ARENA_LIMIT", default_value = "0")]
    arena_limit: usize,

    /// Dry run - don't write files, just show what would be written
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files without prompting
    #[arg(long)]
    force: bool,

    /// Conflict resolution strategy for same-name different-content outputs
    #[arg(long, value_enum, default_value = "hash-suffix")]
    conflict_strategy: ConflictStrategy,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single encoded FileDescriptorSet
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of encoded FileDescriptorSets
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format for re-exported descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One encoded FileDescriptorProto per schema file: <name>.pb
    Descriptor,
    /// One encoded FileDescriptorSet per input
    Set,
    /// Print `<name> <digest>` per schema file
    List,
}

/// Strategy for resolving naming conflicts
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConflictStrategy {
    /// Append a short content hash: file~a1b2c3d4.proto.pb
    HashSuffix,
    /// Skip conflicting outputs (keep first occurrence only)
    SkipConflicts,
}

/// Tracks written outputs for deduplication
#[derive(Default)]
struct OutputRegistry {
    /// Maps output name -> (content_hash, output_path)
    seen: HashMap<String, Vec<(String, PathBuf)>>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    conflicts_renamed: usize,
    written: usize,
}

impl OutputRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 8 chars of blake3)
    fn content_hash(content: &[u8]) -> String {
        let hash = blake3::hash(content);
        hash.to_hex()[..8].to_string()
    }

    /// Check if this exact content was already seen for this name
    fn is_duplicate(&self, name: &str, content_hash: &str) -> bool {
        self.seen
            .get(name)
            .map(|entries| entries.iter().any(|(h, _)| h == content_hash))
            .unwrap_or(false)
    }

    /// Get the number of variants we've seen for this name
    fn variant_count(&self, name: &str) -> usize {
        self.seen.get(name).map(|e| e.len()).unwrap_or(0)
    }

    /// Register an output and return the resolved path, or `None` when it
    /// must not be written
    fn register(
        &mut self,
        name: &str,
        content_hash: &str,
        output_dir: &Path,
        strategy: ConflictStrategy,
    ) -> Result<Option<PathBuf>> {
        self.stats.total_found += 1;
        let relative = safe_relative_path(name)?;

        if self.is_duplicate(name, content_hash) {
            debug!("Skipping duplicate: {} (hash: {})", name, content_hash);
            self.stats.duplicates_skipped += 1;
            return Ok(None);
        }

        let output_path = if self.variant_count(name) == 0 {
            output_dir.join(relative)
        } else {
            match strategy {
                ConflictStrategy::SkipConflicts => {
                    debug!(
                        "Skipping conflict: {} (different content, hash: {})",
                        name, content_hash
                    );
                    self.stats.duplicates_skipped += 1;
                    return Ok(None);
                }
                ConflictStrategy::HashSuffix => {
                    let new_name = Self::add_suffix(name, &format!("~{}", content_hash));
                    info!("Conflict resolved: {} -> {} (content differs)", name, new_name);
                    self.stats.conflicts_renamed += 1;
                    output_dir.join(safe_relative_path(&new_name)?)
                }
            }
        };

        self.seen
            .entry(name.to_string())
            .or_default()
            .push((content_hash.to_string(), output_path.clone()));

        Ok(Some(output_path))
    }

    /// Add a suffix before the schema extension: `a/b.proto.pb` -> `a/b~x.proto.pb`
    fn add_suffix(name: &str, suffix: &str) -> String {
        for extension in [".proto.pb", ".binpb"] {
            if let Some(stem) = name.strip_suffix(extension) {
                return format!("{}{}{}", stem, suffix, extension);
            }
        }
        format!("{}{}", name, suffix)
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} found, {} duplicates skipped, {} conflicts renamed, {} written",
            self.stats.total_found,
            self.stats.duplicates_skipped,
            self.stats.conflicts_renamed,
            self.stats.written
        );
    }
}

/// Turns a schema-provided name into a path that stays inside the output dir
fn safe_relative_path(name: &str) -> Result<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("Refusing output path outside the output directory: {}", name)
            }
        }
    }
    if path.as_os_str().is_empty() {
        bail!("Empty output name");
    }
    Ok(path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let mut registry = OutputRegistry::new();
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file, &mut registry)?;
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory, &mut registry)?;
    } else {
        bail!("Either --file or --directory must be specified")
    }

    if cli.format != OutputFormat::List && !cli.dry_run {
        registry.print_summary();
    }
    Ok(())
}

/// Process a single descriptor set
fn process_single_file(cli: &Cli, file: &Path, registry: &mut OutputRegistry) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }
    process_descriptor_set(cli, file, registry)
}

/// Process a directory of descriptor sets recursively
fn process_directory(cli: &Cli, directory: &Path, registry: &mut OutputRegistry) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());
    let mut sets_processed = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !is_descriptor_set(path) {
            trace!("Skipping non-descriptor file: {}", path.display());
            continue;
        }

        debug!("Processing descriptor set: {}", path.display());
        if let Err(e) = process_descriptor_set(cli, path, registry) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
        }
        sets_processed += 1;
    }

    info!("Processed {} descriptor sets", sets_processed);
    Ok(())
}

/// Whether the extension marks an encoded descriptor set
fn is_descriptor_set(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| DESCRIPTOR_SET_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn converter_for(cli: &Cli) -> (Converter, ArenaConfig) {
    let converter = Converter::with_config(ConverterConfig::new().max_depth(cli.max_depth));
    let arena_config = match cli.arena_limit {
        0 => ArenaConfig::new(),
        limit => ArenaConfig::new().max_bytes(limit),
    };
    (converter, arena_config)
}

/// Load one descriptor set, convert every file and emit the results
fn process_descriptor_set(cli: &Cli, input: &Path, registry: &mut OutputRegistry) -> Result<()> {
    let pool = reflect::load_pool(input)
        .with_context(|| format!("Failed to load descriptor set: {}", input.display()))?;
    let (converter, arena_config) = converter_for(cli);

    let mut set = FileDescriptorSet::default();
    for file in pool.files() {
        let arena = Arena::with_config(arena_config.clone());
        let proto = converter
            .file_to_proto(&file, &arena)
            .with_context(|| format!("Failed to convert {}", file.name()))?;
        trace!(
            "Converted {} using {} bytes in {} allocations",
            file.name(),
            arena.allocated_bytes(),
            arena.allocation_count()
        );

        match cli.format {
            OutputFormat::List => {
                let digest = blake3::hash(&proto.encode_to_vec());
                println!("{} {}", proto.name(), digest.to_hex());
            }
            OutputFormat::Descriptor => emit_file(cli, &proto, registry)?,
            OutputFormat::Set => set.file.push(proto),
        }
    }

    if cli.format == OutputFormat::Set {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("descriptors");
        emit(cli, &format!("{}.binpb", stem), &set.encode_to_vec(), registry)?;
    }
    Ok(())
}

fn emit_file(cli: &Cli, proto: &FileDescriptorProto, registry: &mut OutputRegistry) -> Result<()> {
    emit(cli, &format!("{}.pb", proto.name()), &proto.encode_to_vec(), registry)
}

/// Register an output and write it unless it is a duplicate or a skipped conflict
fn emit(cli: &Cli, name: &str, content: &[u8], registry: &mut OutputRegistry) -> Result<()> {
    let content_hash = OutputRegistry::content_hash(content);
    let Some(output_path) =
        registry.register(name, &content_hash, &cli.output, cli.conflict_strategy)?
    else {
        return Ok(());
    };

    if cli.dry_run {
        println!("Would write: {} ({} bytes)", output_path.display(), content.len());
        return Ok(());
    }

    match write_output_file(&output_path, content, cli.force) {
        Ok(()) => {
            println!("Wrote {}", output_path.display());
            registry.stats.written += 1;
        }
        Err(e) => {
            error!("Failed to write {}: {:#}", output_path.display(), e);
        }
    }
    Ok(())
}

/// Write an output file, creating parent directories
fn write_output_file(output_path: &Path, content: &[u8], force: bool) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}
