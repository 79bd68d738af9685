//! `coswid` CLI: create, display and validate CBOR-encoded CoSWID tags.
//!
//! ## Usage
//!
//! ```sh
//! # Create a CoSWID from template t1.json in the current directory
//! coswid create --template t1.json
//!
//! # Create into a given directory, checking the template against a schema first
//! coswid create -t t1.json -o out/ --schema coswid-template-schema.json
//!
//! # Display CoSWIDs as pretty-printed JSON
//! coswid display -f s1.cbor -f s2.cbor -d coswids/
//!
//! # Validate CoSWIDs against a JSON schema
//! coswid validate -f s.cbor -s coswid-schema.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coswid_core::{Converter, Options, SchemaValidator, DEFAULT_MAX_DEPTH};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coswid", version, about = "CoSWID manipulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Deepest array/map nesting accepted when reading a CoSWID
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Log filter (e.g. "warn", "debug", "coswid_core=debug")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a CBOR-encoded CoSWID from the supplied JSON template
    Create {
        /// A CoSWID template file (in JSON format)
        #[arg(short, long)]
        template: PathBuf,
        /// Output directory for the CBOR file
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// JSON schema the template must satisfy before encoding
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Display one or more CBOR-encoded CoSWIDs in human readable (JSON) format
    Display {
        /// A CoSWID file (in CBOR format)
        #[arg(short, long)]
        file: Vec<PathBuf>,
        /// A directory containing CoSWID files
        #[arg(short, long)]
        dir: Vec<PathBuf>,
    },
    /// Validate CBOR-encoded CoSWIDs against the provided JSON schema
    Validate {
        /// A CoSWID file (in CBOR format)
        #[arg(short, long)]
        file: Vec<PathBuf>,
        /// A directory containing CoSWID files
        #[arg(short, long)]
        dir: Vec<PathBuf>,
        /// A JSON schema file
        #[arg(short, long)]
        schema: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let converter = Converter::new(Options {
        max_depth: cli.max_depth,
    });

    match cli.command {
        Commands::Create {
            template,
            output_dir,
            schema,
        } => {
            let schema = schema.as_deref().map(load_schema).transpose()?;
            let out = create(&converter, &template, &output_dir, schema.as_ref())?;
            println!(
                ">> created {:?} from {:?}",
                out.display().to_string(),
                template.display().to_string()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Display { file, dir } => {
            let files = gather_files(&file, &dir)?;
            let failed = for_each_file(&files, "displaying", |path, bytes| {
                let json = converter.display(&path.display().to_string(), bytes)?;
                println!(">> [{}]\n{}", path.display(), json);
                Ok(())
            });
            Ok(exit_code(failed))
        }
        Commands::Validate { file, dir, schema } => {
            let files = gather_files(&file, &dir)?;
            let validator = load_schema(&schema)?;
            let failed = for_each_file(&files, "validating", |path, bytes| {
                converter.validate(&path.display().to_string(), bytes, &validator)?;
                println!(
                    ">> validated {:?} against {:?}",
                    path.display().to_string(),
                    schema.display().to_string()
                );
                Ok(())
            });
            Ok(exit_code(failed))
        }
    }
}

/// Materialize one template and write it next to its siblings in `output_dir`.
fn create(
    converter: &Converter,
    template: &Path,
    output_dir: &Path,
    schema: Option<&SchemaValidator>,
) -> Result<PathBuf> {
    let bytes = std::fs::read(template)
        .with_context(|| format!("Failed to read template file: {}", template.display()))?;
    let artifact = template.display().to_string();
    let cbor = match schema {
        Some(schema) => converter.create_checked(&artifact, &bytes, schema),
        None => converter.create(&artifact, &bytes),
    }
    .context("Failed to create CBOR")?;

    let out = coswid_core::output_file_name(output_dir, template);
    std::fs::write(&out, cbor)
        .with_context(|| format!("Failed to write CBOR file: {}", out.display()))?;
    Ok(out)
}

fn load_schema(path: &Path) -> Result<SchemaValidator> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
    SchemaValidator::from_slice(&bytes)
        .with_context(|| format!("Failed to load schema: {}", path.display()))
}

/// Explicit files in the order given, then `.cbor` files found directly
/// inside each directory, sorted by name.
fn gather_files(files: &[PathBuf], dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if files.is_empty() && dirs.is_empty() {
        anyhow::bail!("no CoSWID file or directory supplied");
    }

    let mut out: Vec<PathBuf> = files.to_vec();
    for dir in dirs {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        let mut found = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?
                .path();
            let is_cbor = path
                .extension()
                .is_some_and(|ext| ext == coswid_core::materializer::CBOR_EXTENSION);
            if path.is_file() && is_cbor {
                found.push(path);
            }
        }
        found.sort();
        out.extend(found);
    }

    if out.is_empty() {
        anyhow::bail!("no files found");
    }
    tracing::debug!(count = out.len(), "gathered CoSWID files");
    Ok(out)
}

/// Run `op` on every file. A failure is reported and the batch carries on.
/// Returns the number of failed files.
fn for_each_file<F>(files: &[PathBuf], verb: &str, mut op: F) -> usize
where
    F: FnMut(&Path, &[u8]) -> Result<()>,
{
    let mut failed = 0;
    for path in files {
        let result = std::fs::read(path)
            .with_context(|| format!("error loading CoSWID from {}", path.display()))
            .and_then(|bytes| op(path, &bytes));
        if let Err(e) = result {
            eprintln!(">> failed {verb} {:?}: {e:#}", path.display().to_string());
            failed += 1;
        }
    }
    failed
}

fn exit_code(failed: usize) -> ExitCode {
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
