//! openapi2kong CLI
//!
//! Command-line interface for converting OpenAPI 3.x specifications to
//! Kong declarative configuration files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use openapi2kong_common::JsonObject;
use openapi2kong_generator::{convert_slice, Oas2KongOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "openapi2kong")]
#[command(version, about = "Convert OpenAPI 3.x specifications to Kong declarative configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an OAS 3.x spec (JSON or YAML) into a Kong declarative file
    #[command(after_help = "EXAMPLES:\n  \
        # Convert a spec file to JSON on stdout\n  \
        openapi2kong convert --spec petstore.yaml\n\n  \
        # Convert stdin to a YAML file, tagging all entities\n  \
        cat petstore.json | openapi2kong convert --format yaml \\\n    \
        --tag team-a --tag public --output kong.yaml\n\n  \
        # Pin the UUID namespace for reproducible ids across tools\n  \
        openapi2kong convert --spec petstore.yaml \\\n    \
        --uuid-namespace 6ba7b810-9dad-11d1-80b4-00c04fd430c8")]
    Convert {
        /// Path to the spec file; '-' reads from stdin
        #[arg(short, long, default_value = "-")]
        spec: PathBuf,

        /// Output file; '-' writes to stdout
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Tag to mark all generated entities with (repeatable);
        /// overrides the document's x-kong-tags
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Base document name, overriding x-kong-name and info.title
        #[arg(long)]
        doc_name: Option<String>,

        /// UUIDv5 namespace; defaults to the DNS namespace
        #[arg(long)]
        uuid_namespace: Option<Uuid>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            spec,
            output,
            format,
            tags,
            doc_name,
            uuid_namespace,
        } => convert_command(
            &spec,
            &output,
            format,
            tags,
            doc_name,
            uuid_namespace,
            cli.verbose,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn convert_command(
    spec: &Path,
    output: &Path,
    format: OutputFormat,
    tags: Vec<String>,
    doc_name: Option<String>,
    uuid_namespace: Option<Uuid>,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!("{} Reading spec from {}", "→".cyan(), display_name(spec));
    }

    let content = read_input(spec)?;

    let options = Oas2KongOptions {
        tags: if tags.is_empty() { None } else { Some(tags) },
        doc_name,
        uuid_namespace: uuid_namespace.unwrap_or(Uuid::NAMESPACE_DNS),
    };

    let result = convert_slice(&content, &options)
        .with_context(|| format!("failed to convert '{}'", display_name(spec)))?;

    let rendered = render(&result, format)?;
    write_output(output, rendered.as_bytes())?;

    if !is_stdio(output) {
        eprintln!(
            "{} Wrote {} ({} services, {} upstreams)",
            "✓".green(),
            output.display(),
            entity_count(&result, "services"),
            entity_count(&result, "upstreams"),
        );
    }

    Ok(())
}

fn render(result: &JsonObject, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut rendered = serde_json::to_string_pretty(result)
                .context("failed to json-serialize the resulting file")?;
            rendered.push('\n');
            Ok(rendered)
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(result).context("failed to yaml-serialize the resulting file")
        }
    }
}

/// Read file contents; reads from stdin when the path is `-`.
fn read_input(path: &Path) -> Result<Vec<u8>> {
    if is_stdio(path) {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("unable to read from stdin")?;
        return Ok(buffer);
    }

    std::fs::read(path).with_context(|| format!("unable to read file '{}'", path.display()))
}

/// Write the output; writes to stdout when the path is `-`.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if is_stdio(path) {
        std::io::stdout()
            .write_all(content)
            .context("failed to write to stdout")?;
        return Ok(());
    }

    std::fs::write(path, content)
        .with_context(|| format!("failed to write to output file '{}'", path.display()))
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn display_name(path: &Path) -> String {
    if is_stdio(path) {
        "stdin".to_string()
    } else {
        path.display().to_string()
    }
}

fn entity_count(result: &JsonObject, key: &str) -> usize {
    result
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}
