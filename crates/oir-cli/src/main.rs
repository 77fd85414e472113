use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::info;
use serde::Serialize;

use oir_core::config::{self, CONFIG_FILE_NAME, OirConfig, OutputFormat};
use oir_core::ir::{HttpMethod, ModelKind};
use oir_core::{Diagnostic, Document, ParseOptions, parse};

#[derive(Parser)]
#[command(
    name = "oir",
    about = "Normalize OpenAPI 2.0/3.0/3.1 documents into one IR",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of the normalized document
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// Write the full normalized document
    Dump {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// Normalize a document and report every diagnostic
    Validate {
        #[command(flatten)]
        source: SourceArgs,

        /// Fail when any diagnostic was reported
        #[arg(long)]
        strict: bool,
    },

    /// Initialize a new oir configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Path or http(s) URL of the document; the config's `input` when omitted
    #[arg(short, long)]
    input: Option<String>,

    /// Skip TLS certificate verification for https:// documents
    #[arg(long)]
    insecure: bool,

    /// Only normalize path patterns matching this regex (repeatable)
    #[arg(long = "include", value_name = "REGEX")]
    include: Vec<String>,

    /// Skip path patterns matching this regex (repeatable)
    #[arg(long = "exclude", value_name = "REGEX")]
    exclude: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Yaml,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { source, format } => cmd_inspect(source, format),

        Commands::Dump {
            source,
            output,
            format,
        } => cmd_dump(source, output, format),

        Commands::Validate { source, strict } => cmd_validate(source, strict),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oir", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<OirConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

/// Config file settings extended by command line flags.
fn resolve_source(source: SourceArgs, cfg: &OirConfig) -> Result<(String, ParseOptions)> {
    let input = source.input.unwrap_or_else(|| cfg.input.clone());
    let options = ParseOptions::new()
        .insecure(source.insecure || cfg.insecure)
        .include(cfg.include_paths.iter().chain(&source.include))
        .context("invalid include pattern")?
        .exclude(cfg.exclude_paths.iter().chain(&source.exclude))
        .context("invalid exclude pattern")?;
    Ok((input, options))
}

fn load_document(source: SourceArgs, cfg: &OirConfig) -> Result<(Document, Vec<Diagnostic>)> {
    let (input, options) = resolve_source(source, cfg)?;
    info!("parsing {input}");
    let output = parse::from_location(&input, options)
        .with_context(|| format!("failed to normalize {input}"))?;
    for diagnostic in &output.diagnostics {
        eprintln!("  warning: {diagnostic}");
    }
    Ok((output.document, output.diagnostics))
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml_ng::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
    })
}

fn cmd_inspect(source: SourceArgs, format: Option<FormatArg>) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let (document, diagnostics) = load_document(source, &cfg)?;
    let format = format.map(OutputFormat::from).unwrap_or(cfg.format);

    let summary = build_inspect_summary(&document, diagnostics.len());
    print!("{}", render(&summary, format)?);
    Ok(())
}

fn build_inspect_summary(document: &Document, diagnostics: usize) -> serde_json::Value {
    let models: Vec<serde_json::Value> = document
        .referenceable_models()
        .map(|model| {
            serde_json::json!({
                "name": model.name(),
                "kind": match model {
                    oir_core::ir::ReferenceableModel::Object(_) => "object",
                    oir_core::ir::ReferenceableModel::Enum(_) => "enum",
                },
            })
        })
        .collect();

    let paths: Vec<serde_json::Value> = document
        .paths
        .iter()
        .map(|path| {
            serde_json::json!({
                "operation_id": path.operation_id,
                "method": path.method,
                "path": path.url_pattern,
                "request_bodies": path.request_bodies.iter().map(|b| &b.media).collect::<Vec<_>>(),
                "responses": path.responses.iter().map(|r| &r.code).collect::<Vec<_>>(),
                "tags": path.tags,
            })
        })
        .collect();

    serde_json::json!({
        "version": document.version,
        "info": {
            "title": document.info.title,
            "version": document.info.version,
        },
        "servers": document.servers.iter().map(|s| &s.url).collect::<Vec<_>>(),
        "models": models,
        "paths": paths,
        "entities": document.entities.len(),
        "diagnostics": diagnostics,
    })
}

fn cmd_dump(
    source: SourceArgs,
    output: Option<PathBuf>,
    format: Option<FormatArg>,
) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let (document, _) = load_document(source, &cfg)?;
    let format = format.map(OutputFormat::from).unwrap_or(cfg.format);
    let content = render(&document, format)?;

    match output.or_else(|| cfg.output.as_ref().map(PathBuf::from)) {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
            fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn cmd_validate(source: SourceArgs, strict: bool) -> Result<()> {
    let cfg = try_load_config()?.unwrap_or_default();
    let (document, diagnostics) = load_document(source, &cfg)?;

    let operations = |method: HttpMethod| document.paths.iter().filter(|p| p.method == method).count();
    eprintln!("Valid {:?} document: {}", document.version, document.info.title);
    eprintln!("  Version: {}", document.info.version);
    eprintln!(
        "  Operations: {} ({} GET, {} POST)",
        document.paths.len(),
        operations(HttpMethod::Get),
        operations(HttpMethod::Post)
    );
    eprintln!(
        "  Objects: {}, enums: {}, entities: {}",
        count_kind(&document, ModelKind::Object),
        count_kind(&document, ModelKind::Enum),
        document.entities.len()
    );
    eprintln!("  Diagnostics: {}", diagnostics.len());

    if strict && !diagnostics.is_empty() {
        anyhow::bail!("{} diagnostics reported", diagnostics.len());
    }
    eprintln!("Validation successful.");
    Ok(())
}

fn count_kind(document: &Document, kind: ModelKind) -> usize {
    document
        .models
        .iter()
        .filter(|handle| document.model(**handle).kind() == kind)
        .count()
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
