use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::anyhow;
use clap::Parser;
use schema_composition::CompositionFailure;
use schema_composition::CompositionOptions;
use schema_composition::DirectiveRegistry;
use schema_composition::SourceDocument;
use schema_composition::directive::cache_control::cache_control_directive;
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Composes schema files into one schema and prints it as SDL
    Compose {
        /// Schema files; each file's stem is used as its source name
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// YAML file with composition options
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the result, or the diagnostics, as JSON
        #[arg(long)]
        json: bool,
    },
    /// Prints the JSON schema of the composition options file
    ConfigSchema,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Compose {
            files,
            config,
            json,
        } => compose(&files, config.as_deref(), json),
        Command::ConfigSchema => config_schema().map(|()| ExitCode::SUCCESS),
    };
    result.unwrap_or_else(|error| {
        eprintln!("error: {error:#}");
        ExitCode::FAILURE
    })
}

fn compose(files: &[PathBuf], config: Option<&Path>, json: bool) -> anyhow::Result<ExitCode> {
    let options = match config {
        Some(path) => load_options(path)?,
        None => CompositionOptions::default(),
    };
    let sources = match load_sources(files) {
        Ok(sources) => sources,
        Err(SourceError::Io(error)) => return Err(error),
        Err(SourceError::Composition(failure)) => return report_failure(&failure, json),
    };
    let mut registry = DirectiveRegistry::new();
    registry
        .register(cache_control_directive())
        .map_err(|error| anyhow!(error))?;

    match schema_composition::compose(&sources, &registry, &options) {
        Ok((schema, hints)) => {
            if json {
                let output = json!({ "schema": schema.to_string(), "hints": hints });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for hint in &hints {
                    eprintln!("hint: {hint}");
                }
                print!("{schema}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => report_failure(&failure, json),
    }
}

fn report_failure(failure: &CompositionFailure, json: bool) -> anyhow::Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(failure)?);
    } else {
        for hint in &failure.hints {
            eprintln!("hint: {hint}");
        }
        for diagnostic in &failure.diagnostics {
            eprintln!("error: {diagnostic}");
        }
    }
    Ok(ExitCode::FAILURE)
}

enum SourceError {
    Io(anyhow::Error),
    Composition(CompositionFailure),
}

/// Reads and parses every file, collecting the parse errors of all of them.
fn load_sources(files: &[PathBuf]) -> Result<Vec<SourceDocument>, SourceError> {
    let mut sources = Vec::with_capacity(files.len());
    let mut failure = CompositionFailure::default();
    for path in files {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| SourceError::Io(anyhow!("{} has no usable file name", path.display())))?;
        let sdl = fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))
            .map_err(SourceError::Io)?;
        match SourceDocument::parse(name, &sdl) {
            Ok(source) => sources.push(source),
            Err(mut parse_failure) => {
                failure.diagnostics.append(&mut parse_failure.diagnostics);
                failure.hints.append(&mut parse_failure.hints);
            }
        }
    }
    if failure.diagnostics.is_empty() {
        Ok(sources)
    } else {
        Err(SourceError::Composition(failure))
    }
}

fn load_options(path: &Path) -> anyhow::Result<CompositionOptions> {
    let content =
        fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("invalid options in {}", path.display()))
}

fn config_schema() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(CompositionOptions);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
