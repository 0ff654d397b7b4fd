use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use conduit::config::{LoggingSettings, Settings};
use conduit::engine::Configuration;
use conduit::manager::EngineManager;
use conduit::pipeline;
use conduit::processor::{OcrProcessor, Processor, ProcessorConfig, TranslationProcessor};
use conduit::registry::EngineRegistry;
use conduit::sink::DirectorySink;

#[derive(Parser)]
#[command(
    name = "conduit",
    version,
    about = "Route files through swappable translation and OCR engines."
)]
struct Cli {
    /// Settings file (default: ~/.conduit/conduit.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level; RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate text files
    Translate {
        /// Registered connector name
        #[arg(long)]
        connector: Option<String>,

        /// Connector configuration as a JSON object
        #[arg(long)]
        connector_config: Option<String>,

        /// Source language or expression, e.g. auto or ${lang}
        #[arg(long)]
        source: Option<String>,

        /// Target language or expression
        #[arg(long)]
        target: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Extract text from images with an OpenOCR server
    Ocr {
        #[arg(long)]
        scheme: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// Comma-separated preprocessors, may reference attributes
        #[arg(long)]
        preprocessors: Option<String>,

        /// Engine arguments as a JSON object, may reference attributes
        #[arg(long)]
        engine_args: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },
    /// List registered engines
    Engines,
}

#[derive(Args)]
struct RunArgs {
    /// Extra item attribute, repeatable
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attr)]
    attrs: Vec<(String, String)>,

    /// Output directory (overrides pipeline.output_dir)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Input files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn parse_attr(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

fn init_logging(cli_level: Option<&str>, logging: &LoggingSettings) {
    let level = cli_level.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load_or_default(cli.config.as_deref())?;

    // CLI flags win over the settings file.
    let run = match cli.command {
        Command::Translate {
            connector,
            connector_config,
            source,
            target,
            run,
        } => {
            let t = &mut settings.translation;
            if let Some(c) = connector {
                t.connector = c;
            }
            if let Some(raw) = connector_config {
                t.connector_config = Configuration::from_json_str(&raw)
                    .context("--connector-config")?
                    .as_map()
                    .clone();
            }
            if let Some(s) = source {
                t.source_language = s;
            }
            if let Some(s) = target {
                t.target_language = s;
            }
            Some((Pipeline::Translate, run))
        }
        Command::Ocr {
            scheme,
            host,
            port,
            preprocessors,
            engine_args,
            run,
        } => {
            let o = &mut settings.ocr;
            if let Some(s) = scheme {
                o.scheme = s;
            }
            if let Some(h) = host {
                o.host = h;
            }
            if let Some(p) = port {
                o.port = p;
            }
            if preprocessors.is_some() {
                o.preprocessors = preprocessors;
            }
            if engine_args.is_some() {
                o.engine_args = engine_args;
            }
            Some((Pipeline::Ocr, run))
        }
        Command::Engines => None,
    };

    settings.validate()?;
    init_logging(cli.log_level.as_deref(), &settings.logging);

    let registry = Arc::new(EngineRegistry::with_builtins().await);

    let Some((kind, run)) = run else {
        for identity in registry.identities().await {
            let details = registry.instantiate(&identity).await?.describe();
            println!("{identity}\t{} {}", details.name, details.version);
        }
        return Ok(());
    };

    let manager = Arc::new(EngineManager::new(registry));
    let config = ProcessorConfig {
        invoke_timeout: Duration::from_secs(settings.pipeline.invoke_timeout_secs),
    };
    let processor: Box<dyn Processor> = match kind {
        Pipeline::Translate => Box::new(TranslationProcessor::new(
            manager,
            settings.translation.clone(),
            config,
        )),
        Pipeline::Ocr => Box::new(OcrProcessor::new(manager, settings.ocr.clone(), config)),
    };

    let out_dir = run
        .out_dir
        .unwrap_or_else(|| settings.pipeline.output_dir.clone());
    let sink = DirectorySink::new(out_dir);

    let summary = pipeline::run(
        processor.as_ref(),
        &sink,
        &run.files,
        &run.attrs,
        settings.pipeline.concurrency,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

enum Pipeline {
    Translate,
    Ocr,
}
