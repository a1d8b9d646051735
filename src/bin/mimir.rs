//! mimir — command-line front end for the generation gateway.
//!
//! Loads the TOML configuration, builds a [`Gateway`](mimir::Gateway) and
//! runs one request, printing the normalized result as JSON.

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use mimir::{
    ContentGateway, Gateway, GenerationKind, GenerationRequest, MimirConfig, Secrets,
};

/// Resilient interview content generation.
#[derive(Parser)]
#[command(name = "mimir")]
#[command(about = "Generate interview content through the provider fallback chain")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "MIMIR_CONFIG")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one result and print it as JSON
    Generate {
        /// What to generate: question, persona, assessment or translation
        #[arg(short, long, value_parser = parse_kind)]
        kind: GenerationKind,
        /// Target language code
        #[arg(short, long, default_value = "en")]
        lang: String,
        /// Session identifier
        #[arg(short, long, default_value = "cli")]
        session: String,
        /// Prompt context entry, repeatable (e.g. -c role=backend)
        #[arg(short = 'c', long = "context", value_parser = parse_key_val)]
        context: Vec<(String, String)>,
        /// Completion token budget
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// Show the provider fallback order for a kind and language
    Providers {
        #[arg(short, long, value_parser = parse_kind, default_value = "question")]
        kind: GenerationKind,
        #[arg(short, long, default_value = "en")]
        lang: String,
    },
}

fn parse_kind(s: &str) -> Result<GenerationKind, String> {
    s.parse().map_err(|e: mimir::MimirError| e.to_string())
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // clap wants a 'static version string; built once per process
    let version: &'static str = Box::leak(mimir::version_string().into_boxed_str());
    let matches = Args::command().version(version).get_matches();
    let args = Args::from_arg_matches(&matches)?;

    let config = MimirConfig::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let gateway = Gateway::from_config(&config, &secrets)?;

    match args.command {
        Command::Generate {
            kind,
            lang,
            session,
            context,
            max_tokens,
            temperature,
        } => {
            let mut builder = GenerationRequest::builder(kind)
                .language(lang)
                .session(session);
            for (key, value) in context {
                builder = builder.context(key, value);
            }
            if let Some(max_tokens) = max_tokens {
                builder = builder.max_tokens(max_tokens);
            }
            if let Some(temperature) = temperature {
                builder = builder.temperature(temperature);
            }

            let result = gateway.generate(&builder.build()).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Providers { kind, lang } => {
            let order = gateway.fallback_order(kind, &lang);
            if order.is_empty() {
                println!("no provider serves {kind}/{lang}; requests use the template table");
            }
            for (position, descriptor) in order.iter().enumerate() {
                let languages = if descriptor.is_general_purpose() {
                    "*".to_string()
                } else {
                    descriptor
                        .supported_languages
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(",")
                };
                println!(
                    "{}. {} (priority {}, languages {languages})",
                    position + 1,
                    descriptor.name,
                    descriptor.priority
                );
            }
        }
    }

    Ok(())
}
