use anyhow::{Context, Result};
use clap::Parser;
use codegrapher::bundle::{build_bundle, find_source_files, resolve_locations};
use codegrapher::cli::{Cli, Commands};
use codegrapher::config::{load_config, GrapherConfig};
use codegrapher::extraction::extract_with;
use codegrapher::server::ToolServer;
use serde::Serialize;
use std::io::{self, Write};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Extract {
            target,
            root,
            object,
            token_limit,
            bundle,
            pretty,
        } => {
            let config = with_token_limit(load_config(), token_limit)?;
            if bundle {
                if object.is_some() {
                    log::warn!("--object is ignored when building a bundle");
                }
                let bundle = build_bundle(&target, root.as_deref(), &config)?;
                print_json(&bundle, pretty)
            } else {
                let (target, root) = resolve_locations(&target, root.as_deref())?;
                let mut options = config.to_options();
                options.target_object = object;
                let result = extract_with(&target, &root, &options)?;
                print_json(&result, pretty)
            }
        }
        Commands::Serve { token_limit } => {
            let config = with_token_limit(load_config(), token_limit)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            ToolServer::new(config).serve(stdin.lock(), stdout.lock())
        }
        Commands::Files { root } => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for file in find_source_files(&root)? {
                writeln!(out, "{}", file.display())?;
            }
            Ok(())
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn with_token_limit(
    mut config: GrapherConfig,
    token_limit: Option<usize>,
) -> Result<GrapherConfig> {
    if let Some(limit) = token_limit {
        config.token_limit = limit;
    }
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
