use std::path::PathBuf;

use clap::Parser;
use property_expressions::{PropertyStore, Settings};
use tracing_subscriber::EnvFilter;

/// Expand `${...}` property expressions in the given text.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON settings file with `properties` and `chain` sections (optional)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Define a property as `name=value`; may be repeated
    #[arg(short = 'D', long = "define", value_parser = parse_definition)]
    define: Vec<(String, String)>,
    /// Log resolution steps to stderr
    #[arg(long)]
    verbose: bool,
    /// Text to expand, one output line per argument
    #[arg(required = true)]
    text: Vec<String>,
}

fn parse_definition(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{s}`"))
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Load settings.
    let settings = match &args.settings {
        Some(path) => {
            let json = match std::fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Cannot read {}: {e}", path.display());
                    std::process::exit(1);
                }
            };
            match Settings::from_json_str(&json) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        None => Settings::default(),
    };

    // Build the store.
    let store = match PropertyStore::from_settings(&settings) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    for (name, value) in &args.define {
        store.set_property(name, value);
    }

    // Expand each argument.
    for text in &args.text {
        match store.expand(text) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }
}
