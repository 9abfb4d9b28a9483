use anyhow::Result;
use clap::Parser;
use class_closure::catalog::{ArchiveCatalog, catalog_all};
use class_closure::cli::{Cli, Commands, OutputFormat};
use class_closure::closure::{DependencyClosure, Outcome};
use class_closure::config::load_config;
use class_closure::extract::ReferenceExtractor;
use class_closure::name::ClassName;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CLASS_CLOSURE_LOG";

fn main() -> ExitCode {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Check {
            entry,
            archives,
            format,
            platform_prefixes,
            no_platform_filter,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let filter = config.platform_filter(&platform_prefixes, no_platform_filter);
            let closure = DependencyClosure::new(ReferenceExtractor::new(filter));
            let entry = ClassName::new(normalize_class_name(&entry));

            let start = Instant::now();
            let outcome = closure.check_paths(&entry, &archives)?;
            let result = CheckResult {
                entry,
                archives: display_paths(&archives),
                duration_ms: start.elapsed().as_millis() as u64,
                outcome,
            };
            write_check_output(&result, format)?;

            Ok(if result.outcome.is_satisfied() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::Classes { archives, format } => {
            let catalogs = catalog_all(&archives)?;
            write_classes_output(&catalogs, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("class_closure=warn"),
        1 => EnvFilter::new("class_closure=info"),
        _ => EnvFilter::new("class_closure=debug"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_cli() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    Cli::parse_from(rewrite_args_for_implicit_check(args))
}

/// `class-closure a.b.Main x.jar` is shorthand for `class-closure check a.b.Main x.jar`.
///
/// `check` goes right after the global options, so `check` options given
/// before the entry class (`-f json a.b.Main x.jar`) still parse.
fn rewrite_args_for_implicit_check(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["check", "classes", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a == "--config" {
            idx += 2;
            continue;
        }

        if is_global_flag(a) {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "check".to_string());
        }
    }

    args
}

fn is_global_flag(arg: &str) -> bool {
    let repeated_v = arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v');
    repeated_v
        || arg.starts_with("--config=")
        || matches!(arg, "--verbose" | "-h" | "--help")
}

fn normalize_class_name(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(rest) = s
        .strip_prefix("import")
        .filter(|r| r.starts_with(char::is_whitespace))
    {
        s = rest.trim();
    }
    if s.ends_with(';') {
        s = s.trim_end_matches(';').trim();
    }
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug, Serialize)]
struct CheckResult {
    entry: ClassName,
    archives: Vec<String>,
    duration_ms: u64,
    #[serde(flatten)]
    outcome: Outcome,
}

fn write_check_output(result: &CheckResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => match &result.outcome {
            Outcome::Satisfied(_) => println!("All required dependencies are satisfied."),
            Outcome::Missing(missing) => {
                println!("Class not found: {}", missing.class);
                if missing.chain.len() > 1 {
                    let chain: Vec<&str> = missing.chain.iter().map(ClassName::as_str).collect();
                    println!("Reference chain: {}", chain.join(" -> "));
                }
            }
        },
    }
    Ok(())
}

fn write_classes_output(catalogs: &[ArchiveCatalog], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(catalogs)?),
        OutputFormat::Text => {
            let mut out = String::new();
            for c in catalogs {
                out.push_str(&format!("{}:\n", c.archive));
                for class in &c.classes {
                    out.push_str(&format!("  {class}\n"));
                }
            }
            print!("{out}");
        }
    }
    Ok(())
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}
