//! mdlive - highlight a markdown file as markup or on the terminal

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdlive::preview;
use mdlive::{Engine, EngineOptions, PassStatus, Result, ViewportInfo};

/// Parsed command line
#[derive(Debug)]
struct Args {
    markup: bool,
    config: Option<PathBuf>,
    viewport: Option<ViewportInfo>,
    file: PathBuf,
}

enum Command {
    Run(Args),
    Help,
    Version,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mdlive=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let command = match parse_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("mdlive: {}", message);
            eprintln!("Try 'mdlive --help' for more information.");
            process::exit(2);
        }
    };

    let args = match command {
        Command::Help => {
            print_usage();
            return;
        }
        Command::Version => {
            print_version();
            return;
        }
        Command::Run(args) => args,
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> std::result::Result<Command, String> {
    let mut markup = false;
    let mut config = None;
    let mut viewport = None;
    let mut file = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--markup" | "-m" => markup = true,
            "--config" | "-c" => {
                let path = args.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--viewport" => {
                let range = args.next().ok_or("--viewport needs FIRST:LAST")?;
                viewport = Some(parse_viewport(&range)?);
            }
            _ if arg.starts_with('-') => return Err(format!("unknown option '{}'", arg)),
            _ => {
                if file.is_some() {
                    return Err("only one file can be highlighted".to_string());
                }
                file = Some(PathBuf::from(arg));
            }
        }
    }

    let file = file.ok_or("missing FILE")?;
    Ok(Command::Run(Args {
        markup,
        config,
        viewport,
        file,
    }))
}

fn parse_viewport(range: &str) -> std::result::Result<ViewportInfo, String> {
    let invalid = || format!("invalid viewport '{}', expected FIRST:LAST", range);
    let (first, last) = range.split_once(':').ok_or_else(invalid)?;
    let first = first.trim().parse().map_err(|_| invalid())?;
    let last = last.trim().parse().map_err(|_| invalid())?;
    Ok(ViewportInfo::new(first, last))
}

fn run(args: Args) -> Result<()> {
    let options = match &args.config {
        Some(path) => EngineOptions::load_from(path)?,
        None => EngineOptions::load(),
    };
    let content = fs::read_to_string(&args.file)?;
    let mut engine = Engine::new(options)?;

    if args.markup {
        let mut markup = String::new();
        let status = engine.highlight(&content, &mut markup, args.viewport);
        if status == PassStatus::Failed {
            eprintln!("mdlive: highlighting failed, printing plain text");
            print!("{}", content);
        } else {
            println!("{}", markup);
        }

        let stats = engine.performance_stats();
        debug!(
            target: "mdlive::engine",
            status = ?status,
            elapsed_ms = stats.last_highlight_time.as_secs_f64() * 1000.0,
            "markup written"
        );
    } else if let Some(registry) = engine.registry() {
        let mut stdout = io::stdout().lock();
        preview::preview_document(
            &mut stdout,
            registry,
            &engine.extractor(),
            &content,
            args.viewport,
        )?;
        println!();
    }

    engine.destroy();
    Ok(())
}

fn print_usage() {
    println!("mdlive {} - live markdown syntax highlighting", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: mdlive [OPTIONS] FILE");
    println!();
    println!("Options:");
    println!("  -m, --markup             Print span markup instead of a terminal preview");
    println!("  -c, --config PATH        Read options from PATH instead of ~/.mdlive.toml");
    println!("      --viewport FIRST:LAST");
    println!("                           Only highlight around these lines (0-based)");
    println!("  -h, --help               Show this help message");
    println!("  -V, --version            Show version information");
    println!();
    println!("Set RUST_LOG=mdlive=debug for per-pass logging.");
}

fn print_version() {
    println!("mdlive {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Command, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_run() {
        let Ok(Command::Run(args)) = parse(&["--markup", "--viewport", "3:9", "notes.md"]) else {
            panic!("expected run");
        };
        assert!(args.markup);
        assert_eq!(args.viewport, Some(ViewportInfo::new(3, 9)));
        assert_eq!(args.file, PathBuf::from("notes.md"));
    }

    #[test]
    fn test_parse_help_and_version() {
        assert!(matches!(parse(&["-h"]), Ok(Command::Help)));
        assert!(matches!(parse(&["a.md", "--version"]), Ok(Command::Version)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--bogus", "a.md"]).is_err());
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["a.md", "b.md"]).is_err());
        assert!(parse(&["--viewport", "x:1", "a.md"]).is_err());
    }

    #[test]
    fn test_parse_viewport() {
        assert_eq!(parse_viewport("1:20"), Ok(ViewportInfo::new(1, 20)));
        assert!(parse_viewport("20").is_err());
    }
}
