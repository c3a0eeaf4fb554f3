//! Tact CLI
//!
//! Lexes, checks and prints the command graphs of program scripts.

mod commands;
mod render;

use clap::{Parser, Subcommand};
use commands::{check_file, explain_error, graph_file, lex_file, ParseMode};
use std::path::PathBuf;
use std::sync::Once;
use tact_diagnostic::emitter::ColorMode;

/// Tact program script toolchain.
#[derive(Parser)]
#[command(name = "tactc", version, about = "Tact program script toolchain")]
struct Cli {
    /// When to color diagnostics
    #[arg(long, global = true, default_value = "auto", value_parser = parse_color)]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a script
    Lex {
        /// Path to the script
        file: PathBuf,
    },

    /// Build every unit of a script and report errors
    Check {
        /// Path to the script
        file: PathBuf,
        /// JSON description of the controlled component
        #[arg(long)]
        component: Option<PathBuf>,
        /// Parse as a function library: no programs, exported functions only
        #[arg(long, conflicts_with = "body")]
        library: bool,
        /// Parse the whole file as one statement block
        #[arg(long)]
        body: bool,
    },

    /// Print the command graphs built from a script
    Graph {
        /// Path to the script
        file: PathBuf,
        /// JSON description of the controlled component
        #[arg(long)]
        component: Option<PathBuf>,
        /// Parse as a function library: no programs, exported functions only
        #[arg(long, conflicts_with = "body")]
        library: bool,
        /// Parse the whole file as one statement block
        #[arg(long)]
        body: bool,
        /// Keep nodes no path from the entry reaches
        #[arg(long)]
        keep_unreachable: bool,
        /// Keep empty nodes that only forward to the next one
        #[arg(long)]
        keep_pass_through: bool,
        /// Maximum depth of nested constructs
        #[arg(long, default_value_t = 64)]
        max_nesting: usize,
    },

    /// Describe an error code
    Explain {
        /// Code such as E2005
        code: String,
    },
}

fn parse_color(value: &str) -> Result<ColorMode, String> {
    match value {
        "auto" => Ok(ColorMode::Auto),
        "always" => Ok(ColorMode::Always),
        "never" => Ok(ColorMode::Never),
        other => Err(format!("expected auto, always or never, found `{other}`")),
    }
}

fn mode(library: bool, body: bool) -> ParseMode {
    if body {
        ParseMode::Body
    } else if library {
        ParseMode::Library
    } else {
        ParseMode::Programs
    }
}

static TRACING_INIT: Once = Once::new();

/// Install the log subscriber when `RUST_LOG` is set, e.g.
/// `RUST_LOG=tact_parse=debug`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Lex { file } => lex_file(&file, cli.color),
        Commands::Check {
            file,
            component,
            library,
            body,
        } => check_file(&file, component.as_deref(), mode(library, body), cli.color),
        Commands::Graph {
            file,
            component,
            library,
            body,
            keep_unreachable,
            keep_pass_through,
            max_nesting,
        } => {
            let options = tact_parse::ParseOptions {
                max_nesting,
                prune_unreachable: !keep_unreachable,
                collapse_pass_through: !keep_pass_through,
            };
            graph_file(
                &file,
                component.as_deref(),
                mode(library, body),
                &options,
                cli.color,
            );
        }
        Commands::Explain { code } => explain_error(&code),
    }
}
