//! Lekvar CLI
//!
//! Command-line interface for inspecting lekvar configuration files

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lekvar")]
#[command(about = "Inspect hierarchical lekvar configuration files")]
#[command(version = lekvar_core::VERSION)]
#[command(
    long_about = "Reads lekvar files, resolves section inheritance and answers queries about the result.\n\
\n\
Examples:\n  \
lekvar check app.lkv                  # Report parse and resolution errors\n  \
lekvar get app.lkv server.http port   # Print one resolved value\n  \
lekvar dump app.lkv                   # Resolved document as JSON\n  \
lekvar graph app.lkv | dot -Tsvg      # Render the inheritance graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Parser settings file
    #[arg(
        short,
        long,
        global = true,
        env = "LEKVAR_SETTINGS",
        help = "Path to parser settings (.lekvarrc.toml/.lekvarrc.json)"
    )]
    settings: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Read and resolve a file, reporting every problem found
    Check {
        #[arg(help = "File to check")]
        file: PathBuf,
    },

    /// Print the resolved value of one option
    Get {
        file: PathBuf,
        section: String,
        option: String,

        /// Value printed when the section or option does not exist
        #[arg(long)]
        fallback: Option<String>,
    },

    /// List every section except the default one
    Sections { file: PathBuf },

    /// List the effective options of a section
    Options { file: PathBuf, section: String },

    /// Print the resolved document as JSON
    Dump { file: PathBuf },

    /// Print the inheritance graph in Graphviz DOT format
    Graph { file: PathBuf },

    /// Print the JSON schema of the parser settings
    Schema,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "lekvar=error",
        1 => "lekvar=warn",
        2 => "lekvar=info",
        3 => "lekvar=debug",
        _ => "lekvar=trace",
    };
    lekvar_core::init_tracing_with_filter(log_level);

    if let Err(e) = run_command(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run_command(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings.as_deref();
    match cli.command {
        Commands::Check { file } => commands::check_command(&file, settings),
        Commands::Get {
            file,
            section,
            option,
            fallback,
        } => commands::get_command(&file, settings, &section, &option, fallback.as_deref()),
        Commands::Sections { file } => commands::sections_command(&file, settings),
        Commands::Options { file, section } => {
            commands::options_command(&file, settings, &section)
        }
        Commands::Dump { file } => commands::dump_command(&file, settings),
        Commands::Graph { file } => commands::graph_command(&file, settings),
        Commands::Schema => commands::schema_command(),
    }
}
