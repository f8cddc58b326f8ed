//! irtroc CLI: held-out ROC evaluation of MIRT models.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "irtroc",
    version,
    about = "Held-out ROC evaluation of MIRT ability models"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a model against held-out responses
    Run {
        /// MIRT parameter file (JSON)
        #[arg(long)]
        model: PathBuf,

        /// Comma-separated response data
        #[arg(long)]
        test_data: PathBuf,

        /// Where to write `actual,predicted` datapoints
        #[arg(long)]
        output: PathBuf,

        /// Data-format profile name (default from config, else "simple")
        #[arg(long)]
        data_format: Option<String>,

        /// Column holding the held-out flag; without it one response per
        /// user is held out at random
        #[arg(long)]
        evaluation_index: Option<usize>,

        /// Seed for random held-out selection
        #[arg(long)]
        seed: Option<u64>,

        /// Also write a JSON run report here
        #[arg(long)]
        report: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Summarize a datapoint file
    Summarize {
        /// File of `actual,predicted` lines
        #[arg(long)]
        roc: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List data-format profiles
    Formats {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("irtroc=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            model,
            test_data,
            output,
            data_format,
            evaluation_index,
            seed,
            report,
            config,
        } => commands::run::execute(commands::run::RunArgs {
            model,
            test_data,
            output,
            data_format,
            evaluation_index,
            seed,
            report,
            config,
        }),
        Commands::Summarize { roc, format } => commands::summarize::execute(roc, format),
        Commands::Formats { config } => commands::formats::execute(config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
