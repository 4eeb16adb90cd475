use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use module_builder::cli::{self, BuildRequest};
use module_builder::config;
use module_builder::domain::PromotionDirective;
use module_builder::logging;
use module_builder::report::TracingReporter;
use module_builder::ui;

#[derive(Parser)]
#[command(
    name = "module-builder",
    version,
    about = "Build, version and index host OS modules"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (repeatable)"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bump, archive and index the given module directories
    Module {
        #[arg(value_name = "DIRS", help = "Module directories")]
        dirs: Vec<PathBuf>,

        #[arg(short, long, help = "Output directory for archives")]
        output: Option<PathBuf>,

        #[arg(
            long,
            default_value = "none",
            help = "Promote pre-release versions: none, minor or major"
        )]
        promote: PromotionDirective,
    },

    /// Sort the development and release indexes
    Sort,
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(2);
    }
}

fn run(args: Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref()).context("Error loading config")?;
    let index_dir = std::env::current_dir().context("Cannot determine working directory")?;
    let reporter = TracingReporter;

    match args.command {
        Command::Module {
            dirs,
            output,
            promote,
        } => {
            if dirs.is_empty() {
                println!("No modules set, nothing to do.");
                return Ok(());
            }

            let mut request = BuildRequest::new(dirs, &config, &index_dir).with_promotion(promote);
            if let Some(output) = output {
                request = request.with_output_dir(output);
            }

            ui::display_status(&format!("Building {} module(s)", request.dirs.len()));
            let outcome =
                cli::build_release(&request, &config, &reporter).context("Build failed")?;

            ui::display_build_summary(&outcome);
            ui::display_success("Build completed.");
        }
        Command::Sort => {
            let rewritten =
                cli::run_sort(&config, &index_dir, &reporter).context("Sorting failed")?;

            if rewritten == 0 {
                ui::display_status("Indexes already sorted");
            }
            ui::display_success("Sorting completed.");
        }
    }

    Ok(())
}
