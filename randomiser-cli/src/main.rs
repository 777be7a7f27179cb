use clap::Parser;
use log::info;
use std::path::PathBuf;

use dread_randomiser_core::{run, PatcherSettings};

#[derive(Debug, Parser)]
#[command(
    name = "dread-randomiser",
    version,
    about = "Metroid Dread randomiser patcher"
)]
struct Args {
    /// Extracted project directory (packages.json + assets/).
    #[arg(long)]
    input: PathBuf,

    /// Where changed assets are written.
    #[arg(long)]
    output: PathBuf,

    /// Patch configuration (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Verbose logging and a JSON dump of every generated actor class.
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let settings = PatcherSettings {
        input_path: args.input,
        output_path: args.output,
        config_path: args.config,
        debug: args.debug,
    };

    match run(settings) {
        Ok(summary) => info!(
            "done: {} generated class(es), {} progressive, {} layer(s) removed",
            summary.generated.len(),
            summary.progressive_classes,
            summary.static_fixes.removed_x_layers
        ),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
