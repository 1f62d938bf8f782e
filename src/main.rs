use clap::{Parser, Subcommand};
use kaleido::imaging::{MirrorError, Percent, RustBackend, Side};
use kaleido::process::{MirrorRequest, ProcessOptions};
use kaleido::{config, output, process, scan};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kaleido")]
#[command(about = "Mirror-symmetry effect for still images and animated GIFs")]
#[command(long_about = "\
Mirror-symmetry effect for still images and animated GIFs

Keeps one part of each image, flips it across a cut line and pastes both
halves together, producing a symmetric (kaleidoscope-like) picture.

Sides:

  left, right        keep the part left/right of the vertical cut line
  up, down           keep the part above/below the horizontal cut line
  q1 q2 q3 q4        keep one quadrant (top-left, top-right, bottom-right,
                     bottom-left) and mirror it both ways

Cut lines are measured in percent from the left and top edges. Output files
are named {side}_{kept share}_{original name}:

  kaleido mirror cat.gif --side right --horizontal 40
  → out/right_60_cat.gif

Animated GIFs keep their frame timing and loop forever.

Run 'kaleido gen-config' to generate a documented kaleido.toml.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Flags for the mirror command. Anything omitted comes from the config.
#[derive(clap::Args)]
struct MirrorArgs {
    /// Image files or directories (walked recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Which part to keep: left, right, up, down, q1, q2, q3, q4
    #[arg(long)]
    side: Option<Side>,

    /// Vertical cut line, percent from the left edge
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    horizontal: Option<u32>,

    /// Horizontal cut line, percent from the top edge
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    vertical: Option<u32>,

    /// Output directory
    #[arg(long, default_value = "out")]
    output: PathBuf,

    /// Config file (default: ./kaleido.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Mirror images into the output directory
    Mirror(MirrorArgs),
    /// Print a stock kaleido.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Mirror(args) => {
            let config = match &args.config {
                Some(path) => config::load_config_file(path)?,
                None => config::load_config(Path::new("."))?,
            };
            let request = apply_overrides(MirrorRequest::from_config(&config)?, &args)?;
            let options = ProcessOptions::from_config(&config);
            let inputs = scan::collect_inputs(&args.inputs, &args.output)?;

            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_process_event(&event);
                }
            });
            let results = process::process_batch(
                &RustBackend::new(),
                &inputs,
                &args.output,
                &request,
                &options,
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "output printer thread panicked")?;
            output::print_batch_summary(&results);

            if results.iter().any(|r| r.is_err()) {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Replace config values with whatever was given on the command line.
fn apply_overrides(
    mut request: MirrorRequest,
    args: &MirrorArgs,
) -> Result<MirrorRequest, MirrorError> {
    if let Some(side) = args.side {
        request.side = side;
    }
    if let Some(horizontal) = args.horizontal {
        request.horizontal = Percent::new(horizontal)?;
    }
    if let Some(vertical) = args.vertical {
        request.vertical = Percent::new(vertical)?;
    }
    Ok(request)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
