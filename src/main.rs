use clap::error::ErrorKind;
use clap::Parser;
use detviz::cli::Args;
use detviz::inference::Device;
use detviz::{Net, Visualizer};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit code for bad command-line usage
const EXIT_USAGE: u8 = 1;
/// Exit code for any failure once the run has started
const EXIT_FAILURE: u8 = 2;

fn run(args: Args) -> anyhow::Result<()> {
    let device = args.device();
    match device {
        Device::Cpu => info!("Using CPU"),
        Device::Gpu(id) => {
            info!("Using GPU");
            info!("Using Device_id={}", id);
        }
    }

    let mut net = Net::from_files(&args.network_description, &args.pretrained_weights, device)?;

    let mut visualizer = Visualizer::new(&mut net)?;
    let summary = visualizer.run(&args.output_dir, args.num_mini_batches)?;

    info!(
        "Processed {} batches, wrote {} images to {} ({} list restarts)",
        summary.metrics.batches,
        summary.metrics.samples,
        args.output_dir.display(),
        summary.metrics.restarts
    );
    info!("run_stats={}", summary.metrics.to_json());
    info!("Successfully extracted the features!");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("detviz=info")),
        )
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
