use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use glimpse::batch::{self, ReconstructOutcome, ScoreOutcome};
use glimpse::reconstruct::ReconstructionParams;
use glimpse::transform::TransformConfig;
use glimpse::window::WindowType;

#[derive(Parser)]
#[command(
    name = "glimpse",
    version,
    about = "Rebuild waveforms from magnitude spectrograms and score the results"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconstruct waveforms for every row of a manifest
    Reconstruct {
        /// CSV manifest with header `input,output`
        #[arg(long)]
        manifest: PathBuf,
        /// Analysis frame length in samples
        #[arg(long, default_value_t = 2048)]
        frame_size: usize,
        /// Hop between frames in samples
        #[arg(long, default_value_t = 512)]
        hop_size: usize,
        /// Analysis window: hann, hamming, blackman or bartlett
        #[arg(long, default_value = "hann")]
        window: String,
        /// Griffin-Lim iterations
        #[arg(long, default_value_t = 2)]
        iterations: usize,
        /// Damping alpha, kept alongside lambda in parameter sets
        #[arg(long, default_value_t = 0.99)]
        alpha: f32,
        /// Damping lambda applied to each phase update
        #[arg(long, default_value_t = 0.01)]
        lambda: f32,
        /// Base seed for reproducible runs; item i runs with seed + i
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Score degraded/reference pairs and write a CSV report
    Score {
        /// CSV manifest with header `degraded,reference`
        #[arg(long)]
        manifest: PathBuf,
        /// Path of the CSV report to write
        #[arg(long)]
        report: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            eprintln!("{failures} item(s) failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> glimpse::Result<usize> {
    match cli.command {
        Command::Reconstruct {
            manifest,
            frame_size,
            hop_size,
            window,
            iterations,
            alpha,
            lambda,
            seed,
        } => {
            let window = WindowType::parse(&window).ok_or_else(|| {
                glimpse::Error::InvalidParameter {
                    name: "window",
                    value: window.clone(),
                    reason: "expected hann, hamming, blackman or bartlett".to_string(),
                }
            })?;
            let config = TransformConfig::new(frame_size, hop_size, window)?;
            let params = ReconstructionParams {
                iterations,
                damping_alpha: alpha,
                damping_lambda: lambda,
            };
            params.validate()?;

            let jobs = batch::read_reconstruct_manifest(&manifest)?;
            let records = batch::reconstruct_batch(&jobs, &config, &params, seed);

            let mut failures = 0;
            for record in &records {
                match &record.outcome {
                    ReconstructOutcome::Written { samples } => println!(
                        "{} -> {} ({samples} samples)",
                        record.job.input.display(),
                        record.job.output.display()
                    ),
                    ReconstructOutcome::Failed(reason) => {
                        eprintln!("{}: {reason}", record.job.input.display());
                        failures += 1;
                    }
                }
            }
            Ok(failures)
        }
        Command::Score { manifest, report } => {
            let jobs = batch::read_compare_manifest(&manifest)?;
            let records = batch::score_batch(&jobs);
            batch::write_report(&report, &records)?;

            let mut failures = 0;
            for record in &records {
                match &record.outcome {
                    ScoreOutcome::Score(score) => println!("{}: {score:.3}", record.job.id),
                    ScoreOutcome::Failed(reason) => {
                        eprintln!("{}: {reason}", record.job.id);
                        failures += 1;
                    }
                }
            }
            println!("report written to {}", report.display());
            Ok(failures)
        }
    }
}
