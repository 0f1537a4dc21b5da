use clap::Parser;

use log::{error, info};
use std::process::ExitCode;

use openimages_fetch::{download_dataset, Args};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match args.to_fetch_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid arguments: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting the OpenImages download...");

    let (tables, blobs) = args.sources();
    match download_dataset(&config, tables.as_ref(), blobs.as_ref()) {
        Ok(report) => {
            report.print_summary();
            for (class_label, dirs) in &report.directories {
                info!(
                    "Class '{}': images in {}, annotations in {}",
                    class_label,
                    dirs.images_dir.display(),
                    dirs.annotations_dir.display()
                );
            }
            if report.failed_splits.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("Failed to download dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
