use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use crate::download::DEFAULT_DOWNLOAD_WORKERS;
use crate::source::{
    BlobStore, DirBlobStore, DirTableSource, HttpBlobStore, HttpTableSource, TableSource,
    BOXES_BASE_URL, CLASSES_BASE_URL, IMAGES_BASE_URL,
};
use crate::types::Split;

/// Download OpenImages images for a set of classes and write detection annotations.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Base output directory; one sub-directory per class label is created
    #[arg(short = 'd', long = "base_dir")]
    pub base_dir: PathBuf,

    /// Object classes to fetch, as spelled in the OpenImages class descriptions
    #[arg(long = "label", required = true, num_args = 1..)]
    pub labels: Vec<String>,

    /// Output annotation format
    #[arg(long = "format", value_enum, default_value = "pascal")]
    pub format: Format,

    /// File with image IDs (one per line) to exclude from the dataset
    #[arg(long = "exclusions")]
    pub exclusions: Option<PathBuf>,

    /// Dataset splits to process, in order
    #[arg(long = "split", value_enum, num_args = 1.., default_values_t = Split::ALL)]
    pub splits: Vec<Split>,

    /// Number of concurrent image downloads
    #[arg(
        long = "download_workers",
        default_value_t = DEFAULT_DOWNLOAD_WORKERS,
        value_parser = validate_workers
    )]
    pub download_workers: usize,

    /// Number of annotation workers (defaults to the number of CPUs)
    #[arg(long = "annotation_workers", value_parser = validate_workers)]
    pub annotation_workers: Option<usize>,

    /// Base URL of the class descriptions table
    #[arg(long = "classes_url", default_value = CLASSES_BASE_URL)]
    pub classes_url: String,

    /// Base URL of the per-split bounding box tables
    #[arg(long = "boxes_url", default_value = BOXES_BASE_URL)]
    pub boxes_url: String,

    /// Base URL of the image bucket
    #[arg(long = "images_url", default_value = IMAGES_BASE_URL)]
    pub images_url: String,

    /// Read tables and images from a local mirror instead of the remote endpoints
    #[arg(long = "mirror_dir")]
    pub mirror_dir: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long = "no_progress")]
    pub no_progress: bool,
}

// Enumeration for the annotation output format
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Format {
    Darknet,
    Coco,
    Kitti,
    Pascal,
    Tfrecord,
}

impl Format {
    /// Name of the per-class directory holding the annotations
    pub fn dir_name(&self) -> &'static str {
        match self {
            Format::Darknet => "darknet",
            Format::Coco => "coco",
            Format::Kitti => "kitti",
            Format::Pascal => "pascal",
            Format::Tfrecord => "tfrecord",
        }
    }

    /// Whether annotation files are actually written for this format
    pub fn is_supported(&self) -> bool {
        matches!(self, Format::Pascal)
    }
}

/// Library-facing configuration of one pipeline run
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub dest_dir: PathBuf,
    pub class_labels: Vec<String>,
    pub format: Format,
    pub exclusions_path: Option<PathBuf>,
    pub splits: Vec<Split>,
    pub download_workers: usize,
    pub annotation_workers: usize,
    pub show_progress: bool,
}

impl FetchConfig {
    pub fn new(dest_dir: impl Into<PathBuf>, class_labels: Vec<String>, format: Format) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            class_labels,
            format,
            exclusions_path: None,
            splits: Split::ALL.to_vec(),
            download_workers: DEFAULT_DOWNLOAD_WORKERS,
            annotation_workers: num_cpus::get(),
            show_progress: true,
        }
    }
}

impl Args {
    /// Convert the parsed arguments into a run configuration
    pub fn to_fetch_config(&self) -> Result<FetchConfig, String> {
        let mut labels = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            let label = label.trim();
            if label.is_empty() {
                return Err("class labels must not be empty".to_string());
            }
            labels.push(label.to_string());
        }

        if let Some(exclusions) = &self.exclusions {
            if !exclusions.is_file() {
                return Err(format!(
                    "exclusions file does not exist: {}",
                    exclusions.display()
                ));
            }
        }

        let mut splits = Vec::with_capacity(self.splits.len());
        for split in &self.splits {
            if !splits.contains(split) {
                splits.push(*split);
            }
        }

        Ok(FetchConfig {
            dest_dir: self.base_dir.clone(),
            class_labels: labels,
            format: self.format,
            exclusions_path: self.exclusions.clone(),
            splits,
            download_workers: self.download_workers,
            annotation_workers: self.annotation_workers.unwrap_or_else(num_cpus::get),
            show_progress: !self.no_progress,
        })
    }

    /// Table source and blob store selected by the arguments
    pub fn sources(&self) -> (Box<dyn TableSource>, Box<dyn BlobStore>) {
        match &self.mirror_dir {
            Some(mirror_dir) => (
                Box::new(DirTableSource::new(mirror_dir)),
                Box::new(DirBlobStore::new(mirror_dir)),
            ),
            None => (
                Box::new(HttpTableSource::new(&self.classes_url, &self.boxes_url)),
                Box::new(HttpBlobStore::new(&self.images_url)),
            ),
        }
    }
}

// Validate that a worker count is a positive integer
pub fn validate_workers(s: &str) -> Result<usize, String> {
    match usize::from_str(s) {
        Ok(val) if val > 0 => Ok(val),
        _ => Err("WORKERS must be a positive integer".to_string()),
    }
}
