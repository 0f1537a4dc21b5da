use indexmap::IndexMap;
use log::{error, info};

use crate::annotation::build_annotations;
use crate::config::FetchConfig;
use crate::download::download_images;
use crate::error::Result;
use crate::io::{read_exclusions, setup_class_directories};
use crate::labels::class_label_codes;
use crate::metadata::bounding_boxes;
use crate::source::{BlobStore, TableSource};
use crate::types::{AnnotationStats, ClassDirs, DownloadStats, Split};
use crate::utils::create_progress_bar;

/// What a pipeline run produced
#[derive(Debug, Default)]
pub struct DatasetReport {
    /// Output directories per lowercased class label
    pub directories: IndexMap<String, ClassDirs>,
    pub downloads: DownloadStats,
    pub annotations: AnnotationStats,
    /// Splits whose metadata could not be retrieved, with the reason
    pub failed_splits: Vec<(Split, String)>,
}

impl DatasetReport {
    pub fn print_summary(&self) {
        info!("=== Run Summary ===");
        self.downloads.print_summary();
        self.annotations.print_summary();
        for (split, reason) in &self.failed_splits {
            error!("Split {} was not processed: {}", split, reason);
        }
    }
}

/// Download the images and annotations of every requested class label.
///
/// Labels are resolved before anything touches the filesystem, so an unknown
/// label aborts the run with no side effects. A split whose metadata cannot
/// be retrieved is recorded in the report and the remaining splits still run.
pub fn download_dataset(
    config: &FetchConfig,
    tables: &dyn TableSource,
    blobs: &dyn BlobStore,
) -> Result<DatasetReport> {
    let label_codes = class_label_codes(tables, &config.class_labels)?;

    let directories =
        setup_class_directories(&config.dest_dir, label_codes.keys(), config.format)?;

    let exclusion_ids = match &config.exclusions_path {
        Some(path) => Some(read_exclusions(path)?),
        None => None,
    };

    let mut report = DatasetReport {
        directories,
        ..DatasetReport::default()
    };

    for &split in &config.splits {
        let boxes = bounding_boxes(tables, split, &label_codes, exclusion_ids.as_ref());
        let split_boxes = match boxes {
            Ok(split_boxes) => split_boxes,
            Err(e) if e.is_split_scoped() => {
                error!("Failed to get bounding boxes for split {}: {}", split, e);
                report.failed_splits.push((split, e.to_string()));
                continue;
            }
            Err(e) => return Err(e),
        };

        for (class_label, dirs) in &report.directories {
            let Some(groups) = split_boxes.groups(class_label) else {
                continue;
            };
            if groups.is_empty() {
                info!("No {} images for class '{}'", split, class_label);
                continue;
            }
            let image_ids: Vec<String> = groups.image_ids().map(str::to_string).collect();

            info!(
                "Downloading {} {} images for class '{}'",
                image_ids.len(),
                split,
                class_label
            );
            let pb = create_progress_bar(
                image_ids.len() as u64,
                &format!("{} {} images", split, class_label),
                config.show_progress,
            );
            let downloads = download_images(
                blobs,
                &image_ids,
                split,
                &dirs.images_dir,
                config.download_workers,
                &pb,
            )?;
            pb.finish_with_message("Download complete");
            downloads.print_summary();
            report.downloads.merge(&downloads);

            info!(
                "Creating {} annotations ({}) for class '{}'",
                split,
                config.format.dir_name(),
                class_label
            );
            let pb = create_progress_bar(
                groups.len() as u64,
                &format!("{} {} annotations", split, class_label),
                config.show_progress,
            );
            let annotations = build_annotations(
                config.format,
                &groups,
                class_label,
                &dirs.images_dir,
                &dirs.annotations_dir,
                config.annotation_workers,
                &pb,
            )?;
            pb.finish_with_message("Annotations complete");
            annotations.print_summary();
            report.annotations.merge(&annotations);
        }
    }

    Ok(report)
}
