use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

use crate::config::Format;
use crate::error::{Error, Result};
use crate::metadata::ClassGroups;
use crate::pascal::to_pascal;
use crate::types::{AnnotationStats, ImageTask};
use crate::utils::create_worker_pool;

/// Build one annotation file per image of `groups` on a dedicated thread pool.
///
/// Only PASCAL VOC is written; the other formats are accepted and produce
/// nothing. Images that are missing or unreadable are skipped without
/// touching the rest of the batch.
pub fn build_annotations(
    format: Format,
    groups: &ClassGroups<'_>,
    class_label: &str,
    images_dir: &Path,
    annotations_dir: &Path,
    workers: usize,
    pb: &ProgressBar,
) -> Result<AnnotationStats> {
    let tasks = groups.tasks();

    if !format.is_supported() {
        warn!(
            "Annotation format '{}' is not supported yet; no annotations written for '{}'",
            format.dir_name(),
            class_label
        );
        pb.inc(tasks.len() as u64);
        return Ok(AnnotationStats {
            total: tasks.len(),
            skipped_unsupported: tasks.len(),
            ..AnnotationStats::default()
        });
    }

    let pool = create_worker_pool(workers, "annotate")?;

    let written = AtomicUsize::new(0);
    let skipped_missing_image = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    pool.install(|| {
        tasks.par_iter().for_each(|task| {
            match build_annotation(format, task, class_label, images_dir, annotations_dir) {
                Ok(Some(path)) => {
                    debug!("Wrote {}", path.display());
                    written.fetch_add(1, Relaxed);
                }
                Ok(None) => {}
                Err(e @ Error::MissingImage { .. }) => {
                    warn!("Skipping annotation for {}: {}", task.image_id, e);
                    skipped_missing_image.fetch_add(1, Relaxed);
                }
                Err(e) => {
                    warn!("Failed to build annotation for {}: {}", task.image_id, e);
                    failed.fetch_add(1, Relaxed);
                }
            }
            pb.inc(1);
        });
    });

    Ok(AnnotationStats {
        total: tasks.len(),
        written: written.into_inner(),
        skipped_missing_image: skipped_missing_image.into_inner(),
        skipped_unsupported: 0,
        failed: failed.into_inner(),
    })
}

/// Build the annotation of a single image in the requested format
pub fn build_annotation(
    format: Format,
    task: &ImageTask,
    class_label: &str,
    images_dir: &Path,
    annotations_dir: &Path,
) -> Result<Option<PathBuf>> {
    match format {
        Format::Pascal => to_pascal(
            &task.boxes,
            class_label,
            &task.image_id,
            images_dir,
            annotations_dir,
        )
        .map(Some),
        Format::Darknet | Format::Coco | Format::Kitti | Format::Tfrecord => Ok(None),
    }
}
