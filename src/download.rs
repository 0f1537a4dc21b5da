use dashmap::DashSet;
use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering::Relaxed};

use crate::error::Result;
use crate::source::BlobStore;
use crate::types::{DownloadStats, Split};
use crate::utils::create_worker_pool;

/// Default number of concurrent image downloads
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 10;

/// Download the images of a split into `images_dir` on a dedicated thread pool.
///
/// Every image is fetched independently: a failed download is logged and
/// counted, and the rest of the batch carries on. Existing files are
/// overwritten.
pub fn download_images(
    store: &dyn BlobStore,
    image_ids: &[String],
    split: Split,
    images_dir: &Path,
    workers: usize,
    pb: &ProgressBar,
) -> Result<DownloadStats> {
    let pool = create_worker_pool(workers, "download")?;

    let downloaded = AtomicUsize::new(0);
    let bytes = AtomicU64::new(0);
    let failed_ids: DashSet<String> = DashSet::new();

    pool.install(|| {
        image_ids.par_iter().for_each(|image_id| {
            let key = split.image_key(image_id);
            let dest_file_path = image_path(images_dir, image_id);
            match download_image(store, &key, &dest_file_path) {
                Ok(size) => {
                    downloaded.fetch_add(1, Relaxed);
                    bytes.fetch_add(size, Relaxed);
                }
                Err(e) => {
                    warn!("Failed to download image {}: {}", image_id, e);
                    failed_ids.insert(image_id.clone());
                }
            }
            pb.inc(1);
        });
    });

    let mut failed_ids: Vec<String> = failed_ids.into_iter().collect();
    failed_ids.sort();

    Ok(DownloadStats {
        total: image_ids.len(),
        downloaded: downloaded.into_inner(),
        failed: failed_ids.len(),
        bytes: bytes.into_inner(),
        failed_ids,
    })
}

/// Download a single object to `dest_file_path`, removing the file again on failure
pub fn download_image(store: &dyn BlobStore, key: &str, dest_file_path: &Path) -> Result<u64> {
    let result = write_object(store, key, dest_file_path);
    if result.is_err() {
        remove_partial_file(dest_file_path);
    } else {
        debug!("Downloaded {} to {}", key, dest_file_path.display());
    }
    result
}

fn write_object(store: &dyn BlobStore, key: &str, dest_file_path: &Path) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(dest_file_path)?);
    let size = store.fetch(key, &mut writer)?;
    writer.flush()?;
    Ok(size)
}

fn remove_partial_file(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove partial download {}: {}", path.display(), e);
        }
    }
}

/// Where the image `image_id` lives inside `images_dir`
pub fn image_path(images_dir: &Path, image_id: &str) -> PathBuf {
    images_dir.join(format!("{}.jpg", image_id))
}
