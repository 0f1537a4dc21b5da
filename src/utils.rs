use image::{ImageDecoder, ImageReader};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str, visible: bool) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .progress_chars("#>-"),
    );
    if !visible {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb
}

/// Build a dedicated worker pool; `name` prefixes the thread names
pub fn create_worker_pool(num_threads: usize, name: &str) -> Result<rayon::ThreadPool> {
    let name = name.to_string();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1))
        .thread_name(move |i| format!("{}-{}", name, i))
        .build()?;
    Ok(pool)
}

/// Create an output directory if it does not exist yet and return its path
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_dir() {
        log::debug!("Directory {:?} already exists, reusing it.", path);
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

/// Read width, height and channel count from an image header
pub fn image_dimensions(path: &Path) -> Result<(u32, u32, u8)> {
    let missing = |reason: String| Error::MissingImage {
        path: path.to_path_buf(),
        reason,
    };

    let decoder = ImageReader::open(path)
        .map_err(|e| missing(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| missing(e.to_string()))?
        .into_decoder()
        .map_err(|e| missing(e.to_string()))?;
    let (width, height) = decoder.dimensions();
    let depth = decoder.color_type().channel_count();

    Ok((width, height, depth))
}

/// Lexically normalize a path: drop `.` components and fold `..` into their parent
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_with_name = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if ends_with_name {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}
