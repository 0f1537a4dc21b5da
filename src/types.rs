use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Database tag written into every annotation
pub const DATABASE_NAME: &str = "OpenImages";

/// Image IDs to leave out of the dataset
pub type ExclusionSet = HashSet<String>;

// The partitions OpenImages is published in
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }

    /// Object key of an image in the blob store
    pub fn image_key(&self, image_id: &str) -> String {
        format!("{}/{}.jpg", self.as_str(), image_id)
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// One row of a split's bounding-box table; columns not named here are skipped
#[derive(Debug, Deserialize, Clone)]
pub struct BoxRow {
    #[serde(rename = "ImageID")]
    pub image_id: String,
    #[serde(rename = "LabelName")]
    pub label_name: String,
    #[serde(rename = "XMin")]
    pub x_min: f64,
    #[serde(rename = "XMax")]
    pub x_max: f64,
    #[serde(rename = "YMin")]
    pub y_min: f64,
    #[serde(rename = "YMax")]
    pub y_max: f64,
    #[serde(rename = "IsOccluded")]
    pub is_occluded: i8,
    #[serde(rename = "IsTruncated")]
    pub is_truncated: i8,
    #[serde(rename = "IsGroupOf")]
    pub is_group_of: i8,
    #[serde(rename = "IsDepiction")]
    pub is_depiction: i8,
    #[serde(rename = "IsInside")]
    pub is_inside: i8,
}

impl BoxRow {
    /// A box is usable only when none of its quality flags is set
    pub fn is_clean(&self) -> bool {
        [
            self.is_occluded,
            self.is_truncated,
            self.is_group_of,
            self.is_depiction,
            self.is_inside,
        ]
        .iter()
        .all(|&flag| flag == 0)
    }

    pub fn bbox(&self) -> NormalizedBox {
        NormalizedBox {
            x_min: self.x_min,
            x_max: self.x_max,
            y_min: self.y_min,
            y_max: self.y_max,
        }
    }
}

/// Bounding box with coordinates as fractions of the image size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl NormalizedBox {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Convert to pixel bounds, truncating and clamping to the image
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelBox {
        let (w, h) = (width as f64, height as f64);
        PixelBox {
            x_min: ((self.x_min * w).trunc() as i64).max(0),
            x_max: ((self.x_max * w).trunc() as i64).min(width as i64 - 1),
            y_min: ((self.y_min * h).trunc() as i64).max(0),
            y_max: ((self.y_max * h).trunc() as i64).min(height as i64 - 1),
        }
    }
}

/// Bounding box in absolute pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

// A surviving box reduced to what the downstream stages need
#[derive(Debug, Clone)]
pub struct BoxRecord {
    pub image_id: String,
    pub class_code: String,
    pub bbox: NormalizedBox,
}

// Everything the annotation stage needs to know about one image
#[derive(Debug, Clone)]
pub struct ImageTask {
    pub image_id: String,
    pub boxes: Vec<NormalizedBox>,
}

// Struct to hold the output directories of one class label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDirs {
    pub images_dir: PathBuf,
    pub annotations_dir: PathBuf,
}

// Outcome counters of one download batch
#[derive(Debug, Default, Clone)]
pub struct DownloadStats {
    pub total: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub bytes: u64,
    pub failed_ids: Vec<String>,
}

impl DownloadStats {
    pub fn merge(&mut self, other: &DownloadStats) {
        self.total += other.total;
        self.downloaded += other.downloaded;
        self.failed += other.failed;
        self.bytes += other.bytes;
        self.failed_ids.extend(other.failed_ids.iter().cloned());
    }

    pub fn print_summary(&self) {
        log::info!(
            "Downloaded {}/{} images ({} bytes)",
            self.downloaded,
            self.total,
            self.bytes
        );
        if self.failed > 0 {
            log::warn!("Failed downloads: {}", self.failed);
        }
    }
}

// Outcome counters of one annotation batch
#[derive(Debug, Default, Clone)]
pub struct AnnotationStats {
    pub total: usize,
    pub written: usize,
    pub skipped_missing_image: usize,
    pub skipped_unsupported: usize,
    pub failed: usize,
}

impl AnnotationStats {
    pub fn merge(&mut self, other: &AnnotationStats) {
        self.total += other.total;
        self.written += other.written;
        self.skipped_missing_image += other.skipped_missing_image;
        self.skipped_unsupported += other.skipped_unsupported;
        self.failed += other.failed;
    }

    pub fn print_summary(&self) {
        log::info!("Annotations written: {}/{}", self.written, self.total);

        let total_skipped = self.skipped_missing_image + self.skipped_unsupported;
        if total_skipped > 0 {
            log::warn!(
                "Total skipped annotations: {} (missing image file: {}, unsupported format: {})",
                total_skipped,
                self.skipped_missing_image,
                self.skipped_unsupported
            );
        }
        if self.failed > 0 {
            log::warn!("Failed annotations: {}", self.failed);
        }
    }
}
