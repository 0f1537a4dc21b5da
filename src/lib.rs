//! OpenImages dataset fetcher
//!
//! This library resolves OpenImages class labels to class codes, filters the
//! per-split bounding-box metadata, downloads the matching images in parallel
//! and writes one PASCAL VOC annotation per image.

pub mod annotation;
pub mod config;
pub mod download;
pub mod error;
pub mod io;
pub mod labels;
pub mod metadata;
pub mod pascal;
pub mod pipeline;
pub mod source;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use config::{Args, FetchConfig, Format};
pub use error::{Error, Result};
pub use pipeline::{download_dataset, DatasetReport};
pub use source::{
    BlobStore, DirBlobStore, DirTableSource, HttpBlobStore, HttpTableSource, TableSource,
};
pub use types::{ClassDirs, NormalizedBox, Split};
