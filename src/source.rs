//! Remote data sources: the OpenImages metadata tables and the image bucket.
//!
//! Both are traits so a run can read from the public endpoints over HTTPS or
//! from a local mirror that keeps the same relative layout.

use log::debug;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::Split;

pub const CLASSES_BASE_URL: &str = "https://storage.googleapis.com/openimages/v5";
pub const BOXES_BASE_URL: &str = "https://storage.googleapis.com/openimages/2018_04";
pub const IMAGES_BASE_URL: &str = "https://open-images-dataset.s3.amazonaws.com";

const CLASS_DESCRIPTIONS_CSV: &str = "class-descriptions-boxable.csv";

/// The metadata tables published alongside the images
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Table {
    ClassDescriptions,
    BoundingBoxes(Split),
}

impl Table {
    /// Path of the table relative to its base location
    pub fn relative_path(&self) -> String {
        match self {
            Table::ClassDescriptions => CLASS_DESCRIPTIONS_CSV.to_string(),
            Table::BoundingBoxes(split) => format!("{split}/{split}-annotations-bbox.csv"),
        }
    }
}

/// Something that can hand out the contents of a metadata table
pub trait TableSource {
    /// Human-readable location of the table, used in errors and logs
    fn location(&self, table: Table) -> String;

    fn open(&self, table: Table) -> Result<Box<dyn Read + Send>>;
}

/// Something images can be copied out of, shared by all download workers
pub trait BlobStore: Send + Sync {
    /// Copy the object stored under `key` into `dest`, returning the byte count
    fn fetch(&self, key: &str, dest: &mut dyn Write) -> Result<u64>;
}

fn http_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(30))
        .timeout_read(Duration::from_secs(300))
        .build()
}

fn http_get(agent: &ureq::Agent, url: &str) -> Result<ureq::Response> {
    debug!("GET {}", url);
    match agent.get(url).call() {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(code, _)) => Err(Error::Retrieval {
            url: url.to_string(),
            reason: format!("invalid response (status code: {code})"),
        }),
        Err(e) => Err(Error::Retrieval {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Tables served over HTTPS from the public OpenImages buckets
#[derive(Clone)]
pub struct HttpTableSource {
    agent: ureq::Agent,
    classes_base_url: String,
    boxes_base_url: String,
}

impl HttpTableSource {
    pub fn new(classes_base_url: &str, boxes_base_url: &str) -> Self {
        Self {
            agent: http_agent(),
            classes_base_url: classes_base_url.trim_end_matches('/').to_string(),
            boxes_base_url: boxes_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for HttpTableSource {
    fn default() -> Self {
        Self::new(CLASSES_BASE_URL, BOXES_BASE_URL)
    }
}

impl TableSource for HttpTableSource {
    fn location(&self, table: Table) -> String {
        let base = match table {
            Table::ClassDescriptions => &self.classes_base_url,
            Table::BoundingBoxes(_) => &self.boxes_base_url,
        };
        format!("{}/{}", base, table.relative_path())
    }

    fn open(&self, table: Table) -> Result<Box<dyn Read + Send>> {
        let url = self.location(table);
        let response = http_get(&self.agent, &url)?;
        Ok(Box::new(response.into_reader()))
    }
}

/// Anonymous read access to the image bucket over HTTPS
#[derive(Clone)]
pub struct HttpBlobStore {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBlobStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            agent: http_agent(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for HttpBlobStore {
    fn default() -> Self {
        Self::new(IMAGES_BASE_URL)
    }
}

impl BlobStore for HttpBlobStore {
    fn fetch(&self, key: &str, dest: &mut dyn Write) -> Result<u64> {
        let url = format!("{}/{}", self.base_url, key);
        let response = http_get(&self.agent, &url).map_err(|e| Error::Download {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        io::copy(&mut response.into_reader(), dest).map_err(|e| Error::Download {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Tables read from a local mirror directory
#[derive(Debug, Clone)]
pub struct DirTableSource {
    root: PathBuf,
}

impl DirTableSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, table: Table) -> PathBuf {
        self.root.join(table.relative_path())
    }
}

impl TableSource for DirTableSource {
    fn location(&self, table: Table) -> String {
        self.path(table).display().to_string()
    }

    fn open(&self, table: Table) -> Result<Box<dyn Read + Send>> {
        let path = self.path(table);
        let file = File::open(&path).map_err(|e| Error::Retrieval {
            url: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Images read from a local mirror directory laid out as `<split>/<id>.jpg`
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobStore for DirBlobStore {
    fn fetch(&self, key: &str, dest: &mut dyn Write) -> Result<u64> {
        let to_download_error = |e: io::Error| Error::Download {
            key: key.to_string(),
            reason: e.to_string(),
        };
        let mut file = File::open(self.root.join(key)).map_err(to_download_error)?;
        io::copy(&mut file, dest).map_err(to_download_error)
    }
}
