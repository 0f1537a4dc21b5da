#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use openimages_fetch::source::Table;
use openimages_fetch::{Error, Result, TableSource};

pub const BBOX_HEADER: &str = "ImageID,Source,LabelName,Confidence,XMin,XMax,YMin,YMax,IsOccluded,IsTruncated,IsGroupOf,IsDepiction,IsInside";

pub const CLASS_DESCRIPTIONS: &str = "\
/m/011k07,Tortoise
/m/0bt9lr,Dog
/m/01yrx,Cat
/m/0dupe,Dog
";

/// Build one bounding-box CSV row with the given coordinates and flags
pub fn bbox_row(image_id: &str, code: &str, coords: [f64; 4], flags: [u8; 5]) -> String {
    format!(
        "{},xclick,{},1,{},{},{},{},{},{},{},{},{}",
        image_id,
        code,
        coords[0],
        coords[1],
        coords[2],
        coords[3],
        flags[0],
        flags[1],
        flags[2],
        flags[3],
        flags[4]
    )
}

pub fn bbox_table(rows: &[String]) -> String {
    let mut table = String::from(BBOX_HEADER);
    table.push('\n');
    for row in rows {
        table.push_str(row);
        table.push('\n');
    }
    table
}

/// Tables held in memory, counting how often each one is opened
#[derive(Default)]
pub struct MemoryTables {
    tables: HashMap<String, String>,
    pub opened: Cell<usize>,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, table: Table, content: &str) -> Self {
        self.tables.insert(table.relative_path(), content.to_string());
        self
    }
}

impl TableSource for MemoryTables {
    fn location(&self, table: Table) -> String {
        format!("memory://{}", table.relative_path())
    }

    fn open(&self, table: Table) -> Result<Box<dyn Read + Send>> {
        self.opened.set(self.opened.get() + 1);
        match self.tables.get(&table.relative_path()) {
            Some(content) => Ok(Box::new(Cursor::new(content.clone().into_bytes()))),
            None => Err(Error::Retrieval {
                url: self.location(table),
                reason: "invalid response (status code: 404)".to_string(),
            }),
        }
    }
}

/// Write an RGB JPEG of the given size
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]))
        .save(path)
        .unwrap();
}

/// Write a single-channel JPEG of the given size
pub fn write_gray_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::GrayImage::from_pixel(width, height, image::Luma([128]))
        .save(path)
        .unwrap();
}

pub fn count_files(dir: &Path, extension: &str) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == extension))
        .count()
}
