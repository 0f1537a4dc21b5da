use indexmap::IndexMap;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::io::Read;

use crate::error::{Error, Result};
use crate::source::{Table, TableSource};
use crate::types::{BoxRecord, BoxRow, ExclusionSet, ImageTask, NormalizedBox, Split};

/// Bounding boxes of one split that survived filtering, grouped per class label.
///
/// The records live in one vector; each class keeps an ordered map from image
/// ID to the indices of its records, so images come out in first-appearance
/// order and boxes in file order.
#[derive(Debug, Default)]
pub struct SplitBoxes {
    records: Vec<BoxRecord>,
    groups: HashMap<String, IndexMap<String, Vec<usize>>>,
}

/// Borrowed view of one class label's boxes grouped by image ID
#[derive(Debug, Clone, Copy)]
pub struct ClassGroups<'a> {
    records: &'a [BoxRecord],
    index: &'a IndexMap<String, Vec<usize>>,
}

impl SplitBoxes {
    /// Group `records` by image ID for every (label, code) pair
    pub fn from_records(records: Vec<BoxRecord>, label_codes: &IndexMap<String, String>) -> Self {
        let mut by_code: HashMap<&str, IndexMap<String, Vec<usize>>> = label_codes
            .values()
            .map(|code| (code.as_str(), IndexMap::new()))
            .collect();

        for (i, record) in records.iter().enumerate() {
            if let Some(index) = by_code.get_mut(record.class_code.as_str()) {
                index.entry(record.image_id.clone()).or_default().push(i);
            }
        }

        let groups = label_codes
            .iter()
            .map(|(label, code)| {
                let index = by_code.get(code.as_str()).cloned().unwrap_or_default();
                (label.clone(), index)
            })
            .collect();

        Self { records, groups }
    }

    pub fn groups(&self, class_label: &str) -> Option<ClassGroups<'_>> {
        self.groups.get(class_label).map(|index| ClassGroups {
            records: &self.records,
            index,
        })
    }

    /// Number of boxes kept across all classes
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl<'a> ClassGroups<'a> {
    pub fn image_ids(&self) -> impl Iterator<Item = &'a str> {
        self.index.keys().map(String::as_str)
    }

    pub fn boxes(&self, image_id: &str) -> Option<Vec<NormalizedBox>> {
        self.index
            .get(image_id)
            .map(|indices| indices.iter().map(|&i| self.records[i].bbox).collect())
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn box_count(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    /// Owned per-image work items for the worker pools
    pub fn tasks(&self) -> Vec<ImageTask> {
        self.index
            .iter()
            .map(|(image_id, indices)| ImageTask {
                image_id: image_id.clone(),
                boxes: indices.iter().map(|&i| self.records[i].bbox).collect(),
            })
            .collect()
    }
}

/// Fetch a split's bounding boxes and group the usable ones by class and image.
///
/// The table is fetched once and shared by every requested class. Boxes on
/// excluded images and boxes with any quality flag set are dropped, as are
/// boxes of classes nobody asked for.
pub fn bounding_boxes(
    source: &dyn TableSource,
    split: Split,
    label_codes: &IndexMap<String, String>,
    exclusion_ids: Option<&ExclusionSet>,
) -> Result<SplitBoxes> {
    let table = Table::BoundingBoxes(split);
    let location = source.location(table);
    info!("Fetching {} bounding boxes from {}", split, location);

    let reader = source.open(table)?;
    let records = filter_boxes(reader, &location, label_codes, exclusion_ids)?;
    debug!("Kept {} {} bounding boxes", records.len(), split);

    Ok(SplitBoxes::from_records(records, label_codes))
}

/// Stream a bounding-box table and keep the rows usable for the requested codes
pub fn filter_boxes(
    reader: impl Read,
    location: &str,
    label_codes: &IndexMap<String, String>,
    exclusion_ids: Option<&ExclusionSet>,
) -> Result<Vec<BoxRecord>> {
    let wanted_codes: HashSet<&str> = label_codes.values().map(String::as_str).collect();
    let exclusion_ids = exclusion_ids.filter(|ids| !ids.is_empty());

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let (mut total, mut excluded, mut flagged) = (0usize, 0usize, 0usize);
    for row in csv_reader.deserialize::<BoxRow>() {
        let row = row.map_err(|source| Error::Table {
            table: location.to_string(),
            source,
        })?;
        total += 1;

        if exclusion_ids.is_some_and(|ids| ids.contains(&row.image_id)) {
            excluded += 1;
            continue;
        }
        if !row.is_clean() {
            flagged += 1;
            continue;
        }
        if !wanted_codes.contains(row.label_name.as_str()) {
            continue;
        }

        let bbox = row.bbox();
        records.push(BoxRecord {
            image_id: row.image_id,
            class_code: row.label_name,
            bbox,
        });
    }

    debug!(
        "Read {} rows from {} ({} excluded, {} flagged)",
        total, location, excluded, flagged
    );
    Ok(records)
}
