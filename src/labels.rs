use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::source::{Table, TableSource};

// One row of the class descriptions table (no header: code,label)
#[derive(Debug, Deserialize)]
struct ClassDescription {
    code: String,
    label: String,
}

/// Resolve human-readable class labels to their OpenImages class codes.
///
/// The class descriptions table is fetched once for the whole batch. Labels
/// must match verbatim; the first matching row wins. The returned map is keyed
/// by the lowercased label and keeps the request order. A single unknown label
/// fails the whole batch.
pub fn class_label_codes(
    source: &dyn TableSource,
    class_labels: &[String],
) -> Result<IndexMap<String, String>> {
    if class_labels.is_empty() {
        return Err(Error::NoLabels);
    }

    let table = Table::ClassDescriptions;
    let location = source.location(table);
    info!("Fetching class descriptions from {}", location);
    let descriptions = read_class_descriptions(source.open(table)?, &location)?;
    debug!("Read {} class descriptions", descriptions.len());

    let mut labels_to_codes = IndexMap::with_capacity(class_labels.len());
    for class_label in class_labels {
        let code = descriptions
            .iter()
            .find(|description| &description.label == class_label)
            .map(|description| description.code.clone())
            .ok_or_else(|| Error::LabelNotFound(class_label.clone()))?;
        debug!("Class '{}' has code {}", class_label, code);
        labels_to_codes.insert(class_label.to_lowercase(), code);
    }

    Ok(labels_to_codes)
}

fn read_class_descriptions(
    reader: impl std::io::Read,
    location: &str,
) -> Result<Vec<ClassDescription>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
        .deserialize()
        .collect::<std::result::Result<Vec<ClassDescription>, _>>()
        .map_err(|source| Error::Table {
            table: location.to_string(),
            source,
        })
}
