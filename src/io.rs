use indexmap::IndexMap;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::Format;
use crate::types::{ClassDirs, ExclusionSet};
use crate::utils::create_output_directory;

/// Set up the images and annotations directories of every class label
pub fn setup_class_directories<'a>(
    dest_dir: &Path,
    class_labels: impl IntoIterator<Item = &'a String>,
    format: Format,
) -> std::io::Result<IndexMap<String, ClassDirs>> {
    let mut directories = IndexMap::new();
    for class_label in class_labels {
        let class_dir = dest_dir.join(sanitize_filename::sanitize(class_label));
        let images_dir = create_output_directory(&class_dir.join("images"))?;
        let annotations_dir = create_output_directory(&class_dir.join(format.dir_name()))?;
        directories.insert(
            class_label.clone(),
            ClassDirs {
                images_dir,
                annotations_dir,
            },
        );
    }
    Ok(directories)
}

/// Read the image IDs listed in an exclusions file, one per line
pub fn read_exclusions(path: &Path) -> std::io::Result<ExclusionSet> {
    let reader = BufReader::new(File::open(path)?);
    let mut exclusion_ids = ExclusionSet::new();
    for line in reader.lines() {
        let line = line?;
        let image_id = line.trim_end();
        if !image_id.is_empty() {
            exclusion_ids.insert(image_id.to_string());
        }
    }
    info!(
        "Read {} image IDs to exclude from {}",
        exclusion_ids.len(),
        path.display()
    );
    Ok(exclusion_ids)
}
