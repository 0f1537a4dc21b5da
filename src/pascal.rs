//! PASCAL VOC annotation records and their XML form.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::download::image_path;
use crate::error::Result;
use crate::types::{NormalizedBox, PixelBox, DATABASE_NAME};
use crate::utils::{image_dimensions, normalize_path};

const POSE_UNSPECIFIED: &str = "Unspecified";

/// Image size as recorded in the annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub depth: u8,
}

/// One labelled object of a PASCAL VOC annotation
#[derive(Debug, Clone, PartialEq)]
pub struct PascalObject {
    pub name: String,
    pub pose: String,
    pub truncated: u8,
    pub difficult: u8,
    pub bndbox: PixelBox,
}

/// A complete PASCAL VOC annotation for one image
#[derive(Debug, Clone, PartialEq)]
pub struct PascalAnnotation {
    pub folder: String,
    pub filename: String,
    pub path: String,
    pub database: String,
    pub size: ImageSize,
    pub segmented: u8,
    pub objects: Vec<PascalObject>,
}

impl PascalAnnotation {
    /// Build the annotation of the image at `image_path` from normalized boxes
    pub fn new(image_path: &Path, size: ImageSize, label: &str, bboxes: &[NormalizedBox]) -> Self {
        let normalized_image_path = normalize_path(image_path);
        let filename = file_name_string(&normalized_image_path);
        let folder = normalized_image_path
            .parent()
            .map(file_name_string)
            .unwrap_or_default();

        let objects = bboxes
            .iter()
            .map(|bbox| PascalObject {
                name: label.to_string(),
                pose: POSE_UNSPECIFIED.to_string(),
                truncated: 0,
                difficult: 0,
                bndbox: bbox.to_pixels(size.width, size.height),
            })
            .collect();

        Self {
            folder,
            filename,
            path: normalized_image_path.to_string_lossy().into_owned(),
            database: DATABASE_NAME.to_string(),
            size,
            segmented: 0,
            objects,
        }
    }

    /// Render as an indented UTF-8 XML document
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        start(&mut writer, "annotation")?;
        text_element(&mut writer, "folder", &self.folder)?;
        text_element(&mut writer, "filename", &self.filename)?;
        text_element(&mut writer, "path", &self.path)?;

        start(&mut writer, "source")?;
        text_element(&mut writer, "database", &self.database)?;
        end(&mut writer, "source")?;

        start(&mut writer, "size")?;
        text_element(&mut writer, "width", &self.size.width.to_string())?;
        text_element(&mut writer, "height", &self.size.height.to_string())?;
        text_element(&mut writer, "depth", &self.size.depth.to_string())?;
        end(&mut writer, "size")?;

        text_element(&mut writer, "segmented", &self.segmented.to_string())?;

        for object in &self.objects {
            start(&mut writer, "object")?;
            text_element(&mut writer, "name", &object.name)?;
            text_element(&mut writer, "pose", &object.pose)?;
            text_element(&mut writer, "truncated", &object.truncated.to_string())?;
            text_element(&mut writer, "difficult", &object.difficult.to_string())?;

            start(&mut writer, "bndbox")?;
            text_element(&mut writer, "xmin", &object.bndbox.x_min.to_string())?;
            text_element(&mut writer, "xmax", &object.bndbox.x_max.to_string())?;
            text_element(&mut writer, "ymin", &object.bndbox.y_min.to_string())?;
            text_element(&mut writer, "ymax", &object.bndbox.y_max.to_string())?;
            end(&mut writer, "bndbox")?;

            end(&mut writer, "object")?;
        }
        end(&mut writer, "annotation")?;

        let mut xml = writer.into_inner();
        xml.push(b'\n');
        Ok(String::from_utf8_lossy(&xml).into_owned())
    }
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> std::io::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> std::io::Result<()> {
    start(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

/// Write a PASCAL VOC file holding every box of one image.
///
/// The image is read from `<images_dir>/<image_id>.jpg` for its size; if it is
/// missing or unreadable nothing is written. Returns the annotation path.
pub fn to_pascal(
    bboxes: &[NormalizedBox],
    label: &str,
    image_id: &str,
    images_dir: &Path,
    pascal_dir: &Path,
) -> Result<PathBuf> {
    let image_path = image_path(images_dir, image_id);
    let (width, height, depth) = image_dimensions(&image_path)?;
    let size = ImageSize {
        width,
        height,
        depth,
    };

    let xml = PascalAnnotation::new(&image_path, size, label, bboxes).to_xml()?;

    let pascal_file_path = pascal_dir.join(format!("{}.xml", image_id));
    fs::write(&pascal_file_path, xml)?;
    Ok(pascal_file_path)
}
