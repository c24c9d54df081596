//! Edition metadata, configurable output schema, content and provenance hashing.
//!
//! Records are typed internally and only reshaped into JSON at the boundary, through a
//! [`SchemaMapper`] that names a dotted key path for every logical field.

use std::path::Path;

use rand::Rng;
use serde_json::{Map, Value};
use sha2::Digest as _;

use crate::{
    foundation::core::EditionIndex,
    foundation::error::{NftgenError, NftgenResult},
    render::backend::FrameRGBA,
    vector,
};

/// Output key path for every logical metadata field. Paths are `.`-separated.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchemaMapper {
    pub name: String,
    pub description: String,
    pub edition: String,
    pub attributes: String,
    pub tags: String,
    #[serde(rename = "base64SvgDataUri")]
    pub base64_svg_data_uri: String,
    #[serde(rename = "image.href")]
    pub image_href: String,
    #[serde(rename = "image.hash")]
    pub image_hash: String,
}

impl Default for SchemaMapper {
    fn default() -> Self {
        Self {
            name: "name".to_string(),
            description: "description".to_string(),
            edition: "edition".to_string(),
            attributes: "attributes".to_string(),
            tags: "tags".to_string(),
            base64_svg_data_uri: "base64SvgDataUri".to_string(),
            image_href: "image.href".to_string(),
            image_hash: "image.hash".to_string(),
        }
    }
}

impl SchemaMapper {
    pub fn validate(&self) -> NftgenResult<()> {
        let fields = [
            ("name", &self.name),
            ("description", &self.description),
            ("edition", &self.edition),
            ("attributes", &self.attributes),
            ("tags", &self.tags),
            ("base64SvgDataUri", &self.base64_svg_data_uri),
            ("image.href", &self.image_href),
            ("image.hash", &self.image_hash),
        ];
        for (field, path) in fields {
            if path.split('.').any(str::is_empty) {
                return Err(NftgenError::config(format!(
                    "metadataSchemaMapper '{field}' has an invalid key path '{path}'"
                )));
            }
        }
        Ok(())
    }
}

/// Set `value` at a dotted `path`, creating (or replacing non-object) intermediate nodes.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut segments = path.split('.').peekable();
    while let Some(seg) = segments.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(seg.to_string(), value);
            return;
        }
        node = map
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Look up a dotted `path`.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, seg| node.get(seg))
}

/// One `{trait_type, value}` entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: Value,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Per-edition output record.
#[derive(Clone, Debug, PartialEq)]
pub struct EditionMetadata {
    pub edition: EditionIndex,
    pub name: String,
    pub description: String,
    pub attributes: Vec<Attribute>,
    pub tags: String,
    /// Raster file name (`<edition>.png`); empty in inline-vector mode.
    pub image_href: String,
    /// Lowercase hex SHA-256 of the encoded image (PNG bytes or optimized SVG text).
    pub image_hash: String,
    pub base64_svg_data_uri: Option<String>,
}

impl EditionMetadata {
    /// Shape this record through `mapper`.
    pub fn to_json(&self, mapper: &SchemaMapper) -> NftgenResult<Value> {
        let attributes =
            serde_json::to_value(&self.attributes).map_err(|e| NftgenError::serde(e.to_string()))?;
        let mut out = Value::Object(Map::new());
        set_path(&mut out, &mapper.name, Value::from(self.name.clone()));
        set_path(&mut out, &mapper.description, Value::from(self.description.clone()));
        set_path(&mut out, &mapper.edition, Value::from(self.edition.0));
        set_path(&mut out, &mapper.attributes, attributes);
        set_path(&mut out, &mapper.tags, Value::from(self.tags.clone()));
        set_path(&mut out, &mapper.image_href, Value::from(self.image_href.clone()));
        set_path(&mut out, &mapper.image_hash, Value::from(self.image_hash.clone()));
        if let Some(uri) = &self.base64_svg_data_uri {
            set_path(&mut out, &mapper.base64_svg_data_uri, Value::from(uri.clone()));
        }
        Ok(out)
    }
}

/// Collection-level fields stamped onto every edition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataOptions {
    pub edition_name_format: String,
    pub description: String,
    pub tags: String,
}

/// Composited output handed to the assembler.
#[derive(Clone, Debug)]
pub enum RenderedImage {
    /// Encoded PNG bytes (raster mode).
    Png(Vec<u8>),
    /// Surface pixels, converted to an inline SVG (inline-vector mode).
    Pixels(FrameRGBA),
}

/// Assembled record plus the raster to persist, if any.
#[derive(Clone, Debug)]
pub struct PreparedEdition {
    pub metadata: EditionMetadata,
    pub png: Option<Vec<u8>>,
}

/// Build the metadata record for one accepted edition.
///
/// The content hash covers encoded output, so it is only as reproducible as the encoder.
pub fn prepare_edition(
    edition: EditionIndex,
    attributes: Vec<Attribute>,
    image: RenderedImage,
    opts: &MetadataOptions,
) -> PreparedEdition {
    let (image_href, image_hash, base64_svg_data_uri, png) = match image {
        RenderedImage::Png(png) => (
            format!("{edition}.png"),
            sha256_hex(&png),
            None,
            Some(png),
        ),
        RenderedImage::Pixels(frame) => {
            let optimized = vector::optimize_svg(&vector::img_to_svg(&frame));
            let uri = vector::to_base64_data_uri(&optimized);
            (String::new(), sha256_hex(optimized.as_bytes()), Some(uri), None)
        }
    };

    PreparedEdition {
        metadata: EditionMetadata {
            edition,
            name: format!("{}{edition}", opts.edition_name_format),
            description: opts.description.clone(),
            attributes,
            tags: opts.tags.clone(),
            image_href,
            image_hash,
            base64_svg_data_uri,
        },
        png,
    }
}

/// Optional extra traits appended to every edition, one entry drawn at random per edition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdditionalTraits {
    entries: Vec<Map<String, Value>>,
}

impl AdditionalTraits {
    pub fn new(entries: Vec<Map<String, Value>>) -> Self {
        Self { entries }
    }

    /// Read a JSON array of objects.
    pub fn load(path: &Path) -> NftgenResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| NftgenError::io(path, e))?;
        let entries: Vec<Map<String, Value>> = serde_json::from_str(&text).map_err(|e| {
            NftgenError::config(format!(
                "additional traits '{}' must be a JSON array of objects: {e}",
                path.display()
            ))
        })?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Attribute> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let entry = &self.entries[rng.gen_range(0..self.entries.len())];
        entry
            .iter()
            .map(|(k, v)| Attribute::new(k.clone(), v.clone()))
            .collect()
    }
}

/// Final output: editions sorted by index plus the provenance hash.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionManifest {
    pub editions: Vec<EditionMetadata>,
    pub provenance_hash: String,
}

impl CollectionManifest {
    /// Sort by edition index ascending and hash the ordered content hashes.
    pub fn assemble(mut editions: Vec<EditionMetadata>) -> Self {
        editions.sort_by_key(|e| e.edition);
        let provenance_hash = provenance_hash(editions.iter().map(|e| e.image_hash.as_str()));
        Self {
            editions,
            provenance_hash,
        }
    }

    pub fn to_json(&self, mapper: &SchemaMapper) -> NftgenResult<Value> {
        let editions = self
            .editions
            .iter()
            .map(|e| e.to_json(mapper))
            .collect::<NftgenResult<Vec<_>>>()?;
        let mut out = Map::new();
        out.insert("editions".to_string(), Value::Array(editions));
        out.insert(
            "provenanceHash".to_string(),
            Value::from(self.provenance_hash.clone()),
        );
        Ok(Value::Object(out))
    }
}

/// SHA-256 over the concatenation of `hashes`, in the given order.
pub fn provenance_hash<'a>(hashes: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = sha2::Sha256::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hex(&hasher.finalize())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex(&sha2::Sha256::digest(bytes))
}

fn hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/metadata.rs"]
mod tests;
