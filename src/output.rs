//! Build directory layout and artifact persistence.

use std::path::Path;

use serde_json::Value;

use crate::{
    config::OutputPaths,
    foundation::error::{NftgenError, NftgenResult},
    metadata::{CollectionManifest, PreparedEdition, SchemaMapper, get_path, set_path},
};

/// Consumer of generation artifacts.
///
/// Ordering contract: `push_edition` is called once per accepted edition in generation order
/// (not index order); `write_manifest` is called exactly once, after the last edition.
pub trait ArtifactSink {
    fn push_edition(&mut self, edition: &PreparedEdition) -> NftgenResult<()>;
    fn write_manifest(&mut self, manifest: &CollectionManifest) -> NftgenResult<()>;
}

/// Remove any previous build output and recreate the directory layout.
pub fn build_setup(paths: &OutputPaths, inline_vector: bool) -> NftgenResult<()> {
    if paths.build_dir.exists() {
        std::fs::remove_dir_all(&paths.build_dir)
            .map_err(|e| NftgenError::io(&paths.build_dir, e))?;
    }
    create_dir(&paths.build_dir)?;
    if !inline_vector {
        create_dir(&paths.json_dir)?;
        create_dir(&paths.images_dir)?;
    }
    Ok(())
}

fn create_dir(path: &Path) -> NftgenResult<()> {
    std::fs::create_dir_all(path).map_err(|e| NftgenError::io(path, e))
}

fn write_json(path: &Path, value: &Value) -> NftgenResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| NftgenError::serde(e.to_string()))?;
    std::fs::write(path, text).map_err(|e| NftgenError::io(path, e))
}

/// Writes `json/<edition><ext>`, `images/<edition>.png` and the manifest to disk.
#[derive(Clone, Debug)]
pub struct FsSink {
    paths: OutputPaths,
    mapper: SchemaMapper,
    metadata_ext: String,
    inline_vector: bool,
}

impl FsSink {
    pub fn new(
        paths: OutputPaths,
        mapper: SchemaMapper,
        metadata_ext: impl Into<String>,
        inline_vector: bool,
    ) -> Self {
        Self {
            paths,
            mapper,
            metadata_ext: metadata_ext.into(),
            inline_vector,
        }
    }
}

impl ArtifactSink for FsSink {
    fn push_edition(&mut self, edition: &PreparedEdition) -> NftgenResult<()> {
        if self.inline_vector {
            return Ok(());
        }
        let idx = edition.metadata.edition;
        let json_path = self
            .paths
            .json_dir
            .join(format!("{idx}{}", self.metadata_ext));
        write_json(&json_path, &edition.metadata.to_json(&self.mapper)?)?;

        if let Some(png) = &edition.png {
            let png_path = self.paths.images_dir.join(format!("{idx}.png"));
            std::fs::write(&png_path, png).map_err(|e| NftgenError::io(&png_path, e))?;
        }
        Ok(())
    }

    fn write_manifest(&mut self, manifest: &CollectionManifest) -> NftgenResult<()> {
        write_json(&self.paths.manifest_path, &manifest.to_json(&self.mapper)?)
    }
}

/// Keeps everything in memory; useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub editions: Vec<PreparedEdition>,
    pub manifest: Option<CollectionManifest>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactSink for InMemorySink {
    fn push_edition(&mut self, edition: &PreparedEdition) -> NftgenResult<()> {
        self.editions.push(edition.clone());
        Ok(())
    }

    fn write_manifest(&mut self, manifest: &CollectionManifest) -> NftgenResult<()> {
        self.manifest = Some(manifest.clone());
        Ok(())
    }
}

/// Read a written manifest as raw JSON.
pub fn read_manifest(path: &Path) -> NftgenResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| NftgenError::io(path, e))?;
    serde_json::from_str(&text)
        .map_err(|e| NftgenError::serde(format!("{}: {e}", path.display())))
}

pub fn manifest_editions(manifest: &Value) -> NftgenResult<&Vec<Value>> {
    manifest
        .get("editions")
        .and_then(Value::as_array)
        .ok_or_else(|| NftgenError::serde("manifest has no 'editions' array"))
}

/// Number of editions recorded in the manifest at `path`.
pub fn check_generated(path: &Path) -> NftgenResult<usize> {
    let manifest = read_manifest(path)?;
    Ok(manifest_editions(&manifest)?.len())
}

/// Rewrite every edition's image href to `<base_uri>/<edition>.png` (or `<edition>.png` when
/// `base_uri` is empty). Returns the number of rewritten editions.
pub fn update_img_paths(path: &Path, mapper: &SchemaMapper, base_uri: &str) -> NftgenResult<usize> {
    let mut manifest = read_manifest(path)?;
    let editions = manifest
        .get_mut("editions")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| NftgenError::serde("manifest has no 'editions' array"))?;

    let base = base_uri.trim_end_matches('/');
    for item in editions.iter_mut() {
        let edition = get_path(item, &mapper.edition)
            .and_then(Value::as_u64)
            .ok_or_else(|| NftgenError::serde("edition entry has no numeric edition field"))?;
        let href = if base.is_empty() {
            format!("{edition}.png")
        } else {
            format!("{base}/{edition}.png")
        };
        set_path(item, &mapper.image_href, Value::from(href));
    }
    let count = editions.len();
    write_json(path, &manifest)?;
    Ok(count)
}

#[cfg(test)]
#[path = "../tests/unit/output.rs"]
mod tests;
