//! Layer catalog: turns layer directories into weighted element records.
//!
//! Element ids are dense and follow the directory listing order returned by the
//! filesystem after hidden entries are dropped. The listing is not re-sorted.

use std::path::{Path, PathBuf};

use crate::{
    config::LayerRef,
    foundation::error::{NftgenError, NftgenResult},
};

/// One selectable asset of a layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerElement {
    pub id: usize,
    /// Display name: filename without extension and without rarity suffix.
    pub name: String,
    pub filename: String,
    pub path: PathBuf,
    pub weight: u32,
}

/// A layer in draw order with its resolved elements.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub id: usize,
    pub name: String,
    pub opacity: f32,
    pub elements: Vec<LayerElement>,
}

impl Layer {
    pub fn total_weight(&self) -> u64 {
        self.elements.iter().map(|e| u64::from(e.weight)).sum()
    }

    pub fn element(&self, id: usize) -> Option<&LayerElement> {
        self.elements.iter().find(|e| e.id == id)
    }
}

/// Filename parsing rules shared by every layer of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogOptions {
    pub rarity_delimiter: String,
    pub default_weight: u32,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            rarity_delimiter: "#".to_string(),
            default_weight: 1,
        }
    }
}

impl CatalogOptions {
    /// Display name: drop the 4-character extension, then everything from the last delimiter on.
    pub fn clean_name(&self, filename: &str) -> String {
        let stem = strip_extension(filename);
        match stem.rsplit_once(self.rarity_delimiter.as_str()) {
            Some((name, _)) => name.to_string(),
            None => stem.to_string(),
        }
    }

    /// Numeric suffix after the last delimiter, or `default_weight` when absent or not a number.
    pub fn rarity_weight(&self, filename: &str) -> u32 {
        let stem = strip_extension(filename);
        stem.rsplit_once(self.rarity_delimiter.as_str())
            .and_then(|(_, w)| w.trim().parse::<u32>().ok())
            .unwrap_or(self.default_weight)
    }
}

fn strip_extension(filename: &str) -> &str {
    let cut = filename
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &filename[..cut]
}

/// Hidden if any `/`-separated segment starts with `.` followed by something other than `.`.
pub fn is_hidden(rel_path: &str) -> bool {
    rel_path.split('/').any(|seg| {
        let mut chars = seg.chars();
        chars.next() == Some('.') && chars.next().is_some_and(|c| c != '.')
    })
}

/// List one layer directory into elements, in directory listing order.
pub fn get_elements(dir: &Path, opts: &CatalogOptions) -> NftgenResult<Vec<LayerElement>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            NftgenError::config(format!("layer directory '{}' not found", dir.display()))
        } else {
            NftgenError::io(dir, e)
        }
    })?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| NftgenError::io(dir, e))?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&filename) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            tracing::debug!(path = %path.display(), "skipping sub-directory in layer");
            continue;
        }
        out.push(LayerElement {
            id: out.len(),
            name: opts.clean_name(&filename),
            weight: opts.rarity_weight(&filename),
            filename,
            path,
        });
    }
    Ok(out)
}

/// Resolve a tier's `layersOrder` into layers. Each layer needs at least one element and a
/// positive total weight.
pub fn layers_setup(
    layers_dir: &Path,
    layers_order: &[LayerRef],
    opts: &CatalogOptions,
) -> NftgenResult<Vec<Layer>> {
    let mut layers = Vec::with_capacity(layers_order.len());
    for (id, layer_ref) in layers_order.iter().enumerate() {
        let elements = get_elements(&layers_dir.join(&layer_ref.name), opts)?;
        let layer = Layer {
            id,
            name: layer_ref.name.clone(),
            opacity: layer_ref.effective_opacity(),
            elements,
        };
        if layer.elements.is_empty() {
            return Err(NftgenError::config(format!(
                "layer '{}' has no elements",
                layer.name
            )));
        }
        if layer.total_weight() == 0 {
            return Err(NftgenError::config(format!(
                "layer '{}' has a total rarity weight of 0; at least one element needs a positive weight",
                layer.name
            )));
        }
        tracing::debug!(
            layer = %layer.name,
            elements = layer.elements.len(),
            total_weight = layer.total_weight(),
            "layer resolved"
        );
        layers.push(layer);
    }
    Ok(layers)
}

#[cfg(test)]
#[path = "../tests/unit/catalog.rs"]
mod tests;
