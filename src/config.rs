//! User configuration: defaults, discovery, loading and pre-run validation.
//!
//! The file format is JSON with camelCase keys. Every key is optional except
//! `layerConfigurations`; missing keys fall back to the defaults documented on
//! [`Config`].

use std::path::{Path, PathBuf};

use crate::{
    foundation::core::Canvas,
    foundation::error::{NftgenError, NftgenResult},
    metadata::SchemaMapper,
};

/// File names probed in the base directory when no explicit config path is given.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["nftartmaker.json", ".nftartmakerrc.json", ".nftartmakerrc"];

/// Upper bound on the largest `growEditionSizeTo`; the edition-index pool is allocated up front.
pub const MAX_EDITION_SIZE: u64 = 10_000_000;

/// One layer reference inside a tier's `layersOrder`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerRef {
    /// Directory name under the layers directory; also the trait type.
    pub name: String,
    /// Global alpha used when drawing this layer (0.0..=1.0). Defaults to 1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

impl LayerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            opacity: None,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn effective_opacity(&self) -> f32 {
        self.opacity.unwrap_or(1.0)
    }
}

/// A tier: layer draw order plus the cumulative edition target.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfiguration {
    pub grow_edition_size_to: u64,
    pub layers_order: Vec<LayerRef>,
}

/// What to do when a selected element image cannot be loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetErrorPolicy {
    /// Record the failure in the run report and keep generating.
    #[default]
    Skip,
    /// Fail the whole run.
    Abort,
}

/// Preview sheet parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewConfig {
    pub thumb_per_row: u32,
    pub thumb_width: u32,
    pub image_name: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            thumb_per_row: 20,
            thumb_width: 60,
            image_name: "preview.png".to_string(),
        }
    }
}

/// Full generator configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub format: Canvas,
    pub layer_configurations: Vec<LayerConfiguration>,
    pub rarity_delimiter: String,
    /// Weight given to elements whose filename carries no numeric rarity suffix.
    pub default_weight: u32,
    /// Duplicate-DNA budget before a tier gives up.
    pub unique_dna_torrance: u64,
    /// Reset the duplicate counter at the start of every tier instead of sharing it across the run.
    pub reset_failures_per_tier: bool,
    pub description: String,
    pub tags: String,
    pub edition_name_format: String,
    pub shuffle_layer_configurations: bool,
    pub svg_base64_data_only: bool,
    pub metadata_schema_mapper: SchemaMapper,
    pub layers_dir_name: String,
    pub output_dir_name: String,
    pub output_json_dir_name: String,
    pub output_images_dir_name: String,
    pub output_json_file_name: String,
    pub output_metadata_file_extension: String,
    pub additional_traits_file_name: String,
    /// Fixed RNG seed. `None` seeds from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub asset_error_policy: AssetErrorPolicy,
    /// Worker threads for per-edition element loading. `None` uses the rayon default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_threads: Option<usize>,
    pub preview: PreviewConfig,
    pub base_img_uri: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: Canvas::default(),
            layer_configurations: Vec::new(),
            rarity_delimiter: "#".to_string(),
            default_weight: 1,
            unique_dna_torrance: 10_000,
            reset_failures_per_tier: false,
            description: "Your collection name here".to_string(),
            tags: String::new(),
            edition_name_format: "#".to_string(),
            shuffle_layer_configurations: true,
            svg_base64_data_only: false,
            metadata_schema_mapper: SchemaMapper::default(),
            layers_dir_name: "layers".to_string(),
            output_dir_name: "output".to_string(),
            output_json_dir_name: "json".to_string(),
            output_images_dir_name: "images".to_string(),
            output_json_file_name: "metadata.json".to_string(),
            output_metadata_file_extension: ".json".to_string(),
            additional_traits_file_name: String::new(),
            seed: None,
            asset_error_policy: AssetErrorPolicy::Skip,
            load_threads: None,
            preview: PreviewConfig::default(),
            base_img_uri: String::new(),
        }
    }
}

/// Absolute locations derived from a [`Config`] and a base directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub layers_dir: PathBuf,
    pub build_dir: PathBuf,
    pub json_dir: PathBuf,
    pub images_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub preview_path: PathBuf,
}

impl Config {
    /// Parse a config from JSON text. Does not validate.
    pub fn from_json_str(text: &str) -> NftgenResult<Self> {
        serde_json::from_str(text).map_err(|e| NftgenError::serde(format!("parse config: {e}")))
    }

    /// Read and parse a config file. Does not validate.
    pub fn load(path: &Path) -> NftgenResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| NftgenError::io(path, e))?;
        Self::from_json_str(&text).map_err(|e| match e {
            NftgenError::Serde(msg) => NftgenError::serde(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// First config file found in `dir`, probing [`CONFIG_FILE_NAMES`] in order.
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }

    /// Tier targets in configuration order.
    pub fn grow_targets(&self) -> Vec<u64> {
        self.layer_configurations
            .iter()
            .map(|t| t.grow_edition_size_to)
            .collect()
    }

    /// Largest cumulative target, i.e. the size of the edition-index pool.
    pub fn max_edition(&self) -> u64 {
        self.layer_configurations
            .iter()
            .map(|t| t.grow_edition_size_to)
            .max()
            .unwrap_or(0)
    }

    pub fn paths(&self, base_dir: &Path) -> OutputPaths {
        let build_dir = base_dir.join(&self.output_dir_name);
        OutputPaths {
            layers_dir: base_dir.join(&self.layers_dir_name),
            json_dir: build_dir.join(&self.output_json_dir_name),
            images_dir: build_dir.join(&self.output_images_dir_name),
            manifest_path: build_dir.join(&self.output_json_file_name),
            preview_path: build_dir.join(&self.preview.image_name),
            build_dir,
        }
    }

    /// Reject every configuration error that can be detected without touching the filesystem.
    pub fn validate(&self) -> NftgenResult<()> {
        if self.layer_configurations.is_empty() {
            return Err(NftgenError::config(
                "no 'layerConfigurations' configured; add at least one tier",
            ));
        }
        if !grow_sizes_ascending(&self.grow_targets()) {
            return Err(NftgenError::config(
                "'layerConfigurations' is not valid: 'growEditionSizeTo' values must be strictly ascending and > 0",
            ));
        }
        if self.max_edition() > MAX_EDITION_SIZE {
            return Err(NftgenError::config(format!(
                "'growEditionSizeTo' of {} exceeds the supported maximum of {MAX_EDITION_SIZE}",
                self.max_edition()
            )));
        }
        for (i, tier) in self.layer_configurations.iter().enumerate() {
            if tier.layers_order.is_empty() {
                return Err(NftgenError::config(format!(
                    "tier {i} has an empty 'layersOrder'"
                )));
            }
            for layer in &tier.layers_order {
                if layer.name.trim().is_empty() {
                    return Err(NftgenError::config(format!(
                        "tier {i} has a layer with an empty name"
                    )));
                }
                let op = layer.effective_opacity();
                if !op.is_finite() || !(0.0..=1.0).contains(&op) {
                    return Err(NftgenError::config(format!(
                        "layer '{}' opacity must be within 0.0..=1.0, got {op}",
                        layer.name
                    )));
                }
            }
        }
        if self.format.width == 0 || self.format.height == 0 {
            return Err(NftgenError::config("format width/height must be > 0"));
        }
        if self.rarity_delimiter.is_empty() {
            return Err(NftgenError::config("'rarityDelimiter' must be non-empty"));
        }
        if self.unique_dna_torrance == 0 {
            return Err(NftgenError::config("'uniqueDnaTorrance' must be > 0"));
        }
        if self.load_threads == Some(0) {
            return Err(NftgenError::config("'loadThreads' must be >= 1 when set"));
        }
        if self.preview.thumb_per_row == 0 || self.preview.thumb_width == 0 {
            return Err(NftgenError::config(
                "preview 'thumbPerRow' and 'thumbWidth' must be > 0",
            ));
        }
        self.metadata_schema_mapper.validate()?;
        Ok(())
    }
}

/// `true` when every target is positive and strictly greater than the previous one.
pub fn grow_sizes_ascending(targets: &[u64]) -> bool {
    targets.first().is_some_and(|first| *first > 0)
        && targets.windows(2).all(|w| w[1] > w[0])
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
