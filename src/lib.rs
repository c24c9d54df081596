//! nftgen builds generative art collections from layered image fragments.
//!
//! Each layer directory holds weighted element files (`Name#weight.png`). A run samples one
//! element per layer (the edition's DNA), rejects duplicates under a bounded retry budget,
//! composites the selection, and records metadata plus a content hash per edition. The final
//! manifest lists editions in index order together with a provenance hash over every content
//! hash.
//!
//! - Load and validate a [`Config`]
//! - Prepare a [`Generator`] (reads every layer catalog, writes nothing)
//! - Run it against a [`RenderBackend`] and an [`ArtifactSink`]
#![forbid(unsafe_code)]

pub mod assets;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod dna;
mod foundation;
pub mod generate;
pub mod metadata;
pub mod output;
pub mod preview;
pub mod render;
pub mod vector;

pub use crate::catalog::{CatalogOptions, Layer, LayerElement, get_elements, layers_setup};
pub use crate::compositor::{ComposedEdition, Compositor, SelectedLayer, construct_layer_to_dna};
pub use crate::config::{
    AssetErrorPolicy, Config, LayerConfiguration, LayerRef, OutputPaths, PreviewConfig,
};
pub use crate::dna::{Dna, DnaSet, DnaStrand, create_dna, pick_element};
pub use crate::foundation::core::{Canvas, EditionIndex};
pub use crate::foundation::error::{NftgenError, NftgenResult};
pub use crate::generate::{
    EditionFailure, EditionPool, GenerationContext, GenerationReport, Generator, RunState,
    TierReport, generate,
};
pub use crate::metadata::{
    Attribute, CollectionManifest, EditionMetadata, SchemaMapper, provenance_hash, sha256_hex,
};
pub use crate::output::{ArtifactSink, FsSink, InMemorySink, build_setup, check_generated};
pub use crate::preview::create_preview;
pub use crate::render::backend::{BackendKind, FrameRGBA, RenderBackend, create_backend};
pub use crate::render::cpu::CpuBackend;
