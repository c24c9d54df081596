//! Per-edition compositing: concurrent element loading, ordered drawing, trait collection.

use rayon::prelude::*;

use crate::{
    assets::PreparedImage,
    catalog::{Layer, LayerElement},
    dna::Dna,
    foundation::error::{NftgenError, NftgenResult},
    metadata::{Attribute, RenderedImage},
    render::backend::RenderBackend,
};

/// A layer paired with the element its DNA strand selected.
#[derive(Clone, Copy, Debug)]
pub struct SelectedLayer<'a> {
    pub name: &'a str,
    pub opacity: f32,
    pub element: &'a LayerElement,
}

/// Map each DNA strand back to its layer element.
pub fn construct_layer_to_dna<'a>(
    dna: &Dna,
    layers: &'a [Layer],
) -> NftgenResult<Vec<SelectedLayer<'a>>> {
    if dna.len() != layers.len() {
        return Err(NftgenError::config(format!(
            "dna has {} strands but the tier has {} layers",
            dna.len(),
            layers.len()
        )));
    }
    layers
        .iter()
        .zip(dna.strands())
        .map(|(layer, strand)| {
            let element = layer.element(strand.element_id).ok_or_else(|| {
                NftgenError::config(format!(
                    "element {} does not exist in layer '{}'",
                    strand.element_id, layer.name
                ))
            })?;
            Ok(SelectedLayer {
                name: &layer.name,
                opacity: layer.opacity,
                element,
            })
        })
        .collect()
}

/// Output of one composite.
#[derive(Clone, Debug)]
pub struct ComposedEdition {
    /// `{trait_type: layer name, value: element name}` in layer order.
    pub attributes: Vec<Attribute>,
    pub image: RenderedImage,
}

/// Renders editions onto a shared surface. Element loads fan out on a dedicated rayon pool and
/// join before any drawing starts.
pub struct Compositor {
    pool: rayon::ThreadPool,
    inline_vector: bool,
}

impl Compositor {
    pub fn new(load_threads: Option<usize>, inline_vector: bool) -> NftgenResult<Self> {
        Ok(Self {
            pool: build_thread_pool(load_threads)?,
            inline_vector,
        })
    }

    /// Load every selected element concurrently, failing on the first load error.
    pub fn load_all(
        &self,
        backend: &dyn RenderBackend,
        selection: &[SelectedLayer<'_>],
    ) -> NftgenResult<Vec<PreparedImage>> {
        self.pool.install(|| {
            selection
                .par_iter()
                .map(|s| backend.load_image(&s.element.path))
                .collect::<NftgenResult<Vec<_>>>()
        })
    }

    #[tracing::instrument(skip_all, fields(layers = selection.len()))]
    pub fn compose(
        &self,
        backend: &mut dyn RenderBackend,
        selection: &[SelectedLayer<'_>],
    ) -> NftgenResult<ComposedEdition> {
        let images = self.load_all(&*backend, selection)?;

        backend.clear();
        let mut attributes = Vec::with_capacity(selection.len());
        for (layer, image) in selection.iter().zip(&images) {
            backend.draw_image(image, layer.opacity)?;
            attributes.push(Attribute::new(layer.name, layer.element.name.clone()));
        }

        let image = if self.inline_vector {
            RenderedImage::Pixels(backend.read_pixels())
        } else {
            RenderedImage::Png(backend.encode_png()?)
        };
        Ok(ComposedEdition { attributes, image })
    }
}

fn build_thread_pool(threads: Option<usize>) -> NftgenResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(NftgenError::config(
            "'loadThreads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| NftgenError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/compositor.rs"]
mod tests;
