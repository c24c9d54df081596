//! DNA sampling and the run-scoped uniqueness set.

use std::collections::HashSet;
use std::fmt;

use rand::Rng;

use crate::{
    catalog::{Layer, LayerElement},
    foundation::error::{NftgenError, NftgenResult},
};

/// One layer's selection: the element id and its filename.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DnaStrand {
    pub element_id: usize,
    pub filename: String,
}

impl fmt::Display for DnaStrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.element_id, self.filename)
    }
}

/// Full composite selection, one strand per layer in layer order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dna {
    strands: Vec<DnaStrand>,
}

impl Dna {
    pub fn new(strands: Vec<DnaStrand>) -> Self {
        Self { strands }
    }

    pub fn strands(&self) -> &[DnaStrand] {
        &self.strands
    }

    pub fn len(&self) -> usize {
        self.strands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strands.is_empty()
    }

    /// Uniqueness key: every `id:filename` strand concatenated without a separator.
    pub fn key(&self) -> String {
        self.strands.iter().map(DnaStrand::to_string).collect()
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Cumulative-weight inverse-CDF draw over the layer's elements in catalog order.
pub fn pick_element<'a, R: Rng + ?Sized>(
    layer: &'a Layer,
    rng: &mut R,
) -> NftgenResult<&'a LayerElement> {
    let total = layer.total_weight();
    if total == 0 {
        return Err(NftgenError::config(format!(
            "layer '{}' has a total rarity weight of 0",
            layer.name
        )));
    }

    let mut r = rng.gen_range(0..total);
    for element in &layer.elements {
        let w = u64::from(element.weight);
        if r < w {
            return Ok(element);
        }
        r -= w;
    }
    // r < total guarantees a hit above.
    Err(NftgenError::config(format!(
        "weighted draw fell outside layer '{}'",
        layer.name
    )))
}

/// Draw one element per layer.
pub fn create_dna<R: Rng + ?Sized>(layers: &[Layer], rng: &mut R) -> NftgenResult<Dna> {
    let strands = layers
        .iter()
        .map(|layer| {
            pick_element(layer, rng).map(|e| DnaStrand {
                element_id: e.id,
                filename: e.filename.clone(),
            })
        })
        .collect::<NftgenResult<Vec<_>>>()?;
    Ok(Dna::new(strands))
}

/// Append-only set of accepted DNA keys for one run.
#[derive(Debug, Default)]
pub struct DnaSet {
    seen: HashSet<String>,
}

impl DnaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unique(&self, dna: &Dna) -> bool {
        !self.seen.contains(&dna.key())
    }

    /// Record an accepted DNA. Returns `false` if it was already present.
    pub fn record(&mut self, dna: &Dna) -> bool {
        self.seen.insert(dna.key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/unit/dna.rs"]
mod tests;
