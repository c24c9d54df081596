//! Generation orchestrator.
//!
//! A run walks the configured tiers in order. Each tier samples DNA until its quota
//! (`growEditionSizeTo` minus the previous tier's target) is met or the duplicate budget runs
//! out. Accepted editions take the next index from a single pool shared by every tier, so
//! generation order and edition order are independent.
//!
//! State flow: `Idle -> ValidatingConfig -> (Sampling -> Compositing -> Recording)* ->
//! Finalizing -> Done`, with `Failed` reachable from validation or a fatal error.
//! `ValidatingConfig` re-checks the config and the backend surface before any sampling;
//! catalog errors surface earlier, from [`Generator::prepare`].

use std::collections::VecDeque;
use std::path::Path;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    catalog::{CatalogOptions, Layer, layers_setup},
    compositor::{Compositor, construct_layer_to_dna},
    config::{AssetErrorPolicy, Config, OutputPaths},
    dna::{DnaSet, create_dna},
    foundation::core::EditionIndex,
    foundation::error::{NftgenError, NftgenResult},
    metadata::{AdditionalTraits, CollectionManifest, EditionMetadata, MetadataOptions, prepare_edition},
    output::{ArtifactSink, FsSink, build_setup},
    render::backend::{BackendKind, RenderBackend, create_backend},
};

/// Orchestrator lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ValidatingConfig,
    Sampling,
    Compositing,
    Recording,
    Finalizing,
    Done,
    Failed,
}

/// FIFO pool of edition indices `1..=max`, optionally shuffled once.
#[derive(Clone, Debug)]
pub struct EditionPool {
    queue: VecDeque<EditionIndex>,
}

impl EditionPool {
    pub fn new<R: rand::Rng + ?Sized>(max: u64, shuffle: bool, rng: &mut R) -> Self {
        let mut indices: Vec<EditionIndex> = (1..=max).map(EditionIndex).collect();
        if shuffle {
            indices.shuffle(rng);
        }
        Self {
            queue: indices.into(),
        }
    }

    pub fn claim(&mut self) -> Option<EditionIndex> {
        self.queue.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn peek_all(&self) -> impl Iterator<Item = EditionIndex> + '_ {
        self.queue.iter().copied()
    }
}

/// Outcome of one tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierReport {
    pub tier: usize,
    pub grow_edition_size_to: u64,
    /// Editions this tier was asked to add.
    pub requested: u64,
    pub produced: u64,
    /// Editions accepted by the run so far, this tier included.
    pub total_produced: u64,
    /// The duplicate budget ran out before `requested` was met.
    pub exhausted: bool,
}

impl TierReport {
    pub fn shortfall(&self) -> u64 {
        self.requested.saturating_sub(self.produced)
    }
}

/// A DNA that was accepted as unique but could not be rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditionFailure {
    pub tier: usize,
    pub dna: String,
    pub reason: String,
}

/// Everything a run produced. Callers should read the actual counts here rather than trust the
/// configured targets.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub manifest: CollectionManifest,
    pub tiers: Vec<TierReport>,
    pub failures: Vec<EditionFailure>,
    /// Duplicate and failed draws counted against the budget at the end of the run.
    pub failed_attempts: u64,
}

impl GenerationReport {
    pub fn produced(&self) -> usize {
        self.manifest.editions.len()
    }

    pub fn shortfall(&self) -> u64 {
        self.tiers.iter().map(TierReport::shortfall).sum()
    }
}

/// Mutable run state threaded through every step.
pub struct GenerationContext {
    pub rng: StdRng,
    pub dna_set: DnaSet,
    pub pool: EditionPool,
    pub editions: Vec<EditionMetadata>,
    pub failures: Vec<EditionFailure>,
    pub failed_attempts: u64,
    pub state: RunState,
}

impl GenerationContext {
    pub fn new(seed: Option<u64>, max_edition: u64, shuffle: bool) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pool = EditionPool::new(max_edition, shuffle, &mut rng);
        Self {
            rng,
            dna_set: DnaSet::new(),
            pool,
            editions: Vec::new(),
            failures: Vec::new(),
            failed_attempts: 0,
            state: RunState::Idle,
        }
    }

    fn transition(&mut self, next: RunState) {
        tracing::trace!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    /// Count one failed attempt; `true` once the budget is used up.
    fn register_failure(&mut self, budget: u64) -> bool {
        self.failed_attempts += 1;
        self.failed_attempts >= budget
    }
}

/// Validated configuration with every tier's layers resolved.
#[derive(Clone, Debug)]
pub struct Generator {
    config: Config,
    paths: OutputPaths,
    tiers: Vec<Vec<Layer>>,
    additional_traits: AdditionalTraits,
}

impl Generator {
    /// Validate the config and read every layer catalog. Nothing is written.
    pub fn prepare(config: Config, base_dir: &Path) -> NftgenResult<Self> {
        config.validate()?;
        let paths = config.paths(base_dir);
        let opts = CatalogOptions {
            rarity_delimiter: config.rarity_delimiter.clone(),
            default_weight: config.default_weight,
        };

        let tiers = config
            .layer_configurations
            .iter()
            .map(|tier| layers_setup(&paths.layers_dir, &tier.layers_order, &opts))
            .collect::<NftgenResult<Vec<_>>>()?;

        let additional_traits = if config.additional_traits_file_name.is_empty() {
            AdditionalTraits::default()
        } else {
            AdditionalTraits::load(&paths.layers_dir.join(&config.additional_traits_file_name))?
        };

        Ok(Self {
            config,
            paths,
            tiers,
            additional_traits,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    pub fn tiers(&self) -> &[Vec<Layer>] {
        &self.tiers
    }

    /// Fresh run state seeded from the config.
    pub fn context(&self) -> GenerationContext {
        GenerationContext::new(
            self.config.seed,
            self.config.max_edition(),
            self.config.shuffle_layer_configurations,
        )
    }

    /// Run every tier, then assemble and hand over the manifest.
    pub fn run(
        &self,
        backend: &mut dyn RenderBackend,
        sink: &mut dyn ArtifactSink,
    ) -> NftgenResult<GenerationReport> {
        let mut ctx = self.context();
        self.run_in(&mut ctx, backend, sink)
    }

    /// Like [`Generator::run`], threading caller-owned state. `ctx.state` ends as `Done` or
    /// `Failed`.
    pub fn run_in(
        &self,
        ctx: &mut GenerationContext,
        backend: &mut dyn RenderBackend,
        sink: &mut dyn ArtifactSink,
    ) -> NftgenResult<GenerationReport> {
        let result = self.drive(ctx, backend, sink);
        if result.is_err() {
            ctx.transition(RunState::Failed);
        }
        result
    }

    fn drive(
        &self,
        ctx: &mut GenerationContext,
        backend: &mut dyn RenderBackend,
        sink: &mut dyn ArtifactSink,
    ) -> NftgenResult<GenerationReport> {
        ctx.transition(RunState::ValidatingConfig);
        self.config.validate()?;
        if backend.canvas() != self.config.format {
            return Err(NftgenError::render(format!(
                "backend surface {}x{} does not match format {}x{}",
                backend.canvas().width,
                backend.canvas().height,
                self.config.format.width,
                self.config.format.height
            )));
        }
        let compositor =
            Compositor::new(self.config.load_threads, self.config.svg_base64_data_only)?;

        tracing::info!("Processing, please wait!");
        let mut reports = Vec::with_capacity(self.tiers.len());
        let mut previous_target = 0u64;
        for (i, layers) in self.tiers.iter().enumerate() {
            let target = self.config.layer_configurations[i].grow_edition_size_to;
            if self.config.reset_failures_per_tier {
                ctx.failed_attempts = 0;
            }
            let report = self.run_tier(
                ctx,
                &compositor,
                backend,
                sink,
                i,
                layers,
                target - previous_target,
                target,
            )?;
            reports.push(report);
            previous_target = target;
        }

        ctx.transition(RunState::Finalizing);
        let manifest = CollectionManifest::assemble(std::mem::take(&mut ctx.editions));
        sink.write_manifest(&manifest)?;
        ctx.transition(RunState::Done);

        tracing::info!(
            produced = manifest.editions.len(),
            provenance_hash = %manifest.provenance_hash,
            "Generated {} unique items!",
            manifest.editions.len()
        );

        Ok(GenerationReport {
            manifest,
            tiers: reports,
            failures: std::mem::take(&mut ctx.failures),
            failed_attempts: ctx.failed_attempts,
        })
    }

    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip(self, ctx, compositor, backend, sink, layers))]
    fn run_tier(
        &self,
        ctx: &mut GenerationContext,
        compositor: &Compositor,
        backend: &mut dyn RenderBackend,
        sink: &mut dyn ArtifactSink,
        tier: usize,
        layers: &[Layer],
        quota: u64,
        grow_edition_size_to: u64,
    ) -> NftgenResult<TierReport> {
        let budget = self.config.unique_dna_torrance;
        let meta_opts = MetadataOptions {
            edition_name_format: self.config.edition_name_format.clone(),
            description: self.config.description.clone(),
            tags: self.config.tags.clone(),
        };

        let mut produced = 0u64;
        let mut exhausted = false;
        while produced < quota {
            ctx.transition(RunState::Sampling);
            let dna = create_dna(layers, &mut ctx.rng)?;
            if !ctx.dna_set.is_unique(&dna) {
                if ctx.register_failure(budget) {
                    exhausted = true;
                    break;
                }
                continue;
            }

            ctx.transition(RunState::Compositing);
            let selection = construct_layer_to_dna(&dna, layers)?;
            let composed = match compositor.compose(backend, &selection) {
                Ok(composed) => composed,
                Err(e @ NftgenError::AssetLoad { .. })
                    if self.config.asset_error_policy == AssetErrorPolicy::Skip =>
                {
                    tracing::warn!(tier, dna = %dna, error = %e, "edition skipped: element failed to load");
                    ctx.failures.push(EditionFailure {
                        tier,
                        dna: dna.key(),
                        reason: e.to_string(),
                    });
                    ctx.dna_set.record(&dna);
                    if ctx.register_failure(budget) {
                        exhausted = true;
                        break;
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            ctx.transition(RunState::Recording);
            let edition = ctx
                .pool
                .claim()
                .ok_or_else(|| NftgenError::config("edition index pool is empty"))?;
            let mut attributes = composed.attributes;
            attributes.extend(self.additional_traits.pick(&mut ctx.rng));
            let prepared = prepare_edition(edition, attributes, composed.image, &meta_opts);
            sink.push_edition(&prepared)?;
            ctx.dna_set.record(&dna);
            ctx.editions.push(prepared.metadata);
            produced += 1;

            tracing::info!(
                edition = edition.0,
                "#{} of {} processed",
                ctx.editions.len(),
                grow_edition_size_to
            );
        }

        let report = TierReport {
            tier,
            grow_edition_size_to,
            requested: quota,
            produced,
            total_produced: ctx.editions.len() as u64,
            exhausted,
        };
        if exhausted {
            tracing::warn!(
                tier,
                requested = report.requested,
                produced = report.produced,
                shortfall = report.shortfall(),
                "You need more layers or elements to grow your edition to {grow_edition_size_to} artworks!"
            );
            tracing::warn!(
                "Even if the last index of the assets is equal to the whole expected collection amount, indexes are missing."
            );
        }
        Ok(report)
    }
}

/// Full pipeline used by the CLI: validate, set up the build dir, render to disk.
pub fn generate(config: Config, base_dir: &Path) -> NftgenResult<GenerationReport> {
    let generator = Generator::prepare(config, base_dir)?;
    let cfg = generator.config();
    build_setup(generator.paths(), cfg.svg_base64_data_only)?;

    let mut backend = create_backend(BackendKind::Cpu, cfg.format)?;
    let mut sink = FsSink::new(
        generator.paths().clone(),
        cfg.metadata_schema_mapper.clone(),
        cfg.output_metadata_file_extension.clone(),
        cfg.svg_base64_data_only,
    );
    generator.run(backend.as_mut(), &mut sink)
}

#[cfg(test)]
#[path = "../tests/unit/generate.rs"]
mod tests;
