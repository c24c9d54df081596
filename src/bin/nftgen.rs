use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nftgen", version, about = "Generate layered art collections with metadata")]
struct Cli {
    /// Config file. Defaults to the first of nftartmaker.json, .nftartmakerrc.json,
    /// .nftartmakerrc in the base directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory that layer and output paths are resolved against.
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate every edition, its metadata and the collection manifest.
    Generate,
    /// Count the editions recorded in the manifest.
    Check,
    /// Tile every edition into a single preview image.
    Preview,
    /// Rewrite image hrefs in the manifest to `<baseImgUri>/<edition>.png`.
    UpdateImgPaths,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolve working directory")?,
    };
    let config = load_config(cli.config.as_deref(), &base_dir)?;

    match cli.cmd {
        Command::Generate => cmd_generate(config, &base_dir),
        Command::Check => cmd_check(&config, &base_dir),
        Command::Preview => cmd_preview(&config, &base_dir),
        Command::UpdateImgPaths => cmd_update_img_paths(&config, &base_dir),
    }
}

fn load_config(explicit: Option<&Path>, base_dir: &Path) -> anyhow::Result<nftgen::Config> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => nftgen::Config::find_in(base_dir).with_context(|| {
            format!(
                "no config file found in '{}'; you have to configure layers first",
                base_dir.display()
            )
        })?,
    };
    nftgen::Config::load(&path).with_context(|| format!("load config '{}'", path.display()))
}

fn cmd_generate(config: nftgen::Config, base_dir: &Path) -> anyhow::Result<()> {
    let report = nftgen::generate(config, base_dir)?;
    for tier in report.tiers.iter().filter(|t| t.exhausted) {
        eprintln!(
            "tier {}: produced {} of {} requested (shortfall {})",
            tier.tier,
            tier.produced,
            tier.requested,
            tier.shortfall()
        );
    }
    if !report.failures.is_empty() {
        eprintln!("{} editions failed to render:", report.failures.len());
        for f in &report.failures {
            eprintln!("  tier {}: {}: {}", f.tier, f.dna, f.reason);
        }
    }
    eprintln!(
        "Check out the output directory. Generated {} unique items!",
        report.produced()
    );
    Ok(())
}

fn cmd_check(config: &nftgen::Config, base_dir: &Path) -> anyhow::Result<()> {
    let paths = config.paths(base_dir);
    let count = nftgen::check_generated(&paths.manifest_path)
        .with_context(|| "can't load main metadata file")?;
    eprintln!("Generated {count} unique items!");
    Ok(())
}

fn cmd_preview(config: &nftgen::Config, base_dir: &Path) -> anyhow::Result<()> {
    let paths = config.paths(base_dir);
    let sheet = nftgen::create_preview(config, &paths)?;
    eprintln!(
        "wrote {} ({}x{}, {} thumbnails)",
        paths.preview_path.display(),
        sheet.width,
        sheet.height,
        sheet.thumbnails
    );
    Ok(())
}

fn cmd_update_img_paths(config: &nftgen::Config, base_dir: &Path) -> anyhow::Result<()> {
    if config.svg_base64_data_only {
        anyhow::bail!("this command is applicable only for image output, not encoded inline SVGs");
    }
    let paths = config.paths(base_dir);
    let n = nftgen::output::update_img_paths(
        &paths.manifest_path,
        &config.metadata_schema_mapper,
        &config.base_img_uri,
    )?;
    eprintln!("{} updated ({n} editions)", config.output_json_file_name);
    Ok(())
}
