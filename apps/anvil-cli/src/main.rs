use std::path::PathBuf;

use anvil_common::ChunkPos;
use anvil_level::{AnvilProvider, LevelInfo, ProviderConfig};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "anvil-cli", about = "CLI tool for anvil world operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Provider settings (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a directory is an anvil world
    Validate { world: PathBuf },
    /// Print a summary of one chunk
    Inspect {
        world: PathBuf,
        #[arg(allow_hyphen_values = true)]
        x: i32,
        #[arg(allow_hyphen_values = true)]
        z: i32,
    },
    /// Package one chunk as a client payload
    Export {
        world: PathBuf,
        #[arg(allow_hyphen_values = true)]
        x: i32,
        #[arg(allow_hyphen_values = true)]
        z: i32,
        /// Write the payload here instead of printing its size
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Create an empty world
    Create {
        world: PathBuf,
        #[arg(short, long, default_value = "world")]
        name: String,
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        seed: i64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => ProviderConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ProviderConfig::default(),
    };
    tracing::debug!(?config, "provider config");

    match cli.command {
        Commands::Validate { world } => {
            if !anvil_format::is_valid(&world) {
                bail!("{} is not an anvil world", world.display());
            }
            println!("{}: valid {} world", world.display(), AnvilProvider::provider_name());
        }
        Commands::Inspect { world, x, z } => {
            let mut provider = AnvilProvider::open(&world, config)?;
            let info = provider.level_info()?;
            println!("world: {} (seed {})", info.name, info.seed);

            let Some(chunk) = provider.load_chunk(x, z)? else {
                bail!("chunk ({x}, {z}) is not stored or could not be decoded");
            };
            let region = chunk.pos().region();
            println!(
                "chunk ({x}, {z}) in {} populated={} light_populated={}",
                region.file_name(),
                chunk.is_populated(),
                chunk.is_light_populated()
            );
            let ys: Vec<u8> = chunk.non_empty_sections().map(|s| s.y()).collect();
            println!("sections: {ys:?}");
            let heights = chunk.height_map();
            let (lo, hi) = heights
                .iter()
                .fold((i32::MAX, i32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)));
            println!("height: {lo}..={hi}");
            println!(
                "entities: {}, tiles: {}",
                chunk.entities().len(),
                chunk.tiles().len()
            );
        }
        Commands::Export { world, x, z, out } => {
            let mut provider = AnvilProvider::open(&world, config)?;
            let mut payload = None;
            let mut sink = |_: ChunkPos, bytes: Vec<u8>| payload = Some(bytes);
            provider.request_chunk(x, z, &mut sink)?;
            provider.wait_exports(&mut sink);

            let Some(payload) = payload else {
                bail!("export of chunk ({x}, {z}) produced no payload");
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, &payload)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("wrote {} bytes to {}", payload.len(), path.display());
                }
                None => println!("chunk ({x}, {z}): {} byte payload", payload.len()),
            }
        }
        Commands::Create { world, name, seed } => {
            let info = LevelInfo::new(name, seed);
            let mut provider = AnvilProvider::create(&world, &info, config)?;
            provider.close()?;
            println!("created {} at {}", info.name, world.display());
        }
    }

    Ok(())
}
