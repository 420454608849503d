use std::fs;
use std::path::{Path, PathBuf};

use catalog::{EraRecord, InMemoryMapCatalog};
use clap::{Parser, Subcommand};
use narrative::{Narrative, SessionConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline inspection of narratives and map overlays")]
struct Args {
    /// Session config JSON (view, activation, camera); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print transformed chapter HTML and the footnote store
    Footnotes { narrative: PathBuf },

    /// Step through a narrative on a recording surface and print surface calls
    Replay { maps: PathBuf, narrative: PathBuf },

    /// Print the info modal content of one map
    Info { maps: PathBuf, id: String },

    /// Print the browse catalog: eras with their resolved maps and groups
    Eras {
        maps: PathBuf,
        eras: PathBuf,
        /// Map group records (JSON array)
        #[arg(long)]
        groups: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => SessionConfig::from_json_str(&read(path)?).map_err(|e| e.to_string())?,
        None => SessionConfig::default(),
    };

    let lines = match args.command {
        Command::Footnotes { narrative } => tools::footnotes_report(&load_narrative(&narrative)?),
        Command::Replay { maps, narrative } => {
            let catalog = load_catalog(&maps)?;
            let narrative = load_narrative(&narrative)?;
            info!(narrative = %narrative.id, maps = catalog.len(), "replaying narrative");
            tools::replay_report(&catalog, narrative, config).map_err(|e| e.to_string())?
        }
        Command::Info { maps, id } => {
            let catalog = load_catalog(&maps)?;
            let record = catalog
                .get(&id)
                .ok_or_else(|| format!("no map {id} in {}", maps.display()))?;
            tools::map_info_report(record)
        }
        Command::Eras { maps, eras, groups } => {
            let mut catalog = load_catalog(&maps)?;
            if let Some(path) = groups {
                catalog
                    .insert_groups_json(&read(&path)?)
                    .map_err(|e| format!("{}: {e}", path.display()))?;
            }
            let eras = EraRecord::list_from_json_str(&read(&eras)?)
                .map_err(|e| format!("{}: {e}", eras.display()))?;
            info!(eras = eras.len(), maps = catalog.len(), "resolving browse catalog");
            tools::eras_report(&catalog, eras)
        }
    };

    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))
}

fn load_catalog(path: &Path) -> Result<InMemoryMapCatalog, String> {
    InMemoryMapCatalog::from_json_str(&read(path)?).map_err(|e| format!("{}: {e}", path.display()))
}

fn load_narrative(path: &Path) -> Result<Narrative, String> {
    Narrative::from_json_str(&read(path)?).map_err(|e| format!("{}: {e}", path.display()))
}
