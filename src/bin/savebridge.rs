// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command line front end for a directory-backed bridge
//!
//! Every invocation mounts the store, runs one command against the
//! headless core and exports whatever changed.

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use savebridge::core::session::{derive_save_path, resolve_game_path};
use savebridge::core::{
    classify, Bridge, BridgeConfig, DirStore, HeadlessCore, IngestKind, SaveStateFlags,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Emulator save bridge
#[derive(Parser)]
#[command(name = "savebridge")]
#[command(about = "Manage games, saves and save-states in a durable store", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store directory (overrides configuration)
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload files into the store
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Upload kind (guessed from the extension when omitted)
        #[arg(short, long)]
        kind: Option<KindArg>,
    },

    /// List stored files
    List {
        #[arg(long)]
        json: bool,
    },

    /// Copy a game's battery save to a host file
    GetSave {
        game: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Save or load a save-state slot
    State {
        action: StateAction,
        game: String,
        slot: u32,

        /// Component mask, decimal or 0x-prefixed hex
        #[arg(long, value_parser = parse_flags)]
        flags: Option<SaveStateFlags>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Rom,
    Save,
    Cheats,
}

impl From<KindArg> for IngestKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Rom => IngestKind::Rom,
            KindArg::Save => IngestKind::SaveOrState,
            KindArg::Cheats => IngestKind::Cheats,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StateAction {
    Save,
    Load,
}

#[derive(Serialize)]
struct Listing {
    games: Vec<String>,
    saves: Vec<String>,
    states: Vec<String>,
    cheats: Vec<String>,
    screenshots: Vec<String>,
}

fn parse_flags(s: &str) -> Result<SaveStateFlags, String> {
    let bits = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("invalid flags {:?}: {}", s, e))?;
    Ok(SaveStateFlags::from_raw(bits))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present; a missing file is not an error
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize logger with default level INFO
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BridgeConfig::load_from_file(path)?,
        None => BridgeConfig::default(),
    };
    config.apply_env()?;
    if let Some(store) = args.store {
        config.store_dir = store;
    }

    info!("savebridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Store: {}", config.store_dir.display());

    let store = Arc::new(DirStore::new(&config.store_dir));
    let mut bridge = Bridge::from_config(&config, store, HeadlessCore::new())?;
    bridge.mount().await?;

    match args.command {
        Command::Ingest { files, kind } => {
            for file in files {
                let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                    error!("Skipping {}: no usable file name", file.display());
                    continue;
                };
                let upload_kind = match kind {
                    Some(kind) => IngestKind::from(kind),
                    None => match classify(name) {
                        Ok(class) => IngestKind::for_class(class),
                        Err(e) => {
                            error!("Skipping {}: {}", file.display(), e);
                            continue;
                        }
                    },
                };

                let bytes = tokio::fs::read(&file).await?;
                if bridge.ingest(name, &bytes, upload_kind).await? {
                    info!("Ingested {} as {}", name, upload_kind);
                } else {
                    error!("Refused {} as {}", name, upload_kind);
                }
            }
        }

        Command::List { json } => {
            let listing = Listing {
                games: bridge.list_games()?,
                saves: bridge.list_saves()?,
                states: bridge.list_states()?,
                cheats: bridge.list_cheats()?,
                screenshots: bridge.list_screenshots()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for (dir, names) in [
                    ("games", &listing.games),
                    ("saves", &listing.saves),
                    ("states", &listing.states),
                    ("cheats", &listing.cheats),
                    ("screenshots", &listing.screenshots),
                ] {
                    println!("{}/", dir);
                    for name in names {
                        println!("  {}", name);
                    }
                }
            }
        }

        Command::GetSave { game, output } => {
            let game_path = resolve_game_path(bridge.layout(), &game);
            let save_path = derive_save_path(bridge.layout(), &game_path);
            let data = bridge.fs().read_file(&save_path)?;
            tokio::fs::write(&output, data).await?;
            info!("Wrote {} ({} bytes) to {}", save_path, data.len(), output.display());
        }

        Command::State {
            action,
            game,
            slot,
            flags,
        } => {
            if !bridge.open_game(&game)? {
                return Err(format!("cannot load {}", game).into());
            }
            let ok = match action {
                StateAction::Save => bridge.save_state_slot(slot, flags).await?,
                StateAction::Load => bridge.load_state_slot(slot, flags)?,
            };
            if !ok {
                return Err(format!("save-state slot {} failed", slot).into());
            }
            info!(
                "Slot {} done, frame {}, {} cheats active",
                slot,
                bridge.core().frame_count(),
                bridge.core().cheats().map_or(0, <[String]>::len)
            );
        }
    }

    bridge.export().await?;
    Ok(())
}
