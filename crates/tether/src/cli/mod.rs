//! CLI command definitions and handlers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use tabled::{Table, Tabled};
use tether_common::ContainerId;

use crate::config::TetherConfig;
use crate::container::Container;
use crate::mounts::{Mount, MountAssembler, to_oci_mounts};
use crate::volume::{BindSpec, Volume, VolumeInfo, VolumeStore};

/// tether - resolve container volume mounts
#[derive(Parser)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory for tether data
    #[arg(
        long,
        global = true,
        env = "TETHER_ROOT",
        default_value = "/var/lib/tether"
    )]
    pub root: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a container's mounts into the execution-ready list
    Assemble {
        /// Container ID (generated when omitted)
        container_id: Option<String>,

        /// Bind specification, `source:destination[:options]`
        #[arg(short = 'v', long = "volume")]
        binds: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Manage volumes
    Volume {
        /// Volume subcommand.
        #[command(subcommand)]
        command: VolumeCommands,
    },
}

/// Volume commands.
#[derive(Subcommand)]
pub enum VolumeCommands {
    /// Create a volume
    Create {
        /// Volume name
        name: String,

        /// Label in `key=value` form
        #[arg(long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
    },

    /// List volumes
    Ls {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// Remove a volume
    Rm {
        /// Volume name
        name: String,

        /// Remove even if referenced
        #[arg(short, long)]
        force: bool,
    },
}

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable table.
    Table,
    /// JSON.
    Json,
    /// OCI runtime-spec `mounts` array.
    Oci,
}

/// Output formats for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// JSON.
    Json,
}

#[derive(Tabled)]
struct MountRow {
    #[tabled(rename = "SOURCE")]
    source: String,
    #[tabled(rename = "DESTINATION")]
    destination: String,
    #[tabled(rename = "MODE")]
    mode: &'static str,
}

impl From<&Mount> for MountRow {
    fn from(mount: &Mount) -> Self {
        Self {
            source: mount.source.display().to_string(),
            destination: mount.destination.display().to_string(),
            mode: if mount.writable { "rw" } else { "ro" },
        }
    }
}

#[derive(Tabled)]
struct VolumeRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DRIVER")]
    driver: String,
    #[tabled(rename = "PATH")]
    path: String,
    #[tabled(rename = "CREATED")]
    created: String,
}

impl From<&VolumeInfo> for VolumeRow {
    fn from(info: &VolumeInfo) -> Self {
        Self {
            name: info.name.clone(),
            driver: info.driver.clone(),
            path: info
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            created: info
                .created
                .map(|c| c.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }
}

fn parse_label(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("invalid label '{raw}', expected key=value"))
}

impl Cli {
    /// Execute the CLI command.
    pub fn execute(self) -> Result<()> {
        let config = TetherConfig::default().with_root(&self.root);
        let store = VolumeStore::open(config.paths.clone())?;

        match self.command {
            Commands::Assemble {
                container_id,
                binds,
                format,
            } => {
                let id = match container_id {
                    Some(id) => ContainerId::new(id)?,
                    None => ContainerId::generate(),
                };
                tracing::debug!(container_id = %id, binds = binds.len(), "Assembling mounts");

                let mut container = Container::new(id);
                for raw in &binds {
                    let mount_point = BindSpec::parse(raw)?.into_mount_point(
                        |name| Ok(store.handle(name)? as Arc<dyn Volume>),
                        config.normalizer.as_ref(),
                    )?;
                    container.add_mount_point(mount_point)?;
                }

                let mounts = MountAssembler::new(&store).assemble(&container)?;

                match format {
                    Format::Table => {
                        let rows: Vec<MountRow> = mounts.iter().map(MountRow::from).collect();
                        println!("{}", Table::new(rows));
                    }
                    Format::Json => println!("{}", serde_json::to_string_pretty(&mounts)?),
                    Format::Oci => {
                        println!("{}", serde_json::to_string_pretty(&to_oci_mounts(&mounts))?);
                    }
                }
                Ok(())
            }

            Commands::Volume { command } => match command {
                VolumeCommands::Create { name, labels } => {
                    let labels: HashMap<_, _> = labels.into_iter().collect();
                    let info = store.create(&name, labels)?;
                    println!("{}", info.name);
                    Ok(())
                }

                VolumeCommands::Ls { format } => {
                    let volumes = store.list();
                    match format {
                        ListFormat::Json => {
                            println!("{}", serde_json::to_string_pretty(&volumes)?);
                        }
                        ListFormat::Table => {
                            let rows: Vec<VolumeRow> = volumes.iter().map(VolumeRow::from).collect();
                            println!("{}", Table::new(rows));
                        }
                    }
                    Ok(())
                }

                VolumeCommands::Rm { name, force } => {
                    store.remove(&name, force)?;
                    println!("{name}");
                    Ok(())
                }
            },
        }
    }
}
