use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which export passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderMode {
    /// Outline-only cell overlay.
    Cells,
    /// Filled per-holding political map.
    Holdings,
    /// Every pass.
    All,
}

#[derive(Parser, Debug)]
#[command(
    name = "realmviz",
    version,
    about = "Converts fantasy-map exports into a feudal title hierarchy and renders map images"
)]
pub struct Cli {
    /// Attribute feed (the map generator's full JSON export).
    #[arg(long)]
    pub map: PathBuf,

    /// Geometry feed (the per-cell GeoJSON export).
    #[arg(long)]
    pub geometry: PathBuf,

    /// Output directory; images land under <out>/map_data/.
    #[arg(long, default_value = "output")]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = RenderMode::All)]
    pub mode: RenderMode,

    /// Open each written image in the platform viewer.
    #[arg(long)]
    pub debug: bool,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
