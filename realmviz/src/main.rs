use clap::Parser;
use std::path::Path;
use std::str::FromStr;

mod args;
mod ops;
mod raster;

use args::{Cli, RenderMode};
use realmdata::RealmMap;
use realmdata::titles::Title;

/// Open an image in the platform viewer. Debug convenience only; spawned
/// and forgotten, never allowed to affect the run's outcome.
fn open_in_viewer(path: &Path) {
    #[cfg(target_os = "macos")]
    let viewer = "open";
    #[cfg(target_os = "windows")]
    let viewer = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let viewer = "xdg-open";

    if let Err(e) = std::process::Command::new(viewer).arg(path).spawn() {
        log::warn!("Could not open {:?} in viewer: {}", path, e);
    }
}

fn run(args: &Cli) -> Result<(), String> {
    let map = RealmMap::load(&args.map, &args.geometry).map_err(|e| e.to_string())?;

    println!(
        "Built map: {} cells, {} holdings ({} wasteland ids), {} empires",
        map.cells.len(),
        map.holdings.len(),
        map.wastelands.len(),
        map.hierarchy.empires.len()
    );
    for empire in map.hierarchy.emittable_empires() {
        println!(
            "  {} {} (capital {})",
            empire.title_id().tag(),
            empire.name(),
            empire.capital_name().unwrap_or("-")
        );
    }

    let mut written = Vec::new();
    match args.mode {
        RenderMode::Cells => {
            written.push(ops::draw_cells(&map, &args.out).map_err(|e| e.to_string())?);
        }
        RenderMode::Holdings => {
            written.push(ops::draw_holdings(&map, &args.out).map_err(|e| e.to_string())?);
        }
        RenderMode::All => {
            println!("=== Rendering cell overlay ===");
            written.push(ops::draw_cells(&map, &args.out).map_err(|e| e.to_string())?);
            println!("=== Rendering holdings map ===");
            written.push(ops::draw_holdings(&map, &args.out).map_err(|e| e.to_string())?);
        }
    }

    for path in &written {
        println!("Wrote {}", path.display());
        if args.debug {
            println!("Debug is on, opening the image...");
            open_in_viewer(path);
        }
    }

    Ok(())
}

fn main() -> Result<(), String> {
    let args = Cli::parse();
    let level = log::LevelFilter::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new().filter_level(level).init();
    run(&args)
}
