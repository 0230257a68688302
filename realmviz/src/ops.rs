//! Export passes: take a built map's polygon/color payloads, rasterize at
//! the fixed canvas resolution and write PNGs under `<out>/map_data/`.
//!
//! Paths are deterministic given the pass name, so repeated runs over the
//! same input can be diffed file by file. Write failures surface as
//! [`ExportError`]; nothing here retries.

use crate::raster::{self, Span};
use image::{Rgb, RgbImage};
use rayon::prelude::*;
use realmdata::map::FillGroup;
use realmdata::project::{MAP_HEIGHT, MAP_WIDTH, geo_to_canvas};
use realmdata::RealmMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("image write failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const OUTLINE_THICKNESS: u32 = 2;

fn output_path(out_dir: &Path, name: &str) -> Result<PathBuf, ExportError> {
    let dir = out_dir.join("map_data");
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(format!("{}.png", name)))
}

fn project_polygon(map: &RealmMap, polygon: &[[f32; 2]]) -> Vec<(f32, f32)> {
    polygon
        .iter()
        .map(|v| {
            let (x, y) = geo_to_canvas(&map.bounds, v[0] as f64, v[1] as f64);
            (x as f32, y as f32)
        })
        .collect()
}

/// Rasterize fill groups in parallel (spans per group), then apply the
/// results to one canvas serially.
fn rasterize_groups(img: &mut RgbImage, map: &RealmMap, groups: &[FillGroup]) {
    let rendered: Vec<(Rgb<u8>, Vec<Span>)> = groups
        .par_iter()
        .map(|group| {
            let mut spans = Vec::new();
            for polygon in &group.polygons {
                let projected = project_polygon(map, polygon);
                spans.extend(raster::polygon_spans(&projected, MAP_WIDTH, MAP_HEIGHT));
            }
            (Rgb(group.color), spans)
        })
        .collect();

    for (color, spans) in &rendered {
        raster::apply_spans(img, spans, *color);
    }
}

/// Outline-only overlay of every cell boundary on a white background.
pub fn draw_cells(map: &RealmMap, out_dir: &Path) -> Result<PathBuf, ExportError> {
    log::info!("Drawing cell outlines...");
    let mut img = RgbImage::from_pixel(MAP_WIDTH, MAP_HEIGHT, Rgb([255, 255, 255]));

    for polygon in map.cell_outlines() {
        let projected = project_polygon(map, &polygon);
        raster::outline_polygon(&mut img, &projected, OUTLINE_COLOR, OUTLINE_THICKNESS);
    }

    let path = output_path(out_dir, "cells")?;
    img.save(&path)?;
    log::info!("Cell overlay saved to {:?}", path);
    Ok(path)
}

/// Filled per-holding map: every settled holding in its own color, wasteland
/// in the shared dark fill.
pub fn draw_holdings(map: &RealmMap, out_dir: &Path) -> Result<PathBuf, ExportError> {
    log::info!("Drawing holdings map...");
    let mut img = RgbImage::from_pixel(MAP_WIDTH, MAP_HEIGHT, Rgb([255, 255, 255]));

    let mut groups = map.holding_fill_groups();
    groups.push(map.wasteland_fill_group());
    rasterize_groups(&mut img, map, &groups);

    let path = output_path(out_dir, "holdings")?;
    img.save(&path)?;
    log::info!("Holdings map saved to {:?}", path);
    Ok(path)
}

/// Filled map of arbitrary color groups over a configurable background.
pub fn draw_groups(
    map: &RealmMap,
    groups: &[FillGroup],
    name: &str,
    background: Rgb<u8>,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    log::info!("Drawing color-grouped map '{}'...", name);
    let mut img = RgbImage::from_pixel(MAP_WIDTH, MAP_HEIGHT, background);
    rasterize_groups(&mut img, map, groups);

    let path = output_path(out_dir, name)?;
    img.save(&path)?;
    log::info!("Image saved to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use realmdata::ingest::{parse_attribute_feed, parse_geometry_feed};
    use tempfile::tempdir;

    const ATTRIBUTES: &str = r#"{
        "pack": {
            "provinces": [0, {"i": 1, "state": 1, "burg": 1, "name": "Arlen"}],
            "burgs": [{}, {"i": 1, "cell": 0, "name": "Arlen", "feature": 1, "x": 1.0, "y": 1.0}],
            "states": [{"i": 1, "name": "Mercia", "provinces": [1]}],
            "cultures": [], "religions": [],
            "cells": [{"i": 0, "area": 30, "biome": 6}]
        },
        "mapCoordinates": {"latT": 30, "latN": 15, "latS": -15, "lonT": 60, "lonW": -30, "lonE": 30},
        "info": {"width": 2048, "height": 1024}
    }"#;

    const GEOMETRY: &str = r#"{
        "features": [
            {"geometry": {"type": "Polygon", "coordinates": [[[-10.0, 10.0], [10.0, 10.0], [10.0, -10.0], [-10.0, -10.0]]]},
             "properties": {"id": 0, "type": "continent", "province": 1, "state": 1,
                            "height": 40, "neighbors": [], "culture": 0, "religion": 0}}
        ]
    }"#;

    fn sample_map() -> RealmMap {
        let attributes = parse_attribute_feed(ATTRIBUTES).unwrap();
        let geometry = parse_geometry_feed(GEOMETRY).unwrap();
        RealmMap::build(&attributes, &geometry).unwrap()
    }

    #[test]
    fn test_draw_holdings_writes_deterministic_path() {
        let map = sample_map();
        let dir = tempdir().unwrap();
        let path = draw_holdings(&map, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("map_data").join("holdings.png"));
        assert!(path.exists());

        // The holding polygon covers the canvas center in its fill color.
        let img = image::open(&path).unwrap().to_rgb8();
        let holding = &map.holdings[0];
        let center = img.get_pixel(MAP_WIDTH / 2, MAP_HEIGHT / 2);
        assert_eq!(center, &Rgb(holding.color));
    }

    #[test]
    fn test_draw_cells_outlines_on_white() {
        let map = sample_map();
        let dir = tempdir().unwrap();
        let path = draw_cells(&map, dir.path()).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();
        // Far corner stays background white.
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_draw_groups_custom_background() {
        let map = sample_map();
        let dir = tempdir().unwrap();
        let groups = vec![map.wasteland_fill_group()];
        let path = draw_groups(&map, &groups, "wasteland", Rgb([10, 10, 60]), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("map_data").join("wasteland.png"));
        let img = image::open(&path).unwrap().to_rgb8();
        // No wasteland in this fixture, so only the background shows.
        assert_eq!(img.get_pixel(0, 0), &Rgb([10, 10, 60]));
        assert_eq!(img.get_pixel(MAP_WIDTH / 2, MAP_HEIGHT / 2), &Rgb([10, 10, 60]));
    }

    #[test]
    fn test_export_failure_surfaces() {
        let map = sample_map();
        let err = draw_cells(&map, Path::new("/dev/null/not-a-dir")).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
