//! Level tile-grid descriptors and terrain construction.
//!
//! A descriptor names a theme and lists one tile type per cell, row by row.
//! Type `0` is an empty cell; types `1..=9` pick the theme's tile pictures.
//! Two encodings are accepted:
//!
//! Digit rows, as the classic level files are written (first line may name
//! the theme with `theme = <name>`):
//!
//! ```text
//! theme = desert
//! 0000000
//! 1100011
//! 1111111
//! ```
//!
//! JSON:
//!
//! ```json
//! { "theme": "desert", "rows": ["0000000", "1100011", "1111111"] }
//! ```
//!
//! Turning tile types into rasters is the asset layer's job; it plugs in
//! through [`MaskSource`].

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::resources::gameconfig::GameConfig;
use crate::resources::terrain::{AlphaMask, OpacityMask, Terrain, Tile, TileCoord};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TileGrid {
    #[serde(default = "default_theme")]
    pub theme: String,
    pub rows: Vec<String>,
}

fn default_theme() -> String {
    "desert".to_string()
}

impl TileGrid {
    /// Parse either encoding. Text starting with `{` is JSON.
    pub fn parse(text: &str) -> Result<Self> {
        let grid = if text.trim_start().starts_with('{') {
            serde_json::from_str::<TileGrid>(text)?
        } else {
            Self::parse_digit_rows(text)
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    fn parse_digit_rows(text: &str) -> Self {
        let mut theme = default_theme();
        let mut rows = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(rest) = line.strip_prefix("theme") {
                theme = rest.trim_start_matches([' ', '=', ':']).trim().to_string();
                continue;
            }
            rows.push(line.to_string());
        }
        Self { theme, rows }
    }

    fn validate(&self) -> Result<()> {
        let Some(first) = self.rows.first() else {
            return Err(SimError::InvalidGrid("no rows".into()));
        };
        let width = first.chars().count();
        if width == 0 {
            return Err(SimError::InvalidGrid("empty first row".into()));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(SimError::InvalidGrid(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.chars().count(),
                    width
                )));
            }
            if let Some(bad) = row.chars().find(|c| !c.is_ascii_digit()) {
                return Err(SimError::InvalidGrid(format!(
                    "row {} contains '{}', expected digits",
                    i, bad
                )));
            }
        }
        Ok(())
    }

    pub fn cols(&self) -> u32 {
        self.rows.first().map_or(0, |r| r.chars().count() as u32)
    }

    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Tile type at a cell, `0` outside the grid.
    pub fn tile_type(&self, coord: TileCoord) -> u8 {
        self.rows
            .get(coord.row as usize)
            .and_then(|r| r.as_bytes().get(coord.col as usize))
            .map_or(0, |b| b.saturating_sub(b'0'))
    }

    /// Number of non-empty cells.
    pub fn active_tiles(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.bytes().filter(|b| (b'1'..=b'9').contains(b)).count())
            .sum()
    }
}

/// Supplies the opacity raster of a tile picture.
pub trait MaskSource {
    fn mask(&self, theme: &str, tile_type: u8, width: u32, height: u32) -> Box<dyn OpacityMask>;
}

/// Fully opaque tiles, for headless runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolidMasks;

impl MaskSource for SolidMasks {
    fn mask(&self, _theme: &str, _tile_type: u8, width: u32, height: u32) -> Box<dyn OpacityMask> {
        Box::new(AlphaMask::solid(width, height))
    }
}

impl Terrain {
    /// Build the terrain for `grid`, one tile per non-zero cell.
    pub fn load(grid: &TileGrid, masks: &dyn MaskSource, config: &GameConfig) -> Self {
        let mut terrain = Terrain::empty(
            grid.cols(),
            grid.row_count(),
            Vec2::new(config.tile_width as f32, config.tile_height as f32),
            config.origin_y,
            config.splash_radius,
        );
        terrain.theme = grid.theme.clone();
        for row in 0..grid.row_count() {
            for col in 0..grid.cols() {
                let coord = TileCoord::new(col, row);
                let tile_type = grid.tile_type(coord);
                if tile_type == 0 {
                    continue;
                }
                let mask = masks.mask(&grid.theme, tile_type, config.tile_width, config.tile_height);
                let origin = terrain.map_to_screen(coord);
                terrain.insert(Tile::new(
                    coord,
                    tile_type,
                    format!("{}{}", grid.theme, tile_type),
                    origin,
                    mask,
                ));
            }
        }
        log::info!(
            "Loaded terrain: theme {}, {}x{} cells, {} tiles",
            grid.theme,
            grid.cols(),
            grid.row_count(),
            terrain.tile_count()
        );
        terrain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_rows_with_theme_header() {
        let g = TileGrid::parse("theme = lush\n0010\n1111\n").unwrap();
        assert_eq!(g.theme, "lush");
        assert_eq!(g.cols(), 4);
        assert_eq!(g.row_count(), 2);
        assert_eq!(g.tile_type(TileCoord::new(2, 0)), 1);
        assert_eq!(g.tile_type(TileCoord::new(9, 9)), 0);
        assert_eq!(g.active_tiles(), 5);
    }

    #[test]
    fn json_descriptor() {
        let g = TileGrid::parse(r#"{ "rows": ["12", "03"] }"#).unwrap();
        assert_eq!(g.theme, "desert");
        assert_eq!(g.tile_type(TileCoord::new(1, 1)), 3);
    }

    #[test]
    fn ragged_or_empty_grids_are_rejected() {
        assert!(matches!(
            TileGrid::parse("011\n01\n"),
            Err(SimError::InvalidGrid(_))
        ));
        assert!(matches!(TileGrid::parse(""), Err(SimError::InvalidGrid(_))));
        assert!(matches!(
            TileGrid::parse("01x\n"),
            Err(SimError::InvalidGrid(_))
        ));
        assert!(matches!(TileGrid::parse("{ oops"), Err(SimError::Json(_))));
    }

    #[test]
    fn load_skips_empty_cells() {
        let g = TileGrid::parse("010\n111\n").unwrap();
        let t = Terrain::load(&g, &SolidMasks, &GameConfig::default());
        assert_eq!(t.tile_count(), 4);
        assert!(t.tile(TileCoord::new(0, 0)).is_none());
        let tile = t.tile(TileCoord::new(1, 0)).unwrap();
        assert_eq!(tile.tex_key, "desert1");
        assert_eq!(tile.origin, Vec2::new(420.0, 124.0));
    }
}
