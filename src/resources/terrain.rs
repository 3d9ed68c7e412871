//! Destructible terrain grid.
//!
//! The level is a grid of fixed-size cells. A cell with a tile carries a
//! raster opacity mask used for pixel-accurate collision, the list of
//! entities currently inside it, and an animation group for transient
//! effects (blasts) that play on it.
//!
//! Screen and grid coordinates are related by
//!
//! ```text
//! col = floor(x / tile_width)
//! row = floor((y - origin_y) / tile_height)
//! ```
//!
//! and the top-left corner of cell `(col, row)` sits at
//! `(col * tile_width, origin_y + row * tile_height)`. Any position with a
//! negative coordinate, above the first row or past the grid maps to no
//! cell; queries there answer "no tile" instead of failing.
//!
//! Damage erases a circle of `splash_radius` in the cell containing the
//! impact point and in every distinct neighbouring cell found at the eight
//! compass offsets of `splash_radius` around the point. Each erase is clipped
//! to its own cell's raster.

use std::fmt;

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::animation::{AnimationSpec, Animator, Frame};
use crate::components::animgroup::{Anchor, AnimationGroup, GroupEntry};

/// Frames in the blast sheet.
pub const BLAST_FRAMES: u32 = 6;
/// Seconds per blast frame.
pub const BLAST_TIMING: f32 = 0.06;

const COMPASS: [(f32, f32); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (-1.0, -1.0),
    (1.0, -1.0),
    (-1.0, 1.0),
    (1.0, 1.0),
];

/// Read/erase access to a raster opacity channel.
pub trait OpacityMask: fmt::Debug + Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Alpha at a pixel, `None` outside the raster.
    fn opacity(&self, x: u32, y: u32) -> Option<u8>;
    /// Clear every pixel within `radius` of (`cx`, `cy`), clipped to the
    /// raster.
    fn erase_circle(&mut self, cx: f32, cy: f32, radius: f32);
}

/// In-memory alpha channel.
#[derive(Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AlphaMask {
    pub fn solid(width: u32, height: u32) -> Self {
        Self::filled(width, height, 255)
    }

    pub fn transparent(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            alpha: vec![value; width as usize * height as usize],
        }
    }

    /// Fully opaque from row `surface` downwards, transparent above.
    pub fn ground(width: u32, height: u32, surface: u32) -> Self {
        let mut mask = Self::transparent(width, height);
        for y in surface.min(height)..height {
            for x in 0..width {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    /// Wrap raw alpha bytes in row-major order.
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> Option<Self> {
        (alpha.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            alpha,
        })
    }

    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            self.alpha[(y * self.width + x) as usize] = value;
        }
    }

    pub fn opaque_count(&self) -> usize {
        self.alpha.iter().filter(|a| **a != 0).count()
    }
}

impl fmt::Debug for AlphaMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaMask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("opaque", &self.opaque_count())
            .finish()
    }
}

impl OpacityMask for AlphaMask {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn opacity(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.alpha[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    fn erase_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        if radius <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = (cx - radius).floor().max(0.0) as i64;
        let y0 = (cy - radius).floor().max(0.0) as i64;
        let x1 = ((cx + radius).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((cy + radius).ceil() as i64).min(self.height as i64 - 1);
        let r2 = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.alpha[(y as u32 * self.width + x as u32) as usize] = 0;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub col: u32,
    pub row: u32,
}

impl TileCoord {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// Narrow-phase result: which cell was hit and where.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileHit {
    pub coord: TileCoord,
    pub point: Vec2,
}

/// What a finished tile effect does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEffect {
    /// Apply splash damage where the effect played.
    Damage,
}

#[derive(Debug)]
pub struct Tile {
    pub coord: TileCoord,
    pub tile_type: u8,
    /// Image key of the tile's picture, e.g. `desert3`.
    pub tex_key: String,
    /// World position of the top-left corner.
    pub origin: Vec2,
    pub mask: Box<dyn OpacityMask>,
    occupants: Vec<Entity>,
    pub effects: AnimationGroup<Frame, TileEffect>,
    effect_seq: u32,
}

impl Tile {
    pub fn new(
        coord: TileCoord,
        tile_type: u8,
        tex_key: impl Into<String>,
        origin: Vec2,
        mask: Box<dyn OpacityMask>,
    ) -> Self {
        Self {
            coord,
            tile_type,
            tex_key: tex_key.into(),
            origin,
            mask,
            occupants: Vec::new(),
            effects: AnimationGroup::new(),
            effect_seq: 0,
        }
    }

    /// Pixel test in world space. A hit needs a non-negative local y and a
    /// non-zero alpha; points off the raster miss.
    pub fn hit(&self, point: Vec2) -> bool {
        let local = point - self.origin;
        let sx = local.x as i64;
        let sy = local.y as i64;
        if sy < 0 || sx < 0 {
            return false;
        }
        self.mask
            .opacity(sx as u32, sy as u32)
            .is_some_and(|a| a != 0)
    }

    /// Erase a circle centred on world `point`, clipped to this tile.
    pub fn erase(&mut self, point: Vec2, radius: f32) {
        let local = point - self.origin;
        self.mask.erase_circle(local.x, local.y, radius);
    }

    pub fn occupants(&self) -> &[Entity] {
        &self.occupants
    }

    pub fn add_occupant(&mut self, entity: Entity) {
        if !self.occupants.contains(&entity) {
            self.occupants.push(entity);
        }
    }

    pub fn remove_occupant(&mut self, entity: Entity) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|e| *e != entity);
        before != self.occupants.len()
    }

    /// Start a blast at `point`; the cell takes damage there when it ends.
    pub fn start_blast(&mut self, point: Vec2, now: f32) {
        self.effect_seq = self.effect_seq.wrapping_add(1);
        let mut animator = Animator::new();
        animator.define(
            "blast",
            Frame::strip("blast", BLAST_FRAMES),
            AnimationSpec::once(BLAST_TIMING),
        );
        animator.play("blast", now);
        let name = format!("blast{}", self.effect_seq);
        self.effects.register(
            GroupEntry::new(name, Anchor::World(point), 0.9, animator)
                .with_on_retire(TileEffect::Damage),
        );
    }
}

#[derive(Resource, Debug)]
pub struct Terrain {
    cols: u32,
    rows: u32,
    tile_size: Vec2,
    origin_y: f32,
    splash_radius: f32,
    /// Theme the tiles were loaded with.
    pub theme: String,
    cells: Vec<Option<Tile>>,
}

impl Default for Terrain {
    fn default() -> Self {
        Self::empty(0, 0, Vec2::new(420.0, 322.0), 124.0, 30.0)
    }
}

impl Terrain {
    /// A grid without any tiles.
    pub fn empty(cols: u32, rows: u32, tile_size: Vec2, origin_y: f32, splash_radius: f32) -> Self {
        let mut cells = Vec::new();
        cells.resize_with(cols as usize * rows as usize, || None);
        Self {
            cols,
            rows,
            tile_size,
            origin_y,
            splash_radius,
            theme: String::new(),
            cells,
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    pub fn splash_radius(&self) -> f32 {
        self.splash_radius
    }

    pub fn tile_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        (coord.col < self.cols && coord.row < self.rows)
            .then(|| (coord.row * self.cols + coord.col) as usize)
    }

    /// Screen position to grid cell, `None` outside the grid.
    pub fn screen_to_map(&self, p: Vec2) -> Option<TileCoord> {
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let col = (p.x / self.tile_size.x).floor();
        let row = ((p.y - self.origin_y) / self.tile_size.y).floor();
        if row < 0.0 || col >= self.cols as f32 || row >= self.rows as f32 {
            return None;
        }
        Some(TileCoord::new(col as u32, row as u32))
    }

    /// Top-left corner of a cell in screen space.
    pub fn map_to_screen(&self, coord: TileCoord) -> Vec2 {
        Vec2::new(
            coord.col as f32 * self.tile_size.x,
            self.origin_y + coord.row as f32 * self.tile_size.y,
        )
    }

    /// Put `tile` in its cell, replacing what was there.
    pub fn insert(&mut self, tile: Tile) -> bool {
        match self.index(tile.coord) {
            Some(idx) => {
                self.cells[idx] = Some(tile);
                true
            }
            None => false,
        }
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).and_then(|idx| self.cells[idx].as_ref())
    }

    pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index(coord).and_then(|idx| self.cells[idx].as_mut())
    }

    pub fn tile_at(&self, p: Vec2) -> Option<&Tile> {
        self.screen_to_map(p).and_then(|c| self.tile(c))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().flatten()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.cells.iter_mut().flatten()
    }

    /// Narrow phase at a world point.
    pub fn check_collision(&self, point: Vec2) -> Option<TileHit> {
        let tile = self.tile_at(point)?;
        tile.hit(point).then_some(TileHit {
            coord: tile.coord,
            point,
        })
    }

    /// Erase terrain around `point` with splash into neighbouring cells.
    /// Returns the damaged cells, the cell under `point` first.
    pub fn damage(&mut self, point: Vec2) -> ArrayVec<TileCoord, 9> {
        let r = self.splash_radius;
        let mut hit: ArrayVec<TileCoord, 9> = ArrayVec::new();
        if let Some(coord) = self.tile_at(point).map(|t| t.coord) {
            hit.push(coord);
        }
        for (dx, dy) in COMPASS {
            let probe = point + Vec2::new(dx * r, dy * r);
            if let Some(coord) = self.tile_at(probe).map(|t| t.coord) {
                if !hit.contains(&coord) {
                    hit.push(coord);
                }
            }
        }
        for coord in &hit {
            if let Some(tile) = self.tile_mut(*coord) {
                tile.erase(point, r);
            }
        }
        log::debug!(
            "terrain damage at ({:.0}, {:.0}) touched {} cell(s)",
            point.x,
            point.y,
            hit.len()
        );
        hit
    }

    /// Move `entity` to the occupant list of the cell under `p`. Returns the
    /// new cell (if any).
    pub fn relocate(
        &mut self,
        entity: Entity,
        from: Option<TileCoord>,
        p: Vec2,
    ) -> Option<TileCoord> {
        let to = self.tile_at(p).map(|t| t.coord);
        if to == from {
            return to;
        }
        if let Some(tile) = from.and_then(|c| self.tile_mut(c)) {
            tile.remove_occupant(entity);
        }
        if let Some(tile) = to.and_then(|c| self.tile_mut(c)) {
            tile.add_occupant(entity);
        }
        to
    }

    /// Drop `entity` from every occupant list.
    pub fn detach(&mut self, entity: Entity) {
        for tile in self.tiles_mut() {
            tile.remove_occupant(entity);
        }
    }

    pub fn occupants(&self, coord: TileCoord) -> &[Entity] {
        self.tile(coord).map(|t| t.occupants()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(cols: u32, rows: u32) -> Terrain {
        let size = Vec2::new(100.0, 50.0);
        let mut t = Terrain::empty(cols, rows, size, 20.0, 10.0);
        for row in 0..rows {
            for col in 0..cols {
                let coord = TileCoord::new(col, row);
                let origin = t.map_to_screen(coord);
                t.insert(Tile::new(
                    coord,
                    1,
                    "test1",
                    origin,
                    Box::new(AlphaMask::solid(100, 50)),
                ));
            }
        }
        t
    }

    #[test]
    fn screen_to_map_floors_and_rejects_outside() {
        let t = grid(3, 2);
        assert_eq!(t.screen_to_map(Vec2::new(0.0, 20.0)), Some(TileCoord::new(0, 0)));
        assert_eq!(t.screen_to_map(Vec2::new(250.0, 75.0)), Some(TileCoord::new(2, 1)));
        assert_eq!(t.screen_to_map(Vec2::new(-1.0, 30.0)), None);
        assert_eq!(t.screen_to_map(Vec2::new(10.0, 10.0)), None);
        assert_eq!(t.screen_to_map(Vec2::new(300.0, 30.0)), None);
        assert_eq!(t.screen_to_map(Vec2::new(10.0, 120.0)), None);
        assert_eq!(t.map_to_screen(TileCoord::new(2, 1)), Vec2::new(200.0, 70.0));
    }

    #[test]
    fn narrow_phase_follows_alpha() {
        let mut t = grid(1, 1);
        let p = Vec2::new(40.0, 40.0);
        assert!(t.check_collision(p).is_some());
        t.tile_mut(TileCoord::new(0, 0)).unwrap().erase(p, 3.0);
        assert!(t.check_collision(p).is_none());
        assert!(t.check_collision(Vec2::new(40.0, 60.0)).is_some());
        // no tile there
        assert!(t.check_collision(Vec2::new(500.0, 40.0)).is_none());
    }

    #[test]
    fn missing_tile_is_no_hit() {
        let mut t = Terrain::empty(2, 1, Vec2::new(100.0, 50.0), 0.0, 10.0);
        assert!(t.check_collision(Vec2::new(50.0, 25.0)).is_none());
        assert!(t.damage(Vec2::new(50.0, 25.0)).is_empty());
    }

    #[test]
    fn damage_splashes_into_distinct_neighbours() {
        let mut t = grid(3, 2);
        // on the vertical border of (0,0) and (1,0), close to row 1
        let p = Vec2::new(99.0, 65.0);
        let hit = t.damage(p);
        assert_eq!(hit[0], TileCoord::new(0, 0));
        assert!(hit.contains(&TileCoord::new(1, 0)));
        assert!(hit.contains(&TileCoord::new(0, 1)));
        assert!(hit.contains(&TileCoord::new(1, 1)));
        assert_eq!(hit.len(), 4);
        assert!(!t.tile(TileCoord::new(1, 0)).unwrap().hit(Vec2::new(101.0, 65.0)));
        assert!(t.tile(TileCoord::new(2, 0)).unwrap().hit(Vec2::new(201.0, 65.0)));
    }

    #[test]
    fn damage_at_grid_edge_never_fails() {
        let mut t = grid(1, 1);
        let hit = t.damage(Vec2::new(1.0, 21.0));
        assert_eq!(hit.as_slice(), &[TileCoord::new(0, 0)]);
    }

    #[test]
    fn erase_clips_to_raster() {
        let mut m = AlphaMask::solid(10, 10);
        m.erase_circle(-2.0, 5.0, 3.0);
        assert_eq!(m.opacity(0, 5), Some(0));
        assert_eq!(m.opacity(1, 5), Some(0));
        assert_eq!(m.opacity(1, 4), Some(255));
        m.erase_circle(50.0, 50.0, 3.0);
        assert_eq!(m.opaque_count(), 100 - 6);
    }

    #[test]
    fn relocate_keeps_membership_consistent() {
        let mut world = World::new();
        let e = world.spawn_empty().id();
        let mut t = grid(2, 1);
        let a = t.relocate(e, None, Vec2::new(10.0, 30.0));
        assert_eq!(a, Some(TileCoord::new(0, 0)));
        let b = t.relocate(e, a, Vec2::new(150.0, 30.0));
        assert_eq!(b, Some(TileCoord::new(1, 0)));
        assert!(t.occupants(TileCoord::new(0, 0)).is_empty());
        assert_eq!(t.occupants(TileCoord::new(1, 0)), &[e]);
        t.detach(e);
        assert!(t.occupants(TileCoord::new(1, 0)).is_empty());
    }
}
