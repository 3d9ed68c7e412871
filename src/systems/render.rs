//! Render pass.
//!
//! The core does not draw. [`render_pass`] advances every animation once,
//! runs completions, culls against the viewport and hands the survivors to
//! the backend through the [`Renderer`] trait, in this order:
//!
//! 1. terrain tiles (top-left corner in screen space),
//! 2. sprites, group entries and tile effects sorted by `z` (centres in
//!    screen space),
//! 3. HUD text.
//!
//! `scroll` is the world position shown at the top-left of the screen.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::kind::Kind;
use crate::components::mapposition::MapPosition;
use crate::components::signals::Signals;
use crate::components::sprite::Sprite;
use crate::resources::gameconfig::GameConfig;
use crate::resources::terrain::Terrain;
use crate::systems::animation::{advance_entities, advance_tile_effects};

/// One draw call for the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Tile {
        tex_key: String,
        pos: Vec2,
    },
    Sprite {
        entity: Entity,
        tex_key: String,
        frame: u32,
        pos: Vec2,
        z: f32,
        flip_h: bool,
    },
    Effect {
        tex_key: String,
        frame: u32,
        pos: Vec2,
        z: f32,
    },
    Text {
        text: String,
        pos: Vec2,
    },
}

impl DrawCmd {
    fn z(&self) -> f32 {
        match self {
            DrawCmd::Sprite { z, .. } | DrawCmd::Effect { z, .. } => *z,
            DrawCmd::Tile { .. } => 0.0,
            DrawCmd::Text { .. } => 1.0,
        }
    }
}

/// Drawing backend.
pub trait Renderer {
    fn draw(&mut self, cmd: DrawCmd);
}

/// Keeps every command; used by tests and the headless runner.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub commands: Vec<DrawCmd>,
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, cmd: DrawCmd) {
        self.commands.push(cmd);
    }
}

impl RecordingRenderer {
    pub fn sprites(&self) -> impl Iterator<Item = &DrawCmd> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCmd::Sprite { .. }))
    }

    pub fn effects(&self) -> impl Iterator<Item = &DrawCmd> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCmd::Effect { .. }))
    }
}

fn in_view(center: Vec2, half: Vec2, screen: Vec2) -> bool {
    center.x + half.x > 0.0
        && center.x - half.x < screen.x
        && center.y + half.y > 0.0
        && center.y - half.y < screen.y
}

// group entries and tile effects have no size; cull generously
const EFFECT_MARGIN: Vec2 = Vec2::new(64.0, 64.0);

pub fn render_pass(world: &mut World, scroll: Vec2, renderer: &mut dyn Renderer) {
    let screen = world
        .get_resource::<GameConfig>()
        .map_or(Vec2::new(1024.0, 768.0), |c| {
            Vec2::new(c.screen_width as f32, c.screen_height as f32)
        });

    let entity_frames = advance_entities(world);
    let tile_frames = advance_tile_effects(world);

    if let Some(terrain) = world.get_resource::<Terrain>() {
        let size = terrain.tile_size();
        for tile in terrain.tiles() {
            let pos = tile.origin - scroll;
            if in_view(pos + size / 2.0, size / 2.0, screen) {
                renderer.draw(DrawCmd::Tile {
                    tex_key: tile.tex_key.clone(),
                    pos,
                });
            }
        }
    }

    let mut layered: Vec<DrawCmd> = Vec::new();
    let mut hud: Vec<DrawCmd> = Vec::new();
    for frames in entity_frames {
        let entity = frames.entity;
        let (Some(pos), Some(sprite)) = (
            world.get::<MapPosition>(entity).map(|p| p.pos),
            world.get::<Sprite>(entity),
        ) else {
            continue;
        };
        let screen_pos = pos - scroll;

        // an animated entity whose animation ran out has nothing to show
        let main = match (frames.animated, frames.main) {
            (true, Some(frame)) => Some((frame.tex_key.to_string(), frame.index)),
            (true, None) => None,
            (false, _) => Some((sprite.tex_key.clone(), 0)),
        };
        if let Some((tex_key, frame)) = main {
            if sprite.visible(screen_pos.x, screen_pos.y, screen.x, screen.y) {
                layered.push(DrawCmd::Sprite {
                    entity,
                    tex_key,
                    frame,
                    pos: screen_pos,
                    z: sprite.z,
                    flip_h: sprite.flip_h,
                });
            }
        }
        for entry in frames.group {
            let at = entry.pos - scroll;
            if in_view(at, EFFECT_MARGIN, screen) {
                layered.push(DrawCmd::Effect {
                    tex_key: entry.frame.tex_key.to_string(),
                    frame: entry.frame.index,
                    pos: at,
                    z: entry.z,
                });
            }
        }

        if world.get::<Kind>(entity) == Some(&Kind::Tank)
            && sprite.visible(screen_pos.x, screen_pos.y, screen.x, screen.y)
        {
            if let Some(text) = world.get::<Signals>(entity).map(hud_line) {
                hud.push(DrawCmd::Text {
                    text,
                    pos: screen_pos - Vec2::new(0.0, sprite.half_height() + 20.0),
                });
            }
        }
    }
    for entry in tile_frames {
        let at = entry.pos - scroll;
        if in_view(at, EFFECT_MARGIN, screen) {
            layered.push(DrawCmd::Effect {
                tex_key: entry.frame.tex_key.to_string(),
                frame: entry.frame.index,
                pos: at,
                z: entry.z,
            });
        }
    }

    layered.sort_by(|a, b| a.z().total_cmp(&b.z()));
    for cmd in layered.into_iter().chain(hud) {
        renderer.draw(cmd);
    }
}

fn hud_line(signals: &Signals) -> String {
    format!(
        "health {}  power {}  angle {}",
        signals.integer("health").unwrap_or(0),
        signals.integer("power").unwrap_or(0),
        signals.integer("angle").unwrap_or(0)
    )
}
