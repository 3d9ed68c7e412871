use std::sync::Arc;

use bevy_ecs::prelude::Component;
use glam::Vec2;

use crate::resources::terrain::{AlphaMask, OpacityMask};

/// Opacity mask of an entity's sprite for pixel-accurate hit tests.
#[derive(Component, Clone, Debug)]
pub struct PixelMask {
    pub mask: Arc<AlphaMask>,
}

impl PixelMask {
    pub fn new(mask: AlphaMask) -> Self {
        Self {
            mask: Arc::new(mask),
        }
    }

    /// Test `point` against the mask of a sprite centred at `center`.
    /// `flip_h` mirrors the lookup horizontally. Points off the mask miss.
    pub fn hit(&self, center: Vec2, point: Vec2, flip_h: bool) -> bool {
        let w = self.mask.width() as f32;
        let h = self.mask.height() as f32;
        let local = point - (center - Vec2::new(w / 2.0, h / 2.0));
        if local.x < 0.0 || local.y < 0.0 {
            return false;
        }
        let mut lx = local.x as u32;
        let ly = local.y as u32;
        if flip_h {
            match self.mask.width().checked_sub(lx) {
                Some(x) => lx = x,
                None => return false,
            }
        }
        self.mask.opacity(lx, ly).is_some_and(|a| a != 0)
    }
}
