use bevy_ecs::prelude::Component;

/// Visual footprint of an entity. Positions are sprite centres; `width` and
/// `height` also feed the box collider and the terrain probes.
#[derive(Component, Clone, Debug)]
pub struct Sprite {
    pub tex_key: String,
    pub width: f32,
    pub height: f32,
    pub z: f32,
    pub flip_h: bool,
}

impl Sprite {
    pub fn new(tex_key: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            tex_key: tex_key.into(),
            width,
            height,
            z: 0.5,
            flip_h: false,
        }
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    pub fn with_flip(mut self, flip_h: bool) -> Self {
        self.flip_h = flip_h;
        self
    }

    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }

    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    /// Whether a sprite centred at screen position (`sx`, `sy`) intersects
    /// a `screen_w` x `screen_h` viewport.
    pub fn visible(&self, sx: f32, sy: f32, screen_w: f32, screen_h: f32) -> bool {
        sx + self.half_width() > 0.0
            && sx - self.half_width() < screen_w
            && sy + self.half_height() > 0.0
            && sy - self.half_height() < screen_h
    }
}
