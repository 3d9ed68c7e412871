use bevy_ecs::prelude::Component;

/// Built-in kind an entity was spawned as.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Projectile,
    Digger,
    Walker,
    Lantern,
    Physor,
    Tank,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Projectile,
        Kind::Digger,
        Kind::Walker,
        Kind::Lantern,
        Kind::Physor,
        Kind::Tank,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Projectile => "projectile",
            Kind::Digger => "digger",
            Kind::Walker => "walker",
            Kind::Lantern => "lantern",
            Kind::Physor => "physor",
            Kind::Tank => "tank",
        }
    }

    pub fn parse(name: &str) -> Option<Kind> {
        match name.to_ascii_lowercase().as_str() {
            "projectile" => Some(Kind::Projectile),
            "digger" => Some(Kind::Digger),
            "walker" | "andy" => Some(Kind::Walker),
            "lantern" | "sample" => Some(Kind::Lantern),
            "physor" => Some(Kind::Physor),
            "tank" => Some(Kind::Tank),
            _ => None,
        }
    }
}
