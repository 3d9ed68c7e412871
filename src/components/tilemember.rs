use bevy_ecs::prelude::Component;

use crate::resources::terrain::TileCoord;

/// The terrain cell currently listing this entity as an occupant.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileMember {
    pub cell: Option<TileCoord>,
}
