use bevy_ecs::prelude::Component;

/// How a terrain cell responds when this entity lands on it.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TerrainImpact {
    /// Thud, then a blast animation at the impact point; the cell is
    /// damaged when the blast completes.
    Blast,
    /// The cell does nothing.
    #[default]
    None,
}
