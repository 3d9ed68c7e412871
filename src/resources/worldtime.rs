use bevy_ecs::prelude::Resource;

/// Simulation clock. Animation and timer schedulers read `elapsed`; the
/// physics integrator uses its own fixed step instead.
#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    /// Number of completed update ticks.
    pub tick: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            tick: 0,
        }
    }
}
