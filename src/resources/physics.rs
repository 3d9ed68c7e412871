//! Force field accumulation and time-stepped integration.
//!
//! The integrator itself is stateless: [`compute_field`] and [`integrate`]
//! are pure functions over a [`PhysicsParams`] value, the body's
//! [`RigidBody`] and the positions of the registered force sources. The only
//! state that evolves is the body's accumulated `time`.
//!
//! Field of one source on a body:
//!
//! ```text
//! k * magnitude * unit(body -> source) / distance^p
//! ```
//!
//! summed over every registered source, plus `gravity` on the y axis.
//! Positive magnitudes pull the body towards the source.
//!
//! # Related
//!
//! - [`ForceRegistry`] – ordered set of force source entities
//! - [`EntityContext::integrate`](crate::context::EntityContext::integrate) –
//!   the world-aware wrapper that also notifies nearby sources

use bevy_ecs::prelude::*;
use glam::Vec2;
use smallvec::SmallVec;

use crate::components::rigidbody::RigidBody;
use crate::resources::gameconfig::GameConfig;

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub gravity: f32,
    pub time_tick: f32,
    pub force_constant: f32,
    pub inverse_law: f32,
    pub proximity_radius: f32,
    pub proximity_accel: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

impl PhysicsParams {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            gravity: config.gravity,
            time_tick: config.time_tick,
            force_constant: config.force_constant,
            inverse_law: config.inverse_law,
            proximity_radius: config.proximity_radius,
            proximity_accel: config.proximity_accel,
        }
    }
}

/// Registered force sources in registration order. No duplicates.
#[derive(Resource, Debug, Default, Clone)]
pub struct ForceRegistry {
    sources: Vec<Entity>,
}

impl ForceRegistry {
    /// Returns `false` if `source` was already registered.
    pub fn register(&mut self, source: Entity) -> bool {
        if self.sources.contains(&source) {
            return false;
        }
        self.sources.push(source);
        true
    }

    /// Idempotent. Returns whether anything was removed.
    pub fn unregister(&mut self, source: Entity) -> bool {
        let before = self.sources.len();
        self.sources.retain(|s| *s != source);
        before != self.sources.len()
    }

    pub fn contains(&self, source: Entity) -> bool {
        self.sources.contains(&source)
    }

    pub fn sources(&self) -> &[Entity] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// A force source as seen by the field computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSample {
    pub entity: Entity,
    pub pos: Vec2,
    pub magnitude: f32,
}

/// A source close enough to a body, with the acceleration it contributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityHit {
    pub source: Entity,
    pub accel: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field {
    pub accel: Vec2,
    pub near: SmallVec<[ProximityHit; 2]>,
}

/// Sum the field acting on a body at `at`. Sources coincident with the body
/// and the body itself (`body`) are skipped.
pub fn compute_field(
    params: &PhysicsParams,
    body: Option<Entity>,
    at: Vec2,
    sources: impl IntoIterator<Item = SourceSample>,
) -> Field {
    let mut field = Field::default();
    for source in sources {
        if Some(source.entity) == body {
            continue;
        }
        let d = source.pos - at;
        let length = d.length();
        if length <= f32::EPSILON {
            continue;
        }
        let unit = d / length;
        let incr = params.force_constant * source.magnitude * unit / length.powf(params.inverse_law);
        field.accel += incr;

        let mag = incr.length();
        if length < params.proximity_radius && mag > params.proximity_accel {
            field.near.push(ProximityHit {
                source: source.entity,
                accel: mag,
            });
        }
    }
    field.accel.y += params.gravity;
    field
}

/// One integration step. Returns the new position and advances
/// `body.time` by `time_tick`. Non-physical bodies stay put and keep their
/// time. `accel` is ignored for gravity-only bodies.
pub fn integrate(params: &PhysicsParams, body: &mut RigidBody, pos: Vec2, accel: Vec2) -> Vec2 {
    if !body.physical {
        return pos;
    }
    let a = if body.gravity_only {
        Vec2::new(0.0, params.gravity)
    } else {
        accel
    };
    let dt = params.time_tick;
    let dx = a.x * body.time * dt + body.init_velocity.x * dt;
    let dy = a.y * body.time * dt - body.init_velocity.y * dt;
    body.time += dt;
    Vec2::new(pos.x + dx, pos.y + dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn field_is_gravity_without_sources() {
        let p = PhysicsParams::default();
        let f = compute_field(&p, None, Vec2::ZERO, []);
        assert_eq!(f.accel, Vec2::new(0.0, 9.81));
        assert!(f.near.is_empty());
    }

    #[test]
    fn attractor_pulls_and_repulsor_pushes() {
        let p = PhysicsParams::default();
        let e = entities(2);
        let pull = compute_field(
            &p,
            None,
            Vec2::ZERO,
            [SourceSample {
                entity: e[0],
                pos: Vec2::new(100.0, 0.0),
                magnitude: 10.0,
            }],
        );
        // 50 * 10 / 100
        assert!(approx_eq(pull.accel.x, 5.0));
        assert_eq!(pull.near.len(), 1);
        assert!(approx_eq(pull.near[0].accel, 5.0));

        let push = compute_field(
            &p,
            None,
            Vec2::ZERO,
            [SourceSample {
                entity: e[1],
                pos: Vec2::new(100.0, 0.0),
                magnitude: -10.0,
            }],
        );
        assert!(approx_eq(push.accel.x, -5.0));
    }

    #[test]
    fn coincident_and_self_sources_are_skipped() {
        let p = PhysicsParams::default();
        let e = entities(2);
        let f = compute_field(
            &p,
            Some(e[1]),
            Vec2::new(5.0, 5.0),
            [
                SourceSample {
                    entity: e[0],
                    pos: Vec2::new(5.0, 5.0),
                    magnitude: 20.0,
                },
                SourceSample {
                    entity: e[1],
                    pos: Vec2::new(50.0, 5.0),
                    magnitude: 20.0,
                },
            ],
        );
        assert!(f.accel.x.is_finite());
        assert_eq!(f.accel, Vec2::new(0.0, 9.81));
    }

    #[test]
    fn far_or_weak_sources_are_not_near() {
        let p = PhysicsParams::default();
        let e = entities(2);
        let f = compute_field(
            &p,
            None,
            Vec2::ZERO,
            [
                SourceSample {
                    entity: e[0],
                    pos: Vec2::new(250.0, 0.0),
                    magnitude: 20.0,
                },
                SourceSample {
                    entity: e[1],
                    pos: Vec2::new(0.0, 150.0),
                    magnitude: 1.0,
                },
            ],
        );
        assert!(f.near.is_empty());
    }

    #[test]
    fn non_physical_body_does_not_move() {
        let p = PhysicsParams::default();
        let mut body = RigidBody::launched(50.0, 30.0);
        body.physical = false;
        let pos = Vec2::new(12.0, 34.0);
        assert_eq!(integrate(&p, &mut body, pos, Vec2::new(100.0, 100.0)), pos);
        assert_eq!(body.time, 0.0);
    }

    #[test]
    fn gravity_only_ignores_field() {
        let p = PhysicsParams::default();
        let mut a = RigidBody::new().with_gravity_only(true);
        let mut b = RigidBody::new().with_gravity_only(true);
        a.time = 1.0;
        b.time = 1.0;
        let pa = integrate(&p, &mut a, Vec2::ZERO, Vec2::new(500.0, -500.0));
        let pb = integrate(&p, &mut b, Vec2::ZERO, Vec2::new(0.0, 9.81));
        assert_eq!(pa, pb);
        assert!(approx_eq(pa.y, 9.81 * 0.2));
    }

    #[test]
    fn reset_then_integrate_matches_fresh_body() {
        let p = PhysicsParams::default();
        let accel = Vec2::new(0.0, 9.81);
        let mut used = RigidBody::launched(40.0, 45.0);
        for _ in 0..7 {
            integrate(&p, &mut used, Vec2::ZERO, accel);
        }
        used.reset_time();
        let mut fresh = RigidBody::launched(40.0, 45.0);
        let start = Vec2::new(3.0, 4.0);
        assert_eq!(
            integrate(&p, &mut used, start, accel),
            integrate(&p, &mut fresh, start, accel)
        );
    }

    #[test]
    fn projectile_arc() {
        let p = PhysicsParams::default();
        let mut body = RigidBody::launched(50.0, 0.0);
        let spawn = Vec2::new(100.0, 100.0);
        let mut pos = spawn;
        let mut last_x = pos.x;
        for step in 0..5 {
            let t = step as f32 * 0.2;
            let expected = Vec2::new(pos.x + 50.0 * 0.2, pos.y + 9.81 * t * 0.2);
            pos = integrate(&p, &mut body, pos, Vec2::new(0.0, 9.81));
            assert!(approx_eq(pos.x, expected.x) && approx_eq(pos.y, expected.y));
            assert!(pos.x > last_x);
            last_x = pos.x;
        }
        assert!(approx_eq(pos.x, 150.0));
        // 9.81 * 0.04 * (0 + 1 + 2 + 3 + 4)
        assert!(approx_eq(pos.y, 100.0 + 3.924));
        assert!(pos.y > spawn.y);
    }

    #[test]
    fn registry_has_no_duplicates_and_idempotent_removal() {
        let e = entities(2);
        let mut r = ForceRegistry::default();
        assert!(r.register(e[0]));
        assert!(!r.register(e[0]));
        assert!(r.register(e[1]));
        assert_eq!(r.sources(), &[e[0], e[1]]);
        assert!(r.unregister(e[0]));
        assert!(!r.unregister(e[0]));
        assert_eq!(r.len(), 1);
    }
}
