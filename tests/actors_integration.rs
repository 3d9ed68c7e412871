//! Built-in kinds reacting to input, hits and animation completion.

use bevy_ecs::prelude::*;
use glam::Vec2;

use tremolo::actors::SpawnParams;
use tremolo::components::animgroup::AnimGroup;
use tremolo::components::kind::Kind;
use tremolo::components::liveness::Liveness;
use tremolo::components::phase::Phase;
use tremolo::components::signals::Signals;
use tremolo::events::input::InputKind;
use tremolo::game::Simulation;
use tremolo::resources::eventdispatcher::EventListeners;
use tremolo::resources::input::keys;
use tremolo::resources::terrain::AlphaMask;
use tremolo::selection::{has_arrow, Selection};
use tremolo::systems::render::{DrawCmd, RecordingRenderer};

const DT: f32 = 0.1;

fn integer(sim: &Simulation, e: Entity, key: &str) -> Option<i32> {
    sim.world().get::<Signals>(e).and_then(|s| s.integer(key))
}

fn state(sim: &Simulation, e: Entity) -> Option<String> {
    sim.world()
        .get::<Phase>(e)
        .and_then(|p| p.current().map(str::to_string))
}

fn sounds(sim: &mut Simulation) -> Vec<String> {
    sim.drain_audio()
        .into_iter()
        .map(|c| c.id().to_string())
        .collect()
}

fn select(sim: &mut Simulation, e: Entity) -> Selection {
    let mut selection = Selection::new();
    selection.click(sim.world_mut(), Some(e));
    selection.release(sim.world_mut());
    selection
}

fn shot(sim: &mut Simulation, at: Vec2, owner: Option<Entity>) -> Entity {
    let mut params = SpawnParams::new().with_velocity(0.0);
    if let Some(owner) = owner {
        params = params.with_owner(owner);
    }
    sim.spawn(Kind::Projectile, at, &params).unwrap()
}

#[test]
fn selected_tank_fires_on_its_key() {
    let mut sim = Simulation::default();
    let tank = sim
        .spawn(Kind::Tank, Vec2::new(200.0, 100.0), &SpawnParams::new())
        .unwrap();

    // not selected yet: the key is heard but ignored
    assert_eq!(sim.on_input_event(InputKind::KeyDown, keys::SPACE), 1);
    assert_eq!(sim.entities().len(), 1);
    sim.on_input_event(InputKind::KeyUp, keys::SPACE);

    select(&mut sim, tank);
    assert_eq!(state(&sim, tank).as_deref(), Some("controllable"));
    assert!(has_arrow(sim.world(), tank));

    sim.on_input_event(InputKind::KeyDown, keys::SPACE);
    let entities = sim.entities();
    assert_eq!(entities.len(), 2);
    let ball = entities[1];
    assert_eq!(sim.world().get::<Kind>(ball), Some(&Kind::Projectile));
    // turret tip: hull + (24 + 38, -7)
    let at = sim.position(ball).unwrap();
    assert!((at - Vec2::new(262.0, 93.0)).length() < 1e-3);
    assert!(sounds(&mut sim).contains(&"tankshot".to_string()));
    let turret = sim
        .world()
        .get::<AnimGroup>(tank)
        .and_then(|g| g.group.get("turret"))
        .and_then(|e| e.animator.current().map(str::to_string));
    assert_eq!(turret.as_deref(), Some("fire"));

    // the other tank's key does nothing to this one
    sim.on_input_event(InputKind::KeyDown, keys::ENTER);
    assert_eq!(sim.entities().len(), 2);
}

#[test]
fn held_keys_turn_the_turret_and_set_power() {
    let mut sim = Simulation::default();
    let tank = sim
        .spawn(Kind::Tank, Vec2::new(200.0, 100.0), &SpawnParams::new())
        .unwrap();
    select(&mut sim, tank);

    sim.on_input_event(InputKind::KeyDown, keys::W);
    sim.on_input_event(InputKind::KeyDown, keys::A);
    for _ in 0..3 {
        sim.update_tick(DT);
    }
    assert_eq!(integer(&sim, tank, "power"), Some(53));
    assert_eq!(integer(&sim, tank, "angle"), Some(357));
    assert!(sounds(&mut sim).contains(&"turret".to_string()));

    sim.on_input_event(InputKind::KeyUp, keys::W);
    sim.on_input_event(InputKind::KeyUp, keys::A);
    sim.update_tick(DT);
    assert_eq!(integer(&sim, tank, "power"), Some(53));
}

#[test]
fn grey_tank_faces_left() {
    let mut sim = Simulation::default();
    let tank = sim
        .spawn(
            Kind::Tank,
            Vec2::new(600.0, 100.0),
            &SpawnParams::new().with_facing(-1),
        )
        .unwrap();
    select(&mut sim, tank);
    sim.on_input_event(InputKind::KeyDown, keys::ENTER);
    let ball = sim.entities()[1];
    // hull + (-25 - 38, 0)
    let at = sim.position(ball).unwrap();
    assert!((at - Vec2::new(537.0, 100.0)).length() < 1e-3);
}

#[test]
fn projectile_hits_wear_a_tank_down() {
    let mut sim = Simulation::default();
    let tank = sim
        .spawn(Kind::Tank, Vec2::new(200.0, 100.0), &SpawnParams::new())
        .unwrap();
    shot(&mut sim, Vec2::new(205.0, 100.0), None);
    sim.update_tick(DT);

    assert_eq!(integer(&sim, tank, "health"), Some(95));
    assert!(sounds(&mut sim).contains(&"tankexplode".to_string()));
    let group = sim.world().get::<AnimGroup>(tank).unwrap();
    assert!(group.group.contains("blast1"));
    assert_eq!(sim.entities(), vec![tank]);

    // the blast shows up as an effect and retires on its own
    let mut renderer = RecordingRenderer::default();
    sim.render_pass(0.0, 0.0, &mut renderer);
    assert!(renderer.effects().any(|c| matches!(c, DrawCmd::Effect { tex_key, .. } if tex_key == "blast")));
    for _ in 0..10 {
        sim.update_tick(DT);
        sim.render_pass(0.0, 0.0, &mut renderer);
    }
    assert!(!sim.world().get::<AnimGroup>(tank).unwrap().group.contains("blast1"));
}

#[test]
fn last_hit_burns_the_tank_out() {
    let mut sim = Simulation::default();
    let tank = sim
        .spawn(Kind::Tank, Vec2::new(200.0, 100.0), &SpawnParams::new())
        .unwrap();
    select(&mut sim, tank);
    sim.world_mut()
        .get_mut::<Signals>(tank)
        .unwrap()
        .set_integer("health", 5);

    shot(&mut sim, Vec2::new(200.0, 100.0), None);
    sim.update_tick(DT);
    assert_eq!(integer(&sim, tank, "health"), Some(0));
    assert_eq!(state(&sim, tank).as_deref(), Some("burned"));
    assert!(!sim.world().resource::<EventListeners>().has_listeners("key_down"));

    // stays on the field, ignoring hits and keys
    shot(&mut sim, Vec2::new(200.0, 100.0), None);
    sim.update_tick(DT);
    assert_eq!(integer(&sim, tank, "health"), Some(0));
    assert_eq!(sim.on_input_event(InputKind::KeyDown, keys::SPACE), 0);
    assert!(sim.world().get_entity(tank).is_ok());
}

#[test]
fn sprite_mask_lets_shots_through_transparent_pixels() {
    let mut sim = Simulation::default();
    let tank = sim
        .spawn(Kind::Tank, Vec2::new(200.0, 100.0), &SpawnParams::new())
        .unwrap();
    // only the bottom half of the hull is solid
    assert!(sim.set_pixel_mask(tank, AlphaMask::ground(64, 40, 20)));

    let high = shot(&mut sim, Vec2::new(200.0, 92.0), None);
    sim.update_tick(DT);
    assert_eq!(integer(&sim, tank, "health"), Some(100));
    assert!(sim.world().get_entity(high).is_ok());

    shot(&mut sim, Vec2::new(200.0, 110.0), None);
    sim.update_tick(DT);
    assert_eq!(integer(&sim, tank, "health"), Some(95));
}

#[test]
fn blown_out_lantern_expires_after_its_animation() {
    let mut sim = Simulation::default();
    let tank = sim
        .spawn(Kind::Tank, Vec2::new(600.0, 100.0), &SpawnParams::new())
        .unwrap();
    let lantern = sim
        .spawn(Kind::Lantern, Vec2::new(200.0, 100.0), &SpawnParams::new())
        .unwrap();
    shot(&mut sim, Vec2::new(200.0, 100.0), Some(tank));
    sim.update_tick(DT);

    assert!(sounds(&mut sim).contains(&"puff".to_string()));
    assert!(sim.world().get::<Liveness>(lantern).unwrap().idle);
    // the shooter is rewarded
    assert_eq!(integer(&sim, tank, "health"), Some(105));

    let mut renderer = RecordingRenderer::default();
    for _ in 0..12 {
        sim.render_pass(0.0, 0.0, &mut renderer);
        sim.update_tick(DT);
    }
    assert!(sim.world().get_entity(lantern).is_err());
    assert_eq!(sim.entities(), vec![tank]);
}

#[test]
fn walker_walks_while_its_key_is_held() {
    let mut sim = Simulation::default();
    let w = sim
        .spawn(Kind::Walker, Vec2::new(200.0, 100.0), &SpawnParams::new())
        .unwrap();
    // base behavior ignores the keys
    sim.on_input_event(InputKind::KeyDown, keys::RIGHT);
    sim.update_tick(DT);
    assert_eq!(sim.position(w).unwrap().x, 200.0);

    select(&mut sim, w);
    sim.update_tick(DT);
    sim.update_tick(DT);
    assert_eq!(sim.position(w).unwrap().x, 210.0);
}

#[test]
fn stray_projectile_burns_its_fuse() {
    let mut sim = Simulation::default();
    let p = sim
        .spawn(
            Kind::Projectile,
            Vec2::new(200.0, 100.0),
            &SpawnParams::new().with_velocity(20.0).with_angle(90.0),
        )
        .unwrap();

    // one-second ticks; the shot never lands on the empty terrain
    for _ in 0..9 {
        sim.update_tick(1.0);
    }
    assert!(sim.world().get_entity(p).is_ok());
    assert_eq!(sim.entities(), vec![p]);

    sim.update_tick(1.0);
    sim.update_tick(1.0);
    assert!(sim.world().get_entity(p).is_err());
    assert!(sim.entities().is_empty());
}
