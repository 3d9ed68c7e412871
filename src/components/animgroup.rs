//! Named transient animations attached to one owner.
//!
//! An owner (entity or terrain cell) can carry several side animations next
//! to its main sprite: an explosion where a projectile hit, a selection
//! arrow floating above it. [`AnimationGroup::advance`] steps all of them in
//! one pass, reports what to draw, and retires every entry whose animator
//! stopped producing frames. Retiring one entry never touches its siblings.

use glam::Vec2;

use bevy_ecs::prelude::Component;

use crate::components::animation::{AnimationFrame, AnimationHandler, Animator, Frame};

/// Where a group entry is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Fixed world position.
    World(Vec2),
    /// Offset from the owner's current position.
    Owner(Vec2),
}

impl Anchor {
    pub fn resolve(&self, owner: Vec2) -> Vec2 {
        match *self {
            Anchor::World(p) => p,
            Anchor::Owner(offset) => owner + offset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupEntry<F, H> {
    pub name: String,
    pub anchor: Anchor,
    pub z: f32,
    pub animator: Animator<F, H>,
    /// Runs when the entry retires; takes precedence over the animator's
    /// own sequence handler.
    pub on_retire: Option<H>,
}

impl<F: Clone, H: Clone> GroupEntry<F, H> {
    pub fn new(name: impl Into<String>, anchor: Anchor, z: f32, animator: Animator<F, H>) -> Self {
        Self {
            name: name.into(),
            anchor,
            z,
            animator,
            on_retire: None,
        }
    }

    pub fn with_on_retire(mut self, handler: H) -> Self {
        self.on_retire = Some(handler);
        self
    }
}

/// One visible entry after [`AnimationGroup::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFrame<F> {
    pub name: String,
    pub pos: Vec2,
    pub z: f32,
    pub frame: F,
}

/// One retired entry after [`AnimationGroup::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct Retired<H> {
    pub name: String,
    pub pos: Vec2,
    pub handler: Option<H>,
}

#[derive(Debug, Clone)]
pub struct GroupPass<F, H> {
    pub visible: Vec<GroupFrame<F>>,
    pub retired: Vec<Retired<H>>,
}

impl<F, H> Default for GroupPass<F, H> {
    fn default() -> Self {
        Self {
            visible: Vec::new(),
            retired: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationGroup<F, H> {
    entries: Vec<GroupEntry<F, H>>,
}

impl<F, H> Default for AnimationGroup<F, H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F: Clone, H: Clone> AnimationGroup<F, H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing one with the same name. Returns the stored
    /// entry so callers can start playback.
    pub fn register(&mut self, entry: GroupEntry<F, H>) -> &mut GroupEntry<F, H> {
        let idx = match self.entries.iter().position(|e| e.name == entry.name) {
            Some(idx) => {
                self.entries[idx] = entry;
                idx
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        before != self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&GroupEntry<F, H>> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GroupEntry<F, H>> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance every entry once, drop the finished ones.
    pub fn advance(&mut self, now: f32, owner: Vec2) -> GroupPass<F, H> {
        let mut pass = GroupPass::default();
        self.entries.retain_mut(|entry| {
            let pos = entry.anchor.resolve(owner);
            match entry.animator.advance(now) {
                AnimationFrame::Frame(frame) => {
                    pass.visible.push(GroupFrame {
                        name: entry.name.clone(),
                        pos,
                        z: entry.z,
                        frame,
                    });
                    true
                }
                AnimationFrame::Completed(handler) => {
                    pass.retired.push(Retired {
                        name: entry.name.clone(),
                        pos,
                        handler: entry.on_retire.clone().or(handler),
                    });
                    false
                }
                AnimationFrame::Empty => {
                    pass.retired.push(Retired {
                        name: entry.name.clone(),
                        pos,
                        handler: entry.on_retire.clone(),
                    });
                    false
                }
            }
        });
        pass
    }
}

/// Side animations of an entity.
#[derive(Component, Default, Clone)]
pub struct AnimGroup {
    pub group: AnimationGroup<Frame, AnimationHandler>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animation::AnimationSpec;

    fn blast(name: &str, at: Vec2) -> GroupEntry<u8, u32> {
        let mut anim = Animator::new();
        anim.define("blast", [1, 2], AnimationSpec::once(0.1));
        anim.play("blast", 0.0);
        GroupEntry::new(name, Anchor::World(at), 0.9, anim)
    }

    #[test]
    fn entries_retire_individually() {
        let mut g: AnimationGroup<u8, u32> = AnimationGroup::new();
        g.register(blast("a", Vec2::new(1.0, 2.0)).with_on_retire(11));
        let mut long = Animator::new();
        long.define("arrow", [9], AnimationSpec::timed(1.0));
        long.play("arrow", 0.0);
        g.register(GroupEntry::new("arrow", Anchor::Owner(Vec2::new(0.0, -80.0)), 0.95, long));

        let pass = g.advance(0.15, Vec2::new(100.0, 100.0));
        assert_eq!(pass.visible.len(), 2);
        assert!(pass.retired.is_empty());
        let arrow = pass.visible.iter().find(|v| v.name == "arrow").unwrap();
        assert_eq!(arrow.pos, Vec2::new(100.0, 20.0));

        let pass = g.advance(0.3, Vec2::new(100.0, 100.0));
        assert_eq!(pass.retired.len(), 1);
        assert_eq!(pass.retired[0].name, "a");
        assert_eq!(pass.retired[0].handler, Some(11));
        assert_eq!(pass.retired[0].pos, Vec2::new(1.0, 2.0));
        assert_eq!(pass.visible.len(), 1);
        assert!(g.contains("arrow"));
        assert!(!g.contains("a"));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut g: AnimationGroup<u8, u32> = AnimationGroup::new();
        g.register(blast("x", Vec2::ZERO));
        g.register(blast("x", Vec2::ONE));
        assert_eq!(g.len(), 1);
        assert_eq!(g.get("x").unwrap().anchor, Anchor::World(Vec2::ONE));
        assert!(g.unregister("x"));
        assert!(!g.unregister("x"));
    }

    #[test]
    fn idle_entry_is_retired_without_sequence_handler() {
        let mut g: AnimationGroup<u8, u32> = AnimationGroup::new();
        g.register(GroupEntry::new("nothing", Anchor::World(Vec2::ZERO), 0.0, Animator::new()));
        let pass = g.advance(1.0, Vec2::ZERO);
        assert_eq!(pass.retired.len(), 1);
        assert_eq!(pass.retired[0].handler, None);
        assert!(g.is_empty());
    }
}
