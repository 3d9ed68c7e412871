//! Frame-sequence animation scheduling.
//!
//! An [`Animator`] owns a set of named sequences and plays one of them at a
//! time. [`Animator::advance`] is called once per render tick with the
//! current clock and returns what to display:
//!
//! - the same frame while less than `timing` seconds passed since the last
//!   frame change,
//! - otherwise the next frame (wrapping when `looped`),
//! - when a non-looping sequence runs out: the next queued sequence, or the
//!   last frame again when `hold`, or [`AnimationFrame::Completed`] exactly
//!   once followed by [`AnimationFrame::Empty`] forever.
//!
//! The [`Animation`] component is the per-entity animator whose completion
//! handlers run with an [`EntityContext`].

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

use crate::context::EntityContext;

/// One drawable frame: an opaque image key plus a tile index inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    pub tex_key: Arc<str>,
    pub index: u32,
}

impl Frame {
    pub fn new(tex_key: impl Into<Arc<str>>, index: u32) -> Self {
        Self {
            tex_key: tex_key.into(),
            index,
        }
    }

    /// `count` consecutive tiles of the same sheet.
    pub fn strip(tex_key: &str, count: u32) -> Vec<Frame> {
        let key: Arc<str> = Arc::from(tex_key);
        (0..count)
            .map(|index| Frame {
                tex_key: key.clone(),
                index,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSpec {
    /// Seconds each frame stays on screen.
    pub timing: f32,
    pub looped: bool,
    /// Keep showing the last frame once exhausted.
    pub hold: bool,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            timing: 1.0,
            looped: false,
            hold: true,
        }
    }
}

impl AnimationSpec {
    pub fn timed(timing: f32) -> Self {
        Self {
            timing,
            ..Self::default()
        }
    }

    /// Play once and report completion.
    pub fn once(timing: f32) -> Self {
        Self {
            timing,
            looped: false,
            hold: false,
        }
    }

    pub fn looping(timing: f32) -> Self {
        Self {
            timing,
            looped: true,
            hold: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Sequence<F, H> {
    frames: Vec<F>,
    spec: AnimationSpec,
    on_complete: Option<H>,
}

/// Result of one [`Animator::advance`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationFrame<F, H> {
    Frame(F),
    /// The sequence just ran out. Carries its completion handler, if any.
    /// Reported once per play.
    Completed(Option<H>),
    /// Nothing is playing.
    Empty,
}

impl<F, H> AnimationFrame<F, H> {
    pub fn frame(&self) -> Option<&F> {
        match self {
            AnimationFrame::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, AnimationFrame::Frame(_))
    }
}

#[derive(Debug, Clone)]
pub struct Animator<F, H> {
    sequences: FxHashMap<String, Sequence<F, H>>,
    current: Option<String>,
    cursor: usize,
    last_change: f32,
    queue: VecDeque<String>,
    completed: bool,
}

impl<F, H> Default for Animator<F, H> {
    fn default() -> Self {
        Self {
            sequences: FxHashMap::default(),
            current: None,
            cursor: 0,
            last_change: 0.0,
            queue: VecDeque::new(),
            completed: false,
        }
    }
}

impl<F: Clone, H: Clone> Animator<F, H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named sequence. Empty frame lists are
    /// rejected.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        frames: impl IntoIterator<Item = F>,
        spec: AnimationSpec,
    ) -> bool {
        let name = name.into();
        let frames: Vec<F> = frames.into_iter().collect();
        if frames.is_empty() {
            log::debug!("animation '{}' defined without frames, ignored", name);
            return false;
        }
        // the playing sequence starts over on its new frames
        if self.current.as_deref() == Some(name.as_str()) {
            self.cursor = 0;
            self.completed = false;
        }
        self.sequences.insert(
            name,
            Sequence {
                frames,
                spec,
                on_complete: None,
            },
        );
        true
    }

    /// Builder form of [`define`](Self::define).
    pub fn with(
        mut self,
        name: impl Into<String>,
        frames: impl IntoIterator<Item = F>,
        spec: AnimationSpec,
    ) -> Self {
        self.define(name, frames, spec);
        self
    }

    /// Attach a completion handler to a defined sequence.
    pub fn on_complete(&mut self, name: &str, handler: H) -> bool {
        match self.sequences.get_mut(name) {
            Some(seq) => {
                seq.on_complete = Some(handler);
                true
            }
            None => false,
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.sequences.contains_key(name)
    }

    /// First frame of a sequence without playing it.
    pub fn first_frame(&self, name: &str) -> Option<&F> {
        self.sequences.get(name).and_then(|s| s.frames.first())
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Frame under the cursor, without advancing.
    pub fn current_frame(&self) -> Option<&F> {
        if self.completed {
            return None;
        }
        let seq = self.sequences.get(self.current.as_deref()?)?;
        seq.frames.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Start a sequence from its first frame. Returns that frame, or `None`
    /// when the name is undefined (the animator is left unchanged).
    pub fn play(&mut self, name: &str, now: f32) -> Option<F> {
        let first = self.sequences.get(name)?.frames.first()?.clone();
        self.current = Some(name.to_string());
        self.cursor = 0;
        self.last_change = now;
        self.completed = false;
        Some(first)
    }

    /// Replace the follow-on queue and start playing its head.
    pub fn play_queue<S: AsRef<str>>(&mut self, names: &[S], now: f32) -> Option<F> {
        self.queue = names.iter().map(|s| s.as_ref().to_string()).collect();
        self.play_next_queued(now)
    }

    fn play_next_queued(&mut self, now: f32) -> Option<F> {
        while let Some(next) = self.queue.pop_front() {
            if let Some(first) = self.play(&next, now) {
                return Some(first);
            }
            log::debug!("queued animation '{}' is not defined, skipped", next);
        }
        None
    }

    pub fn stop(&mut self) {
        self.queue.clear();
        self.current = None;
        self.completed = false;
    }

    pub fn restart(&mut self, now: f32) {
        self.cursor = 0;
        self.last_change = now;
        self.completed = false;
    }

    /// Step the animation clock. See the module docs for the policy.
    pub fn advance(&mut self, now: f32) -> AnimationFrame<F, H> {
        if self.completed {
            return AnimationFrame::Empty;
        }
        let Some(name) = self.current.as_deref() else {
            return AnimationFrame::Empty;
        };
        let Some(seq) = self.sequences.get(name) else {
            return AnimationFrame::Empty;
        };
        let len = seq.frames.len();

        if now - self.last_change < seq.spec.timing {
            return AnimationFrame::Frame(seq.frames[self.cursor].clone());
        }

        if !seq.spec.looped && self.cursor + 1 < len {
            self.cursor += 1;
            self.last_change = now;
            return AnimationFrame::Frame(seq.frames[self.cursor].clone());
        }
        if seq.spec.looped {
            self.cursor = (self.cursor + 1) % len;
            self.last_change = now;
            return AnimationFrame::Frame(seq.frames[self.cursor].clone());
        }

        // exhausted
        let hold = seq.spec.hold;
        let held = seq.frames[self.cursor].clone();
        let handler = seq.on_complete.clone();
        if let Some(first) = self.play_next_queued(now) {
            return AnimationFrame::Frame(first);
        }
        if hold {
            return AnimationFrame::Frame(held);
        }
        self.completed = true;
        AnimationFrame::Completed(handler)
    }
}

/// Completion handler for entity animations.
pub type AnimationHandler = fn(&mut EntityContext);

/// The main animation of an entity's sprite.
#[derive(Component, Default, Clone)]
pub struct Animation {
    animator: Animator<Frame, AnimationHandler>,
}

impl Animation {
    pub fn new(animator: Animator<Frame, AnimationHandler>) -> Self {
        Self { animator }
    }
}

impl Deref for Animation {
    type Target = Animator<Frame, AnimationHandler>;

    fn deref(&self) -> &Self::Target {
        &self.animator
    }
}

impl DerefMut for Animation {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.animator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestAnimator = Animator<u32, &'static str>;

    fn three_frames(spec: AnimationSpec) -> TestAnimator {
        let mut a = TestAnimator::new();
        a.define("walk", [10, 11, 12], spec);
        a
    }

    #[test]
    fn holds_frame_until_timing_elapses() {
        let mut a = three_frames(AnimationSpec::timed(0.5));
        assert_eq!(a.play("walk", 0.0), Some(10));
        assert_eq!(a.advance(0.2), AnimationFrame::Frame(10));
        assert_eq!(a.advance(0.5), AnimationFrame::Frame(11));
        assert_eq!(a.advance(0.7), AnimationFrame::Frame(11));
    }

    #[test]
    fn once_reports_completion_exactly_once() {
        let mut a = three_frames(AnimationSpec::once(0.1));
        a.on_complete("walk", "done");
        a.play("walk", 0.0);
        // N - 1 advances walk the cursor to the last frame
        assert_eq!(a.advance(0.15), AnimationFrame::Frame(11));
        assert_eq!(a.advance(0.3), AnimationFrame::Frame(12));
        // Nth call: no frame and the handler
        assert_eq!(a.advance(0.45), AnimationFrame::Completed(Some("done")));
        assert_eq!(a.advance(0.6), AnimationFrame::Empty);
        assert_eq!(a.advance(9.0), AnimationFrame::Empty);
        assert!(a.is_completed());
    }

    #[test]
    fn hold_keeps_last_frame() {
        let mut a = three_frames(AnimationSpec::timed(0.1));
        a.play("walk", 0.0);
        a.advance(0.15);
        a.advance(0.3);
        assert_eq!(a.advance(0.45), AnimationFrame::Frame(12));
        assert_eq!(a.advance(5.0), AnimationFrame::Frame(12));
    }

    #[test]
    fn looping_wraps() {
        let mut a = three_frames(AnimationSpec::looping(0.1));
        a.play("walk", 0.0);
        let frames: Vec<u32> = (1..=4)
            .map(|i| *a.advance(i as f32 * 0.15).frame().unwrap())
            .collect();
        assert_eq!(frames, vec![11, 12, 10, 11]);
    }

    #[test]
    fn queue_advances_to_follow_on() {
        let mut a = TestAnimator::new();
        a.define("fire", [1, 2], AnimationSpec::once(0.1));
        a.define("standard", [0], AnimationSpec::timed(1.0));
        assert_eq!(a.play_queue(&["fire", "standard"], 0.0), Some(1));
        assert_eq!(a.advance(0.15), AnimationFrame::Frame(2));
        assert_eq!(a.advance(0.3), AnimationFrame::Frame(0));
        assert_eq!(a.current(), Some("standard"));
        assert_eq!(a.advance(5.0), AnimationFrame::Frame(0));
    }

    #[test]
    fn undefined_play_is_ignored() {
        let mut a = three_frames(AnimationSpec::default());
        assert_eq!(a.play("nope", 0.0), None);
        assert_eq!(a.current(), None);
        assert_eq!(a.advance(1.0), AnimationFrame::Empty);
        assert!(!a.define("empty", Vec::<u32>::new(), AnimationSpec::default()));
    }

    #[test]
    fn replay_after_completion_rearms_handler() {
        let mut a = TestAnimator::new();
        a.define("puff", [1], AnimationSpec::once(0.1));
        a.on_complete("puff", "gone");
        a.play("puff", 0.0);
        assert_eq!(a.advance(0.15), AnimationFrame::Completed(Some("gone")));
        a.play("puff", 1.0);
        assert_eq!(a.advance(1.05), AnimationFrame::Frame(1));
        assert_eq!(a.advance(1.2), AnimationFrame::Completed(Some("gone")));
    }

    #[test]
    fn redefining_the_playing_sequence_restarts_it() {
        let mut a = three_frames(AnimationSpec::timed(0.1));
        a.play("walk", 0.0);
        a.advance(0.1);
        assert_eq!(a.advance(0.2), AnimationFrame::Frame(12));
        assert_eq!(a.cursor(), 2);

        assert!(a.define("walk", [7], AnimationSpec::timed(0.1)));
        assert_eq!(a.cursor(), 0);
        assert_eq!(a.advance(0.25), AnimationFrame::Frame(7));
        assert_eq!(a.advance(0.5), AnimationFrame::Frame(7));
    }

    #[test]
    fn frame_strip_builds_consecutive_indices() {
        let frames = Frame::strip("blast", 3);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].index, 2);
        assert_eq!(&*frames[0].tex_key, "blast");
    }
}
