//! Windowless rendering backend used for scripted and batch runs.

use std::{cell::Cell, collections::VecDeque, rc::Rc, thread, time::Duration};

use anyhow::{ensure, Result as AnyResult};
use gate_defence_core::{AudioError, AudioSink, Clock, ManualClock, MonotonicClock};
use gate_defence_rendering::{FrameInput, FrameOutcome, Presentation, RenderingBackend, Scene};
use glam::Vec2;

/// How simulation time advances between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pacing {
    /// Time advances by exactly one frame per frame, as fast as possible.
    Fixed,
    /// Time follows the wall clock; the backend sleeps between frames.
    Realtime,
}

/// Backend that runs the frame loop without drawing anything.
#[derive(Debug)]
pub(crate) struct HeadlessBackend {
    frames: u32,
    frame: Duration,
    pacing: Pacing,
    clicks: VecDeque<(Duration, Vec2)>,
}

impl HeadlessBackend {
    /// Creates a backend that presents at most `frames` frames.
    pub(crate) fn new(frames: u32, frame: Duration, pacing: Pacing) -> Self {
        Self {
            frames,
            frame,
            pacing,
            clicks: VecDeque::new(),
        }
    }

    /// Queues clicks, delivered one per frame once their time is reached.
    pub(crate) fn with_clicks(mut self, clicks: Vec<(Duration, Vec2)>) -> Self {
        self.clicks = clicks.into();
        self
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, mut presentation: Presentation, mut update_scene: F) -> AnyResult<Presentation>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameOutcome,
    {
        let Self {
            frames,
            frame,
            pacing,
            mut clicks,
        } = self;
        ensure!(!frame.is_zero(), "frame duration must be positive");

        log::debug!(
            "headless run of '{}' for up to {frames} frames of {frame:?} ({pacing:?})",
            presentation.window_title
        );

        let mut manual = ManualClock::default();
        let wall = MonotonicClock::start();

        for _ in 0..frames {
            let now = match pacing {
                Pacing::Fixed => manual.now(),
                Pacing::Realtime => wall.now(),
            };
            let click = match clicks.front() {
                Some((at, _)) if *at <= now => clicks.pop_front().map(|(_, position)| position),
                _ => None,
            };

            if update_scene(now, FrameInput { click }, &mut presentation.scene)
                == FrameOutcome::Exit
            {
                break;
            }

            match pacing {
                Pacing::Fixed => manual.advance(frame),
                Pacing::Realtime => thread::sleep(frame),
            }
        }

        Ok(presentation)
    }
}

/// Audio sink that counts attack sounds instead of playing them.
#[derive(Clone, Debug, Default)]
pub(crate) struct CountingAudio {
    plays: Rc<Cell<u32>>,
}

impl CountingAudio {
    /// Number of attack sounds requested so far, across all clones.
    pub(crate) fn plays(&self) -> u32 {
        self.plays.get()
    }
}

impl AudioSink for CountingAudio {
    fn play_attack(&mut self) -> Result<(), AudioError> {
        self.plays.set(self.plays.get().saturating_add(1));
        Ok(())
    }
}
