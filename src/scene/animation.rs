//! Frame-driven animation clocks.
//!
//! Clocks hold plain seconds and are advanced by the host through `tick(dt)`.
//! Shapes in the scene stay static; painters ask the clocks for the current
//! phase.

use crate::model::StarType;

pub const NEBULA_PULSE_SECS: f32 = 3.0;
pub const STAR_PULSE_SECS: f32 = 2.0;
pub const STAR_PHASE_STEP_SECS: f32 = 0.5;
pub const SCAN_SWEEP_SECS: f32 = 7.5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClockState {
    Running,
    Paused,
    Stopped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClock {
    duration: f32,
    auto_reverse: bool,
    period: Option<f32>,
    elapsed: f32,
    state: ClockState,
}

impl AnimationClock {
    /// A running clock that repeats forever.
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(f32::EPSILON),
            auto_reverse: false,
            period: None,
            elapsed: 0.0,
            state: ClockState::Running,
        }
    }

    pub fn auto_reverse(mut self) -> Self {
        self.auto_reverse = true;
        self
    }

    /// Restart every `period` seconds, holding the end value in between.
    pub fn repeat_every(mut self, period: f32) -> Self {
        self.period = Some(period);
        self
    }

    pub fn seek(mut self, seconds: f32) -> Self {
        self.elapsed = seconds.max(0.0) % self.cycle();
        self
    }

    fn active_span(&self) -> f32 {
        if self.auto_reverse {
            self.duration * 2.0
        } else {
            self.duration
        }
    }

    fn cycle(&self) -> f32 {
        let active = self.active_span();
        self.period.map_or(active, |period| period.max(active))
    }

    pub fn tick(&mut self, dt: f32) {
        if self.state != ClockState::Running || dt <= 0.0 {
            return;
        }
        self.elapsed = (self.elapsed + dt) % self.cycle();
    }

    pub fn pause(&mut self) {
        if self.state == ClockState::Running {
            self.state = ClockState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == ClockState::Paused {
            self.state = ClockState::Running;
        }
    }

    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.elapsed = 0.0;
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Position on the timeline in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.state == ClockState::Stopped {
            return 0.0;
        }
        let t = self.elapsed;
        if t < self.duration {
            t / self.duration
        } else if self.auto_reverse && t < self.duration * 2.0 {
            1.0 - (t - self.duration) / self.duration
        } else {
            1.0
        }
    }
}

/// Quadratic ease with equal acceleration and deceleration halves.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        let inv = 1.0 - t;
        1.0 - 2.0 * inv * inv
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Shared star and scan-sweep clocks. One clock per star type, never per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct AmbientAnimations {
    nebula: AnimationClock,
    stars: Vec<AnimationClock>,
    sweep: AnimationClock,
}

impl Default for AmbientAnimations {
    fn default() -> Self {
        Self::new()
    }
}

impl AmbientAnimations {
    pub fn new() -> Self {
        let stars = StarType::ALL
            .iter()
            .filter(|star| star.supports_planets())
            .map(|star| {
                AnimationClock::new(STAR_PULSE_SECS)
                    .auto_reverse()
                    .seek(STAR_PHASE_STEP_SECS * star.index() as f32)
            })
            .collect();

        Self {
            nebula: AnimationClock::new(NEBULA_PULSE_SECS).auto_reverse(),
            stars,
            sweep: AnimationClock::new(SCAN_SWEEP_SECS),
        }
    }

    fn clocks_mut(&mut self) -> impl Iterator<Item = &mut AnimationClock> + '_ {
        std::iter::once(&mut self.nebula)
            .chain(self.stars.iter_mut())
            .chain(std::iter::once(&mut self.sweep))
    }

    pub fn tick(&mut self, dt: f32) {
        self.clocks_mut().for_each(|clock| clock.tick(dt));
    }

    pub fn pause(&mut self) {
        self.clocks_mut().for_each(AnimationClock::pause);
    }

    pub fn resume(&mut self) {
        self.clocks_mut().for_each(AnimationClock::resume);
    }

    pub fn stop(&mut self) {
        self.clocks_mut().for_each(AnimationClock::stop);
    }

    pub fn star_opacity(&self, star: StarType) -> f32 {
        match star {
            StarType::Nebula => lerp(1.0, 0.5, self.nebula.progress()),
            _ => 1.0,
        }
    }

    pub fn star_scale(&self, star: StarType) -> f32 {
        self.stars
            .get(star.index())
            .filter(|_| star.supports_planets())
            .map_or(1.0, |clock| lerp(0.85, 1.25, clock.progress()))
    }

    pub fn sweep_phase(&self) -> f32 {
        self.sweep.progress()
    }

    pub fn state(&self) -> ClockState {
        self.sweep.state()
    }
}

// =============================================================================
// Tests
// =============================================================================
