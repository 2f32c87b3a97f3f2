/// Receiver of frame ticks.
pub trait FrameTarget {
    /// Advance by `dt_s` seconds and redraw.
    fn on_tick(&mut self, dt_s: f64);
}

/// Cooperative frame loop state: turns host timestamps into deltas and gates ticks on
/// start/stop.
///
/// The host calls [`AnimationDriver::tick`] once per frame with a monotonic timestamp; a `false`
/// return means no further frame should be scheduled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationDriver {
    running: bool,
    last_ts: Option<f64>,
    max_step_s: f64,
    ticks: u64,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl AnimationDriver {
    /// Stopped driver clamping each delta to `max_step_s`.
    pub fn new(max_step_s: f64) -> Self {
        Self {
            running: false,
            last_ts: None,
            max_step_s: if max_step_s.is_finite() && max_step_s > 0.0 {
                max_step_s
            } else {
                0.1
            },
            ticks: 0,
        }
    }

    /// Begin ticking. The first tick after a start has a zero delta.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.last_ts = None;
        }
    }

    /// Stop ticking. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_ts = None;
    }

    /// Whether ticks are delivered.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks delivered since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Change the delta clamp.
    pub fn set_max_step(&mut self, max_step_s: f64) {
        if max_step_s.is_finite() && max_step_s > 0.0 {
            self.max_step_s = max_step_s;
        }
    }

    /// Deliver one frame at host time `now_s` (seconds).
    ///
    /// Deltas are clamped to `[0, max_step]` so clock skew or a long stall never produces a huge
    /// integration step. Returns whether the host should schedule another frame.
    pub fn tick(&mut self, now_s: f64, target: &mut dyn FrameTarget) -> bool {
        if !self.running {
            return false;
        }
        let dt = match self.last_ts {
            Some(prev) if now_s.is_finite() => (now_s - prev).clamp(0.0, self.max_step_s),
            _ => 0.0,
        };
        if now_s.is_finite() {
            self.last_ts = Some(now_s);
        }
        self.ticks += 1;
        target.on_tick(dt);
        self.running
    }
}
