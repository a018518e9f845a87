//! Day-phase state machine driven by the server tick.

use shared::PHASE_NAMES;

/// One of the six recurring segments of a game day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Dawn,
    Morning,
    Noon,
    Afternoon,
    Evening,
    Night,
}

/// The cycle order; `phase_idx` on the wire indexes into this.
pub const PHASE_ORDER: [Phase; 6] = [
    Phase::Dawn,
    Phase::Morning,
    Phase::Noon,
    Phase::Afternoon,
    Phase::Evening,
    Phase::Night,
];

impl Phase {
    pub fn index(self) -> usize {
        PHASE_ORDER.iter().position(|phase| *phase == self).unwrap_or(0)
    }

    pub fn name(self) -> &'static str {
        PHASE_NAMES[self.index()]
    }
}

/// Per-phase durations in seconds, supplied by configuration.
#[derive(Debug, Clone)]
pub struct PhaseTable {
    durations: [f32; 6],
}

impl PhaseTable {
    /// Durations are clamped to a small positive floor so the clock can
    /// always make progress through a full cycle.
    pub fn new(durations: [f32; 6]) -> Self {
        Self {
            durations: durations.map(|seconds| seconds.max(0.001)),
        }
    }

    pub fn duration(&self, phase: Phase) -> f32 {
        self.durations[phase.index()]
    }

    /// Returns a copy with every duration multiplied by `factor`, for the
    /// day-length CLI knob.
    pub fn scaled(&self, factor: f32) -> PhaseTable {
        PhaseTable::new(self.durations.map(|seconds| seconds * factor))
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        // DAWN, MORNING, NOON, AFTERNOON, EVENING, NIGHT
        PhaseTable::new([15.0, 60.0, 45.0, 60.0, 45.0, 40.0])
    }
}

/// Countdown clock over the six-phase cycle.
///
/// A fresh clock starts at DAWN on day 1, the cycle's first phase. The
/// timer is never negative once `tick` returns:
/// expiry advances the phase and re-arms the timer with the new phase's
/// duration, carrying leftover elapsed time so a long tick can cross
/// several phases at once.
pub struct PhaseClock {
    table: PhaseTable,
    phase_idx: usize,
    timer: f32,
    day: u32,
}

impl PhaseClock {
    pub fn new(table: PhaseTable) -> Self {
        let timer = table.duration(Phase::Dawn);
        Self {
            table,
            phase_idx: 0,
            timer,
            day: 1,
        }
    }

    /// Rewinds to DAWN of day 1 with a full timer. Called when a game starts.
    pub fn reset(&mut self) {
        self.phase_idx = 0;
        self.timer = self.table.duration(Phase::Dawn);
        self.day = 1;
    }

    pub fn phase(&self) -> Phase {
        PHASE_ORDER[self.phase_idx]
    }

    pub fn phase_idx(&self) -> usize {
        self.phase_idx
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Forces the current phase to expire; the advance is realized by the
    /// next `tick` call.
    pub fn skip(&mut self) {
        self.timer = 0.0;
    }

    /// Subtracts `dt` elapsed seconds, advancing through as many phases as
    /// expire. Returns every phase entered, in order; `day` increments on
    /// each entry into DAWN.
    pub fn tick(&mut self, dt: f32) -> Vec<Phase> {
        let mut entered = Vec::new();
        self.timer -= dt;

        while self.timer <= 0.0 {
            let leftover = self.timer;
            self.phase_idx = (self.phase_idx + 1) % PHASE_ORDER.len();
            let phase = PHASE_ORDER[self.phase_idx];
            if phase == Phase::Dawn {
                self.day += 1;
            }
            self.timer = self.table.duration(phase) + leftover;
            entered.push(phase);
        }

        entered
    }
}
