//! The demo as a pure reducer over [`Action`]s.

use {
    serde::Serialize,
    std::time::Duration,
    strum::{Display, EnumString},
};

/// Period of one [`Action::Tick`].
pub const TICK: Duration = Duration::from_millis(100);

#[derive(
    Clone, Copy, Debug, Default, Display, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Auction,
    Deposit,
    Withdrawal,
    Complete,
}

/// A phase of the swap lifecycle as the demo presents it.
#[derive(Debug)]
pub struct PhaseStep {
    pub phase: Phase,
    pub title: &'static str,
    pub description: &'static str,
    pub duration: Duration,
    pub events: [&'static str; 6],
}

impl PhaseStep {
    /// Number of ticks until the phase is over.
    fn ticks(&self) -> u32 {
        let ticks = self.duration.as_millis() / TICK.as_millis();
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}

/// The phases the demo runs through, in order.
pub const STEPS: [PhaseStep; 3] = [
    PhaseStep {
        phase: Phase::Auction,
        title: "Order Announcement",
        description: "User signs swap order, auction begins",
        duration: Duration::from_millis(3000),
        events: [
            "User signs Fusion+ order",
            "Secret hash generated",
            "Order sent to 1inch backend",
            "Broadcasted to all resolvers",
            "Dutch auction started",
            "Resolvers submit competitive bids",
        ],
    },
    PhaseStep {
        phase: Phase::Deposit,
        title: "Escrow Setup",
        description: "Winner deposits in time-locked contract",
        duration: Duration::from_millis(4000),
        events: [
            "Winning resolver selected",
            "HTLC contract deployed",
            "Resolver deposits destination tokens",
            "Contract locked with secret hash",
            "Timelock parameters set",
            "User notified of deposit",
        ],
    },
    PhaseStep {
        phase: Phase::Withdrawal,
        title: "Secret Reveal",
        description: "User reveals secret to complete swap",
        duration: Duration::from_millis(2000),
        events: [
            "User verifies contract state",
            "Secret revealed on-chain",
            "User claims destination tokens",
            "Resolver observes secret",
            "Resolver claims source tokens",
            "Atomic swap completed",
        ],
    },
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// Starts the demo from the beginning unless it is already running, in
    /// which case it resumes.
    Play,
    Pause,
    Resume,
    /// Play or pause, whichever applies.
    Toggle,
    Reset,
    /// One [`TICK`] of time passed.
    Tick,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DemoState {
    pub phase: Phase,
    pub is_playing: bool,
    pub step_index: usize,
    /// Ticks spent in the current phase.
    elapsed: u32,
}

impl DemoState {
    fn started() -> Self {
        Self {
            phase: Phase::Auction,
            is_playing: true,
            step_index: 0,
            elapsed: 0,
        }
    }

    /// Whether the demo is in one of the phases of [`STEPS`].
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Complete)
    }

    /// Whether ticks currently advance the demo.
    pub fn is_ticking(&self) -> bool {
        self.is_playing && self.is_running()
    }

    pub fn step(&self) -> Option<&'static PhaseStep> {
        STEPS.iter().find(|step| step.phase == self.phase)
    }

    /// Progress within the current phase in percent.
    pub fn progress(&self) -> f64 {
        match self.phase {
            Phase::Complete => 100.,
            _ => self.step().map_or(0., |step| {
                f64::from(self.elapsed) * 100. / f64::from(step.ticks())
            }),
        }
    }

    /// Progress through the whole demo in percent.
    pub fn overall_progress(&self) -> f64 {
        if self.phase == Phase::Complete {
            return 100.;
        }
        let steps = STEPS.len() as f64;
        self.step_index as f64 / steps * 100. + self.progress() / steps
    }

    /// Events of the current phase that already happened. Event `i` of `n`
    /// shows up once the phase is more than `i / n` done.
    pub fn visible_events(&self) -> &'static [&'static str] {
        let Some(step) = self.step() else {
            return &[];
        };
        let done = self.progress() / 100.;
        let count = (0..step.events.len())
            .take_while(|&i| done > i as f64 / step.events.len() as f64)
            .count();
        &step.events[..count]
    }

    #[must_use]
    pub fn apply(self, action: Action) -> Self {
        match action {
            Action::Play if self.is_running() => Self {
                is_playing: true,
                ..self
            },
            Action::Play => Self::started(),
            Action::Toggle if self.is_running() => Self {
                is_playing: !self.is_playing,
                ..self
            },
            Action::Toggle => Self::started(),
            Action::Pause if self.is_running() => Self {
                is_playing: false,
                ..self
            },
            Action::Resume if self.is_running() => Self {
                is_playing: true,
                ..self
            },
            Action::Pause | Action::Resume => self,
            Action::Reset => Self::default(),
            Action::Tick => self.tick(),
        }
    }

    fn tick(self) -> Self {
        if !self.is_ticking() {
            return self;
        }
        let Some(step) = self.step() else {
            return self;
        };
        let elapsed = self.elapsed + 1;
        if elapsed < step.ticks() {
            return Self { elapsed, ..self };
        }
        match STEPS.get(self.step_index + 1) {
            Some(next) => Self {
                phase: next.phase,
                step_index: self.step_index + 1,
                elapsed: 0,
                ..self
            },
            None => Self {
                phase: Phase::Complete,
                is_playing: false,
                elapsed,
                ..self
            },
        }
    }
}
