use {
    crate::state::{Action, DemoState},
    std::time::Duration,
    tokio::{
        sync::{mpsc, watch},
        task::JoinHandle,
        time::{Instant, Interval, MissedTickBehavior},
    },
};

/// Runs a [`DemoState`] in real time.
///
/// The state lives in a background task that applies commands as they arrive
/// and ticks it while it plays. Every change is published to the receivers
/// returned by [`Demo::updates`]. Dropping the handle stops the task.
pub struct Demo {
    commands: mpsc::UnboundedSender<Action>,
    updates: watch::Receiver<DemoState>,
    task: JoinHandle<()>,
}

impl Demo {
    /// Starts an idle demo ticking every `tick`.
    pub fn spawn(tick: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (sender, updates) = watch::channel(DemoState::default());
        let task = tokio::spawn(run(tick, receiver, sender));
        Self {
            commands,
            updates,
            task,
        }
    }

    /// Queues `action`. Returns `false` if the demo task is gone.
    pub fn dispatch(&self, action: Action) -> bool {
        self.commands.send(action).is_ok()
    }

    pub fn play(&self) -> bool {
        self.dispatch(Action::Play)
    }

    pub fn pause(&self) -> bool {
        self.dispatch(Action::Pause)
    }

    pub fn resume(&self) -> bool {
        self.dispatch(Action::Resume)
    }

    pub fn toggle(&self) -> bool {
        self.dispatch(Action::Toggle)
    }

    pub fn reset(&self) -> bool {
        self.dispatch(Action::Reset)
    }

    pub fn state(&self) -> DemoState {
        *self.updates.borrow()
    }

    pub fn updates(&self) -> watch::Receiver<DemoState> {
        self.updates.clone()
    }
}

impl Drop for Demo {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    tick: Duration,
    mut commands: mpsc::UnboundedReceiver<Action>,
    updates: watch::Sender<DemoState>,
) {
    let mut state = DemoState::default();
    // Only exists while the demo plays.
    let mut ticker: Option<Interval> = None;

    loop {
        let action = tokio::select! {
            command = commands.recv() => match command {
                Some(action) => action,
                None => break,
            },
            _ = next_tick(&mut ticker) => Action::Tick,
        };

        let previous = state;
        state = state.apply(action);
        if state == previous {
            continue;
        }
        tracing::trace!(?action, ?state, "demo changed");

        if !state.is_ticking() {
            ticker = None;
        } else if !previous.is_ticking() || previous.phase != state.phase {
            let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker = Some(interval);
        }
        updates.send_replace(state);
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::state::{Phase, TICK},
    };

    #[tokio::test(start_paused = true)]
    async fn plays_to_completion_in_nominal_time() {
        let demo = Demo::spawn(TICK);
        let mut updates = demo.updates();
        let start = Instant::now();
        assert!(demo.play());

        let done = *updates
            .wait_for(|state| state.phase == Phase::Complete)
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(9000));
        assert!(!done.is_playing);
        assert_eq!(done.step_index, 2);
        assert_eq!(done.progress(), 100.);

        // No more ticks once complete.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(demo.state(), done);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticking() {
        let demo = Demo::spawn(TICK);
        let mut updates = demo.updates();
        demo.play();
        updates
            .wait_for(|state| state.progress() >= 50.)
            .await
            .unwrap();
        demo.pause();
        let paused = *updates.wait_for(|state| !state.is_playing).await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(demo.state(), paused);
        assert_eq!(paused.phase, Phase::Auction);

        demo.reset();
        let reset = *updates
            .wait_for(|state| state.phase == Phase::Idle)
            .await
            .unwrap();
        assert_eq!(reset, DemoState::default());
    }
}
