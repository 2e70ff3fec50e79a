//! Ordered, cancellable timer steps.
//!
//! A [`Schedule`] is a list of `(offset, action)` pairs measured from the moment
//! the schedule starts running. One loop drives the whole list; the
//! [`CancellationToken`] is checked before every action, so once a session is
//! reset or torn down no later step fires. There is no pause/resume: a
//! cancelled schedule is discarded and a fresh one is built.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledStep<A> {
    pub at: Duration,
    pub action: A,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule<A> {
    steps: Vec<ScheduledStep<A>>,
}

impl<A> Default for Schedule<A> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Completed { fired: usize },
    Cancelled { fired: usize },
}

impl ScheduleOutcome {
    pub fn fired(&self) -> usize {
        match self {
            Self::Completed { fired } | Self::Cancelled { fired } => *fired,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl<A> Schedule<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a step at `at` from start. Steps sharing an offset keep insertion order.
    pub fn at(mut self, at: Duration, action: A) -> Self {
        let position = self.steps.partition_point(|step| step.at <= at);
        self.steps.insert(position, ScheduledStep { at, action });
        self
    }

    pub fn steps(&self) -> &[ScheduledStep<A>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run<F, Fut>(self, token: &CancellationToken, mut fire: F) -> ScheduleOutcome
    where
        F: FnMut(A) -> Fut,
        Fut: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut fired = 0;

        for step in self.steps {
            tokio::select! {
                biased;
                _ = token.cancelled() => return ScheduleOutcome::Cancelled { fired },
                _ = sleep_until(started + step.at) => {}
            }
            if token.is_cancelled() {
                return ScheduleOutcome::Cancelled { fired };
            }
            fire(step.action).await;
            fired += 1;
        }

        ScheduleOutcome::Completed { fired }
    }
}

/// Cancellable sleep. Returns `false` when the token fired first.
pub async fn pause(token: &CancellationToken, duration: Duration) -> bool {
    if duration.is_zero() {
        return !token.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::{pause, Schedule, ScheduleOutcome};

    #[test]
    fn steps_are_kept_in_offset_order() {
        let schedule = Schedule::new()
            .at(Duration::from_millis(900), "c")
            .at(Duration::from_millis(100), "a")
            .at(Duration::from_millis(500), "b")
            .at(Duration::from_millis(500), "b2");

        let order: Vec<&str> = schedule.steps().iter().map(|step| step.action).collect();
        assert_eq!(order, vec!["a", "b", "b2", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn all_steps_fire_in_order_when_not_cancelled() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let schedule = (0..3u64).fold(Schedule::new(), |schedule, index| {
            schedule.at(Duration::from_millis(500 + index * 800), index)
        });

        let sink = Arc::clone(&fired);
        let outcome = schedule
            .run(&CancellationToken::new(), |index| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().expect("lock").push(index);
                }
            })
            .await;

        assert_eq!(outcome, ScheduleOutcome::Completed { fired: 3 });
        assert_eq!(*fired.lock().expect("lock"), vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_schedule_fires_no_further_actions() {
        let token = CancellationToken::new();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let schedule = Schedule::new()
            .at(Duration::from_millis(100), 1)
            .at(Duration::from_millis(1_000), 2)
            .at(Duration::from_millis(2_000), 3);

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });

        let sink = Arc::clone(&fired);
        let outcome = schedule
            .run(&token, |value| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().expect("lock").push(value);
                }
            })
            .await;

        assert_eq!(outcome, ScheduleOutcome::Cancelled { fired: 1 });
        assert!(outcome.is_cancelled());
        assert_eq!(*fired.lock().expect("lock"), vec![1]);
    }

    #[tokio::test]
    async fn already_cancelled_token_fires_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let outcome = Schedule::new()
            .at(Duration::ZERO, ())
            .run(&token, |_| async {})
            .await;

        assert_eq!(outcome.fired(), 0);
        assert!(!pause(&token, Duration::from_millis(10)).await);
        assert!(!pause(&token, Duration::ZERO).await);
    }
}
