use std::time::Duration;

use anyhow::{anyhow, Result};
use salesdesk_core::domain::demo::{MultiUserProfile, ScriptedLine};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::runtime::TimingProfile;
use crate::scheduler::ScheduleOutcome;

/// Index of the scripted line after which a session counts as quoted.
const QUOTED_AT_LINE: u32 = 3;

/// `interval_at` rejects a zero period.
const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Quoted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserSession {
    pub id: usize,
    pub profile: MultiUserProfile,
    pub messages: Vec<ScriptedLine>,
    pub status: SessionStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MultiUserTotals {
    pub total_messages: usize,
    pub active: usize,
    pub quoted: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MultiUserTick {
    pub tick: u32,
    pub appended: Vec<(usize, ScriptedLine)>,
    pub totals: MultiUserTotals,
}

/// Several independent scripted customers advanced in lockstep.
pub struct MultiUserDemo {
    profiles: Vec<MultiUserProfile>,
    sessions: Vec<UserSession>,
    ticks: u32,
    max_ticks: u32,
    tick_interval: Duration,
}

impl MultiUserDemo {
    pub fn new(profiles: Vec<MultiUserProfile>, timing: &TimingProfile) -> Self {
        let sessions = fresh_sessions(&profiles);
        Self {
            profiles,
            sessions,
            ticks: 0,
            max_ticks: timing.multi_user_ticks,
            tick_interval: timing.multi_user_tick.max(MIN_TICK),
        }
    }

    pub fn sessions(&self) -> &[UserSession] {
        &self.sessions
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn is_finished(&self) -> bool {
        self.ticks >= self.max_ticks
    }

    pub fn totals(&self) -> MultiUserTotals {
        self.sessions.iter().fold(MultiUserTotals::default(), |mut totals, session| {
            totals.total_messages += session.messages.len();
            match session.status {
                SessionStatus::Active => totals.active += 1,
                SessionStatus::Quoted => totals.quoted += 1,
            }
            totals
        })
    }

    /// Appends the next scripted line to every session. `None` once finished.
    pub fn tick(&mut self) -> Option<MultiUserTick> {
        if self.is_finished() {
            return None;
        }
        let index = self.ticks;
        let mut appended = Vec::new();
        for session in &mut self.sessions {
            if let Some(line) = session.profile.flow.get(index as usize) {
                session.messages.push(line.clone());
                appended.push((session.id, line.clone()));
            }
            if index == QUOTED_AT_LINE {
                session.status = SessionStatus::Quoted;
            }
        }
        self.ticks += 1;

        let totals = self.totals();
        tracing::debug!(
            event_name = "multi_user.tick",
            tick = index,
            total_messages = totals.total_messages,
            quoted = totals.quoted,
            "multi-user sessions advanced"
        );
        Some(MultiUserTick { tick: index, appended, totals })
    }

    pub fn reset(&mut self) {
        self.sessions = fresh_sessions(&self.profiles);
        self.ticks = 0;
    }

    /// Ticks on the configured interval, first tick one interval after start.
    pub async fn run(
        &mut self,
        token: &CancellationToken,
        events: &mpsc::Sender<MultiUserTick>,
    ) -> Result<ScheduleOutcome> {
        let mut interval = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut fired = 0;

        while !self.is_finished() {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(ScheduleOutcome::Cancelled { fired }),
                _ = interval.tick() => {}
            }
            if token.is_cancelled() {
                return Ok(ScheduleOutcome::Cancelled { fired });
            }
            if let Some(tick) = self.tick() {
                events.send(tick).await.map_err(|_| anyhow!("multi-user event receiver dropped"))?;
                fired += 1;
            }
        }
        Ok(ScheduleOutcome::Completed { fired })
    }
}

fn fresh_sessions(profiles: &[MultiUserProfile]) -> Vec<UserSession> {
    profiles
        .iter()
        .enumerate()
        .map(|(id, profile)| UserSession {
            id: id + 1,
            profile: profile.clone(),
            messages: Vec::new(),
            status: SessionStatus::Active,
        })
        .collect()
}
