//! Daily scan scheduling on business days.

use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Longest single sleep; keeps the loop responsive to clock adjustments.
const MAX_SLEEP: StdDuration = StdDuration::from_secs(60);

/// Monday through Friday. Exchange holidays are not modelled.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first instant strictly after `now` whose wall-clock time is `at`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    SkippedWeekend,
    Completed,
    Failed(String),
}

/// Run `job` for `today` unless it falls on a weekend. Job errors are logged
/// and returned, not propagated.
pub fn run_scheduled_scan<F, E>(today: NaiveDate, job: F) -> RunOutcome
where
    F: FnOnce() -> Result<(), E>,
    E: std::fmt::Display,
{
    if !is_business_day(today) {
        tracing::info!(%today, weekday = ?today.weekday(), "weekend, skipping scheduled scan");
        return RunOutcome::SkippedWeekend;
    }
    tracing::info!(%today, "starting scheduled scan");
    match job() {
        Ok(()) => {
            tracing::info!(%today, "scheduled scan finished");
            RunOutcome::Completed
        }
        Err(e) => {
            tracing::error!(%today, "scheduled scan failed: {e}");
            RunOutcome::Failed(e.to_string())
        }
    }
}

/// The scan a schedule command runs before (or instead of) the daily loop.
///
/// `once` always runs immediately for `today`, weekday-gated, and the caller
/// exits afterwards without waiting for a fire time. Returns `None` when no
/// immediate run was asked for.
pub fn run_startup_scan<F, E>(today: NaiveDate, run_now: bool, once: bool, job: F) -> Option<RunOutcome>
where
    F: FnOnce() -> Result<(), E>,
    E: std::fmt::Display,
{
    (run_now || once).then(|| run_scheduled_scan(today, job))
}

/// Fires a job once per day at a fixed local time.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    at: NaiveTime,
}

impl Scheduler {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    pub fn next_fire(&self, now: NaiveDateTime) -> NaiveDateTime {
        next_run_after(now, self.at)
    }

    /// Block until the next fire time, then run the job for that day.
    pub fn wait_and_run<F, E>(&self, job: F) -> RunOutcome
    where
        F: FnOnce() -> Result<(), E>,
        E: std::fmt::Display,
    {
        let target = self.next_fire(Local::now().naive_local());
        tracing::info!(next_run = %target, "waiting for next scheduled scan");
        loop {
            let now = Local::now().naive_local();
            let Ok(remaining) = (target - now).to_std() else {
                break;
            };
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(MAX_SLEEP));
        }
        run_scheduled_scan(target.date(), job)
    }

    /// Run the job every day at the scheduled time, forever.
    pub fn run_forever<F, E>(&self, mut job: F) -> !
    where
        F: FnMut() -> Result<(), E>,
        E: std::fmt::Display,
    {
        loop {
            self.wait_and_run(&mut job);
        }
    }
}
