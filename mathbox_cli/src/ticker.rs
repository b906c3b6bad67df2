//! Background task that ticks a birthday countdown on a fixed period.
//!
//! At most one task runs per [`CountdownTicker`]: starting again aborts the
//! previous task, and dropping the ticker aborts whatever is running.

use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use mathbox_core::dates::{BirthdayCountdown, CountdownTick};

#[derive(Debug, Default)]
pub struct CountdownTicker {
    handle: Option<JoinHandle<()>>,
}

impl CountdownTicker {
    pub fn new() -> Self {
        CountdownTicker::default()
    }

    /// Tick `countdown` every `period` using `clock` for the current time.
    ///
    /// The first tick fires immediately. The task ends when the receiver is
    /// dropped. Must be called inside a tokio runtime.
    pub fn start<F>(
        &mut self,
        mut countdown: BirthdayCountdown,
        period: Duration,
        clock: F,
    ) -> mpsc::UnboundedReceiver<CountdownTick>
    where
        F: Fn() -> NaiveDateTime + Send + 'static,
    {
        self.stop();
        let (tx, rx) = mpsc::unbounded_channel();
        debug!(birth = %countdown.birth(), ?period, "countdown started");
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if tx.send(countdown.tick(clock())).is_err() {
                    break;
                }
            }
        }));
        rx
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("countdown stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn birth() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 6, 3).unwrap()
    }

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap()
    }

    #[tokio::test]
    async fn ticks_until_stopped() {
        let mut ticker = CountdownTicker::new();
        let countdown = BirthdayCountdown::new(birth(), fixed_now());
        let mut rx = ticker.start(countdown, Duration::from_millis(5), fixed_now);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.parts.days, 1);
        assert_eq!(first.parts.seconds, 2);
        assert!(rx.recv().await.is_some());
        assert!(ticker.is_running());

        ticker.stop();
        assert!(!ticker.is_running());
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn restart_replaces_running_task() {
        let mut ticker = CountdownTicker::new();
        let mut first = ticker.start(
            BirthdayCountdown::new(birth(), fixed_now()),
            Duration::from_millis(5),
            fixed_now,
        );
        let mut second = ticker.start(
            BirthdayCountdown::new(birth(), fixed_now()),
            Duration::from_millis(5),
            fixed_now,
        );

        // The aborted task dropped its sender
        while first.recv().await.is_some() {}
        assert!(second.recv().await.is_some());
    }

    #[tokio::test]
    async fn celebrates_once() {
        let target = NaiveDate::from_ymd_opt(2025, 6, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut ticker = CountdownTicker::new();
        let countdown = BirthdayCountdown::new(birth(), fixed_now());
        let mut rx = ticker.start(countdown, Duration::from_millis(5), move || target);

        assert!(rx.recv().await.unwrap().celebrate);
        assert!(!rx.recv().await.unwrap().celebrate);
        assert!(!rx.recv().await.unwrap().celebrate);
    }

    #[tokio::test]
    async fn drop_aborts_task() {
        let mut rx = {
            let mut ticker = CountdownTicker::new();
            ticker.start(
                BirthdayCountdown::new(birth(), fixed_now()),
                Duration::from_millis(5),
                fixed_now,
            )
        };
        while rx.recv().await.is_some() {}
    }
}
