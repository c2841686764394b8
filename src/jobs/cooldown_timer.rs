// ==================== RESEND COOLDOWN ====================
// Minimum interval between verification-email sends, plus the per-second
// countdown published to clients while a cooldown is running.
//
// Both live inside one auth state machine; nothing here is process-global.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant};

pub const DEFAULT_RESEND_COOLDOWN: Duration = Duration::from_secs(30);

/// Timestamp of the last accepted send and the window it opens
#[derive(Debug, Clone, Copy)]
pub struct Cooldown {
    last_resend_at: Option<Instant>,
    duration: Duration,
}

impl Cooldown {
    pub fn new(duration: Duration) -> Self {
        Self {
            last_resend_at: None,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_resend_at {
            Some(at) => (at + self.duration).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        !self.remaining(now).is_zero()
    }

    /// Opens a new window at `now` and returns when it closes
    pub fn start(&mut self, now: Instant) -> Instant {
        self.last_resend_at = Some(now);
        now + self.duration
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(DEFAULT_RESEND_COOLDOWN)
    }
}

/// Background task publishing the milliseconds left until the cooldown ends.
///
/// Restarting aborts the running task, and so does dropping this handle.
pub struct CountdownTask {
    sender: Arc<watch::Sender<u64>>,
    handle: Option<JoinHandle<()>>,
}

impl CountdownTask {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
            handle: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }

    pub fn remaining_ms(&self) -> u64 {
        *self.sender.borrow()
    }

    /// Counts down to `end`, replacing any countdown already running
    pub fn restart(&mut self, end: Instant) {
        self.cancel();
        self.sender
            .send_replace(end.saturating_duration_since(Instant::now()).as_millis() as u64);

        let sender = Arc::clone(&self.sender);
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                let now = Instant::now();
                if now >= end {
                    break;
                }
                sender.send_replace((end - now).as_millis() as u64);
            }
            sender.send_replace(0);
            log::debug!("⏱️  Resend cooldown finished");
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Default for CountdownTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CountdownTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cooldown_window() {
        let mut cooldown = Cooldown::default();
        let t0 = Instant::now();
        assert!(!cooldown.is_active(t0));

        let end = cooldown.start(t0);
        assert_eq!(end, t0 + Duration::from_secs(30));
        assert!(cooldown.is_active(t0 + Duration::from_secs(10)));
        assert_eq!(
            cooldown.remaining(t0 + Duration::from_secs(10)),
            Duration::from_secs(20)
        );
        assert!(!cooldown.is_active(t0 + Duration::from_secs(31)));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_to_zero() {
        let mut task = CountdownTask::new();
        task.restart(Instant::now() + Duration::from_secs(30));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(task.remaining_ms(), 20_000);
        assert!(task.is_running());

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(task.remaining_ms(), 0);
        assert!(!task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_supersedes_previous_countdown() {
        let mut task = CountdownTask::new();
        let now = Instant::now();
        task.restart(now + Duration::from_secs(30));
        task.restart(now + Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(task.remaining_ms(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_task_stops_publishing() {
        let mut task = CountdownTask::new();
        let mut rx = task.subscribe();
        task.restart(Instant::now() + Duration::from_secs(30));
        tokio::task::yield_now().await;

        rx.borrow_and_update();
        drop(task);

        let closed = tokio::time::timeout(Duration::from_secs(5), rx.changed()).await;
        assert!(matches!(closed, Ok(Err(_))));
    }
}
