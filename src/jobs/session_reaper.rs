// ==================== SESSION REAPER ====================
// Background job that ends client sessions nobody has touched for a while.
// Ending a session signs it out and drops its auth machine, which aborts any
// cooldown countdown it still had running.

use crate::services::session_service::SessionRegistry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

pub fn start_session_reaper(
    sessions: Arc<SessionRegistry>,
    every: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    log::info!(
        "🧹 Starting session reaper (every {}s, idle limit {}s)",
        every.as_secs(),
        max_idle.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; nothing can be idle yet
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let evicted = sessions.evict_idle(max_idle).await;
            if evicted > 0 {
                log::info!("🧹 Evicted {} idle session(s), {} active", evicted, sessions.len().await);
            } else {
                log::debug!("🧹 No idle sessions ({} active)", sessions.len().await);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session_service::SessionSettings;
    use crate::test_support::{FakeAuthProvider, SharedFakeFactory};

    #[tokio::test(start_paused = true)]
    async fn reaper_evicts_on_schedule() {
        let sessions = Arc::new(SessionRegistry::new(
            Arc::new(SharedFakeFactory(Arc::new(FakeAuthProvider::new()))),
            SessionSettings {
                resend_cooldown: Duration::from_secs(30),
                password_hash_cost: 4,
            },
        ));
        sessions.create().await;

        let handle = start_session_reaper(
            sessions.clone(),
            Duration::from_secs(60),
            Duration::from_secs(120),
        );

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(sessions.len().await, 1);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(sessions.len().await, 0);

        handle.abort();
    }
}
