use crate::services::account_service::AccountFlows;
use crate::services::auth_provider::AuthProviderFactory;
use crate::services::auth_service::AuthMachine;
use crate::services::registration_service::RegistrationFlow;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, Instant};
use uuid::Uuid;

/// Everything one client works with: its auth machine, registration flow and
/// account flows, all sharing a single provider session
pub struct Session {
    pub id: Uuid,
    pub auth: AuthMachine,
    pub registration: RegistrationFlow,
    pub account: AccountFlows,
    last_seen: Instant,
}

impl Session {
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub resend_cooldown: Duration,
    pub password_hash_cost: u32,
}

/// Live sessions by id. Each session is behind its own mutex so one client's
/// operations run one at a time.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
    providers: Arc<dyn AuthProviderFactory>,
    settings: SessionSettings,
}

impl SessionRegistry {
    pub fn new(providers: Arc<dyn AuthProviderFactory>, settings: SessionSettings) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            providers,
            settings,
        }
    }

    pub async fn create(&self) -> Uuid {
        let provider = self.providers.create();
        let id = Uuid::new_v4();

        let session = Session {
            id,
            auth: AuthMachine::new(provider.clone(), self.settings.resend_cooldown),
            registration: RegistrationFlow::new(self.settings.password_hash_cost),
            account: AccountFlows::new(provider),
            last_seen: Instant::now(),
        };

        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        log::info!("🆕 Session created: {}", id);
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Signs the session out and drops it, stopping its countdown task
    pub async fn end(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(session) => {
                session.lock().await.auth.sign_out().await;
                log::info!("👋 Session ended: {}", id);
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Ends every session idle longer than `max_idle`; returns how many were removed
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let snapshot: Vec<(Uuid, Arc<Mutex<Session>>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect();

        let mut expired = Vec::new();
        for (id, session) in snapshot {
            // A locked session is in use right now
            if let Ok(guard) = session.try_lock() {
                if guard.idle_for(now) > max_idle {
                    expired.push(id);
                }
            }
        }

        let mut count = 0;
        for id in expired {
            if self.end(&id).await {
                count += 1;
            }
        }
        count
    }
}
