use log::{debug, warn};
use serde_json::Value;
use std::sync::RwLock;
use tokio::sync::watch;

pub mod models;
pub mod provider;
pub mod storage;

pub use models::{Session, SessionUser};
pub use provider::SessionProvider;
pub use storage::{FileSystemStorage, SessionStorage};

/// Single source of truth for "who is logged in". The in-memory snapshot is
/// authoritative; the storage port is a best-effort durable backing, so a
/// storage failure never fails the caller.
///
/// Reading before `initialize` has run simply observes a logged-out store.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
    otp_response: RwLock<Option<Value>>,
    epoch: watch::Sender<u64>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        let (epoch, _) = watch::channel(0);

        Self {
            storage,
            current: RwLock::new(None),
            otp_response: RwLock::new(None),
            epoch,
        }
    }

    /// Rehydrates the session from durable storage. A missing or corrupt
    /// blob degrades to logged-out, it never surfaces as an error.
    pub async fn initialize(&self) {
        match self.storage.get().await {
            Ok(Some(blob)) => match serde_json::from_str::<Session>(&blob) {
                Ok(session) => {
                    debug!("session rehydrated from storage");
                    *self.current.write().unwrap() = Some(session);
                    self.notify();
                }
                Err(e) => {
                    warn!("stored session is corrupted, starting logged out: {e}");
                }
            },
            Ok(None) => {
                debug!("no stored session, starting logged out");
            }
            Err(e) => {
                warn!("cannot read stored session, starting logged out: {e}");
            }
        }
    }

    /// Replaces the session in full. The caller is trusted to supply a
    /// session from a completed credential exchange.
    pub async fn login(&self, session: Session) {
        *self.current.write().unwrap() = Some(session.to_owned());
        self.notify();

        match serde_json::to_string(&session) {
            Ok(blob) => {
                if let Err(e) = self.storage.set(blob).await {
                    warn!("persisting session failed, it will not survive a restart: {e}");
                }
            }
            Err(e) => {
                warn!("cannot serialize session for persistence: {e}");
            }
        }
    }

    /// Clears the session and any pending OTP artifact. Idempotent.
    pub async fn logout(&self) {
        *self.current.write().unwrap() = None;
        *self.otp_response.write().unwrap() = None;
        self.notify();

        if let Err(e) = self.storage.remove().await {
            warn!("removing persisted session failed: {e}");
        }
    }

    /// Synchronous snapshot of the current session.
    pub fn read(&self) -> Option<Session> {
        self.current.read().unwrap().to_owned()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().map(|s| s.access_token)
    }

    /// Transient one-time-passcode exchange artifact. Never persisted,
    /// cleared on logout.
    pub fn set_otp_response(&self, otp: Option<Value>) {
        *self.otp_response.write().unwrap() = otp;
    }

    pub fn otp_response(&self) -> Option<Value> {
        self.otp_response.read().unwrap().to_owned()
    }

    /// Receiver bumped on every login/logout.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.epoch.subscribe()
    }

    fn notify(&self) {
        self.epoch.send_modify(|v| *v += 1);
    }
}
