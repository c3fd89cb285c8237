//! "Is searching" indicator
//!
//! The flag goes up as soon as a non-empty term arrives and drops once no
//! new term has arrived for the settle delay. It is purely cosmetic: results
//! are computed immediately and never wait on it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Default settle delay before the indicator clears
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(150);

pub struct SearchActivity {
    delay: Duration,
    flag: Arc<watch::Sender<bool>>,
    pending: Option<JoinHandle<()>>,
}

impl SearchActivity {
    pub fn new(delay: Duration) -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            delay,
            flag: Arc::new(flag),
            pending: None,
        }
    }

    pub fn is_searching(&self) -> bool {
        *self.flag.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.flag.subscribe()
    }

    /// Record a new term; a later term supersedes the running timer
    ///
    /// Must be called from within a tokio runtime.
    pub fn notify(&mut self, term: &str) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }

        if term.trim().is_empty() {
            self.flag.send_replace(false);
            return;
        }

        self.flag.send_replace(true);
        log::debug!("Searching '{}'", term.trim());

        let flag = Arc::clone(&self.flag);
        let deadline = Instant::now() + self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            flag.send_replace(false);
            log::debug!("Search settled");
        }));
    }
}

impl Drop for SearchActivity {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }
}
