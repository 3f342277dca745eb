use std::collections::HashMap;

use parking_lot::Mutex;

use crate::rates::ConversionResult;

pub type UserId = i64;

#[derive(Debug, Clone)]
pub struct UserSession {
    pub base_currency: String,
    pub history: Vec<ConversionResult>,
}

/// Per-user state, created on first touch and kept for the life of the process.
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, UserSession>>,
    default_base: String,
}

impl SessionStore {
    pub fn new(default_base: &str) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            default_base: default_base.to_owned(),
        }
    }

    /// Runs `f` against the user's session, creating it first if needed.
    /// The lock is held for the duration of `f`, so keep it synchronous and short.
    pub fn with_session<R>(&self, user: UserId, f: impl FnOnce(&mut UserSession) -> R) -> R {
        let mut sessions = self.sessions.lock();
        let session = sessions.entry(user).or_insert_with(|| UserSession {
            base_currency: self.default_base.clone(),
            history: Vec::new(),
        });
        f(session)
    }

    pub fn base_currency(&self, user: UserId) -> String {
        self.with_session(user, |s| s.base_currency.clone())
    }

    pub fn set_base_currency(&self, user: UserId, code: &str) {
        self.with_session(user, |s| s.base_currency = code.to_owned())
    }

    pub fn record_conversion(&self, user: UserId, result: ConversionResult) {
        self.with_session(user, |s| s.history.push(result))
    }

    /// Most recent conversions first.
    pub fn history(&self, user: UserId, limit: usize) -> Vec<ConversionResult> {
        self.with_session(user, |s| s.history.iter().rev().take(limit).cloned().collect())
    }

    pub fn reset(&self, user: UserId) {
        self.sessions.lock().remove(&user);
    }
}
