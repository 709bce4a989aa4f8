//! Built-in links for credential checks.
//!
//! Every link here is a pure predicate over its own configuration and the
//! call's input, except [`Throttling`], which counts requests per identifier.

use crate::domain::model::Role;
use crate::domain::ports::{AccountStore, Middleware};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Clone, Copy)]
pub struct NonEmptyIdentifier;

impl Middleware for NonEmptyIdentifier {
    fn name(&self) -> &str {
        "non_empty_identifier"
    }

    fn check(&self, identifier: &str, _secret: &str) -> bool {
        if identifier.trim().is_empty() {
            tracing::warn!("Identifier must not be empty!");
            return false;
        }
        tracing::debug!(identifier, "identifier present");
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MinSecretLength {
    min_length: usize,
}

impl MinSecretLength {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Middleware for MinSecretLength {
    fn name(&self) -> &str {
        "min_secret_length"
    }

    fn check(&self, identifier: &str, secret: &str) -> bool {
        if secret.chars().count() < self.min_length {
            tracing::warn!(
                identifier,
                min_length = self.min_length,
                "Password is too short!"
            );
            return false;
        }
        true
    }
}

pub struct KnownAccount {
    store: Arc<dyn AccountStore>,
}

impl KnownAccount {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }
}

impl Middleware for KnownAccount {
    fn name(&self) -> &str {
        "known_account"
    }

    fn check(&self, identifier: &str, _secret: &str) -> bool {
        if !self.store.contains(identifier) {
            tracing::warn!(identifier, "This email is not registered!");
            return false;
        }
        true
    }
}

pub struct SecretMatches {
    store: Arc<dyn AccountStore>,
}

impl SecretMatches {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }
}

impl Middleware for SecretMatches {
    fn name(&self) -> &str {
        "secret_matches"
    }

    fn check(&self, identifier: &str, secret: &str) -> bool {
        if !self.store.verify(identifier, secret) {
            tracing::warn!(identifier, "Wrong password!");
            return false;
        }
        true
    }
}

/// Passes only accounts whose role is in the allowed set.
pub struct RoleCheck {
    store: Arc<dyn AccountStore>,
    allowed: Vec<Role>,
}

impl RoleCheck {
    pub fn new(store: Arc<dyn AccountStore>, allowed: Vec<Role>) -> Self {
        Self { store, allowed }
    }
}

impl Middleware for RoleCheck {
    fn name(&self) -> &str {
        "role_check"
    }

    fn check(&self, identifier: &str, _secret: &str) -> bool {
        match self.store.role_of(identifier) {
            Some(role) if self.allowed.contains(&role) => {
                tracing::info!("Hello, {}!", role);
                true
            }
            Some(role) => {
                tracing::warn!(identifier, %role, "Role is not allowed here!");
                false
            }
            None => {
                tracing::warn!(identifier, "No role for unregistered account!");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RequestWindow {
    started: Instant,
    requests: usize,
}

/// Caps requests per identifier within a rolling-reset window.
///
/// The limit comes from the account's role when the store knows it, otherwise
/// from `default_limit`. A window resets once `window` has elapsed since its
/// first request.
pub struct Throttling {
    store: Arc<dyn AccountStore>,
    default_limit: usize,
    role_limits: HashMap<Role, usize>,
    window: Duration,
    windows: Mutex<HashMap<String, RequestWindow>>,
}

impl Throttling {
    pub fn new(store: Arc<dyn AccountStore>, requests_per_window: usize) -> Self {
        Self {
            store,
            default_limit: requests_per_window,
            role_limits: HashMap::new(),
            window: DEFAULT_THROTTLE_WINDOW,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_role_limit(mut self, role: Role, limit: usize) -> Self {
        self.role_limits.insert(role, limit);
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn limit_for(&self, identifier: &str) -> usize {
        self.store
            .role_of(identifier)
            .and_then(|role| self.role_limits.get(&role).copied())
            .unwrap_or(self.default_limit)
    }

    fn admit(&self, identifier: &str, now: Instant) -> bool {
        let limit = self.limit_for(identifier);
        let window = self.window;
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if !windows.contains_key(identifier) {
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = windows
            .entry(identifier.to_string())
            .or_insert(RequestWindow {
                started: now,
                requests: 0,
            });

        if now.saturating_duration_since(entry.started) >= window {
            *entry = RequestWindow {
                started: now,
                requests: 0,
            };
        }

        entry.requests += 1;
        if entry.requests > limit {
            tracing::warn!(identifier, limit, "Request limit exceeded!");
            return false;
        }
        true
    }
}

impl Middleware for Throttling {
    fn name(&self) -> &str {
        "throttling"
    }

    fn check(&self, identifier: &str, _secret: &str) -> bool {
        self.admit(identifier, Instant::now())
    }
}
