//! Environment access and the lifecycle of secrets the task places there.

use std::collections::HashMap;

/// Read/write access to a set of environment variables.
pub trait Environment {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> { std::env::var(key).ok() }

    fn set(&mut self, key: &str, value: &str) {
        // SAFETY: std serialises its own environment accesses, and the task
        // never runs foreign code that reads the environment concurrently.
        unsafe { std::env::set_var(key, value) }
    }

    fn remove(&mut self, key: &str) {
        // SAFETY: see `set`.
        unsafe { std::env::remove_var(key) }
    }
}

/// An in-memory environment, used in tests and dry runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryEnv {
    vars: HashMap<String, String>,
}

impl MemoryEnv {
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl Environment for MemoryEnv {
    fn get(&self, key: &str) -> Option<String> { self.vars.get(key).cloned() }

    fn set(&mut self, key: &str, value: &str) { self.vars.insert(key.to_string(), value.to_string()); }

    fn remove(&mut self, key: &str) { self.vars.remove(key); }
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn get(&self, key: &str) -> Option<String> { (**self).get(key) }

    fn set(&mut self, key: &str, value: &str) { (**self).set(key, value) }

    fn remove(&mut self, key: &str) { (**self).remove(key) }
}

/// Tracks whether the current run wrote a secret into the environment, so it
/// can be removed again on every exit path.
///
/// A value that was already present (and unchanged) is never removed.
#[derive(Debug)]
pub struct SecretLifecycle {
    key:              String,
    injected_by_task: bool,
}

impl SecretLifecycle {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key:              key.into(),
            injected_by_task: false,
        }
    }

    pub fn key(&self) -> &str { &self.key }

    pub fn injected_by_task(&self) -> bool { self.injected_by_task }

    /// Write `value` unless the environment already holds exactly that.
    /// Returns whether the environment was modified.
    pub fn inject<E: Environment + ?Sized>(&mut self, env: &mut E, value: &str) -> bool {
        if env.get(&self.key).as_deref() == Some(value) {
            return false;
        }
        env.set(&self.key, value);
        self.injected_by_task = true;
        tracing::debug!(key = %self.key, "secret placed in environment");
        true
    }

    /// Remove the variable if this run put it there. Idempotent.
    pub fn clear<E: Environment + ?Sized>(&mut self, env: &mut E) {
        if !self.injected_by_task {
            return;
        }
        env.remove(&self.key);
        self.injected_by_task = false;
        tracing::debug!(key = %self.key, "secret removed from environment");
    }
}
