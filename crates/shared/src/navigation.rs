//! Screen identities and the backstack collaborator that owns what is on screen.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A displayable unit. `route` identifies the screen type; `params` carry the
/// flow data the screen was created with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Screen {
    pub route: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl Screen {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_route(&self, route: &str) -> bool {
        self.route == route
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.route)?;
        if !self.params.is_empty() {
            let joined = self
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "[{joined}]")?;
        }
        Ok(())
    }
}

/// The screen-history collaborator. Sequences and popups change what is
/// visible only through this trait; they never render directly.
pub trait Backstack: Send {
    fn navigate_to(&mut self, screen: Screen, add_to_history: bool);
    fn navigate_back(&mut self);
    /// Pops until `screen`'s route is on top. Returns `false` (and leaves the
    /// stack untouched) when the route is not on the stack.
    fn navigate_back_to(&mut self, screen: &Screen) -> bool;
    fn is_screen_on_stack(&self, route: &str) -> bool;
    fn current(&self) -> Option<&Screen>;
}

pub type SharedBackstack = Arc<Mutex<dyn Backstack>>;

/// Locks a shared backstack, recovering the guard if a previous holder panicked.
pub fn lock_backstack(backstack: &SharedBackstack) -> MutexGuard<'_, dyn Backstack + 'static> {
    backstack.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Headless in-process backstack.
///
/// A screen pushed without history replaces the current top instead of
/// stacking on it, matching how the app swaps transient screens.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackstack {
    stack: Vec<Screen>,
    transient_top: bool,
}

impl MemoryBackstack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: Screen) -> Self {
        Self {
            stack: vec![root],
            transient_top: false,
        }
    }

    pub fn into_shared(self) -> Arc<Mutex<MemoryBackstack>> {
        Arc::new(Mutex::new(self))
    }

    pub fn screens(&self) -> &[Screen] {
        &self.stack
    }

    pub fn routes(&self) -> Vec<&str> {
        self.stack.iter().map(|s| s.route.as_str()).collect()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Backstack for MemoryBackstack {
    fn navigate_to(&mut self, screen: Screen, add_to_history: bool) {
        debug!(screen = %screen, add_to_history, "backstack push");
        if self.transient_top {
            self.stack.pop();
        }
        self.stack.push(screen);
        self.transient_top = !add_to_history;
    }

    fn navigate_back(&mut self) {
        let popped = self.stack.pop();
        self.transient_top = false;
        debug!(popped = ?popped.map(|s| s.route), "backstack pop");
    }

    fn navigate_back_to(&mut self, screen: &Screen) -> bool {
        let Some(index) = self.stack.iter().rposition(|s| s.route == screen.route) else {
            return false;
        };
        self.stack.truncate(index + 1);
        self.transient_top = false;
        debug!(screen = %screen, "backstack pop to");
        true
    }

    fn is_screen_on_stack(&self, route: &str) -> bool {
        self.stack.iter().any(|s| s.route == route)
    }

    fn current(&self) -> Option<&Screen> {
        self.stack.last()
    }
}
