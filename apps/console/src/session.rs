//! Composition root: one signed-in session and the managers it owns.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::Context;
use popups::{
    responsibilities::{dashboard_responsibilities, dismissal_preference},
    sources::{JsonPreferenceStore, LocalQualificationSource, PreferenceStore},
    BannerArbiter, BannerDecision, BannerKind, PassOutcome, PopupManager, UiQueue,
};
use shared::navigation::{Backstack, MemoryBackstack, Screen, SharedBackstack};
use tracing::{debug, info};

use crate::config::Settings;

pub const DASHBOARD_ROUTE: &str = "dashboard";

/// How often the console drains the UI queue while a popup pass runs.
const UI_PUMP_INTERVAL: Duration = Duration::from_millis(5);

/// Backstack that traces every navigation before applying it.
#[derive(Debug, Default)]
pub struct LoggingBackstack {
    inner: MemoryBackstack,
}

impl LoggingBackstack {
    pub fn with_root(root: Screen) -> Self {
        Self {
            inner: MemoryBackstack::with_root(root),
        }
    }

    pub fn routes(&self) -> Vec<String> {
        self.inner.routes().into_iter().map(str::to_string).collect()
    }
}

impl Backstack for LoggingBackstack {
    fn navigate_to(&mut self, screen: Screen, add_to_history: bool) {
        info!(screen = %screen, add_to_history, "navigate");
        self.inner.navigate_to(screen, add_to_history);
    }

    fn navigate_back(&mut self) {
        info!(from = ?self.inner.current().map(|s| s.route.as_str()), "navigate back");
        self.inner.navigate_back();
    }

    fn navigate_back_to(&mut self, screen: &Screen) -> bool {
        let found = self.inner.navigate_back_to(screen);
        info!(screen = %screen, found, "navigate back to");
        found
    }

    fn is_screen_on_stack(&self, route: &str) -> bool {
        self.inner.is_screen_on_stack(route)
    }

    fn current(&self) -> Option<&Screen> {
        self.inner.current()
    }
}

pub struct Session {
    backstack: Arc<Mutex<LoggingBackstack>>,
    source: Arc<LocalQualificationSource>,
    ui: UiQueue,
    popups: PopupManager,
    banners: BannerArbiter,
}

impl Session {
    /// Builds a session whose preferences live in the JSON file named by
    /// `settings`.
    pub fn open(settings: &Settings) -> anyhow::Result<Self> {
        let store = JsonPreferenceStore::open(&settings.preferences_path).with_context(|| {
            format!(
                "failed to open preferences '{}'",
                settings.preferences_path.display()
            )
        })?;
        Self::with_preferences(settings, Arc::new(store))
    }

    pub fn with_preferences(
        settings: &Settings,
        preferences: Arc<dyn PreferenceStore>,
    ) -> anyhow::Result<Self> {
        let backstack = Arc::new(Mutex::new(LoggingBackstack::with_root(Screen::new(
            DASHBOARD_ROUTE,
        ))));
        let source = Arc::new(
            LocalQualificationSource::new(preferences, settings.service_tier)
                .with_features(settings.feature_flags.iter().cloned()),
        );
        let ui = UiQueue::new();
        let shared: SharedBackstack = backstack.clone();
        let popups = PopupManager::new(
            DASHBOARD_ROUTE,
            dashboard_responsibilities(source.clone(), shared, settings.popup_delay()),
            ui.dispatcher(),
        )?;
        info!(
            tier = ?settings.service_tier,
            flags = ?settings.feature_flags,
            popups = ?popups.responsibility_kinds(),
            "session ready"
        );

        Ok(Self {
            backstack,
            source,
            ui,
            popups,
            banners: BannerArbiter::new(),
        })
    }

    pub fn backstack(&self) -> MutexGuard<'_, LoggingBackstack> {
        self.backstack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn popups(&self) -> &PopupManager {
        &self.popups
    }

    /// Returns to the dashboard and runs one popup pass to completion. The UI
    /// queue is drained while waiting, since a delayed popup only settles
    /// once its execution has run.
    pub async fn visit_dashboard(&self) -> Option<PassOutcome> {
        self.backstack()
            .navigate_back_to(&Screen::new(DASHBOARD_ROUTE));
        self.popups.trigger_popups();
        let mut ran = 0;
        let outcome = loop {
            tokio::select! {
                outcome = self.popups.wait_idle() => break outcome,
                _ = tokio::time::sleep(UI_PUMP_INTERVAL) => ran += self.ui.run_pending(),
            }
        };
        ran += self.ui.run_pending();
        debug!(outcome = ?outcome, ui_jobs = ran, "dashboard visit settled");
        outcome
    }

    /// Closes the popup on top and remembers that the user dismissed it.
    pub fn dismiss_popup(&self, kind: &str) -> anyhow::Result<()> {
        self.backstack().navigate_back();
        if let Some(key) = dismissal_preference(kind) {
            self.source
                .preferences()
                .set(key, true)
                .with_context(|| format!("failed to store dismissal of '{kind}'"))?;
        }
        info!(popup = kind, "popup dismissed");
        Ok(())
    }

    pub fn request_banner(&mut self, kind: BannerKind) -> BannerDecision {
        let decision = self.banners.request(kind);
        info!(banner = ?kind, decision = ?decision, "banner requested");
        decision
    }

    pub fn dismiss_banner(&mut self, kind: BannerKind) -> bool {
        let dismissed = self.banners.dismiss(kind);
        debug!(banner = ?kind, dismissed, "banner dismissed");
        dismissed
    }

    pub fn banners(&self) -> &BannerArbiter {
        &self.banners
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
