//! Stock popup responsibilities built from declarative requirements.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::ServiceTier,
    navigation::{lock_backstack, Screen, SharedBackstack},
};
use tracing::info;

use crate::{sources::QualificationSource, Responsibility};

pub const INVITATION: &str = "invitation";
pub const CARE_WHATS_NEW: &str = "care_whats_new";
pub const PLAN_UPSELL: &str = "plan_upsell";
pub const RATE_APP: &str = "rate_app";

const INVITATION_DISMISSED: &str = "invitation.dismissed";
const CARE_WHATS_NEW_SEEN: &str = "care.whats_new.seen";
const PLAN_UPSELL_DISMISSED: &str = "upsell.dismissed";
const RATE_APP_DISMISSED: &str = "rate_app.dismissed";

/// Preference recording that the user dismissed a dashboard popup of `kind`.
pub fn dismissal_preference(kind: &str) -> Option<&'static str> {
    match kind {
        INVITATION => Some(INVITATION_DISMISSED),
        CARE_WHATS_NEW => Some(CARE_WHATS_NEW_SEEN),
        PLAN_UPSELL => Some(PLAN_UPSELL_DISMISSED),
        RATE_APP => Some(RATE_APP_DISMISSED),
        _ => None,
    }
}

/// One condition a [`ShowOnceResponsibility`] needs before it qualifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// The user has not set (dismissed) this preference.
    PreferenceUnset(String),
    FeatureEnabled(String),
    TierIs(ServiceTier),
    TierIsNot(ServiceTier),
    PendingInvitations,
}

impl Requirement {
    async fn holds(&self, source: &dyn QualificationSource) -> anyhow::Result<bool> {
        Ok(match self {
            Self::PreferenceUnset(key) => !source.preference(key).await?,
            Self::FeatureEnabled(flag) => source.feature_enabled(flag).await?,
            Self::TierIs(tier) => source.service_tier().await? == *tier,
            Self::TierIsNot(tier) => source.service_tier().await? != *tier,
            Self::PendingInvitations => source.pending_invitations().await? > 0,
        })
    }
}

/// An interstitial shown at most once until reset, as long as all of its
/// requirements hold. Executing pushes its screen onto the shared backstack.
pub struct ShowOnceResponsibility {
    kind: &'static str,
    screen: Screen,
    delay: Duration,
    requirements: Vec<Requirement>,
    source: Arc<dyn QualificationSource>,
    backstack: SharedBackstack,
    has_fired: AtomicBool,
}

impl ShowOnceResponsibility {
    pub fn new(
        kind: &'static str,
        screen: Screen,
        source: Arc<dyn QualificationSource>,
        backstack: SharedBackstack,
    ) -> Self {
        Self {
            kind,
            screen,
            delay: Duration::ZERO,
            requirements: Vec::new(),
            source,
            backstack,
            has_fired: AtomicBool::new(false),
        }
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn has_fired(&self) -> bool {
        self.has_fired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Responsibility for ShowOnceResponsibility {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn qualify(&self) -> anyhow::Result<bool> {
        if self.has_fired() {
            return Ok(false);
        }
        for requirement in &self.requirements {
            if !requirement.holds(self.source.as_ref()).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn execution_delay(&self) -> Duration {
        self.delay
    }

    fn execute(&self) {
        self.has_fired.store(true, Ordering::SeqCst);
        info!(responsibility = self.kind, screen = %self.screen, "showing popup");
        lock_backstack(&self.backstack).navigate_to(self.screen.clone(), true);
    }

    fn is_visible(&self) -> bool {
        lock_backstack(&self.backstack).is_screen_on_stack(&self.screen.route)
    }

    fn reset_has_fired(&self) {
        self.has_fired.store(false, Ordering::SeqCst);
    }
}

/// The dashboard's popups, highest priority first.
pub fn dashboard_responsibilities(
    source: Arc<dyn QualificationSource>,
    backstack: SharedBackstack,
    upsell_delay: Duration,
) -> Vec<Arc<dyn Responsibility>> {
    let invitation = ShowOnceResponsibility::new(
        INVITATION,
        Screen::new("popup/invitation"),
        Arc::clone(&source),
        Arc::clone(&backstack),
    )
    .requires(Requirement::PendingInvitations)
    .requires(Requirement::PreferenceUnset(INVITATION_DISMISSED.into()));

    let care = ShowOnceResponsibility::new(
        CARE_WHATS_NEW,
        Screen::new("popup/care-whats-new"),
        Arc::clone(&source),
        Arc::clone(&backstack),
    )
    .requires(Requirement::FeatureEnabled("care_behaviors".into()))
    .requires(Requirement::PreferenceUnset(CARE_WHATS_NEW_SEEN.into()));

    let upsell = ShowOnceResponsibility::new(
        PLAN_UPSELL,
        Screen::new("popup/plan-upsell"),
        Arc::clone(&source),
        Arc::clone(&backstack),
    )
    .requires(Requirement::TierIs(ServiceTier::Basic))
    .requires(Requirement::PreferenceUnset(PLAN_UPSELL_DISMISSED.into()))
    .with_delay(upsell_delay);

    let rate_app = ShowOnceResponsibility::new(
        RATE_APP,
        Screen::new("popup/rate-app"),
        source,
        backstack,
    )
    .requires(Requirement::FeatureEnabled("rate_app_prompt".into()))
    .requires(Requirement::PreferenceUnset(RATE_APP_DISMISSED.into()));

    vec![
        Arc::new(invitation),
        Arc::new(care),
        Arc::new(upsell),
        Arc::new(rate_app),
    ]
}

#[cfg(test)]
#[path = "tests/responsibilities_tests.rs"]
mod tests;
