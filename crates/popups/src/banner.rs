//! Banner priority overlay.
//!
//! Banners share a single slot. A banner may be shown only when nothing of
//! equal or higher priority is displayed. The decision is synchronous and
//! depends only on the displayed set and the requested kind.

use std::collections::BTreeSet;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BannerKind {
    NoHubConnection,
    NoInternetConnection,
    EarlyWarning,
    Invitation,
    ServiceSuspended,
    ConfigureDevice,
    UpdateServicePlan,
    FirmwareUpdating,
    LowBattery,
}

impl BannerKind {
    pub const ALL: [BannerKind; 9] = [
        BannerKind::NoHubConnection,
        BannerKind::NoInternetConnection,
        BannerKind::EarlyWarning,
        BannerKind::Invitation,
        BannerKind::ServiceSuspended,
        BannerKind::ConfigureDevice,
        BannerKind::UpdateServicePlan,
        BannerKind::FirmwareUpdating,
        BannerKind::LowBattery,
    ];

    /// Priority tier, 0 being the highest. Kinds in the same tier block each other.
    pub fn priority(self) -> u8 {
        match self {
            Self::NoHubConnection | Self::NoInternetConnection => 0,
            Self::EarlyWarning => 1,
            Self::Invitation => 2,
            Self::ServiceSuspended => 3,
            Self::ConfigureDevice => 4,
            Self::UpdateServicePlan => 5,
            Self::FirmwareUpdating | Self::LowBattery => 6,
        }
    }

    pub fn blocks(self, requested: BannerKind) -> bool {
        self.priority() <= requested.priority()
    }
}

pub fn can_show(displayed: impl IntoIterator<Item = BannerKind>, requested: BannerKind) -> bool {
    displayed.into_iter().all(|shown| !shown.blocks(requested))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerDecision {
    /// `evicted` lists the lower-priority banners that gave up the slot.
    Show { evicted: Vec<BannerKind> },
    Suppressed { by: BannerKind },
}

impl BannerDecision {
    pub fn is_shown(&self) -> bool {
        matches!(self, Self::Show { .. })
    }
}

#[derive(Debug, Default, Clone)]
pub struct BannerArbiter {
    displayed: BTreeSet<BannerKind>,
}

impl BannerArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, kind: BannerKind) -> BannerDecision {
        if let Some(blocker) = self.displayed.iter().copied().find(|shown| shown.blocks(kind)) {
            debug!(requested = ?kind, blocked_by = ?blocker, "banner suppressed");
            return BannerDecision::Suppressed { by: blocker };
        }

        let evicted: Vec<BannerKind> = self.displayed.iter().copied().collect();
        self.displayed.clear();
        self.displayed.insert(kind);
        debug!(shown = ?kind, evicted = ?evicted, "banner shown");
        BannerDecision::Show { evicted }
    }

    pub fn dismiss(&mut self, kind: BannerKind) -> bool {
        self.displayed.remove(&kind)
    }

    pub fn is_displayed(&self, kind: BannerKind) -> bool {
        self.displayed.contains(&kind)
    }

    pub fn displayed(&self) -> impl Iterator<Item = BannerKind> + '_ {
        self.displayed.iter().copied()
    }

    pub fn clear(&mut self) {
        self.displayed.clear();
    }
}

#[cfg(test)]
#[path = "tests/banner_tests.rs"]
mod tests;
