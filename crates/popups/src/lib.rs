//! Priority-ordered popup arbitration.
//!
//! A [`PopupManager`] owns a fixed list of [`Responsibility`] values, index 0
//! being the highest priority. Each trigger runs one evaluation pass on a
//! dedicated background worker and shows at most one popup.

use std::time::Duration;

use async_trait::async_trait;

pub mod banner;
mod manager;
pub mod responsibilities;
pub mod sources;
pub mod ui;
mod worker;

pub use banner::{can_show, BannerArbiter, BannerDecision, BannerKind};
pub use manager::{PassOutcome, PopupManager, TriggerOutcome};
pub use ui::{UiDispatcher, UiJob, UiQueue};

/// A candidate interstitial: a qualification predicate plus a display action.
#[async_trait]
pub trait Responsibility: Send + Sync {
    /// Stable name used for logging and for [`PopupManager::reset_has_fired`].
    fn kind(&self) -> &'static str;

    /// Whether this responsibility should run now. May hit the network or
    /// local storage. An `Err` is treated as "not qualified".
    async fn qualify(&self) -> anyhow::Result<bool>;

    /// When non-zero, qualification is checked again after this delay and
    /// execution only happens if it still holds.
    fn execution_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn execute(&self);

    fn is_visible(&self) -> bool;

    fn reset_has_fired(&self) {}
}
