//! Concrete navigation flows of the app, built on the `sequence` crate.

pub mod pairing;
pub mod person;
pub mod voice;

pub use pairing::{PairingArgs, PairingOutcome, PairingStep, ProductCatalogSequence};
pub use person::{PersonArgs, PersonOnboardingFlow, PersonOnboardingSequence, PersonStep};
pub use voice::{VoiceArgs, VoiceAssistantFlow, VoiceAssistantSequence, VoiceStep};
