//! Voice-assistant account linking, launched from inside device pairing.

use sequence::{Sequence, StaticSequence, StaticSequenceController};
use shared::{domain::VoiceAssistant, navigation::Screen};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStep {
    Intro,
    LinkAccount,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceArgs {
    None,
    AccountLinked { account: String },
}

#[derive(Debug)]
pub struct VoiceAssistantFlow {
    assistant: VoiceAssistant,
    linked_account: Option<String>,
    outcome: Option<bool>,
}

pub type VoiceAssistantSequence = Sequence<StaticSequenceController<VoiceAssistantFlow>>;

impl VoiceAssistantFlow {
    pub fn new(assistant: VoiceAssistant) -> Self {
        Self {
            assistant,
            linked_account: None,
            outcome: None,
        }
    }

    pub fn sequence(assistant: VoiceAssistant) -> VoiceAssistantSequence {
        StaticSequenceController::new(Self::new(assistant)).into_sequence()
    }

    pub fn assistant(&self) -> VoiceAssistant {
        self.assistant
    }

    pub fn linked_account(&self) -> Option<&str> {
        self.linked_account.as_deref()
    }

    pub fn outcome(&self) -> Option<bool> {
        self.outcome
    }

    fn assistant_slug(&self) -> &'static str {
        match self.assistant {
            VoiceAssistant::Alexa => "alexa",
            VoiceAssistant::GoogleAssistant => "google",
        }
    }
}

impl StaticSequence for VoiceAssistantFlow {
    type Step = VoiceStep;
    type Args = VoiceArgs;

    fn name(&self) -> &'static str {
        "voice-assistant"
    }

    fn steps(&self) -> &'static [VoiceStep] {
        &[VoiceStep::Intro, VoiceStep::LinkAccount, VoiceStep::Complete]
    }

    fn new_instance_of(&self, step: VoiceStep) -> Screen {
        let route = match step {
            VoiceStep::Intro => "voice/intro",
            VoiceStep::LinkAccount => "voice/link-account",
            VoiceStep::Complete => "voice/complete",
        };
        let screen = Screen::new(route).with_param("assistant", self.assistant_slug());
        match (&self.linked_account, step) {
            (Some(account), VoiceStep::Complete) => screen.with_param("account", account),
            _ => screen,
        }
    }

    fn absorb(&mut self, args: VoiceArgs) {
        if let VoiceArgs::AccountLinked { account } = args {
            self.linked_account = Some(account);
        }
    }

    fn on_end(&mut self, success: bool) {
        info!(
            assistant = self.assistant_slug(),
            linked = self.linked_account.is_some(),
            success,
            "voice assistant flow finished"
        );
        self.outcome = Some(success);
    }
}
