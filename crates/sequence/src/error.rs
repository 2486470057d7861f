use thiserror::Error;

/// Navigation failures. All of them indicate miswired flows rather than
/// user-facing conditions; callers should propagate them, not recover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("sequence {flow} is already started")]
    AlreadyStarted { flow: &'static str },
    #[error("sequence {flow} has not been started")]
    NotStarted { flow: &'static str },
    #[error("sequence {flow} has already ended")]
    Ended { flow: &'static str },
    #[error("sequence {flow} declares no steps")]
    Empty { flow: &'static str },
    #[error("bug! {flow} has no transition from step {step}")]
    UnknownStep { flow: &'static str, step: String },
    #[error("bug! {flow} navigated from {from} but the active step is {active}")]
    UnexpectedStep {
        flow: &'static str,
        from: String,
        active: String,
    },
    #[error("bug! {flow} step {step} cannot take arguments {args}")]
    UnexpectedArgs {
        flow: &'static str,
        step: String,
        args: String,
    },
    #[error("sequence {flow} is waiting on nested sequence {nested}")]
    NestedActive {
        flow: &'static str,
        nested: &'static str,
    },
    #[error("sequence {flow} is not running a nested sequence")]
    NotDelegating { flow: &'static str },
}

impl SequenceError {
    pub fn unexpected_args(
        flow: &'static str,
        step: &impl std::fmt::Debug,
        args: &impl std::fmt::Debug,
    ) -> Self {
        Self::UnexpectedArgs {
            flow,
            step: format!("{step:?}"),
            args: format!("{args:?}"),
        }
    }

    /// Errors produced by flow wiring mistakes (as opposed to lifecycle misuse).
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            Self::UnknownStep { .. }
                | Self::UnexpectedStep { .. }
                | Self::UnexpectedArgs { .. }
                | Self::Empty { .. }
        )
    }
}
