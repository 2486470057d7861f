//! Wizard-style navigation through multi-screen flows.
//!
//! A [`SequenceController`] describes one flow as an explicit state machine
//! over its step enum. A [`Sequence`] drives a controller against the
//! backstack: it tracks the active step, records where to return when the
//! flow ends, and hosts nested sub-sequences.

use std::{any::Any, fmt};

use shared::navigation::{Backstack, Screen};

pub mod error;
mod sequence;
pub mod static_sequence;

pub use error::SequenceError;
pub use sequence::{Sequence, SequenceState, DEFAULT_RETURN_ROUTE};
pub use static_sequence::{StaticSequence, StaticSequenceController};

/// Where a sequence navigates when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnTo {
    /// The fallback screen ([`DEFAULT_RETURN_ROUTE`]).
    Default,
    /// A caller-specified destination recorded at start.
    Screen(Screen),
    /// The step of a parent sequence that started this one.
    Resume(Screen),
}

impl ReturnTo {
    pub fn screen(&self) -> Screen {
        match self {
            Self::Default => Screen::new(DEFAULT_RETURN_ROUTE),
            Self::Screen(screen) | Self::Resume(screen) => screen.clone(),
        }
    }
}

pub enum Transition<S> {
    Step(S),
    /// Hand control to another sequence; it returns to the current step when it ends.
    Nested(Box<dyn Sequenceable>),
    End { success: bool },
}

impl<S: fmt::Debug> fmt::Debug for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(step) => f.debug_tuple("Step").field(step).finish(),
            Self::Nested(nested) => f.debug_tuple("Nested").field(&nested.name()).finish(),
            Self::End { success } => f.debug_struct("End").field("success", success).finish(),
        }
    }
}

/// One flow's transition table.
///
/// `Args` is the flow's own tagged set of transition arguments, so each step
/// receives exactly the data it needs.
pub trait SequenceController: Send + 'static {
    type Step: Clone + PartialEq + fmt::Debug + Send + 'static;
    type Args: fmt::Debug + Send;

    fn name(&self) -> &'static str;

    fn first_step(&mut self) -> Result<Self::Step, SequenceError>;

    fn next(
        &mut self,
        from: &Self::Step,
        args: Self::Args,
    ) -> Result<Transition<Self::Step>, SequenceError>;

    /// `None` when `from` is the first step; the driver then ends the sequence
    /// successfully instead of stranding the user.
    fn previous(
        &mut self,
        from: &Self::Step,
        args: Self::Args,
    ) -> Result<Option<Self::Step>, SequenceError>;

    fn screen(&self, step: &Self::Step) -> Screen;

    fn on_end(&mut self, _success: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    NotStarted,
    Active,
    Delegating,
    Ended { success: bool },
}

/// Anything that can take part in a sequence as a unit: in practice another
/// [`Sequence`], started with a back-reference to whoever launched it.
pub trait Sequenceable: Any + Send {
    fn name(&self) -> &'static str;
    fn status(&self) -> SequenceStatus;
    fn start(&mut self, backstack: &mut dyn Backstack, return_to: ReturnTo)
        -> Result<(), SequenceError>;
    fn end(&mut self, backstack: &mut dyn Backstack, success: bool) -> Result<(), SequenceError>;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
