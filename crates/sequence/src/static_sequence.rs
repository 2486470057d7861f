//! Table-driven sequences: a fixed, ordered list of steps known up front.

use std::fmt;

use shared::navigation::Screen;

use crate::{Sequence, SequenceController, SequenceError, Transition};

/// A flow declared as an ordered step table. Navigation is derived from each
/// step's position; flows only describe how to build each step's screen.
pub trait StaticSequence: Send + 'static {
    type Step: Copy + PartialEq + fmt::Debug + Send + 'static;
    type Args: fmt::Debug + Send;

    fn name(&self) -> &'static str;

    fn steps(&self) -> &'static [Self::Step];

    /// Builds the screen for `step`, injecting any flow data it needs.
    fn new_instance_of(&self, step: Self::Step) -> Screen;

    /// Folds transition arguments into the flow's accumulated data.
    fn absorb(&mut self, _args: Self::Args) {}

    fn on_end(&mut self, _success: bool) {}
}

pub struct StaticSequenceController<T> {
    flow: T,
}

impl<T: StaticSequence> StaticSequenceController<T> {
    pub fn new(flow: T) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &T {
        &self.flow
    }

    pub fn into_sequence(self) -> Sequence<Self> {
        Sequence::new(self)
    }

    fn index_of(&self, step: &T::Step) -> Result<usize, SequenceError> {
        self.flow
            .steps()
            .iter()
            .position(|candidate| candidate == step)
            .ok_or_else(|| SequenceError::UnknownStep {
                flow: self.flow.name(),
                step: format!("{step:?}"),
            })
    }
}

impl<T: StaticSequence> SequenceController for StaticSequenceController<T> {
    type Step = T::Step;
    type Args = T::Args;

    fn name(&self) -> &'static str {
        self.flow.name()
    }

    fn first_step(&mut self) -> Result<T::Step, SequenceError> {
        self.flow
            .steps()
            .first()
            .copied()
            .ok_or(SequenceError::Empty {
                flow: self.flow.name(),
            })
    }

    fn next(&mut self, from: &T::Step, args: T::Args) -> Result<Transition<T::Step>, SequenceError> {
        let index = self.index_of(from)?;
        self.flow.absorb(args);
        Ok(match self.flow.steps().get(index + 1) {
            Some(step) => Transition::Step(*step),
            None => Transition::End { success: true },
        })
    }

    fn previous(&mut self, from: &T::Step, args: T::Args) -> Result<Option<T::Step>, SequenceError> {
        let index = self.index_of(from)?;
        self.flow.absorb(args);
        Ok(index
            .checked_sub(1)
            .and_then(|prev| self.flow.steps().get(prev).copied()))
    }

    fn screen(&self, step: &T::Step) -> Screen {
        self.flow.new_instance_of(*step)
    }

    fn on_end(&mut self, success: bool) {
        self.flow.on_end(success);
    }
}

#[cfg(test)]
#[path = "tests/static_sequence_tests.rs"]
mod tests;
