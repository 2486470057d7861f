use std::any::Any;

use shared::navigation::{Backstack, Screen};
use tracing::{debug, error, info};

use crate::{
    ReturnTo, SequenceController, SequenceError, SequenceStatus, Sequenceable, Transition,
};

/// Screen a sequence falls back to when no return destination was recorded.
pub const DEFAULT_RETURN_ROUTE: &str = "dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceState<S> {
    NotStarted,
    Active(S),
    /// A nested sequence is running on top of this step.
    Delegating(S),
    Ended { success: bool },
}

/// Drives one in-progress flow. Created when the flow starts and discarded
/// once it ends; every navigation call after the end is rejected.
pub struct Sequence<C: SequenceController> {
    controller: C,
    state: SequenceState<C::Step>,
    return_to: ReturnTo,
    nested: Option<Box<dyn Sequenceable>>,
}

impl<C: SequenceController> Sequence<C> {
    pub fn new(controller: C) -> Self {
        Self {
            controller,
            state: SequenceState::NotStarted,
            return_to: ReturnTo::Default,
            nested: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.controller.name()
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn state(&self) -> &SequenceState<C::Step> {
        &self.state
    }

    pub fn return_to(&self) -> &ReturnTo {
        &self.return_to
    }

    pub fn current_step(&self) -> Option<&C::Step> {
        match &self.state {
            SequenceState::Active(step) | SequenceState::Delegating(step) => Some(step),
            SequenceState::NotStarted | SequenceState::Ended { .. } => None,
        }
    }

    pub fn current_screen(&self) -> Option<Screen> {
        self.current_step().map(|step| self.controller.screen(step))
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, SequenceState::Ended { .. })
    }

    /// Pushes the first step. Only valid before the sequence has started.
    pub fn start_sequence(
        &mut self,
        backstack: &mut dyn Backstack,
        return_to: ReturnTo,
    ) -> Result<(), SequenceError> {
        let flow = self.name();
        match self.state {
            SequenceState::NotStarted => {}
            SequenceState::Ended { .. } => return Err(self.reject(SequenceError::Ended { flow })),
            SequenceState::Active(_) | SequenceState::Delegating(_) => {
                return Err(self.reject(SequenceError::AlreadyStarted { flow }));
            }
        }

        let first = self.controller.first_step().map_err(|e| self.reject(e))?;
        info!(
            flow,
            step = ?first,
            return_to = %self.return_to_label(&return_to),
            "starting sequence"
        );
        backstack.navigate_to(self.controller.screen(&first), true);
        self.return_to = return_to;
        self.state = SequenceState::Active(first);
        Ok(())
    }

    /// Leaves `from` (which must be the active step) and applies whatever the
    /// controller decides comes next.
    pub fn go_next(
        &mut self,
        backstack: &mut dyn Backstack,
        from: &C::Step,
        args: C::Args,
    ) -> Result<(), SequenceError> {
        self.ensure_active(from)?;
        debug!(flow = self.name(), from = ?from, args = ?args, "sequence next");

        let transition = self.controller.next(from, args).map_err(|e| self.reject(e))?;
        match transition {
            Transition::Step(step) => {
                backstack.navigate_to(self.controller.screen(&step), true);
                self.state = SequenceState::Active(step);
                Ok(())
            }
            Transition::Nested(mut nested) => {
                let resume = self.controller.screen(from);
                nested.start(backstack, ReturnTo::Resume(resume))?;
                info!(
                    flow = self.name(),
                    nested = nested.name(),
                    "delegating to nested sequence"
                );
                self.state = SequenceState::Delegating(from.clone());
                self.nested = Some(nested);
                Ok(())
            }
            Transition::End { success } => self.end_sequence(backstack, success),
        }
    }

    /// Steps back from `from`. With no earlier step the sequence ends
    /// successfully.
    pub fn go_back(
        &mut self,
        backstack: &mut dyn Backstack,
        from: &C::Step,
        args: C::Args,
    ) -> Result<(), SequenceError> {
        self.ensure_active(from)?;
        debug!(flow = self.name(), from = ?from, args = ?args, "sequence back");

        match self.controller.previous(from, args).map_err(|e| self.reject(e))? {
            Some(step) => {
                backstack.navigate_back();
                self.state = SequenceState::Active(step);
                Ok(())
            }
            None => self.end_sequence(backstack, true),
        }
    }

    /// Terminal transition: navigates back to the recorded return destination,
    /// or the default screen when none was given. A destination that is not
    /// on the stack is pushed without history.
    pub fn end_sequence(
        &mut self,
        backstack: &mut dyn Backstack,
        success: bool,
    ) -> Result<(), SequenceError> {
        let flow = self.name();
        match self.state {
            SequenceState::NotStarted => {
                return Err(self.reject(SequenceError::NotStarted { flow }));
            }
            SequenceState::Ended { .. } => return Err(self.reject(SequenceError::Ended { flow })),
            SequenceState::Active(_) | SequenceState::Delegating(_) => {}
        }

        self.nested = None;
        self.controller.on_end(success);
        self.state = SequenceState::Ended { success };

        let destination = self.return_to.screen();
        info!(flow, success, destination = %destination, "ending sequence");
        if !backstack.navigate_back_to(&destination) {
            backstack.navigate_to(destination, false);
        }
        Ok(())
    }

    pub fn nested(&self) -> Option<&dyn Sequenceable> {
        self.nested.as_deref()
    }

    /// Typed access to the running nested sequence.
    pub fn nested_mut<N: SequenceController>(&mut self) -> Option<&mut Sequence<N>> {
        self.nested
            .as_mut()
            .and_then(|nested| nested.as_any_mut().downcast_mut::<Sequence<N>>())
    }

    /// Takes control back after the nested sequence has ended. The active
    /// step is the one that launched it.
    pub fn resume_from_nested(&mut self) -> Result<(), SequenceError> {
        let flow = self.name();
        let SequenceState::Delegating(step) = &self.state else {
            return Err(self.reject(SequenceError::NotDelegating { flow }));
        };
        if let Some(nested) = &self.nested {
            if !matches!(nested.status(), SequenceStatus::Ended { .. }) {
                let nested = nested.name();
                return Err(self.reject(SequenceError::NestedActive { flow, nested }));
            }
        }

        let step = step.clone();
        debug!(flow, step = ?step, "resuming after nested sequence");
        self.nested = None;
        self.state = SequenceState::Active(step);
        Ok(())
    }

    fn ensure_active(&mut self, from: &C::Step) -> Result<(), SequenceError> {
        if matches!(self.state, SequenceState::Delegating(_)) {
            self.resume_from_nested()?;
        }

        let flow = self.name();
        let active = match &self.state {
            SequenceState::Active(active) => active,
            SequenceState::NotStarted => {
                return Err(self.reject(SequenceError::NotStarted { flow }));
            }
            SequenceState::Ended { .. } => return Err(self.reject(SequenceError::Ended { flow })),
            SequenceState::Delegating(_) => {
                return Err(self.reject(SequenceError::NotDelegating { flow }));
            }
        };

        if active != from {
            let err = SequenceError::UnexpectedStep {
                flow,
                from: format!("{from:?}"),
                active: format!("{active:?}"),
            };
            return Err(self.reject(err));
        }
        Ok(())
    }

    fn reject(&self, err: SequenceError) -> SequenceError {
        if err.is_bug() {
            error!(flow = self.name(), error = %err, "sequence wiring bug");
        } else {
            debug!(flow = self.name(), error = %err, "sequence navigation rejected");
        }
        err
    }

    fn return_to_label(&self, return_to: &ReturnTo) -> String {
        match return_to {
            ReturnTo::Default => format!("default({DEFAULT_RETURN_ROUTE})"),
            ReturnTo::Screen(screen) => screen.to_string(),
            ReturnTo::Resume(screen) => format!("resume({screen})"),
        }
    }
}

impl<C: SequenceController> Sequenceable for Sequence<C> {
    fn name(&self) -> &'static str {
        self.controller.name()
    }

    fn status(&self) -> SequenceStatus {
        match self.state {
            SequenceState::NotStarted => SequenceStatus::NotStarted,
            SequenceState::Active(_) => SequenceStatus::Active,
            SequenceState::Delegating(_) => SequenceStatus::Delegating,
            SequenceState::Ended { success } => SequenceStatus::Ended { success },
        }
    }

    fn start(
        &mut self,
        backstack: &mut dyn Backstack,
        return_to: ReturnTo,
    ) -> Result<(), SequenceError> {
        self.start_sequence(backstack, return_to)
    }

    fn end(&mut self, backstack: &mut dyn Backstack, success: bool) -> Result<(), SequenceError> {
        self.end_sequence(backstack, success)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "tests/sequence_tests.rs"]
mod tests;
