//! Adding a person to a place, as a fixed table of steps.

use sequence::{Sequence, StaticSequence, StaticSequenceController};
use shared::{
    domain::{PersonId, PlaceId},
    navigation::Screen,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonStep {
    Identity,
    Pin,
    Contact,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonArgs {
    None,
    /// Emitted by the identity step once the platform has created the person.
    PersonCreated(PersonId),
}

#[derive(Debug)]
pub struct PersonOnboardingFlow {
    place: PlaceId,
    person: Option<PersonId>,
    completed: Option<bool>,
}

pub type PersonOnboardingSequence = Sequence<StaticSequenceController<PersonOnboardingFlow>>;

impl PersonOnboardingFlow {
    pub fn new(place: PlaceId) -> Self {
        Self {
            place,
            person: None,
            completed: None,
        }
    }

    pub fn sequence(place: PlaceId) -> PersonOnboardingSequence {
        StaticSequenceController::new(Self::new(place)).into_sequence()
    }

    pub fn place(&self) -> PlaceId {
        self.place
    }

    pub fn person(&self) -> Option<PersonId> {
        self.person
    }

    pub fn completed(&self) -> Option<bool> {
        self.completed
    }
}

impl StaticSequence for PersonOnboardingFlow {
    type Step = PersonStep;
    type Args = PersonArgs;

    fn name(&self) -> &'static str {
        "person-onboarding"
    }

    fn steps(&self) -> &'static [PersonStep] {
        &[
            PersonStep::Identity,
            PersonStep::Pin,
            PersonStep::Contact,
            PersonStep::Summary,
        ]
    }

    fn new_instance_of(&self, step: PersonStep) -> Screen {
        let screen = match step {
            PersonStep::Identity => Screen::new("person/identity"),
            PersonStep::Pin => Screen::new("person/pin"),
            PersonStep::Contact => Screen::new("person/contact"),
            PersonStep::Summary => Screen::new("person/summary"),
        }
        .with_param("place", self.place);

        match (step, self.person) {
            (PersonStep::Identity, _) | (_, None) => screen,
            (_, Some(person)) => screen.with_param("person", person),
        }
    }

    fn absorb(&mut self, args: PersonArgs) {
        if let PersonArgs::PersonCreated(person) = args {
            self.person = Some(person);
        }
    }

    fn on_end(&mut self, success: bool) {
        info!(place = %self.place, person = ?self.person, success, "person onboarding finished");
        self.completed = Some(success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequence::ReturnTo;
    use shared::navigation::{Backstack, MemoryBackstack};

    #[test]
    fn created_person_is_injected_into_later_steps() {
        let place = PlaceId::random();
        let person = PersonId::random();
        let mut stack = MemoryBackstack::with_root(Screen::new("people"));
        let mut sequence = PersonOnboardingFlow::sequence(place);

        sequence
            .start_sequence(&mut stack, ReturnTo::Screen(Screen::new("people")))
            .expect("start");
        let identity = stack.current().expect("identity").clone();
        assert_eq!(identity.param("place"), Some(place.to_string().as_str()));
        assert_eq!(identity.param("person"), None);

        sequence
            .go_next(&mut stack, &PersonStep::Identity, PersonArgs::PersonCreated(person))
            .expect("identity -> pin");
        let pin = stack.current().expect("pin");
        assert_eq!(pin.route, "person/pin");
        assert_eq!(pin.param("person"), Some(person.to_string().as_str()));
    }

    #[test]
    fn finishing_summary_returns_to_people_list() {
        let mut stack = MemoryBackstack::with_root(Screen::new("people"));
        let mut sequence = PersonOnboardingFlow::sequence(PlaceId::random());
        sequence
            .start_sequence(&mut stack, ReturnTo::Screen(Screen::new("people")))
            .expect("start");

        for step in [PersonStep::Identity, PersonStep::Pin, PersonStep::Contact, PersonStep::Summary] {
            sequence
                .go_next(&mut stack, &step, PersonArgs::None)
                .expect("advance");
        }

        assert!(sequence.is_ended());
        assert_eq!(sequence.controller().flow().completed(), Some(true));
        assert_eq!(stack.routes(), vec!["people"]);
    }
}
