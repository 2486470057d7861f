//! Product-catalog device pairing.
//!
//! The user picks a product, follows its pairing instructions, waits for the
//! hub to find the device and finally names it. Voice-assistant "products"
//! are not paired through the hub; choosing one hands over to the nested
//! [`VoiceAssistantFlow`](crate::voice::VoiceAssistantFlow).

use sequence::{Sequence, SequenceController, SequenceError, Transition};
use shared::{
    domain::{DeviceAddress, ProductId, VoiceAssistant},
    navigation::Screen,
};
use tracing::info;

use crate::voice::VoiceAssistantFlow;

/// Steps of device pairing.
///
/// Going back from `DeviceFound` or `Customize` ends the flow with the
/// device left paired, since it is already on the hub. Going back from the
/// first step also ends it: `Catalog`, or `ProductInstructions` when the
/// product was chosen before the flow started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStep {
    Catalog,
    ProductInstructions,
    Searching,
    DeviceFound,
    Customize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingArgs {
    None,
    ProductChosen {
        product_id: ProductId,
        voice_assistant: Option<VoiceAssistant>,
    },
    DeviceFound(DeviceAddress),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    Paired(DeviceAddress),
    Abandoned,
}

#[derive(Debug, Default)]
pub struct ProductCatalogSequence {
    product: Option<ProductId>,
    device: Option<DeviceAddress>,
    outcome: Option<PairingOutcome>,
    skips_catalog: bool,
}

impl ProductCatalogSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairing that skips the catalog because the product is already known.
    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product: Some(product_id),
            skips_catalog: true,
            ..Self::default()
        }
    }

    pub fn sequence() -> Sequence<Self> {
        Sequence::new(Self::new())
    }

    pub fn product(&self) -> Option<&ProductId> {
        self.product.as_ref()
    }

    pub fn device(&self) -> Option<&DeviceAddress> {
        self.device.as_ref()
    }

    pub fn outcome(&self) -> Option<&PairingOutcome> {
        self.outcome.as_ref()
    }
}

impl SequenceController for ProductCatalogSequence {
    type Step = PairingStep;
    type Args = PairingArgs;

    fn name(&self) -> &'static str {
        "product-catalog"
    }

    fn first_step(&mut self) -> Result<PairingStep, SequenceError> {
        Ok(if self.product.is_some() {
            PairingStep::ProductInstructions
        } else {
            PairingStep::Catalog
        })
    }

    fn next(
        &mut self,
        from: &PairingStep,
        args: PairingArgs,
    ) -> Result<Transition<PairingStep>, SequenceError> {
        let next = match (from, args) {
            (
                PairingStep::Catalog,
                PairingArgs::ProductChosen {
                    voice_assistant: Some(assistant),
                    ..
                },
            ) => Transition::Nested(Box::new(VoiceAssistantFlow::sequence(assistant))),
            (
                PairingStep::Catalog,
                PairingArgs::ProductChosen {
                    product_id,
                    voice_assistant: None,
                },
            ) => {
                self.product = Some(product_id);
                Transition::Step(PairingStep::ProductInstructions)
            }
            (PairingStep::ProductInstructions, _) => Transition::Step(PairingStep::Searching),
            (PairingStep::Searching, PairingArgs::DeviceFound(address)) => {
                self.device = Some(address);
                Transition::Step(PairingStep::DeviceFound)
            }
            (PairingStep::DeviceFound, _) => Transition::Step(PairingStep::Customize),
            (PairingStep::Customize, _) => Transition::End { success: true },
            (step, args) => {
                return Err(SequenceError::unexpected_args(self.name(), step, &args));
            }
        };
        Ok(next)
    }

    fn previous(
        &mut self,
        from: &PairingStep,
        _args: PairingArgs,
    ) -> Result<Option<PairingStep>, SequenceError> {
        Ok(match from {
            PairingStep::Catalog => None,
            PairingStep::ProductInstructions if self.skips_catalog => None,
            PairingStep::ProductInstructions => Some(PairingStep::Catalog),
            PairingStep::Searching => Some(PairingStep::ProductInstructions),
            // A found device is already on the hub; backing out of naming
            // leaves it paired and exits the flow.
            PairingStep::DeviceFound | PairingStep::Customize => None,
        })
    }

    fn screen(&self, step: &PairingStep) -> Screen {
        let screen = match step {
            PairingStep::Catalog => return Screen::new("pairing/catalog"),
            PairingStep::ProductInstructions => Screen::new("pairing/instructions"),
            PairingStep::Searching => Screen::new("pairing/searching"),
            PairingStep::DeviceFound => Screen::new("pairing/device-found"),
            PairingStep::Customize => Screen::new("pairing/customize"),
        };
        let screen = match &self.product {
            Some(product) => screen.with_param("product", product),
            None => screen,
        };
        match &self.device {
            Some(device) => screen.with_param("device", device),
            None => screen,
        }
    }

    fn on_end(&mut self, success: bool) {
        let outcome = match &self.device {
            Some(device) => PairingOutcome::Paired(device.clone()),
            None => PairingOutcome::Abandoned,
        };
        info!(outcome = ?outcome, success, "device pairing finished");
        self.outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequence::{ReturnTo, SequenceState};
    use shared::navigation::{Backstack, MemoryBackstack};

    fn started() -> (Sequence<ProductCatalogSequence>, MemoryBackstack) {
        let mut stack = MemoryBackstack::with_root(Screen::new("dashboard"));
        let mut sequence = ProductCatalogSequence::sequence();
        sequence
            .start_sequence(&mut stack, ReturnTo::Default)
            .expect("start");
        (sequence, stack)
    }

    #[test]
    fn searching_without_a_device_is_rejected_as_a_bug() {
        let (mut sequence, mut stack) = started();
        sequence
            .go_next(
                &mut stack,
                &PairingStep::Catalog,
                PairingArgs::ProductChosen {
                    product_id: ProductId::new("contact"),
                    voice_assistant: None,
                },
            )
            .expect("catalog");
        sequence
            .go_next(&mut stack, &PairingStep::ProductInstructions, PairingArgs::None)
            .expect("instructions");

        let err = sequence
            .go_next(&mut stack, &PairingStep::Searching, PairingArgs::None)
            .expect_err("no device");
        assert!(err.is_bug());
        assert_eq!(
            sequence.state(),
            &SequenceState::Active(PairingStep::Searching)
        );
    }

    #[test]
    fn known_product_starts_at_instructions() {
        let mut stack = MemoryBackstack::new();
        let mut sequence = Sequence::new(ProductCatalogSequence::for_product(ProductId::new(
            "smart-plug",
        )));
        sequence
            .start_sequence(&mut stack, ReturnTo::Default)
            .expect("start");
        let top = stack.current().expect("top");
        assert_eq!(top.route, "pairing/instructions");
        assert_eq!(top.param("product"), Some("smart-plug"));
    }

    #[test]
    fn backing_out_of_preselected_product_instructions_ends_the_flow() {
        let mut stack = MemoryBackstack::with_root(Screen::new("dashboard"));
        stack.navigate_to(Screen::new("devices"), true);
        let mut sequence = Sequence::new(ProductCatalogSequence::for_product(ProductId::new(
            "smart-plug",
        )));
        sequence
            .start_sequence(&mut stack, ReturnTo::Screen(Screen::new("devices")))
            .expect("start");

        sequence
            .go_back(&mut stack, &PairingStep::ProductInstructions, PairingArgs::None)
            .expect("back");
        assert_eq!(sequence.state(), &SequenceState::Ended { success: true });
        assert_eq!(
            sequence.controller().outcome(),
            Some(&PairingOutcome::Abandoned)
        );
        assert_eq!(stack.routes(), vec!["dashboard", "devices"]);
    }

    #[test]
    fn backing_out_of_chosen_product_instructions_returns_to_catalog() {
        let (mut sequence, mut stack) = started();
        sequence
            .go_next(
                &mut stack,
                &PairingStep::Catalog,
                PairingArgs::ProductChosen {
                    product_id: ProductId::new("contact"),
                    voice_assistant: None,
                },
            )
            .expect("catalog");

        sequence
            .go_back(&mut stack, &PairingStep::ProductInstructions, PairingArgs::None)
            .expect("back");
        assert_eq!(
            sequence.state(),
            &SequenceState::Active(PairingStep::Catalog)
        );
        assert_eq!(
            stack.current().map(|s| s.route.as_str()),
            Some("pairing/catalog")
        );
    }

    #[test]
    fn backing_out_of_catalog_abandons() {
        let (mut sequence, mut stack) = started();
        sequence
            .go_back(&mut stack, &PairingStep::Catalog, PairingArgs::None)
            .expect("back");
        assert_eq!(
            sequence.controller().outcome(),
            Some(&PairingOutcome::Abandoned)
        );
        assert_eq!(stack.routes(), vec!["dashboard"]);
    }
}
