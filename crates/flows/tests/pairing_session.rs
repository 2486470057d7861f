use flows::{
    PairingArgs, PairingOutcome, PairingStep, ProductCatalogSequence, VoiceArgs,
    VoiceAssistantSequence, VoiceStep,
};
use sequence::{ReturnTo, Sequence, SequenceState, SequenceStatus};
use shared::{
    domain::{DeviceAddress, ProductId, VoiceAssistant},
    navigation::{Backstack, MemoryBackstack, Screen},
};
use uuid::Uuid;

fn choose(product: &str, voice_assistant: Option<VoiceAssistant>) -> PairingArgs {
    PairingArgs::ProductChosen {
        product_id: ProductId::new(product),
        voice_assistant,
    }
}

#[test]
fn voice_detour_then_device_pairing_acceptance() {
    let mut stack = MemoryBackstack::with_root(Screen::new("dashboard"));
    stack.navigate_to(Screen::new("devices"), true);

    let mut pairing = ProductCatalogSequence::sequence();
    pairing
        .start_sequence(&mut stack, ReturnTo::Screen(Screen::new("devices")))
        .expect("start pairing");
    assert_eq!(stack.routes(), vec!["dashboard", "devices", "pairing/catalog"]);

    // Picking a voice product hands over to the assistant-linking flow.
    pairing
        .go_next(
            &mut stack,
            &PairingStep::Catalog,
            choose("alexa", Some(VoiceAssistant::Alexa)),
        )
        .expect("delegate to voice");
    assert_eq!(
        pairing.state(),
        &SequenceState::Delegating(PairingStep::Catalog)
    );
    let intro = stack.current().expect("voice intro").clone();
    assert_eq!(intro.route, "voice/intro");
    assert_eq!(intro.param("assistant"), Some("alexa"));

    let voice: &mut VoiceAssistantSequence = pairing.nested_mut().expect("voice child");
    voice
        .go_next(&mut stack, &VoiceStep::Intro, VoiceArgs::None)
        .expect("intro -> link");
    voice
        .go_next(
            &mut stack,
            &VoiceStep::LinkAccount,
            VoiceArgs::AccountLinked {
                account: "household@example.com".to_string(),
            },
        )
        .expect("link -> complete");
    assert_eq!(
        stack.current().and_then(|s| s.param("account")),
        Some("household@example.com")
    );
    voice
        .go_next(&mut stack, &VoiceStep::Complete, VoiceArgs::None)
        .expect("voice done");
    assert_eq!(voice.controller().flow().outcome(), Some(true));

    assert_eq!(stack.routes(), vec!["dashboard", "devices", "pairing/catalog"]);
    assert_eq!(
        pairing.nested().map(|n| n.status()),
        Some(SequenceStatus::Ended { success: true })
    );

    // The catalog is active again; the user now pairs a hub device.
    pairing
        .go_next(&mut stack, &PairingStep::Catalog, choose("contact-sensor", None))
        .expect("catalog -> instructions");
    assert!(pairing.nested().is_none());
    pairing
        .go_next(&mut stack, &PairingStep::ProductInstructions, PairingArgs::None)
        .expect("instructions -> searching");

    let address = DeviceAddress::for_device(Uuid::new_v4());
    pairing
        .go_next(
            &mut stack,
            &PairingStep::Searching,
            PairingArgs::DeviceFound(address.clone()),
        )
        .expect("searching -> found");
    let found = stack.current().expect("device found").clone();
    assert_eq!(found.route, "pairing/device-found");
    assert_eq!(found.param("product"), Some("contact-sensor"));
    assert_eq!(found.param("device"), Some(address.to_string().as_str()));

    pairing
        .go_next(&mut stack, &PairingStep::DeviceFound, PairingArgs::None)
        .expect("found -> customize");
    pairing
        .go_next(&mut stack, &PairingStep::Customize, PairingArgs::None)
        .expect("customize -> end");

    assert_eq!(pairing.state(), &SequenceState::Ended { success: true });
    assert_eq!(
        pairing.controller().outcome(),
        Some(&PairingOutcome::Paired(address))
    );
    assert_eq!(stack.routes(), vec!["dashboard", "devices"]);
}

#[test]
fn backing_out_of_naming_keeps_the_device_paired() {
    let mut stack = MemoryBackstack::with_root(Screen::new("dashboard"));
    let mut pairing = Sequence::new(ProductCatalogSequence::for_product(ProductId::new(
        "smart-plug",
    )));
    pairing
        .start_sequence(&mut stack, ReturnTo::Default)
        .expect("start");
    pairing
        .go_next(&mut stack, &PairingStep::ProductInstructions, PairingArgs::None)
        .expect("instructions -> searching");

    let address = DeviceAddress::for_device(Uuid::new_v4());
    pairing
        .go_next(
            &mut stack,
            &PairingStep::Searching,
            PairingArgs::DeviceFound(address.clone()),
        )
        .expect("searching -> found");
    pairing
        .go_back(&mut stack, &PairingStep::DeviceFound, PairingArgs::None)
        .expect("back out");

    assert!(pairing.is_ended());
    assert_eq!(
        pairing.controller().outcome(),
        Some(&PairingOutcome::Paired(address))
    );
    assert_eq!(stack.routes(), vec!["dashboard"]);
}
