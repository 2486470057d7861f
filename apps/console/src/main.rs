use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use flows::{
    PairingArgs, PairingStep, PersonArgs, PersonOnboardingFlow, PersonStep,
    ProductCatalogSequence, VoiceArgs, VoiceAssistantSequence, VoiceStep,
};
use popups::{BannerKind, PassOutcome};
use sequence::ReturnTo;
use shared::{
    domain::{DeviceAddress, PersonId, PlaceId, ProductId, VoiceAssistant},
    navigation::{Backstack, Screen},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod session;

use config::load_settings;
use session::{Session, DASHBOARD_ROUTE};

#[derive(Parser, Debug)]
struct Cli {
    /// Config file; `arcus.toml` in the working directory when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    Popups,
    Pairing,
    Onboarding,
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut session = Session::open(&settings)?;

    if matches!(cli.scenario, Scenario::Popups | Scenario::All) {
        run_popups(&mut session).await?;
    }
    if matches!(cli.scenario, Scenario::Pairing | Scenario::All) {
        run_pairing(&session)?;
    }
    if matches!(cli.scenario, Scenario::Onboarding | Scenario::All) {
        run_onboarding(&session)?;
    }

    info!(routes = ?session.backstack().routes(), "session finished");
    Ok(())
}

/// Visits the dashboard until no popup qualifies, dismissing each one shown,
/// then exercises the banner slot.
async fn run_popups(session: &mut Session) -> anyhow::Result<()> {
    let rounds = session.popups().responsibility_kinds().len() + 1;
    for _ in 0..rounds {
        match session.visit_dashboard().await {
            Some(PassOutcome::Executed { kind } | PassOutcome::Deferred { kind }) => {
                session.dismiss_popup(kind)?;
            }
            Some(PassOutcome::NoneQualified) | None => break,
            Some(other) => {
                warn!(outcome = ?other, "dashboard popup did not settle");
                break;
            }
        }
    }

    for kind in [
        BannerKind::NoInternetConnection,
        BannerKind::LowBattery,
        BannerKind::ServiceSuspended,
    ] {
        session.request_banner(kind);
    }
    session.dismiss_banner(BannerKind::NoInternetConnection);
    session.request_banner(BannerKind::LowBattery);
    session.request_banner(BannerKind::ServiceSuspended);
    info!(
        displayed = ?session.banners().displayed().collect::<Vec<_>>(),
        "banner slot settled"
    );
    Ok(())
}

/// Pairs a voice assistant and then a hub device from the device list.
fn run_pairing(session: &Session) -> anyhow::Result<()> {
    let mut stack = session.backstack();
    stack.navigate_back_to(&Screen::new(DASHBOARD_ROUTE));
    stack.navigate_to(Screen::new("devices"), true);

    let mut pairing = ProductCatalogSequence::sequence();
    pairing.start_sequence(&mut *stack, ReturnTo::Screen(Screen::new("devices")))?;
    pairing.go_next(
        &mut *stack,
        &PairingStep::Catalog,
        PairingArgs::ProductChosen {
            product_id: ProductId::new("echo-dot"),
            voice_assistant: Some(VoiceAssistant::Alexa),
        },
    )?;

    let voice: Option<&mut VoiceAssistantSequence> = pairing.nested_mut();
    if let Some(voice) = voice {
        voice.go_next(&mut *stack, &VoiceStep::Intro, VoiceArgs::None)?;
        voice.go_next(
            &mut *stack,
            &VoiceStep::LinkAccount,
            VoiceArgs::AccountLinked {
                account: "household".into(),
            },
        )?;
        voice.go_next(&mut *stack, &VoiceStep::Complete, VoiceArgs::None)?;
    }

    pairing.go_next(
        &mut *stack,
        &PairingStep::Catalog,
        PairingArgs::ProductChosen {
            product_id: ProductId::new("contact-sensor"),
            voice_assistant: None,
        },
    )?;
    pairing.go_next(&mut *stack, &PairingStep::ProductInstructions, PairingArgs::None)?;
    pairing.go_next(
        &mut *stack,
        &PairingStep::Searching,
        PairingArgs::DeviceFound(DeviceAddress::for_device(Uuid::new_v4())),
    )?;
    pairing.go_next(&mut *stack, &PairingStep::DeviceFound, PairingArgs::None)?;
    pairing.go_next(&mut *stack, &PairingStep::Customize, PairingArgs::None)?;

    info!(outcome = ?pairing.controller().outcome(), "pairing scenario done");
    Ok(())
}

/// Adds a person to a fresh place.
fn run_onboarding(session: &Session) -> anyhow::Result<()> {
    let mut stack = session.backstack();
    stack.navigate_back_to(&Screen::new(DASHBOARD_ROUTE));
    stack.navigate_to(Screen::new("people"), true);

    let mut onboarding = PersonOnboardingFlow::sequence(PlaceId::random());
    onboarding.start_sequence(&mut *stack, ReturnTo::Screen(Screen::new("people")))?;
    onboarding.go_next(
        &mut *stack,
        &PersonStep::Identity,
        PersonArgs::PersonCreated(PersonId::random()),
    )?;
    for step in [PersonStep::Pin, PersonStep::Contact, PersonStep::Summary] {
        onboarding.go_next(&mut *stack, &step, PersonArgs::None)?;
    }

    info!(
        person = ?onboarding.controller().flow().person(),
        completed = ?onboarding.controller().flow().completed(),
        "onboarding scenario done"
    );
    Ok(())
}
