use super::*;

use popups::{
    responsibilities::{CARE_WHATS_NEW, PLAN_UPSELL, RATE_APP},
    sources::InMemoryPreferenceStore,
};
use shared::domain::ServiceTier;

fn settings(delay_ms: u64) -> Settings {
    Settings {
        service_tier: ServiceTier::Basic,
        feature_flags: vec!["care_behaviors".into(), "rate_app_prompt".into()],
        popup_delay_ms: delay_ms,
        ..Settings::default()
    }
}

#[tokio::test]
async fn dismissed_popups_give_way_to_the_next_priority() {
    let session = Session::with_preferences(&settings(5), Arc::new(InMemoryPreferenceStore::new()))
        .expect("session");

    assert_eq!(
        session.visit_dashboard().await,
        Some(PassOutcome::Executed {
            kind: CARE_WHATS_NEW
        })
    );
    assert_eq!(
        session.backstack().routes(),
        vec!["dashboard", "popup/care-whats-new"]
    );
    session.dismiss_popup(CARE_WHATS_NEW).expect("dismiss care");

    assert_eq!(
        session.visit_dashboard().await,
        Some(PassOutcome::Deferred { kind: PLAN_UPSELL })
    );
    assert_eq!(
        session.backstack().current().map(|s| s.route.clone()),
        Some("popup/plan-upsell".to_string())
    );
    session.dismiss_popup(PLAN_UPSELL).expect("dismiss upsell");

    assert_eq!(
        session.visit_dashboard().await,
        Some(PassOutcome::Executed { kind: RATE_APP })
    );
    session.dismiss_popup(RATE_APP).expect("dismiss rate app");

    assert_eq!(
        session.visit_dashboard().await,
        Some(PassOutcome::NoneQualified)
    );
    assert_eq!(session.backstack().routes(), vec!["dashboard"]);
}

#[tokio::test]
async fn dismissals_persist_across_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = settings(0);
    config.preferences_path = dir.path().join("prefs").join("preferences.json");

    {
        let session = Session::open(&config).expect("first session");
        assert_eq!(
            session.visit_dashboard().await,
            Some(PassOutcome::Executed {
                kind: CARE_WHATS_NEW
            })
        );
        session.dismiss_popup(CARE_WHATS_NEW).expect("dismiss");
    }

    let session = Session::open(&config).expect("second session");
    assert_eq!(
        session.visit_dashboard().await,
        Some(PassOutcome::Executed { kind: PLAN_UPSELL })
    );
}

#[test]
fn banners_follow_priority_tiers() {
    let mut session = Session::with_preferences(
        &Settings::default(),
        Arc::new(InMemoryPreferenceStore::new()),
    )
    .expect("session");

    assert!(session.request_banner(BannerKind::NoInternetConnection).is_shown());
    assert!(!session.request_banner(BannerKind::LowBattery).is_shown());

    assert!(session.dismiss_banner(BannerKind::NoInternetConnection));
    assert!(session.request_banner(BannerKind::LowBattery).is_shown());
    assert_eq!(
        session.request_banner(BannerKind::ServiceSuspended),
        BannerDecision::Show {
            evicted: vec![BannerKind::LowBattery]
        }
    );
    assert_eq!(
        session.banners().displayed().collect::<Vec<_>>(),
        vec![BannerKind::ServiceSuspended]
    );
}
