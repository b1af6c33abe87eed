//! Per-contact send/verify workflow against the simulated surface.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use courier_core::{normalize, Contact, RegionDefaults};
use courier_engine::{
    ContactScript, Delivery, DeliveryError, MessageJob, MessageSender, PacingSettings, RunSignal,
    SimAction, SimulatedSurface, Surface, SurfaceProfile, TriggerMethod,
};
use pretty_assertions::assert_eq;
use rand::rngs::mock::StepRng;

const ADDRESS: &str = "556298765432";
const MESSAGE: &str = "Olá Ana, tudo bem?";

fn job(region: &RegionDefaults) -> MessageJob {
    MessageJob {
        contact: Contact {
            raw_address: ADDRESS.to_string(),
            display_name: "Ana".to_string(),
        },
        address: normalize(ADDRESS, region).unwrap(),
        resolved_text: MESSAGE.to_string(),
    }
}

fn deliver_with(
    sim: &mut SimulatedSurface,
    pacing: &PacingSettings,
    cold_session: bool,
) -> Result<Delivery, DeliveryError> {
    let profile = SurfaceProfile::default();
    let region = RegionDefaults::default();
    let signal = RunSignal::new();
    let mut rng = StepRng::new(0, 1);
    let job = job(&region);
    let mut sender = MessageSender::new(sim, &profile, pacing, &region, &signal, &mut rng);
    sender.deliver(&job, cold_session)
}

fn deliver(
    sim: &mut SimulatedSurface,
    pacing: &PacingSettings,
) -> Result<Delivery, DeliveryError> {
    deliver_with(sim, pacing, false)
}

fn paste_count(actions: &Arc<Mutex<Vec<SimAction>>>, label: &str) -> usize {
    actions
        .lock()
        .unwrap()
        .iter()
        .filter(|action| matches!(action, SimAction::Pasted { label: l, .. } if l == label))
        .count()
}

fn navigated_to_send_url(actions: &Arc<Mutex<Vec<SimAction>>>) -> bool {
    actions
        .lock()
        .unwrap()
        .iter()
        .any(|action| matches!(action, SimAction::Navigated(url) if url.contains("send?phone=")))
}

#[test]
fn delivers_via_direct_navigation_with_the_send_button() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(ADDRESS, ContactScript::default());
    let actions = sim.actions();

    let delivery = deliver(&mut sim, &PacingSettings::immediate()).unwrap();

    assert_eq!(delivery.trigger, TriggerMethod::SendButton);
    assert_eq!(delivery.attempts, 1);
    assert!(navigated_to_send_url(&actions));
    assert_eq!(paste_count(&actions, "composer"), 1);
    // One trigger per pass: the button landed, so no key trigger follows.
    let keyed_enter = actions.lock().unwrap().iter().any(|action| {
        matches!(
            action,
            SimAction::Keyed {
                key: courier_engine::ControlKey::Enter
                    | courier_engine::ControlKey::ConfirmChord,
                ..
            }
        )
    });
    assert!(!keyed_enter);
}

#[test]
fn cold_session_gets_the_longer_composer_wait() {
    let script = ContactScript {
        composer_blocked_checks: 3,
        ..ContactScript::default()
    };
    let pacing = PacingSettings {
        composer_timeout: Duration::ZERO,
        composer_timeout_first: Duration::from_secs(1),
        ..PacingSettings::immediate()
    };

    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(ADDRESS, script.clone());
    let err = deliver_with(&mut sim, &pacing, false).unwrap_err();
    assert_eq!(err, DeliveryError::ComposerNotFound);

    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(ADDRESS, script);
    assert!(deliver_with(&mut sim, &pacing, true).is_ok());
}

#[test]
fn prefers_the_in_app_search_over_navigation() {
    let profile = SurfaceProfile::default();
    let mut sim = SimulatedSurface::new(profile.clone());
    sim.script(
        ADDRESS,
        ContactScript {
            in_search: true,
            link_reachable: false,
            ..ContactScript::default()
        },
    );
    sim.navigate(&profile.base_url).unwrap();
    let actions = sim.actions();

    deliver(&mut sim, &PacingSettings::immediate()).unwrap();

    assert!(!navigated_to_send_url(&actions));
    let clicked_result = actions
        .lock()
        .unwrap()
        .iter()
        .any(|action| matches!(action, SimAction::Clicked(label) if label == "search-result"));
    assert!(clicked_result);
}

#[test]
fn missing_search_result_falls_back_to_navigation() {
    let profile = SurfaceProfile::default();
    let mut sim = SimulatedSurface::new(profile.clone());
    sim.script(ADDRESS, ContactScript::default());
    sim.navigate(&profile.base_url).unwrap();
    let actions = sim.actions();

    deliver(&mut sim, &PacingSettings::immediate()).unwrap();

    assert!(navigated_to_send_url(&actions));
}

#[test]
fn invalid_address_notice_short_circuits() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(
        ADDRESS,
        ContactScript {
            invalid: true,
            ..ContactScript::default()
        },
    );
    let actions = sim.actions();

    let err = deliver(&mut sim, &PacingSettings::immediate()).unwrap_err();

    assert_eq!(err, DeliveryError::InvalidAddress);
    assert_eq!(paste_count(&actions, "composer"), 0);
}

#[test]
fn unreachable_conversation_times_out() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(
        ADDRESS,
        ContactScript {
            link_reachable: false,
            ..ContactScript::default()
        },
    );

    let err = deliver(&mut sim, &PacingSettings::immediate()).unwrap_err();

    assert!(matches!(err, DeliveryError::ConversationUnreachable(_)));
}

#[test]
fn falls_back_to_enter_when_the_button_is_missing() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(
        ADDRESS,
        ContactScript {
            send_button_missing: true,
            ..ContactScript::default()
        },
    );

    let delivery = deliver(&mut sim, &PacingSettings::immediate()).unwrap();

    assert_eq!(delivery.trigger, TriggerMethod::Enter);
}

#[test]
fn falls_back_to_the_confirm_chord_when_enter_is_rejected() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(
        ADDRESS,
        ContactScript {
            send_button_missing: true,
            enter_rejected: true,
            ..ContactScript::default()
        },
    );

    let delivery = deliver(&mut sim, &PacingSettings::immediate()).unwrap();

    assert_eq!(delivery.trigger, TriggerMethod::ConfirmChord);
}

#[test]
fn clears_a_stale_draft_before_pasting() {
    let profile = SurfaceProfile::default();
    let mut sim = SimulatedSurface::new(profile.clone());
    sim.script(
        ADDRESS,
        ContactScript {
            preloaded_composer: Some("old half-typed draft".to_string()),
            ..ContactScript::default()
        },
    );

    deliver(&mut sim, &PacingSettings::immediate()).unwrap();

    let bubbles = sim.locate_all(&profile.outbound_messages).unwrap();
    assert_eq!(bubbles.len(), 1);
    assert_eq!(sim.text(bubbles[0]).unwrap(), MESSAGE);
}

#[test]
fn retries_after_a_swallowed_trigger() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(
        ADDRESS,
        ContactScript {
            swallow_triggers: 1,
            ..ContactScript::default()
        },
    );
    let actions = sim.actions();

    let delivery = deliver(&mut sim, &PacingSettings::immediate()).unwrap();

    assert_eq!(delivery.attempts, 2);
    assert_eq!(paste_count(&actions, "composer"), 2);
}

#[test]
fn late_confirmation_is_caught_before_a_duplicate_paste() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(
        ADDRESS,
        ContactScript {
            confirm_after_checks: 2,
            ..ContactScript::default()
        },
    );
    let actions = sim.actions();

    // A single verification probe, so the bubble only shows up on the
    // follow-up check that runs when the composer comes back empty.
    let pacing = PacingSettings {
        verify_timeout: Duration::ZERO,
        ..PacingSettings::immediate()
    };
    let delivery = deliver(&mut sim, &pacing).unwrap();

    assert_eq!(delivery.attempts, 1);
    assert_eq!(paste_count(&actions, "composer"), 1);
}

#[test]
fn a_replaced_last_bubble_still_confirms() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(
        ADDRESS,
        ContactScript {
            existing_bubbles: vec!["mensagem anterior".to_string()],
            replace_last_bubble: true,
            ..ContactScript::default()
        },
    );

    let delivery = deliver(&mut sim, &PacingSettings::immediate()).unwrap();

    assert_eq!(delivery.attempts, 1);
}

#[test]
fn exhausts_retries_when_nothing_ever_confirms() {
    let mut sim = SimulatedSurface::new(SurfaceProfile::default());
    sim.script(
        ADDRESS,
        ContactScript {
            drop_messages: true,
            ..ContactScript::default()
        },
    );
    let actions = sim.actions();

    let err = deliver(&mut sim, &PacingSettings::immediate()).unwrap_err();

    assert_eq!(err, DeliveryError::SendNotConfirmed { attempts: 3 });
    // One fresh paste per attempt, never two for the same attempt.
    assert_eq!(paste_count(&actions, "composer"), 3);
}
