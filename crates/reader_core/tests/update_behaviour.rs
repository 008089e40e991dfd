use std::sync::Once;

use reader_core::{update, Effect, FailureKind, Msg, Phase, ReaderSettings, SessionState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(reader_logging::initialize_for_tests);
}

fn toggle(state: SessionState, markup: &str) -> (SessionState, Vec<Effect>) {
    update(
        state,
        Msg::ToggleRequested {
            body_markup: markup.to_string(),
        },
    )
}

fn activate(markup: &str) -> SessionState {
    let (state, _) = toggle(SessionState::new(), markup);
    let (state, _) = update(
        state,
        Msg::ActivationSucceeded {
            title: "Title".to_string(),
        },
    );
    state
}

#[test]
fn toggle_from_idle_snapshots_and_starts_pipeline() {
    init_logging();
    let (mut state, effects) = toggle(SessionState::new(), "<p>original</p>");

    assert_eq!(state.phase(), Phase::Activating);
    assert!(state.is_processing());
    assert!(!state.is_enabled());
    assert_eq!(state.original_content(), Some("<p>original</p>"));
    assert!(state.consume_dirty());
    assert_eq!(
        effects,
        vec![
            Effect::ShowLoading,
            Effect::LoadSettings,
            Effect::RunPipeline { show_images: true },
        ]
    );
}

#[test]
fn second_toggle_while_activating_is_ignored() {
    init_logging();
    let (state, _) = toggle(SessionState::new(), "<p>first</p>");
    let before = state.clone();

    let (state, effects) = toggle(state, "<p>second</p>");

    assert!(effects.is_empty());
    assert_eq!(state, before);
    assert_eq!(state.original_content(), Some("<p>first</p>"));
}

#[test]
fn successful_activation_notifies_listener() {
    init_logging();
    let (state, _) = toggle(SessionState::new(), "<p>x</p>");
    let (state, effects) = update(
        state,
        Msg::ActivationSucceeded {
            title: "Test Article".to_string(),
        },
    );

    assert_eq!(state.phase(), Phase::Active);
    assert!(state.is_enabled());
    assert!(state.original_content().is_some());
    assert_eq!(effects, vec![Effect::NotifyListener { active: true }]);
    assert_eq!(state.title(), Some("Test Article"));
    assert_eq!(state.view().title.as_deref(), Some("Test Article"));
}

#[test]
fn leaving_reading_mode_forgets_the_title() {
    init_logging();
    let (state, _) = toggle(SessionState::new(), "<p>x</p>");
    let (state, _) = update(
        state,
        Msg::ActivationSucceeded {
            title: "Headline".to_string(),
        },
    );
    let (state, _) = update(state, Msg::DisableRequested);
    assert_eq!(state.title(), Some("Headline"));

    let (state, _) = update(state, Msg::RestoreCompleted);
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.title(), None);
}

#[test]
fn failed_activation_restores_snapshot_and_returns_to_idle() {
    init_logging();
    let (state, _) = toggle(SessionState::new(), "<p>keep me</p>");
    let (state, effects) = update(
        state,
        Msg::ActivationFailed {
            kind: FailureKind::Unsuitable,
            message: "unsuitable page".to_string(),
        },
    );

    assert_eq!(state.phase(), Phase::Idle);
    assert!(!state.is_processing());
    assert_eq!(state.original_content(), None);
    assert_eq!(state.last_failure(), Some(FailureKind::Unsuitable));
    assert_eq!(
        effects,
        vec![
            Effect::RestorePage {
                markup: "<p>keep me</p>".to_string()
            },
            Effect::ShowError {
                message: "unsuitable page".to_string()
            },
            Effect::NotifyListener { active: false },
        ]
    );
}

#[test]
fn toggle_while_active_restores_then_settles_idle() {
    init_logging();
    let state = activate("<p>body</p>");

    let (state, effects) = toggle(state, "<div>reader view</div>");
    assert_eq!(state.phase(), Phase::Deactivating);
    assert_eq!(state.original_content(), Some("<p>body</p>"));
    assert_eq!(
        effects,
        vec![Effect::RestorePage {
            markup: "<p>body</p>".to_string()
        }]
    );

    // Toggling again mid-restore is a no-op.
    let (state, effects) = toggle(state, "<p>body</p>");
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Deactivating);

    let (state, effects) = update(state, Msg::RestoreCompleted);
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.original_content(), None);
    assert_eq!(effects, vec![Effect::NotifyListener { active: false }]);
}

#[test]
fn disable_is_ignored_unless_active() {
    init_logging();
    let (state, effects) = update(SessionState::new(), Msg::DisableRequested);
    assert_eq!(state.phase(), Phase::Idle);
    assert!(effects.is_empty());

    let (state, _) = toggle(state, "<p>x</p>");
    let (state, effects) = update(state, Msg::DisableRequested);
    assert_eq!(state.phase(), Phase::Activating);
    assert!(effects.is_empty());
}

#[test]
fn late_pipeline_replies_are_ignored() {
    init_logging();
    let (state, effects) = update(
        SessionState::new(),
        Msg::ActivationSucceeded {
            title: "stale".to_string(),
        },
    );
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.title(), None);
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::ActivationFailed {
            kind: FailureKind::NoContentParsed,
            message: "stale".to_string(),
        },
    );
    assert_eq!(state.phase(), Phase::Idle);
    assert!(effects.is_empty());
}

#[test]
fn activation_resets_session_scoped_image_flag() {
    init_logging();
    let settings = ReaderSettings {
        show_images: false,
        ..ReaderSettings::default()
    };
    let (state, effects) = toggle(SessionState::with_settings(settings), "<p>x</p>");
    assert!(state.settings().show_images);
    assert!(effects.contains(&Effect::RunPipeline { show_images: true }));
}

#[test]
fn loaded_settings_keep_session_image_flag() {
    init_logging();
    let state = activate("<p>x</p>");
    let (state, _) = update(state, Msg::Settings(reader_core::SettingsAction::ToggleImages));
    assert!(!state.settings().show_images);

    let stored = ReaderSettings {
        font_size: 22,
        show_images: true,
        ..ReaderSettings::default()
    };
    let (state, effects) = update(state, Msg::SettingsLoaded(stored));
    assert_eq!(state.settings().font_size, 22);
    assert!(!state.settings().show_images);
    assert_eq!(effects, vec![Effect::ApplyStyles]);
}
