use reader_core::{update, Effect, Msg, ReaderSettings, SessionState, SettingsAction};

fn active_state() -> SessionState {
    let (state, _) = update(
        SessionState::new(),
        Msg::ToggleRequested {
            body_markup: "<p>x</p>".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ActivationSucceeded {
            title: String::new(),
        },
    );
    state
}

#[test]
fn persisted_actions_emit_styles_and_persist() {
    reader_logging::initialize_for_tests();
    let (state, effects) = update(active_state(), Msg::Settings(SettingsAction::IncreaseFontSize));

    let expected = ReaderSettings {
        font_size: 20,
        ..ReaderSettings::default()
    };
    assert_eq!(state.settings(), &expected);
    assert_eq!(
        effects,
        vec![Effect::ApplyStyles, Effect::PersistSettings(expected)]
    );
}

#[test]
fn image_toggle_is_applied_but_not_persisted() {
    reader_logging::initialize_for_tests();
    let (state, effects) = update(active_state(), Msg::Settings(SettingsAction::ToggleImages));
    assert!(!state.view().show_images);
    assert_eq!(effects, vec![Effect::ApplyStyles]);
}

#[test]
fn action_at_bound_emits_nothing() {
    reader_logging::initialize_for_tests();
    let mut state = active_state();
    for _ in 0..8 {
        state = update(state, Msg::Settings(SettingsAction::IncreaseWidth)).0;
    }
    assert_eq!(state.settings().width, 1200);
    let (_, effects) = update(state, Msg::Settings(SettingsAction::IncreaseWidth));
    assert!(effects.is_empty());
}

#[test]
fn settings_actions_are_ignored_outside_reading_mode() {
    reader_logging::initialize_for_tests();
    let (state, effects) = update(
        SessionState::new(),
        Msg::Settings(SettingsAction::ToggleDarkMode),
    );
    assert!(!state.settings().is_dark_mode);
    assert!(effects.is_empty());
}
