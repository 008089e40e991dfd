use crate::{Effect, Msg, Phase, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::ToggleRequested { body_markup } => match state.phase() {
            // Re-entrant toggles are rejected while a transition is in flight.
            Phase::Activating | Phase::Deactivating => Vec::new(),
            Phase::Idle => {
                state.begin_activation(body_markup);
                vec![
                    Effect::ShowLoading,
                    Effect::LoadSettings,
                    Effect::RunPipeline {
                        show_images: state.settings().show_images,
                    },
                ]
            }
            Phase::Active => begin_deactivation(&mut state),
        },
        Msg::DisableRequested => {
            if state.phase() == Phase::Active {
                begin_deactivation(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::SettingsLoaded(settings) => {
            state.load_settings(settings);
            if state.phase() == Phase::Active {
                vec![Effect::ApplyStyles]
            } else {
                Vec::new()
            }
        }
        Msg::ActivationSucceeded { title } => {
            if state.phase() == Phase::Activating {
                state.finish_activation(title);
                vec![Effect::NotifyListener { active: true }]
            } else {
                Vec::new()
            }
        }
        Msg::ActivationFailed { kind, message } => {
            if state.phase() != Phase::Activating {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(3);
            if let Some(markup) = state.fail_activation(kind) {
                effects.push(Effect::RestorePage { markup });
            }
            effects.push(Effect::ShowError { message });
            effects.push(Effect::NotifyListener { active: false });
            effects
        }
        Msg::RestoreCompleted => {
            if state.phase() == Phase::Deactivating {
                state.finish_deactivation();
                vec![Effect::NotifyListener { active: false }]
            } else {
                Vec::new()
            }
        }
        Msg::Settings(action) => {
            if state.phase() != Phase::Active {
                return (state, Vec::new());
            }
            if !state.settings_mut().apply(&action) {
                return (state, Vec::new());
            }
            let mut effects = vec![Effect::ApplyStyles];
            if action.is_persisted() {
                effects.push(Effect::PersistSettings(state.settings().clone()));
            }
            effects
        }
    };

    (state, effects)
}

fn begin_deactivation(state: &mut SessionState) -> Vec<Effect> {
    match state.begin_deactivation() {
        Some(markup) => vec![Effect::RestorePage { markup }],
        // Active without a snapshot cannot be produced by `update`; settle
        // straight back to idle rather than wedge in Deactivating.
        None => {
            state.finish_deactivation();
            vec![Effect::NotifyListener { active: false }]
        }
    }
}
