//! Turns a bare user command into a concrete action using the current view.
use crate::action::Action;
use crate::event::UserEvent;
use crate::state::{Member, TrackerState, ViewType};

/// Interpret `event` against the current screen context.
///
/// Never mutates state. Returns `None` when the command has no meaning in
/// this view or when no species is known yet; undo and redo are not
/// decorated here.
#[must_use]
pub fn decorate(state: &TrackerState, event: UserEvent) -> Option<Action> {
    match (event, state.view_type) {
        (UserEvent::ToParty | UserEvent::ToBoxed | UserEvent::FailEnc, ViewType::WildSingle)
            if state.foes_left == 1 =>
        {
            let species = state.last_species[0].as_str();
            if species.is_empty() {
                None
            } else {
                encounter_action(state, event, species)
            }
        }
        (
            UserEvent::ToParty | UserEvent::ToBoxed | UserEvent::FailEnc,
            ViewType::WildDouble,
        ) if state.foes_left == 1 => {
            encounter_action(state, event, state.preferred_species()?)
        }
        (UserEvent::ToParty | UserEvent::ToBoxed | UserEvent::FailEnc, ViewType::Overworld) => {
            encounter_action(state, event, state.preferred_species()?)
        }
        (UserEvent::FailEnc, ViewType::Nickname) => {
            encounter_action(state, event, state.preferred_species()?)
        }
        _ => {
            log::debug!("{event} has no meaning in {}", state.view_type);
            None
        }
    }
}

fn encounter_action(state: &TrackerState, event: UserEvent, species: &str) -> Option<Action> {
    let member = Member::new(state.location.clone(), species);
    match event {
        UserEvent::ToParty => Some(Action::ToParty {
            member: member.with_nickname(state.last_nickname.clone()),
            is_new: true,
        }),
        UserEvent::ToBoxed => Some(Action::ToBoxed {
            member: member.with_nickname(state.last_nickname.clone()),
            is_new: true,
        }),
        UserEvent::FailEnc => Some(Action::FailCanonEnc { member }),
        _ => None,
    }
}
