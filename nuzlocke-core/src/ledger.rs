//! Undoable application of actions to the roster and encounter tables.
//!
//! Each location has at most one canon species, and a canon claim is never
//! overwritten. Every committed action records what it changed so undo can
//! restore the previous roster exactly.
use serde::Serialize;
use std::fmt;

use crate::action::{Action, LedgerEntry};
use crate::context::decorate;
use crate::event::UserEvent;
use crate::state::{Member, TrackerState};

/// What the ledger did with a command or action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "action")]
pub enum LedgerOutcome {
    /// Applied and pushed onto the undo history.
    Committed(Action),
    /// Identical to the most recent entry; not applied again.
    Duplicate(Action),
    /// Applying it would change nothing (canon already claimed elsewhere).
    Rejected(Action),
    /// The action's forward effect is not implemented.
    Unsupported(Action),
    Undone(Action),
    Redone(Action),
    NothingToUndo,
    NothingToRedo,
    /// The command had no meaning in the current context.
    NoAction,
}

impl LedgerOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Committed(_) => "committed",
            Self::Duplicate(_) => "duplicate",
            Self::Rejected(_) => "rejected",
            Self::Unsupported(_) => "unsupported",
            Self::Undone(_) => "undone",
            Self::Redone(_) => "redone",
            Self::NothingToUndo => "nothing to undo",
            Self::NothingToRedo => "nothing to redo",
            Self::NoAction => "no action",
        }
    }

    #[must_use]
    pub const fn action(&self) -> Option<&Action> {
        match self {
            Self::Committed(action)
            | Self::Duplicate(action)
            | Self::Rejected(action)
            | Self::Unsupported(action)
            | Self::Undone(action)
            | Self::Redone(action) => Some(action),
            Self::NothingToUndo | Self::NothingToRedo | Self::NoAction => None,
        }
    }

    /// Whether the durable state changed.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Committed(_) | Self::Undone(_) | Self::Redone(_)
        )
    }
}

impl fmt::Display for LedgerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action() {
            Some(action) => write!(f, "{} {action}", self.as_str()),
            None => f.write_str(self.as_str()),
        }
    }
}

/// Dispatch one user command.
///
/// Undo and redo act on the history directly; everything else is decorated
/// with the current context and committed.
pub fn handle_event(state: &mut TrackerState, event: UserEvent) -> LedgerOutcome {
    match event {
        UserEvent::UndoAction => undo(state),
        UserEvent::RedoAction => redo(state),
        _ => {
            let action = decorate(state, event);
            commit(state, action)
        }
    }
}

/// Apply a new action and record it for undo.
///
/// Any action clears the redo history, even one that turns out to be a
/// duplicate or unsupported.
pub fn commit(state: &mut TrackerState, action: Option<Action>) -> LedgerOutcome {
    let Some(action) = action else {
        return LedgerOutcome::NoAction;
    };
    state.redo_history.clear();

    if state
        .undo_history
        .last()
        .is_some_and(|top| top.action == action)
    {
        log::debug!("ignoring repeated {action}");
        return LedgerOutcome::Duplicate(action);
    }
    if !action.is_supported() {
        log::warn!("{action} is not supported yet; nothing was changed");
        return LedgerOutcome::Unsupported(action);
    }

    let entry = apply(state, &action);
    if entry.changed_anything() {
        state.undo_history.push(entry);
        LedgerOutcome::Committed(action)
    } else {
        LedgerOutcome::Rejected(action)
    }
}

/// Revert the most recent action and move it to the redo history.
pub fn undo(state: &mut TrackerState) -> LedgerOutcome {
    let Some(entry) = state.undo_history.pop() else {
        return LedgerOutcome::NothingToUndo;
    };
    revert(state, &entry);
    let action = entry.action.clone();
    state.redo_history.push(entry);
    LedgerOutcome::Undone(action)
}

/// Re-apply the most recently undone action.
///
/// Skips the duplicate check and replays exactly the effects recorded when
/// the action was committed; the current screen state is not consulted.
pub fn redo(state: &mut TrackerState) -> LedgerOutcome {
    let Some(entry) = state.redo_history.pop() else {
        return LedgerOutcome::NothingToRedo;
    };
    replay(state, &entry);
    let action = entry.action.clone();
    state.undo_history.push(entry);
    LedgerOutcome::Redone(action)
}

/// Claim `species` as the canon encounter at `location`.
///
/// Returns `false` (with a warning) when a canon species is already set;
/// an existing claim is never replaced.
pub fn mark_canon(state: &mut TrackerState, location: &str, species: &str) -> bool {
    let registry = state.encounters.entry(location.to_string()).or_default();
    if let Some(canon) = &registry.canon {
        log::warn!("{location} already has canon encounter {canon}; not marking {species}");
        return false;
    }
    registry.canon = Some(species.to_string());
    true
}

/// Release the canon claim at `location` if it is `species`.
pub fn unmark_canon(state: &mut TrackerState, location: &str, species: &str) -> bool {
    let Some(registry) = state.encounters.get_mut(location) else {
        return false;
    };
    if registry.canon.as_deref() != Some(species) {
        return false;
    }
    registry.canon = None;
    prune_registry(state, location);
    true
}

/// Forward effect. Roster membership and the canon claim are independent:
/// a capture is recorded even when the canon claim fails.
fn apply(state: &mut TrackerState, action: &Action) -> LedgerEntry {
    match action {
        Action::ToParty {
            member,
            is_new: true,
        } => {
            let (marked_canon, recorded_sighting) = claim(state, member);
            let added_member = state.party.insert(member.clone());
            LedgerEntry {
                action: action.clone(),
                marked_canon,
                recorded_sighting,
                added_member,
            }
        }
        Action::ToBoxed {
            member,
            is_new: true,
        } => {
            let (marked_canon, recorded_sighting) = claim(state, member);
            let added_member = state.boxed.insert(member.clone());
            LedgerEntry {
                action: action.clone(),
                marked_canon,
                recorded_sighting,
                added_member,
            }
        }
        Action::FailCanonEnc { member } => {
            let (marked_canon, recorded_sighting) = claim(state, member);
            LedgerEntry {
                action: action.clone(),
                marked_canon,
                recorded_sighting,
                added_member: false,
            }
        }
        Action::ToParty { is_new: false, .. }
        | Action::ToBoxed { is_new: false, .. }
        | Action::PartyToDead { .. }
        | Action::EditEnc { .. } => LedgerEntry::new(action.clone(), false),
    }
}

/// Inverse of [`apply`] for the recorded entry.
fn revert(state: &mut TrackerState, entry: &LedgerEntry) {
    match &entry.action {
        Action::ToParty {
            member,
            is_new: true,
        } => {
            if entry.added_member {
                state.party.remove(member);
            }
        }
        Action::ToBoxed {
            member,
            is_new: true,
        } => {
            if entry.added_member {
                state.boxed.remove(member);
            }
        }
        Action::FailCanonEnc { .. } => {}
        Action::ToParty { is_new: false, .. }
        | Action::ToBoxed { is_new: false, .. }
        | Action::PartyToDead { .. }
        | Action::EditEnc { .. } => {
            log::warn!("cannot undo unsupported {}", entry.action);
            return;
        }
    }
    let member = entry.action.member();
    if entry.marked_canon {
        unmark_canon(state, &member.location, &member.species);
    }
    if entry.recorded_sighting {
        forget_sighting(state, &member.location, &member.species);
    }
}

/// Forward effects recorded in `entry`, applied again.
fn replay(state: &mut TrackerState, entry: &LedgerEntry) {
    let member = entry.action.member();
    if entry.marked_canon {
        mark_canon(state, &member.location, &member.species);
    }
    if entry.recorded_sighting {
        state
            .encounters
            .entry(member.location.clone())
            .or_default()
            .record(&member.species);
    }
    if entry.added_member {
        match &entry.action {
            Action::ToParty { member, .. } => {
                state.party.insert(member.clone());
            }
            Action::ToBoxed { member, .. } => {
                state.boxed.insert(member.clone());
            }
            Action::PartyToDead { .. } | Action::FailCanonEnc { .. } | Action::EditEnc { .. } => {}
        }
    }
}

/// Claim canon for `member`, recording a sighting when the species has none.
///
/// Inside a wild battle the state machine counts the species on exit, so a
/// sighting is only recorded elsewhere.
fn claim(state: &mut TrackerState, member: &Member) -> (bool, bool) {
    let marked = mark_canon(state, &member.location, &member.species);
    let sighted = marked
        && !state.view_type.is_wild()
        && state.frequency(&member.location, &member.species) == 0;
    if sighted {
        state
            .encounters
            .entry(member.location.clone())
            .or_default()
            .record(&member.species);
    }
    (marked, sighted)
}

fn forget_sighting(state: &mut TrackerState, location: &str, species: &str) {
    if let Some(registry) = state.encounters.get_mut(location)
        && let Some(count) = registry.frequencies.get_mut(species)
    {
        *count = count.saturating_sub(1);
        if *count == 0 {
            registry.frequencies.remove(species);
        }
    }
    prune_registry(state, location);
}

/// A registry with no sightings and no canon carries no information.
fn prune_registry(state: &mut TrackerState, location: &str) {
    if state
        .encounters
        .get(location)
        .is_some_and(|registry| registry.canon.is_none() && registry.frequencies.is_empty())
    {
        state.encounters.remove(location);
    }
}
