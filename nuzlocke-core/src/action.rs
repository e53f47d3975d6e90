//! Invertible roster and encounter actions.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::Member;

/// A concrete change to the run, produced from a user command or from the
/// view state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Action {
    /// Place a member in the party; `is_new` also claims the location's canon
    /// encounter (otherwise the member moves over from the box).
    ToParty { member: Member, is_new: bool },
    /// Place a member in the box; `is_new` also claims the location's canon
    /// encounter (otherwise the member moves over from the party).
    ToBoxed { member: Member, is_new: bool },
    /// A party member fainted for good.
    PartyToDead { member: Member },
    /// Claim the location's canon encounter without a capture.
    FailCanonEnc { member: Member },
    /// Replace the species recorded for an encounter (trades, tokens).
    EditEnc {
        old_member: Option<Member>,
        new_member: Member,
    },
}

impl Action {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ToParty { .. } => "ToParty",
            Self::ToBoxed { .. } => "ToBoxed",
            Self::PartyToDead { .. } => "PartyToDead",
            Self::FailCanonEnc { .. } => "FailCanonEnc",
            Self::EditEnc { .. } => "EditEnc",
        }
    }

    /// Whether the ledger knows this variant's forward effect and inverse.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::ToParty { is_new: true, .. }
                | Self::ToBoxed { is_new: true, .. }
                | Self::FailCanonEnc { .. }
        )
    }

    /// Member the action is about (the new one, for edits).
    #[must_use]
    pub const fn member(&self) -> &Member {
        match self {
            Self::ToParty { member, .. }
            | Self::ToBoxed { member, .. }
            | Self::PartyToDead { member }
            | Self::FailCanonEnc { member } => member,
            Self::EditEnc { new_member, .. } => new_member,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToParty { member, is_new } | Self::ToBoxed { member, is_new } => {
                let origin = if *is_new { "new" } else { "moved" };
                write!(f, "{}({member}, {origin})", self.kind())
            }
            Self::PartyToDead { member } | Self::FailCanonEnc { member } => {
                write!(f, "{}({member})", self.kind())
            }
            Self::EditEnc {
                old_member,
                new_member,
            } => match old_member {
                Some(old) => write!(f, "EditEnc({old} -> {new_member})"),
                None => write!(f, "EditEnc(-> {new_member})"),
            },
        }
    }
}

/// An action as recorded in the undo/redo history.
///
/// The flags remember what applying the action actually changed, so the
/// inverse only undoes what it made itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub action: Action,
    #[serde(default)]
    pub marked_canon: bool,
    /// A sighting was recorded so the new canon species has a frequency.
    #[serde(default)]
    pub recorded_sighting: bool,
    /// The member was not already on the roster.
    #[serde(default)]
    pub added_member: bool,
}

impl LedgerEntry {
    #[must_use]
    pub const fn new(action: Action, marked_canon: bool) -> Self {
        Self {
            action,
            marked_canon,
            recorded_sighting: false,
            added_member: false,
        }
    }

    /// Whether applying the action changed anything at all.
    #[must_use]
    pub const fn changed_anything(&self) -> bool {
        self.marked_canon || self.recorded_sighting || self.added_member
    }
}
