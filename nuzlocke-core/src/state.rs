use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::action::LedgerEntry;
use crate::constants::DEFAULT_LOCATION;

/// The tracker's belief about which game screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewType {
    /// Managing members in the storage system.
    PcBox,
    /// Summary screen opened from the party menu.
    SummaryParty,
    /// Party menu (choosing a member).
    PartyMenu,
    /// Naming or sending away a freshly caught member.
    Nickname,
    /// Not in battle.
    #[default]
    Overworld,
    WildSingle,
    TrainerSingle,
    /// Doubles wild encounter (only in specific locations).
    WildDouble,
    TrainerDouble,
}

impl ViewType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PcBox => "PC_BOX",
            Self::SummaryParty => "SUMMARY_PARTY",
            Self::PartyMenu => "PARTY_MENU",
            Self::Nickname => "NICKNAME",
            Self::Overworld => "OVERWORLD",
            Self::WildSingle => "WILD_SINGLE",
            Self::TrainerSingle => "TRAINER_SINGLE",
            Self::WildDouble => "WILD_DOUBLE",
            Self::TrainerDouble => "TRAINER_DOUBLE",
        }
    }

    #[must_use]
    pub const fn is_wild(self) -> bool {
        matches!(self, Self::WildSingle | Self::WildDouble)
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PC_BOX" => Ok(Self::PcBox),
            "SUMMARY_PARTY" => Ok(Self::SummaryParty),
            "PARTY_MENU" => Ok(Self::PartyMenu),
            "NICKNAME" => Ok(Self::Nickname),
            "OVERWORLD" => Ok(Self::Overworld),
            "WILD_SINGLE" => Ok(Self::WildSingle),
            "TRAINER_SINGLE" => Ok(Self::TrainerSingle),
            "WILD_DOUBLE" => Ok(Self::WildDouble),
            "TRAINER_DOUBLE" => Ok(Self::TrainerDouble),
            _ => Err(()),
        }
    }
}

/// A roster entry: where and as what it was encountered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Member {
    pub location: String,
    pub species: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl Member {
    #[must_use]
    pub fn new(location: impl Into<String>, species: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            species: species.into(),
            nickname: None,
        }
    }

    #[must_use]
    pub fn with_nickname(mut self, nickname: Option<String>) -> Self {
        self.nickname = nickname;
        self
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nickname {
            Some(nickname) => write!(f, "{nickname} ({} @ {})", self.species, self.location),
            None => write!(f, "{} @ {}", self.species, self.location),
        }
    }
}

/// Encounter bookkeeping for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EncounterRegistry {
    /// How often each species has been met here.
    #[serde(default)]
    pub frequencies: BTreeMap<String, u32>,
    /// The single species this location is committed to, if any.
    #[serde(default)]
    pub canon: Option<String>,
}

impl EncounterRegistry {
    pub fn record(&mut self, species: &str) {
        *self.frequencies.entry(species.to_string()).or_insert(0) += 1;
    }

    #[must_use]
    pub fn frequency(&self, species: &str) -> u32 {
        self.frequencies.get(species).copied().unwrap_or(0)
    }
}

/// Roster and encounter tables, compared wholesale by undo/redo tests and
/// reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterSnapshot {
    pub party: BTreeSet<Member>,
    pub boxed: BTreeSet<Member>,
    pub dead: BTreeSet<Member>,
    pub encounters: BTreeMap<String, EncounterRegistry>,
}

/// Aggregate tracker state.
///
/// Transient fields describe the current screen and battle; they are never
/// saved and reset to their defaults on load. Durable fields are the run
/// itself and round-trip through serialization unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    #[serde(skip)]
    pub view_type: ViewType,
    /// Foes still standing; always 0 outside battle.
    #[serde(skip)]
    pub foes_left: u8,
    /// Opposing species last seen (left, right); kept until the location changes.
    #[serde(skip)]
    pub last_species: [String; 2],
    /// Player-side species last seen in battle (left, right).
    #[serde(skip)]
    pub our_species: [String; 2],
    #[serde(skip)]
    pub last_nickname: Option<String>,
    /// Between a capture and the capture being placed.
    #[serde(skip)]
    pub adding_encounter: bool,
    /// The current battle has already been counted in `encounters`.
    #[serde(skip)]
    pub encounters_updated: bool,
    /// Dialog tokens from the previous frame.
    #[serde(skip)]
    pub last_dialog: Vec<String>,

    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub encounters: BTreeMap<String, EncounterRegistry>,
    #[serde(default)]
    pub party: BTreeSet<Member>,
    #[serde(default)]
    pub boxed: BTreeSet<Member>,
    #[serde(default)]
    pub dead: BTreeSet<Member>,
    /// Append and pop from the end only.
    #[serde(default)]
    pub undo_history: Vec<LedgerEntry>,
    /// Cleared whenever a new action is committed.
    #[serde(default)]
    pub redo_history: Vec<LedgerEntry>,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            view_type: ViewType::default(),
            foes_left: 0,
            last_species: [String::new(), String::new()],
            our_species: [String::new(), String::new()],
            last_nickname: None,
            adding_encounter: false,
            encounters_updated: false,
            last_dialog: Vec::new(),
            location: default_location(),
            encounters: BTreeMap::new(),
            party: BTreeSet::new(),
            boxed: BTreeSet::new(),
            dead: BTreeSet::new(),
            undo_history: Vec::new(),
            redo_history: Vec::new(),
        }
    }
}

impl TrackerState {
    /// Serialize the durable fields.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore durable fields from JSON; transient fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a saved tracker.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Drop everything tied to the current screen, keeping the run.
    pub fn reset_transient(&mut self) {
        let fresh = Self::default();
        self.view_type = fresh.view_type;
        self.foes_left = fresh.foes_left;
        self.last_species = fresh.last_species;
        self.our_species = fresh.our_species;
        self.last_nickname = fresh.last_nickname;
        self.adding_encounter = fresh.adding_encounter;
        self.encounters_updated = fresh.encounters_updated;
        self.last_dialog = fresh.last_dialog;
    }

    /// Species the player most plausibly means: the left slot, else the right.
    #[must_use]
    pub fn preferred_species(&self) -> Option<&str> {
        let [left, right] = &self.last_species;
        if !left.is_empty() {
            Some(left.as_str())
        } else if !right.is_empty() {
            Some(right.as_str())
        } else {
            None
        }
    }

    #[must_use]
    pub fn canon(&self, location: &str) -> Option<&str> {
        self.encounters
            .get(location)
            .and_then(|registry| registry.canon.as_deref())
    }

    #[must_use]
    pub fn frequency(&self, location: &str, species: &str) -> u32 {
        self.encounters
            .get(location)
            .map_or(0, |registry| registry.frequency(species))
    }

    #[must_use]
    pub fn roster_snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            party: self.party.clone(),
            boxed: self.boxed.clone(),
            dead: self.dead.clone(),
            encounters: self.encounters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    #[test]
    fn save_round_trip_keeps_durable_and_resets_transient() {
        let mut state = TrackerState {
            location: "Route 201".to_string(),
            view_type: ViewType::WildDouble,
            foes_left: 2,
            last_species: ["Starly".to_string(), "Bidoof".to_string()],
            ..TrackerState::default()
        };
        state.encounters.entry("Route 201".to_string()).or_default().record("Starly");
        let member = Member::new("Route 201", "Starly").with_nickname(Some("Sky".to_string()));
        state.party.insert(member.clone());
        state.undo_history.push(LedgerEntry::new(Action::ToParty {
            member,
            is_new: true,
        }, true));

        let json = state.to_json().unwrap();
        let restored = TrackerState::from_json(&json).unwrap();

        assert_eq!(restored.location, state.location);
        assert_eq!(restored.encounters, state.encounters);
        assert_eq!(restored.party, state.party);
        assert_eq!(restored.undo_history, state.undo_history);
        assert_eq!(restored.view_type, ViewType::Overworld);
        assert_eq!(restored.foes_left, 0);
        assert_eq!(restored.last_species, [String::new(), String::new()]);
        assert!(!json.contains("view_type"));
    }

    #[test]
    fn empty_save_uses_defaults() {
        let state = TrackerState::from_json("{}").unwrap();
        assert_eq!(state, TrackerState::default());
        assert_eq!(state.location, DEFAULT_LOCATION);
    }

    #[test]
    fn preferred_species_falls_back_to_right_slot() {
        let mut state = TrackerState::default();
        assert_eq!(state.preferred_species(), None);
        state.last_species[1] = "Zubat".to_string();
        assert_eq!(state.preferred_species(), Some("Zubat"));
        state.last_species[0] = "Geodude".to_string();
        assert_eq!(state.preferred_species(), Some("Geodude"));
    }

    #[test]
    fn view_type_names_round_trip() {
        for view in [ViewType::PcBox, ViewType::WildDouble, ViewType::SummaryParty] {
            assert_eq!(view.as_str().parse::<ViewType>(), Ok(view));
        }
        assert!("BATTLE".parse::<ViewType>().is_err());
    }
}
