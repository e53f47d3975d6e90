//! Dialog-driven view and battle state machine.
//!
//! Each frame the dialog box is matched against an ordered rule list for the
//! current [`ViewType`]; the first matching rule moves the machine and
//! updates battle bookkeeping. The location strip and species strips are then
//! read according to the (possibly new) view.
use crate::action::Action;
use crate::constants::{DOUBLE_FOES, SINGLE_FOES};
use crate::data::ValidityTables;
use crate::layout::SpeciesSlot;
use crate::state::{Member, TrackerState, ViewType};

/// Recognized text for one frame, read lazily by the state machine.
///
/// Only the regions the current view needs are requested.
pub trait ScreenText {
    /// Words in the dialog box, in reading order.
    fn dialog(&mut self) -> Vec<String>;
    /// Location strip text, words joined by single spaces.
    fn location(&mut self) -> String;
    /// Species strip text, words joined by single spaces.
    fn species(&mut self, slot: SpeciesSlot) -> String;
}

/// Pre-recognized screen text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedText {
    pub dialog: Vec<String>,
    pub location: String,
    /// Opposing species (left, right); singles use the left slot.
    pub foes: [String; 2],
    /// Player species (left, right); singles use the left slot.
    pub allies: [String; 2],
}

impl RecognizedText {
    /// Screen showing only the given dialog line.
    #[must_use]
    pub fn dialog_line(line: &str) -> Self {
        Self {
            dialog: line.split_whitespace().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    #[must_use]
    pub fn with_foes(mut self, left: &str, right: &str) -> Self {
        self.foes = [left.to_string(), right.to_string()];
        self
    }

    #[must_use]
    pub fn with_allies(mut self, left: &str, right: &str) -> Self {
        self.allies = [left.to_string(), right.to_string()];
        self
    }
}

impl ScreenText for RecognizedText {
    fn dialog(&mut self) -> Vec<String> {
        self.dialog.clone()
    }

    fn location(&mut self) -> String {
        self.location.clone()
    }

    fn species(&mut self, slot: SpeciesSlot) -> String {
        match slot {
            SpeciesSlot::FoeSingle | SpeciesSlot::FoeLeft => self.foes[0].clone(),
            SpeciesSlot::FoeRight => self.foes[1].clone(),
            SpeciesSlot::AllySingle | SpeciesSlot::AllyLeft => self.allies[0].clone(),
            SpeciesSlot::AllyRight => self.allies[1].clone(),
        }
    }
}

/// Matches exactly one token of any value.
const ANY: &str = "_";

/// A dialog token pattern.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    /// Literal prefix, optional wildcard span, literal suffix.
    Sequence {
        prefix: &'static [&'static str],
        span: bool,
        suffix: &'static [&'static str],
    },
    /// Any one of the words appears anywhere.
    Contains(&'static [&'static str]),
}

impl Pattern {
    const fn exact(tokens: &'static [&'static str]) -> Self {
        Self::Sequence {
            prefix: tokens,
            span: false,
            suffix: &[],
        }
    }

    const fn span(prefix: &'static [&'static str], suffix: &'static [&'static str]) -> Self {
        Self::Sequence {
            prefix,
            span: true,
            suffix,
        }
    }

    /// Returns the tokens under the wildcard span when the pattern matches.
    fn capture<'a>(&self, tokens: &'a [String]) -> Option<&'a [String]> {
        match *self {
            Self::Sequence {
                prefix,
                span,
                suffix,
            } => {
                let fixed = prefix.len() + suffix.len();
                if tokens.len() < fixed || (!span && tokens.len() != fixed) {
                    return None;
                }
                let end = tokens.len() - suffix.len();
                (literals_match(prefix, &tokens[..prefix.len()])
                    && literals_match(suffix, &tokens[end..]))
                .then(|| &tokens[prefix.len()..end])
            }
            Self::Contains(words) => tokens
                .iter()
                .any(|token| words.contains(&token.as_str()))
                .then_some(&tokens[..0]),
        }
    }
}

fn literals_match(pattern: &[&str], tokens: &[String]) -> bool {
    pattern
        .iter()
        .zip(tokens)
        .all(|(expected, token)| *expected == ANY || expected == token)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    OpenPc,
    TrainerChallenge,
    WildAppeared,
    FoeGone,
    Escaped,
    Caught,
    Transferred,
    ChooseMember,
    PartyOptions,
    SummaryClosed,
    TrainerDefeated,
    ClosePc,
}

struct Rule {
    pattern: Pattern,
    transition: Transition,
}

const fn rule(pattern: Pattern, transition: Transition) -> Rule {
    Rule {
        pattern,
        transition,
    }
}

const OVERWORLD_RULES: &[Rule] = &[
    rule(
        Pattern::exact(&["The", "Pokémon", "Storage", "System", "was", "accessed"]),
        Transition::OpenPc,
    ),
    rule(
        Pattern::span(&["You", "are", "challenged", "by"], &[]),
        Transition::TrainerChallenge,
    ),
    rule(
        Pattern::span(&["A", "wild"], &["appeared"]),
        Transition::WildAppeared,
    ),
];

const WILD_RULES: &[Rule] = &[
    rule(
        Pattern::span(&["The", "wild"], &["fainted"]),
        Transition::FoeGone,
    ),
    rule(Pattern::span(&["The", "wild"], &["fled"]), Transition::FoeGone),
    rule(Pattern::exact(&["Got", "away", "safely"]), Transition::Escaped),
    rule(
        Pattern::span(&["Gotcha"], &["was", "caught"]),
        Transition::Caught,
    ),
];

const TRAINER_RULES: &[Rule] = &[rule(
    Pattern::Contains(&["defeated", "beat"]),
    Transition::TrainerDefeated,
)];

const NICKNAME_RULES: &[Rule] = &[
    rule(
        Pattern::span(&[], &["was", "transferred", "to", "BOX", ANY, "in", ANY, "PC"]),
        Transition::Transferred,
    ),
    rule(
        Pattern::exact(&["Choose", "a", "Pokémon"]),
        Transition::ChooseMember,
    ),
];

const PARTY_MENU_RULES: &[Rule] = &[rule(
    Pattern::span(&["Do", "what", "with"], &[]),
    Transition::PartyOptions,
)];

const SUMMARY_RULES: &[Rule] = &[rule(
    Pattern::exact(&["Choose", "a", "Pokémon"]),
    Transition::SummaryClosed,
)];

const PC_RULES: &[Rule] = &[rule(
    Pattern::exact(&["Which", "PC", "should", "be", "accessed"]),
    Transition::ClosePc,
)];

fn rules_for(state: &TrackerState) -> &'static [Rule] {
    match state.view_type {
        ViewType::Overworld => OVERWORLD_RULES,
        ViewType::WildSingle | ViewType::WildDouble => WILD_RULES,
        ViewType::TrainerSingle | ViewType::TrainerDouble => TRAINER_RULES,
        ViewType::Nickname => NICKNAME_RULES,
        ViewType::PartyMenu if state.adding_encounter => PARTY_MENU_RULES,
        ViewType::PartyMenu => &[],
        ViewType::SummaryParty => SUMMARY_RULES,
        ViewType::PcBox => PC_RULES,
    }
}

/// Advance the machine by one frame.
///
/// Dialog rules fire only when the dialog differs from the previous frame,
/// so calling this repeatedly on an unchanged screen never re-applies an
/// effect. Returns actions the machine decided on by itself (a capture sent
/// straight to the box) for the caller to commit.
pub fn advance<T>(state: &mut TrackerState, screen: &mut T, tables: &ValidityTables) -> Vec<Action>
where
    T: ScreenText + ?Sized,
{
    let mut actions = Vec::new();

    let dialog = screen.dialog();
    if dialog != state.last_dialog {
        let matched = rules_for(state)
            .iter()
            .find_map(|rule| rule.pattern.capture(&dialog).map(|rest| (rule.transition, rest)));
        if let Some((transition, rest)) = matched {
            let before = state.view_type;
            actions.extend(apply_transition(state, transition, rest));
            if before != state.view_type {
                log::debug!("view {before} -> {} on {:?}", state.view_type, dialog);
            }
        }
        state.last_dialog = dialog;
    }

    match state.view_type {
        ViewType::Overworld => update_location(state, screen, tables),
        ViewType::WildSingle | ViewType::TrainerSingle => {
            update_slot(&mut state.last_species[0], screen.species(SpeciesSlot::FoeSingle), tables);
            state.last_species[1].clear();
            update_slot(&mut state.our_species[0], screen.species(SpeciesSlot::AllySingle), tables);
            state.our_species[1].clear();
        }
        ViewType::WildDouble | ViewType::TrainerDouble => {
            update_slot(&mut state.last_species[0], screen.species(SpeciesSlot::FoeLeft), tables);
            update_slot(&mut state.last_species[1], screen.species(SpeciesSlot::FoeRight), tables);
            update_slot(&mut state.our_species[0], screen.species(SpeciesSlot::AllyLeft), tables);
            update_slot(&mut state.our_species[1], screen.species(SpeciesSlot::AllyRight), tables);
        }
        ViewType::PcBox | ViewType::SummaryParty | ViewType::PartyMenu | ViewType::Nickname => {}
    }

    auto_track(state);
    actions
}

fn apply_transition(
    state: &mut TrackerState,
    transition: Transition,
    rest: &[String],
) -> Option<Action> {
    match transition {
        Transition::OpenPc => state.view_type = ViewType::PcBox,
        Transition::ClosePc => state.view_type = ViewType::Overworld,
        Transition::TrainerChallenge => {
            start_battle(state);
            state.view_type = if has_partner(rest, &["and", "&"]) {
                ViewType::TrainerDouble
            } else {
                ViewType::TrainerSingle
            };
        }
        Transition::WildAppeared => {
            start_battle(state);
            if has_partner(rest, &["and"]) {
                state.view_type = ViewType::WildDouble;
                state.foes_left = DOUBLE_FOES;
            } else {
                state.view_type = ViewType::WildSingle;
                state.foes_left = SINGLE_FOES;
            }
        }
        Transition::FoeGone => {
            state.foes_left = state.foes_left.saturating_sub(1);
            if state.foes_left == 0 {
                leave_wild(state);
                state.encounters_updated = false;
            }
        }
        Transition::Escaped => {
            state.foes_left = 0;
            leave_wild(state);
            state.encounters_updated = false;
        }
        Transition::Caught => {
            state.foes_left = 0;
            leave_wild(state);
            state.view_type = ViewType::Nickname;
            state.adding_encounter = true;
        }
        Transition::Transferred => {
            state.view_type = ViewType::Overworld;
            state.adding_encounter = false;
            state.last_nickname = nickname_from(state, rest);
            let species = state.preferred_species()?.to_string();
            if already_placed(state, &species) {
                log::debug!("{species} was placed by command before the transfer");
                return None;
            }
            let member = Member::new(state.location.clone(), species)
                .with_nickname(state.last_nickname.clone());
            return Some(Action::ToBoxed {
                member,
                is_new: true,
            });
        }
        Transition::ChooseMember => state.view_type = ViewType::PartyMenu,
        Transition::PartyOptions => {
            state.last_nickname = nickname_from(state, rest);
            state.view_type = ViewType::SummaryParty;
        }
        Transition::SummaryClosed => {
            state.view_type = if state.adding_encounter {
                ViewType::Nickname
            } else {
                ViewType::Overworld
            };
        }
        Transition::TrainerDefeated => state.view_type = ViewType::Overworld,
    }
    None
}

fn has_partner(rest: &[String], joiners: &[&str]) -> bool {
    rest.iter().any(|token| joiners.contains(&token.as_str()))
}

/// Battle context from an earlier fight must not carry into a new one.
fn start_battle(state: &mut TrackerState) {
    state.last_species = [String::new(), String::new()];
    state.our_species = [String::new(), String::new()];
    state.last_nickname = None;
    state.encounters_updated = false;
}

/// Count whatever species are known before the battle view is left.
fn leave_wild(state: &mut TrackerState) {
    if !state.encounters_updated {
        count_known(state);
    }
    state.view_type = ViewType::Overworld;
}

/// The most recent ledger entry already put this capture in the party or a
/// box and claimed canon for it.
fn already_placed(state: &TrackerState, species: &str) -> bool {
    state.canon(&state.location) == Some(species)
        && state.undo_history.last().is_some_and(|entry| match &entry.action {
            Action::ToParty {
                member,
                is_new: true,
            }
            | Action::ToBoxed {
                member,
                is_new: true,
            } => member.location == state.location && member.species == species,
            _ => false,
        })
}

/// Dialog names the member by species when it was not given a nickname.
fn nickname_from(state: &TrackerState, rest: &[String]) -> Option<String> {
    let name = rest.join(" ");
    if name.is_empty() || state.preferred_species() == Some(name.as_str()) {
        None
    } else {
        Some(name)
    }
}

fn update_location<T>(state: &mut TrackerState, screen: &mut T, tables: &ValidityTables)
where
    T: ScreenText + ?Sized,
{
    let location = screen.location();
    if location.is_empty() || location == state.location || !tables.is_location(&location) {
        return;
    }
    log::debug!("location {} -> {location}", state.location);
    state.location = location;
    state.last_species = [String::new(), String::new()];
    state.last_nickname = None;
    state.encounters_updated = false;
}

/// Blank or mid-animation strips never overwrite a known species.
fn update_slot(slot: &mut String, recognized: String, tables: &ValidityTables) {
    if !recognized.is_empty() && tables.is_species(&recognized) {
        *slot = recognized;
    }
}

fn auto_track(state: &mut TrackerState) {
    if state.encounters_updated {
        return;
    }
    let [left, right] = &state.last_species;
    let ready = match state.view_type {
        ViewType::WildSingle => !left.is_empty(),
        // Both foes are on screen together; wait until both strips read.
        ViewType::WildDouble => !left.is_empty() && !right.is_empty(),
        _ => false,
    };
    if ready {
        count_known(state);
    }
}

fn count_known(state: &mut TrackerState) {
    let known: Vec<String> = state
        .last_species
        .iter()
        .filter(|species| !species.is_empty())
        .cloned()
        .collect();
    if known.is_empty() {
        return;
    }
    let registry = state.encounters.entry(state.location.clone()).or_default();
    for species in &known {
        registry.record(species);
    }
    log::debug!("encounter at {}: {}", state.location, known.join(", "));
    state.encounters_updated = true;
}
