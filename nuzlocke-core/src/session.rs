use image::{RgbImage, RgbaImage};
use serde::Serialize;

use crate::charsets::{Charsets, TextContext};
use crate::config::TrackerConfig;
use crate::data::ValidityTables;
use crate::event::{EventQueue, UserEvent};
use crate::layout::{Rect, ScreenLayout, SpeciesSlot, frame_from_capture};
use crate::ledger::{self, LedgerOutcome};
use crate::recognizer::{MatchMode, parse_text};
use crate::state::{TrackerState, ViewType};
use crate::view::{self, ScreenText};

/// Reads layout regions out of one native-resolution frame on demand.
pub struct FrameReader<'a> {
    frame: &'a RgbImage,
    charsets: &'a Charsets,
    layout: &'a ScreenLayout,
    mode: MatchMode,
}

impl<'a> FrameReader<'a> {
    #[must_use]
    pub const fn new(
        frame: &'a RgbImage,
        charsets: &'a Charsets,
        layout: &'a ScreenLayout,
        mode: MatchMode,
    ) -> Self {
        Self {
            frame,
            charsets,
            layout,
            mode,
        }
    }

    fn words(&self, region: Rect, context: TextContext) -> Vec<String> {
        parse_text(&region.crop(self.frame), self.charsets.get(context), self.mode)
    }
}

impl ScreenText for FrameReader<'_> {
    fn dialog(&mut self) -> Vec<String> {
        self.words(self.layout.dialog, TextContext::Dialog)
    }

    fn location(&mut self) -> String {
        self.words(self.layout.location, TextContext::Locations).join(" ")
    }

    fn species(&mut self, slot: SpeciesSlot) -> String {
        self.words(self.layout.species(slot), TextContext::Species).join(" ")
    }
}

/// What happened during one frame tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub view: ViewType,
    pub location: String,
    /// Actions the state machine produced by itself, as committed.
    pub automatic: Vec<LedgerOutcome>,
    /// The user command drained this tick, if any.
    pub command: Option<(UserEvent, LedgerOutcome)>,
}

impl TickReport {
    /// Whether anything reached the ledger this tick.
    #[must_use]
    pub fn touched_ledger(&self) -> bool {
        !self.automatic.is_empty() || self.command.is_some()
    }
}

/// Live tracker: state plus everything needed to read frames.
#[derive(Debug, Clone)]
pub struct TrackerSession {
    state: TrackerState,
    charsets: Charsets,
    tables: ValidityTables,
    config: TrackerConfig,
}

impl TrackerSession {
    /// Start tracking from `state`; transient fields are reset.
    #[must_use]
    pub fn new(
        mut state: TrackerState,
        charsets: Charsets,
        tables: ValidityTables,
        config: TrackerConfig,
    ) -> Self {
        state.reset_transient();
        Self {
            state,
            charsets,
            tables,
            config,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &TrackerState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> TrackerState {
        self.state
    }

    /// Process one native-resolution frame and at most one queued command.
    pub fn tick(&mut self, frame: &RgbImage, queue: &EventQueue) -> TickReport {
        let mut reader = FrameReader::new(
            frame,
            &self.charsets,
            &self.config.layout,
            self.config.match_mode(),
        );
        step(&mut self.state, &mut reader, &self.tables, queue.next())
    }

    /// Process a raw capture, downscaling it by the configured factor first.
    pub fn tick_capture(&mut self, capture: &RgbaImage, queue: &EventQueue) -> TickReport {
        let frame = frame_from_capture(capture, self.config.scale);
        self.tick(&frame, queue)
    }

    /// Process already-recognized text (replays and tests).
    pub fn tick_text<T>(&mut self, screen: &mut T, event: Option<UserEvent>) -> TickReport
    where
        T: ScreenText + ?Sized,
    {
        step(&mut self.state, screen, &self.tables, event)
    }
}

fn step<T>(
    state: &mut TrackerState,
    screen: &mut T,
    tables: &ValidityTables,
    event: Option<UserEvent>,
) -> TickReport
where
    T: ScreenText + ?Sized,
{
    let automatic = view::advance(state, screen, tables)
        .into_iter()
        .map(|action| ledger::commit(state, Some(action)))
        .collect();
    let command = event.map(|event| {
        let outcome = ledger::handle_event(state, event);
        log::debug!("{event}: {outcome}");
        (event, outcome)
    });
    TickReport {
        view: state.view_type,
        location: state.location.clone(),
        automatic,
        command,
    }
}
