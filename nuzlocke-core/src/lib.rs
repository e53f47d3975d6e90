//! Nuzlocke Tracker Core
//!
//! Platform-agnostic tracking logic: bitmap-font text recognition, the
//! dialog-driven view state machine, command contextualization and the
//! undoable encounter ledger. Screen capture, hotkeys and rendering live
//! outside this crate.

pub mod action;
pub mod charsets;
pub mod config;
pub mod constants;
pub mod context;
pub mod data;
pub mod event;
pub mod fontmap;
pub mod glyph;
pub mod layout;
pub mod ledger;
pub mod recognizer;
pub mod session;
pub mod state;
pub mod view;

// Re-export commonly used types
pub use action::{Action, LedgerEntry};
pub use charsets::{Charsets, TextContext};
pub use config::TrackerConfig;
pub use context::decorate;
pub use data::ValidityTables;
pub use event::{EventParseError, EventQueue, EventSender, UserEvent, event_channel};
pub use fontmap::{Bijection, BijectionError, FontIndex, FontMap};
pub use glyph::{CharacterSet, ContextPalette, Glyph, GlyphError, GlyphStore, Sprite};
pub use layout::{Rect, ScreenLayout, SideLayout, SpeciesSlot, frame_from_capture};
pub use ledger::{LedgerOutcome, commit, handle_event, mark_canon, redo, undo, unmark_canon};
pub use recognizer::{MatchMode, parse_text, parse_text_row};
pub use session::{FrameReader, TickReport, TrackerSession};
pub use state::{EncounterRegistry, Member, RosterSnapshot, TrackerState, ViewType};
pub use view::{RecognizedText, ScreenText, advance};

/// Trait for abstracting save/load of the durable tracker state
/// Platform-specific implementations should provide this
pub trait TrackerStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save tracker state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be saved.
    fn save_state(&self, save_name: &str, state: &TrackerState) -> Result<(), Self::Error>;

    /// Load tracker state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded.
    fn load_state(&self, save_name: &str) -> Result<Option<TrackerState>, Self::Error>;

    /// Delete a saved run
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Binds recognition assets and storage to create and persist sessions.
pub struct TrackerEngine<S>
where
    S: TrackerStorage,
{
    storage: S,
    charsets: Charsets,
    tables: ValidityTables,
    config: TrackerConfig,
}

impl<S> TrackerEngine<S>
where
    S: TrackerStorage,
{
    /// Create a new engine with built character sets, validity tables and storage
    pub const fn new(
        storage: S,
        charsets: Charsets,
        tables: ValidityTables,
        config: TrackerConfig,
    ) -> Self {
        Self {
            storage,
            charsets,
            tables,
            config,
        }
    }

    /// Start a session from a fresh state.
    #[must_use]
    pub fn new_session(&self) -> TrackerSession {
        self.session_from(TrackerState::default())
    }

    /// Start a session from an existing state (transient fields are reset).
    #[must_use]
    pub fn session_from(&self, state: TrackerState) -> TrackerSession {
        TrackerSession::new(
            state,
            self.charsets.clone(),
            self.tables.clone(),
            self.config.clone(),
        )
    }

    /// Resume the named run, or start fresh when no save exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing save cannot be read.
    pub fn resume(&self, save_name: &str) -> Result<TrackerSession, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let state = self
            .storage
            .load_state(save_name)
            .map_err(Into::into)?
            .unwrap_or_default();
        Ok(self.session_from(state))
    }

    /// Save the durable part of a session's state
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be saved.
    pub fn save_session(&self, save_name: &str, session: &TrackerSession) -> Result<(), S::Error> {
        self.storage.save_state(save_name, session.state())
    }

    /// Delete the named run
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}
