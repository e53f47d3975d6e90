//! User command vocabulary and the cross-thread command queue.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::mpsc;
use thiserror::Error;

/// Commands the input listener can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserEvent {
    ToParty,
    ToBoxed,
    ToDead,
    FailEnc,
    EditEnc,
    UndoAction,
    RedoAction,
}

impl UserEvent {
    pub const ALL: [Self; 7] = [
        Self::ToParty,
        Self::ToBoxed,
        Self::ToDead,
        Self::FailEnc,
        Self::EditEnc,
        Self::UndoAction,
        Self::RedoAction,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToParty => "ToParty",
            Self::ToBoxed => "ToBoxed",
            Self::ToDead => "ToDead",
            Self::FailEnc => "FailEnc",
            Self::EditEnc => "EditEnc",
            Self::UndoAction => "UndoAction",
            Self::RedoAction => "RedoAction",
        }
    }
}

impl fmt::Display for UserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command token {token:?}")]
pub struct EventParseError {
    pub token: String,
}

impl FromStr for UserEvent {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| EventParseError {
                token: s.to_string(),
            })
    }
}

/// Producer half handed to the input listener thread.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<UserEvent>,
}

impl EventSender {
    /// Queue a command. Returns `false` once the tracker has shut down.
    pub fn send(&self, event: UserEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Queue a raw token. Tokens outside the command vocabulary are refused
    /// and never reach the queue.
    pub fn send_token(&self, token: &str) -> Result<bool, EventParseError> {
        token.parse::<UserEvent>().map(|event| self.send(event))
    }
}

/// Consumer half drained by the frame loop, one command per tick.
///
/// FIFO and unbounded: commands are never dropped, so a listener that
/// outpaces the frame loop grows the backlog.
#[derive(Debug)]
pub struct EventQueue {
    receiver: mpsc::Receiver<UserEvent>,
}

impl EventQueue {
    /// Next pending command, without blocking.
    #[must_use]
    pub fn next(&self) -> Option<UserEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Create a connected sender/queue pair.
#[must_use]
pub fn event_channel() -> (EventSender, EventQueue) {
    let (sender, receiver) = mpsc::channel();
    (EventSender { sender }, EventQueue { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_seven_tokens_parse() {
        for event in UserEvent::ALL {
            assert_eq!(event.as_str().parse::<UserEvent>(), Ok(event));
        }
        assert!("toparty".parse::<UserEvent>().is_err());
        assert!("Quit".parse::<UserEvent>().is_err());
    }

    #[test]
    fn queue_is_fifo_across_threads() {
        let (sender, queue) = event_channel();
        let listener = std::thread::spawn(move || {
            sender.send(UserEvent::ToParty);
            assert!(sender.send_token("Bogus").is_err());
            assert_eq!(sender.send_token("UndoAction"), Ok(true));
        });
        listener.join().unwrap();

        assert_eq!(queue.next(), Some(UserEvent::ToParty));
        assert_eq!(queue.next(), Some(UserEvent::UndoAction));
        assert_eq!(queue.next(), None);
    }
}
