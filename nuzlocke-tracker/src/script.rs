//! Scripted commands standing in for the hotkey listener.
//!
//! A script holds one `<frame> <Command>` pair per line; blank lines and
//! lines starting with `#` are skipped. The listener thread pushes each
//! frame's commands onto the tracker queue just before that frame is read.
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

use nuzlocke_core::EventSender;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: expected \"<frame> <command>\"")]
    Malformed { line: usize },
    #[error("line {line}: {frame:?} is not a frame number")]
    BadFrame { line: usize, frame: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandScript {
    by_frame: BTreeMap<usize, Vec<String>>,
}

impl CommandScript {
    /// Parse script text. Command tokens are kept verbatim; unknown ones are
    /// dropped by the queue, as stray keys would be.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut by_frame: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut parts = trimmed.split_whitespace();
            let (Some(frame), Some(token), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(ScriptError::Malformed { line });
            };
            let frame = frame.parse::<usize>().map_err(|_| ScriptError::BadFrame {
                line,
                frame: frame.to_string(),
            })?;
            by_frame.entry(frame).or_default().push(token.to_string());
        }
        Ok(Self { by_frame })
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read command script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid command script {}", path.display()))
    }

    pub fn commands_for(&self, frame: usize) -> &[String] {
        self.by_frame
            .get(&frame)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_frame.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_frame.is_empty()
    }

    pub fn last_frame(&self) -> Option<usize> {
        self.by_frame.keys().next_back().copied()
    }
}

/// Background thread feeding scripted commands into the tracker queue.
pub struct ScriptedListener {
    frames: mpsc::Sender<usize>,
    queued: mpsc::Receiver<usize>,
    handle: JoinHandle<usize>,
}

impl ScriptedListener {
    pub fn spawn(script: CommandScript, sender: EventSender) -> Self {
        let (frames, frame_rx) = mpsc::channel::<usize>();
        let (queued_tx, queued) = mpsc::channel::<usize>();
        let handle = thread::spawn(move || {
            let mut sent = 0;
            for frame in frame_rx {
                for token in script.commands_for(frame) {
                    match sender.send_token(token) {
                        Ok(true) => sent += 1,
                        Ok(false) => {
                            log::warn!("tracker queue closed; dropping {token}");
                            return sent;
                        }
                        Err(err) => log::debug!("frame {frame}: ignoring {err}"),
                    }
                }
                if queued_tx.send(frame).is_err() {
                    break;
                }
            }
            sent
        });
        Self {
            frames,
            queued,
            handle,
        }
    }

    /// Queue the commands scheduled for `frame` and wait until they are in.
    pub fn before_frame(&self, frame: usize) -> Result<()> {
        self.frames
            .send(frame)
            .context("command listener stopped")?;
        self.queued.recv().context("command listener stopped")?;
        Ok(())
    }

    /// Stop the listener; returns how many recognized commands it queued.
    pub fn finish(self) -> Result<usize> {
        let Self {
            frames,
            queued,
            handle,
        } = self;
        drop(frames);
        drop(queued);
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("command listener panicked"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuzlocke_core::{UserEvent, event_channel};

    #[test]
    fn script_groups_commands_by_frame() {
        let script = CommandScript::parse(
            "# capture Starly\n\n3 ToParty\n3 UndoAction\n 7   RedoAction \n9 Dance\n",
        )
        .unwrap();
        assert_eq!(script.commands_for(3), ["ToParty", "UndoAction"]);
        assert_eq!(script.commands_for(7), ["RedoAction"]);
        assert!(script.commands_for(4).is_empty());
        assert_eq!(script.len(), 4);
        assert_eq!(script.last_frame(), Some(9));
    }

    #[test]
    fn malformed_lines_are_reported_with_line_numbers() {
        assert_eq!(
            CommandScript::parse("1 ToParty\nToBoxed\n"),
            Err(ScriptError::Malformed { line: 2 })
        );
        assert_eq!(
            CommandScript::parse("1 ToParty extra"),
            Err(ScriptError::Malformed { line: 1 })
        );
        assert_eq!(
            CommandScript::parse("\nfirst FailEnc"),
            Err(ScriptError::BadFrame {
                line: 2,
                frame: "first".to_string()
            })
        );
    }

    #[test]
    fn listener_queues_commands_before_their_frame() {
        let script = CommandScript::parse("0 FailEnc\n2 UndoAction\n2 Jump\n2 RedoAction").unwrap();
        let (sender, queue) = event_channel();
        let listener = ScriptedListener::spawn(script, sender);

        listener.before_frame(0).unwrap();
        assert_eq!(queue.next(), Some(UserEvent::FailEnc));
        assert_eq!(queue.next(), None);

        listener.before_frame(1).unwrap();
        assert_eq!(queue.next(), None);

        listener.before_frame(2).unwrap();
        assert_eq!(queue.next(), Some(UserEvent::UndoAction));
        assert_eq!(queue.next(), Some(UserEvent::RedoAction));

        assert_eq!(listener.finish().unwrap(), 3);
    }
}
