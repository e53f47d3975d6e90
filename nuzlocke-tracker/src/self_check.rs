use serde::Serialize;

use nuzlocke_core::{Charsets, MatchMode, TextContext, parse_text};

/// Characters rendered per reference line.
const LINE_CHARACTERS: usize = 12;

/// A reference line the recognizer did not read back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    pub context: TextContext,
    pub expected: String,
    pub read: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextCheck {
    pub context: TextContext,
    pub characters: usize,
    pub failures: Vec<CheckFailure>,
}

/// Render each context's whole vocabulary with its own templates and read
/// it back.
pub fn verify_charsets(charsets: &Charsets, mode: MatchMode) -> Vec<ContextCheck> {
    TextContext::ALL
        .into_iter()
        .map(|context| {
            let set = charsets.get(context);
            let characters: Vec<char> = set.characters().collect();
            let mut failures = Vec::new();
            for chunk in characters.chunks(LINE_CHARACTERS) {
                let expected: String = chunk.iter().collect();
                let read = match set.render(&expected) {
                    Ok(line) => parse_text(&line, set, mode),
                    Err(err) => {
                        log::warn!("{context}: cannot render {expected:?}: {err}");
                        Vec::new()
                    }
                };
                if read.len() != 1 || read[0] != expected {
                    failures.push(CheckFailure {
                        context,
                        expected,
                        read,
                    });
                }
            }
            ContextCheck {
                context,
                characters: characters.len(),
                failures,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sets_pass_trivially() {
        let checks = verify_charsets(&Charsets::empty(), MatchMode::Plain);
        assert_eq!(checks.len(), TextContext::ALL.len());
        assert!(checks.iter().all(|check| check.characters == 0 && check.failures.is_empty()));
    }
}
