use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use nuzlocke_core::{LedgerOutcome, Member, TickReport, TrackerState, ViewType};

use crate::self_check::ContextCheck;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerTally {
    pub committed: usize,
    pub duplicate: usize,
    pub rejected: usize,
    pub unsupported: usize,
    pub undone: usize,
    pub redone: usize,
    pub ignored: usize,
}

impl LedgerTally {
    fn count(&mut self, outcome: &LedgerOutcome) {
        match outcome {
            LedgerOutcome::Committed(_) => self.committed += 1,
            LedgerOutcome::Duplicate(_) => self.duplicate += 1,
            LedgerOutcome::Rejected(_) => self.rejected += 1,
            LedgerOutcome::Unsupported(_) => self.unsupported += 1,
            LedgerOutcome::Undone(_) => self.undone += 1,
            LedgerOutcome::Redone(_) => self.redone += 1,
            LedgerOutcome::NothingToUndo
            | LedgerOutcome::NothingToRedo
            | LedgerOutcome::NoAction => self.ignored += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesCount {
    pub species: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncounterRow {
    pub location: String,
    pub canon: Option<String>,
    pub species: Vec<SpeciesCount>,
}

/// End-of-run summary of the tracker state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub frames: usize,
    pub commands: usize,
    pub location: String,
    pub view: ViewType,
    pub party: Vec<Member>,
    pub boxed: Vec<Member>,
    pub dead: Vec<Member>,
    pub encounters: Vec<EncounterRow>,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub ledger: LedgerTally,
}

impl RunReport {
    pub fn new(state: &TrackerState, ticks: &[TickReport], commands: usize) -> Self {
        let mut ledger = LedgerTally::default();
        for tick in ticks {
            tick.automatic.iter().for_each(|outcome| ledger.count(outcome));
            if let Some((_, outcome)) = &tick.command {
                ledger.count(outcome);
            }
        }
        let encounters = state
            .encounters
            .iter()
            .map(|(location, registry)| EncounterRow {
                location: location.clone(),
                canon: registry.canon.clone(),
                species: registry
                    .frequencies
                    .iter()
                    .map(|(species, &count)| SpeciesCount {
                        species: species.clone(),
                        count,
                    })
                    .collect(),
            })
            .collect();
        Self {
            frames: ticks.len(),
            commands,
            location: state.location.clone(),
            view: state.view_type,
            party: state.party.iter().cloned().collect(),
            boxed: state.boxed.iter().cloned().collect(),
            dead: state.dead.iter().cloned().collect(),
            encounters,
            undo_depth: state.undo_history.len(),
            redo_depth: state.redo_history.len(),
            ledger,
        }
    }
}

pub fn generate_json_report(writer: &mut dyn Write, report: &RunReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    report: &RunReport,
    duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Run Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "==============".cyan())?;
    writeln!(writer, "Frames read: {}", report.frames)?;
    writeln!(writer, "Commands sent: {}", report.commands)?;
    writeln!(writer, "Location: {}", report.location.bold())?;
    writeln!(writer, "View: {}", report.view)?;
    writeln!(writer, "Time: {duration:?}")?;
    writeln!(writer)?;

    write_roster(writer, "🎒 Party", &report.party, |text| text.green().to_string())?;
    write_roster(writer, "📦 Boxed", &report.boxed, |text| text.blue().to_string())?;
    write_roster(writer, "🪦 Dead", &report.dead, |text| text.red().to_string())?;

    writeln!(writer, "{}", "🗺️  Encounters".bright_yellow().bold())?;
    if report.encounters.is_empty() {
        writeln!(writer, "   (none)")?;
    }
    for row in &report.encounters {
        writeln!(writer, "   {}", row.location.bold())?;
        for entry in &row.species {
            let line = format!("{} x{}", entry.species, entry.count);
            if row.canon.as_deref() == Some(entry.species.as_str()) {
                writeln!(writer, "     ★ {}", line.green())?;
            } else {
                writeln!(writer, "       {line}")?;
            }
        }
        if let Some(canon) = &row.canon
            && !row.species.iter().any(|entry| &entry.species == canon)
        {
            writeln!(writer, "     ★ {} (never counted)", canon.yellow())?;
        }
    }
    writeln!(writer)?;

    let tally = &report.ledger;
    writeln!(writer, "{}", "📜 Ledger".bright_yellow().bold())?;
    writeln!(
        writer,
        "   committed {}, duplicate {}, rejected {}, unsupported {}",
        tally.committed.to_string().green(),
        tally.duplicate,
        tally.rejected.to_string().yellow(),
        tally.unsupported.to_string().red()
    )?;
    writeln!(
        writer,
        "   undone {}, redone {}, ignored {}",
        tally.undone, tally.redone, tally.ignored
    )?;
    writeln!(
        writer,
        "   undo depth {}, redo depth {}",
        report.undo_depth, report.redo_depth
    )?;
    Ok(())
}

fn write_roster(
    writer: &mut dyn Write,
    title: &str,
    members: &[Member],
    paint: impl Fn(&str) -> String,
) -> Result<()> {
    writeln!(writer, "{} ({})", title.bold(), members.len())?;
    for member in members {
        writeln!(writer, "   • {}", paint(&member.to_string()))?;
    }
    writeln!(writer)?;
    Ok(())
}

pub fn generate_self_check_report(
    writer: &mut dyn Write,
    checks: &[ContextCheck],
    json: bool,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *writer, checks)?;
        writeln!(writer)?;
        return Ok(());
    }
    writeln!(writer, "{}", "🔎 Font Self-Check".bright_cyan().bold())?;
    writeln!(writer, "{}", "==================".cyan())?;
    for check in checks {
        let status = if check.failures.is_empty() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            writer,
            "{status} {} ({} characters)",
            check.context.as_str().bold(),
            check.characters
        )?;
        for failure in &check.failures {
            writeln!(
                writer,
                "     • rendered {:?}, read {:?}",
                failure.expected,
                failure.read
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuzlocke_core::{Action, UserEvent};

    fn sample_state() -> TrackerState {
        let mut state = TrackerState {
            location: "Route 201".to_string(),
            ..TrackerState::default()
        };
        let registry = state.encounters.entry("Route 201".to_string()).or_default();
        registry.record("Starly");
        registry.record("Starly");
        registry.record("Bidoof");
        registry.canon = Some("Starly".to_string());
        state.party.insert(Member::new("Route 201", "Starly"));
        state
    }

    fn tick(automatic: Vec<LedgerOutcome>, command: Option<(UserEvent, LedgerOutcome)>) -> TickReport {
        TickReport {
            view: ViewType::Overworld,
            location: "Route 201".to_string(),
            automatic,
            command,
        }
    }

    #[test]
    fn report_tallies_every_outcome() {
        let action = Action::ToParty {
            member: Member::new("Route 201", "Starly"),
            is_new: true,
        };
        let ticks = [
            tick(vec![], Some((UserEvent::ToParty, LedgerOutcome::Committed(action.clone())))),
            tick(vec![], Some((UserEvent::ToParty, LedgerOutcome::Duplicate(action)))),
            tick(vec![], Some((UserEvent::RedoAction, LedgerOutcome::NothingToRedo))),
            tick(vec![], None),
        ];
        let report = RunReport::new(&sample_state(), &ticks, 3);
        assert_eq!(report.frames, 4);
        assert_eq!(report.ledger.committed, 1);
        assert_eq!(report.ledger.duplicate, 1);
        assert_eq!(report.ledger.ignored, 1);
        assert_eq!(report.encounters[0].canon.as_deref(), Some("Starly"));
        assert_eq!(report.encounters[0].species.len(), 2);
    }

    #[test]
    fn json_report_is_machine_readable() {
        let report = RunReport::new(&sample_state(), &[], 0);
        let mut buffer = Vec::new();
        generate_json_report(&mut buffer, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["location"], "Route 201");
        assert_eq!(value["view"], "OVERWORLD");
        assert_eq!(value["party"][0]["species"], "Starly");
        assert_eq!(value["encounters"][0]["species"][0]["count"], 1);
    }

    #[test]
    fn console_report_marks_canon() {
        colored::control::set_override(false);
        let report = RunReport::new(&sample_state(), &[], 0);
        let mut buffer = Vec::new();
        generate_console_report(&mut buffer, &report, Duration::from_millis(5)).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("★ Starly x2"));
        assert!(text.contains("Bidoof x1"));
        assert!(text.contains("undo depth 0, redo depth 0"));
    }
}
