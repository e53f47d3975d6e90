mod assets;
mod frames;
mod reports;
mod script;
mod self_check;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use nuzlocke_core::{TickReport, TrackerEngine, TrackerSession, event_channel};

use assets::TrackerAssets;
use reports::RunReport;
use script::{CommandScript, ScriptedListener};
use storage::JsonFileStorage;

#[derive(Debug, Parser)]
#[command(name = "nuzlocke-tracker", version = "0.1.0")]
#[command(about = "Reads game screenshots frame by frame and keeps the Nuzlocke run ledger")]
struct Args {
    /// Directory of PNG captures, processed in file name order
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Font index JSON mapping each character to its sprite file name
    #[arg(long)]
    font_index: PathBuf,

    /// Directory holding the font's sprite PNGs
    #[arg(long)]
    sprites: PathBuf,

    /// Tracker configuration JSON (scale, masked matching, screen layout)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Valid location and species names JSON (defaults to the bundled tables)
    #[arg(long)]
    names: Option<PathBuf>,

    /// Save file for the run; loaded when present and written after the last frame
    #[arg(long)]
    save: Option<PathBuf>,

    /// Scripted commands, one "<frame> <Command>" per line
    #[arg(long)]
    events: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print a line for every frame that touches the ledger or changes view
    #[arg(short, long)]
    verbose: bool,

    /// Render every vocabulary through its character set and read it back, then exit
    #[arg(long)]
    self_check: bool,

    /// Ignore template background pixels while matching
    #[arg(long)]
    masked: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();
    let start_time = Instant::now();

    let mut assets = TrackerAssets::load(
        &args.font_index,
        &args.sprites,
        args.config.as_deref(),
        args.names.as_deref(),
    )?;
    if args.masked {
        assets.config.masked = true;
    }

    if args.self_check {
        let checks = self_check::verify_charsets(&assets.charsets, assets.config.match_mode());
        let mut output_target = OutputTarget::new(args.output.clone())?;
        reports::generate_self_check_report(
            &mut output_target,
            &checks,
            args.report == "json",
        )?;
        output_target.flush_inner()?;
        if checks.iter().any(|check| !check.failures.is_empty()) {
            std::process::exit(1);
        }
        return Ok(());
    }

    let (storage, save_name) = match &args.save {
        Some(path) => {
            let (storage, name) = JsonFileStorage::for_save_path(path)
                .with_context(|| format!("invalid save path {}", path.display()))?;
            (storage, Some(name))
        }
        None => (JsonFileStorage::new("."), None),
    };
    let engine = TrackerEngine::new(storage, assets.charsets, assets.tables, assets.config);
    let mut session = match &save_name {
        Some(name) => engine.resume(name)?,
        None => engine.new_session(),
    };

    let (ticks, commands) = run_frames(&args, &mut session)?;

    if let Some(name) = &save_name {
        engine
            .save_session(name, &session)
            .with_context(|| format!("failed to save run {name}"))?;
        log::info!("saved run {name}");
    }

    let report = RunReport::new(&session.into_state(), &ticks, commands);
    write_reports(&args, &report, start_time)
}

fn announce_banner() {
    println!("{}", "🎮 Nuzlocke Tracker".bright_cyan().bold());
    println!("{}", "===================".cyan());
}

/// Drive the session over every frame, feeding scripted commands from the
/// listener thread. Returns the per-frame reports and the commands forwarded.
fn run_frames(args: &Args, session: &mut TrackerSession) -> Result<(Vec<TickReport>, usize)> {
    let frame_paths = match &args.frames {
        Some(dir) => frames::list_frames(dir)?,
        None => Vec::new(),
    };
    let script = match &args.events {
        Some(path) => CommandScript::load(path)?,
        None => CommandScript::default(),
    };
    if !script.is_empty() {
        log::debug!("loaded {} scripted commands", script.len());
    }
    if let Some(last) = script.last_frame()
        && last >= frame_paths.len()
    {
        log::warn!(
            "commands scheduled for frame {last}, but only {} frames were found",
            frame_paths.len()
        );
    }

    let (sender, queue) = event_channel();
    let listener = ScriptedListener::spawn(script, sender);
    let mut ticks = Vec::with_capacity(frame_paths.len());
    let mut last_view = session.state().view_type;

    for (index, path) in frame_paths.iter().enumerate() {
        listener.before_frame(index)?;
        let capture = frames::load_capture(path)?;
        let tick = session.tick_capture(&capture, &queue);
        if args.verbose && (tick.touched_ledger() || tick.view != last_view) {
            print_tick(index, &tick);
        }
        last_view = tick.view;
        ticks.push(tick);
    }

    let commands = listener.finish()?;
    let pending = std::iter::from_fn(|| queue.next()).count();
    if pending > 0 {
        log::warn!("{pending} commands were still queued after the last frame");
    }
    Ok((ticks, commands))
}

fn print_tick(index: usize, tick: &TickReport) {
    println!(
        "🖼️  [{index:>5}] {} @ {}",
        tick.view.as_str().bright_blue(),
        tick.location
    );
    for outcome in &tick.automatic {
        println!("         auto {outcome}");
    }
    if let Some((event, outcome)) = &tick.command {
        let line = format!("{event}: {outcome}");
        if outcome.is_change() {
            println!("         {}", line.green());
        } else {
            println!("         {}", line.yellow());
        }
    }
}

fn write_reports(args: &Args, report: &RunReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, report)?,
        _ => {
            reports::generate_console_report(&mut output_target, report, start_time.elapsed())?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
