// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossterm::event::{Event, KeyEventKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use metro::audio::{default_device_name, list_devices, AudioEngine};
use metro::config::{ConfigEvent, ConfigWatcher, PlanFile};
use metro::transport::{Advance, ClickKind, RenderFrame, Scheduler, SequencePlan, Tick, ToneEmitter};
use metro::ui::{position_label, App, UiState};
use metro::MonotonicClock;

fn print_usage() {
    println!("metro - Sectional practice metronome");
    println!();
    println!("Usage: metro [PLAN] [OPTIONS]");
    println!();
    println!("Arguments:");
    println!("  PLAN                    Plan file (.yaml or .toml); built-in piece if omitted");
    println!();
    println!("Options:");
    println!("  --variant <NAME>        Play a named section list from the plan");
    println!("  --count-in              Start with a one-measure count-in");
    println!("  --headless              Play once without the terminal UI, printing ticks");
    println!("  --watch                 Reload the plan file when it changes");
    println!("  --verbose               Debug logging");
    println!("  --log <PATH>            Log file for the terminal UI (default metro.log)");
    println!("  --list-devices          List available audio output devices");
    println!("  --help                  Show this help message");
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
struct Options {
    plan: Option<PathBuf>,
    variant: Option<String>,
    count_in: bool,
    headless: bool,
    watch: bool,
    verbose: bool,
    log: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            plan: None,
            variant: None,
            count_in: false,
            headless: false,
            watch: false,
            verbose: false,
            log: PathBuf::from("metro.log"),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(Options),
    ListDevices,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut options = Options::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--list-devices" => return Ok(Command::ListDevices),
            "--variant" => {
                let name = iter
                    .next()
                    .ok_or_else(|| anyhow!("--variant requires a name"))?;
                options.variant = Some(name.clone());
            }
            "--log" => {
                let path = iter.next().ok_or_else(|| anyhow!("--log requires a path"))?;
                options.log = PathBuf::from(path);
            }
            "--count-in" => options.count_in = true,
            "--headless" => options.headless = true,
            "--watch" => options.watch = true,
            "--verbose" | "-v" => options.verbose = true,
            other if other.starts_with('-') => return Err(anyhow!("Unknown option: {}", other)),
            path => {
                if options.plan.is_some() {
                    return Err(anyhow!("Only one plan file may be given"));
                }
                options.plan = Some(PathBuf::from(path));
            }
        }
    }

    Ok(Command::Run(options))
}

fn init_logging(options: &Options) -> Result<()> {
    let level = if options.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("metro={}", level)));

    if options.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        // The terminal UI owns stdout, so logs go to a file
        let file = File::create(&options.log)
            .with_context(|| format!("Failed to create log file: {:?}", options.log))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn load_plan(options: &Options) -> Result<(PlanFile, SequencePlan)> {
    let file = match &options.plan {
        Some(path) => PlanFile::load(path)?,
        None => PlanFile::demo(),
    };
    let plan = file.plan(options.variant.as_deref())?;
    Ok((file, plan))
}

/// Scheduler on the audio clock, or a silent monotonic one without audio
fn build_scheduler(file: &PlanFile, plan: SequencePlan) -> Scheduler {
    match AudioEngine::start(file.audio.clone(), file.click) {
        Ok(engine) => {
            let sink = engine.tone_sink();
            Scheduler::new(plan, engine, ToneEmitter::new(sink))
        }
        Err(err) => {
            warn!(error = %err, "audio unavailable, running silent");
            Scheduler::new(plan, MonotonicClock::new(), ToneEmitter::silent())
        }
    }
}

fn print_devices() {
    let default = default_device_name();
    let devices = list_devices();
    if devices.is_empty() {
        println!("No audio output devices found");
        return;
    }
    println!("Audio output devices:");
    for (index, name) in devices.iter().enumerate() {
        let marker = if default.as_deref() == Some(name.as_str()) { " (default)" } else { "" };
        println!("  {}: {}{}", index, name, marker);
    }
}

fn describe_tick(tick: &Tick, plan: &SequencePlan) -> String {
    let position = tick.position;
    let Some(section) = plan.get(position.section_index) else {
        return format!("{:9.3}s  finished", tick.due);
    };
    let sound = match tick.click {
        Some(ClickKind::Accent) => "accent",
        Some(ClickKind::Normal) => "click",
        None => "-",
    };
    format!(
        "{:9.3}s  [{}/{}] {:>4.0} BPM  {:<24} {}{}",
        tick.due,
        position.section_index + 1,
        plan.len(),
        section.bpm,
        position_label(&position, section),
        sound,
        if tick.flash { " *" } else { "" }
    )
}

fn run_headless(mut scheduler: Scheduler, title: &str, count_in: bool) -> Result<()> {
    let plan = scheduler.plan();
    println!(
        "{}: {} sections, {} beats, {:.1}s",
        title,
        plan.len(),
        plan.total_beats(),
        plan.duration_secs()
    );

    if count_in {
        scheduler.start_with_count_in();
    } else {
        scheduler.start();
    }

    while scheduler.is_running() {
        if let Some(tick) = scheduler.poll() {
            println!("{}", describe_tick(&tick, scheduler.plan()));
            if tick.transition == Advance::Finished {
                break;
            }
            continue;
        }

        // Sleep for part of the remaining time so the next tick is not overshot
        let wait = scheduler
            .time_until_next_tick()
            .unwrap_or(Duration::from_millis(1));
        thread::sleep((wait / 2).clamp(Duration::from_micros(500), Duration::from_millis(50)));
    }

    if scheduler.is_degraded() {
        println!("(audio was lost, later ticks were silent)");
    }
    println!("Done.");
    Ok(())
}

fn apply_reload(
    file: &PlanFile,
    variant: Option<&str>,
    scheduler: &mut Scheduler,
    state: &Mutex<UiState>,
) {
    match file.plan(variant) {
        Ok(plan) => {
            scheduler.replace_plan(plan);
            info!(title = %file.title, "plan reloaded");
            if let Ok(mut ui) = state.lock() {
                ui.set_plan(file.title.clone(), scheduler.plan());
                ui.set_status(format!("Reloaded {}", file.title));
            }
        }
        Err(err) => {
            let message = format!("{:#}", err);
            warn!(error = %message, "reloaded plan rejected");
            if let Ok(mut ui) = state.lock() {
                ui.set_status(format!("Reload rejected: {}", message));
            }
        }
    }
}

fn run_tui(file: PlanFile, options: &Options, scheduler: Scheduler) -> Result<()> {
    let count_in = options.count_in || file.count_in;

    let mut ui = UiState::new(file.title.clone(), scheduler.plan(), scheduler.frame());
    ui.variant = options.variant.clone();
    ui.count_in = count_in;
    ui.degraded = scheduler.is_degraded();
    let state = Arc::new(Mutex::new(ui));

    let sink_state = Arc::clone(&state);
    let mut scheduler = scheduler.with_frame_sink(move |frame: &RenderFrame| {
        if let Ok(mut ui) = sink_state.lock() {
            ui.update_frame(frame);
        }
    });

    let watcher = match (&options.plan, options.watch) {
        (Some(path), true) => Some(ConfigWatcher::new(path, None)?),
        (None, true) => {
            warn!("--watch needs a plan file, ignoring");
            None
        }
        _ => None,
    };
    let mut pending: Option<Box<PlanFile>> = None;

    let mut app = App::new(Arc::clone(&state))?;
    let frame_time = Duration::from_millis(1000 / 60);

    while app.is_running() {
        scheduler.poll();

        if scheduler.is_degraded() {
            if let Ok(mut ui) = state.lock() {
                if !ui.degraded {
                    ui.degraded = true;
                    ui.set_status("Audio lost, continuing silently");
                }
            }
        }

        if let Some(watcher) = &watcher {
            for event in watcher.recv_all() {
                match event {
                    ConfigEvent::Reloaded(file) => {
                        if scheduler.is_running() {
                            if let Ok(mut ui) = state.lock() {
                                ui.set_status("Plan changed, reloading after stop");
                            }
                        }
                        pending = Some(file);
                    }
                    ConfigEvent::Error(message) => {
                        warn!(%message, "plan reload failed");
                        if let Ok(mut ui) = state.lock() {
                            ui.set_status(message);
                        }
                    }
                    ConfigEvent::FileDeleted(path) => {
                        warn!(?path, "plan file deleted");
                        if let Ok(mut ui) = state.lock() {
                            ui.set_status(format!("Plan file deleted: {}", path.display()));
                        }
                    }
                }
            }
        }

        if !scheduler.is_running() {
            if let Some(file) = pending.take() {
                apply_reload(&file, options.variant.as_deref(), &mut scheduler, &state);
            }
        }

        app.draw()?;

        let timeout = scheduler
            .time_until_next_tick()
            .map_or(frame_time, |wait| wait.min(frame_time));
        if let Some(Event::Key(key)) = app.poll_event(timeout)? {
            if key.kind == KeyEventKind::Press {
                if let Some(action) = app.handle_key(key.code, key.modifiers) {
                    action.apply(&mut scheduler, count_in);
                }
            }
        }
    }

    scheduler.stop();
    info!("exiting");
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let options = match parse_args(&args) {
        Ok(Command::Run(options)) => options,
        Ok(Command::ListDevices) => {
            print_devices();
            return Ok(());
        }
        Ok(Command::Help) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            print_usage();
            std::process::exit(1);
        }
    };

    init_logging(&options)?;

    let (file, plan) = load_plan(&options)?;
    info!(
        title = %file.title,
        variant = options.variant.as_deref().unwrap_or("default"),
        sections = plan.len(),
        "plan loaded"
    );
    let scheduler = build_scheduler(&file, plan);

    if options.headless {
        run_headless(scheduler, &file.title, options.count_in || file.count_in)
    } else {
        run_tui(file, &options, scheduler)
    }
}
