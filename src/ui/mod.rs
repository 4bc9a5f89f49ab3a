// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for the metro practice metronome.
//!
//! Provides a ratatui-based terminal interface with the transport
//! position, a downbeat light and per-section progress bars.

mod sections;
mod transport;

pub use sections::{section_label, SectionsWidget};
pub use transport::{position_label, TransportWidget};

use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use crate::control::{format_shortcut, ControlAction, KeyboardController};
use crate::transport::{RenderFrame, Section, SequencePlan};

/// How long the downbeat light stays on
const FLASH_DURATION: Duration = Duration::from_millis(120);

/// UI state shared between components
#[derive(Debug, Clone)]
pub struct UiState {
    /// Piece title
    pub title: String,
    /// Selected section list, if not the default
    pub variant: Option<String>,
    /// Sections of the plan being played
    pub sections: Vec<Section>,
    /// Latest frame published by the scheduler
    pub frame: RenderFrame,
    /// Space starts with a count-in
    pub count_in: bool,
    /// Audio was lost and ticks are silent
    pub degraded: bool,
    /// Downbeat light deadline
    pub flash_until: Option<Instant>,
    /// Help text visible
    pub show_help: bool,
    /// Status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl UiState {
    /// Create UI state for a plan
    pub fn new(title: impl Into<String>, plan: &SequencePlan, frame: RenderFrame) -> Self {
        Self {
            title: title.into(),
            variant: None,
            sections: plan.sections().to_vec(),
            frame,
            count_in: false,
            degraded: false,
            flash_until: None,
            show_help: false,
            status_message: None,
            status_time: None,
        }
    }

    /// Take a frame from the scheduler
    pub fn update_frame(&mut self, frame: &RenderFrame) {
        if frame.flash && frame.tick != self.frame.tick {
            self.flash_until = Some(Instant::now() + FLASH_DURATION);
        }
        self.frame = frame.clone();
    }

    /// Swap in a reloaded plan
    pub fn set_plan(&mut self, title: impl Into<String>, plan: &SequencePlan) {
        self.title = title.into();
        self.sections = plan.sections().to_vec();
    }

    /// Check if the downbeat light is on
    pub fn is_flashing(&self) -> bool {
        self.flash_until.is_some_and(|until| Instant::now() < until)
    }

    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_time = Some(Instant::now());
    }

    /// Clear expired status message
    pub fn clear_expired_status(&mut self) {
        if let Some(time) = self.status_time {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_time = None;
            }
        }
    }
}

/// Terminal UI application
pub struct App {
    /// Shared UI state
    state: Arc<Mutex<UiState>>,
    /// Key bindings
    keys: KeyboardController,
    /// Terminal handle
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Whether to continue running
    running: bool,
}

impl App {
    /// Create a new app with shared state
    pub fn new(state: Arc<Mutex<UiState>>) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            state,
            keys: KeyboardController::with_defaults(),
            terminal,
            running: true,
        })
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the app
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Handle a key event.
    ///
    /// UI actions are handled here; transport and section actions are
    /// returned for the caller to apply.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Option<ControlAction> {
        let action = self.keys.process_key(code, modifiers)?;
        match action {
            ControlAction::Quit => {
                self.quit();
                None
            }
            ControlAction::ToggleHelp => {
                if let Ok(mut state) = self.state.lock() {
                    state.show_help = !state.show_help;
                }
                None
            }
            other if other.is_transport() || other.is_navigation() => Some(other),
            _ => None,
        }
    }

    /// Poll for events, waiting at most `timeout`
    pub fn poll_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Draw the UI
    pub fn draw(&mut self) -> io::Result<()> {
        let state = match self.state.lock() {
            Ok(mut state) => {
                state.clear_expired_status();
                state.clone()
            }
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let help = help_lines(&self.keys);

        self.terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: transport, sections, footer
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Transport
                    Constraint::Min(4),    // Sections
                    Constraint::Length(1), // Status bar
                ])
                .split(area);

            render_transport(frame, chunks[0], &state);
            render_sections(frame, chunks[1], &state);
            render_status_bar(frame, chunks[2], &state);

            if state.show_help {
                render_help_overlay(frame, area, &help);
            }
        })?;

        Ok(())
    }

    /// Cleanup terminal on drop
    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn render_transport(frame: &mut Frame, area: Rect, state: &UiState) {
    let mut title = format!(" {} ", state.title);
    if let Some(variant) = &state.variant {
        title = format!(" {} ({}) ", state.title, variant);
    }
    let mut block = Block::default().borders(Borders::ALL).title(title);
    if state.degraded {
        block = block.title(Span::styled(
            " no audio ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let widget = TransportWidget::new(state.frame.snapshot, &state.sections)
        .flash(state.is_flashing())
        .block(block);
    frame.render_widget(widget, area);
}

fn render_sections(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title(" Sections ");
    let widget = SectionsWidget::new(&state.sections, &state.frame.progress)
        .current(state.frame.snapshot.section_index)
        .block(block);
    frame.render_widget(widget, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, state: &UiState) {
    let text = if let Some(ref msg) = state.status_message {
        Span::styled(msg.as_str(), Style::default().fg(Color::Yellow))
    } else {
        Span::styled(status_hint(state.count_in), Style::default().fg(Color::DarkGray))
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Key hints for the status bar; Space and Enter count in when `count_in` is set
pub fn status_hint(count_in: bool) -> &'static str {
    if count_in {
        " Space: Count-in/Stop | Enter: Count-in | c: Count-in | Esc: Stop | r: Reset | 1-9 ←→: Section | h: Help | q: Quit"
    } else {
        " Space: Start/Stop | Enter: Start | c: Count-in | Esc: Stop | r: Reset | 1-9 ←→: Section | h: Help | q: Quit"
    }
}

/// Help entries grouped by category, in display order
pub fn help_lines(keys: &KeyboardController) -> Vec<(String, Vec<(String, String)>)> {
    let grouped = keys.bindings_by_category();
    let mut categories: Vec<&String> = grouped.keys().collect();
    categories.sort_by_key(|name| match name.as_str() {
        "Transport" => 0,
        "Sections" => 1,
        _ => 2,
    });

    categories
        .into_iter()
        .map(|category| {
            let mut entries: Vec<(String, String)> = Vec::new();
            let mut jumps = false;
            for binding in &grouped[category] {
                if matches!(binding.action, ControlAction::JumpTo(_)) {
                    jumps = true;
                    continue;
                }
                let key = format_shortcut(&binding.shortcut);
                match entries.iter_mut().find(|(_, desc)| *desc == binding.description) {
                    Some((keys, _)) => {
                        keys.push('/');
                        keys.push_str(&key);
                    }
                    None => entries.push((key, binding.description.clone())),
                }
            }
            for (keys, _) in entries.iter_mut() {
                let mut parts: Vec<&str> = keys.split('/').collect();
                parts.sort_unstable();
                *keys = parts.join("/");
            }
            entries.sort();
            if jumps {
                entries.insert(0, ("1-9".to_string(), "Jump to section".to_string()));
            }
            (category.clone(), entries)
        })
        .collect()
}

fn render_help_overlay(frame: &mut Frame, area: Rect, help: &[(String, Vec<(String, String)>)]) {
    let rows: usize = help.iter().map(|(_, entries)| entries.len() + 2).sum();
    let width = 44.min(area.width.saturating_sub(4));
    let height = (rows as u16 + 2).min(area.height.saturating_sub(2));
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let mut lines = Vec::new();
    for (category, entries) in help {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            category.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (keys, description) in entries {
            lines.push(Line::from(format!("  {:<12}{}", keys, description)));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ManualClock;
    use crate::transport::{Scheduler, Snapshot, ToneEmitter, TransportState};

    fn plan() -> SequencePlan {
        SequencePlan::new(vec![Section::new(80.0, 8, 2), Section::new(120.0, 4, 17)]).unwrap()
    }

    fn frame(snapshot: Snapshot, flash: bool, tick: u64) -> RenderFrame {
        RenderFrame {
            snapshot,
            progress: vec![0.0, 0.0],
            flash,
            tick,
        }
    }

    #[test]
    fn test_ui_state_status() {
        let idle = TransportState::idle().snapshot();
        let mut state = UiState::new("Etude", &plan(), frame(idle, false, 0));
        assert!(state.status_message.is_none());

        state.set_status("Test message");
        assert_eq!(state.status_message, Some("Test message".to_string()));
        state.clear_expired_status();
        assert!(state.status_message.is_some());
    }

    #[test]
    fn test_flash_on_new_downbeat() {
        let idle = TransportState::idle().snapshot();
        let mut state = UiState::new("Etude", &plan(), frame(idle, false, 0));
        assert!(!state.is_flashing());

        let mut playing = idle;
        playing.running = true;
        state.update_frame(&frame(playing, true, 1));
        assert!(state.is_flashing());

        // A control frame after the same tick does not re-trigger
        state.flash_until = None;
        state.update_frame(&frame(playing, true, 1));
        assert!(!state.is_flashing());
    }

    #[test]
    fn test_no_flash_without_tick() {
        let idle = TransportState::idle().snapshot();
        let mut state = UiState::new("Etude", &plan(), frame(idle, false, 0));
        let mut moved = idle;
        moved.beat_index = 2;
        state.update_frame(&frame(moved, true, 0));
        assert!(!state.is_flashing());
        assert_eq!(state.frame.snapshot.beat_index, 2);
    }

    #[test]
    fn test_first_downbeat_after_start_flashes() {
        let plan = SequencePlan::new(vec![Section::new(120.0, 4, 2)]).unwrap();
        let clock = ManualClock::new();
        let mut scheduler = Scheduler::new(plan, clock.clone(), ToneEmitter::silent());
        let state = Arc::new(Mutex::new(UiState::new(
            "Etude",
            scheduler.plan(),
            scheduler.frame(),
        )));
        let sink = Arc::clone(&state);
        scheduler = scheduler.with_frame_sink(move |frame: &RenderFrame| {
            sink.lock().unwrap().update_frame(frame);
        });

        scheduler.start();
        assert!(!state.lock().unwrap().is_flashing());

        let tick = scheduler.poll().unwrap();
        assert!(tick.flash);
        assert!(state.lock().unwrap().is_flashing());

        // Beat 2 does not flash
        state.lock().unwrap().flash_until = None;
        clock.set(0.5);
        scheduler.poll().unwrap();
        assert!(!state.lock().unwrap().is_flashing());

        // Again after a jump back and restart
        scheduler.jump_to(0);
        scheduler.start();
        scheduler.poll().unwrap();
        assert!(state.lock().unwrap().is_flashing());
    }

    #[test]
    fn test_set_plan() {
        let idle = TransportState::idle().snapshot();
        let mut state = UiState::new("Etude", &plan(), frame(idle, false, 0));
        let single = SequencePlan::new(vec![Section::new(60.0, 3, 1)]).unwrap();
        state.set_plan("Waltz", &single);
        assert_eq!(state.title, "Waltz");
        assert_eq!(state.sections.len(), 1);
    }

    #[test]
    fn test_help_lines() {
        let help = help_lines(&KeyboardController::with_defaults());
        let names: Vec<&str> = help.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Transport", "Sections", "UI"]);

        let sections = &help[1].1;
        assert_eq!(sections[0], ("1-9".to_string(), "Jump to section".to_string()));
        assert_eq!(sections.len(), 3);

        let ui = &help[2].1;
        assert!(ui.iter().any(|(keys, desc)| keys == "?/H" && desc == "Toggle Help"));
        assert!(ui.iter().any(|(keys, desc)| keys == "Ctrl+C/Q" && desc == "Quit"));
    }

    #[test]
    fn test_status_hint_lists_transport_keys() {
        let help = help_lines(&KeyboardController::with_defaults());
        for count_in in [false, true] {
            let hint = status_hint(count_in).to_lowercase();
            for (keys, _) in &help[0].1 {
                for key in keys.split('/') {
                    assert!(hint.contains(&format!("{}:", key.to_lowercase())), "{} missing", key);
                }
            }
            assert!(hint.contains("c: count-in"));
            assert!(hint.contains("esc: stop"));
        }
        assert!(status_hint(true).contains("Enter: Count-in"));
        assert!(status_hint(false).contains("Enter: Start"));
    }
}
