// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport display widget.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Paragraph, Widget},
};

use crate::transport::{Section, Snapshot};

/// Transport widget for displaying playback state
pub struct TransportWidget<'a> {
    snapshot: Snapshot,
    section: Option<&'a Section>,
    section_count: usize,
    flash: bool,
    block: Option<Block<'a>>,
}

impl<'a> TransportWidget<'a> {
    /// Create a new transport widget
    pub fn new(snapshot: Snapshot, sections: &'a [Section]) -> Self {
        Self {
            snapshot,
            section: sections.get(snapshot.section_index),
            section_count: sections.len(),
            flash: false,
            block: None,
        }
    }

    /// Set beat flash state (for visual metronome)
    pub fn flash(mut self, flash: bool) -> Self {
        self.flash = flash;
        self
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for TransportWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(13), // Play/Stop indicator
                Constraint::Length(2),  // Spacer
                Constraint::Length(14), // Section
                Constraint::Length(2),  // Spacer
                Constraint::Length(10), // Tempo
                Constraint::Length(2),  // Spacer
                Constraint::Length(22), // Position
                Constraint::Length(2),  // Spacer
                Constraint::Length(3),  // Beat light
                Constraint::Min(0),     // Remaining
            ])
            .split(area);

        let (indicator, style) = status_indicator(&self.snapshot, self.section.is_none());
        Paragraph::new(indicator).style(style).render(chunks[0], buf);

        let section = match self.section {
            Some(_) => format!(
                "Section {}/{}",
                self.snapshot.section_index + 1,
                self.section_count
            ),
            None => format!("Section -/{}", self.section_count),
        };
        Paragraph::new(section)
            .style(Style::default().fg(Color::White))
            .render(chunks[2], buf);

        if let Some(section) = self.section {
            let tempo = format!("{:.0} BPM", section.bpm);
            let tempo_style = if section.muted {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Magenta)
            };
            Paragraph::new(tempo).style(tempo_style).render(chunks[4], buf);

            Paragraph::new(position_label(&self.snapshot, section))
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .render(chunks[6], buf);
        }

        let light = if self.flash {
            Paragraph::new("●").style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        } else {
            Paragraph::new("○").style(Style::default().fg(Color::DarkGray))
        };
        light.render(chunks[8], buf);
    }
}

/// Indicator text and style for the transport state
fn status_indicator(snapshot: &Snapshot, finished: bool) -> (&'static str, Style) {
    if finished {
        ("✓ DONE", Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD))
    } else if snapshot.preparing && snapshot.running {
        ("◆ COUNT-IN", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else if snapshot.running {
        ("▶ PLAY", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        ("■ STOP", Style::default().fg(Color::Yellow))
    }
}

/// Measure and beat within the section, e.g. `bar 3/32  beat 5/8`
pub fn position_label(snapshot: &Snapshot, section: &Section) -> String {
    let beat = format!("beat {}/{}", snapshot.beat_index, section.beats_per_measure);
    if snapshot.preparing {
        format!("count-in  {}", beat)
    } else {
        format!("bar {}/{}  {}", snapshot.measure_index, section.measures, beat)
    }
}
