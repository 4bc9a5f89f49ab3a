// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-section progress view.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Gauge, Paragraph, Widget},
};

use crate::transport::Section;

/// One progress row per section
pub struct SectionsWidget<'a> {
    sections: &'a [Section],
    progress: &'a [f64],
    current: Option<usize>,
    block: Option<Block<'a>>,
}

impl<'a> SectionsWidget<'a> {
    /// Create a widget from sections and their completion in percent
    pub fn new(sections: &'a [Section], progress: &'a [f64]) -> Self {
        Self {
            sections,
            progress,
            current: None,
            block: None,
        }
    }

    /// Highlight the section being played
    pub fn current(mut self, index: usize) -> Self {
        self.current = Some(index);
        self
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for SectionsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if self.sections.is_empty() {
            Paragraph::new("No sections")
                .style(Style::default().fg(Color::DarkGray))
                .render(area, buf);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(self.sections.iter().map(|_| Constraint::Length(1)))
            .split(area);

        for (index, (section, row)) in self.sections.iter().zip(rows.iter()).enumerate() {
            let percent = self.progress.get(index).copied().unwrap_or(0.0);
            render_row(
                section,
                index,
                percent,
                self.current == Some(index),
                *row,
                buf,
            );
        }
    }
}

fn render_row(section: &Section, index: usize, percent: f64, current: bool, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(2),  // Marker
            Constraint::Length(24), // Label
            Constraint::Min(10),    // Gauge
        ])
        .split(area);

    let marker = if current { "▸" } else { " " };
    Paragraph::new(marker)
        .style(Style::default().fg(Color::Yellow))
        .render(chunks[0], buf);

    let label_style = match (section.muted, current) {
        (true, _) => Style::default().fg(Color::DarkGray),
        (false, true) => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        (false, false) => Style::default().fg(Color::Gray),
    };
    Paragraph::new(section_label(section, index))
        .style(label_style)
        .render(chunks[1], buf);

    let color = if section.muted { Color::DarkGray } else { Color::Green };
    Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{:>3.0}%", percent))
        .render(chunks[2], buf);
}

/// Row label, e.g. `3. 80 BPM 8x3 muted`
pub fn section_label(section: &Section, index: usize) -> String {
    let mut label = format!(
        "{}. {:.0} BPM {}x{}",
        index + 1,
        section.bpm,
        section.beats_per_measure,
        section.measures
    );
    if section.muted {
        label.push_str(" muted");
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_label() {
        assert_eq!(section_label(&Section::new(120.0, 4, 17), 3), "4. 120 BPM 4x17");
        assert_eq!(
            section_label(&Section::new(80.0, 8, 3).muted(), 2),
            "3. 80 BPM 8x3 muted"
        );
    }

    #[test]
    fn test_render_rows() {
        let sections = [Section::new(80.0, 8, 2), Section::new(120.0, 4, 1).muted()];
        let progress = [100.0, 25.0];

        let area = Rect::new(0, 0, 60, 2);
        let mut buf = Buffer::empty(area);
        SectionsWidget::new(&sections, &progress)
            .current(1)
            .render(area, &mut buf);

        let row = |y: u16| -> String {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect()
        };
        assert!(row(0).contains("100%"));
        assert!(row(1).contains(" 25%"));
        assert!(row(1).starts_with('▸'));
        assert!(row(1).contains("muted"));
    }

    #[test]
    fn test_out_of_range_progress_does_not_panic() {
        let sections = [Section::new(80.0, 8, 2)];
        let progress = [250.0];
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        SectionsWidget::new(&sections, &progress).render(area, &mut buf);
    }
}
