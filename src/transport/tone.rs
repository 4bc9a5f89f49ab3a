// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Click emission for each tick.

use super::{Section, TransportState};

/// Which click a tick produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickKind {
    /// Count-in beat, higher pitch
    Accent,
    /// Regular beat
    Normal,
}

/// Destination for clicks. Triggering must not block.
pub trait ToneSink {
    fn click(&mut self, kind: ClickKind);
}

impl<F> ToneSink for F
where
    F: FnMut(ClickKind),
{
    fn click(&mut self, kind: ClickKind) {
        self(kind)
    }
}

/// Sink that discards every click
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ToneSink for NullSink {
    fn click(&mut self, _kind: ClickKind) {}
}

/// Outcome of emitting one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Emission {
    /// Click that was sent, `None` when silent
    pub click: Option<ClickKind>,
    /// Downbeat flash for the display
    pub flash: bool,
}

/// Turns ticks into clicks for the current section
pub struct ToneEmitter {
    sink: Box<dyn ToneSink>,
    silenced: bool,
}

impl ToneEmitter {
    /// Create an emitter writing to `sink`
    pub fn new(sink: impl ToneSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            silenced: false,
        }
    }

    /// Emitter with no audio at all
    pub fn silent() -> Self {
        Self {
            sink: Box::new(NullSink),
            silenced: true,
        }
    }

    /// Stop sending clicks; flashes still occur
    pub fn silence(&mut self) {
        self.silenced = true;
    }

    /// Whether clicks are suppressed for every section
    pub fn is_silenced(&self) -> bool {
        self.silenced
    }

    /// Emit the tick for the beat `state` points at
    pub fn emit(&mut self, section: &Section, state: &TransportState) -> Emission {
        let flash = state.beat_index == 1;
        if section.muted || self.silenced {
            return Emission { click: None, flash };
        }

        let kind = if state.preparing {
            ClickKind::Accent
        } else {
            ClickKind::Normal
        };
        self.sink.click(kind);
        Emission {
            click: Some(kind),
            flash,
        }
    }
}

impl Default for ToneEmitter {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording() -> (ToneEmitter, Rc<RefCell<Vec<ClickKind>>>) {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        let emitter = ToneEmitter::new(move |kind| sink.borrow_mut().push(kind));
        (emitter, clicks)
    }

    #[test]
    fn test_normal_and_accent() {
        let (mut emitter, clicks) = recording();
        let section = Section::new(120.0, 4, 1);
        let mut state = TransportState::idle();

        let emission = emitter.emit(&section, &state);
        assert_eq!(emission.click, Some(ClickKind::Normal));
        assert!(emission.flash);

        state.prepare();
        state.beat_index = 2;
        let emission = emitter.emit(&section, &state);
        assert_eq!(emission.click, Some(ClickKind::Accent));
        assert!(!emission.flash);

        assert_eq!(*clicks.borrow(), vec![ClickKind::Normal, ClickKind::Accent]);
    }

    #[test]
    fn test_muted_section_still_flashes() {
        let (mut emitter, clicks) = recording();
        let section = Section::new(120.0, 4, 1).muted();
        let state = TransportState::idle();

        let emission = emitter.emit(&section, &state);
        assert_eq!(emission.click, None);
        assert!(emission.flash);
        assert!(clicks.borrow().is_empty());
    }

    #[test]
    fn test_silenced_emitter() {
        let (mut emitter, clicks) = recording();
        emitter.silence();
        assert!(emitter.is_silenced());

        let emission = emitter.emit(&Section::new(60.0, 2, 1), &TransportState::idle());
        assert_eq!(emission.click, None);
        assert!(clicks.borrow().is_empty());
        assert!(ToneEmitter::silent().is_silenced());
    }
}
