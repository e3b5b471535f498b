//! The numeric display and button indicator, behind a trait so the hardware
//! driver stays out of the controller. The driver owns its own idle timeout
//! and ambient animation; the controller only pushes frames.

use crate::gesture::Button;
use crate::log_debug;

/// Rendered when paused and no explicit text is given.
pub const PAUSE_GLYPH: &str = " || ";

/// Four-digit album/track code: 1-based, each clamped to two digits.
pub fn pager_code(album: usize, track: usize) -> String {
    format!("{:02}{:02}", (album + 1).min(99), (track + 1).min(99))
}

pub trait Display: Send + Sync {
    /// Show a literal label, up to four characters.
    fn text(&self, text: &str);
    /// Show the album/track pager with the play indicator lit, or the pause
    /// glyph when not playing.
    fn pager(&self, album: usize, track: usize, playing: bool);
    fn clear(&self);
    /// Light the indicator for a held button, or extinguish it.
    fn button_light(&self, button: Option<Button>);
}

/// Development display that writes frames to the debug log.
pub struct ConsoleDisplay;

impl Display for ConsoleDisplay {
    fn text(&self, text: &str) {
        log_debug(&format!("display: [{text:>4}]"));
    }

    fn pager(&self, album: usize, track: usize, playing: bool) {
        if playing {
            log_debug(&format!("display: [{}.]", pager_code(album, track)));
        } else {
            self.text(PAUSE_GLYPH);
        }
    }

    fn clear(&self) {
        log_debug("display: cleared");
    }

    fn button_light(&self, button: Option<Button>) {
        match button {
            Some(button) => log_debug(&format!("display: light {}", button.label())),
            None => log_debug("display: light off"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every frame as a flat string for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingDisplay {
        frames: Mutex<Vec<String>>,
    }

    impl RecordingDisplay {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        fn push(&self, frame: String) {
            self.frames.lock().unwrap().push(frame);
        }

        pub(crate) fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.frames.lock().unwrap())
        }

        pub(crate) fn last(&self) -> Option<String> {
            self.frames.lock().unwrap().last().cloned()
        }

    }

    impl Display for RecordingDisplay {
        fn text(&self, text: &str) {
            self.push(format!("text:{text}"));
        }

        fn pager(&self, album: usize, track: usize, playing: bool) {
            let flag = if playing { "play" } else { "pause" };
            self.push(format!("pager:{}:{flag}", pager_code(album, track)));
        }

        fn clear(&self) {
            self.push("clear".to_string());
        }

        fn button_light(&self, button: Option<Button>) {
            match button {
                Some(button) => self.push(format!("light:{}", button.label())),
                None => self.push("light:off".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pager_code_is_one_based() {
        assert_eq!(pager_code(0, 0), "0101");
        assert_eq!(pager_code(8, 41), "0942");
    }

    #[test]
    fn pager_code_clamps_to_two_digits() {
        assert_eq!(pager_code(98, 98), "9999");
        assert_eq!(pager_code(150, 3), "9904");
    }

    #[test]
    fn pause_glyph_fits_the_display() {
        assert_eq!(PAUSE_GLYPH.len(), 4);
    }
}
