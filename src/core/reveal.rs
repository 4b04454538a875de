//! Character-by-character reveal of a finished reply.
//!
//! A [`Reveal`] is a finite sequence of steps, one per grapheme cluster, with
//! a fixed delay between steps. The event loop calls [`Reveal::advance`] with
//! the current time and reads [`Reveal::visible`]; nothing is scheduled per
//! character.

use std::time::{Duration, Instant};

use unicode_segmentation::UnicodeSegmentation;

pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct Reveal {
    text: String,
    /// Byte offset where each step ends; `boundaries[n - 1]` ends step `n`.
    boundaries: Vec<usize>,
    shown: usize,
    delay: Duration,
    started_at: Instant,
}

impl Reveal {
    pub fn new(text: impl Into<String>, delay: Duration, now: Instant) -> Self {
        let text = text.into();
        let boundaries = text
            .grapheme_indices(true)
            .map(|(offset, grapheme)| offset + grapheme.len())
            .collect();
        Self {
            text,
            boundaries,
            shown: 0,
            delay,
            started_at: now,
        }
    }

    /// Rewind to the empty state and start timing again from `now`.
    pub fn restart(&mut self, now: Instant) {
        self.shown = 0;
        self.started_at = now;
    }

    /// Catch up with the clock. Returns how many new steps became visible.
    pub fn advance(&mut self, now: Instant) -> usize {
        let due = if self.delay.is_zero() {
            self.boundaries.len()
        } else {
            let elapsed = now.saturating_duration_since(self.started_at);
            (elapsed.as_nanos() / self.delay.as_nanos()) as usize
        };
        let target = due.min(self.boundaries.len());
        let stepped = target.saturating_sub(self.shown);
        self.shown = self.shown.max(target);
        stepped
    }

    /// Reveal everything immediately.
    pub fn finish(&mut self) {
        self.shown = self.boundaries.len();
    }

    pub fn visible(&self) -> &str {
        match self.shown {
            0 => "",
            n => &self.text[..self.boundaries[n - 1]],
        }
    }

    pub fn is_finished(&self) -> bool {
        self.shown >= self.boundaries.len()
    }

}

impl Iterator for Reveal {
    type Item = String;

    /// Step through the reveal without a clock, yielding each visible prefix.
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished() {
            return None;
        }
        self.shown += 1;
        Some(self.visible().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(10);

    #[test]
    fn reveals_one_step_per_delay() {
        let start = Instant::now();
        let mut reveal = Reveal::new("Hi there", STEP, start);
        assert_eq!(reveal.visible(), "");

        assert_eq!(reveal.advance(start + STEP), 1);
        assert_eq!(reveal.visible(), "H");

        assert_eq!(reveal.advance(start + STEP * 4), 3);
        assert_eq!(reveal.visible(), "Hi t");
        assert!(!reveal.is_finished());

        reveal.advance(start + STEP * 100);
        assert_eq!(reveal.visible(), "Hi there");
        assert!(reveal.is_finished());
    }

    #[test]
    fn advance_never_moves_backwards() {
        let start = Instant::now();
        let mut reveal = Reveal::new("abc", STEP, start);
        reveal.advance(start + STEP * 2);
        assert_eq!(reveal.advance(start), 0);
        assert_eq!(reveal.visible(), "ab");
    }

    #[test]
    fn steps_over_grapheme_clusters() {
        let start = Instant::now();
        let mut reveal = Reveal::new("e\u{301}👍🏽!", STEP, start);
        assert_eq!(reveal.clone().count(), 3);
        reveal.advance(start + STEP);
        assert_eq!(reveal.visible(), "e\u{301}");
    }

    #[test]
    fn restart_rewinds() {
        let start = Instant::now();
        let mut reveal = Reveal::new("abc", STEP, start);
        reveal.finish();
        assert!(reveal.is_finished());

        let later = start + STEP * 50;
        reveal.restart(later);
        assert_eq!(reveal.visible(), "");
        reveal.advance(later + STEP);
        assert_eq!(reveal.visible(), "a");
    }

    #[test]
    fn iterates_every_prefix() {
        let reveal = Reveal::new("abc", STEP, Instant::now());
        let prefixes: Vec<String> = reveal.collect();
        assert_eq!(prefixes, vec!["a", "ab", "abc"]);
    }

    #[test]
    fn empty_text_is_already_finished() {
        let reveal = Reveal::new("", STEP, Instant::now());
        assert!(reveal.is_finished());
        assert_eq!(reveal.visible(), "");
    }

    #[test]
    fn zero_delay_shows_everything_at_once() {
        let start = Instant::now();
        let mut reveal = Reveal::new("abc", Duration::ZERO, start);
        assert_eq!(reveal.advance(start), 3);
        assert!(reveal.is_finished());
    }
}
