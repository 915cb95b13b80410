//! Accessible status announcements
//!
//! Works like an ARIA live region: whatever is read within the coalescing
//! window of the previous announcement is appended to it instead of
//! replacing it, so a screen reader hears one combined message.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default coalescing window
pub const COALESCE_WINDOW: Duration = Duration::from_millis(100);

/// Number of announcements kept, the live one included
pub const HISTORY_LIMIT: usize = 50;

/// Announcement channel
#[derive(Debug)]
pub struct Announcer {
    window: Duration,
    /// Messages as they would be spoken, oldest first, at most `HISTORY_LIMIT`
    messages: VecDeque<String>,
    /// When the live message (last entry of `messages`) was started
    live_since: Option<Instant>,
}

impl Default for Announcer {
    fn default() -> Self {
        Self::new(COALESCE_WINDOW)
    }
}

impl Announcer {
    /// Create an announcer with a custom coalescing window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            messages: VecDeque::new(),
            live_since: None,
        }
    }

    /// Announce text made up of one or more sentences
    pub fn read<S: AsRef<str>>(&mut self, parts: &[S]) {
        self.read_at(parts, Instant::now());
    }

    /// Announce at an explicit point in time
    pub fn read_at<S: AsRef<str>>(&mut self, parts: &[S], now: Instant) {
        let text = parts
            .iter()
            .map(AsRef::as_ref)
            .filter(|part| !part.is_empty())
            .fold(String::new(), |text, part| append_sentence(text, part));
        if text.is_empty() {
            return;
        }

        let coalesce = self
            .live_since
            .is_some_and(|since| now.saturating_duration_since(since) < self.window);

        match self.messages.back_mut() {
            Some(live) if coalesce => {
                let combined = append_sentence(std::mem::take(live), &text);
                *live = combined;
            }
            _ => {
                if self.messages.len() == HISTORY_LIMIT {
                    self.messages.pop_front();
                }
                self.messages.push_back(text);
                self.live_since = Some(now);
            }
        }

        if let Some(live) = self.messages.back() {
            log::debug!("Announcement: {}", live);
        }
    }

    /// Text currently shown in the live region
    pub fn live_text(&self) -> Option<&str> {
        self.messages.back().map(String::as_str)
    }

    /// Remove and return the kept announcements, oldest first
    pub fn take_messages(&mut self) -> Vec<String> {
        self.live_since = None;
        self.messages.drain(..).collect()
    }
}

/// Join two sentences, adding a period when the first does not end in one
fn append_sentence(text: String, sentence: &str) -> String {
    if text.is_empty() {
        return sentence.to_string();
    }
    let delimiter = if text.ends_with('.') { " " } else { ". " };
    format!("{}{}{}", text, delimiter, sentence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_are_joined_as_sentences() {
        let mut announcer = Announcer::default();
        announcer.read(&["Not possible.", "The only chapter cannot be deleted."]);
        assert_eq!(
            announcer.live_text(),
            Some("Not possible. The only chapter cannot be deleted.")
        );

        let mut announcer = Announcer::default();
        announcer.read(&["Done", "Next"]);
        assert_eq!(announcer.live_text(), Some("Done. Next"));
    }

    #[test]
    fn test_coalesces_inside_window() {
        let mut announcer = Announcer::new(Duration::from_millis(100));
        let start = Instant::now();

        announcer.read_at(&["First."], start);
        announcer.read_at(&["Second."], start + Duration::from_millis(50));
        announcer.read_at(&["Third."], start + Duration::from_millis(300));

        assert_eq!(
            announcer.take_messages(),
            vec!["First. Second.".to_string(), "Third.".to_string()]
        );
        assert!(announcer.live_text().is_none());
    }

    #[test]
    fn test_empty_text_is_ignored() {
        let mut announcer = Announcer::default();
        announcer.read::<&str>(&[]);
        announcer.read(&[""]);
        assert!(announcer.take_messages().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut announcer = Announcer::new(Duration::from_millis(100));
        let start = Instant::now();

        for i in 0..HISTORY_LIMIT + 10 {
            let text = format!("Message {}.", i);
            announcer.read_at(&[text], start + Duration::from_secs(i as u64));
        }

        let messages = announcer.take_messages();
        assert_eq!(messages.len(), HISTORY_LIMIT);
        assert_eq!(messages[0], "Message 10.");
        assert_eq!(
            messages.last().map(String::as_str),
            Some(format!("Message {}.", HISTORY_LIMIT + 9).as_str())
        );
    }
}
