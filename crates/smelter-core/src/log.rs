//! Player-facing game log.
//!
//! The world reports production diagnostics ("Production stopped: ...")
//! through a [`GameLog`]. Logging is fire-and-forget: implementations must
//! not fail.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Default number of lines a [`RingLog`] keeps.
pub const DEFAULT_LOG_LINES: usize = 10;

pub trait GameLog {
    fn log(&mut self, message: &str);

    fn clear(&mut self);
}

/// Forwards every message to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl GameLog for TracingLog {
    fn log(&mut self, message: &str) {
        tracing::info!(target: "smelter::game_log", "{message}");
    }

    fn clear(&mut self) {}
}

/// Keeps the most recent lines in memory, dropping the oldest.
///
/// Clones share one buffer, so a host can hand a clone to the world and keep
/// another to render the text.
#[derive(Debug, Clone)]
pub struct RingLog {
    lines: Rc<RefCell<VecDeque<String>>>,
    max_lines: usize,
}

impl RingLog {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: Rc::new(RefCell::new(VecDeque::with_capacity(max_lines))),
            max_lines,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().iter().cloned().collect()
    }

    /// All lines joined with newlines, oldest first.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }
}

impl Default for RingLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LINES)
    }
}

impl GameLog for RingLog {
    fn log(&mut self, message: &str) {
        tracing::debug!(target: "smelter::game_log", "{message}");
        let mut lines = self.lines.borrow_mut();
        lines.push_back(message.to_owned());
        while lines.len() > self.max_lines {
            lines.pop_front();
        }
    }

    fn clear(&mut self) {
        self.lines.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_log_keeps_latest_lines() {
        let mut log = RingLog::new(3);
        for i in 0..5 {
            log.log(&format!("line {i}"));
        }
        assert_eq!(log.lines(), vec!["line 2", "line 3", "line 4"]);
        assert_eq!(log.text(), "line 2\nline 3\nline 4");
    }

    #[test]
    fn clones_share_buffer() {
        let reader = RingLog::default();
        let mut writer = reader.clone();
        writer.log("Production stopped: Smelter reason: FullOutput");
        assert!(reader.contains("FullOutput"));
        writer.clear();
        assert!(reader.lines().is_empty());
    }
}
