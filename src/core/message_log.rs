use std::collections::VecDeque;

use chrono::{DateTime, Local};

/// Entries kept before the oldest are dropped.
pub const MESSAGE_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: DateTime<Local>,
    pub level: LogLevel,
    pub text: String,
}

impl LogEntry {
    /// `[HH:MM:SS] LEVEL text`, as shown in the scrolling log.
    pub fn render(&self) -> String {
        format!("[{}] {} {}", self.time.format("%H:%M:%S"), self.level.as_str(), self.text)
    }
}

/// The user-visible scrolling message log. Every entry is also sent to `log`.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
}

impl MessageLog {
    pub fn push(&mut self, level: LogLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            LogLevel::Info => log::info!("{}", text),
            LogLevel::Warning => log::warn!("{}", text),
            LogLevel::Error => log::error!("{}", text),
        }
        if self.entries.len() == MESSAGE_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            time: Local::now(),
            level,
            text,
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(LogLevel::Info, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(LogLevel::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(LogLevel::Error, text);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_fall_off() {
        let mut log = MessageLog::default();
        for i in 0..MESSAGE_LOG_CAPACITY + 10 {
            log.info(format!("line {}", i));
        }
        assert_eq!(log.len(), MESSAGE_LOG_CAPACITY);
        assert_eq!(log.entries().next().unwrap().text, "line 10");
        assert!(log.last().unwrap().render().ends_with("INFO line 265"));
    }
}
