//! Глобальный logger симуляции.
//!
//! До `init_logger` сообщения молча отбрасываются (тесты, embedded world).
//! Порог фильтрации задаётся из `SimulationConfig::log_level`.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Порядок вариантов = порядок важности
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn tag(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

struct Sink {
    threshold: LogLevel,
    console: bool,
}

impl Sink {
    fn accepts(&self, level: LogLevel) -> bool {
        self.console && level >= self.threshold
    }
}

static SINK: Lazy<Mutex<Sink>> = Lazy::new(|| {
    Mutex::new(Sink {
        threshold: LogLevel::Debug,
        console: false,
    })
});

/// Включает вывод в stdout. Повторный вызов ничего не меняет.
pub fn init_logger() {
    if let Ok(mut sink) = SINK.lock() {
        sink.console = true;
    }
}

pub fn set_log_level(level: LogLevel) {
    if let Ok(mut sink) = SINK.lock() {
        sink.threshold = level;
    }
}

fn line(level: LogLevel, message: &str) -> String {
    let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
    format!("{timestamp} {:<5} {message}", level.tag())
}

fn emit(level: LogLevel, message: &str) {
    let accepted = SINK.lock().map(|sink| sink.accepts(level)).unwrap_or(false);
    if accepted {
        println!("{}", line(level, message));
    }
}

pub fn log(message: &str) {
    emit(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    emit(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    emit(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    emit(LogLevel::Error, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_sink_filters_below_threshold() {
        let sink = Sink {
            threshold: LogLevel::Warning,
            console: true,
        };
        assert!(!sink.accepts(LogLevel::Info));
        assert!(sink.accepts(LogLevel::Warning));
        assert!(sink.accepts(LogLevel::Error));

        let silent = Sink {
            threshold: LogLevel::Debug,
            console: false,
        };
        assert!(!silent.accepts(LogLevel::Error));
    }

    #[test]
    fn test_line_carries_level_tag() {
        let text = line(LogLevel::Warning, "frame skipped");
        assert!(text.ends_with("WARN  frame skipped"));
    }

    #[test]
    fn test_log_level_from_ron() {
        let level: LogLevel = ron::from_str("Warning").unwrap();
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(level.tag(), "WARN");
    }
}
