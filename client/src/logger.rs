//! Leveled stderr logging. stdout carries only the JSON result.

use colorful::{Color, Colorful};
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn label(self) -> String {
        match self {
            Level::Debug => "DEBUG".color(Color::DarkGray).to_string(),
            Level::Info => "INFO ".color(Color::Green).to_string(),
            Level::Warn => "WARN ".color(Color::Yellow).bold().to_string(),
            Level::Error => "ERROR".color(Color::Red).bold().to_string(),
        }
    }
}

pub fn log(level: Level, target: &str, message: std::fmt::Arguments) {
    if level == Level::Debug && !verbose() {
        return;
    }
    eprintln!("{} {} {}", level.label(), format!("[{}]", target).color(Color::Blue), message);
}

#[macro_export]
macro_rules! log_debug {
    ($target:expr, $($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Debug, $target, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($target:expr, $($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Info, $target, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($target:expr, $($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Warn, $target, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($target:expr, $($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Error, $target, format_args!($($arg)*))
    };
}
