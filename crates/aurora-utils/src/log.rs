use chrono::{Local, Timelike};
use ::log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use terminal_color_builder::OutputFormatter as tcb;

pub use ::log::{debug, error, info, trace, warn};

fn timestamp() -> String {
    let time = Local::now();
    format!(
        "[{:02}:{:02}:{:02}]",
        time.hour(),
        time.minute(),
        time.second()
    )
}

fn format_record(record: &Record) -> String {
    format!("{} {}: {}", record.level(), record.target(), record.args())
}

/// Writes timestamped records to stdout, warnings and errors coloured to stderr.
#[derive(Debug, Clone, Copy)]
pub struct CoutLogger {
    level: LevelFilter,
}

impl Default for CoutLogger {
    fn default() -> Self {
        Self::new(LevelFilter::Info)
    }
}

impl CoutLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for CoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_record(record);
        match record.level() {
            Level::Error => eprintln!(
                "{} {}",
                timestamp(),
                tcb::new().fg().hex("d70000").text_str(&line).print()
            ),
            Level::Warn => eprintln!(
                "{} {}",
                timestamp(),
                tcb::new().fg().hex("d75f00").text_str(&line).print()
            ),
            _ => println!("{} {}", timestamp(), line),
        }
    }

    fn flush(&self) {}
}

/// Keeps the most recent records in memory. Clones share the same buffer, so
/// one clone can be installed while another is inspected.
#[derive(Debug, Clone)]
pub struct BufferLogger {
    buffer: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
    level: LevelFilter,
}

impl Default for BufferLogger {
    fn default() -> Self {
        Self::with_capacity(1000)
    }
}

impl BufferLogger {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            level: LevelFilter::Trace,
        }
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn push(&self, line: String) {
        if let Ok(mut buffer) = self.buffer.lock() {
            if buffer.len() >= self.capacity {
                buffer.pop_front();
            }
            buffer.push_back(line);
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn clear(&self) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
    }
}

impl Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.push(format_record(record));
        }
    }

    fn flush(&self) {}
}

/// Installs `output` as the global logger. Fails if a logger was already set.
pub fn set_logger<T: 'static + Log>(output: T, level: LevelFilter) -> Result<(), SetLoggerError> {
    ::log::set_boxed_logger(Box::new(output)).map(|()| ::log::set_max_level(level))
}

/// Installs a [`CoutLogger`] at the given level.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    set_logger(CoutLogger::new(level), level)
}
