use std::fs::File;
use std::io::Write;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

struct RouterLogger {
    file: Option<Mutex<File>>,
    filter: LevelFilter,
    start: Instant,
}

impl RouterLogger {
    fn line(&self, record: &Record) -> String {
        let elapsed = self.start.elapsed().as_secs_f64();
        format!(
            "[{elapsed:.3}s] [{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for RouterLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.line(record);
        eprintln!("{line}");
        if let Some(ref file) = self.file {
            let _ = writeln!(file.lock(), "{line}");
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Level from `RUST_LOG` when it parses, `fallback` otherwise
fn filter_from_env(fallback: LevelFilter) -> LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

/// Initialize the global logger, writing to stderr and optionally `log_file`.
///
/// `RUST_LOG` overrides `level`. A second call leaves the first logger in place.
pub fn init(level: LevelFilter, log_file: Option<File>) {
    let filter = filter_from_env(level);
    let logger = RouterLogger {
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(filter);
    }
}
