/// Plain-text log file sink
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::Lazy;

static LOG_FILE: Lazy<Mutex<Option<BufWriter<File>>>> = Lazy::new(|| Mutex::new(None));

/// Open (append) the configured log file; an empty path disables file logging
pub fn init_file_logging(path: &str) {
    if path.trim().is_empty() {
        return;
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            if let Ok(mut sink) = LOG_FILE.lock() {
                *sink = Some(BufWriter::new(file));
            }
        }
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
        }
    }
}

pub fn write_to_file(line: &str) {
    if let Ok(mut sink) = LOG_FILE.lock() {
        if let Some(writer) = sink.as_mut() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

pub fn flush_file_logging() {
    if let Ok(mut sink) = LOG_FILE.lock() {
        if let Some(writer) = sink.as_mut() {
            let _ = writer.flush();
        }
    }
}
