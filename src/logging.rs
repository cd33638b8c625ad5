//! Optional transcript logging
//!
//! Committed turns can be appended to a plain-text file, enabled either by
//! the `--log` flag or the `/log` command. Only committed turns are
//! written; partial streams that fail never reach the log.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct TranscriptLog {
    file_path: Option<String>,
    is_active: bool,
}

impl TranscriptLog {
    pub fn new(log_file: Option<String>) -> Self {
        let is_active = log_file.is_some();
        Self {
            file_path: log_file,
            is_active,
        }
    }

    /// Point the log at a file and start writing. Fails when the file
    /// cannot be opened for appending.
    pub fn enable(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?
            .flush()?;

        self.file_path = Some(path.clone());
        self.is_active = true;
        Ok(format!("Logging enabled to: {path}"))
    }

    /// Pause or resume writing. Requires a file to have been set first.
    pub fn toggle(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        match &self.file_path {
            Some(path) => {
                self.is_active = !self.is_active;
                if self.is_active {
                    Ok(format!("Logging resumed to: {path}"))
                } else {
                    Ok(format!("Logging paused (file: {path})"))
                }
            }
            None => Err("No log file specified. Use /log <filename> to enable logging first.".into()),
        }
    }

    /// Append one committed turn, preserving its internal line breaks and
    /// leaving a blank line after it for spacing.
    pub fn append(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let file = OpenOptions::new().create(true).append(true).open(file_path)?;
        let mut writer = BufWriter::new(file);
        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn status(&self) -> String {
        let file_name = |path: &String| {
            Path::new(path)
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned()
        };
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!("active ({})", file_name(path)),
            (Some(path), false) => format!("paused ({})", file_name(path)),
        }
    }
}
