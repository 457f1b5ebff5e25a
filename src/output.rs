//! External reaction-output collaborator (spec §6, §1 Non-goals: actual
//! file formatting/rotation lives outside the core). This module only
//! defines the boundary `trigger::OutputWriter` is expressed against, plus
//! an in-memory reference implementation used by tests elsewhere in the
//! crate.

use std::collections::HashMap;

use crate::error::{CountError, Result};
use crate::trigger::OutputWriter;

/// Buffers every appended line per `file_id` in memory. Stands in for the
/// real file-backed writer the scheduler constructs (spec §1 Non-goals:
/// "Output file formatting/rotation beyond building the line itself").
#[derive(Default)]
pub struct MemoryOutputWriter {
    files: HashMap<usize, Vec<String>>,
    fail_on_append: bool,
}

impl MemoryOutputWriter {
    pub fn new() -> Self {
        MemoryOutputWriter::default()
    }

    pub fn lines(&self, file_id: usize) -> &[String] {
        self.files.get(&file_id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

impl OutputWriter for MemoryOutputWriter {
    fn append_trigger(&mut self, file_id: usize, line: &str) -> Result<()> {
        if self.fail_on_append {
            return Err(CountError::InvalidRequest("writer unavailable".into()));
        }
        self.files.entry(file_id).or_default().push(line.to_string());
        Ok(())
    }

    fn flush_all(&mut self) -> usize {
        0
    }

    /// Drop every buffered line whose leading `t_iteration` field parses to
    /// a value at or after `resume_time`, matching the checkpoint-resume
    /// truncation behavior described in SPEC_FULL.md.
    fn truncate_from(&mut self, resume_time: f64) -> Result<()> {
        for lines in self.files.values_mut() {
            lines.retain(|line| {
                let Some(field) = line.split_whitespace().next() else { return true };
                match field.parse::<f64>() {
                    Ok(t) => t < resume_time,
                    Err(_) => true,
                }
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_lines_are_retrievable_per_file() {
        let mut w = MemoryOutputWriter::new();
        w.append_trigger(0, "0 1 2 3 1 a").unwrap();
        w.append_trigger(1, "0 4 5 6 1 b").unwrap();
        assert_eq!(w.lines(0), ["0 1 2 3 1 a"]);
        assert_eq!(w.lines(1), ["0 4 5 6 1 b"]);
    }

    #[test]
    fn truncate_from_drops_lines_at_or_after_resume_time() {
        let mut w = MemoryOutputWriter::new();
        w.append_trigger(0, "1 1 2 3 1 a").unwrap();
        w.append_trigger(0, "5 1 2 3 1 a").unwrap();
        w.truncate_from(5.0).unwrap();
        assert_eq!(w.lines(0), ["1 1 2 3 1 a"]);
    }
}
