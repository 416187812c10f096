//! Tag data file.
//!
//! Counts are rewritten in full on every tag, one line per zombie:
//!
//! ```text
//! Zombie 5 tagged 2 times.
//! ```
//!
//! The zombification line is appended once, after the final snapshot.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use outbreak_core::feedback::{SinkError, TagSink};
use outbreak_types::{TagRecord, ZombificationRecord};
use tracing::debug;

/// Default file name, relative to the working directory.
pub const DEFAULT_TAG_FILE: &str = "tag_data.txt";

/// [`TagSink`] writing plain-text lines to a file.
#[derive(Debug, Clone)]
pub struct FileTagSink {
    path: PathBuf,
}

impl FileTagSink {
    /// Write tag data to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render a snapshot as the file body.
pub fn render_snapshot(records: &[TagRecord]) -> String {
    records
        .iter()
        .map(|record| format!("Zombie {} tagged {} times.\n", record.peer_id, record.tag_count))
        .collect()
}

/// Render the zombification line (without the trailing newline).
pub fn render_zombification(record: &ZombificationRecord) -> String {
    format!(
        "This human lasted {:.1} seconds before being zombified!",
        record.survived.as_secs_f64()
    )
}

impl TagSink for FileTagSink {
    fn persist_tag_snapshot(&mut self, records: &[TagRecord]) -> Result<(), SinkError> {
        std::fs::write(&self.path, render_snapshot(records))?;
        debug!(path = %self.path.display(), zombies = records.len(), "Tag counts written");
        Ok(())
    }

    fn append_zombification_record(
        &mut self,
        record: &ZombificationRecord,
    ) -> Result<(), SinkError> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", render_zombification(record))?;
        debug!(path = %self.path.display(), "Zombification recorded");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use core::time::Duration;

    use outbreak_types::PeerId;

    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "outbreak_sink_{name}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        dir.join(DEFAULT_TAG_FILE)
    }

    fn record(raw: u16, tag_count: u32) -> TagRecord {
        TagRecord {
            peer_id: PeerId::new(raw, 13).unwrap(),
            tag_count,
        }
    }

    #[test]
    fn snapshot_overwrites_previous_contents() {
        let path = temp_file("overwrite");
        let mut sink = FileTagSink::new(&path);

        sink.persist_tag_snapshot(&[record(5, 1)]).unwrap();
        sink.persist_tag_snapshot(&[record(3, 1), record(5, 2)]).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(body, "Zombie 3 tagged 1 times.\nZombie 5 tagged 2 times.\n");
    }

    #[test]
    fn zombification_is_appended_after_counts() {
        let path = temp_file("append");
        let mut sink = FileTagSink::new(&path);

        sink.persist_tag_snapshot(&[record(5, 3)]).unwrap();
        sink.append_zombification_record(&ZombificationRecord {
            broadcast_id: PeerId::new(5, 13).unwrap(),
            survived: Duration::from_millis(12_200),
        })
        .unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            body,
            "Zombie 5 tagged 3 times.\nThis human lasted 12.2 seconds before being zombified!\n"
        );
    }

    #[test]
    fn unwritable_path_reports_io_error() {
        let path = temp_file("missing").join("no_such_dir").join(DEFAULT_TAG_FILE);
        let mut sink = FileTagSink::new(path);
        assert!(matches!(
            sink.persist_tag_snapshot(&[record(5, 1)]),
            Err(SinkError::Io { .. })
        ));
    }
}
