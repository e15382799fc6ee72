use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analytics::ReviewSheet;
use crate::session::SessionSnapshot;
use crate::util::format_duration_ms;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write export: {0}")]
    Io(#[from] io::Error),
    #[error("could not encode export row: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct ExportRow {
    question: u32,
    status: String,
    time_spent_ms: u64,
    time_spent: String,
    was_skipped: bool,
    long_question: bool,
    correctness: String,
    difficulty: String,
}

/// One header row, then one row per question in session order
pub fn write_csv<W: Write>(
    writer: W,
    snapshot: &SessionSnapshot,
    review: &ReviewSheet,
) -> Result<(), ExportError> {
    let threshold = snapshot.config.long_question_threshold_ms();
    let mut wtr = csv::Writer::from_writer(writer);

    for record in &snapshot.records {
        let tag = review.get(record.id);
        wtr.serialize(ExportRow {
            question: record.id.0,
            status: record.status.to_string(),
            time_spent_ms: record.time_spent_ms,
            time_spent: format_duration_ms(record.time_spent_ms),
            was_skipped: record.was_skipped,
            long_question: record.time_spent_ms >= threshold,
            correctness: tag.correctness.map(|c| c.to_string()).unwrap_or_default(),
            difficulty: tag.difficulty.map(|d| d.to_string()).unwrap_or_default(),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_file_name(snapshot: &SessionSnapshot) -> String {
    format!("qclock-{}.csv", snapshot.started_at.format("%Y%m%d-%H%M%S"))
}

/// Write the session to `<dir>/qclock-<start time>.csv`, creating `dir`.
/// Exporting the same session again overwrites the earlier file.
pub fn export_to_dir<P: AsRef<Path>>(
    dir: P,
    snapshot: &SessionSnapshot,
    review: &ReviewSheet,
) -> Result<PathBuf, ExportError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let path = dir.join(export_file_name(snapshot));
    let file = File::create(&path)?;
    write_csv(file, snapshot, review)?;

    info!(
        "exported {} questions to {}",
        snapshot.records.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{Correctness, Difficulty};
    use crate::config::SessionConfig;
    use crate::question::{QuestionId, QuestionRecord, QuestionStatus};
    use chrono::{Local, TimeZone};

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            records: vec![
                QuestionRecord {
                    id: QuestionId(1),
                    status: QuestionStatus::Completed,
                    time_spent_ms: 200_000,
                    was_skipped: true,
                },
                QuestionRecord::new(QuestionId(2)),
            ],
            total_allocated_ms: 240_000,
            remaining_ms: 40_000,
            config: SessionConfig::default(),
            started_at: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        }
    }

    #[test]
    fn test_write_csv_rows() {
        let mut review = ReviewSheet::new();
        review.set_correctness(QuestionId(1), Correctness::Incorrect);
        review.set_difficulty(QuestionId(1), Difficulty::Hard);

        let mut out = Vec::new();
        write_csv(&mut out, &snapshot(), &review).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "question,status,time_spent_ms,time_spent,was_skipped,long_question,correctness,difficulty",
                "1,completed,200000,3:20,true,true,incorrect,hard",
                "2,not started,0,0:00,false,false,,",
            ]
        );
    }

    #[test]
    fn test_export_file_name_uses_start_time() {
        assert_eq!(export_file_name(&snapshot()), "qclock-20240309-140507.csv");
    }
}
