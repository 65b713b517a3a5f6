// src/reporting/writer.rs
//
// Every output is first written to a hidden sibling file. Nothing is renamed
// into place until `commit`; dropping an uncommitted set removes the staged
// files, and a commit that fails part way restores the targets it already
// replaced, so a failed run leaves no partial outputs behind.

use csv::WriterBuilder;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;
use crate::matching::manager::MatcherRun;
use crate::models::matching::{AcceptedMatch, UnmatchedSummary};
use crate::reporting::report::ExpandedMatch;

#[derive(Debug, Serialize)]
struct UniqueMatchRow<'a> {
    original: &'a str,
    #[serde(rename = "companyName")]
    company_name: &'a str,
    #[serde(rename = "entityId")]
    entity_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CandidateRow<'a> {
    original: &'a str,
    #[serde(rename = "companyName")]
    company_name: &'a str,
    score: f64,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Default)]
pub struct StagedOutputs {
    staged: Vec<(PathBuf, PathBuf)>,
}

impl StagedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(&mut self, target: &Path) -> Result<(File, PathBuf), PipelineError> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PipelineError::InvalidConfig(format!(
                    "output path '{}' has no file name",
                    target.display()
                ))
            })?;
        let temp = target.with_file_name(format!(".{}.{}.partial", file_name, std::process::id()));
        let file = File::create(&temp).map_err(io_err(&temp))?;
        self.staged.push((temp.clone(), target.to_path_buf()));
        Ok((file, temp))
    }

    /// Writes `headers` then one serialized row per item. The header line is
    /// written even when there are no rows.
    pub fn write_csv<S, I>(
        &mut self,
        target: &Path,
        headers: &[&str],
        rows: I,
    ) -> Result<usize, PipelineError>
    where
        S: Serialize,
        I: IntoIterator<Item = S>,
    {
        let (file, temp) = self.stage(target)?;
        let csv_err = |source| PipelineError::Csv {
            path: target.to_path_buf(),
            source,
        };
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.write_record(headers).map_err(csv_err)?;
        let mut written = 0;
        for row in rows {
            wtr.serialize(row).map_err(csv_err)?;
            written += 1;
        }
        wtr.flush().map_err(io_err(&temp))?;
        debug!("Staged {} rows for {}", written, target.display());
        Ok(written)
    }

    pub fn write_json<S: Serialize>(&mut self, target: &Path, value: &S) -> Result<(), PipelineError> {
        let (file, temp) = self.stage(target)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| PipelineError::Io {
                path: target.to_path_buf(),
                source: e.into(),
            })?;
        writer.flush().map_err(io_err(&temp))?;
        Ok(())
    }

    /// Moves every staged file into place, in the order they were staged. An
    /// existing target is set aside first; if any rename fails, the targets
    /// already moved are rolled back to their previous contents.
    pub fn commit(mut self) -> Result<Vec<PathBuf>, PipelineError> {
        let staged = std::mem::take(&mut self.staged);
        let mut placed: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(staged.len());
        let mut pending = staged.into_iter();
        while let Some((temp, target)) = pending.next() {
            match place(&temp, &target) {
                Ok(backup) => placed.push((target, backup)),
                Err(err) => {
                    // Put the rest back so Drop cleans them up.
                    self.staged.push((temp, target));
                    self.staged.extend(pending);
                    roll_back(&placed);
                    return Err(err);
                }
            }
        }

        let mut committed = Vec::with_capacity(placed.len());
        for (target, backup) in placed {
            if let Some(backup) = backup {
                if let Err(e) = fs::remove_file(&backup) {
                    warn!("Could not remove backup {}: {}", backup.display(), e);
                }
            }
            info!("💾 Wrote {}", target.display());
            committed.push(target);
        }
        Ok(committed)
    }
}

/// Renames `temp` over `target`, returning where the previous file went.
fn place(temp: &Path, target: &Path) -> Result<Option<PathBuf>, PipelineError> {
    let backup = if target.is_file() {
        let backup = temp.with_extension("bak");
        fs::rename(target, &backup).map_err(io_err(target))?;
        Some(backup)
    } else {
        None
    };
    if let Err(source) = fs::rename(temp, target) {
        if let Some(backup) = &backup {
            if let Err(e) = fs::rename(backup, target) {
                warn!("Could not restore {} from {}: {}", target.display(), backup.display(), e);
            }
        }
        return Err(PipelineError::Io {
            path: target.to_path_buf(),
            source,
        });
    }
    Ok(backup)
}

/// Undoes `place` for every target, newest first.
fn roll_back(placed: &[(PathBuf, Option<PathBuf>)]) {
    for (target, backup) in placed.iter().rev() {
        let undone = match backup {
            Some(backup) => fs::rename(backup, target),
            None => fs::remove_file(target),
        };
        match undone {
            Ok(()) => debug!("Rolled back {}", target.display()),
            Err(e) => warn!("Could not roll back {}: {}", target.display(), e),
        }
    }
}

impl Drop for StagedOutputs {
    fn drop(&mut self) {
        for (temp, _) in self.staged.drain(..) {
            if let Err(e) = fs::remove_file(&temp) {
                warn!("Could not remove staged file {}: {}", temp.display(), e);
            }
        }
    }
}

pub fn write_unique_matches(
    outputs: &mut StagedOutputs,
    target: &Path,
    accepted: &[AcceptedMatch],
) -> Result<usize, PipelineError> {
    outputs.write_csv(
        target,
        &["original", "companyName", "entityId"],
        accepted.iter().map(|m| UniqueMatchRow {
            original: &m.original,
            company_name: &m.company_name,
            entity_id: m.entity_id.as_ref().map(|id| id.0.as_str()).unwrap_or(""),
        }),
    )
}

pub fn write_unmatched(
    outputs: &mut StagedOutputs,
    target: &Path,
    unmatched: &[UnmatchedSummary],
) -> Result<usize, PipelineError> {
    outputs.write_csv(target, &["original", "count"], unmatched)
}

pub fn write_matched_all(
    outputs: &mut StagedOutputs,
    target: &Path,
    matched_all: &[ExpandedMatch],
) -> Result<usize, PipelineError> {
    outputs.write_csv(target, &["original", "companyName"], matched_all)
}

/// One `candidates_<method>.csv` per enabled matcher, best scores first.
pub fn write_candidate_dumps(
    outputs: &mut StagedOutputs,
    dir: &Path,
    runs: &[MatcherRun],
) -> Result<(), PipelineError> {
    for run in runs.iter().filter(|r| r.enabled) {
        let target = dir.join(format!("candidates_{}.csv", run.method.as_str()));
        outputs.write_csv(
            &target,
            &["original", "companyName", "score"],
            run.candidates.iter().map(|c| CandidateRow {
                original: &c.transaction_original,
                company_name: &c.company_name,
                score: c.score,
            }),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::EntityId;
    use crate::models::matching::{MatchCandidate, MatchMethodType, MatchSource};
    use std::time::Duration;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_unique_matches_written_with_empty_entity_id() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("matches.csv");
        let accepted = vec![
            AcceptedMatch {
                original: "ACME INC #4471".to_string(),
                company_name: "Acme Inc".to_string(),
                entity_id: Some(EntityId::from("e1")),
                source: MatchSource::Algorithm(MatchMethodType::FuzzyJoin),
            },
            AcceptedMatch {
                original: "MYSTERY, LLC".to_string(),
                company_name: "Mystery".to_string(),
                entity_id: None,
                source: MatchSource::Manual,
            },
        ];

        let mut outputs = StagedOutputs::new();
        write_unique_matches(&mut outputs, &target, &accepted).unwrap();
        assert!(!target.exists());
        outputs.commit().unwrap();

        let content = fs::read_to_string(&target).unwrap();
        assert_eq!(
            content,
            "original,companyName,entityId\nACME INC #4471,Acme Inc,e1\n\"MYSTERY, LLC\",Mystery,\n"
        );
        assert_eq!(dir_entries(dir.path()), vec!["matches.csv"]);
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("unmatched.csv");
        let mut outputs = StagedOutputs::new();
        write_unmatched(&mut outputs, &target, &[]).unwrap();
        outputs.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "original,count\n");
    }

    #[test]
    fn test_dropped_outputs_leave_nothing_behind() {
        let dir = TempDir::new().unwrap();
        {
            let mut outputs = StagedOutputs::new();
            write_unmatched(
                &mut outputs,
                &dir.path().join("unmatched.csv"),
                &[UnmatchedSummary { original: "X".to_string(), count: 2 }],
            )
            .unwrap();
            outputs
                .write_json(&dir.path().join("summary.json"), &serde_json::json!({"ok": false}))
                .unwrap();
        }
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_failed_commit_restores_earlier_outputs() {
        let dir = TempDir::new().unwrap();
        let matches = dir.path().join("matches.csv");
        let fresh = dir.path().join("unmatched.csv");
        let blocked = dir.path().join("summary.json");
        fs::write(&matches, "previous run\n").unwrap();
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        let mut outputs = StagedOutputs::new();
        write_unique_matches(&mut outputs, &matches, &[]).unwrap();
        write_unmatched(&mut outputs, &fresh, &[]).unwrap();
        outputs.write_json(&blocked, &serde_json::json!({"ok": true})).unwrap();
        let err = outputs.commit().unwrap_err();

        assert!(matches!(err, PipelineError::Io { ref path, .. } if path == &blocked));
        assert_eq!(fs::read_to_string(&matches).unwrap(), "previous run\n");
        assert!(!fresh.exists());
        assert_eq!(dir_entries(dir.path()), vec!["matches.csv", "summary.json"]);
        assert_eq!(dir_entries(&blocked), vec!["keep"]);
    }

    #[test]
    fn test_commit_replaces_existing_output() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("unmatched.csv");
        fs::write(&target, "stale\n").unwrap();
        let mut outputs = StagedOutputs::new();
        write_unmatched(&mut outputs, &target, &[]).unwrap();
        outputs.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "original,count\n");
        assert_eq!(dir_entries(dir.path()), vec!["unmatched.csv"]);
    }

    #[test]
    fn test_candidate_dumps_skip_disabled_matchers() {
        let dir = TempDir::new().unwrap();
        let runs = vec![
            MatcherRun {
                method: MatchMethodType::StringGrouper,
                enabled: true,
                threshold: 0.9,
                candidates: vec![MatchCandidate {
                    left_index: 0,
                    right_index: 0,
                    transaction_original: "WALGREENS".to_string(),
                    company_name: "Walgreen".to_string(),
                    score: 0.85,
                    method: MatchMethodType::StringGrouper,
                }],
                elapsed: Duration::ZERO,
            },
            MatcherRun {
                method: MatchMethodType::NearestNeighbor,
                enabled: false,
                threshold: 0.61,
                candidates: Vec::new(),
                elapsed: Duration::ZERO,
            },
        ];
        let mut outputs = StagedOutputs::new();
        write_candidate_dumps(&mut outputs, dir.path(), &runs).unwrap();
        outputs.commit().unwrap();

        assert_eq!(dir_entries(dir.path()), vec!["candidates_string_grouper.csv"]);
        let content = fs::read_to_string(dir.path().join("candidates_string_grouper.csv")).unwrap();
        assert_eq!(content, "original,companyName,score\nWALGREENS,Walgreen,0.85\n");
    }
}
