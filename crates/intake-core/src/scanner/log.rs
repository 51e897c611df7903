use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use crate::error::Error;
use crate::policy::ExclusionDecision;

/// Append-only record of everything a session left out. Shared by all scan
/// threads; nothing reads it back to make decisions.
#[derive(Debug, Default)]
pub struct ExcludedItemLog {
    entries: Mutex<Vec<ExclusionDecision>>,
}

impl ExcludedItemLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admitted decisions are ignored.
    pub fn append(&self, decision: ExclusionDecision) {
        if decision.admitted {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(decision);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<ExclusionDecision> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn reason_counts(&self) -> BTreeMap<&'static str, usize> {
        reason_counts(&self.snapshot())
    }
}

pub fn reason_counts(entries: &[ExclusionDecision]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for label in entries.iter().filter_map(|d| d.reason_label()) {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Write `kind,path,name,reason,detail` rows with a header.
pub fn write_csv<W: io::Write>(entries: &[ExclusionDecision], writer: W) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["kind", "path", "name", "reason", "detail"])?;

    for decision in entries {
        let (label, detail) = match &decision.reason {
            Some(reason) => (reason.label().to_string(), reason.detail()),
            None => (String::new(), String::new()),
        };
        wtr.write_record([
            decision.kind.to_string(),
            decision.path.clone(),
            decision.name.clone(),
            label,
            detail,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(entries: &[ExclusionDecision], path: &Path) -> Result<(), Error> {
    let file = File::create(path)?;
    write_csv(entries, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{EntryKind, ExclusionReason};

    fn excluded(path: &str, reason: ExclusionReason) -> ExclusionDecision {
        let name = path.rsplit('/').next().unwrap();
        ExclusionDecision::exclude(name, path, EntryKind::File, reason)
    }

    #[test]
    fn test_append_skips_admitted() {
        let log = ExcludedItemLog::new();
        log.append(ExclusionDecision::admit("a.txt", "r/a.txt", EntryKind::File));
        log.append(excluded(
            "r/b.png",
            ExclusionReason::DisallowedType {
                extension: Some("png".to_string()),
            },
        ));
        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].path, "r/b.png");
    }

    #[test]
    fn test_reason_counts() {
        let log = ExcludedItemLog::new();
        log.append(excluded("r/a.png", ExclusionReason::DisallowedType { extension: None }));
        log.append(excluded("r/b.png", ExclusionReason::DisallowedType { extension: None }));
        log.append(excluded(
            "r/c.txt",
            ExclusionReason::ExceedsSizeLimit { size: 20, limit: 10 },
        ));

        let counts = log.reason_counts();
        assert_eq!(counts.get("disallowed type"), Some(&2));
        assert_eq!(counts.get("exceeds size limit"), Some(&1));
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let log = ExcludedItemLog::new();
        std::thread::scope(|scope| {
            for t in 0..4 {
                let log = &log;
                scope.spawn(move || {
                    for i in 0..250 {
                        log.append(excluded(
                            &format!("r/{}-{}.bin", t, i),
                            ExclusionReason::DisallowedType {
                                extension: Some("bin".to_string()),
                            },
                        ));
                    }
                });
            }
        });
        assert_eq!(log.len(), 1000);
    }

    #[test]
    fn test_write_csv() {
        let entries = vec![excluded(
            "r/big.txt",
            ExclusionReason::ExceedsSizeLimit { size: 20, limit: 10 },
        )];
        let mut out = Vec::new();
        write_csv(&entries, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("kind,path,name,reason,detail"));
        assert_eq!(
            lines.next(),
            Some("file,r/big.txt,big.txt,exceeds size limit,20 bytes > 10 bytes")
        );
    }
}
