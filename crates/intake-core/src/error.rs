use thiserror::Error;

use crate::policy::ExclusionDecision;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Every dropped root came back empty. Carries the exclusion log so the
    /// caller can still explain what was rejected.
    #[error("No valid files found in the dropped items")]
    NoAdmittedFiles { excluded: Vec<ExclusionDecision> },

    #[error("No files to upload")]
    EmptySelection,

    #[error("Scan session {0} was superseded by a newer drop")]
    Superseded(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let cases = [
            (
                Error::NoAdmittedFiles { excluded: vec![] },
                "No valid files found in the dropped items",
            ),
            (Error::EmptySelection, "No files to upload"),
            (
                Error::Superseded(4),
                "Scan session 4 was superseded by a newer drop",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }

        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.to_string(), "IO error: gone");
    }
}
