//! EV timing files
//!
//! One line per event, three whitespace-separated columns:
//! onset (s), duration (s), amplitude. An empty file means the condition
//! did not occur in that run.

use std::fs;
use std::path::Path;

use hcp_wm_core::types::{Event, RunEvents};

use crate::error::{DatasetError, DatasetResult};

/// Parse EV text; `path` is only used for error context
///
/// # Errors
///
/// Returns [`DatasetError::EvParse`] for lines that are not three numbers.
pub fn parse_ev_text(text: &str, path: &Path) -> DatasetResult<RunEvents> {
    let mut run = RunEvents::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let err = |reason: String| DatasetError::EvParse {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        };

        let columns = line
            .split_whitespace()
            .map(|tok| tok.parse::<f64>().map_err(|_| err(format!("'{tok}' is not a number"))))
            .collect::<DatasetResult<Vec<_>>>()?;

        match columns[..] {
            [onset, duration, amplitude] => run.push(Event::new(onset, duration, amplitude)),
            _ => return Err(err(format!("expected 3 columns, found {}", columns.len()))),
        }
    }

    Ok(run)
}

/// Read and parse one EV file
///
/// # Errors
///
/// Fails if the file is missing or malformed.
pub fn read_ev_file(path: &Path) -> DatasetResult<RunEvents> {
    let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_ev_text(&text, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        let text = "36.159\t27.5\t1\n107.53 27.5 1\n";
        let run = parse_ev_text(text, Path::new("0bk_body.txt")).unwrap();

        assert_eq!(run.len(), 2);
        assert_eq!(run.onsets(), vec![36.159, 107.53]);
        assert_eq!(run.events()[0].amplitude, 1.0);
    }

    #[test]
    fn test_empty_file_has_no_events() {
        let run = parse_ev_text("\n  \n", Path::new("2bk_err.txt")).unwrap();
        assert!(run.is_empty());
    }

    #[test]
    fn test_reports_bad_line() {
        let err = parse_ev_text("1 2 1\n3 4\n", Path::new("x.txt")).unwrap_err();
        assert!(matches!(err, DatasetError::EvParse { line: 2, .. }));

        let err = parse_ev_text("1 two 1\n", Path::new("x.txt")).unwrap_err();
        assert!(matches!(err, DatasetError::EvParse { line: 1, .. }));
    }
}
