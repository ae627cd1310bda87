//! Text input grammars
//!
//! - edge list: `from,to` per line
//! - vector: comma-separated integers
//! - matrix: one vector per line
//! - process list: `name,arrival,burst[,priority]` per line
//! - prevention scenario: `process,resource,type` per line, type `A` or `R`
//!
//! Blank lines are skipped everywhere. Line numbers in errors are 1-based
//! positions in the input text.

use crate::deadlock::{EventKind, ScenarioEvent};
use crate::error::{Error, Result};
use crate::scheduler::ProcessSpec;
use tracing::debug;

fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

fn fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// Non-negative count, `default` when blank or unparsable.
pub fn parse_count(text: &str, default: usize) -> usize {
    text.trim().parse().unwrap_or(default)
}

/// Rows without two non-empty fields are dropped.
pub fn parse_edges(text: &str) -> Vec<(String, String)> {
    lines(text)
        .filter_map(|(n, line)| {
            let parts = fields(line);
            match (parts.first(), parts.get(1)) {
                (Some(from), Some(to)) if !from.is_empty() && !to.is_empty() => {
                    Some((from.to_string(), to.to_string()))
                }
                _ => {
                    debug!("Skipping malformed edge on line {}: {:?}", n, line);
                    None
                }
            }
        })
        .collect()
}

/// Non-numeric tokens are skipped.
pub fn parse_vector(text: &str) -> Vec<i64> {
    text.split(',')
        .filter_map(|t| t.trim().parse().ok())
        .collect()
}

pub fn parse_matrix(text: &str) -> Vec<Vec<i64>> {
    lines(text).map(|(_, line)| parse_vector(line)).collect()
}

pub fn parse_processes(text: &str) -> Result<Vec<ProcessSpec>> {
    lines(text)
        .map(|(n, line)| parse_process_line(n, line))
        .collect()
}

fn parse_process_line(line_no: usize, line: &str) -> Result<ProcessSpec> {
    let invalid = |reason: String| Error::InvalidProcessSpec {
        line: line_no,
        reason,
    };

    let parts = fields(line);
    if parts.len() < 3 || parts.len() > 4 {
        return Err(invalid(format!(
            "expected name,arrival,burst[,priority] but found {} fields",
            parts.len()
        )));
    }
    if parts[0].is_empty() {
        return Err(invalid("process name is empty".to_string()));
    }

    let arrival = parts[1]
        .parse::<u32>()
        .map_err(|_| invalid(format!("arrival '{}' is not a non-negative integer", parts[1])))?;
    let burst = parts[2]
        .parse::<u32>()
        .map_err(|_| invalid(format!("burst '{}' is not a non-negative integer", parts[2])))?;
    let priority = match parts.get(3) {
        Some(p) => p
            .parse::<i64>()
            .map_err(|_| invalid(format!("priority '{}' is not an integer", p)))?,
        None => 0,
    };

    Ok(ProcessSpec::new(parts[0], arrival, burst).with_priority(priority))
}

pub fn parse_events(text: &str) -> Result<Vec<ScenarioEvent>> {
    lines(text)
        .map(|(n, line)| {
            let parts = fields(line);
            if parts.len() != 3 || parts[0].is_empty() || parts[1].is_empty() {
                return Err(Error::InvalidEvent {
                    line: n,
                    reason: "expected process,resource,type".to_string(),
                });
            }
            let kind: EventKind = parts[2].parse().map_err(|e| match e {
                Error::InvalidEvent { reason, .. } => Error::InvalidEvent { line: n, reason },
                other => other,
            })?;
            Ok(ScenarioEvent {
                process: parts[0].to_string(),
                resource: parts[1].to_string(),
                kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("5", 3), 5);
        assert_eq!(parse_count("", 3), 3);
        assert_eq!(parse_count("abc", 3), 3);
        assert_eq!(parse_count("0", 3), 0);
    }

    #[test]
    fn test_parse_edges() {
        let edges = parse_edges("P1, R1\n\nP2,R2\nP3\n,R4\n");
        assert_eq!(
            edges,
            vec![
                ("P1".to_string(), "R1".to_string()),
                ("P2".to_string(), "R2".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_vector_skips_garbage() {
        assert_eq!(parse_vector("3, 3,x, 2"), vec![3, 3, 2]);
        assert!(parse_vector("").is_empty());
    }

    #[test]
    fn test_parse_matrix() {
        let m = parse_matrix("7,5,3\r\n3,2,2\n\n9,0,2");
        assert_eq!(m, vec![vec![7, 5, 3], vec![3, 2, 2], vec![9, 0, 2]]);
    }

    #[test]
    fn test_parse_processes() {
        let specs = parse_processes("P1,0,5\nP2, 1, 3, 4\n").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1], ProcessSpec::new("P2", 1, 3).with_priority(4));
    }

    #[test]
    fn test_parse_processes_field_count() {
        let err = parse_processes("P1,0,5\nP2,1\n").unwrap_err();
        match err {
            Error::InvalidProcessSpec { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_processes_non_numeric() {
        assert!(parse_processes("P1,zero,5").is_err());
        assert!(parse_processes("P1,0,5,high").is_err());
        assert!(parse_processes("P1,0,5,1,extra").is_err());
    }

    #[test]
    fn test_parse_events() {
        let events = parse_events("P1,R1,A\nP2,R1,r\n").unwrap();
        assert_eq!(events[0].kind, EventKind::Allocate);
        assert_eq!(events[1].kind, EventKind::Request);

        match parse_events("P1,R1,A\nP1,R2,X").unwrap_err() {
            Error::InvalidEvent { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
