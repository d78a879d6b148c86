//! Tab-separated rank logs produced by link-prediction evaluation.
//!
//! ```text
//! <header line>
//! <head> <relation> <tail>\t<rank_head>\t<rank_tail>
//! ```
//!
//! A rank of 0 means the correct answer was not found.

use crate::ranks::errors::{RankError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Query {
    pub head: u64,
    pub relation: u64,
    pub tail: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankResult {
    pub query: Query,
    pub rank_head: u64,
    pub rank_tail: u64,
}

fn parse_field(field: &str, name: &str, line: usize) -> Result<u64> {
    field.trim().parse().map_err(|e| RankError::Malformed {
        line,
        reason: format!("{} {:?}: {}", name, field, e),
    })
}

fn parse_query(query: &str, line: usize) -> Result<Query> {
    let mut ids = query.split_whitespace();
    let mut next = |name: &str| -> Result<u64> {
        let field = ids.next().ok_or_else(|| RankError::Malformed {
            line,
            reason: format!("query {:?} has no {}", query, name),
        })?;
        parse_field(field, name, line)
    };
    Ok(Query {
        head: next("head")?,
        relation: next("relation")?,
        tail: next("tail")?,
    })
}

/// Parse one data line; `line` is its 1-based number in the file.
pub fn parse_rank_line(text: &str, line: usize) -> Result<RankResult> {
    let mut columns = text.split('\t');
    let mut column = |name: &str| {
        columns.next().ok_or_else(|| RankError::Malformed {
            line,
            reason: format!("missing {} column", name),
        })
    };
    let query = parse_query(column("query")?, line)?;
    let rank_head = parse_field(column("rank_head")?, "rank_head", line)?;
    let rank_tail = parse_field(column("rank_tail")?, "rank_tail", line)?;
    Ok(RankResult {
        query,
        rank_head,
        rank_tail,
    })
}

/// Parse a whole log. The first line is a header and is skipped, as are blank lines.
pub fn parse_rank_log<R: BufRead>(reader: R) -> Result<Vec<RankResult>> {
    let mut results = Vec::new();
    for (i, text) in reader.lines().enumerate().skip(1) {
        let text = text?;
        if text.trim().is_empty() {
            continue;
        }
        results.push(parse_rank_line(&text, i + 1)?);
    }
    Ok(results)
}

#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_rank_log(path: impl AsRef<Path>) -> Result<Vec<RankResult>> {
    let results = parse_rank_log(BufReader::new(File::open(path.as_ref())?))?;
    info!(results = results.len(), "loaded rank log");
    Ok(results)
}
