// Reading the election records document.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::config::*;
use crate::normalize_key;

/// Column positions in the header of the election records.
struct Columns {
    year: usize,
    region: usize,
    party: usize,
    candidate_votes: usize,
    total_votes: usize,
    candidate: Option<usize>,
    mode: Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord, level: RegionLevel) -> Result<Columns, MapError> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);
        let require = |name: &str| find(name).ok_or_else(|| MapError::MissingColumn(name.to_string()));

        // The state dataset carries both the detailed and the simplified party labels.
        let party = match find("party_simplified") {
            Some(idx) => idx,
            None => require("party")?,
        };
        Ok(Columns {
            year: require("year")?,
            region: require(level.region_column())?,
            party,
            candidate_votes: require("candidatevotes")?,
            total_votes: require("totalvotes")?,
            candidate: find("candidate"),
            mode: find("mode"),
        })
    }
}

/// Reads the election records for a given level.
///
/// Only the presence of the columns is checked. Inside a row, numbers that
/// cannot be read count as zero and rows without a region key are dropped.
/// A record that cannot be decoded is skipped with a warning.
pub fn parse_rows(text: &str, level: RegionLevel) -> Result<Vec<ElectionRow>, MapError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header = rdr.headers().map_err(|e| MapError::Csv(e.to_string()))?.clone();
    debug!("parse_rows: header: {:?}", header);
    let cols = Columns::from_header(&header, level)?;

    let mut res: Vec<ElectionRow> = Vec::new();
    let mut dropped: usize = 0;
    for (idx, record_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let record = match record_r {
            Ok(r) => r,
            Err(e) => {
                warn!("parse_rows: skipping line {}: {}", lineno, e);
                dropped += 1;
                continue;
            }
        };
        let cell = |i: usize| record.get(i).unwrap_or("").trim();

        let region_key = cell(cols.region);
        if region_key.is_empty() || region_key.eq_ignore_ascii_case("NA") {
            debug!("parse_rows: line {}: no region key, dropping", lineno);
            dropped += 1;
            continue;
        }

        let mode = cols
            .mode
            .map(cell)
            .filter(|m| !m.is_empty())
            .map(|m| m.to_string());

        res.push(ElectionRow {
            year: cell(cols.year).to_string(),
            region_key: region_key.to_string(),
            party: Party::from_label(cell(cols.party)),
            candidate: cols.candidate.map(cell).unwrap_or("").to_string(),
            candidate_votes: read_count(cell(cols.candidate_votes)),
            total_votes: read_count(cell(cols.total_votes)),
            mode,
        });
    }
    info!(
        "parse_rows: read {} rows ({} dropped) at {} level",
        res.len(),
        dropped,
        level.as_str()
    );
    Ok(res)
}

/// Reads a vote count. Anything that is not a non-negative number is zero.
pub fn read_count(s: &str) -> u64 {
    let s = s.trim();
    if let Ok(x) = s.parse::<u64>() {
        return x;
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

/// Collapses rows split by reporting mode into one `TOTAL` row.
///
/// Rows are grouped by year, normalized region key, candidate and party, so
/// that `6037`, `06037` and `6037.0` are the same county. The candidate votes
/// of a group are summed, the total of the first row of the group is kept and
/// the region key is the normalized one. Groups are returned in order of
/// first appearance.
pub fn merge_reporting_modes(rows: &[ElectionRow], level: RegionLevel) -> Vec<ElectionRow> {
    let mut positions: HashMap<(&str, String, &str, Party), usize> = HashMap::new();
    let mut res: Vec<ElectionRow> = Vec::new();
    for row in rows.iter() {
        let key = normalize_key(&row.region_key, level).unwrap_or_else(|| row.region_key.clone());
        let group = (
            row.year.as_str(),
            key.clone(),
            row.candidate.as_str(),
            row.party,
        );
        if let Some(&pos) = positions.get(&group) {
            res[pos].candidate_votes += row.candidate_votes;
        } else {
            positions.insert(group, res.len());
            res.push(ElectionRow {
                region_key: key,
                mode: Some("TOTAL".to_string()),
                ..row.clone()
            });
        }
    }
    debug!(
        "merge_reporting_modes: {} rows merged into {}",
        rows.len(),
        res.len()
    );
    res
}
