mod config;
use log::{debug, info};

use std::collections::HashSet;

pub mod builder;
mod color;
pub mod manual;
mod parser;
mod selection;

pub use crate::color::*;
pub use crate::config::*;
pub use crate::parser::{merge_reporting_modes, parse_rows, read_count};
pub use crate::selection::{SelectionTicket, YearSelection};

/// The name shown for features that carry neither a name nor an identifier.
const UNKNOWN_REGION: &str = "Unknown";

/// Width of a county FIPS code.
const FIPS_WIDTH: usize = 5;

// ********* Region keys *********

/// Normalizes a county identifier to a 5-digit FIPS code.
///
/// Identifiers written as floats (`6037.0`) are read as integers first.
/// Returns `None` for an empty identifier.
pub fn normalize_county_key(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("{:0>width$}", s, width = FIPS_WIDTH));
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => {
            Some(format!("{:0width$}", f as u64, width = FIPS_WIDTH))
        }
        _ => Some(format!("{:0>width$}", s, width = FIPS_WIDTH)),
    }
}

/// Normalizes a state name for the lookup.
pub fn normalize_state_key(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_uppercase())
    }
}

pub fn normalize_key(raw: &str, level: RegionLevel) -> Option<String> {
    match level {
        RegionLevel::State => normalize_state_key(raw),
        RegionLevel::County => normalize_county_key(raw),
    }
}

// ********* Aggregation *********

/// Builds the tally of every region for one year.
///
/// Rows are selected by exact match of their year text with `year`.
/// For each region, the total is the one of the first row seen. The votes of
/// each major party are overwritten by every row of that party: if the source
/// contains several rows for the same party, the last one wins.
pub fn aggregate(rows: &[ElectionRow], year: i32, granularity: &Granularity) -> TallyMap {
    let year_s = year.to_string();
    let mut tallies = TallyMap::new();
    let mut skipped_modes: usize = 0;
    for row in rows.iter() {
        if row.year != year_s {
            continue;
        }
        if !granularity.accepts_mode(row.mode.as_deref()) {
            skipped_modes += 1;
            continue;
        }
        let key = match normalize_key(&row.region_key, granularity.level) {
            Some(k) => k,
            None => continue,
        };
        let tally = tallies.entry(key).or_insert(RegionTally {
            dem_votes: 0,
            rep_votes: 0,
            total_votes: row.total_votes,
        });
        match row.party {
            Party::Democrat => tally.dem_votes = row.candidate_votes,
            Party::Republican => tally.rep_votes = row.candidate_votes,
            Party::Other => {}
        }
    }
    debug!(
        "aggregate: year {}: {} regions, {} rows outside of the reporting modes",
        year,
        tallies.len(),
        skipped_modes
    );
    tallies
}

/// The normalized partisan margin of a region, positive when the Democratic
/// candidate leads.
///
/// `None` when there is no tally or no vote was counted. The value is not
/// clamped.
pub fn margin(tally: Option<&RegionTally>) -> Option<f64> {
    match tally {
        Some(t) if t.total_votes > 0 => {
            Some((t.dem_votes as f64 - t.rep_votes as f64) / t.total_votes as f64)
        }
        _ => None,
    }
}

// ********* Region resolution *********

/// The key under which the tally of a feature is stored.
///
/// Counties are identified by their numeric FIPS code, states by their name.
pub fn feature_key(feature: &RegionFeature, level: RegionLevel) -> Option<String> {
    match level {
        RegionLevel::County => match &feature.id {
            Some(FeatureId::Number(n)) => Some(format!("{:0width$}", n, width = FIPS_WIDTH)),
            Some(FeatureId::Text(s)) => normalize_county_key(s),
            None => None,
        },
        RegionLevel::State => feature.name.as_deref().and_then(normalize_state_key),
    }
}

/// Finds the tally of a feature. There is no fallback: a feature whose key is
/// not in the tallies has no data.
pub fn resolve<'a>(
    feature: &RegionFeature,
    level: RegionLevel,
    tallies: &'a TallyMap,
) -> Option<&'a RegionTally> {
    feature_key(feature, level).and_then(|k| tallies.get(&k))
}

// ********* Render model *********

/// The hover text of a region.
pub fn tooltip_text(name: &str, tally: Option<&RegionTally>) -> String {
    match tally {
        Some(t) if margin(Some(t)).is_some() => {
            let total = t.total_votes as f64;
            let dem_pct = round_tenth((t.dem_votes as f64 / total) * 100.0);
            let rep_pct = round_tenth((t.rep_votes as f64 / total) * 100.0);
            format!("{}: {:.1}% Dem, {:.1}% Rep", name, dem_pct, rep_pct)
        }
        _ => format!("{}: No data", name),
    }
}

// Ties are rounded up: 0.25 gives 0.3.
fn round_tenth(pct: f64) -> f64 {
    (pct * 10.0).round() / 10.0
}

/// Computes the color and the tooltip of every feature.
pub fn render_map(
    tallies: &TallyMap,
    features: &[RegionFeature],
    level: RegionLevel,
    year: i32,
) -> RenderModel {
    let regions: Vec<RegionRender> = features
        .iter()
        .map(|feature| {
            let key = feature_key(feature, level);
            let tally = resolve(feature, level, tallies).cloned();
            let name = feature
                .name
                .clone()
                .or_else(|| key.clone())
                .unwrap_or_else(|| UNKNOWN_REGION.to_string());
            RegionRender {
                color: color_for(margin(tally.as_ref())),
                tooltip: tooltip_text(&name, tally.as_ref()),
                key,
                name,
                tally,
            }
        })
        .collect();
    log_summary(&regions, tallies, year);
    RenderModel {
        year,
        level,
        regions,
    }
}

// Lookup misses are expected in both directions. They are only reported.
fn log_summary(regions: &[RegionRender], tallies: &TallyMap, year: i32) {
    let with_data = regions.iter().filter(|r| r.tally.is_some()).count();
    let matched: HashSet<&str> = regions.iter().filter_map(|r| r.key.as_deref()).collect();
    let unmatched: Vec<&String> = tallies
        .keys()
        .filter(|k| !matched.contains(k.as_str()))
        .collect();
    info!(
        "render_map: year {}: {} regions, {} with data, {} without data",
        year,
        regions.len(),
        with_data,
        regions.len() - with_data
    );
    if !unmatched.is_empty() {
        info!(
            "render_map: year {}: {} tallies do not match any region",
            year,
            unmatched.len()
        );
        debug!("render_map: unmatched tallies: {:?}", unmatched);
    }
}

/// Runs the whole pipeline for one year selection.
///
/// Arguments:
/// * `rows` the parsed election records
/// * `year` the selected year, which must be part of the granularity
/// * `granularity` the level of the map and its filters
/// * `features` the regions provided by the topology document
pub fn run_pipeline(
    rows: &[ElectionRow],
    year: i32,
    granularity: &Granularity,
    features: &[RegionFeature],
) -> Result<RenderModel, MapError> {
    info!(
        "Processing {:?} rows for year {} at {} level, {} regions",
        rows.len(),
        year,
        granularity.level.as_str(),
        features.len()
    );
    granularity.check_year(year)?;
    let tallies = aggregate(rows, year, granularity);
    Ok(render_map(&tallies, features, granularity.level, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, key: &str, party: Party, votes: u64, total: u64, mode: &str) -> ElectionRow {
        ElectionRow {
            year: year.to_string(),
            region_key: key.to_string(),
            party,
            candidate: String::new(),
            candidate_votes: votes,
            total_votes: total,
            mode: if mode.is_empty() {
                None
            } else {
                Some(mode.to_string())
            },
        }
    }

    fn county(id: u64, name: &str) -> RegionFeature {
        RegionFeature {
            id: Some(FeatureId::Number(id)),
            name: Some(name.to_string()),
        }
    }

    fn state(name: &str) -> RegionFeature {
        RegionFeature {
            id: None,
            name: Some(name.to_string()),
        }
    }

    fn los_angeles_rows() -> Vec<ElectionRow> {
        vec![
            row(2020, "6037", Party::Democrat, 3028885, 4030779, "TOTAL"),
            row(2020, "6037", Party::Republican, 916066, 4030779, "TOTAL"),
        ]
    }

    #[test]
    fn key_normalization() {
        assert_eq!(normalize_county_key("6037"), Some("06037".to_string()));
        assert_eq!(normalize_county_key("06037"), Some("06037".to_string()));
        assert_eq!(normalize_county_key("6037.0"), Some("06037".to_string()));
        assert_eq!(normalize_county_key(" 1001 "), Some("01001".to_string()));
        assert_eq!(normalize_county_key(""), None);
        assert_eq!(normalize_state_key("california"), Some("CALIFORNIA".to_string()));
        assert_eq!(normalize_state_key("District of Columbia"), Some("DISTRICT OF COLUMBIA".to_string()));
        assert_eq!(normalize_state_key("  "), None);
    }

    #[test]
    fn feature_keys() {
        assert_eq!(feature_key(&county(6037, "Los Angeles"), RegionLevel::County), Some("06037".to_string()));
        let text_id = RegionFeature {
            id: Some(FeatureId::Text("06037".to_string())),
            name: None,
        };
        assert_eq!(feature_key(&text_id, RegionLevel::County), Some("06037".to_string()));
        assert_eq!(feature_key(&state("california"), RegionLevel::State), Some("CALIFORNIA".to_string()));
        // A state is never looked up by its numeric id.
        let state_with_id = RegionFeature {
            id: Some(FeatureId::Text("06".to_string())),
            name: None,
        };
        assert_eq!(feature_key(&state_with_id, RegionLevel::State), None);
    }

    #[test]
    fn resolver_has_no_fallback() {
        let rows = los_angeles_rows();
        let tallies = aggregate(&rows, 2020, &Granularity::counties());
        assert!(resolve(&county(6037, "Los Angeles"), RegionLevel::County, &tallies).is_some());
        // Same name, different code: no match.
        assert!(resolve(&county(6038, "Los Angeles"), RegionLevel::County, &tallies).is_none());
        // Oglala Lakota county changed its code from 46113 to 46102 in 2015.
        let renamed = vec![row(2020, "46113", Party::Democrat, 2, 3, "TOTAL")];
        let t = aggregate(&renamed, 2020, &Granularity::counties());
        assert!(resolve(&county(46102, "Oglala Lakota"), RegionLevel::County, &t).is_none());
    }

    #[test]
    fn los_angeles_end_to_end() {
        let _ = env_logger::try_init();
        let rows = los_angeles_rows();
        let tallies = aggregate(&rows, 2020, &Granularity::counties());
        let expected = RegionTally {
            dem_votes: 3028885,
            rep_votes: 916066,
            total_votes: 4030779,
        };
        assert_eq!(tallies.get("06037"), Some(&expected));
        assert_eq!(tallies.len(), 1);

        let m = margin(tallies.get("06037")).unwrap();
        assert!((m - (3028885.0 - 916066.0) / 4030779.0).abs() < 1e-12);
        assert!((m - 0.5236).abs() < 1e-3);

        let model = run_pipeline(&rows, 2020, &Granularity::counties(), &[county(6037, "Los Angeles")]).unwrap();
        assert_eq!(model.regions.len(), 1);
        let la = &model.regions[0];
        assert_eq!(la.tooltip, "Los Angeles: 75.1% Dem, 22.7% Rep");
        assert_eq!(la.color, color_for(Some(m)));
        assert_eq!(la.key.as_deref(), Some("06037"));
        assert!(la.color.b > la.color.r);
    }

    #[test]
    fn provisional_rows_are_ignored() {
        let mut rows = los_angeles_rows();
        rows.push(row(2020, "6037", Party::Democrat, 12, 4030779, "PROVISIONAL"));
        rows.push(row(2020, "6037", Party::Republican, 7, 99, "ABSENTEE"));
        let tallies = aggregate(&rows, 2020, &Granularity::counties());
        assert_eq!(tallies.get("06037").unwrap().dem_votes, 3028885);
        assert_eq!(tallies.get("06037").unwrap().rep_votes, 916066);

        // A region only reported in other modes has no tally.
        let rows = vec![row(2020, "6037", Party::Democrat, 12, 40, "PROVISIONAL")];
        assert!(aggregate(&rows, 2020, &Granularity::counties()).is_empty());
    }

    #[test]
    fn election_day_rows_are_kept() {
        let rows = vec![
            row(2020, "45001", Party::Democrat, 10, 30, "ELECTION DAY"),
            row(2020, "45001", Party::Republican, 15, 30, "ELECTION DAY"),
        ];
        let t = aggregate(&rows, 2020, &Granularity::counties());
        assert_eq!(
            t.get("45001"),
            Some(&RegionTally {
                dem_votes: 10,
                rep_votes: 15,
                total_votes: 30
            })
        );
    }

    #[test]
    fn aggregation_overwrites_and_keeps_first_total() {
        let rows = vec![
            row(2016, "Texas", Party::Democrat, 100, 1000, ""),
            row(2016, "TEXAS", Party::Democrat, 200, 2000, ""),
            row(2016, "texas", Party::Other, 50, 3000, ""),
            row(2016, "Texas", Party::Republican, 300, 4000, ""),
            row(2012, "Texas", Party::Republican, 999, 9999, ""),
        ];
        let t = aggregate(&rows, 2016, &Granularity::states());
        assert_eq!(
            t.get("TEXAS"),
            Some(&RegionTally {
                dem_votes: 200,
                rep_votes: 300,
                total_votes: 1000
            })
        );
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let mut rows = los_angeles_rows();
        rows.push(row(2020, "1001", Party::Republican, 19838, 27770, "TOTAL"));
        rows.push(row(2016, "1001", Party::Republican, 18172, 24973, "TOTAL"));
        let g = Granularity::counties();
        let first = aggregate(&rows, 2020, &g);
        let _other_year = aggregate(&rows, 2016, &g);
        let second = aggregate(&rows, 2020, &g);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn margin_values() {
        let t = RegionTally {
            dem_votes: 30,
            rep_votes: 60,
            total_votes: 100,
        };
        assert_eq!(margin(Some(&t)), Some(-0.3));
        assert_eq!(margin(None), None);
        let empty = RegionTally {
            dem_votes: 5,
            rep_votes: 1,
            total_votes: 0,
        };
        assert_eq!(margin(Some(&empty)), None);
        // Inconsistent data is not clamped here.
        let bad = RegionTally {
            dem_votes: 300,
            rep_votes: 0,
            total_votes: 100,
        };
        assert_eq!(margin(Some(&bad)), Some(3.0));
        assert_eq!(color_for(margin(Some(&bad))), DEMOCRAT_COLOR);
    }

    #[test]
    fn missing_region_renders_no_data() {
        let rows = los_angeles_rows();
        let features = vec![county(6037, "Los Angeles"), county(6059, "Orange")];
        let model = run_pipeline(&rows, 2020, &Granularity::counties(), &features).unwrap();
        let orange = &model.regions[1];
        assert_eq!(orange.color, NO_DATA_COLOR);
        assert_eq!(orange.tooltip, "Orange: No data");
        assert_eq!(orange.tally, None);
    }

    #[test]
    fn zero_total_renders_no_data() {
        let rows = vec![row(2020, "Ohio", Party::Democrat, 0, 0, "")];
        let model = run_pipeline(&rows, 2020, &Granularity::states(), &[state("Ohio")]).unwrap();
        assert_eq!(model.regions[0].color, NO_DATA_COLOR);
        assert_eq!(model.regions[0].tooltip, "Ohio: No data");
    }

    #[test]
    fn state_map_matches_names() {
        let rows = vec![
            row(1976, "ALABAMA", Party::Democrat, 659170, 1182850, ""),
            row(1976, "ALABAMA", Party::Republican, 504070, 1182850, ""),
        ];
        let model = run_pipeline(&rows, 1976, &Granularity::states(), &[state("Alabama"), state("Alaska")]).unwrap();
        assert_eq!(model.regions[0].tooltip, "Alabama: 55.7% Dem, 42.6% Rep");
        assert_eq!(model.regions[1].tooltip, "Alaska: No data");
        assert_eq!(model.level, RegionLevel::State);
    }

    #[test]
    fn feature_without_name_uses_key() {
        let rows = los_angeles_rows();
        let features = vec![
            RegionFeature {
                id: Some(FeatureId::Number(6037)),
                name: None,
            },
            RegionFeature { id: None, name: None },
        ];
        let model = run_pipeline(&rows, 2020, &Granularity::counties(), &features).unwrap();
        assert_eq!(model.regions[0].name, "06037");
        assert_eq!(model.regions[1].tooltip, "Unknown: No data");
    }

    #[test]
    fn unsupported_year() {
        let rows = los_angeles_rows();
        let res = run_pipeline(&rows, 1996, &Granularity::counties(), &[]);
        assert_eq!(res, Err(MapError::UnsupportedYear { year: 1996 }));
        let res = run_pipeline(&rows, 2018, &Granularity::states(), &[]);
        assert_eq!(res, Err(MapError::UnsupportedYear { year: 2018 }));
    }

    #[test]
    fn year_text_must_match_exactly() {
        let mut rows = los_angeles_rows();
        for r in rows.iter_mut() {
            r.year = "2020.0".to_string();
        }
        rows.push(ElectionRow {
            year: "02020".to_string(),
            ..row(2020, "6059", Party::Democrat, 10, 20, "TOTAL")
        });
        assert!(aggregate(&rows, 2020, &Granularity::counties()).is_empty());
    }

    #[test]
    fn tooltip_rounds_ties_up() {
        let t = RegionTally {
            dem_votes: 1,
            rep_votes: 3,
            total_votes: 400,
        };
        assert_eq!(tooltip_text("X", Some(&t)), "X: 0.3% Dem, 0.8% Rep");
        let t = RegionTally {
            dem_votes: 1,
            rep_votes: 1,
            total_votes: 8,
        };
        assert_eq!(tooltip_text("X", Some(&t)), "X: 12.5% Dem, 12.5% Rep");
    }

    #[test]
    fn county_rows_without_mode_are_aggregated() {
        let rows = vec![
            row(2020, "6037", Party::Democrat, 3028885, 4030779, ""),
            row(2020, "6037", Party::Republican, 916066, 4030779, ""),
            row(2020, "6037", Party::Democrat, 12, 4030779, "PROVISIONAL"),
        ];
        let g = Granularity::counties();
        assert!(g.reporting_modes.is_some());
        let t = aggregate(&rows, 2020, &g);
        assert_eq!(
            t.get("06037"),
            Some(&RegionTally {
                dem_votes: 3028885,
                rep_votes: 916066,
                total_votes: 4030779
            })
        );
    }
}
