// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// The party a row of election results is reported for.
///
/// Only the two major parties are colored. Every other party label
/// (independents, write-ins, third parties) is collapsed into `Other`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Party {
    Democrat,
    Republican,
    Other,
}

impl Party {
    /// Reads a party label as found in the `party` or `party_simplified` columns.
    pub fn from_label(label: &str) -> Party {
        let l = label.trim();
        if l.eq_ignore_ascii_case("DEMOCRAT") {
            Party::Democrat
        } else if l.eq_ignore_ascii_case("REPUBLICAN") {
            Party::Republican
        } else {
            Party::Other
        }
    }
}

/// One row of the election records document, after parsing.
///
/// The region key is kept as written in the source. It is only normalized
/// when rows are aggregated, since the normalization depends on the
/// granularity of the map.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionRow {
    /// The year as written in the source, trimmed. Rows are selected by exact
    /// match with the decimal form of the year: `2020.0` is not `2020`.
    pub year: String,
    pub region_key: String,
    pub party: Party,
    /// The candidate name, empty when the document does not carry one.
    pub candidate: String,
    pub candidate_votes: u64,
    pub total_votes: u64,
    /// The reporting mode (county documents only).
    pub mode: Option<String>,
}

// ******** Output data structures *********

/// Vote counts for one region in one election year.
///
/// `dem_votes + rep_votes <= total_votes` holds for well-formed source data
/// but is not checked: votes for other parties only show up in the total.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct RegionTally {
    pub dem_votes: u64,
    pub rep_votes: u64,
    pub total_votes: u64,
}

/// All the tallies for one year, keyed by normalized region key.
pub type TallyMap = BTreeMap<String, RegionTally>;

/// An 8-bit sRGB color.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The identifier of a geometry feature, as found in the topology document.
///
/// Depending on the release of the topology document, county identifiers are
/// either JSON numbers (`6037`) or zero-padded strings (`"06037"`).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum FeatureId {
    Number(u64),
    Text(String),
}

/// A region of the map, as exposed by the geometry provider.
///
/// The boundaries themselves are not needed by the pipeline: only the
/// identifier and the display name are kept.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RegionFeature {
    pub id: Option<FeatureId>,
    pub name: Option<String>,
}

/// Everything the renderer needs to draw one region.
#[derive(PartialEq, Debug, Clone)]
pub struct RegionRender {
    /// The normalized key used for the lookup, if the feature has one.
    pub key: Option<String>,
    pub name: String,
    pub color: Color,
    pub tooltip: String,
    pub tally: Option<RegionTally>,
}

/// The output of the pipeline for one year selection, in feature order.
#[derive(PartialEq, Debug, Clone)]
pub struct RenderModel {
    pub year: i32,
    pub level: RegionLevel,
    pub regions: Vec<RegionRender>,
}

/// Errors that prevent the pipeline from producing a render model.
///
/// Defects in individual rows are never reported here: they are recovered
/// while parsing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MapError {
    /// The year is not part of the years covered by the granularity.
    UnsupportedYear { year: i32 },
    /// A required column is not present in the header of the document.
    MissingColumn(String),
    /// The document could not be decoded at all.
    Csv(String),
    /// A granularity was built without any year.
    EmptyGranularity,
}

impl Error for MapError {}

impl Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::UnsupportedYear { year } => {
                write!(f, "year {} is not available for this map", year)
            }
            MapError::MissingColumn(name) => {
                write!(f, "missing column {:?} in the election records", name)
            }
            MapError::Csv(msg) => write!(f, "could not read the election records: {}", msg),
            MapError::EmptyGranularity => write!(f, "no election year was provided"),
        }
    }
}

// ********* Configuration **********

/// The geographic granularity of a map.
///
/// The level decides how region keys are normalized and which columns of the
/// election records document are read.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RegionLevel {
    /// Regions are states, matched by uppercased name.
    State,
    /// Regions are counties, matched by 5-digit FIPS code.
    County,
}

impl RegionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionLevel::State => "state",
            RegionLevel::County => "county",
        }
    }

    /// The column holding the region key in the election records.
    pub fn region_column(&self) -> &'static str {
        match self {
            RegionLevel::State => "state",
            RegionLevel::County => "county_fips",
        }
    }

    /// The name of the object holding the regions in the topology document.
    pub fn topology_object(&self) -> &'static str {
        match self {
            RegionLevel::State => "states",
            RegionLevel::County => "counties",
        }
    }
}

/// The reporting modes that carry complete counts in the county dataset.
pub const COUNTY_REPORTING_MODES: [&str; 2] = ["TOTAL", "ELECTION DAY"];

/// The parameters of one instance of the pipeline.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Granularity {
    pub level: RegionLevel,
    /// The election years that can be selected, in increasing order.
    pub years: Vec<i32>,
    /// If set, only the rows in one of these reporting modes are aggregated.
    pub reporting_modes: Option<Vec<String>>,
}

impl Granularity {
    /// State level results, 1976 to 2020.
    pub fn states() -> Granularity {
        Granularity {
            level: RegionLevel::State,
            years: (1976..=2020).step_by(4).collect(),
            reporting_modes: None,
        }
    }

    /// County level results, 2000 to 2020.
    pub fn counties() -> Granularity {
        Granularity {
            level: RegionLevel::County,
            years: (2000..=2020).step_by(4).collect(),
            reporting_modes: Some(
                COUNTY_REPORTING_MODES
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
        }
    }

    pub fn for_level(level: RegionLevel) -> Granularity {
        match level {
            RegionLevel::State => Granularity::states(),
            RegionLevel::County => Granularity::counties(),
        }
    }

    pub fn supports_year(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    /// The most recent year available, which is the default selection.
    pub fn latest_year(&self) -> Option<i32> {
        self.years.iter().max().cloned()
    }

    pub fn check_year(&self, year: i32) -> Result<(), MapError> {
        if self.supports_year(year) {
            Ok(())
        } else {
            Err(MapError::UnsupportedYear { year })
        }
    }

    /// Whether a row with the given reporting mode takes part in the aggregation.
    pub fn accepts_mode(&self, mode: Option<&str>) -> bool {
        match (&self.reporting_modes, mode) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(modes), Some(m)) => {
                let m = m.trim();
                modes.iter().any(|allowed| allowed.eq_ignore_ascii_case(m))
            }
        }
    }
}
