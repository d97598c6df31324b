pub use crate::config::*;

/// A builder for custom granularities.
///
/// The built-in granularities (`Granularity::states()` and
/// `Granularity::counties()`) cover the published datasets. The builder is
/// useful when a dataset covers a different range of years, or uses other
/// labels for its reporting modes.
///
/// ```
/// use vote_map::builder::Builder;
/// use vote_map::{MapError, RegionLevel};
///
/// let granularity = Builder::new(RegionLevel::County)?
///     .years(&[2016, 2020])?
///     .reporting_modes(&["TOTAL".to_string()])?
///     .build()?;
///
/// assert!(granularity.supports_year(2016));
/// assert!(!granularity.supports_year(2012));
///
/// # Ok::<(), MapError>(())
/// ```
pub struct Builder {
    pub(crate) _level: RegionLevel,
    pub(crate) _years: Vec<i32>,
    pub(crate) _reporting_modes: Option<Vec<String>>,
}

impl Builder {
    pub fn new(level: RegionLevel) -> Result<Builder, MapError> {
        Ok(Builder {
            _level: level,
            _years: Vec::new(),
            _reporting_modes: None,
        })
    }

    /// Starts from one of the built-in granularities.
    pub fn from_granularity(granularity: &Granularity) -> Result<Builder, MapError> {
        Ok(Builder {
            _level: granularity.level,
            _years: granularity.years.clone(),
            _reporting_modes: granularity.reporting_modes.clone(),
        })
    }

    /// Sets the selectable years. Duplicates are removed.
    pub fn years(self, years: &[i32]) -> Result<Builder, MapError> {
        let mut ys = years.to_vec();
        ys.sort_unstable();
        ys.dedup();
        Ok(Builder {
            _years: ys,
            ..self
        })
    }

    /// Sets the years from a range, one election every four years.
    pub fn election_years(self, first: i32, last: i32) -> Result<Builder, MapError> {
        if first > last {
            return Err(MapError::EmptyGranularity);
        }
        let ys: Vec<i32> = (first..=last).step_by(4).collect();
        self.years(&ys)
    }

    /// Restricts the aggregation to the rows in the given reporting modes.
    ///
    /// An empty list removes the filter.
    pub fn reporting_modes(self, modes: &[String]) -> Result<Builder, MapError> {
        let filter = if modes.is_empty() {
            None
        } else {
            Some(modes.iter().map(|m| m.trim().to_string()).collect())
        };
        Ok(Builder {
            _reporting_modes: filter,
            ..self
        })
    }

    pub fn build(self) -> Result<Granularity, MapError> {
        if self._years.is_empty() {
            return Err(MapError::EmptyGranularity);
        }
        Ok(Granularity {
            level: self._level,
            years: self._years,
            reporting_modes: self._reporting_modes,
        })
    }
}
