use crate::args::Args;
use crate::maps::io_common::resolve_path;
use crate::maps::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use vote_map::builder::Builder;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "mapName")]
    pub map_name: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DataSource {
    pub level: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "topologyPath")]
    pub topology_path: Option<String>,
    #[serde(rename = "topologyObject")]
    pub topology_object: Option<String>,
    #[serde(rename = "reportingModes")]
    pub reporting_modes: Option<Vec<String>>,
    #[serde(rename = "mergeReportingModes")]
    pub merge_reporting_modes: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct Selection {
    #[serde(rename = "year")]
    _year: Option<JSValue>,
    #[serde(rename = "firstYear")]
    _first_year: Option<JSValue>,
    #[serde(rename = "lastYear")]
    _last_year: Option<JSValue>,
}

impl Selection {
    pub fn year(&self) -> MapResult<Option<i32>> {
        read_opt_js_int(&self._year)
    }

    /// The custom range of years, if both ends are given.
    pub fn year_range(&self) -> MapResult<Option<(i32, i32)>> {
        match (
            read_opt_js_int(&self._first_year)?,
            read_opt_js_int(&self._last_year)?,
        ) {
            (Some(first), Some(last)) => Ok(Some((first, last))),
            (None, None) => Ok(None),
            _ => whatever!("selection: firstYear and lastYear must be provided together"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct MapConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSource", default)]
    pub data_source: DataSource,
    #[serde(default)]
    pub selection: Selection,
}

/// Everything needed to produce one map, after merging the command line and the
/// configuration file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MapSettings {
    pub map_name: Option<String>,
    pub granularity: Granularity,
    pub input_path: String,
    pub topology_path: String,
    pub topology_object: String,
    pub year: i32,
    pub merge_modes: bool,
    pub out: Option<String>,
    pub reference: Option<String>,
}

pub fn read_config(path: &str) -> BMapResult<MapConfig> {
    let contents = io_common::read_text(path)?;
    let config: MapConfig = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {
        path: path.to_string(),
    })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn parse_level(s: &str) -> MapResult<RegionLevel> {
    match s.trim().to_lowercase().as_str() {
        "state" | "states" => Ok(RegionLevel::State),
        "county" | "counties" => Ok(RegionLevel::County),
        _ => UnknownLevelSnafu {
            level: s.to_string(),
        }
        .fail(),
    }
}

/// Merges the command line arguments with the configuration file, if any.
/// Command line arguments take precedence.
pub fn resolve_settings(args: &Args) -> BMapResult<MapSettings> {
    let (config, root) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p)
                .parent()
                .map(|x| x.to_path_buf())
                .unwrap_or_default();
            (config, Some(root))
        }
        None => (MapConfig::default(), None),
    };
    let in_root = |p: &String| -> String {
        match &root {
            Some(r) => resolve_path(r, p),
            None => p.clone(),
        }
    };

    let level = match args.level.as_ref().or(config.data_source.level.as_ref()) {
        Some(l) => parse_level(l)?,
        None => RegionLevel::State,
    };

    let mut builder = Builder::from_granularity(&Granularity::for_level(level)).context(PipelineSnafu {})?;
    if let Some((first, last)) = config.selection.year_range()? {
        builder = builder.election_years(first, last).context(PipelineSnafu {})?;
    }
    if let Some(modes) = &config.data_source.reporting_modes {
        builder = builder.reporting_modes(modes).context(PipelineSnafu {})?;
    }
    let granularity = builder.build().context(PipelineSnafu {})?;

    let input_path = match &args.input {
        Some(p) => p.clone(),
        None => config
            .data_source
            .file_path
            .as_ref()
            .map(in_root)
            .context(MissingInputSnafu {
                what: "election records (--input)",
            })?,
    };
    let topology_path = match &args.topology {
        Some(p) => p.clone(),
        None => config
            .data_source
            .topology_path
            .as_ref()
            .map(in_root)
            .context(MissingInputSnafu {
                what: "topology document (--topology)",
            })?,
    };
    let topology_object = args
        .topology_object
        .clone()
        .or_else(|| config.data_source.topology_object.clone())
        .unwrap_or_else(|| level.topology_object().to_string());

    let year = match args.year {
        Some(y) => y,
        None => match config.selection.year()? {
            Some(y) => y,
            None => granularity
                .latest_year()
                .context(MissingInputSnafu { what: "year (--year)" })?,
        },
    };

    let out = args
        .out
        .clone()
        .or_else(|| config.output_settings.output_path.as_ref().map(in_root));

    Ok(MapSettings {
        map_name: config.output_settings.map_name.clone(),
        granularity,
        input_path,
        topology_path,
        topology_object,
        year,
        merge_modes: args.merge_modes || config.data_source.merge_reporting_modes.unwrap_or(false),
        out,
        reference: args.reference.clone(),
    })
}

fn read_opt_js_int(x: &Option<JSValue>) -> MapResult<Option<i32>> {
    match x {
        None | Some(JSValue::Null) => Ok(None),
        Some(v) => read_js_int(v).map(Some),
    }
}

fn read_js_int(x: &JSValue) -> MapResult<i32> {
    match x {
        JSValue::Number(n) => n
            .as_i64()
            .and_then(|x| i32::try_from(x).ok())
            .context(ParsingJsonNumberSnafu {}),
        JSValue::String(s) => s.trim().parse::<i32>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
