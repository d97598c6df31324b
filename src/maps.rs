use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use vote_map::*;

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::maps::config_reader::*;

pub mod config_reader;
pub mod io_common;
pub mod io_topology;

#[derive(Debug, Snafu)]
pub enum MapRunError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Could not read a year from the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Object {name} not found in the topology document (available: {available})"))]
    MissingTopologyObject { name: String, available: String },
    #[snafu(display("Unsupported document type {kind:?}: expected a Topology or a FeatureCollection"))]
    UnknownDocument { kind: String },
    #[snafu(display("Unknown map level {level:?}: expected state or county"))]
    UnknownLevel { level: String },
    #[snafu(display("Missing {what}: use the command line or the configuration file"))]
    MissingInput { what: String },
    #[snafu(display("{source}"))]
    Pipeline { source: MapError },
    #[snafu(display("Difference detected between the render model and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MapResult<T> = Result<T, MapRunError>;
pub type BMapResult<T> = Result<T, Box<MapRunError>>;

/// The documents a map is computed from. They are read once, and shared by all
/// the year selections.
pub struct MapData {
    pub rows: Vec<ElectionRow>,
    pub features: Vec<RegionFeature>,
}

fn region_to_json(region: &RegionRender) -> JSValue {
    let mut js: JSMap<String, JSValue> = JSMap::new();
    js.insert("id".to_string(), json!(region.key));
    js.insert("name".to_string(), json!(region.name));
    js.insert("color".to_string(), json!(region.color.to_string()));
    js.insert("tooltip".to_string(), json!(region.tooltip));
    // Vote counts are only given when they are meaningful.
    if let Some(t) = region.tally.filter(|t| margin(Some(t)).is_some()) {
        js.insert("dem".to_string(), json!(t.dem_votes));
        js.insert("rep".to_string(), json!(t.rep_votes));
        js.insert("total".to_string(), json!(t.total_votes));
    }
    JSValue::Object(js)
}

pub fn render_model_to_json(model: &RenderModel, map_name: Option<&str>) -> JSValue {
    let regions: Vec<JSValue> = model.regions.iter().map(region_to_json).collect();
    let mut js = json!({
        "year": model.year,
        "level": model.level.as_str(),
        "regions": regions,
    });
    if let Some(name) = map_name {
        js["mapName"] = json!(name);
    }
    js
}

pub fn read_reference(path: &str) -> BMapResult<JSValue> {
    let contents = io_common::read_text(path)?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

/// Reads the election records and the topology document.
pub fn load_data(settings: &MapSettings) -> BMapResult<MapData> {
    let level = settings.granularity.level;
    let text = io_common::read_text(&settings.input_path)?;
    let parsed = parse_rows(&text, level).context(PipelineSnafu {})?;
    let rows = if settings.merge_modes {
        merge_reporting_modes(&parsed, level)
    } else {
        parsed
    };
    let features = io_topology::read_topology(&settings.topology_path, &settings.topology_object)?;
    Ok(MapData { rows, features })
}

fn emit(settings: &MapSettings, model: &RenderModel) -> BMapResult<JSValue> {
    let js = render_model_to_json(model, settings.map_name.as_deref());
    let pretty_js = serde_json::to_string_pretty(&js).context(ParsingJsonSnafu { path: "render model" })?;
    io_common::write_output(settings.out.as_deref(), &pretty_js)?;
    Ok(js)
}

/// Computes the map for the selected year and writes it.
///
/// If a reference is given, the output is compared with it and any difference
/// is an error.
pub fn run_map(settings: &MapSettings) -> BMapResult<JSValue> {
    info!(
        "Map {:?}: {} level, year {}, records from {:?}",
        settings
            .map_name
            .clone()
            .unwrap_or_else(|| io_common::simplify_file_name(&settings.input_path)),
        settings.granularity.level.as_str(),
        settings.year,
        settings.input_path
    );
    // Fail early on a year that cannot be selected, before reading anything.
    settings.granularity.check_year(settings.year).context(PipelineSnafu {})?;
    let data = load_data(settings)?;
    let model = run_pipeline(&data.rows, settings.year, &settings.granularity, &data.features)
        .context(PipelineSnafu {})?;
    let js = emit(settings, &model)?;

    // The reference render model, if provided for comparison
    if let Some(reference_p) = &settings.reference {
        check_reference(&js, reference_p)?;
    }
    Ok(js)
}

fn check_reference(js: &JSValue, reference_p: &str) -> BMapResult<()> {
    let reference = read_reference(reference_p)?;
    let pretty_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu { path: reference_p })?;
    let pretty_js = serde_json::to_string_pretty(js).context(ParsingJsonSnafu { path: "render model" })?;
    if pretty_ref != pretty_js {
        warn!("Found differences with the reference {:?}", reference_p);
        print_diff(pretty_ref.as_str(), pretty_js.as_str(), "\n");
        return Err(Box::new(MapRunError::ReferenceMismatch {
            path: reference_p.to_string(),
        }));
    }
    info!("Render model matches the reference {:?}", reference_p);
    Ok(())
}

/// Reads year selections, one per line, and writes the map of each of them.
///
/// The maps are computed by one worker thread. When selections arrive faster
/// than they are computed, the worker skips to the latest pending one, and
/// results of superseded selections are dropped. The output of the last
/// selection is always written, and returned.
pub fn run_interactive<R: BufRead>(settings: &MapSettings, input: R) -> BMapResult<Option<JSValue>> {
    let data = Arc::new(load_data(settings)?);
    let selection = Arc::new(YearSelection::new(&settings.granularity));
    let (req_tx, req_rx) = mpsc::channel::<SelectionTicket>();
    let (res_tx, res_rx) = mpsc::channel::<(SelectionTicket, Result<RenderModel, MapError>)>();

    let worker = {
        let (data, selection, granularity) = (Arc::clone(&data), Arc::clone(&selection), settings.granularity.clone());
        thread::spawn(move || {
            while let Ok(mut ticket) = req_rx.recv() {
                while let Ok(t) = req_rx.try_recv() {
                    ticket = t;
                }
                if !selection.is_current(&ticket) {
                    debug!("run_interactive: skipping year {}", ticket.year);
                    continue;
                }
                let res = run_pipeline(&data.rows, ticket.year, &granularity, &data.features);
                if res_tx.send((ticket, res)).is_err() {
                    break;
                }
            }
        })
    };

    let mut last_applied: Option<JSValue> = None;
    for line_r in input.lines() {
        let line = line_r.context(OpeningFileSnafu { path: "stdin" })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let year = match line.parse::<i32>() {
            Ok(y) => y,
            Err(_) => {
                warn!("run_interactive: {:?} is not a year", line);
                continue;
            }
        };
        let ticket = match selection.select(year) {
            Ok(t) => t,
            Err(e) => {
                warn!("run_interactive: {}", e);
                continue;
            }
        };
        if req_tx.send(ticket).is_err() {
            break;
        }
        // Apply whatever is already done.
        while let Ok((ticket, res)) = res_rx.try_recv() {
            if let Some(js) = apply(settings, &selection, ticket, res)? {
                last_applied = Some(js);
            }
        }
    }
    drop(req_tx);
    for (ticket, res) in res_rx.iter() {
        if let Some(js) = apply(settings, &selection, ticket, res)? {
            last_applied = Some(js);
        }
    }
    if worker.join().is_err() {
        return Err(Box::new(MapRunError::Whatever {
            message: "the map worker stopped unexpectedly".to_string(),
            source: None,
        }));
    }
    Ok(last_applied)
}

fn apply(
    settings: &MapSettings,
    selection: &YearSelection,
    ticket: SelectionTicket,
    res: Result<RenderModel, MapError>,
) -> BMapResult<Option<JSValue>> {
    let model = match res {
        Ok(m) => m,
        Err(e) => {
            // The previous output is left in place.
            warn!("apply: year {}: {}", ticket.year, e);
            return Ok(None);
        }
    };
    match selection.accept(&ticket, model) {
        Some(m) => Ok(Some(emit(settings, &m)?)),
        None => Ok(None),
    }
}

pub fn run(args: &Args) -> BMapResult<()> {
    let settings = resolve_settings(args)?;
    debug!("run: settings: {:?}", settings);
    if args.interactive {
        let stdin = std::io::stdin();
        let res = run_interactive(&settings, stdin.lock())?;
        if res.is_none() {
            warn!("No year was selected");
        }
    } else {
        run_map(&settings)?;
    }
    Ok(())
}
