use clap::Parser;

/// This program colors maps of US presidential election results.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the map. Paths in this file are relative to its
    /// location. See the manual for the format of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The election records, in CSV format. Setting this option overrides the path that
    /// may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path) The topology document (TopoJSON) providing the regions of the map.
    #[clap(short, long, value_parser)]
    pub topology: Option<String>,

    /// (state or county, default state) The granularity of the map.
    #[clap(short, long, value_parser)]
    pub level: Option<String>,

    /// (default: the most recent election) The election year to color.
    #[clap(short, long, value_parser)]
    pub year: Option<i32>,

    /// (default states or counties) The object of the topology document holding the regions.
    #[clap(long, value_parser)]
    pub topology_object: Option<String>,

    /// If passed as an argument, the rows split by reporting mode are merged into totals before
    /// being aggregated.
    #[clap(long, takes_value = false)]
    pub merge_modes: bool,

    /// (file path, 'stdout' or empty) If specified, the render model will be written in JSON format to
    /// the given location. Setting this option overrides the path that may be specified with the
    /// --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference render model in JSON format. If provided, votemap will check that the
    /// computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, election years are read from the standard input, one per line, and
    /// the output is replaced after each of them.
    #[clap(long, takes_value = false)]
    pub interactive: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
