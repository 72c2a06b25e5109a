use clap::Parser;

/// Distributes the boxes pledged in a donation survey over the free census of each collection center.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON configuration describing the survey, the census workbook and the
    /// collection centers. See the manual of census_allocation for the format.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path, optional) The survey export. Overrides the path given in the configuration.
    #[clap(short, long, value_parser)]
    pub survey: Option<String>,

    /// (file path, optional) The census workbook. Overrides the path given in the configuration.
    /// The results are written back to it unless the configuration sets another results file.
    #[clap(long, value_parser)]
    pub census: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the distribution will be
    /// written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, the distribution is computed and reported but no workbook is saved.
    #[clap(long, takes_value = false)]
    pub dry_run: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
