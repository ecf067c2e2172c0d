//! Argument parsing for running from the command line

use clap::Parser;

use crate::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Output filename stem (files become <stem>_xx_<start>.raw and <stem>_yy_<start>.raw)
    #[clap(short, long)]
    pub filename: String,
    /// Recording time (seconds)
    #[clap(short = 't', long)]
    pub time: u64,
    /// Source name (passed to the filterbank header script)
    #[clap(short, long, default_value = "unknown")]
    pub source: String,
    /// FPGA accumulation length in spectra
    #[clap(short = 'l', long, default_value_t = 1024)]
    pub acc_len: u32,
    /// ADC clock rate (MHz)
    #[clap(short = 'a', long, default_value_t = 900.0)]
    pub sample_rate: f64,
    /// RF center frequency (MHz)
    #[clap(short = 'r', long, default_value_t = 3500.0)]
    pub rf_center: f64,
    /// IF center frequency (MHz)
    #[clap(short = 'i', long, default_value_t = 629.1452)]
    pub if_center: f64,
    /// Flip the band (undo a spectral inversion in the analog chain)
    #[clap(short = 'F', long)]
    pub flip: bool,
    /// Attach a filterbank header after capture via the external script
    #[clap(short = 'P', long)]
    pub filterbank: bool,
    /// Port to capture UDP data from
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    #[clap(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}

/// Match verbosity filter with tracing subscriber log levels
pub fn convert_filter(filter: log::LevelFilter) -> tracing_subscriber::filter::LevelFilter {
    match filter {
        log::LevelFilter::Off => tracing_subscriber::filter::LevelFilter::OFF,
        log::LevelFilter::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        log::LevelFilter::Warn => tracing_subscriber::filter::LevelFilter::WARN,
        log::LevelFilter::Info => tracing_subscriber::filter::LevelFilter::INFO,
        log::LevelFilter::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
        log::LevelFilter::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
    }
}
