mod downsample;
mod encode;
mod io;
mod spectra;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "heranow",
    about = "Downsample HERA telemetry series for plotting with LTTB"
)]
struct Cli {
    /// The verbosity of the program. Increase by specifying multiple times (e.g. -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Downsample (x,y) series read from CSV or JSON
    Downsample(downsample::Opts),
    /// Decode raw autocorrelations and build autospectra records
    Spectra(spectra::Opts),
    /// Transcode series between encodings
    Encode(encode::Opts),
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    match cli.command {
        Command::Downsample(opts) => downsample::downsample(&opts).await,
        Command::Spectra(opts) => spectra::spectra(&opts).await,
        Command::Encode(opts) => encode::encode(&opts).await,
    }
}

fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.format_target(false);
    builder.filter_level(match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    });
    // RUST_LOG still wins when set.
    builder.parse_default_env();
    builder.init();
}
