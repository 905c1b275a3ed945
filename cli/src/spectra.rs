use std::path::Path;
use std::time::SystemTime;

use clap::Args;
use eyre::Result;
use heranow::spectrum::{jd_to_system_time, process_snapshot, Scale};
use heranow::{AntPol, RawAuto, Snapshot, TargetSize};
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;

use crate::io::Output;

#[derive(Args, Debug)]
pub struct Opts {
    /// Snapshot time as a Julian date [default: now]
    #[clap(long)]
    pub time_jd: Option<f64>,

    /// Points per downsampled spectrum: a count (e.g. 350) or a fraction (e.g. 1/5)
    #[clap(long, env = "HERANOW_TARGET", default_value_t = TargetSize::default())]
    pub target: TargetSize,

    /// Store spectra in dB (10 log10) instead of linear power
    #[clap(long, default_value_t = false)]
    pub db: bool,

    /// Value written for channels whose dB power is undefined (zero, negative or NaN)
    #[clap(long, default_value_t = f64::NAN, requires = "db")]
    pub mask_value: f64,

    /// Number of threads used to process channels
    #[clap(long, env = "HERANOW_WORKERS", default_value_t = num_cpus::get())]
    pub workers: usize,

    /// Output file [default: stdout]
    #[clap(long, default_value = "stdout")]
    pub output: String,

    /// Raw auto files named by antpol, e.g. 12e.bin (a sibling 12e.eq holds eq coefficients)
    #[clap(required = true)]
    pub files: Vec<String>,
}

pub async fn spectra(opts: &Opts) -> Result<()> {
    let time = match opts.time_jd {
        Some(jd) => jd_to_system_time(jd)?,
        None => SystemTime::now(),
    };

    let mut autos = Vec::with_capacity(opts.files.len());
    for file in &opts.files {
        let path = Path::new(file);
        let Some(antpol) = antpol_from_path(path) else {
            warn!("skipping {}: file name is not an antpol", file);
            continue;
        };
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| eyre::eyre!("reading {}: {}", file, e))?;

        let eq_path = path.with_extension("eq");
        let eq_coeffs = match tokio::fs::read_to_string(&eq_path).await {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => eyre::bail!("reading {}: {}", eq_path.display(), e),
        };
        debug!("{}: {} bytes from {}", antpol, data.len(), file);

        autos.push(RawAuto {
            antpol,
            data,
            eq_coeffs,
        });
    }

    let snapshot = Snapshot { time, autos };
    let target = opts.target;
    let scale = if opts.db {
        Scale::Decibel {
            sentinel: opts.mask_value,
        }
    } else {
        Scale::Linear
    };
    let workers = opts.workers.max(1);
    let records = tokio::task::spawn_blocking(move || -> Result<_> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
        Ok(pool.install(|| process_snapshot(&snapshot, target, scale))?)
    })
    .await??;
    info!("built {} autospectra", records.len());

    let mut output = Output::from_filename(&opts.output).await?;
    for record in &records {
        output.write_all(&serde_json::to_vec(record)?).await?;
        output.write_all(b"\n").await?;
    }
    output.flush().await?;
    Ok(())
}

fn antpol_from_path(path: &Path) -> Option<AntPol> {
    let stem = path.file_stem()?.to_str()?;
    stem.parse()
        .or_else(|_| AntPol::from_auto_key(stem))
        .ok()
}
