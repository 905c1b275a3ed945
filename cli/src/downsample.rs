use clap::Args;
use eyre::Result;
use heranow::{Format, TargetSize};
use log::{debug, info};
use tokio::io::AsyncWriteExt;

use crate::io::{sources, Input, Output};

#[derive(Args, Debug)]
pub struct Opts {
    /// Points per output series: a count (e.g. 350) or a fraction of the input (e.g. 1/5)
    #[clap(long, env = "HERANOW_TARGET", default_value_t = TargetSize::default())]
    pub target: TargetSize,

    /// Output encoding (json, csv) [default: same as input]
    #[clap(long)]
    pub to: Option<String>,

    /// Output file [default: stdout]
    #[clap(long, default_value = "stdout")]
    pub output: String,

    /// Input files [default: stdin]
    pub files: Vec<String>,
}

pub async fn downsample(opts: &Opts) -> Result<()> {
    let to = opts.to.as_deref().map(Format::from_name).transpose()?;
    let mut output = Output::from_filename(&opts.output).await?;

    for source in sources(&opts.files) {
        let mut input = Input::from_filename(&source).await?;
        let Some(format) = input.detect_format().await? else {
            debug!("{}: empty input", source);
            continue;
        };

        let points = format.decode(&mut input).await?;
        let m = opts.target.resolve(points.len());
        let sampled = heranow::downsample(&points, m)
            .map_err(|e| eyre::eyre!("{}: {}", source, e))?;
        info!("{}: {} -> {} points", source, points.len(), sampled.len());

        to.unwrap_or(format).encode(&mut output, &sampled).await?;
    }

    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_csv(path: &Path, n: usize) {
        let body: String = (0..n).map(|i| format!("{},{}\n", i, (i * 37) % 11)).collect();
        std::fs::write(path, body).unwrap();
    }

    fn opts(target: TargetSize, to: Option<&str>, output: &Path, files: &[&Path]) -> Opts {
        Opts {
            target,
            to: to.map(str::to_string),
            output: output.display().to_string(),
            files: files.iter().map(|p| p.display().to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn csv_in_csv_out() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("series.csv");
        let output = dir.path().join("out.csv");
        write_csv(&input, 100);

        downsample(&opts(TargetSize::Fixed(10), None, &output, &[&input]))
            .await
            .unwrap();

        let out = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "0.0,0.0");
        assert_eq!(lines[9], "99.0,0.0");
    }

    #[tokio::test]
    async fn to_overrides_input_format() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("series.csv");
        let output = dir.path().join("out.json");
        write_csv(&input, 100);

        let target = "1/5".parse().unwrap();
        downsample(&opts(target, Some("json"), &output, &[&input]))
            .await
            .unwrap();

        let out = std::fs::read_to_string(&output).unwrap();
        assert!(out.starts_with("[[0.0,0.0],"));
        let mut reader = tokio::io::BufReader::new(out.as_bytes());
        let points = Format::Json.decode(&mut reader).await.unwrap();
        assert_eq!(points.len(), 20);
    }

    #[tokio::test]
    async fn empty_sources_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.csv");
        let blank = dir.path().join("blank.json");
        let json = dir.path().join("series.json");
        let output = dir.path().join("out.json");
        std::fs::write(&empty, "").unwrap();
        std::fs::write(&blank, "\n   \n").unwrap();
        let pairs: Vec<String> = (0..50).map(|i| format!("[{},{}]", i, i % 3)).collect();
        std::fs::write(&json, format!("\n\n  [{}]\n", pairs.join(",\n"))).unwrap();

        downsample(&opts(TargetSize::Fixed(5), None, &output, &[&empty, &blank, &json]))
            .await
            .unwrap();

        let out = std::fs::read_to_string(&output).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("[[0.0,0.0],"));
        assert!(out.trim_end().ends_with("[49.0,1.0]]"));
    }

    #[tokio::test]
    async fn invalid_target_names_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("series.csv");
        let output = dir.path().join("out.csv");
        write_csv(&input, 100);

        let err = downsample(&opts(TargetSize::Fixed(2), None, &output, &[&input]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("series.csv"));
        assert!(err.to_string().contains("at least 3"));
    }

    #[tokio::test]
    async fn unknown_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        assert!(downsample(&opts(TargetSize::default(), Some("xml"), &output, &[]))
            .await
            .is_err());
    }
}
