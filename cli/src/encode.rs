use clap::Args;
use eyre::Result;
use heranow::Format;
use tokio::io::AsyncWriteExt;

use crate::io::{sources, Input, Output};

#[derive(Args, Debug)]
pub struct Opts {
    /// Output encoding (json, csv)
    #[clap(long, default_value = "json")]
    pub to: String,

    /// Output file [default: stdout]
    #[clap(long, default_value = "stdout")]
    pub output: String,

    /// Input files [default: stdin]
    pub files: Vec<String>,
}

pub async fn encode(opts: &Opts) -> Result<()> {
    let to = Format::from_name(&opts.to)?;
    let mut output = Output::from_filename(&opts.output).await?;

    for source in sources(&opts.files) {
        let mut input = Input::from_filename(&source).await?;
        let Some(format) = input.detect_format().await? else {
            continue;
        };
        let points = format.decode(&mut input).await?;
        to.encode(&mut output, &points).await?;
    }

    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn csv_to_json_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let csv_in = dir.path().join("in.csv");
        let json = dir.path().join("mid.json");
        let csv_out = dir.path().join("out.csv");
        std::fs::write(&csv_in, "0,1.5\n1,NaN\n2,-inf\n").unwrap();

        encode(&Opts {
            to: "json".into(),
            output: json.display().to_string(),
            files: vec![csv_in.display().to_string()],
        })
        .await
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&json).unwrap(),
            "[[0.0,1.5],[1.0,\"NaN\"],[2.0,\"-Infinity\"]]\n"
        );

        encode(&Opts {
            to: "csv".into(),
            output: csv_out.display().to_string(),
            files: vec![json.display().to_string()],
        })
        .await
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&csv_out).unwrap(),
            "0.0,1.5\n1.0,NaN\n2.0,-inf\n"
        );
    }

    #[tokio::test]
    async fn bad_json_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        std::fs::write(&input, "[[0,1]]\n[[2,3]]\n").unwrap();

        let result = encode(&Opts {
            to: "csv".into(),
            output: dir.path().join("out.csv").display().to_string(),
            files: vec![input.display().to_string()],
        })
        .await;
        assert!(result.is_err());
    }
}
