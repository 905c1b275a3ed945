use async_trait::async_trait;
use eyre::Result;
use tokio::io::{AsyncBufRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _};

use crate::float::{points_from_json, points_to_json};
use crate::lttb::Point;

// A Codec reads and writes one whole point series per stream.
#[async_trait]
pub trait Codec {
    async fn encode<W: AsyncWrite + Unpin + Send>(&self, writer: &mut W, points: &[Point]) -> Result<()>;
    async fn decode<R: AsyncBufRead + Unpin + Send>(&self, reader: &mut R) -> Result<Vec<Point>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    /// Guess the encoding from the first non-whitespace byte of a stream.
    pub fn detect(buf: &[u8]) -> Option<Format> {
        let first = buf.iter().find(|b| !b.is_ascii_whitespace())?;
        if *first == b'[' {
            Some(Format::Json)
        } else {
            Some(Format::Csv)
        }
    }

    pub fn from_name(name: &str) -> Result<Format> {
        match name {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            _ => eyre::bail!("unknown encoding: {}", name),
        }
    }

    pub async fn encode<W: AsyncWrite + Unpin + Send>(&self, writer: &mut W, points: &[Point]) -> Result<()> {
        match self {
            Format::Csv => CsvCodec.encode(writer, points).await,
            Format::Json => JsonCodec.encode(writer, points).await,
        }
    }

    pub async fn decode<R: AsyncBufRead + Unpin + Send>(&self, reader: &mut R) -> Result<Vec<Point>> {
        match self {
            Format::Csv => CsvCodec.decode(reader).await,
            Format::Json => JsonCodec.decode(reader).await,
        }
    }
}

pub struct JsonCodec;

#[async_trait]
impl Codec for JsonCodec {
    async fn encode<W: AsyncWrite + Unpin + Send>(&self, writer: &mut W, points: &[Point]) -> Result<()> {
        writer.write_all(&points_to_json(points)?).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    async fn decode<R: AsyncBufRead + Unpin + Send>(&self, reader: &mut R) -> Result<Vec<Point>> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        if buf.iter().all(|b| b.is_ascii_whitespace()) {
            eyre::bail!("empty input");
        }
        // One array per stream; anything after it is an error.
        points_from_json(&buf).map_err(|e| eyre::eyre!(e))
    }
}

pub struct CsvCodec;

#[async_trait]
impl Codec for CsvCodec {
    async fn encode<W: AsyncWrite + Unpin + Send>(&self, writer: &mut W, points: &[Point]) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::with_capacity(points.len() * 24));
        for point in points {
            wtr.serialize(point)?;
        }
        let buf = wtr.into_inner().map_err(|e| eyre::eyre!(e.to_string()))?;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn decode<R: AsyncBufRead + Unpin + Send>(&self, reader: &mut R) -> Result<Vec<Point>> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(buf.as_slice());

        let mut points = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() != 2 {
                eyre::bail!("row {}: expected 2 fields (x,y), got {}", i + 1, record.len());
            }
            let x: f64 = record[0]
                .parse()
                .map_err(|e| eyre::eyre!("row {}: bad x '{}': {}", i + 1, &record[0], e))?;
            let y: f64 = record[1]
                .parse()
                .map_err(|e| eyre::eyre!("row {}: bad y '{}': {}", i + 1, &record[1], e))?;
            points.push((x, y));
        }
        Ok(points)
    }
}
