use eyre::Result;
use heranow::Format;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader, BufWriter, ReadBuf};

/// Input file names, or stdin when none were given.
pub fn sources(files: &[String]) -> Vec<String> {
    if files.is_empty() {
        vec!["stdin".to_string()]
    } else {
        files.to_vec()
    }
}

#[derive(Debug)]
pub enum Input {
    Stdin(BufReader<tokio::io::Stdin>),
    File(BufReader<File>),
}

impl Input {
    pub async fn from_filename(name: &str) -> Result<Self> {
        match name {
            "stdin" | "-" => Ok(Input::Stdin(BufReader::new(tokio::io::stdin()))),
            _ => {
                let f = File::open(name)
                    .await
                    .map_err(|e| eyre::eyre!("opening {}: {}", name, e))?;
                Ok(Input::File(BufReader::new(f)))
            }
        }
    }

    /// Peek at buffered bytes to tell CSV from JSON. Returns None on empty input.
    pub async fn detect_format(&mut self) -> Result<Option<Format>> {
        loop {
            let buf = self.fill_buf().await?;
            if buf.is_empty() {
                return Ok(None);
            }
            if let Some(format) = Format::detect(buf) {
                return Ok(Some(format));
            }
            // Only whitespace so far.
            let len = buf.len();
            self.consume(len);
        }
    }
}

impl AsyncRead for Input {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Input::Stdin(reader) => Pin::new(reader).poll_read(cx, buf),
            Input::File(reader) => Pin::new(reader).poll_read(cx, buf),
        }
    }
}

impl AsyncBufRead for Input {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        match self.get_mut() {
            Input::Stdin(reader) => Pin::new(reader).poll_fill_buf(cx),
            Input::File(reader) => Pin::new(reader).poll_fill_buf(cx),
        }
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        match self.get_mut() {
            Input::Stdin(reader) => Pin::new(reader).consume(amt),
            Input::File(reader) => Pin::new(reader).consume(amt),
        }
    }
}

#[derive(Debug)]
pub enum Output {
    Stdout(BufWriter<tokio::io::Stdout>),
    File(BufWriter<File>),
}

impl Output {
    pub async fn from_filename(name: &str) -> Result<Self> {
        match name {
            "stdout" | "-" => Ok(Output::Stdout(BufWriter::new(tokio::io::stdout()))),
            _ => {
                let f = File::create(name)
                    .await
                    .map_err(|e| eyre::eyre!("creating {}: {}", name, e))?;
                Ok(Output::File(BufWriter::new(f)))
            }
        }
    }
}

impl AsyncWrite for Output {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        match self.get_mut() {
            Output::Stdout(writer) => Pin::new(writer).poll_write(cx, buf),
            Output::File(writer) => Pin::new(writer).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        match self.get_mut() {
            Output::Stdout(writer) => Pin::new(writer).poll_flush(cx),
            Output::File(writer) => Pin::new(writer).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        match self.get_mut() {
            Output::Stdout(writer) => Pin::new(writer).poll_shutdown(cx),
            Output::File(writer) => Pin::new(writer).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detect_skips_leading_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series");
        std::fs::write(&path, " \n\t\n[[1,2]]").unwrap();

        let mut input = Input::from_filename(&path.display().to_string()).await.unwrap();
        assert_eq!(input.detect_format().await.unwrap(), Some(Format::Json));
        let points = Format::Json.decode(&mut input).await.unwrap();
        assert_eq!(points, vec![(1.0, 2.0)]);
    }

    #[tokio::test]
    async fn detect_on_blank_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank");
        std::fs::write(&path, "\n\n").unwrap();

        let mut input = Input::from_filename(&path.display().to_string()).await.unwrap();
        assert_eq!(input.detect_format().await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = Input::from_filename("/nonexistent/heranow/input").await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/heranow/input"));
    }

    #[test]
    fn stdin_when_no_files() {
        assert_eq!(sources(&[]), vec!["stdin".to_string()]);
        assert_eq!(sources(&["a".to_string()]), vec!["a".to_string()]);
    }
}
