use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;

/// The plain-text log the tracing error layer appends to.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accumulated log text; a missing file reads as empty.
    pub async fn read(&self) -> std::io::Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err),
        }
    }

    /// Truncates the file in place. The writer holds it in append mode, so
    /// later lines start again from the beginning.
    pub async fn clear(&self) -> std::io::Result<()> {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&self.path)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::ErrorLog;

    #[tokio::test]
    async fn missing_log_reads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let log = ErrorLog::new(dir.path().join("error.log"));

        assert_eq!(log.read().await.expect("read"), "");
    }

    #[tokio::test]
    async fn clear_truncates_while_appender_keeps_writing() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("error.log");
        let mut appender = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .expect("open");
        writeln!(appender, "first failure").expect("write");

        let log = ErrorLog::new(&path);
        assert_eq!(log.read().await.expect("read"), "first failure\n");

        log.clear().await.expect("clear");
        assert_eq!(log.read().await.expect("read"), "");

        writeln!(appender, "second failure").expect("write");
        assert_eq!(log.read().await.expect("read"), "second failure\n");
    }
}
