//! External tariff data fetch process
//!
//! The process is invoked as `<program> <args...> <command> <days>` and must
//! print one `<start> <end> <tariff>` line per window on stdout, exiting with
//! status 0. There is no timeout: a hanging process hangs the request.

use crate::config::FetcherConfig;
use crate::error::{HdoError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::tariff::{TariffRecord, parse_output};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Exit code reported when the process was terminated by a signal
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// Source of fresh tariff records for a (command, days) pair
#[async_trait]
pub trait TariffFetcher: Send + Sync {
    async fn fetch(&self, command: i64, days: i64) -> Result<Vec<TariffRecord>>;
}

/// Runs the configured executable and parses its stdout
pub struct ProcessFetcher {
    config: FetcherConfig,
    logger: StructuredLogger,
}

impl ProcessFetcher {
    pub fn new(config: FetcherConfig) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("fetcher").with_field("program", config.program.clone()),
        );
        Self { config, logger }
    }

    pub const fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn build_command(&self, command: i64, days: i64) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg(command.to_string())
            .arg(days.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl TariffFetcher for ProcessFetcher {
    async fn fetch(&self, command: i64, days: i64) -> Result<Vec<TariffRecord>> {
        let logger = self
            .logger
            .with_field("command", command.to_string())
            .with_field("days", days.to_string());
        logger.info("Invoking fetch process");

        let output = self
            .build_command(command, days)
            .output()
            .await
            .map_err(|e| {
                HdoError::io(format!(
                    "Failed to start fetch process '{}': {}",
                    self.config.program, e
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            logger.warn(&format!("Fetch process stderr: {}", stderr.trim_end()));
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(SIGNAL_EXIT_CODE);
            logger.error(&format!("Fetch process exited with code {code}"));
            return Err(HdoError::fetch(code));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed = parse_output(&stdout)?;
        for (line_no, line) in &parsed.skipped {
            logger.warn(&format!("Ignoring non-record output line {line_no}: {line}"));
        }
        logger.debug(&format!(
            "Fetch process returned {} records",
            parsed.records.len()
        ));
        Ok(parsed.records)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell_fetcher(script: &str) -> ProcessFetcher {
        ProcessFetcher::new(FetcherConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "fetch".to_string()],
            working_dir: None,
        })
    }

    #[tokio::test]
    async fn test_fetch_parses_stdout() {
        let fetcher = shell_fetcher(
            "echo \"2024-01-01T00:00:00+00:00 2024-01-01T01:00:00+00:00 cmd$1\"; \
             echo \"2024-01-01T01:00:00+00:00 2024-01-01T02:00:00+00:00 days$2\"",
        );
        let records = fetcher.fetch(568, 14).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tariff, "cmd568");
        assert_eq!(records[1].tariff, "days14");
    }

    #[tokio::test]
    async fn test_fetch_reports_exit_code() {
        let fetcher = shell_fetcher("echo partial output; exit 2");
        let err = fetcher.fetch(1, 3).await.unwrap_err();
        assert!(matches!(err, HdoError::Fetch { code: 2 }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_line() {
        let fetcher = shell_fetcher("echo only two");
        let err = fetcher.fetch(1, 3).await.unwrap_err();
        assert!(matches!(err, HdoError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn test_fetch_ignores_url_preamble() {
        let fetcher = shell_fetcher(
            "echo \"url = https://www.predistribuce.cz/cs/potrebuji-zaridit/zakaznici/stav-hdo/?povel=$1\"; \
             echo \"2024-04-03T00:00:00+02:00 2024-04-03T05:59:59+02:00 N\"",
        );
        let records = fetcher.fetch(568, 14).await.unwrap();
        assert_eq!(
            records,
            vec![TariffRecord::new(
                "2024-04-03T00:00:00+02:00",
                "2024-04-03T05:59:59+02:00",
                "N"
            )]
        );
    }

    #[tokio::test]
    async fn test_fetch_missing_program_is_io_error() {
        let fetcher = ProcessFetcher::new(FetcherConfig {
            program: "/nonexistent/hdo-fetch".to_string(),
            args: Vec::new(),
            working_dir: None,
        });
        let err = fetcher.fetch(1, 3).await.unwrap_err();
        assert!(matches!(err, HdoError::Io { .. }));
    }

    #[tokio::test]
    async fn test_fetch_uses_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("marker"),
            "2024-01-01T00:00:00Z 2024-01-01T01:00:00Z HERE\n",
        )
        .unwrap();
        let fetcher = ProcessFetcher::new(FetcherConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "cat marker".to_string(), "fetch".to_string()],
            working_dir: Some(dir.path().to_path_buf()),
        });
        let records = fetcher.fetch(1, 1).await.unwrap();
        assert_eq!(
            records,
            vec![TariffRecord::new(
                "2024-01-01T00:00:00Z",
                "2024-01-01T01:00:00Z",
                "HERE"
            )]
        );
    }
}
