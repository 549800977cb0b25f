use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::Duration,
};

use app_config::Config;
use futures::StreamExt;
use tokio::{process::Command, sync::Semaphore, time::timeout};
use tracing::{debug, trace, warn};
use url::Url;

use super::{ByteStream, MediaExtractor, ProcessStream, StreamRequest};
use crate::{error::MediaError, info::ExtractorInfo};

/// Runs the `yt-dlp` binary
#[derive(Debug, Clone)]
pub struct YtDlp {
    path: PathBuf,
    user_agent: String,
    info_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl YtDlp {
    #[must_use]
    pub fn new<P, U>(path: P, user_agent: U, info_timeout: Duration, max_processes: usize) -> Self
    where
        P: Into<PathBuf>,
        U: Into<String>,
    {
        Self {
            path: path.into(),
            user_agent: user_agent.into(),
            info_timeout,
            permits: Arc::new(Semaphore::new(max_processes.max(1))),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let extractor = config.extractor();

        Self::new(
            config.dependency_paths.yt_dlp_path(),
            extractor.user_agent.clone(),
            extractor.info_timeout(),
            extractor.max_processes,
        )
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn info_command(&self, url: &Url, format: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.arg("-j")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .args(["--user-agent", &self.user_agent]);
        if let Some(format) = format {
            cmd.args(["-f", format]);
        }
        cmd.arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }

    fn stream_command(&self, request: &StreamRequest) -> Command {
        let mut cmd = Command::new(&self.path);
        if request.send_user_agent {
            cmd.args(["--user-agent", &self.user_agent]);
        }
        cmd.args(["-f", &request.format])
            .arg("--no-playlist")
            .arg("--no-part")
            .args(["--buffer-size", "1M"])
            .args(["-o", "-"])
            .arg(request.url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }

    async fn run_info(&self, url: &Url, format: Option<&str>) -> Result<ExtractorInfo, MediaError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MediaError::ExtractionFailed("Extractor is shutting down".to_string()))?;

        let mut cmd = self.info_command(url, format);
        debug!(?cmd, "Running yt-dlp for info");

        let output = cmd.output().await.map_err(|e| spawn_error(&self.path, &e))?;
        trace!(status = ?output.status, "yt-dlp info finished");

        if !output.status.success() {
            let reason = last_line(&output.stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));

            return Err(MediaError::ExtractionFailed(reason));
        }

        parse_info(&output.stdout)
    }
}

#[async_trait::async_trait]
impl MediaExtractor for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_info(
        &self,
        url: &Url,
        format: Option<&str>,
    ) -> Result<ExtractorInfo, MediaError> {
        // Dropping the inner future on expiry drops the child, which kills it
        timeout(self.info_timeout, self.run_info(url, format))
            .await
            .map_err(|_| {
                warn!(%url, timeout = ?self.info_timeout, "yt-dlp info timed out");
                MediaError::ExtractionTimeout(self.info_timeout)
            })?
    }

    async fn stream(&self, request: StreamRequest) -> Result<ByteStream, MediaError> {
        let permit = self
            .permits
            .clone()
            .try_acquire_owned()
            .map_err(|_| MediaError::Busy)?;

        let mut cmd = self.stream_command(&request);
        debug!(?cmd, "Spawning yt-dlp stream");

        let child = cmd.spawn().map_err(|e| spawn_error(&self.path, &e))?;
        let stream = ProcessStream::new(child, Some(permit))?.primed().await?;
        debug!(pid = ?stream.id(), url = %request.url, "Streaming yt-dlp output");

        Ok(stream.boxed())
    }
}

fn spawn_error(path: &Path, e: &io::Error) -> MediaError {
    if e.kind() == io::ErrorKind::NotFound {
        MediaError::ExtractionFailed(format!(
            "yt-dlp not found at {path:?}. Install it or point YT_DLP_PATH at it."
        ))
    } else {
        MediaError::ExtractionFailed(format!("Failed to run yt-dlp: {e}"))
    }
}

fn last_line(output: &[u8]) -> Option<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .last()
        .map(ToString::to_string)
}

fn parse_info(stdout: &[u8]) -> Result<ExtractorInfo, MediaError> {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|x| !x.is_empty())
        .ok_or_else(|| MediaError::ExtractionFailed("yt-dlp printed no metadata".to_string()))?;

    serde_json::from_str(line)
        .map_err(|e| MediaError::ExtractionFailed(format!("Invalid yt-dlp metadata: {e}")))
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use futures::TryStreamExt;

    use super::*;

    const UA: &str = "test-agent/1.0";

    fn fake_yt_dlp(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make script executable");
        path
    }

    fn yt_dlp(path: PathBuf, max_processes: usize) -> YtDlp {
        YtDlp::new(path, UA, Duration::from_secs(5), max_processes)
    }

    fn url() -> Url {
        Url::parse("https://www.example.com/watch?v=abc").expect("url")
    }

    async fn collect(stream: ByteStream) -> Vec<u8> {
        stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .expect("stream output")
    }

    #[test]
    fn parses_first_json_line() {
        let info = parse_info(b"\n{\"title\":\"Clip\",\"ext\":\"webm\"}\n").expect("info");

        assert_eq!(info.title.as_deref(), Some("Clip"));
        assert_eq!(info.ext.as_deref(), Some("webm"));
        assert!(matches!(
            parse_info(b"not json"),
            Err(MediaError::ExtractionFailed(_))
        ));
        assert!(matches!(
            parse_info(b"  \n"),
            Err(MediaError::ExtractionFailed(_))
        ));
    }

    #[tokio::test]
    async fn info_passes_metadata_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = fake_yt_dlp(dir.path(), r#"printf '{"title":"%s"}\n' "$*""#);

        let info = yt_dlp(path, 2)
            .fetch_info(&url(), Some("best"))
            .await
            .expect("info");

        assert_eq!(
            info.title.as_deref(),
            Some(
                "-j --no-playlist --no-warnings --user-agent test-agent/1.0 -f best \
                 https://www.example.com/watch?v=abc"
            )
        );
    }

    #[tokio::test]
    async fn info_failure_reports_last_error_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = fake_yt_dlp(
            dir.path(),
            "echo 'WARNING: meh' >&2; echo 'ERROR: Unsupported URL' >&2; exit 1",
        );

        let res = yt_dlp(path, 2).fetch_info(&url(), None).await;

        assert!(
            matches!(&res, Err(MediaError::ExtractionFailed(msg)) if msg == "ERROR: Unsupported URL"),
            "{res:?}"
        );
    }

    #[tokio::test]
    async fn info_times_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = fake_yt_dlp(dir.path(), "exec sleep 5");
        let yt_dlp = YtDlp::new(path, UA, Duration::from_millis(200), 1);

        let res = yt_dlp.fetch_info(&url(), None).await;

        assert!(matches!(res, Err(MediaError::ExtractionTimeout(_))), "{res:?}");
        // The permit went back with the killed process
        assert_eq!(yt_dlp.permits.available_permits(), 1);
    }

    #[tokio::test]
    async fn missing_binary_is_an_extraction_failure() {
        let res = yt_dlp(PathBuf::from("/nonexistent/yt-dlp"), 1)
            .fetch_info(&url(), None)
            .await;

        assert!(matches!(res, Err(MediaError::ExtractionFailed(_))));
    }

    #[tokio::test]
    async fn stream_passes_streaming_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = fake_yt_dlp(dir.path(), r#"printf '%s' "$*""#);

        let stream = yt_dlp(path, 2)
            .stream(StreamRequest::new(url(), "best").with_user_agent())
            .await
            .expect("stream");

        assert_eq!(
            String::from_utf8(collect(stream).await).expect("utf8"),
            "--user-agent test-agent/1.0 -f best --no-playlist --no-part --buffer-size 1M -o - \
             https://www.example.com/watch?v=abc"
        );
    }

    #[tokio::test]
    async fn stream_without_output_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = fake_yt_dlp(dir.path(), "echo 'ERROR: private video' >&2; exit 1");

        let res = yt_dlp(path, 2).stream(StreamRequest::new(url(), "best")).await;

        assert!(matches!(res, Err(MediaError::ExtractionFailed(_))));
    }

    #[tokio::test]
    async fn streams_are_limited_by_permits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = fake_yt_dlp(dir.path(), "printf x; exec sleep 5");
        let yt_dlp = yt_dlp(path, 1);

        let first = yt_dlp
            .stream(StreamRequest::new(url(), "best"))
            .await
            .expect("first stream");
        let second = yt_dlp.stream(StreamRequest::new(url(), "best")).await;
        assert!(matches!(second, Err(MediaError::Busy)));

        drop(first);
        assert_eq!(yt_dlp.permits.available_permits(), 1);
    }
}
