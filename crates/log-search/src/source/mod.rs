//! 라인 소스 -- 로컬 파일 또는 원격 명령 출력을 라인 단위로 읽습니다.
//!
//! # 동작
//! - 호스트가 로컬 호스트면 파일을 직접 엽니다. 파일이 없으면 에러입니다.
//! - 원격 호스트면 먼저 존재 확인을 하고, 실패하면 빈 스트림(건너뜀)을 반환합니다.
//! - 존재 확인에 성공하면 원격 `cat` 명령의 출력을 스트리밍합니다.
//!
//! 스트림은 앞으로만 진행하며 파일 전체를 메모리에 올리지 않습니다.

pub mod shell;

pub use shell::{RemoteShell, SshShell, cat_command, probe_command, shell_quote};

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tracing::debug;

use crate::error::LogSearchError;

/// 라인 스트림
///
/// [`next_line`](Self::next_line)은 줄 끝(`\n`, `\r\n`)을 제거한 한 줄을 반환하고,
/// 스트림 끝에서는 `None`을 반환합니다. UTF-8이 아닌 바이트는 대체 문자로 바뀝니다.
pub struct LineStream {
    label: String,
    reader: Option<Box<dyn AsyncBufRead + Send + Unpin>>,
    child: Option<(String, Child)>,
    skipped: bool,
    buf: Vec<u8>,
    lines_read: u64,
}

impl LineStream {
    /// 비동기 버퍼 리더로 스트림을 생성합니다.
    pub fn from_reader(
        label: impl Into<String>,
        reader: impl AsyncBufRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            reader: Some(Box::new(reader)),
            child: None,
            skipped: false,
            buf: Vec::new(),
            lines_read: 0,
        }
    }

    /// 건너뛴 대상의 빈 스트림을 생성합니다 (원격 존재 확인 실패).
    pub fn skipped(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reader: None,
            child: None,
            skipped: true,
            buf: Vec::new(),
            lines_read: 0,
        }
    }

    /// 스트림을 생성한 원격 프로세스를 연결합니다.
    ///
    /// 스트림 끝에서 프로세스 종료 상태를 확인합니다.
    pub fn with_child(mut self, host: impl Into<String>, child: Child) -> Self {
        self.child = Some((host.into(), child));
        self
    }

    /// 존재 확인 실패로 건너뛴 스트림인지 확인합니다.
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// 지금까지 읽은 라인 수
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// 다음 라인을 읽습니다.
    ///
    /// # Errors
    /// - 읽기 실패 시 [`LogSearchError::Io`]
    /// - 원격 명령이 실패 상태로 끝나면 [`LogSearchError::Remote`]
    pub async fn next_line(&mut self) -> Result<Option<String>, LogSearchError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        self.buf.clear();
        let read = reader
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(|source| LogSearchError::Io {
                target: self.label.clone(),
                source,
            })?;

        if read == 0 {
            self.reader = None;
            self.finish().await?;
            return Ok(None);
        }

        let mut end = self.buf.len();
        if end > 0 && self.buf[end - 1] == b'\n' {
            end -= 1;
            if end > 0 && self.buf[end - 1] == b'\r' {
                end -= 1;
            }
        }

        self.lines_read += 1;
        Ok(Some(String::from_utf8_lossy(&self.buf[..end]).into_owned()))
    }

    async fn finish(&mut self) -> Result<(), LogSearchError> {
        let Some((host, mut child)) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait().await.map_err(|source| LogSearchError::Io {
            target: self.label.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(LogSearchError::Remote {
                host,
                reason: format!("'{}' exited with {status}", self.label),
            })
        }
    }
}

impl std::fmt::Debug for LineStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineStream")
            .field("label", &self.label)
            .field("open", &self.reader.is_some())
            .field("skipped", &self.skipped)
            .field("lines_read", &self.lines_read)
            .finish()
    }
}

/// 라인 소스 -- 호스트에 따라 로컬 파일 또는 원격 셸로 스트림을 엽니다.
#[derive(Debug)]
pub struct LineSource<S> {
    local_host: String,
    shell: S,
}

impl<S: RemoteShell> LineSource<S> {
    /// 로컬 호스트 이름과 원격 셸로 라인 소스를 생성합니다.
    pub fn new(local_host: impl Into<String>, shell: S) -> Self {
        Self {
            local_host: local_host.into(),
            shell,
        }
    }

    /// 로컬 호스트 이름
    pub fn local_host(&self) -> &str {
        &self.local_host
    }

    /// 호스트가 로컬 호스트인지 확인합니다.
    pub fn is_local(&self, host: &str) -> bool {
        host == self.local_host || host == "localhost"
    }

    /// `(host, path)`의 라인 스트림을 엽니다.
    ///
    /// # Errors
    /// - 로컬 파일이 없으면 [`LogSearchError::FileNotFound`]
    /// - 로컬 파일을 열 수 없으면 [`LogSearchError::Io`]
    /// - 원격 명령을 시작할 수 없으면 [`LogSearchError::Remote`]
    pub async fn open(&self, host: &str, path: &Path) -> Result<LineStream, LogSearchError> {
        let label = format!("{host}:{}", path.display());

        if self.is_local(host) {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LogSearchError::FileNotFound {
                        path: path.display().to_string(),
                    }
                } else {
                    LogSearchError::Io {
                        target: label.clone(),
                        source: e,
                    }
                }
            })?;
            return Ok(LineStream::from_reader(label, BufReader::new(file)));
        }

        if !self.shell.probe(host, path).await {
            debug!(host, path = %path.display(), "remote log file unreachable, skipping");
            return Ok(LineStream::skipped(label));
        }

        self.shell.stream(host, &cat_command(path)).await
    }
}

/// 로컬 호스트 이름을 결정합니다.
///
/// 설정값 → `HOSTNAME` 환경변수 → `/proc/sys/kernel/hostname` → `/etc/hostname`
/// 순으로 찾고, 모두 실패하면 `localhost`를 사용합니다.
pub fn detect_local_host(configured: &str) -> String {
    let configured = configured.trim();
    if !configured.is_empty() {
        return configured.to_owned();
    }

    if let Ok(name) = std::env::var("HOSTNAME") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_owned();
        }
    }

    for path in ["/proc/sys/kernel/hostname", "/etc/hostname"] {
        if let Ok(content) = std::fs::read_to_string(path) {
            let name = content.trim();
            if !name.is_empty() {
                return name.to_owned();
            }
        }
    }

    "localhost".to_owned()
}
