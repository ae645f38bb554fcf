//! 원격 명령 실행 추상화
//!
//! [`RemoteShell`] trait은 원격 호스트에 대한 두 가지 기본 동작을 정의합니다.
//!
//! - `probe`: 원격 파일 존재 확인 (`test -e <path>`)
//! - `stream`: 원격 명령의 표준 출력을 라인 스트림으로 열기
//!
//! 운영 환경은 [`SshShell`]을, 테스트는 `MockShell`을 사용합니다.
//!
//! ```text
//!   ┌────────────┐
//!   │ LineSource │
//!   └─────┬──────┘
//!         ▼
//!   ┌─────────────┐
//!   │ RemoteShell │ (trait)
//!   └─────────────┘
//!      │       │
//!      ▼       ▼
//!   ┌─────┐ ┌──────┐
//!   │ Ssh │ │ Mock │
//!   └──┬──┘ └──────┘
//!      ▼
//!   ssh <host> cat <path>
//! ```

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tokio::io::BufReader;
use tokio::process::Command;
use tracing::debug;

use super::LineStream;
use crate::error::LogSearchError;

/// 원격 명령 실행 trait
///
/// 워커 태스크 간에 공유되므로 `Send + Sync + 'static`이어야 합니다.
pub trait RemoteShell: Send + Sync + 'static {
    /// 원격 호스트에 파일이 존재하는지 확인합니다.
    ///
    /// 호스트에 도달할 수 없는 경우도 `false`를 반환합니다.
    fn probe(&self, host: &str, path: &Path) -> impl Future<Output = bool> + Send;

    /// 원격 명령을 실행하고 표준 출력을 라인 스트림으로 반환합니다.
    ///
    /// # Errors
    ///
    /// 명령을 시작할 수 없으면 [`LogSearchError::Remote`]를 반환합니다.
    /// 명령이 0이 아닌 상태로 끝나면 스트림 끝에서 같은 에러가 발생합니다.
    fn stream(
        &self,
        host: &str,
        command: &str,
    ) -> impl Future<Output = Result<LineStream, LogSearchError>> + Send;
}

/// 외부 `ssh` 프로그램 기반 원격 셸
#[derive(Debug, Clone)]
pub struct SshShell {
    program: String,
    args: Vec<String>,
}

impl SshShell {
    /// 실행 프로그램과 추가 인자로 원격 셸을 생성합니다.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command(&self, host: &str, remote_command: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(host)
            .arg(remote_command)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for SshShell {
    fn default() -> Self {
        Self::new("ssh", vec!["-o".to_owned(), "BatchMode=yes".to_owned()])
    }
}

impl RemoteShell for SshShell {
    async fn probe(&self, host: &str, path: &Path) -> bool {
        let status = self
            .command(host, &probe_command(path))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(host, error = %e, "failed to run remote probe");
                false
            }
        }
    }

    async fn stream(&self, host: &str, command: &str) -> Result<LineStream, LogSearchError> {
        let mut child = self
            .command(host, command)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LogSearchError::Remote {
                host: host.to_owned(),
                reason: format!("failed to spawn {}: {e}", self.program),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| LogSearchError::Remote {
            host: host.to_owned(),
            reason: "remote command has no stdout".to_owned(),
        })?;

        Ok(LineStream::from_reader(format!("{host}:{command}"), BufReader::new(stdout))
            .with_child(host, child))
    }
}

/// 원격 파일 존재 확인 명령
pub fn probe_command(path: &Path) -> String {
    format!("test -e {}", shell_quote(&path.to_string_lossy()))
}

/// 원격 파일 내용을 출력하는 명령
pub fn cat_command(path: &Path) -> String {
    format!("cat {}", shell_quote(&path.to_string_lossy()))
}

/// POSIX 셸 인자로 안전하게 인용합니다.
///
/// 안전한 문자만 있으면 그대로, 아니면 작은따옴표로 감쌉니다.
pub fn shell_quote(raw: &str) -> String {
    let safe = !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c));
    if safe {
        raw.to_owned()
    } else {
        format!("'{}'", raw.replace('\'', r#"'"'"'"#))
    }
}

/// 테스트용 Mock 원격 셸
///
/// 호스트/경로별로 미리 지정한 내용을 반환하여 ssh 없이도 테스트할 수 있습니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockShell {
    /// (host, command) → 스트림 내용
    pub outputs: std::collections::HashMap<(String, String), String>,
    /// 도달 불가로 처리할 호스트
    pub unreachable: std::collections::HashSet<String>,
    /// stream 호출 시 실패를 시뮬레이션할 호스트
    pub failing: std::collections::HashSet<String>,
}

#[cfg(test)]
impl MockShell {
    /// 빈 mock 셸을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 원격 파일을 추가합니다.
    pub fn with_file(mut self, host: &str, path: impl AsRef<Path>, content: &str) -> Self {
        self.outputs.insert(
            (host.to_owned(), cat_command(path.as_ref())),
            content.to_owned(),
        );
        self
    }

    /// 호스트를 도달 불가로 설정합니다.
    pub fn with_unreachable(mut self, host: &str) -> Self {
        self.unreachable.insert(host.to_owned());
        self
    }

    /// 호스트의 stream 호출이 실패하도록 설정합니다.
    pub fn with_failing(mut self, host: &str) -> Self {
        self.failing.insert(host.to_owned());
        self
    }
}

#[cfg(test)]
impl RemoteShell for MockShell {
    async fn probe(&self, host: &str, path: &Path) -> bool {
        !self.unreachable.contains(host)
            && (self.failing.contains(host)
                || self
                    .outputs
                    .contains_key(&(host.to_owned(), cat_command(path))))
    }

    async fn stream(&self, host: &str, command: &str) -> Result<LineStream, LogSearchError> {
        if self.failing.contains(host) {
            return Err(LogSearchError::Remote {
                host: host.to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        let content = self
            .outputs
            .get(&(host.to_owned(), command.to_owned()))
            .cloned()
            .unwrap_or_default();
        Ok(LineStream::from_reader(
            format!("{host}:{command}"),
            std::io::Cursor::new(content.into_bytes()),
        ))
    }
}
