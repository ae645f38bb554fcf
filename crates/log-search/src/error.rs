//! 검색 엔진 에러 타입
//!
//! [`LogSearchError`]는 검색 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! 크게 두 부류로 나뉩니다.
//!
//! - 설정 에러: 알 수 없는 환경/클러스터/서버/로그 유형, 잘못된 태그.
//!   I/O 시작 전에 거부되며 재시도해도 결과가 같습니다.
//! - I/O 에러: 로컬 파일 열기/읽기 실패, 원격 명령 실패.
//!   기본 정책에서는 검색 전체를 중단시킵니다.
//!
//! 원격 존재 확인 실패(도달 불가 호스트)는 에러가 아니며 빈 스트림으로 처리됩니다.

use logscope_core::error::{ConfigError, LogscopeError, SearchError};

/// 검색 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogSearchError {
    /// 설정에 없는 환경
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    /// 환경에 없는 클러스터
    #[error("unknown cluster '{cluster}' in environment '{environment}'")]
    UnknownCluster {
        /// 환경 이름
        environment: String,
        /// 클러스터 이름
        cluster: String,
    },

    /// 환경(또는 요청한 클러스터)에 없는 서버
    #[error("unknown server '{server}' in environment '{environment}'")]
    UnknownServer {
        /// 환경 이름
        environment: String,
        /// 서버 이름
        server: String,
    },

    /// 설정에 없는 로그 유형
    #[error("unknown log type: {0}")]
    UnknownLogType(String),

    /// 요청 자체가 잘못됨 (빈 키워드 등)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// 태그 규칙 컴파일 실패
    #[error("invalid tag for log type '{log_type}': {reason}")]
    InvalidTag {
        /// 로그 유형 이름
        log_type: String,
        /// 실패 사유
        reason: String,
    },

    /// 엔진 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 로컬 로그 파일이 없음
    #[error("log file not found: {path}")]
    FileNotFound {
        /// 파일 경로
        path: String,
    },

    /// 로그 스트림 I/O 실패
    #[error("io error on {target}: {source}")]
    Io {
        /// 스트림 식별자 (host:path)
        target: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 원격 명령 실행 실패
    #[error("remote command failed on {host}: {reason}")]
    Remote {
        /// 원격 호스트
        host: String,
        /// 실패 사유
        reason: String,
    },

    /// 워커 태스크 실패 (panic, 취소)
    #[error("worker error: {0}")]
    Worker(String),
}

impl LogSearchError {
    /// I/O 이전에 거부되는 설정 계열 에러인지 확인합니다.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownEnvironment(_)
                | Self::UnknownCluster { .. }
                | Self::UnknownServer { .. }
                | Self::UnknownLogType(_)
                | Self::InvalidRequest(_)
                | Self::InvalidTag { .. }
                | Self::Config { .. }
        )
    }
}

impl From<SearchError> for LogSearchError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidRequest(reason) => Self::InvalidRequest(reason),
            SearchError::TargetFailed(reason) => Self::Worker(reason),
        }
    }
}

impl From<LogSearchError> for LogscopeError {
    fn from(err: LogSearchError) -> Self {
        match err {
            LogSearchError::Config { field, reason } => {
                LogscopeError::Config(ConfigError::InvalidValue { field, reason })
            }
            other if other.is_configuration() => {
                LogscopeError::Search(SearchError::InvalidRequest(other.to_string()))
            }
            other => LogscopeError::Search(SearchError::TargetFailed(other.to_string())),
        }
    }
}
