//! 에러 타입 -- 도메인별 에러 정의

/// logscope 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogscopeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 검색 처리 에러
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 검색 처리 에러
///
/// 검색 엔진 크레이트의 상세 에러가 상위 레이어로 전파될 때 사용됩니다.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// 요청이 설정과 맞지 않음 (알 수 없는 환경, 클러스터, 서버, 로그 유형)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// 대상 로그를 읽는 중 I/O 실패
    #[error("target failed: {0}")]
    TargetFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "search.utilization".to_owned(),
            reason: "must be in (0, 1]".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("search.utilization"));
        assert!(msg.contains("(0, 1]"));
    }

    #[test]
    fn config_error_converts_to_top_level() {
        let err: LogscopeError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, LogscopeError::Config(_)));
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn search_error_converts_to_top_level() {
        let err: LogscopeError = SearchError::TargetFailed("host-a:/var/log/x".to_owned()).into();
        assert!(matches!(err, LogscopeError::Search(_)));
        assert!(err.to_string().contains("host-a"));
    }
}
