//! 검색 엔진 설정
//!
//! [`SearchConfig`]는 core의 [`SearchSettings`]를 기반으로 검색 실행에
//! 필요한 설정(병렬도, 실패 정책, 원격 셸)을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logscope_core::config::LogscopeConfig;
//! use logscope_search::config::SearchConfig;
//!
//! let core_config = LogscopeConfig::default();
//! let config = SearchConfig::from_core(&core_config.search);
//! ```

use logscope_core::config::{FailurePolicy, SearchSettings};
use serde::{Deserialize, Serialize};

use crate::error::LogSearchError;

/// 검색 엔진 설정
///
/// core의 `SearchSettings`에서 파생되며, 엔진 내부에서 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// 대상을 병렬로 처리할지 여부
    pub parallel: bool,
    /// 가용 병렬도 대비 사용 비율 (0, 1]
    pub utilization: f64,
    /// 대상 실패 처리 정책
    pub failure_policy: FailurePolicy,
    /// 로컬 호스트 이름 (비어 있으면 OS에서 감지)
    pub local_host: String,
    /// 원격 명령 실행 프로그램
    pub remote_shell: String,
    /// 원격 명령 실행 프로그램 추가 인자
    pub remote_shell_args: Vec<String>,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 가용 병렬도 고정값 (None이면 `available_parallelism` 사용)
    pub capacity: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::from_core(&SearchSettings::default())
    }
}

impl SearchConfig {
    /// core의 `SearchSettings`에서 엔진 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &SearchSettings) -> Self {
        Self {
            parallel: core.parallel,
            utilization: core.utilization,
            failure_policy: core.failure_policy,
            local_host: core.local_host.clone(),
            remote_shell: core.remote_shell.clone(),
            remote_shell_args: core.remote_shell_args.clone(),
            capacity: None,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogSearchError> {
        if !self.utilization.is_finite() || self.utilization <= 0.0 || self.utilization > 1.0 {
            return Err(LogSearchError::Config {
                field: "utilization".to_owned(),
                reason: "must be in (0, 1]".to_owned(),
            });
        }

        if self.capacity == Some(0) {
            return Err(LogSearchError::Config {
                field: "capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.remote_shell.trim().is_empty() {
            return Err(LogSearchError::Config {
                field: "remote_shell".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(())
    }

    /// 배치 크기 (동시에 실행할 최대 워커 수)를 계산합니다.
    ///
    /// `max(1, floor(capacity * utilization))`. 병렬 모드가 꺼져 있으면 항상 1입니다.
    pub fn batch_size(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        let capacity = self.capacity.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        let size = (capacity as f64 * self.utilization).floor() as usize;
        size.max(1)
    }
}

/// 검색 엔진 설정 빌더
#[derive(Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 병렬 실행 여부를 설정합니다.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// 병렬도 사용 비율을 설정합니다.
    pub fn utilization(mut self, utilization: f64) -> Self {
        self.config.utilization = utilization;
        self
    }

    /// 실패 처리 정책을 설정합니다.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// 로컬 호스트 이름을 설정합니다.
    pub fn local_host(mut self, host: impl Into<String>) -> Self {
        self.config.local_host = host.into();
        self
    }

    /// 원격 셸 프로그램을 설정합니다.
    pub fn remote_shell(mut self, program: impl Into<String>) -> Self {
        self.config.remote_shell = program.into();
        self
    }

    /// 원격 셸 추가 인자를 설정합니다.
    pub fn remote_shell_args(mut self, args: Vec<String>) -> Self {
        self.config.remote_shell_args = args;
        self
    }

    /// 가용 병렬도를 고정합니다.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = Some(capacity);
        self
    }

    /// 설정을 검증하고 `SearchConfig`를 생성합니다.
    pub fn build(self) -> Result<SearchConfig, LogSearchError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
