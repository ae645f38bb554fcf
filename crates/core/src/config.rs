//! 설정 관리 -- logscope.toml 파싱 및 런타임 설정
//!
//! [`LogscopeConfig`]는 토폴로지, 로그 유형, 검색 동작, 출력 설정을 담는
//! 최상위 구조체입니다. 프로세스 시작 시 한 번 로드한 뒤 불변 객체로
//! 각 컴포넌트에 명시적으로 전달합니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGSCOPE_SEARCH_UTILIZATION=0.5` 형식)
//! 3. 설정 파일 (`logscope.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logscope_core::error::LogscopeError> {
//! use logscope_core::config::LogscopeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogscopeConfig::load("logscope.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogscopeConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogscopeError};

/// logscope 통합 설정
///
/// `logscope.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogscopeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 검색 동작 설정
    #[serde(default)]
    pub search: SearchSettings,
    /// 로그 파일 경로 설정
    #[serde(default)]
    pub log_files: LogFilesConfig,
    /// 출력 헤더 및 리포트 설정
    #[serde(default)]
    pub output: OutputConfig,
    /// 환경 목록 (설정 순서 유지)
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
    /// 머신 목록 (설정 순서 유지)
    #[serde(default)]
    pub machines: Vec<MachineConfig>,
    /// 로그 유형 목록
    #[serde(default)]
    pub log_types: Vec<LogTypeConfig>,
}

impl LogscopeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogscopeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogscopeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogscopeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogscopeError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogscopeError> {
        toml::from_str(toml_str).map_err(|e| {
            LogscopeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGSCOPE_{SECTION}_{FIELD}`
    /// 토폴로지와 로그 유형은 파일에서만 설정합니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGSCOPE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGSCOPE_GENERAL_LOG_FORMAT");

        // Search
        override_bool(&mut self.search.parallel, "LOGSCOPE_SEARCH_PARALLEL");
        override_f64(&mut self.search.utilization, "LOGSCOPE_SEARCH_UTILIZATION");
        override_policy(
            &mut self.search.failure_policy,
            "LOGSCOPE_SEARCH_FAILURE_POLICY",
        );
        override_string(&mut self.search.local_host, "LOGSCOPE_SEARCH_LOCAL_HOST");
        override_string(&mut self.search.remote_shell, "LOGSCOPE_SEARCH_REMOTE_SHELL");
        override_csv(
            &mut self.search.remote_shell_args,
            "LOGSCOPE_SEARCH_REMOTE_SHELL_ARGS",
        );

        // Log files / output
        override_string(
            &mut self.log_files.path_template,
            "LOGSCOPE_LOG_FILES_PATH_TEMPLATE",
        );
        override_string(&mut self.output.report_path, "LOGSCOPE_OUTPUT_REPORT_PATH");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogscopeError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        let utilization = self.search.utilization;
        if !utilization.is_finite() || utilization <= 0.0 || utilization > 1.0 {
            return Err(invalid("search.utilization", "must be in (0, 1]".to_owned()));
        }

        if self.search.remote_shell.trim().is_empty() {
            return Err(invalid(
                "search.remote_shell",
                "must not be empty".to_owned(),
            ));
        }

        if self.log_files.path_template.trim().is_empty() {
            return Err(invalid(
                "log_files.path_template",
                "must not be empty".to_owned(),
            ));
        }

        if self.output.fixed_headers.len() != 4 {
            return Err(invalid(
                "output.fixed_headers",
                "must name exactly 4 columns (environment, machine, cluster, server)".to_owned(),
            ));
        }

        if self.output.count_headers.len() != 2 {
            return Err(invalid(
                "output.count_headers",
                "must name exactly 2 columns (keyword, count)".to_owned(),
            ));
        }

        self.validate_topology()?;
        self.validate_log_types()?;

        Ok(())
    }

    fn validate_topology(&self) -> Result<(), LogscopeError> {
        let mut machine_names = HashSet::new();
        for machine in &self.machines {
            if machine.name.trim().is_empty() {
                return Err(invalid("machines.name", "must not be empty".to_owned()));
            }
            if !machine_names.insert(machine.name.as_str()) {
                return Err(invalid(
                    "machines.name",
                    format!("duplicate machine '{}'", machine.name),
                ));
            }

            let mut cluster_names = HashSet::new();
            for cluster in &machine.clusters {
                if !cluster_names.insert(cluster.name.as_str()) {
                    return Err(invalid(
                        "machines.clusters.name",
                        format!(
                            "duplicate cluster '{}' on machine '{}'",
                            cluster.name, machine.name
                        ),
                    ));
                }
                if cluster.servers.iter().any(|s| s.trim().is_empty()) {
                    return Err(invalid(
                        "machines.clusters.servers",
                        format!(
                            "empty server name in cluster '{}' on machine '{}'",
                            cluster.name, machine.name
                        ),
                    ));
                }
                let mut server_names = HashSet::new();
                if let Some(dup) = cluster
                    .servers
                    .iter()
                    .find(|s| !server_names.insert(s.as_str()))
                {
                    return Err(invalid(
                        "machines.clusters.servers",
                        format!(
                            "duplicate server '{dup}' in cluster '{}' on machine '{}'",
                            cluster.name, machine.name
                        ),
                    ));
                }
            }
        }

        let mut env_names = HashSet::new();
        for env in &self.environments {
            if env.name.trim().is_empty() {
                return Err(invalid("environments.name", "must not be empty".to_owned()));
            }
            if !env_names.insert(env.name.as_str()) {
                return Err(invalid(
                    "environments.name",
                    format!("duplicate environment '{}'", env.name),
                ));
            }
            if let Some(missing) = env
                .machines
                .iter()
                .find(|m| !machine_names.contains(m.as_str()))
            {
                return Err(invalid(
                    "environments.machines",
                    format!(
                        "environment '{}' references undefined machine '{missing}'",
                        env.name
                    ),
                ));
            }
            let mut listed = HashSet::new();
            if let Some(dup) = env.machines.iter().find(|m| !listed.insert(m.as_str())) {
                return Err(invalid(
                    "environments.machines",
                    format!("environment '{}' lists machine '{dup}' twice", env.name),
                ));
            }
        }

        Ok(())
    }

    fn validate_log_types(&self) -> Result<(), LogscopeError> {
        let mut names = HashSet::new();
        for log_type in &self.log_types {
            if !names.insert(log_type.name.as_str()) {
                return Err(invalid(
                    "log_types.name",
                    format!("duplicate log type '{}'", log_type.name),
                ));
            }
            if log_type.file_name.trim().is_empty() {
                return Err(invalid(
                    "log_types.file_name",
                    format!("log type '{}' has an empty file_name", log_type.name),
                ));
            }
            if log_type.headers.is_empty() {
                return Err(invalid(
                    "log_types.headers",
                    format!("log type '{}' declares no headers", log_type.name),
                ));
            }
            log_type.tag.resolve().map_err(|reason| {
                invalid(
                    "log_types.tag",
                    format!("log type '{}': {reason}", log_type.name),
                )
            })?;
        }
        Ok(())
    }

    /// 이름으로 환경을 찾습니다.
    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.iter().find(|e| e.name == name)
    }

    /// 이름으로 머신을 찾습니다.
    pub fn machine(&self, name: &str) -> Option<&MachineConfig> {
        self.machines.iter().find(|m| m.name == name)
    }

    /// 이름으로 로그 유형을 찾습니다.
    pub fn log_type(&self, name: &str) -> Option<&LogTypeConfig> {
        self.log_types.iter().find(|l| l.name == name)
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 대상 실패 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 첫 I/O 실패에서 전체 검색을 중단 (기본값)
    #[default]
    FailFast,
    /// 실패한 대상을 기록하고 나머지 결과를 반환
    Partial,
}

/// 검색 동작 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// 대상을 병렬로 처리할지 여부 (false면 한 번에 하나씩)
    pub parallel: bool,
    /// 가용 병렬도 대비 사용 비율 (0, 1]
    pub utilization: f64,
    /// 대상 실패 처리 정책
    pub failure_policy: FailurePolicy,
    /// 로컬 호스트 이름 (비어 있으면 OS에서 감지)
    pub local_host: String,
    /// 원격 명령 실행 프로그램
    pub remote_shell: String,
    /// 원격 명령 실행 프로그램에 전달할 추가 인자
    pub remote_shell_args: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            utilization: 0.75,
            failure_policy: FailurePolicy::FailFast,
            local_host: String::new(),
            remote_shell: "ssh".to_owned(),
            remote_shell_args: vec!["-o".to_owned(), "BatchMode=yes".to_owned()],
        }
    }
}

/// 로그 파일 경로 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFilesConfig {
    /// 로그 디렉토리 템플릿 (`$cluster`, `$server` 치환)
    pub path_template: String,
}

impl Default for LogFilesConfig {
    fn default() -> Self {
        Self {
            path_template: "/var/log/apps/$cluster/$server/".to_owned(),
        }
    }
}

/// 출력 헤더 및 리포트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 대상 고정 컬럼 헤더 (environment, machine, cluster, server)
    pub fixed_headers: Vec<String>,
    /// 키워드 집계 컬럼 헤더 (keyword, count)
    pub count_headers: Vec<String>,
    /// 텍스트 리포트 파일 경로
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fixed_headers: ["Environment", "Machine", "Cluster", "Server"]
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            count_headers: vec!["Keyword".to_owned(), "Count".to_owned()],
            report_path: "log_search_output.txt".to_owned(),
        }
    }
}

/// 환경 -- 순서 있는 머신 목록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// 환경 이름
    pub name: String,
    /// 머신 이름 목록 (설정 순서)
    #[serde(default)]
    pub machines: Vec<String>,
}

/// 머신 -- 순서 있는 클러스터 목록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// 머신(호스트) 이름
    pub name: String,
    /// 이 머신에 배치된 클러스터 목록
    #[serde(default)]
    pub clusters: Vec<ClusterConfig>,
}

impl MachineConfig {
    /// 이름으로 클러스터를 찾습니다.
    pub fn cluster(&self, name: &str) -> Option<&ClusterConfig> {
        self.clusters.iter().find(|c| c.name == name)
    }
}

/// (머신, 클러스터)에 속한 서버 목록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// 클러스터 이름
    pub name: String,
    /// 서버 이름 목록 (설정 순서)
    #[serde(default)]
    pub servers: Vec<String>,
}

/// 로그 유형 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogTypeConfig {
    /// 로그 유형 이름 (예: access_log)
    pub name: String,
    /// 파일 이름 템플릿 (`$server` 치환)
    pub file_name: String,
    /// 필드 헤더 목록. 헤더 수가 기대 필드 수가 됩니다.
    pub headers: Vec<String>,
    /// 레코드/필드 경계 태그
    #[serde(default)]
    pub tag: TagConfig,
}

/// 태그 설정 -- 명시적 테이블 또는 레거시 태그 문자열
///
/// ```toml
/// tag = { kind = "delimited", start = "[", end = "]" }
/// tag = "|"   # 레거시: 한 글자 → single_char
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagConfig {
    /// 레거시 태그 문자열 (길이와 형태로 종류 결정)
    Legacy(String),
    /// 명시적 태그 종류
    Explicit(TagSpec),
}

impl Default for TagConfig {
    fn default() -> Self {
        Self::Explicit(TagSpec::NoTag)
    }
}

impl TagConfig {
    /// 태그 설정을 명시적 [`TagSpec`]으로 해석합니다.
    ///
    /// 레거시 문자열 규칙:
    /// - 빈 문자열 → `none`
    /// - 한 글자 → `single_char`
    /// - 백슬래시로 시작 → `pattern` (문자열 전체가 정규식)
    /// - 두 글자 → `delimited` (첫 글자 start, 둘째 글자 end)
    pub fn resolve(&self) -> Result<TagSpec, String> {
        match self {
            Self::Explicit(spec) => {
                spec.check()?;
                Ok(spec.clone())
            }
            Self::Legacy(raw) => {
                let chars: Vec<char> = raw.chars().collect();
                match chars.as_slice() {
                    [] => Ok(TagSpec::NoTag),
                    [c] => Ok(TagSpec::SingleChar {
                        delimiter: c.to_string(),
                    }),
                    ['\\', ..] => Ok(TagSpec::Pattern {
                        pattern: raw.clone(),
                    }),
                    [start, end] => Ok(TagSpec::Delimited {
                        start: start.to_string(),
                        end: end.to_string(),
                    }),
                    _ => Err(format!(
                        "legacy tag '{raw}' must be empty, one character, two characters, or start with '\\'"
                    )),
                }
            }
        }
    }
}

/// 명시적 태그 종류
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TagSpec {
    /// 태그 없음 -- 한 줄 전체가 하나의 레코드
    #[serde(rename = "none")]
    NoTag,
    /// 한 글자 구분자
    SingleChar {
        /// 구분자 (정확히 한 글자)
        delimiter: String,
    },
    /// 정규식 구분자
    Pattern {
        /// 구분자 정규식
        pattern: String,
    },
    /// 여러 줄 레코드용 시작/종료 태그
    Delimited {
        /// 시작 태그
        start: String,
        /// 종료 태그
        end: String,
    },
}

impl TagSpec {
    fn check(&self) -> Result<(), String> {
        match self {
            Self::NoTag => Ok(()),
            Self::SingleChar { delimiter } if delimiter.chars().count() != 1 => Err(format!(
                "single_char delimiter '{delimiter}' must be exactly one character"
            )),
            Self::SingleChar { .. } => Ok(()),
            Self::Pattern { pattern } if pattern.is_empty() => {
                Err("pattern must not be empty".to_owned())
            }
            Self::Pattern { .. } => Ok(()),
            Self::Delimited { start, end } if start.is_empty() || end.is_empty() => {
                Err("delimited start and end tags must not be empty".to_owned())
            }
            Self::Delimited { .. } => Ok(()),
        }
    }
}

fn invalid(field: &str, reason: String) -> LogscopeError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_f64(target: &mut f64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<f64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse f64 from env var, ignoring"
            ),
        }
    }
}

fn override_policy(target: &mut FailurePolicy, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().to_lowercase().as_str() {
            "fail_fast" => *target = FailurePolicy::FailFast,
            "partial" => *target = FailurePolicy::Partial,
            _ => warn!(
                env_key,
                value = val.as_str(),
                "unknown failure policy in env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
