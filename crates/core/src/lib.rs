//! logscope 공통 크레이트
//!
//! 검색 엔진(`logscope-search`)과 CLI(`logscope-cli`)가 공유하는
//! 도메인 타입, 설정, 에러, 메트릭 이름을 정의합니다.
//!
//! - [`config`]: `logscope.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`]: 최상위 에러 타입
//! - [`types`]: 검색 요청/결과 도메인 타입
//! - [`metrics`]: 메트릭 이름 상수 및 설명 등록

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogscopeError, SearchError};

// 설정
pub use config::{FailurePolicy, LogscopeConfig, TagConfig, TagSpec};

// 도메인 타입
pub use types::{
    Criteria, Record, SearchRequest, SearchResult, ServerSelector, Tally, Target, TargetFailure,
    TargetId,
};
