//! logscope 검색 엔진
//!
//! 여러 호스트에 흩어진 애플리케이션 로그를 읽어 구조화된 레코드를 추출하고,
//! 키워드 조건으로 걸러 집계한 뒤 결정적인 순서로 정렬된 결과를 반환합니다.
//!
//! # 모듈 구성
//!
//! - [`topology`]: 환경 → 머신 → 클러스터 → 서버 해석 및 검색 대상 전개
//! - [`source`]: 로컬 파일 / 원격 명령 출력의 라인 스트림
//! - [`extract`]: 태그 규칙 기반 단일/여러 줄 레코드 추출
//! - [`filter`]: 키워드 조건 평가 및 카운트
//! - [`worker`]: 대상 하나에 대한 스트림 → 추출 → 필터 실행
//! - [`distributor`]: 배치 단위 병렬 실행 (검색 진입점)
//! - [`aggregate`]: 대상별 결과 병합 및 정렬
//! - [`config`]: 검색 엔진 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! SearchRequest -> TopologyResolver -> [Target...] -> batches
//!                                                       |
//!                         (per target) LineSource -> RecordExtractor -> KeywordFilter
//!                                                       |
//!                                                  Aggregator -> SearchResult
//! ```

pub mod aggregate;
pub mod config;
pub mod distributor;
pub mod error;
pub mod extract;
pub mod filter;
pub mod source;
pub mod topology;
pub mod worker;

// --- 주요 타입 re-export ---

// 검색 진입점
pub use distributor::LogSearch;

// 설정
pub use config::{SearchConfig, SearchConfigBuilder};

// 에러
pub use error::LogSearchError;

// 구성 요소
pub use aggregate::Aggregator;
pub use extract::{Delimiters, RecordAssembler, RecordExtractor, TagRule};
pub use filter::KeywordFilter;
pub use source::{LineSource, LineStream, RemoteShell, SshShell};
pub use topology::{LookupKind, TargetOption, TopologyResolver};
pub use worker::{ScanContext, TargetMatches};
