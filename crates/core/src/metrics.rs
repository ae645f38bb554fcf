//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 검색 엔진은 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다. 익스포터 설치는 호출자의 몫입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logscope_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

use metrics::{describe_counter, describe_histogram};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 로그 유형 레이블 키
pub const LABEL_LOG_TYPE: &str = "log_type";

/// 결과 레이블 키 (success, failure, empty)
pub const LABEL_RESULT: &str = "result";

// ─── 검색 메트릭 ────────────────────────────────────────────────────

/// 실행된 검색 수 (counter, label: result)
pub const SEARCHES_TOTAL: &str = "logscope_searches_total";

/// 스캔한 대상 수 (counter)
pub const TARGETS_SCANNED_TOTAL: &str = "logscope_targets_scanned_total";

/// 원격 존재 확인 실패로 건너뛴 대상 수 (counter)
pub const TARGETS_SKIPPED_TOTAL: &str = "logscope_targets_skipped_total";

/// 실패한 대상 수 (counter)
pub const TARGETS_FAILED_TOTAL: &str = "logscope_targets_failed_total";

/// 읽은 물리적 라인 수 (counter, label: log_type)
pub const LINES_READ_TOTAL: &str = "logscope_lines_read_total";

/// 키워드 조건을 만족해 보관된 레코드 수 (counter, label: log_type)
pub const RECORDS_MATCHED_TOTAL: &str = "logscope_records_matched_total";

/// 검색 전체 소요 시간 (histogram, 초)
pub const SEARCH_DURATION_SECONDS: &str = "logscope_search_duration_seconds";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 후 한 번 호출합니다. 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    describe_counter!(SEARCHES_TOTAL, "Total number of searches executed");
    describe_counter!(
        TARGETS_SCANNED_TOTAL,
        "Total number of server log targets scanned"
    );
    describe_counter!(
        TARGETS_SKIPPED_TOTAL,
        "Targets skipped because the remote log file could not be probed"
    );
    describe_counter!(
        TARGETS_FAILED_TOTAL,
        "Targets whose log stream failed with an I/O error"
    );
    describe_counter!(LINES_READ_TOTAL, "Total number of physical log lines read");
    describe_counter!(
        RECORDS_MATCHED_TOTAL,
        "Total number of records kept after keyword filtering"
    );
    describe_histogram!(
        SEARCH_DURATION_SECONDS,
        "Time to complete a single search in seconds"
    );
}
