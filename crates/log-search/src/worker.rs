//! 대상 워커 -- 대상 하나에 대해 라인 소스 → 레코드 추출 → 키워드 필터를 실행합니다.
//!
//! 워커는 공유 상태를 변경하지 않습니다. 읽기 전용 [`ScanContext`]만 참조하고,
//! 결과는 대상 식별자와 함께 반환하여 분배기가 바로 맵에 넣을 수 있게 합니다.

use std::sync::Arc;

use logscope_core::metrics as m;
use logscope_core::types::{Record, Tally, Target};
use tracing::debug;

use crate::error::LogSearchError;
use crate::extract::RecordExtractor;
use crate::filter::KeywordFilter;
use crate::source::{LineSource, RemoteShell};

/// 대상 하나의 매칭 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMatches {
    /// 검색 대상
    pub target: Target,
    /// 키워드 집계
    pub tally: Tally,
    /// 발견 순서의 레코드 목록 (비어 있지 않음)
    pub records: Vec<Record>,
}

/// 검색 하나 동안 모든 워커가 공유하는 읽기 전용 문맥
#[derive(Debug)]
pub struct ScanContext<S> {
    source: Arc<LineSource<S>>,
    extractor: RecordExtractor,
    filter: KeywordFilter,
    log_type: String,
}

impl<S: RemoteShell> ScanContext<S> {
    /// 워커 문맥을 생성합니다.
    pub fn new(
        source: Arc<LineSource<S>>,
        extractor: RecordExtractor,
        filter: KeywordFilter,
        log_type: impl Into<String>,
    ) -> Self {
        Self {
            source,
            extractor,
            filter,
            log_type: log_type.into(),
        }
    }

    /// 대상 하나를 스캔합니다.
    ///
    /// 매칭된 레코드가 없으면 `Ok(None)`을 반환합니다.
    ///
    /// # Errors
    /// 스트림을 열거나 읽는 중 발생한 I/O 에러를 그대로 반환합니다.
    pub async fn scan(&self, target: &Target) -> Result<Option<TargetMatches>, LogSearchError> {
        let mut stream = self.source.open(&target.machine, &target.path).await?;
        if stream.is_skipped() {
            metrics::counter!(m::TARGETS_SKIPPED_TOTAL).increment(1);
            return Ok(None);
        }

        let mut assembler = self.extractor.assembler();
        let mut tally = self.filter.empty_tally();
        let mut records = Vec::new();

        while let Some(line) = stream.next_line().await? {
            if let Some(text) = assembler.push(&line) {
                self.keep(&text, &mut tally, &mut records);
            }
        }
        if let Some(text) = assembler.finish() {
            self.keep(&text, &mut tally, &mut records);
        }

        metrics::counter!(m::TARGETS_SCANNED_TOTAL).increment(1);
        metrics::counter!(m::LINES_READ_TOTAL, m::LABEL_LOG_TYPE => self.log_type.clone())
            .increment(stream.lines_read());
        metrics::counter!(m::RECORDS_MATCHED_TOTAL, m::LABEL_LOG_TYPE => self.log_type.clone())
            .increment(records.len() as u64);

        debug!(
            target_id = %target.id(),
            lines = stream.lines_read(),
            records = records.len(),
            "target scanned"
        );

        if records.is_empty() {
            return Ok(None);
        }

        Ok(Some(TargetMatches {
            target: target.clone(),
            tally,
            records,
        }))
    }

    /// 후보 텍스트가 조건을 만족하고 필드 분리에 성공하면 레코드로 보관합니다.
    fn keep(&self, text: &str, tally: &mut Tally, records: &mut Vec<Record>) {
        if !self.filter.matches(text) {
            return;
        }
        let Some(fields) = self.extractor.fields(text) else {
            return;
        };
        self.filter.count_into(text, tally);
        records.push(Record::new(fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Delimiters, TagRule};
    use crate::source::shell::MockShell;
    use logscope_core::types::Criteria;
    use std::path::PathBuf;

    fn target(machine: &str, server: &str) -> Target {
        Target {
            environment: "itg".to_owned(),
            machine: machine.to_owned(),
            cluster: "cluster1".to_owned(),
            server: server.to_owned(),
            path: PathBuf::from(format!("/logs/{server}.log")),
        }
    }

    fn context(
        shell: MockShell,
        rule: TagRule,
        fields: usize,
        keywords: &[&str],
        criteria: Criteria,
    ) -> ScanContext<MockShell> {
        ScanContext::new(
            Arc::new(LineSource::new("this-host", shell)),
            RecordExtractor::new(rule, fields),
            KeywordFilter::new(keywords, criteria),
            "test_log",
        )
    }

    #[tokio::test]
    async fn single_line_scan_filters_and_counts() {
        let shell = MockShell::new().with_file(
            "host-a",
            "/logs/s1.log",
            "10:00|ERROR|disk error\n10:01|INFO|ok\n10:02|ERROR\n10:03|WARN|timeout error\n",
        );
        let ctx = context(
            shell,
            TagRule::SingleChar('|'),
            3,
            &["error"],
            Criteria::Any,
        );

        let matches = ctx.scan(&target("host-a", "s1")).await.unwrap().unwrap();
        assert_eq!(matches.records.len(), 2);
        assert_eq!(matches.records[0].fields, vec!["10:00", "ERROR", "disk error"]);
        assert_eq!(matches.records[1].fields, vec!["10:03", "WARN", "timeout error"]);
        // 자격 미달 라인(10:02)은 카운트에 포함되지 않는다
        assert_eq!(matches.tally.get("error"), Some(3));
    }

    #[tokio::test]
    async fn multi_line_scan_counts_only_kept_records() {
        let shell = MockShell::new().with_file(
            "host-a",
            "/logs/s1.log",
            "<10:00> <Error\nstack line\n>\n<10:01> <error without pair\n",
        );
        let ctx = context(
            shell,
            TagRule::Delimited(Delimiters::new("<", ">").unwrap()),
            2,
            &["error"],
            Criteria::All,
        );

        let matches = ctx.scan(&target("host-a", "s1")).await.unwrap().unwrap();
        assert_eq!(matches.records.len(), 1);
        assert_eq!(matches.records[0].fields, vec!["10:00", "Error stack line "]);
        assert_eq!(matches.tally.get("error"), Some(1));
    }

    #[tokio::test]
    async fn no_matches_returns_none() {
        let shell = MockShell::new().with_file("host-a", "/logs/s1.log", "all quiet\n");
        let ctx = context(shell, TagRule::NoTag, 1, &["error"], Criteria::Any);
        assert!(ctx.scan(&target("host-a", "s1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreachable_target_returns_none() {
        let shell = MockShell::new().with_unreachable("host-a");
        let ctx = context(shell, TagRule::NoTag, 1, &["error"], Criteria::Any);
        assert!(ctx.scan(&target("host-a", "s1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stream_failure_is_error() {
        let shell = MockShell::new().with_failing("host-a");
        let ctx = context(shell, TagRule::NoTag, 1, &["error"], Criteria::Any);
        let err = ctx.scan(&target("host-a", "s1")).await.unwrap_err();
        assert!(matches!(err, LogSearchError::Remote { .. }));
    }
}
