//! 결과 집계 -- 대상별 결과를 하나의 정렬된 [`SearchResult`]로 병합합니다.
//!
//! 정렬 키는 키워드 선언 순서의 카운트 벡터 전체입니다. 첫 키워드 카운트를 먼저
//! 비교하고, 같으면 다음 키워드로 넘어가며 내림차순으로 정렬합니다. 합계로 축약하지
//! 않습니다. 벡터가 완전히 같은 대상끼리는 토폴로지 해석 순서를 유지합니다(안정 정렬).
//!
//! 배치 완료 순서와 무관하게 결과가 결정적입니다.

use std::collections::HashMap;

use logscope_core::types::{SearchResult, Target, TargetFailure, TargetId};

use crate::worker::TargetMatches;

/// 대상별 결과 수집기
///
/// 워커 결과를 대상 식별자 키의 맵에 직접 넣으므로 별도의 재매칭 단계가 없습니다.
#[derive(Debug, Default)]
pub struct Aggregator {
    matches: HashMap<TargetId, TargetMatches>,
    failures: HashMap<TargetId, TargetFailure>,
}

impl Aggregator {
    /// 빈 수집기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 매칭된 대상 결과를 추가합니다.
    pub fn insert(&mut self, matches: TargetMatches) {
        self.matches.insert(matches.target.id(), matches);
    }

    /// 실패한 대상을 기록합니다.
    pub fn record_failure(&mut self, target: Target, reason: impl Into<String>) {
        let id = target.id();
        self.failures.insert(
            id,
            TargetFailure {
                target,
                reason: reason.into(),
            },
        );
    }

    /// 지금까지 실패한 대상 수
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// 최종 결과를 만듭니다.
    ///
    /// `resolution_order`는 토폴로지 해석기가 만든 대상 순서이며, 동률 정렬과
    /// 실패 목록 순서의 기준이 됩니다.
    pub fn finish(mut self, resolution_order: &[Target]) -> SearchResult {
        let mut ordered: Vec<TargetMatches> = Vec::with_capacity(self.matches.len());
        let mut failures = Vec::with_capacity(self.failures.len());

        for target in resolution_order {
            let id = target.id();
            if let Some(matches) = self.matches.remove(&id) {
                ordered.push(matches);
            }
            if let Some(failure) = self.failures.remove(&id) {
                failures.push(failure);
            }
        }

        // 내림차순 안정 정렬
        ordered.sort_by(|a, b| b.tally.cmp_counts(&a.tally));

        let mut result = SearchResult {
            tallies: Vec::with_capacity(ordered.len()),
            records: Vec::with_capacity(ordered.len()),
            failures,
        };
        for TargetMatches {
            target,
            tally,
            records,
        } in ordered
        {
            result.tallies.push((target.clone(), tally));
            result.records.push((target, records));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_core::types::{Record, Tally};
    use std::path::PathBuf;

    fn target(server: &str) -> Target {
        Target {
            environment: "itg".to_owned(),
            machine: "host-a".to_owned(),
            cluster: "cluster1".to_owned(),
            server: server.to_owned(),
            path: PathBuf::from(format!("/logs/{server}.log")),
        }
    }

    fn matches(server: &str, counts: &[u64]) -> TargetMatches {
        let keywords: Vec<String> = (0..counts.len()).map(|i| format!("kw{i}")).collect();
        let mut tally = Tally::new(&keywords);
        for (i, c) in counts.iter().enumerate() {
            tally.add(i, *c);
        }
        TargetMatches {
            target: target(server),
            tally,
            records: vec![Record::new(vec![format!("{server}-record")])],
        }
    }

    fn servers(result: &SearchResult) -> Vec<&str> {
        result.tallies.iter().map(|(t, _)| t.server.as_str()).collect()
    }

    #[test]
    fn higher_first_keyword_count_comes_first() {
        let order = vec![target("serverA"), target("serverB")];
        let mut agg = Aggregator::new();
        agg.insert(matches("serverA", &[5]));
        agg.insert(matches("serverB", &[9]));

        let result = agg.finish(&order);
        assert_eq!(servers(&result), vec!["serverB", "serverA"]);
        assert_eq!(result.records[0].0.server, "serverB");
        assert_eq!(result.records[0].1[0].fields, vec!["serverB-record"]);
    }

    #[test]
    fn vector_order_beats_sum() {
        let order = vec![target("s1"), target("s2")];
        let mut agg = Aggregator::new();
        agg.insert(matches("s1", &[1, 100]));
        agg.insert(matches("s2", &[2, 0]));

        let result = agg.finish(&order);
        assert_eq!(servers(&result), vec!["s2", "s1"]);
    }

    #[test]
    fn ties_keep_resolution_order_regardless_of_insert_order() {
        let order = vec![target("s1"), target("s2"), target("s3")];
        let mut agg = Aggregator::new();
        agg.insert(matches("s3", &[4]));
        agg.insert(matches("s2", &[4]));
        agg.insert(matches("s1", &[4]));

        let result = agg.finish(&order);
        assert_eq!(servers(&result), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn tallies_and_records_stay_aligned() {
        let order = vec![target("s1"), target("s2"), target("s3")];
        let mut agg = Aggregator::new();
        agg.insert(matches("s1", &[1, 3]));
        agg.insert(matches("s2", &[1, 7]));
        agg.insert(matches("s3", &[0, 9]));

        let result = agg.finish(&order);
        assert_eq!(result.tallies.len(), result.records.len());
        for ((t1, _), (t2, _)) in result.tallies.iter().zip(&result.records) {
            assert_eq!(t1.id(), t2.id());
        }
        assert_eq!(servers(&result), vec!["s2", "s1", "s3"]);
    }

    #[test]
    fn failures_follow_resolution_order() {
        let order = vec![target("s1"), target("s2")];
        let mut agg = Aggregator::new();
        agg.record_failure(target("s2"), "broken pipe");
        agg.record_failure(target("s1"), "exit status 1");
        assert_eq!(agg.failed(), 2);

        let result = agg.finish(&order);
        assert!(result.is_empty());
        let failed: Vec<&str> = result
            .failures
            .iter()
            .map(|f| f.target.server.as_str())
            .collect();
        assert_eq!(failed, vec!["s1", "s2"]);
    }

    #[test]
    fn empty_aggregator_produces_empty_result() {
        let result = Aggregator::new().finish(&[target("s1")]);
        assert_eq!(result, SearchResult::default());
    }
}
