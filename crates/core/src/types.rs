//! 도메인 타입 -- 검색 요청, 대상, 레코드, 집계 결과
//!
//! 검색 엔진과 출력 계층이 공유하는 데이터 구조를 정의합니다.
//! 모든 타입은 생성 후 불변으로 취급됩니다.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::SearchError;

/// 키워드 결합 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criteria {
    /// 모든 키워드가 포함되어야 함 (AND)
    #[default]
    All,
    /// 하나 이상의 키워드가 포함되어야 함 (OR)
    Any,
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl FromStr for Criteria {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            other => Err(SearchError::InvalidRequest(format!(
                "unknown search criteria '{other}' (expected: all, any)"
            ))),
        }
    }
}

/// 서버 선택자 -- 특정 서버 하나 또는 클러스터의 모든 서버
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServerSelector {
    /// 클러스터에 속한 모든 서버
    All,
    /// 이름으로 지정한 단일 서버
    Named(String),
}

impl ServerSelector {
    /// 문자열을 선택자로 변환합니다. `all`(대소문자 무시)은 [`ServerSelector::All`]입니다.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(trimmed.to_owned())
        }
    }
}

impl fmt::Display for ServerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for ServerSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 검색 요청
///
/// 생성 시 키워드를 정규화합니다 (공백 제거, 소문자 변환, 빈 키워드 제거).
/// 키워드 순서는 선언 순서 그대로 유지되며 집계 정렬 키의 순서가 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// 환경 이름 (예: itg, prd)
    pub environment: String,
    /// 클러스터 이름
    pub cluster: String,
    /// 서버 선택자
    pub server: ServerSelector,
    /// 로그 유형 이름
    pub log_type: String,
    /// 정규화된 키워드 목록 (선언 순서)
    pub keywords: Vec<String>,
    /// 키워드 결합 방식
    pub criteria: Criteria,
}

impl SearchRequest {
    /// 새 검색 요청을 생성합니다.
    ///
    /// 정규화 후 키워드가 하나도 남지 않으면 에러를 반환합니다.
    pub fn new<I, K>(
        environment: impl Into<String>,
        cluster: impl Into<String>,
        server: &str,
        log_type: impl Into<String>,
        keywords: I,
        criteria: Criteria,
    ) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return Err(SearchError::InvalidRequest(
                "at least one non-empty keyword is required".to_owned(),
            ));
        }

        Ok(Self {
            environment: environment.into().trim().to_owned(),
            cluster: cluster.into().trim().to_owned(),
            server: ServerSelector::parse(server),
            log_type: log_type.into().trim().to_owned(),
            keywords,
            criteria,
        })
    }

    /// 쉼표로 구분된 키워드 문자열을 분리합니다 (예: `"stderr,error"`).
    pub fn parse_keywords(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// 대상 식별자 -- (machine, cluster, server)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId {
    /// 머신(호스트) 이름
    pub machine: String,
    /// 클러스터 이름
    pub cluster: String,
    /// 서버 이름
    pub server: String,
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.machine, self.cluster, self.server)
    }
}

/// 검색 대상 -- 하나의 서버 로그 파일
///
/// 토폴로지 해석기가 요청을 전개할 때 생성하며, 정확히 하나의 워커가 소비합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// 환경 이름
    pub environment: String,
    /// 머신(호스트) 이름
    pub machine: String,
    /// 클러스터 이름
    pub cluster: String,
    /// 서버 이름
    pub server: String,
    /// 로그 파일 절대 경로
    pub path: PathBuf,
}

impl Target {
    /// 대상 식별자를 반환합니다.
    pub fn id(&self) -> TargetId {
        TargetId {
            machine: self.machine.clone(),
            cluster: self.cluster.clone(),
            server: self.server.clone(),
        }
    }

    /// 출력용 고정 컬럼 값 (environment, machine, cluster, server)
    pub fn fixed_columns(&self) -> [&str; 4] {
        [&self.environment, &self.machine, &self.cluster, &self.server]
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{} ({})",
            self.environment,
            self.machine,
            self.cluster,
            self.server,
            self.path.display()
        )
    }
}

/// 추출된 레코드 -- 필드 문자열의 순서 있는 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 필드 값 (로그 유형의 헤더 순서)
    pub fields: Vec<String>,
}

impl Record {
    /// 필드 목록으로 레코드를 생성합니다.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

/// 대상별 키워드 집계
///
/// 키워드 선언 순서대로 `(keyword, count)`를 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    counts: Vec<(String, u64)>,
}

impl Tally {
    /// 모든 키워드를 0으로 초기화한 집계를 생성합니다.
    pub fn new(keywords: &[String]) -> Self {
        Self {
            counts: keywords.iter().map(|k| (k.clone(), 0)).collect(),
        }
    }

    /// 인덱스 위치의 키워드 카운트를 증가시킵니다.
    pub fn add(&mut self, index: usize, amount: u64) {
        if let Some((_, count)) = self.counts.get_mut(index) {
            *count += amount;
        }
    }

    /// `(keyword, count)` 목록을 선언 순서로 반환합니다.
    pub fn entries(&self) -> &[(String, u64)] {
        &self.counts
    }

    /// 키워드의 카운트를 반환합니다.
    pub fn get(&self, keyword: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, c)| *c)
    }

    /// 카운트 벡터를 선언 순서로 반환합니다.
    pub fn count_vector(&self) -> impl Iterator<Item = u64> + '_ {
        self.counts.iter().map(|(_, c)| *c)
    }

    /// 전체 카운트 합계
    pub fn total(&self) -> u64 {
        self.count_vector().sum()
    }

    /// 카운트 벡터를 사전식으로 비교합니다 (첫 키워드부터, 합계로 축약하지 않음).
    pub fn cmp_counts(&self, other: &Self) -> Ordering {
        self.count_vector().cmp(other.count_vector())
    }
}

/// 실패한 대상 (partial 정책에서만 기록)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    /// 실패한 대상
    pub target: Target,
    /// 실패 사유
    pub reason: String,
}

/// 검색 결과
///
/// `tallies`와 `records`는 같은 대상 순서로 정렬되어 있으며,
/// 한 대상이 한쪽에 있으면 다른 쪽에도 반드시 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// 정렬된 (대상, 집계) 목록
    pub tallies: Vec<(Target, Tally)>,
    /// `tallies`와 같은 순서의 (대상, 레코드 목록)
    pub records: Vec<(Target, Vec<Record>)>,
    /// 실패한 대상 목록
    pub failures: Vec<TargetFailure>,
}

impl SearchResult {
    /// 매칭된 대상이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 매칭된 대상 수
    pub fn target_count(&self) -> usize {
        self.tallies.len()
    }

    /// 전체 레코드 수
    pub fn record_count(&self) -> usize {
        self.records.iter().map(|(_, r)| r.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn criteria_parses_case_insensitively() {
        assert_eq!("ALL".parse::<Criteria>().unwrap(), Criteria::All);
        assert_eq!(" any ".parse::<Criteria>().unwrap(), Criteria::Any);
        assert!("some".parse::<Criteria>().is_err());
    }

    #[test]
    fn server_selector_all_is_case_insensitive() {
        assert_eq!(ServerSelector::parse("All"), ServerSelector::All);
        assert_eq!(
            ServerSelector::parse("server1"),
            ServerSelector::Named("server1".to_owned())
        );
    }

    #[test]
    fn request_normalizes_keywords() {
        let req = SearchRequest::new(
            "itg",
            "cluster1",
            "all",
            "access_log",
            [" StdErr ", "", "ERROR"],
            Criteria::Any,
        )
        .unwrap();
        assert_eq!(req.keywords, vec!["stderr", "error"]);
        assert_eq!(req.server, ServerSelector::All);
    }

    #[test]
    fn request_rejects_empty_keywords() {
        let err = SearchRequest::new(
            "itg",
            "cluster1",
            "all",
            "access_log",
            [" ", ""],
            Criteria::All,
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::InvalidRequest(_)));
    }

    #[test]
    fn parse_keywords_splits_on_comma() {
        assert_eq!(
            SearchRequest::parse_keywords("stderr, error,,timeout"),
            vec!["stderr", "error", "timeout"]
        );
    }

    #[test]
    fn tally_compares_full_vector_not_sum() {
        let kws = keywords(&["error", "timeout"]);
        let mut a = Tally::new(&kws);
        a.add(0, 5);
        a.add(1, 100);
        let mut b = Tally::new(&kws);
        b.add(0, 6);
        b.add(1, 0);

        // a의 합계가 더 크지만 첫 키워드 카운트로 b가 앞선다
        assert!(a.total() > b.total());
        assert_eq!(b.cmp_counts(&a), Ordering::Greater);
    }

    #[test]
    fn tally_ties_fall_through_to_next_keyword() {
        let kws = keywords(&["error", "timeout"]);
        let mut a = Tally::new(&kws);
        a.add(0, 3);
        a.add(1, 1);
        let mut b = Tally::new(&kws);
        b.add(0, 3);
        b.add(1, 2);
        assert_eq!(a.cmp_counts(&b), Ordering::Less);
    }

    #[test]
    fn tally_get_and_add_out_of_range() {
        let mut tally = Tally::new(&keywords(&["error"]));
        tally.add(0, 2);
        tally.add(7, 99);
        assert_eq!(tally.get("error"), Some(2));
        assert_eq!(tally.get("missing"), None);
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn target_id_ignores_environment_and_path() {
        let a = Target {
            environment: "itg".to_owned(),
            machine: "host-a".to_owned(),
            cluster: "c1".to_owned(),
            server: "s1".to_owned(),
            path: PathBuf::from("/logs/a.log"),
        };
        let mut b = a.clone();
        b.environment = "prd".to_owned();
        b.path = PathBuf::from("/other/a.log");
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().to_string(), "host-a:c1:s1");
    }

    #[test]
    fn empty_result() {
        let result = SearchResult::default();
        assert!(result.is_empty());
        assert_eq!(result.record_count(), 0);
        assert_eq!(result.target_count(), 0);
    }
}
