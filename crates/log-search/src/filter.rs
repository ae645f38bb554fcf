//! 키워드 필터 및 카운터
//!
//! 후보 텍스트(단일 라인 또는 재조립된 여러 줄 레코드)를 필드 분리 전에 검사합니다.
//! 비교는 대소문자를 무시한 부분 문자열 매칭이며, 카운트는 겹치지 않는 출현 횟수입니다.

use logscope_core::types::{Criteria, SearchRequest, Tally};

/// 키워드 조건
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
    criteria: Criteria,
}

impl KeywordFilter {
    /// 키워드 목록과 결합 방식으로 필터를 생성합니다. 키워드는 소문자로 정규화됩니다.
    pub fn new<I, K>(keywords: I, criteria: Criteria) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            criteria,
        }
    }

    /// 검색 요청의 키워드와 결합 방식으로 필터를 생성합니다.
    pub fn from_request(request: &SearchRequest) -> Self {
        Self::new(&request.keywords, request.criteria)
    }

    /// 선언 순서의 키워드 목록
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// 결합 방식
    pub fn criteria(&self) -> Criteria {
        self.criteria
    }

    /// 모든 키워드를 0으로 초기화한 집계를 만듭니다.
    pub fn empty_tally(&self) -> Tally {
        Tally::new(&self.keywords)
    }

    /// 텍스트가 조건을 만족하는지 확인합니다.
    pub fn matches(&self, text: &str) -> bool {
        self.matches_lowered(&text.to_lowercase())
    }

    /// 키워드별 출현 횟수를 집계에 더합니다.
    ///
    /// 조건 검사는 하지 않습니다. [`matches`](Self::matches)를 통과하고
    /// 필드 분리까지 성공한 텍스트에만 호출합니다.
    pub fn count_into(&self, text: &str, tally: &mut Tally) {
        self.count_lowered(&text.to_lowercase(), tally);
    }

    fn matches_lowered(&self, lowered: &str) -> bool {
        match self.criteria {
            Criteria::All => self.keywords.iter().all(|k| lowered.contains(k.as_str())),
            Criteria::Any => self.keywords.iter().any(|k| lowered.contains(k.as_str())),
        }
    }

    fn count_lowered(&self, lowered: &str, tally: &mut Tally) {
        for (index, keyword) in self.keywords.iter().enumerate() {
            if keyword.is_empty() {
                continue;
            }
            tally.add(index, lowered.matches(keyword.as_str()).count() as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_requires_every_keyword() {
        let filter = KeywordFilter::new(["error", "timeout"], Criteria::All);
        assert!(!filter.matches("an error occurred"));
        assert!(filter.matches("Timeout caused an ERROR"));
    }

    #[test]
    fn any_requires_one_keyword() {
        let filter = KeywordFilter::new(["error", "timeout"], Criteria::Any);
        assert!(filter.matches("an error occurred"));
        assert!(!filter.matches("all good"));
    }

    #[test]
    fn counts_case_insensitive_occurrences() {
        let filter = KeywordFilter::new(["error"], Criteria::Any);
        let mut tally = filter.empty_tally();
        filter.count_into("Error error ERROR", &mut tally);
        assert_eq!(tally.get("error"), Some(3));
    }

    #[test]
    fn counts_are_non_overlapping() {
        let filter = KeywordFilter::new(["aa"], Criteria::Any);
        let mut tally = filter.empty_tally();
        filter.count_into("aaaa aaa", &mut tally);
        assert_eq!(tally.get("aa"), Some(3));
    }

    #[test]
    fn empty_keyword_list_never_matches_any() {
        let filter = KeywordFilter::new(Vec::<String>::new(), Criteria::Any);
        assert!(!filter.matches("anything"));
    }

    #[test]
    fn any_counts_every_keyword_present() {
        let filter = KeywordFilter::new(["error", "timeout"], Criteria::Any);
        let mut tally = filter.empty_tally();
        filter.count_into("error error", &mut tally);
        filter.count_into("timeout then error", &mut tally);
        assert_eq!(tally.get("error"), Some(3));
        assert_eq!(tally.get("timeout"), Some(1));
    }

    #[test]
    fn keywords_are_lowercased() {
        let filter = KeywordFilter::new(["StdErr"], Criteria::Any);
        assert_eq!(filter.keywords(), ["stderr"]);
        assert!(filter.matches("STDERR: boom"));
    }
}
