//! 레코드 추출 모듈 -- 태그 규칙에 따라 라인에서 레코드와 필드를 추출합니다.
//!
//! [`TagRule`]은 설정의 [`TagSpec`]을 한 번 컴파일한 결과이며,
//! [`RecordExtractor`]는 태그 규칙과 기대 필드 수 `F`(헤더 수)를 묶습니다.
//!
//! # 태그 규칙
//! - `NoTag`: 모든 라인이 필드 하나짜리 레코드
//! - `SingleChar(d)`: `d`가 정확히 `F-1`번 나오는 라인만, `d`로 분리
//! - `Pattern(p)`: `p` 매치가 정확히 `F-1`개인 라인만, `p`로 분리
//! - `Delimited(start, end)`: 여러 줄 레코드 재조립 후 `start(.*?)end` 캡처가 정확히 `F`개
//!
//! 추출은 두 단계입니다. [`RecordAssembler`]가 라인 스트림에서 후보 텍스트를 만들고,
//! 키워드 필터를 통과한 후보만 [`RecordExtractor::fields`]로 필드를 분리합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logscope_search::extract::{RecordExtractor, TagRule};
//!
//! let extractor = RecordExtractor::new(TagRule::SingleChar(','), 3);
//! let records = extractor.extract(["a,b,c", "a,b"]);
//! assert_eq!(records.len(), 1);
//! ```

pub mod assembler;

pub use assembler::RecordAssembler;

use logscope_core::config::{LogTypeConfig, TagSpec};
use logscope_core::types::Record;
use regex::Regex;

use crate::error::LogSearchError;

/// 여러 줄 레코드의 시작/종료 태그
#[derive(Debug, Clone)]
pub struct Delimiters {
    start: String,
    end: String,
    record: Regex,
}

impl Delimiters {
    /// 시작/종료 태그로 구분자를 생성합니다.
    pub fn new(start: &str, end: &str) -> Result<Self, regex::Error> {
        let record = Regex::new(&format!(
            "{}(.*?){}",
            regex::escape(start),
            regex::escape(end)
        ))?;
        Ok(Self {
            start: start.to_owned(),
            end: end.to_owned(),
            record,
        })
    }

    /// 시작 태그
    pub fn start(&self) -> &str {
        &self.start
    }

    /// 종료 태그
    pub fn end(&self) -> &str {
        &self.end
    }

    /// 라인이 시작 태그로 시작하는지 확인합니다.
    pub fn opens(&self, line: &str) -> bool {
        line.starts_with(&self.start)
    }

    /// 라인에 종료 태그가 있는지 확인합니다.
    pub fn closes(&self, line: &str) -> bool {
        line.contains(&self.end)
    }

    /// 텍스트에 시작 또는 종료 태그가 하나라도 있는지 확인합니다.
    pub fn touches(&self, text: &str) -> bool {
        text.contains(&self.start) || text.contains(&self.end)
    }

    /// `start(.*?)end` 매치 수
    pub fn count(&self, text: &str) -> usize {
        self.record.find_iter(text).count()
    }

    /// `start(.*?)end`의 캡처 그룹 목록
    pub fn captures(&self, text: &str) -> Vec<String> {
        self.record
            .captures_iter(text)
            .map(|caps| caps.get(1).map_or("", |m| m.as_str()).to_owned())
            .collect()
    }
}

/// 컴파일된 태그 규칙
#[derive(Debug, Clone)]
pub enum TagRule {
    /// 라인 전체가 레코드
    NoTag,
    /// 한 글자 구분자
    SingleChar(char),
    /// 정규식 구분자
    Pattern(Regex),
    /// 여러 줄 레코드
    Delimited(Delimiters),
}

impl TagRule {
    /// 태그 설정을 컴파일합니다.
    ///
    /// # Errors
    /// 구분자가 한 글자가 아니거나 정규식 컴파일에 실패하면 사유 문자열을 반환합니다.
    pub fn compile(spec: &TagSpec) -> Result<Self, String> {
        match spec {
            TagSpec::NoTag => Ok(Self::NoTag),
            TagSpec::SingleChar { delimiter } => {
                let mut chars = delimiter.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Self::SingleChar(c)),
                    _ => Err(format!(
                        "single_char delimiter '{delimiter}' must be exactly one character"
                    )),
                }
            }
            TagSpec::Pattern { pattern } => Regex::new(pattern)
                .map(Self::Pattern)
                .map_err(|e| format!("invalid pattern '{pattern}': {e}")),
            TagSpec::Delimited { start, end } => {
                if start.is_empty() || end.is_empty() {
                    return Err("delimited start and end tags must not be empty".to_owned());
                }
                Delimiters::new(start, end)
                    .map(Self::Delimited)
                    .map_err(|e| format!("invalid delimiters '{start}' '{end}': {e}"))
            }
        }
    }

    /// 여러 줄 레코드 규칙인지 확인합니다.
    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::Delimited(_))
    }

    /// 규칙 종류 이름 (로그용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoTag => "none",
            Self::SingleChar(_) => "single_char",
            Self::Pattern(_) => "pattern",
            Self::Delimited(_) => "delimited",
        }
    }
}

/// 레코드 추출기 -- 태그 규칙 + 기대 필드 수
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    rule: TagRule,
    field_count: usize,
}

impl RecordExtractor {
    /// 태그 규칙과 기대 필드 수로 추출기를 생성합니다.
    pub fn new(rule: TagRule, field_count: usize) -> Self {
        Self { rule, field_count }
    }

    /// 로그 유형 설정에서 추출기를 생성합니다. `F`는 헤더 수입니다.
    ///
    /// # Errors
    /// 태그를 해석하거나 컴파일할 수 없으면 [`LogSearchError::InvalidTag`]
    pub fn from_log_type(log_type: &LogTypeConfig) -> Result<Self, LogSearchError> {
        let invalid = |reason: String| LogSearchError::InvalidTag {
            log_type: log_type.name.clone(),
            reason,
        };

        if log_type.headers.is_empty() {
            return Err(invalid("log type declares no headers".to_owned()));
        }

        let spec = log_type.tag.resolve().map_err(invalid)?;
        let rule = TagRule::compile(&spec).map_err(invalid)?;
        Ok(Self::new(rule, log_type.headers.len()))
    }

    /// 태그 규칙
    pub fn rule(&self) -> &TagRule {
        &self.rule
    }

    /// 기대 필드 수 `F`
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// 새 레코드 조립기를 만듭니다. 대상(스트림)마다 하나씩 사용합니다.
    pub fn assembler(&self) -> RecordAssembler<'_> {
        RecordAssembler::new(self)
    }

    /// 단일 라인 규칙에서 라인이 완성된 레코드인지 확인합니다.
    ///
    /// 구분자 수가 정확히 `F-1`이어야 합니다. `NoTag`는 항상 참이며,
    /// 여러 줄 규칙은 조립기가 따로 판단하므로 항상 참입니다.
    pub fn qualifies(&self, line: &str) -> bool {
        match &self.rule {
            TagRule::NoTag | TagRule::Delimited(_) => true,
            TagRule::SingleChar(d) => {
                self.field_count.checked_sub(1) == Some(line.matches(*d).count())
            }
            TagRule::Pattern(p) => {
                self.field_count.checked_sub(1) == Some(p.find_iter(line).count())
            }
        }
    }

    /// 후보 텍스트를 필드로 분리합니다.
    ///
    /// 여러 줄 규칙에서는 캡처 수가 정확히 `F`가 아니면 `None`입니다.
    pub fn fields(&self, text: &str) -> Option<Vec<String>> {
        match &self.rule {
            TagRule::NoTag => Some(vec![text.to_owned()]),
            TagRule::SingleChar(d) => Some(text.split(*d).map(str::to_owned).collect()),
            TagRule::Pattern(p) => Some(p.split(text).map(str::to_owned).collect()),
            TagRule::Delimited(tags) => {
                let fields = tags.captures(text);
                (fields.len() == self.field_count).then_some(fields)
            }
        }
    }

    /// 라인 목록에서 레코드를 모두 추출합니다 (키워드 필터 없음).
    pub fn extract<I, L>(&self, lines: I) -> Vec<Record>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut assembler = self.assembler();
        let mut records = Vec::new();

        for line in lines {
            if let Some(text) = assembler.push(line.as_ref()) {
                records.extend(self.fields(&text).map(Record::new));
            }
        }
        if let Some(text) = assembler.finish() {
            records.extend(self.fields(&text).map(Record::new));
        }

        records
    }
}
