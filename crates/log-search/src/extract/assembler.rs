//! 레코드 조립기 -- 라인 스트림을 후보 레코드 텍스트로 바꿉니다.
//!
//! 단일 라인 규칙에서는 자격을 갖춘 라인을 그대로 내보냅니다.
//! 여러 줄 규칙(`Delimited`)에서는 다음 상태 기계를 따릅니다.
//!
//! 1. 라인에 `start(.*?)end` 매치가 정확히 `F`개면 바로 내보냅니다.
//!    누적 상태는 건드리지 않습니다.
//! 2. 열린 레코드가 없으면 버퍼를 비운 뒤 라인을 붙입니다. 열린 레코드가 있으면
//!    기존 내용의 뒤쪽 공백을 지우고 공백 하나를 사이에 두고 붙입니다.
//! 3. 열림 플래그 갱신: 열려 있었다면 이 라인에 `end`가 있을 때 닫히고,
//!    닫혀 있었다면 이 라인이 `start`로 시작할 때 열립니다.
//! 4. 플래그가 닫힘이면 버퍼를 하나의 후보로 내보냅니다.
//! 5. 스트림 끝에서 여전히 열려 있으면 버퍼를 한 번 더 내보냅니다 (flush).
//!
//! `start`와 `end`를 모두 포함하지 않는 후보는 버립니다.

use super::{RecordExtractor, TagRule};

/// 대상 하나의 라인 스트림에 대한 레코드 조립 상태
#[derive(Debug)]
pub struct RecordAssembler<'a> {
    extractor: &'a RecordExtractor,
    buffer: String,
    open: bool,
}

impl<'a> RecordAssembler<'a> {
    pub(super) fn new(extractor: &'a RecordExtractor) -> Self {
        Self {
            extractor,
            buffer: String::new(),
            open: false,
        }
    }

    /// 여러 줄 레코드가 열려 있는지 (half-open) 확인합니다.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// 라인 하나를 넣고, 완성된 후보 텍스트가 있으면 반환합니다.
    pub fn push(&mut self, line: &str) -> Option<String> {
        let extractor = self.extractor;
        let TagRule::Delimited(tags) = extractor.rule() else {
            return extractor.qualifies(line).then(|| line.to_owned());
        };

        if tags.count(line) == extractor.field_count() {
            return Some(line.to_owned());
        }

        if !self.open {
            self.buffer.clear();
        }
        if self.buffer.is_empty() {
            self.buffer.push_str(line);
        } else {
            let trimmed = self.buffer.trim_end().len();
            self.buffer.truncate(trimmed);
            self.buffer.push(' ');
            self.buffer.push_str(line);
        }

        self.open = if self.open {
            !tags.closes(line)
        } else {
            tags.opens(line)
        };

        if self.open {
            return None;
        }
        let text = std::mem::take(&mut self.buffer);
        tags.touches(&text).then_some(text)
    }

    /// 스트림 끝에서 열린 레코드를 내보냅니다.
    pub fn finish(&mut self) -> Option<String> {
        let extractor = self.extractor;
        let TagRule::Delimited(tags) = extractor.rule() else {
            return None;
        };
        if !self.open {
            return None;
        }
        self.open = false;
        let text = std::mem::take(&mut self.buffer);
        tags.touches(&text).then_some(text)
    }
}
