//! 研究状态 - 在规划、起草、发布阶段之间传递的共享记录

use serde::{Deserialize, Serialize};

use crate::config::TaskConfig;
use crate::errors::ResearchError;
use crate::types::tone::Tone;

/// 版面各部分的显示标签，只用于渲染
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHeaders {
    pub title: String,
    pub date: String,
    pub introduction: String,
    pub table_of_contents: String,
    pub conclusion: String,
    pub references: String,
}

/// research_data 中的一条记录：章节键到生成文本的有序映射
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResearchEntry {
    fields: Vec<(String, String)>,
}

impl ResearchEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 单一章节的记录
    pub fn single(key: impl Into<String>, text: impl Into<String>) -> Self {
        let mut entry = Self::new();
        entry.insert(key, text);
        entry
    }

    /// 追加一个键值；键已存在时覆盖其文本并保留原位置
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        let key = key.into();
        let text = text.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = text,
            None => self.fields.push((key, text)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// 按插入顺序返回文本
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 研究状态
///
/// 标量字段只能由其所属阶段写入一次；`research_data` 与 `sources` 只追加。
/// 缺失的字段读取时返回空字符串。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchState {
    task: TaskConfig,
    tone: Tone,
    headers: Option<ReportHeaders>,
    title: Option<String>,
    date: Option<String>,
    initial_research: Option<String>,
    introduction: Option<String>,
    table_of_contents: Option<String>,
    conclusion: Option<String>,
    sections: Vec<String>,
    research_data: Vec<ResearchEntry>,
    sources: Vec<String>,
}

fn write_once(
    slot: &mut Option<String>,
    field: &'static str,
    value: String,
) -> Result<(), ResearchError> {
    if slot.is_some() {
        return Err(ResearchError::FieldAlreadyWritten(field));
    }
    *slot = Some(value);
    Ok(())
}

impl ResearchState {
    /// 以任务配置为种子创建状态
    pub fn new(task: TaskConfig, tone: Tone) -> Self {
        Self {
            task,
            tone,
            headers: None,
            title: None,
            date: None,
            initial_research: None,
            introduction: None,
            table_of_contents: None,
            conclusion: None,
            sections: Vec::new(),
            research_data: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn task(&self) -> &TaskConfig {
        &self.task
    }

    pub fn query(&self) -> &str {
        &self.task.query
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn headers(&self) -> Option<&ReportHeaders> {
        self.headers.as_ref()
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn date(&self) -> &str {
        self.date.as_deref().unwrap_or_default()
    }

    pub fn initial_research(&self) -> &str {
        self.initial_research.as_deref().unwrap_or_default()
    }

    pub fn introduction(&self) -> &str {
        self.introduction.as_deref().unwrap_or_default()
    }

    pub fn table_of_contents(&self) -> &str {
        self.table_of_contents.as_deref().unwrap_or_default()
    }

    pub fn conclusion(&self) -> &str {
        self.conclusion.as_deref().unwrap_or_default()
    }

    /// 规划阶段给出的章节标题
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn research_data(&self) -> &[ResearchEntry] {
        &self.research_data
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn set_headers(&mut self, headers: ReportHeaders) -> Result<(), ResearchError> {
        if self.headers.is_some() {
            return Err(ResearchError::FieldAlreadyWritten("headers"));
        }
        self.headers = Some(headers);
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), ResearchError> {
        write_once(&mut self.title, "title", title.into())
    }

    pub fn set_date(&mut self, date: impl Into<String>) -> Result<(), ResearchError> {
        write_once(&mut self.date, "date", date.into())
    }

    pub fn set_initial_research(&mut self, text: impl Into<String>) -> Result<(), ResearchError> {
        write_once(&mut self.initial_research, "initial_research", text.into())
    }

    pub fn set_introduction(&mut self, text: impl Into<String>) -> Result<(), ResearchError> {
        write_once(&mut self.introduction, "introduction", text.into())
    }

    pub fn set_table_of_contents(&mut self, text: impl Into<String>) -> Result<(), ResearchError> {
        write_once(&mut self.table_of_contents, "table_of_contents", text.into())
    }

    pub fn set_conclusion(&mut self, text: impl Into<String>) -> Result<(), ResearchError> {
        write_once(&mut self.conclusion, "conclusion", text.into())
    }

    pub fn set_sections(&mut self, sections: Vec<String>) -> Result<(), ResearchError> {
        if !self.sections.is_empty() {
            return Err(ResearchError::FieldAlreadyWritten("sections"));
        }
        self.sections = sections;
        Ok(())
    }

    /// 整条追加一个章节记录
    pub fn append_research_entry(&mut self, entry: ResearchEntry) {
        self.research_data.push(entry);
    }

    pub fn extend_sources<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.sources.extend(sources);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ResearchState {
        ResearchState::new(TaskConfig::with_query("soil health"), Tone::Objective)
    }

    #[test]
    fn test_absent_fields_read_as_empty() {
        let state = state();
        assert_eq!(state.introduction(), "");
        assert_eq!(state.conclusion(), "");
        assert_eq!(state.table_of_contents(), "");
        assert_eq!(state.date(), "");
        assert!(state.headers().is_none());
        assert!(state.research_data().is_empty());
        assert!(state.sources().is_empty());
    }

    #[test]
    fn test_scalar_fields_are_written_once() {
        let mut state = state();
        state.set_introduction("first").unwrap();
        let err = state.set_introduction("second").unwrap_err();
        assert!(matches!(err, ResearchError::FieldAlreadyWritten("introduction")));
        assert_eq!(state.introduction(), "first");
    }

    #[test]
    fn test_research_data_and_sources_are_append_only() {
        let mut state = state();
        state.append_research_entry(ResearchEntry::single("A", "alpha"));
        state.append_research_entry(ResearchEntry::single("B", "beta"));
        state.extend_sources(vec!["s1".to_string()]);
        state.extend_sources(vec!["s2".to_string()]);

        let keys: Vec<_> = state
            .research_data()
            .iter()
            .flat_map(|entry| entry.keys().map(str::to_string).collect::<Vec<_>>())
            .collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(state.sources(), ["s1", "s2"]);
    }

    #[test]
    fn test_entry_preserves_insertion_order() {
        let mut entry = ResearchEntry::new();
        entry.insert("z", "last letter");
        entry.insert("a", "first letter");
        entry.insert("z", "updated");
        assert_eq!(entry.values().collect::<Vec<_>>(), vec!["updated", "first letter"]);
        assert_eq!(entry.get("a"), Some("first letter"));
    }
}
