use serde::{Deserialize, Serialize};

use crate::types::ReportHeaders;

/// 目标语言类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "fr")]
    French,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::Japanese => write!(f, "ja"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::French => write!(f, "fr"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" | "英文" => Ok(TargetLanguage::English),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "ja" | "japanese" | "日本語" | "日文" => Ok(TargetLanguage::Japanese),
            "de" | "german" | "deutsch" | "德文" => Ok(TargetLanguage::German),
            "fr" | "french" | "français" | "法文" => Ok(TargetLanguage::French),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Chinese => "中文",
            TargetLanguage::Japanese => "日本語",
            TargetLanguage::German => "Deutsch",
            TargetLanguage::French => "Français",
        }
    }

    /// 获取语言的提示词指令
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::English => {
                "Please write the report in English, ensuring accurate, professional, and easy-to-understand language."
            }
            TargetLanguage::Chinese => "请使用中文撰写报告，确保语言表达准确、专业、易于理解。",
            TargetLanguage::Japanese => {
                "日本語でレポートを作成してください。正確で専門的で理解しやすい言語表現を心がけてください。"
            }
            TargetLanguage::German => {
                "Bitte verfassen Sie den Bericht auf Deutsch und achten Sie auf eine präzise, professionelle und leicht verständliche Sprache."
            }
            TargetLanguage::French => {
                "Veuillez rédiger le rapport en français, dans un langage précis, professionnel et facile à comprendre."
            }
        }
    }

    /// 报告版面的标签，标题使用规划阶段给出的题目
    pub fn report_headers(&self, title: &str) -> ReportHeaders {
        let (date, introduction, table_of_contents, conclusion, references) = match self {
            TargetLanguage::English => (
                "Date",
                "Introduction",
                "Table of Contents",
                "Conclusion",
                "References",
            ),
            TargetLanguage::Chinese => ("日期", "引言", "目录", "结论", "参考文献"),
            TargetLanguage::Japanese => ("日付", "はじめに", "目次", "結論", "参考文献"),
            TargetLanguage::German => (
                "Datum",
                "Einleitung",
                "Inhaltsverzeichnis",
                "Fazit",
                "Quellen",
            ),
            TargetLanguage::French => (
                "Date",
                "Introduction",
                "Table des matières",
                "Conclusion",
                "Références",
            ),
        };

        ReportHeaders {
            title: title.to_string(),
            date: date.to_string(),
            introduction: introduction.to_string(),
            table_of_contents: table_of_contents.to_string(),
            conclusion: conclusion.to_string(),
            references: references.to_string(),
        }
    }
}
