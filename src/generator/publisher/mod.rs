//! 发布阶段：把研究状态组装成最终版面，并按格式导出

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PublisherConfig;
use crate::errors::{ExportFailure, ResearchError};
use crate::generator::context::ResearchContext;
use crate::types::{
    OutcomeStatus, PublishFormat, PublishFormats, PublishMetadata, PublishOutcome, ReportArtifact,
    ReportMetadata, ResearchState,
};

mod renderers;

pub use renderers::{FormatRenderer, MarkdownRenderer, PandocRenderer};

/// 组装最终版面
///
/// 纯函数：同一状态总是得到逐字节相同的结果。缺失的可选字段以空串代替，
/// 只有 `headers` 缺失时返回 `MalformedState`。
pub fn generate_layout(state: &ResearchState) -> Result<String, ResearchError> {
    let headers = state.headers().ok_or_else(|| {
        ResearchError::MalformedState("report headers have not been generated".to_string())
    })?;

    let sections = state
        .research_data()
        .iter()
        .flat_map(|entry| entry.values())
        .collect::<Vec<_>>()
        .join("\n\n");
    let references = state.sources().join("\n");

    Ok(format!(
        "# {title}\n\
         #### {date_label}: {date}\n\
         \n\
         ## {introduction_label}\n\
         {introduction}\n\
         \n\
         ## {toc_label}\n\
         {table_of_contents}\n\
         \n\
         {sections}\n\
         \n\
         ## {conclusion_label}\n\
         {conclusion}\n\
         \n\
         ## {references_label}\n\
         {references}\n",
        title = headers.title,
        date_label = headers.date,
        date = state.date(),
        introduction_label = headers.introduction,
        introduction = state.introduction(),
        toc_label = headers.table_of_contents,
        table_of_contents = state.table_of_contents(),
        sections = sections,
        conclusion_label = headers.conclusion,
        conclusion = state.conclusion(),
        references_label = headers.references,
        references = references,
    ))
}

/// 发布者
pub struct Publisher {
    output_root: Option<PathBuf>,
    renderers: HashMap<PublishFormat, Arc<dyn FormatRenderer>>,
}

impl Publisher {
    /// 使用默认渲染器：markdown 直接写文件，pdf/docx 交给 pandoc
    pub fn from_config(config: &PublisherConfig) -> Self {
        Self::new(config.output_path.clone())
            .with_renderer(Arc::new(MarkdownRenderer))
            .with_renderer(Arc::new(PandocRenderer::new(
                PublishFormat::Pdf,
                config.pandoc_path.clone(),
            )))
            .with_renderer(Arc::new(PandocRenderer::new(
                PublishFormat::Docx,
                config.pandoc_path.clone(),
            )))
    }

    /// 不带任何渲染器的发布者
    pub fn new(output_root: Option<PathBuf>) -> Self {
        Self {
            output_root,
            renderers: HashMap::new(),
        }
    }

    /// 注册（或替换）某个格式的渲染器
    pub fn with_renderer(mut self, renderer: Arc<dyn FormatRenderer>) -> Self {
        self.renderers.insert(renderer.format(), renderer);
        self
    }

    pub fn output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    /// 按格式开关逐个导出
    ///
    /// 每个格式相互隔离：一个格式失败不会阻止其余格式，所有失败在最后一并返回。
    pub async fn write_report_by_formats(
        &self,
        context: &ResearchContext,
        layout: &str,
        formats: &PublishFormats,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ResearchError> {
        let mut files = Vec::new();
        let mut failures = Vec::new();

        for format in formats.enabled() {
            context.cancel.check()?;

            let Some(renderer) = self.renderers.get(&format) else {
                failures.push(ExportFailure {
                    format,
                    message: "no renderer registered".to_string(),
                });
                continue;
            };

            match context
                .cancel
                .run_until_cancelled(renderer.render(layout, output_dir))
                .await?
            {
                Ok(path) => {
                    tracing::info!("💾 已导出 {} 报告: {}", format, path.display());
                    files.push(path);
                }
                Err(e) => {
                    tracing::warn!("❌ 导出 {} 报告失败: {:#}", format, e);
                    failures.push(ExportFailure {
                        format,
                        message: format!("{:#}", e),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(files)
        } else {
            Err(ResearchError::Export { failures })
        }
    }

    /// 组装版面并导出，返回报告制品
    pub async fn publish_research_report(
        &self,
        context: &ResearchContext,
        state: &ResearchState,
        output_dir: Option<&Path>,
    ) -> Result<PublishOutcome, ResearchError> {
        let formats = state.task().publish_formats;
        let layout = generate_layout(state)?;

        let files = match output_dir {
            Some(dir) => {
                self.write_report_by_formats(context, &layout, &formats, dir)
                    .await?
            }
            None => {
                tracing::debug!("未配置输出目录，跳过导出");
                Vec::new()
            }
        };

        let title = state
            .headers()
            .map(|headers| headers.title.clone())
            .unwrap_or_default();

        Ok(PublishOutcome {
            status: OutcomeStatus::Success,
            report: ReportArtifact {
                content: layout,
                format: PublishFormat::Markdown.to_string(),
                metadata: ReportMetadata {
                    title,
                    date: state.date().to_string(),
                },
            },
            metadata: PublishMetadata {
                formats: formats.enabled().iter().map(ToString::to_string).collect(),
                files,
            },
        })
    }

    /// 发布阶段入口：前后发出状态事件，失败时发出错误事件并原样返回错误
    pub async fn run(
        &self,
        context: &ResearchContext,
        state: &ResearchState,
        output_dir: Option<&Path>,
    ) -> Result<PublishOutcome, ResearchError> {
        context
            .reporter
            .status("publishing", "Publishing final research report...", 0)
            .await;

        match self.publish_research_report(context, state, output_dir).await {
            Ok(outcome) => {
                context
                    .reporter
                    .status("publishing", "Report published successfully", 100)
                    .await;
                Ok(outcome)
            }
            Err(e) => {
                if !matches!(e, ResearchError::Cancelled) {
                    context
                        .reporter
                        .error("error", format!("Error publishing report: {}", e))
                        .await;
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests;
