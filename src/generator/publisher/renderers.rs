use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::types::PublishFormat;

/// 报告文件的基础名
const REPORT_FILE_STEM: &str = "report";

fn report_path(output_dir: &Path, format: PublishFormat) -> PathBuf {
    output_dir.join(format!("{}.{}", REPORT_FILE_STEM, format.extension()))
}

/// 单一格式的渲染器
#[async_trait]
pub trait FormatRenderer: Send + Sync {
    fn format(&self) -> PublishFormat;

    /// 把 markdown 版面渲染到输出目录，返回生成的文件路径
    async fn render(&self, layout: &str, output_dir: &Path) -> Result<PathBuf>;
}

/// 直接写出 markdown 文件
#[derive(Debug, Default, Clone)]
pub struct MarkdownRenderer;

#[async_trait]
impl FormatRenderer for MarkdownRenderer {
    fn format(&self) -> PublishFormat {
        PublishFormat::Markdown
    }

    async fn render(&self, layout: &str, output_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("failed to create output directory {:?}", output_dir))?;
        let path = report_path(output_dir, PublishFormat::Markdown);
        tokio::fs::write(&path, layout)
            .await
            .with_context(|| format!("failed to write {:?}", path))?;
        Ok(path)
    }
}

/// 通过外部 pandoc 进程导出 pdf / docx
#[derive(Debug, Clone)]
pub struct PandocRenderer {
    format: PublishFormat,
    pandoc_path: PathBuf,
}

impl PandocRenderer {
    pub fn new(format: PublishFormat, pandoc_path: PathBuf) -> Self {
        Self {
            format,
            pandoc_path,
        }
    }
}

#[async_trait]
impl FormatRenderer for PandocRenderer {
    fn format(&self) -> PublishFormat {
        self.format
    }

    async fn render(&self, layout: &str, output_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("failed to create output directory {:?}", output_dir))?;
        let path = report_path(output_dir, self.format);

        let mut child = Command::new(&self.pandoc_path)
            .arg("--from=markdown")
            .arg("--output")
            .arg(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to launch {:?}", self.pandoc_path))?;

        // 写入 stdin 的同时读取 stderr
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(layout.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.context("failed to wait for pandoc")?;
        if !output.status.success() {
            bail!(
                "pandoc exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        fed.context("failed to stream report to pandoc")?;
        Ok(path)
    }
}
