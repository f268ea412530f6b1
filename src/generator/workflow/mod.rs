use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use crate::config::{Config, TaskConfig};
use crate::errors::{ResearchError, Stage};
use crate::generator::context::ResearchContext;
use crate::generator::drafting::{DraftingStage, EditorialDesk, LlmReportWriter, LlmSectionWriter};
use crate::generator::planning::{LlmPlanner, PlanningStage, ResearchPlan};
use crate::generator::publisher::Publisher;
use crate::llm::LLMClient;
use crate::progress::{ProgressReporter, ProgressSink};
use crate::types::{PublishOutcome, ResearchState, Tone};
use crate::utils::CancellationToken;
use crate::utils::paths::run_output_dir;

/// 阶段完成时对外报告的整体进度
pub struct ProgressMarks;

impl ProgressMarks {
    pub const STARTED: u32 = 0;
    pub const PLANNED: u32 = 30;
    pub const DRAFTED: u32 = 70;
    pub const PUBLISHED: u32 = 100;
}

/// 单次运行的可选参数
#[derive(Clone, Default)]
pub struct RunOptions {
    pub reporter: ProgressReporter,
    pub cancel: CancellationToken,
}

impl RunOptions {
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.reporter = ProgressReporter::new(sink);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// 主编：拥有研究状态的生命周期，按依赖顺序调度各阶段，并划定失败边界
pub struct ChiefEditor {
    config: Arc<Config>,
    planner: Arc<dyn PlanningStage>,
    drafter: Arc<dyn DraftingStage>,
    publisher: Arc<Publisher>,
}

impl ChiefEditor {
    pub fn new(
        config: Arc<Config>,
        planner: Arc<dyn PlanningStage>,
        drafter: Arc<dyn DraftingStage>,
        publisher: Publisher,
    ) -> Self {
        Self {
            config,
            planner,
            drafter,
            publisher: Arc::new(publisher),
        }
    }

    /// 使用模型驱动的各阶段
    pub fn from_config(config: Config) -> Result<Self> {
        let llm = LLMClient::new(&config.llm)?;
        let planner = Arc::new(LlmPlanner::new(llm.clone()));
        let drafter = Arc::new(EditorialDesk::new(
            Arc::new(LlmSectionWriter::new(llm.clone())),
            Arc::new(LlmReportWriter::new(llm)),
        ));
        let publisher = Publisher::from_config(&config.publisher);
        Ok(Self::new(Arc::new(config), planner, drafter, publisher))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 读取任务配置并以调用方的查询覆盖
    fn open_task(&self, query: &str) -> Result<TaskConfig, ResearchError> {
        let mut task = TaskConfig::load(&self.config.task_path)?;
        task.query = query.to_string();
        Ok(task)
    }

    /// 执行完整的研究流程：规划 → 起草 → 发布
    ///
    /// 任务配置缺失时在任何事件发出前失败。
    pub async fn run(
        &self,
        query: &str,
        tone: Tone,
        options: RunOptions,
    ) -> Result<PublishOutcome, ResearchError> {
        let task = self.open_task(query)?;
        let reporter = options.reporter.clone();
        let context = ResearchContext::new(
            self.config.clone(),
            task.clone(),
            tone,
            options.reporter,
            options.cancel,
        );
        let mut state = ResearchState::new(task, tone);

        tracing::info!(
            "🧭 开始研究 [{}] query: {} tone: {}",
            context.run_id,
            query,
            tone
        );

        let result = self.run_stages(&context, &mut state).await;
        match &result {
            Ok(outcome) => {
                reporter
                    .log(
                        "research_report",
                        json!({ "report": outcome.report.content, "status": "complete" }),
                    )
                    .await;
                tracing::info!("🎉 研究完成 [{}]", context.run_id);
            }
            Err(e) => {
                reporter
                    .log("error", json!({ "error": e.to_string(), "status": "failed" }))
                    .await;
                tracing::error!("❌ 研究失败 [{}]: {}", context.run_id, e);
            }
        }
        let (hits, misses) = context.cache.stats();
        tracing::info!(
            "💾 缓存统计 [{}] 命中 {} 次，未命中 {} 次",
            context.run_id,
            hits,
            misses
        );
        result
    }

    async fn run_stages(
        &self,
        context: &ResearchContext,
        state: &mut ResearchState,
    ) -> Result<PublishOutcome, ResearchError> {
        context.reporter.progress(ProgressMarks::STARTED).await;

        self.run_stage(context, Stage::Planning, async {
            let plan = self.planner.plan(context).await?.conform_to(&context.task);
            apply_plan(state, plan)?;
            Ok::<_, anyhow::Error>(())
        })
        .await?;
        context.reporter.progress(ProgressMarks::PLANNED).await;

        self.run_stage(context, Stage::Drafting, self.drafter.draft(context, state))
            .await?;
        context.reporter.progress(ProgressMarks::DRAFTED).await;

        // 发布者自行报告状态与错误事件
        context.cancel.check()?;
        let output_dir = self.output_dir(context.query());
        let outcome = self
            .publisher
            .run(context, state, output_dir.as_deref())
            .await
            .map_err(|e| ResearchError::stage(Stage::Publishing, e.into()))?;
        context.reporter.progress(ProgressMarks::PUBLISHED).await;

        Ok(outcome)
    }

    /// 包装单个阶段：前后发出状态事件，失败时发出一个错误事件并终止后续阶段
    async fn run_stage<T, F>(
        &self,
        context: &ResearchContext,
        stage: Stage,
        work: F,
    ) -> Result<T, ResearchError>
    where
        F: Future<Output = Result<T>>,
    {
        context.cancel.check()?;
        let (started, finished) = stage_messages(stage);
        context.reporter.status(stage.key(), started, 0).await;

        match context.cancel.run_until_cancelled(work).await? {
            Ok(value) => {
                context.reporter.status(stage.key(), finished, 100).await;
                Ok(value)
            }
            Err(e) => {
                let err = ResearchError::stage(stage, e);
                if !matches!(err, ResearchError::Cancelled) {
                    context.reporter.error(stage.key(), err.to_string()).await;
                }
                Err(err)
            }
        }
    }

    fn output_dir(&self, query: &str) -> Option<PathBuf> {
        self.publisher
            .output_root()
            .map(|root| run_output_dir(root, query, chrono::Utc::now().timestamp()))
    }

    /// 只执行规划阶段，返回整理后的来源列表
    ///
    /// 任务配置文件不存在时使用默认任务；存在但无效时仍然报错。
    pub async fn get_sources(
        &self,
        query: &str,
        options: RunOptions,
    ) -> Result<Vec<String>, ResearchError> {
        let mut task = if self.config.task_path.exists() {
            TaskConfig::load(&self.config.task_path)?
        } else {
            TaskConfig::with_query(query)
        };
        task.query = query.to_string();

        let context = ResearchContext::new(
            self.config.clone(),
            task,
            Tone::default(),
            options.reporter,
            options.cancel,
        );
        let plan = self
            .run_stage(&context, Stage::Planning, self.planner.plan(&context))
            .await?;
        Ok(plan.conform_to(&context.task).sources)
    }
}

fn stage_messages(stage: Stage) -> (&'static str, &'static str) {
    match stage {
        Stage::Planning => ("Planning research...", "Research plan ready"),
        Stage::Drafting => ("Drafting report sections...", "Report sections drafted"),
        Stage::Publishing => ("Publishing final research report...", "Report published successfully"),
    }
}

/// 把规划结果写入研究状态
fn apply_plan(state: &mut ResearchState, plan: ResearchPlan) -> Result<(), ResearchError> {
    state.set_title(plan.title)?;
    state.set_date(plan.date)?;
    state.set_initial_research(plan.initial_research)?;
    state.set_sections(plan.sections)?;
    state.extend_sources(plan.sources);
    Ok(())
}
