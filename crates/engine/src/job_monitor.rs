use std::time::Duration;

use metrics::{counter, histogram};
use regex::Regex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use validator_core::{
    config::JobMonitorConfig,
    models::{Job, JobReport, JobState, JobUser},
    CommandExecutor, ValidatorError, ValidatorResult,
};

/// `bjobs` 的 USER 列最多显示 7 个字符
const USER_COLUMN_WIDTH: usize = 7;

/// 作业生命周期监控器
///
/// 提交作业 -> 解析作业ID -> 在截止时间内轮询终态 -> 超时则终止作业。
/// 全程在同一个任务内顺序执行，轮询间隔通过 `tokio::time::sleep` 协作等待。
pub struct JobLifecycleMonitor {
    config: JobMonitorConfig,
}

impl JobLifecycleMonitor {
    pub fn new(config: JobMonitorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JobMonitorConfig {
        &self.config
    }

    /// 截止时间 = 基础超时 + 提交命令中 `sleep` 的秒数
    pub fn deadline_for(&self, submit_command: &str) -> ValidatorResult<Duration> {
        let sleep_seconds = parse_sleep_seconds(submit_command)?;
        self.config
            .base_timeout_seconds
            .checked_add(sleep_seconds)
            .map(Duration::from_secs)
            .ok_or_else(|| ValidatorError::MalformedCommand {
                command: submit_command.to_string(),
                reason: "sleep 时长过大".to_string(),
            })
    }

    /// 提交作业并等待其完成
    pub async fn run_and_await(
        &self,
        executor: &dyn CommandExecutor,
        submit_command: &str,
        user: &JobUser,
    ) -> ValidatorResult<JobReport> {
        let deadline = self.deadline_for(submit_command)?;
        let started = Instant::now();

        let output = executor
            .execute(submit_command)
            .await
            .map_err(|e| ValidatorError::Submission {
                command: submit_command.to_string(),
                message: e.to_string(),
            })?;
        info!(command = %submit_command, "已提交作业: {}", output.trim());

        let job_id = extract_job_id(&output)?;
        let mut job = Job::new(job_id, submit_command.to_string(), deadline);
        let pattern = done_pattern(
            job.id(),
            user.token(&self.config.admin_user),
            &self.config.done_keyword,
        )?;
        let interval = Duration::from_secs(self.config.poll_interval_seconds);
        let mut polls: u32 = 0;

        job.transition(JobState::Polling);
        loop {
            let elapsed = started.elapsed();
            if elapsed >= deadline {
                return self.cancel(executor, &mut job, elapsed).await;
            }

            polls += 1;
            counter!("validator_job_polls_total").increment(1);
            let status = executor.execute(&self.config.status_command).await?;

            if pattern.is_match(&status) {
                job.transition(JobState::Done);
                let elapsed = started.elapsed();
                histogram!("validator_job_duration_seconds").record(elapsed.as_secs_f64());
                info!(
                    job_id = %job.id(),
                    polls,
                    elapsed_secs = elapsed.as_secs(),
                    "作业执行成功"
                );
                return Ok(JobReport {
                    job,
                    polls,
                    elapsed,
                    final_status: status,
                });
            }

            let remaining = deadline.saturating_sub(started.elapsed());
            debug!(
                job_id = %job.id(),
                polls,
                elapsed_secs = started.elapsed().as_secs(),
                "作业尚未完成, 等待下一次轮询"
            );
            sleep(interval.min(remaining)).await;
        }
    }

    async fn cancel(
        &self,
        executor: &dyn CommandExecutor,
        job: &mut Job,
        elapsed: Duration,
    ) -> ValidatorResult<JobReport> {
        let kill_command = self.config.kill_command.replace("{job_id}", job.id());
        warn!(job_id = %job.id(), elapsed_secs = elapsed.as_secs(), "作业超时, 执行: {}", kill_command);

        if let Err(e) = executor.execute(&kill_command).await {
            job.transition(JobState::KillFailed);
            warn!(job_id = %job.id(), error = %e, "终止超时作业失败");
            return Err(e);
        }

        job.transition(JobState::TimedOut);
        counter!("validator_jobs_timed_out_total").increment(1);
        Err(ValidatorError::TimedOut {
            job_id: job.id().to_string(),
            elapsed,
        })
    }
}

/// 取提交输出中第一段连续数字作为作业ID
pub fn extract_job_id(output: &str) -> ValidatorResult<String> {
    let re = Regex::new("[0-9]+").map_err(|e| ValidatorError::config_error(e.to_string()))?;
    re.find(output)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ValidatorError::NoJobId {
            raw: output.to_string(),
        })
}

/// 解析 `sleep` 之后的秒数
pub fn parse_sleep_seconds(command: &str) -> ValidatorResult<u64> {
    let malformed = |reason: &str| ValidatorError::MalformedCommand {
        command: command.to_string(),
        reason: reason.to_string(),
    };

    let (_, rest) = command
        .split_once("sleep")
        .ok_or_else(|| malformed("缺少 sleep 参数"))?;
    let token = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| malformed("sleep 之后没有时长"))?;
    token
        .trim_end_matches(['"', '\'', ';'])
        .parse::<u64>()
        .map_err(|_| malformed("sleep 时长不是整数"))
}

/// 构造终态匹配模式 `\b<id>\s+<user>\s+<keyword>\b`
///
/// `bjobs` 只显示用户名的前 7 个字符，因此 USER 列接受完整用户名或其截断前缀，
/// 不接受前缀相同的其他用户名。
pub fn done_pattern(job_id: &str, user: &str, keyword: &str) -> ValidatorResult<Regex> {
    let user_column = if user.chars().count() > USER_COLUMN_WIDTH {
        let prefix: String = user.chars().take(USER_COLUMN_WIDTH).collect();
        format!("(?:{}|{})", regex::escape(user), regex::escape(&prefix))
    } else {
        regex::escape(user)
    };
    let pattern = format!(
        r"\b{}\s+{}\s+{}\b",
        regex::escape(job_id),
        user_column,
        regex::escape(keyword)
    );
    Regex::new(&pattern).map_err(|e| ValidatorError::config_error(e.to_string()))
}
