//! # 批量执行器
//!
//! 在有界线程池上并行执行互相独立的任务。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代，结果顺序与输入顺序一致
//! - fail-fast: 任一任务失败后不再启动新任务，已在执行的任务完成后被丢弃
//! - 可选进度条
//!
//! ## 依赖关系
//! - 被 `batch/mod.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{internal_error, AppError};
use crate::utils::progress;

use indicatif::ProgressBar;
use log::info;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// 单个任务结果
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<R> {
    /// 执行成功
    Done(R),
    /// 执行失败
    Failed(AppError),
    /// fail-fast 触发后未启动
    Skipped,
}

/// 批量执行结果，按输入顺序排列
#[derive(Debug)]
pub struct BatchResult<R> {
    pub outcomes: Vec<TaskOutcome<R>>,
    /// 成功数量
    pub success: usize,
    /// 失败数量
    pub failed: usize,
    /// 跳过数量
    pub skipped: usize,
}

impl<R> BatchResult<R> {
    fn from_outcomes(outcomes: Vec<TaskOutcome<R>>) -> Self {
        let mut result = BatchResult {
            outcomes: Vec::with_capacity(outcomes.len()),
            success: 0,
            failed: 0,
            skipped: 0,
        };
        for outcome in outcomes {
            result.merge(outcome);
        }
        result
    }

    /// 合并单个任务结果
    fn merge(&mut self, outcome: TaskOutcome<R>) {
        match &outcome {
            TaskOutcome::Done(_) => self.success += 1,
            TaskOutcome::Failed(_) => self.failed += 1,
            TaskOutcome::Skipped => self.skipped += 1,
        }
        self.outcomes.push(outcome);
    }

    /// 总任务数量
    pub fn total(&self) -> usize {
        self.success + self.failed + self.skipped
    }

    /// 输入顺序中第一个失败的任务
    pub fn first_failure(&self) -> Option<(usize, &AppError)> {
        self.outcomes
            .iter()
            .enumerate()
            .find_map(|(i, o)| match o {
                TaskOutcome::Failed(err) => Some((i, err)),
                _ => None,
            })
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    fail_fast: bool,
    show_progress: bool,
}

impl BatchRunner {
    /// 创建新的批量执行器（0 = CPU 核数）
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            jobs,
            fail_fast: false,
            show_progress: false,
        }
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理输入列表
    ///
    /// 仅当线程池无法创建时返回错误；单个任务的失败记录在结果中。
    pub fn run<T, R, F>(&self, items: &[T], task: F) -> Result<BatchResult<R>, AppError>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> Result<R, AppError> + Sync + Send,
    {
        let total = items.len();
        info!(
            "batch start: {} items, {} jobs, fail_fast = {}",
            total, self.jobs, self.fail_fast
        );

        let pb = if self.show_progress {
            progress::create_progress_bar(total as u64, "Parsing")
        } else {
            ProgressBar::hidden()
        };

        let tripped = AtomicBool::new(false);

        // 配置 rayon 线程池
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| internal_error(format!("failed to build worker pool: {}", e)))?;

        let outcomes: Vec<TaskOutcome<R>> = pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| {
                    if self.fail_fast && tripped.load(Ordering::Acquire) {
                        pb.inc(1);
                        return TaskOutcome::Skipped;
                    }

                    let outcome = match task(index, item) {
                        Ok(value) => TaskOutcome::Done(value),
                        Err(err) => {
                            if self.fail_fast {
                                tripped.store(true, Ordering::Release);
                            }
                            TaskOutcome::Failed(err)
                        }
                    };

                    pb.inc(1);
                    outcome
                })
                .collect()
        });

        pb.finish_and_clear();

        let result = BatchResult::from_outcomes(outcomes);
        info!(
            "batch finished: {} ok, {} failed, {} skipped",
            result.success, result.failed, result.skipped
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn fail(message: &str) -> AppError {
        AppError::new(ErrorCode::ParseError, message)
    }

    #[test]
    fn test_results_keep_input_order() {
        let items: Vec<usize> = (0..64).collect();
        let result = BatchRunner::new(4)
            .run(&items, |_, &n| {
                // 让后面的任务先完成
                std::thread::sleep(std::time::Duration::from_micros((64 - n as u64) * 20));
                Ok(n * 2)
            })
            .unwrap();

        let values: Vec<usize> = result
            .outcomes
            .iter()
            .map(|o| match o {
                TaskOutcome::Done(v) => *v,
                _ => panic!("unexpected outcome"),
            })
            .collect();
        assert_eq!(values, (0..64).map(|n| n * 2).collect::<Vec<_>>());
        assert_eq!(result.total(), 64);
    }

    #[test]
    fn test_failures_are_isolated() {
        let items = vec![1, 2, 3, 4];
        let result = BatchRunner::new(2)
            .run(&items, |_, &n| if n % 2 == 0 { Err(fail("even")) } else { Ok(n) })
            .unwrap();

        assert_eq!(result.success, 2);
        assert_eq!(result.failed, 2);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.first_failure().unwrap().0, 1);
    }

    #[test]
    fn test_fail_fast_skips_remaining_items() {
        let items: Vec<usize> = (0..50).collect();
        let result = BatchRunner::new(1)
            .fail_fast(true)
            .run(&items, |_, &n| if n == 3 { Err(fail("boom")) } else { Ok(n) })
            .unwrap();

        assert_eq!(result.failed, 1);
        assert!(result.skipped > 0);
        assert_eq!(result.total(), 50);
        let (index, err) = result.first_failure().unwrap();
        assert_eq!(index, 3);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn test_zero_jobs_uses_cpu_count() {
        assert!(BatchRunner::new(0).jobs() >= 1);
    }
}
