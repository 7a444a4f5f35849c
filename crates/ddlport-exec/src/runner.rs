//! 마이그레이션 적용기.
//!
//! 단계들을 순서대로 실행하며, 각 단계는 재시도 데코레이터를 거칩니다.
//! 한 단계가 최종 실패하면 나머지는 실행하지 않고 어디까지 적용되었는지 보고합니다.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::PoolMode;
use crate::connection::ConnectionHandle;
use crate::error::{ExecError, Result};
use crate::executor::{execute_query, metadata, META_OPERATION};
use crate::retry::with_retry_tracked;
use crate::tracking::TrackedOperation;

/// 적용 단계 (마이그레이션 파일 하나)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub name: String,
    pub sql: String,
}

impl MigrationStep {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// 적용 결과
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    /// 성공한 단계 (실행 순서)
    pub applied: Vec<String>,
    /// 최종 실패한 단계
    pub failed_at: Option<String>,
    #[serde(skip)]
    pub error: Option<ExecError>,
    /// 실행하지 않은 단계 수
    pub skipped: usize,
    pub operations: Vec<TrackedOperation>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failed_at.is_none()
    }

    /// 일부만 적용됨
    pub fn is_partial(&self) -> bool {
        self.failed_at.is_some() && !self.applied.is_empty()
    }

    /// 적용 결과 로그 출력
    pub fn log_summary(&self) {
        info!(
            applied = self.applied.len(),
            failed_at = self.failed_at.as_deref().unwrap_or("-"),
            skipped = self.skipped,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "마이그레이션 적용 완료"
        );
    }
}

/// 마이그레이션 적용기
#[derive(Debug)]
pub struct MigrationRunner<'a> {
    handle: &'a ConnectionHandle,
    allow_transaction_pooler: bool,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(handle: &'a ConnectionHandle) -> Self {
        Self {
            handle,
            allow_transaction_pooler: false,
        }
    }

    /// 트랜잭션 풀러에서의 DDL 실행 허용
    pub fn allow_transaction_pooler(mut self, allow: bool) -> Self {
        self.allow_transaction_pooler = allow;
        self
    }

    /// 단계를 순서대로 적용
    ///
    /// 트랜잭션 풀러를 통한 연결이면 허용하지 않은 한 실행 전에 거부합니다.
    pub async fn apply(&self, steps: &[MigrationStep]) -> Result<ApplyReport> {
        let config = self.handle.config();
        let mode = config.pool_mode()?;
        if mode == PoolMode::Transaction && !self.allow_transaction_pooler {
            return Err(ExecError::Config(
                "트랜잭션 풀러로 DDL을 적용할 수 없음: 세션 모드(5432) 또는 직접 연결 사용, \
                 강제하려면 --allow-transaction-pooler"
                    .to_string(),
            ));
        }

        info!(
            connection = %self.handle.name(),
            steps = steps.len(),
            pool_mode = %mode,
            "마이그레이션 적용 시작"
        );

        let started = Instant::now();
        let mut report = ApplyReport {
            applied: Vec::new(),
            failed_at: None,
            error: None,
            skipped: 0,
            operations: Vec::with_capacity(steps.len()),
            elapsed: Duration::ZERO,
        };

        for (i, step) in steps.iter().enumerate() {
            let mut tracked = TrackedOperation::new(step.name.as_str(), config.retry.max_attempts());

            let outcome = with_retry_tracked(&config.retry, &mut tracked, || {
                let meta = metadata([(META_OPERATION, step.name.as_str())]);
                async move {
                    execute_query(self.handle, meta, |conn| async move {
                        conn.execute_batch(&step.sql).await
                    })
                    .await
                    .into_result()
                }
            })
            .await;

            report.operations.push(tracked);

            match outcome {
                Ok((_, stats)) => {
                    info!(
                        step = %step.name,
                        attempts = stats.total_attempts,
                        "단계 적용"
                    );
                    report.applied.push(step.name.clone());
                }
                Err(e) => {
                    error!(step = %step.name, error = %e, "단계 적용 실패, 중단");
                    report.failed_at = Some(step.name.clone());
                    report.error = Some(e);
                    report.skipped = steps.len() - i - 1;
                    break;
                }
            }
        }

        report.elapsed = started.elapsed();
        report.log_summary();
        Ok(report)
    }
}
