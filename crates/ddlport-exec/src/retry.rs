//! 데이터베이스 작업 재시도 유틸리티.
//!
//! 연결 끊김, 풀 고갈, 직렬화 실패 등 일시적인 오류에 대해서만 재시도합니다.
//! 재시도는 호출한 태스크 안에서 순차적으로 수행되며, 횟수는 항상 제한됩니다.
//!
//! # 예시
//!
//! ```rust,ignore
//! use ddlport_exec::retry::{with_retry, RetryConfig};
//!
//! let config = RetryConfig::default();
//! let rows = with_retry(&config, || async {
//!     conn.execute_batch("SELECT 1").await
//! }).await?;
//! ```

use std::{future::Future, time::Duration};

use rand::Rng;
use tracing::{debug, warn};

use crate::error::ExecError;
use crate::tracking::TrackedOperation;

/// 재시도 설정.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 재시도 횟수 (초기 시도 제외).
    pub max_retries: u32,
    /// 기본 대기 시간.
    pub base_delay: Duration,
    /// 최대 대기 시간.
    pub max_delay: Duration,
    /// 백오프 배수.
    pub backoff_multiplier: f64,
    /// 재시도 시 지터(무작위 지연) 추가 여부.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// 빠른 재시도 설정 (짧은 지연, 적은 재시도).
    pub fn fast() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            ..Default::default()
        }
    }

    /// 재시도 없음 (단일 시도).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// 초기 시도를 포함한 최대 실행 횟수.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// 대기 시간 계산 (지수 백오프, 상한, ±25% 지터).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        // 상한은 f64 단계에서 적용 (무한대/음수/NaN도 [0, max_delay]로)
        let attempt = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt);
        let delay = Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()).max(0.0));

        if self.add_jitter {
            let jitter_range = delay.as_millis() as f64 * 0.25;
            let jitter = rand::thread_rng().gen_range(-1.0..=1.0) * jitter_range;
            Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
        } else {
            delay
        }
    }
}

/// 재시도 결과 통계.
#[derive(Debug, Clone)]
pub struct RetryStats {
    /// 총 시도 횟수.
    pub total_attempts: u32,
    /// 총 대기 시간.
    pub total_delay: Duration,
}

/// 재시도가 포함된 비동기 작업 실행.
///
/// # Returns
/// * `Ok(T)` - 작업 성공 결과
/// * `Err(ExecError)` - 재시도 불가능한 에러 또는 모든 재시도 실패 후 마지막 에러
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, ExecError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ExecError>>,
{
    let mut tracked = TrackedOperation::new("retry", config.max_attempts());
    with_retry_tracked(config, &mut tracked, operation)
        .await
        .map(|(value, _)| value)
}

/// 재시도가 포함된 비동기 작업 실행 (상태 추적 포함).
///
/// 매 시도마다 `tracked`를 `Pending → Executing → Succeeded | Failed`로 전이시키고,
/// 재시도 전에는 `Failed → Pending`으로 되돌립니다.
pub async fn with_retry_tracked<T, F, Fut>(
    config: &RetryConfig,
    tracked: &mut TrackedOperation,
    operation: F,
) -> Result<(T, RetryStats), ExecError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ExecError>>,
{
    let mut attempt = 0;
    let mut total_delay = Duration::ZERO;

    loop {
        tracked.begin()?;

        match operation().await {
            Ok(result) => {
                tracked.succeed()?;
                if attempt > 0 {
                    debug!(
                        operation = %tracked.name,
                        attempts = attempt + 1,
                        total_delay_ms = total_delay.as_millis(),
                        "재시도 후 성공"
                    );
                }
                let stats = RetryStats {
                    total_attempts: attempt + 1,
                    total_delay,
                };
                return Ok((result, stats));
            }
            Err(e) => {
                tracked.fail(&e)?;

                // 치명적 에러는 재시도하지 않음
                if e.is_fatal() {
                    warn!(
                        operation = %tracked.name,
                        error = %e,
                        "치명적 에러 발생, 재시도 없이 실패 반환"
                    );
                    return Err(e);
                }

                // 재시도 가능한 에러가 아니면 즉시 실패
                if !e.is_retryable() {
                    debug!(
                        operation = %tracked.name,
                        error = %e,
                        "재시도 불가능한 에러, 즉시 실패 반환"
                    );
                    return Err(e);
                }

                // 최대 재시도 횟수 초과
                if attempt >= config.max_retries || !tracked.can_retry() {
                    warn!(
                        operation = %tracked.name,
                        error = %e,
                        attempts = attempt + 1,
                        max_retries = config.max_retries,
                        "최대 재시도 횟수 초과"
                    );
                    return Err(e);
                }

                let delay = config.calculate_delay(attempt);
                total_delay += delay;

                warn!(
                    operation = %tracked.name,
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis(),
                    "재시도 대기 중"
                );

                tokio::time::sleep(delay).await;
                tracked.retry()?;
                attempt += 1;
            }
        }
    }
}
