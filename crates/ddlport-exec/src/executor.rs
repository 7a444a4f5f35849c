//! 시간 측정 실행과 폴백 실행.
//!
//! [`execute_query`]는 재시도하지 않습니다. 재시도가 필요하면
//! [`crate::retry::with_retry`]로 감싸세요.

use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::connection::{ConnectionHandle, SqlConnection};
use crate::error::ExecError;
use crate::health::duration_ms;
use crate::tracking::{OperationState, TrackedOperation};

/// 메타데이터 키: 작업 이름
pub const META_OPERATION: &str = "operation";
/// 메타데이터 키: 실행 경로 (`primary` | `fallback`)
pub const META_PATH: &str = "path";
/// 메타데이터 키: 주 경로 실패 사유
pub const META_PRIMARY_ERROR: &str = "primary_error";

/// 실행 성능 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Normal,
    Slow,
}

impl Performance {
    /// 기준 시간 초과 시 Slow
    pub fn classify(duration: Duration, threshold: Duration) -> Self {
        if duration > threshold {
            Performance::Slow
        } else {
            Performance::Normal
        }
    }
}

/// 실행 결과
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    pub operation_id: Uuid,
    pub state: OperationState,
    pub value: Option<T>,
    pub error: Option<ExecError>,
    pub duration: Duration,
    pub performance: Performance,
    pub metadata: BTreeMap<String, String>,
    /// 폴백 경로로 얻은 결과
    pub degraded: bool,
}

impl<T> QueryResult<T> {
    pub fn is_success(&self) -> bool {
        self.state == OperationState::Succeeded
    }

    pub fn duration_ms(&self) -> u64 {
        duration_ms(self.duration)
    }

    /// 값 또는 에러로 변환
    pub fn into_result(self) -> Result<T, ExecError> {
        match (self.value, self.error) {
            (Some(value), _) => Ok(value),
            (None, Some(error)) => Err(error),
            (None, None) => Err(ExecError::permanent("결과 없이 종료된 작업")),
        }
    }
}

/// 시간 측정 실행
///
/// 연결 상태 잠금을 잡은 채로 실행합니다. 같은 핸들의 작업은 순서대로 처리됩니다.
/// 에러는 결과에 담기며 연결의 최근 에러 기록에도 남습니다.
pub async fn execute_query<T, F, Fut>(
    handle: &ConnectionHandle,
    metadata: BTreeMap<String, String>,
    operation: F,
) -> QueryResult<T>
where
    F: FnOnce(Arc<dyn SqlConnection>) -> Fut,
    Fut: Future<Output = Result<T, ExecError>>,
{
    let name = metadata
        .get(META_OPERATION)
        .cloned()
        .unwrap_or_else(|| "query".to_string());
    let mut tracked = TrackedOperation::new(name.as_str(), 1);
    let threshold = handle.config().slow_query_threshold;

    let mut state = handle.lock_state().await;
    if let Err(e) = tracked.begin() {
        return failed(&tracked, e, Duration::ZERO, metadata);
    }

    let started = Instant::now();
    let outcome = operation(handle.connection()).await;
    let duration = started.elapsed();
    let performance = Performance::classify(duration, threshold);

    if performance == Performance::Slow {
        warn!(
            connection = %handle.name(),
            operation = %name,
            duration_ms = duration_ms(duration),
            threshold_ms = duration_ms(threshold),
            "느린 쿼리"
        );
    }

    match outcome {
        Ok(value) => {
            state.record_success();
            if let Err(e) = tracked.succeed() {
                warn!(operation = %name, error = %e, "상태 전이 실패");
            }
            debug!(
                connection = %handle.name(),
                operation = %name,
                duration_ms = duration_ms(duration),
                "쿼리 성공"
            );
            QueryResult {
                operation_id: tracked.id,
                state: tracked.state(),
                value: Some(value),
                error: None,
                duration,
                performance,
                metadata,
                degraded: false,
            }
        }
        Err(e) => {
            state.record_error(&name, &e);
            if let Err(transition) = tracked.fail(&e) {
                warn!(operation = %name, error = %transition, "상태 전이 실패");
            }
            warn!(
                connection = %handle.name(),
                operation = %name,
                error = %e,
                "쿼리 실패"
            );
            QueryResult {
                performance,
                ..failed(&tracked, e, duration, metadata)
            }
        }
    }
}

/// 주 경로 실패 시 폴백 실행
///
/// 폴백 결과에는 `path=fallback`, `primary_error=...` 메타데이터와 `degraded=true`가
/// 붙습니다. 폴백까지 실패하면 폴백의 에러를 담은 실패 결과를 반환합니다.
pub async fn execute_with_fallback<T, P, PFut, B, BFut>(
    handle: &ConnectionHandle,
    metadata: BTreeMap<String, String>,
    primary: P,
    fallback: B,
) -> QueryResult<T>
where
    P: FnOnce(Arc<dyn SqlConnection>) -> PFut,
    PFut: Future<Output = Result<T, ExecError>>,
    B: FnOnce(Arc<dyn SqlConnection>) -> BFut,
    BFut: Future<Output = Result<T, ExecError>>,
{
    let mut primary_meta = metadata.clone();
    primary_meta.insert(META_PATH.to_string(), "primary".to_string());

    let first = execute_query(handle, primary_meta, primary).await;
    if first.is_success() {
        return first;
    }

    let primary_error = first
        .error
        .as_ref()
        .map(|e| e.to_string())
        .unwrap_or_default();
    warn!(
        connection = %handle.name(),
        primary_error = %primary_error,
        "주 경로 실패, 폴백 실행"
    );

    let mut fallback_meta = metadata;
    fallback_meta.insert(META_PATH.to_string(), "fallback".to_string());
    fallback_meta.insert(META_PRIMARY_ERROR.to_string(), primary_error);

    let mut result = execute_query(handle, fallback_meta, fallback).await;
    result.degraded = true;
    result.duration += first.duration;
    result
}

/// 메타데이터 생성 헬퍼
pub fn metadata<I, K, V>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn failed<T>(
    tracked: &TrackedOperation,
    error: ExecError,
    duration: Duration,
    metadata: BTreeMap<String, String>,
) -> QueryResult<T> {
    QueryResult {
        operation_id: tracked.id,
        state: OperationState::Failed,
        value: None,
        error: Some(error),
        duration,
        performance: Performance::Normal,
        metadata,
        degraded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_threshold() {
        let threshold = Duration::from_millis(1000);
        assert_eq!(
            Performance::classify(Duration::from_millis(50), threshold),
            Performance::Normal
        );
        assert_eq!(
            Performance::classify(Duration::from_millis(1000), threshold),
            Performance::Normal
        );
        assert_eq!(
            Performance::classify(Duration::from_millis(1200), threshold),
            Performance::Slow
        );
    }

    #[test]
    fn test_into_result() {
        let ok = QueryResult {
            operation_id: Uuid::new_v4(),
            state: OperationState::Succeeded,
            value: Some(7),
            error: None,
            duration: Duration::ZERO,
            performance: Performance::Normal,
            metadata: BTreeMap::new(),
            degraded: false,
        };
        assert_eq!(ok.into_result().unwrap(), 7);

        let tracked = TrackedOperation::new("x", 1);
        let err: QueryResult<i32> =
            failed(&tracked, ExecError::transient("reset"), Duration::ZERO, BTreeMap::new());
        assert!(err.into_result().unwrap_err().is_retryable());
    }
}
