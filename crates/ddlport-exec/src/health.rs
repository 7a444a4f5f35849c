//! 연결 헬스 체크.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::connection::{ConnectionHandle, ErrorRecord};
use crate::error::ExecError;

/// 헬스 체크 결과
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub connection_name: String,
    pub checked_at: DateTime<Utc>,
    /// `SELECT 1` 성공 여부
    pub connectivity: bool,
    /// 바인딩 쿼리 성공 여부
    pub prepared_statements: bool,
    /// 마지막 성공이 stale 기준보다 오래됨
    pub stale: bool,
    /// connectivity && prepared_statements && !stale
    pub is_healthy: bool,
    pub latency_ms: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub recent_errors: Vec<ErrorRecord>,
    /// 이번 체크에서 마지막으로 발생한 에러
    #[serde(skip)]
    pub last_error: Option<ExecError>,
}

impl HealthStatus {
    /// 도달은 가능하지만 정상은 아님 (부분 성공)
    pub fn is_degraded(&self) -> bool {
        self.connectivity && !self.is_healthy
    }

    /// 헬스 체크 결과 로그 출력
    pub fn log_summary(&self) {
        if self.is_healthy {
            info!(
                connection = %self.connection_name,
                latency_ms = self.latency_ms,
                "연결 정상"
            );
        } else {
            warn!(
                connection = %self.connection_name,
                connectivity = self.connectivity,
                prepared_statements = self.prepared_statements,
                stale = self.stale,
                recent_errors = self.recent_errors.len(),
                "연결 비정상"
            );
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |ok: bool| if ok { "✅" } else { "❌" };
        writeln!(f, "연결: {} ({})", self.connection_name, self.checked_at.to_rfc3339())?;
        writeln!(f, "  {} 연결 확인 (SELECT 1)", mark(self.connectivity))?;
        writeln!(f, "  {} prepared statement", mark(self.prepared_statements))?;
        writeln!(f, "  {} 최근 성공 이력", mark(!self.stale))?;
        writeln!(f, "  응답 시간: {}ms", self.latency_ms)?;
        if !self.recent_errors.is_empty() {
            writeln!(f, "  최근 에러 {} 건:", self.recent_errors.len())?;
            for e in self.recent_errors.iter().rev().take(5) {
                writeln!(
                    f,
                    "    - [{}] {} {}",
                    e.code.as_deref().unwrap_or("-"),
                    e.operation,
                    e.message
                )?;
            }
        }
        write!(
            f,
            "상태: {}",
            if self.is_healthy { "정상" } else { "비정상" }
        )
    }
}

/// 헬스 체크 수행
///
/// 에러는 반환하지 않고 결과와 연결의 에러 기록에 남깁니다. stale 여부는
/// 이번 체크로 마지막 성공 시각을 갱신하기 전에 판단합니다.
pub async fn perform_health_check(handle: &ConnectionHandle) -> HealthStatus {
    let connection = handle.connection();
    let stale_after = handle.config().stale_after;
    let mut state = handle.lock_state().await;

    let stale = state
        .last_success
        .is_some_and(|(at, _)| at.elapsed() > stale_after);

    let started = Instant::now();
    let mut last_error = None;

    let connectivity = match connection.ping().await {
        Ok(()) => true,
        Err(e) => {
            state.record_error("ping", &e);
            last_error = Some(e);
            false
        }
    };

    let prepared_statements = if connectivity {
        match connection.probe_prepared().await {
            Ok(()) => true,
            Err(e) => {
                state.record_error("probe_prepared", &e);
                last_error = Some(e);
                false
            }
        }
    } else {
        false
    };

    let latency = started.elapsed();
    if connectivity {
        state.record_success();
    }

    let status = HealthStatus {
        connection_name: handle.name().to_string(),
        checked_at: Utc::now(),
        connectivity,
        prepared_statements,
        stale,
        is_healthy: connectivity && prepared_statements && !stale,
        latency_ms: duration_ms(latency),
        last_success: state.last_success.map(|(_, at)| at),
        recent_errors: state.recent_errors.iter().cloned().collect(),
        last_error,
    };

    state.last_health = Some(status.clone());
    status
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
