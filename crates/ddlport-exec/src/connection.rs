//! 연결 추상화와 연결 핸들.
//!
//! 전역 기본 연결은 없습니다. 호출자는 항상 [`ConnectionHandle`]을 명시적으로
//! 만들어 전달하며, 핸들의 상태는 비동기 뮤텍스로 보호되어 같은 연결에 대한
//! 헬스 체크와 실행이 순서대로 처리됩니다.

use std::{collections::VecDeque, str::FromStr, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::ExecConfig;
use crate::error::{ExecError, Result};
use crate::health::HealthStatus;

/// SQL 실행 추상화
///
/// 실제 구현은 [`PgConnection`]이며, 테스트에서는 목 구현으로 대체합니다.
#[async_trait]
pub trait SqlConnection: Send + Sync {
    /// 단순 프로토콜로 `SELECT 1` 실행 (연결 확인)
    async fn ping(&self) -> Result<()>;

    /// 바인딩 파라미터를 사용하는 쿼리 실행 (prepared statement 확인)
    async fn probe_prepared(&self) -> Result<()>;

    /// 여러 문장을 단순 프로토콜로 실행하고 영향받은 행 수 반환
    async fn execute_batch(&self, sql: &str) -> Result<u64>;
}

/// sqlx 기반 PostgreSQL 연결
#[derive(Debug, Clone)]
pub struct PgConnection {
    pool: PgPool,
}

impl PgConnection {
    /// 지연 연결 풀 생성 (첫 사용 시 연결)
    ///
    /// 트랜잭션 풀 모드에서는 statement 캐시를 0으로 둡니다.
    pub fn connect_lazy(config: &ExecConfig) -> Result<Self> {
        let mode = config.pool_mode()?;
        let options = PgConnectOptions::from_str(config.database_url.expose_secret())
            .map_err(|e| ExecError::Config(format!("DATABASE_URL 해석 실패: {}", e)))?
            .statement_cache_capacity(config.statement_cache_capacity()?);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        info!(
            connection = %config.name,
            database_url = %config.masked_url(),
            pool_mode = %mode,
            max_connections = config.max_connections,
            "연결 풀 생성"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SqlConnection for PgConnection {
    async fn ping(&self) -> Result<()> {
        sqlx::raw_sql("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn probe_prepared(&self) -> Result<()> {
        let value: i32 = sqlx::query_scalar("SELECT $1::int4")
            .bind(1_i32)
            .fetch_one(&self.pool)
            .await?;
        if value != 1 {
            return Err(ExecError::permanent(format!(
                "prepared statement 확인 값 불일치: {}",
                value
            )));
        }
        Ok(())
    }

    async fn execute_batch(&self, sql: &str) -> Result<u64> {
        let result = sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// 최근 에러 기록
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub at: DateTime<Utc>,
    /// 실패한 작업 (`ping`, `probe_prepared`, 메타데이터의 operation 등)
    pub operation: String,
    pub code: Option<String>,
    pub message: String,
    pub transient: bool,
}

impl ErrorRecord {
    pub fn new(operation: &str, error: &ExecError) -> Self {
        Self {
            at: Utc::now(),
            operation: operation.to_string(),
            code: error.code().map(str::to_string),
            message: error.to_string(),
            transient: error.is_retryable(),
        }
    }
}

/// 연결별 가변 상태
#[derive(Debug)]
pub(crate) struct ConnectionState {
    /// 마지막 성공 시각 (단조 시계, 표시용 시각)
    pub(crate) last_success: Option<(Instant, DateTime<Utc>)>,
    pub(crate) recent_errors: VecDeque<ErrorRecord>,
    pub(crate) last_health: Option<HealthStatus>,
    capacity: usize,
}

impl ConnectionState {
    fn new(capacity: usize) -> Self {
        Self {
            last_success: None,
            recent_errors: VecDeque::with_capacity(capacity),
            last_health: None,
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.last_success = Some((Instant::now(), Utc::now()));
    }

    /// 에러 기록 (용량 초과 시 가장 오래된 항목 제거)
    pub(crate) fn record_error(&mut self, operation: &str, error: &ExecError) {
        if self.recent_errors.len() >= self.capacity {
            self.recent_errors.pop_front();
        }
        self.recent_errors.push_back(ErrorRecord::new(operation, error));
    }
}

/// 명시적 연결 핸들
pub struct ConnectionHandle {
    config: ExecConfig,
    connection: Arc<dyn SqlConnection>,
    state: Mutex<ConnectionState>,
}

impl ConnectionHandle {
    /// 임의의 연결 구현으로 핸들 생성
    pub fn new(config: ExecConfig, connection: Arc<dyn SqlConnection>) -> Self {
        let state = ConnectionState::new(config.error_history);
        Self {
            config,
            connection,
            state: Mutex::new(state),
        }
    }

    /// PostgreSQL 지연 연결 풀로 핸들 생성
    pub fn connect(config: ExecConfig) -> Result<Self> {
        let connection = PgConnection::connect_lazy(&config)?;
        Ok(Self::new(config, Arc::new(connection)))
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// 작업 클로저에 넘길 연결
    pub fn connection(&self) -> Arc<dyn SqlConnection> {
        Arc::clone(&self.connection)
    }

    pub(crate) async fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        let guard = self.state.lock().await;
        debug!(connection = %self.config.name, "연결 상태 잠금 획득");
        guard
    }

    /// 최근 에러 (오래된 순)
    pub async fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.state.lock().await.recent_errors.iter().cloned().collect()
    }

    /// 마지막 성공 시각
    pub async fn last_success(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_success.map(|(_, at)| at)
    }

    /// 마지막 헬스 체크 결과
    pub async fn last_health(&self) -> Option<HealthStatus> {
        self.state.lock().await.last_health.clone()
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("name", &self.config.name)
            .field("database_url", &self.config.masked_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_ring_buffer_is_bounded() {
        let mut state = ConnectionState::new(3);
        for i in 0..5 {
            state.record_error("ping", &ExecError::transient(format!("실패 {}", i)));
        }

        assert_eq!(state.recent_errors.len(), 3);
        assert!(state.recent_errors[0].message.contains("실패 2"));
        assert!(state.recent_errors[2].message.contains("실패 4"));
        assert!(state.recent_errors.iter().all(|e| e.transient));
    }
}
