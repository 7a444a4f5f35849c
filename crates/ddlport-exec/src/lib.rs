//! 연결 풀을 거치는 원격 PostgreSQL용 실행 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - 명시적 연결 핸들과 연결별 상태 (최근 에러, 마지막 성공 시각)
//! - 헬스 체크 (연결, prepared statement, stale 여부)
//! - 시간 측정 실행과 폴백 실행
//! - 일시적 에러만 재시도하는 재시도 데코레이터
//! - 풀 모드 감지와 설정 진단
//! - 마이그레이션 단계 적용기
//!
//! # 예제
//!
//! ```rust,ignore
//! use ddlport_exec::{perform_health_check, ConnectionHandle, ExecConfig};
//!
//! let handle = ConnectionHandle::connect(ExecConfig::from_env()?)?;
//! let status = perform_health_check(&handle).await;
//! println!("{}", status);
//! ```

pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod health;
pub mod retry;
pub mod runner;
pub mod tracking;

// 주요 타입 재내보내기
pub use config::{mask_database_url, ExecConfig, PoolMode};
pub use connection::{ConnectionHandle, ErrorRecord, PgConnection, SqlConnection};
pub use diagnostics::{get_diagnostics, Diagnostics, Recommendation, RecommendationLevel};
pub use error::{classify_database_error, ConnectionError, ExecError, PolicyError, Result};
pub use executor::{execute_query, execute_with_fallback, metadata, Performance, QueryResult};
pub use health::{perform_health_check, HealthStatus};
pub use retry::{with_retry, with_retry_tracked, RetryConfig, RetryStats};
pub use runner::{ApplyReport, MigrationRunner, MigrationStep};
pub use tracking::{OperationState, TrackedOperation};
