//! 실행 계층 에러 타입 정의.
//!
//! 드라이버 에러는 SQLSTATE 기준으로 일시적/영구적 연결 에러와 정책 위반으로 분류됩니다.
//! 재시도 루프는 [`ExecError::is_retryable`]과 [`ExecError::is_fatal`]만 봅니다.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::tracking::OperationState;

lazy_static! {
    static ref RLS_POLICY: Regex = Regex::new(
        r#"row-level security policy(?: "(?P<policy>[^"]+)")?(?: for table "(?P<table>[^"]+)")?"#
    )
    .expect("valid regex");
}

/// 트랜잭션 풀러에서 prepared statement 충돌 시 안내
pub const PREPARED_STATEMENT_HINT: &str =
    "트랜잭션 풀러(6543)에서는 prepared statement가 유지되지 않음: DB_POOL_MODE=transaction 또는 URL에 pgbouncer=true 지정";

/// 연결/실행 에러 (SQLSTATE 분류)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// 재시도로 회복 가능한 에러 (연결 끊김, 풀 고갈, 직렬화 실패 등)
    #[error("일시적 연결 에러 [{}]: {message}", .code.as_deref().unwrap_or("-"))]
    Transient {
        code: Option<String>,
        message: String,
    },

    /// 재시도해도 같은 결과가 나오는 에러 (인증, 문법, 제약 위반 등)
    #[error("영구 에러 [{}]: {message}", .code.as_deref().unwrap_or("-"))]
    Permanent {
        code: Option<String>,
        message: String,
        hint: Option<String>,
    },
}

/// 행 수준 보안 정책 위반
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("정책 위반 (policy: {}, table: {}): {message}",
    .policy.as_deref().unwrap_or("?"),
    .table.as_deref().unwrap_or("?"))]
pub struct PolicyError {
    pub policy: Option<String>,
    pub table: Option<String>,
    pub message: String,
}

/// 실행 계층 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// 설정 에러 (URL 누락/형식 오류, 허용되지 않는 풀 모드 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 허용되지 않는 작업 상태 전이
    #[error("잘못된 상태 전이: {from} → {to}")]
    InvalidTransition {
        from: OperationState,
        to: OperationState,
    },
}

impl ExecError {
    /// 일시적 에러 생성
    pub fn transient(message: impl Into<String>) -> Self {
        ConnectionError::Transient {
            code: None,
            message: message.into(),
        }
        .into()
    }

    /// 영구 에러 생성
    pub fn permanent(message: impl Into<String>) -> Self {
        ConnectionError::Permanent {
            code: None,
            message: message.into(),
            hint: None,
        }
        .into()
    }

    /// 재시도 가능 여부
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecError::Connection(ConnectionError::Transient { .. }))
    }

    /// 즉시 중단해야 하는 에러 (인증 실패, 정책 위반, 설정 오류)
    pub fn is_fatal(&self) -> bool {
        match self {
            ExecError::Config(_) | ExecError::Policy(_) | ExecError::InvalidTransition { .. } => {
                true
            }
            ExecError::Connection(ConnectionError::Permanent { code, .. }) => {
                code.as_deref().is_some_and(|c| c.starts_with("28"))
            }
            ExecError::Connection(ConnectionError::Transient { .. }) => false,
        }
    }

    /// SQLSTATE 코드
    pub fn code(&self) -> Option<&str> {
        match self {
            ExecError::Connection(ConnectionError::Transient { code, .. })
            | ExecError::Connection(ConnectionError::Permanent { code, .. }) => code.as_deref(),
            ExecError::Policy(_) => Some("42501"),
            _ => None,
        }
    }

    /// 조치 안내
    pub fn hint(&self) -> Option<&str> {
        match self {
            ExecError::Connection(ConnectionError::Permanent { hint, .. }) => hint.as_deref(),
            _ => None,
        }
    }

    /// prepared statement 관련 실패 (풀 모드 불일치 징후)
    pub fn is_prepared_statement_failure(&self) -> bool {
        matches!(self.code(), Some("26000") | Some("42P05"))
    }
}

/// SQLSTATE와 메시지로 에러 분류
pub fn classify_database_error(code: Option<&str>, message: &str) -> ExecError {
    let owned_code = code.map(str::to_string);

    let Some(code) = code else {
        return ConnectionError::Permanent {
            code: None,
            message: message.to_string(),
            hint: None,
        }
        .into();
    };

    let transient = code.starts_with("08")
        || code.starts_with("53")
        || matches!(code, "57P01" | "57P02" | "57P03" | "40001" | "40P01");
    if transient {
        return ConnectionError::Transient {
            code: owned_code,
            message: message.to_string(),
        }
        .into();
    }

    if code == "42501" && message.contains("row-level security policy") {
        let captures = RLS_POLICY.captures(message);
        let group = |name: &str| {
            captures
                .as_ref()
                .and_then(|c| c.name(name))
                .map(|m| m.as_str().to_string())
        };
        return PolicyError {
            policy: group("policy"),
            table: group("table"),
            message: message.to_string(),
        }
        .into();
    }

    let hint = match code {
        "26000" | "42P05" => Some(PREPARED_STATEMENT_HINT.to_string()),
        c if c.starts_with("28") => Some("DATABASE_URL의 사용자/비밀번호 확인".to_string()),
        _ => None,
    };

    ConnectionError::Permanent {
        code: owned_code,
        message: message.to_string(),
        hint,
    }
    .into()
}

impl From<sqlx::Error> for ExecError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => classify_database_error(db.code().as_deref(), db.message()),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed => ExecError::transient(err.to_string()),
            sqlx::Error::Configuration(_) => ExecError::Config(err.to_string()),
            sqlx::Error::Protocol(message) if message.contains("prepared statement") => {
                ConnectionError::Permanent {
                    code: None,
                    message: message.clone(),
                    hint: Some(PREPARED_STATEMENT_HINT.to_string()),
                }
                .into()
            }
            _ => ExecError::permanent(err.to_string()),
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, ExecError>;
