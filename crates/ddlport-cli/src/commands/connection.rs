//! 연결 확인 명령어.
//!
//! ```bash
//! # 헬스 체크 (일시적 에러는 재시도)
//! ddlport health-check --db-url "postgres://..."
//! ddlport test-connection --name supabase
//!
//! # 설정 진단 및 권장 사항
//! ddlport diagnose
//! ```

use anyhow::{Context, Result};
use ddlport_exec::{
    get_diagnostics, perform_health_check, with_retry, ConnectionHandle, HealthStatus,
    RecommendationLevel,
};
use serde::Serialize;

use super::{exec_config, Outcome};

/// 연결 명령 옵션
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    pub db_url: Option<String>,
    pub name: Option<String>,
    /// JSON으로 출력
    pub json: bool,
}

fn print_output<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// 헬스 체크
///
/// 연결 자체가 실패하면 재시도 설정에 따라 다시 시도합니다. 연결은 되지만
/// prepared statement 확인이 실패하거나 stale이면 `Partial`입니다.
pub async fn run_health_check(options: ConnectionOptions) -> Result<Outcome> {
    let config = exec_config(options.db_url, options.name)?;
    let retry = config.retry.clone();
    if !options.json {
        println!("\n🩺 연결 확인: {} ({})\n", config.name, config.masked_url());
    }

    let handle = ConnectionHandle::connect(config).context("연결 생성 실패")?;
    let handle = &handle;

    let result = with_retry(&retry, || async move {
        let status = perform_health_check(handle).await;
        match status.last_error.clone() {
            Some(e) if !status.connectivity => Err(e),
            _ => Ok(status),
        }
    })
    .await;

    match result {
        Ok(status) => {
            status.log_summary();
            print_output(&status, options.json)?;
            if status.is_healthy {
                Ok(Outcome::Success)
            } else {
                print_hint(&status);
                Ok(Outcome::Partial)
            }
        }
        Err(e) => {
            if let Some(status) = handle.last_health().await {
                print_output(&status, options.json)?;
            }
            if let Some(hint) = e.hint() {
                eprintln!("💡 {}", hint);
            }
            Err(anyhow::Error::new(e).context("데이터베이스에 연결할 수 없음"))
        }
    }
}

fn print_hint(status: &HealthStatus) {
    if let Some(hint) = status.last_error.as_ref().and_then(|e| e.hint()) {
        eprintln!("💡 {}", hint);
    } else if status.stale {
        eprintln!("💡 마지막 성공 이후 오래 지났습니다. 다시 실행해 상태를 확인하세요.");
    }
}

/// 설정 진단
///
/// `offline`이면 헬스 체크 없이 설정만 진단합니다.
/// 치명적 권장 사항이 있으면 `Partial`입니다.
pub async fn run_diagnose(options: ConnectionOptions, offline: bool) -> Result<Outcome> {
    let config = exec_config(options.db_url, options.name)?;
    let handle = ConnectionHandle::connect(config).context("연결 생성 실패")?;

    if !offline {
        perform_health_check(&handle).await.log_summary();
    }

    let diagnostics = get_diagnostics(&handle).await;
    print_output(&diagnostics, options.json)?;

    match diagnostics.max_level() {
        Some(RecommendationLevel::Critical) => Ok(Outcome::Partial),
        _ => Ok(Outcome::Success),
    }
}
