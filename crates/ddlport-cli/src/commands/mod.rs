//! CLI 명령어 구현.

pub mod analyze;
pub mod connection;
pub mod convert;
pub mod migrations;

use std::{path::Path, process::ExitCode};

use anyhow::{Context, Result};
use ddlport_core::SchemaModel;
use ddlport_exec::ExecConfig;

use crate::config::PipelineConfig;

/// 명령 실행 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// 일부만 완료 (모호한 참조, 연결은 되지만 비정상, 중간에 멈춘 적용)
    Partial,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Partial => ExitCode::from(2),
        }
    }
}

/// 소스 DDL 분석
pub(crate) fn load_model(pipeline: &PipelineConfig, source: &Path) -> Result<SchemaModel> {
    pipeline
        .analyzer()
        .parse_schema_from_file(source)
        .with_context(|| format!("스키마 분석 실패: {}", source.display()))
}

/// 연결 설정 (`--db-url`이 없으면 DATABASE_URL)
pub(crate) fn exec_config(db_url: Option<String>, name: Option<String>) -> Result<ExecConfig> {
    let config = match db_url {
        Some(url) => ExecConfig::from_env_with_url(url),
        None => ExecConfig::from_env(),
    }
    .context("데이터베이스 설정 로드 실패 (--db-url 또는 DATABASE_URL 필요)")?;

    Ok(match name {
        Some(name) => config.with_name(name),
        None => config,
    })
}
