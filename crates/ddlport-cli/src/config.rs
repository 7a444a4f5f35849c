//! 파이프라인 설정 (`ddlport.toml`).
//!
//! ```toml
//! [naming.renames]
//! tbl_member = "users"
//!
//! [conversion]
//! allow_composite_unique = false
//!
//! [migrations]
//! base_date = "20240101"
//! ```
//!
//! 데이터베이스 설정은 이 파일이 아니라 환경변수에서 로드합니다 (`ExecConfig::from_env`).

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ddlport_core::{
    ConverterOptions, DialectConverter, MigrationEmitter, SchemaAnalyzer, TableRenamer,
};
use serde::Deserialize;

/// 기본 설정 파일명 (현재 디렉토리)
pub const DEFAULT_CONFIG_FILE: &str = "ddlport.toml";

/// 파이프라인 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub naming: NamingConfig,
    pub conversion: ConversionConfig,
    pub migrations: MigrationsConfig,
    /// 설정을 읽어온 파일 (기본값이면 None)
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

/// 이름 규칙 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    /// 레거시 테이블명 → 대상 테이블명 재정의
    pub renames: BTreeMap<String, String>,
}

/// 변환 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    pub allow_composite_unique: bool,
}

/// 마이그레이션 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationsConfig {
    /// 버전 기준일 (YYYYMMDD)
    pub base_date: Option<String>,
}

impl PipelineConfig {
    /// 설정 로드
    ///
    /// 경로를 지정하면 그 파일이 반드시 있어야 하고, 지정하지 않으면
    /// 현재 디렉토리의 `ddlport.toml`을 (있을 때만) 읽습니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// 파일에서 로드
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("설정 파일 읽기 실패: {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("설정 파일 해석 실패: {}", path.display()))?;
        config.loaded_from = Some(path.to_path_buf());
        tracing::debug!(
            path = %path.display(),
            renames = config.naming.renames.len(),
            "파이프라인 설정 로드"
        );
        Ok(config)
    }

    /// TOML 문자열 해석
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn renamer(&self) -> TableRenamer {
        TableRenamer::new().with_overrides(&self.naming.renames)
    }

    pub fn analyzer(&self) -> SchemaAnalyzer {
        SchemaAnalyzer::with_renamer(self.renamer())
    }

    pub fn converter(&self) -> DialectConverter {
        DialectConverter::new().with_options(ConverterOptions {
            allow_composite_unique: self.conversion.allow_composite_unique,
        })
    }

    /// 기준일이 잘못되면 에러
    pub fn emitter(&self) -> Result<MigrationEmitter> {
        let emitter = MigrationEmitter::with_converter(self.converter());
        match self.migrations.base_date {
            Some(ref date) => Ok(emitter.with_base_date(date)?),
            None => Ok(emitter),
        }
    }
}
