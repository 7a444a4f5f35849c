//! PostgreSQL 변환 명령어.
//!
//! ```bash
//! ddlport convert legacy.sql --output schema.sql
//! ddlport convert legacy.sql --output schema.sql --components-dir schema/
//! ```

use std::path::Path;

use anyhow::{Context, Result};

use super::{load_model, Outcome};
use crate::config::PipelineConfig;

/// 변환 실행
pub fn run(
    pipeline: &PipelineConfig,
    source: &Path,
    output: &Path,
    components_dir: Option<&Path>,
) -> Result<Outcome> {
    println!("\n🔄 PostgreSQL 변환 시작: {}\n", source.display());

    let model = load_model(pipeline, source)?;
    let result = pipeline
        .converter()
        .convert(&model)
        .context("변환 실패")?;

    println!("📋 생성 순서: {}", result.table_order.join(" → "));
    println!(
        "   CREATE {} 개, FOREIGN KEY {} 개, INDEX {} 개",
        result.create.len(),
        result.foreign_key.len(),
        result.index.len()
    );

    if !result.diagnostics.is_empty() {
        println!("\n🔍 변환 진단 {} 건", result.diagnostics.len());
        for diag in &result.diagnostics {
            println!("{}", diag);
        }
    }

    let written = ddlport_core::save_conversion(&result, output, components_dir)
        .context("변환 결과 저장 실패")?;

    println!();
    for path in &written {
        println!("📄 {}", path.display());
    }
    println!("\n✅ 변환 완료: 파일 {} 개", written.len());
    Ok(Outcome::Success)
}
