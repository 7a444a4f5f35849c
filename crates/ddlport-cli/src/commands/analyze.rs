//! 스키마 분석 명령어.
//!
//! ```bash
//! ddlport analyze legacy.sql
//! ddlport analyze legacy.sql --report analysis.json
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use ddlport_core::AnalysisReport;

use super::{load_model, Outcome};
use crate::config::PipelineConfig;

/// 분석 실행
///
/// 모호한 참조가 있으면 추측하지 않고 나열한 뒤 `Partial`을 반환합니다.
pub fn run(pipeline: &PipelineConfig, source: &Path, report_path: Option<&Path>) -> Result<Outcome> {
    println!("\n🔍 스키마 분석 시작: {}\n", source.display());

    let model = load_model(pipeline, source)?;
    let report = AnalysisReport::from_model(&source.display().to_string(), &model);
    println!("{}", report);

    if let Some(path) = report_path {
        report
            .save_json(path)
            .with_context(|| format!("보고서 저장 실패: {}", path.display()))?;
        println!("\n📄 보고서 저장: {}", path.display());
    }

    if report.needs_review() {
        println!(
            "\n⚠️ 모호한 참조 {} 건: 관계를 추론하지 않았습니다. 명시적 FOREIGN KEY 또는 이름 재정의로 해결하세요.",
            report.ambiguous_references.len()
        );
        for amb in &report.ambiguous_references {
            println!("   - {}.{}: {}", amb.table, amb.column, amb.candidates.join(", "));
        }
        return Ok(Outcome::Partial);
    }

    println!("\n✅ 분석 완료");
    Ok(Outcome::Success)
}
