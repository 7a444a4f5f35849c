//! 마이그레이션 생성 및 적용 명령어.
//!
//! ```bash
//! # 마이그레이션 파일 생성
//! ddlport generate-migrations legacy.sql --output migrations
//!
//! # 데이터베이스에 적용 (세션 모드 또는 직접 연결)
//! ddlport apply legacy.sql --db-url "postgres://..."
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use ddlport_core::MigrationUnit;
use ddlport_exec::{ApplyReport, ConnectionHandle, MigrationRunner, MigrationStep};

use super::{exec_config, load_model, Outcome};
use crate::config::PipelineConfig;

/// 적용 옵션
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub db_url: Option<String>,
    pub allow_transaction_pooler: bool,
    /// 실행하지 않고 계획만 출력
    pub dry_run: bool,
}

fn generate(pipeline: &PipelineConfig, source: &Path) -> Result<Vec<MigrationUnit>> {
    let model = load_model(pipeline, source)?;
    pipeline
        .emitter()?
        .generate(&model)
        .context("마이그레이션 생성 실패")
}

/// 마이그레이션 파일 생성
pub fn run_generate(
    pipeline: &PipelineConfig,
    source: &Path,
    output: &Path,
    force: bool,
) -> Result<Outcome> {
    println!("\n📦 마이그레이션 생성 시작: {}\n", source.display());

    let units = generate(pipeline, source)?;
    for unit in &units {
        println!("   {}", unit);
    }

    let written = ddlport_core::save_migrations(&units, output, force)
        .context("마이그레이션 저장 실패 (덮어쓰려면 --force)")?;

    println!(
        "\n✅ 마이그레이션 {} 개 생성 ({} 파일): {}",
        units.len(),
        written.len(),
        output.display()
    );
    Ok(Outcome::Success)
}

/// 마이그레이션 적용
pub async fn run_apply(
    pipeline: &PipelineConfig,
    source: &Path,
    options: ApplyOptions,
) -> Result<Outcome> {
    println!("\n🚀 마이그레이션 적용 시작: {}\n", source.display());

    println!("1️⃣ 마이그레이션 생성 중...");
    let units = generate(pipeline, source)?;
    let steps: Vec<MigrationStep> = units
        .iter()
        .map(|u| MigrationStep::new(u.stem(), u.up.as_str()))
        .collect();
    println!("   {} 단계", steps.len());

    if options.dry_run {
        println!("\n📋 적용 계획 (dry-run)");
        for (i, step) in steps.iter().enumerate() {
            println!("   {:02}. {}", i + 1, step.name);
        }
        return Ok(Outcome::Success);
    }

    let config = exec_config(options.db_url, None)?;
    println!("\n2️⃣ 데이터베이스: {}", config.masked_url());

    let handle = ConnectionHandle::connect(config).context("연결 생성 실패")?;
    let report = MigrationRunner::new(&handle)
        .allow_transaction_pooler(options.allow_transaction_pooler)
        .apply(&steps)
        .await
        .context("마이그레이션 적용 거부")?;

    println!("\n3️⃣ 적용 결과");
    print_report(&report);

    match (&report.failed_at, &report.error) {
        (None, _) => {
            println!("\n✅ 마이그레이션 적용 완료!");
            Ok(Outcome::Success)
        }
        (Some(step), error) if report.is_partial() => {
            println!(
                "\n⚠️ {} 단계에서 중단: {} 개 적용됨, {} 개 남음",
                step,
                report.applied.len(),
                report.skipped
            );
            if let Some(hint) = error.as_ref().and_then(|e| e.hint()) {
                println!("   💡 {}", hint);
            }
            Ok(Outcome::Partial)
        }
        (Some(step), error) => {
            let detail = error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "알 수 없는 에러".to_string());
            anyhow::bail!("첫 단계 {} 적용 실패: {}", step, detail)
        }
    }
}

fn print_report(report: &ApplyReport) {
    for name in &report.applied {
        println!("   ✅ {}", name);
    }
    if let Some(ref failed) = report.failed_at {
        let attempts = report
            .operations
            .iter()
            .find(|op| &op.name == failed)
            .map(|op| op.attempts())
            .unwrap_or(0);
        println!("   ❌ {} (시도 {} 회)", failed, attempts);
        if let Some(ref e) = report.error {
            println!("      {}", e);
        }
    }
    println!("   소요 시간: {:.1}s", report.elapsed.as_secs_f64());
}
