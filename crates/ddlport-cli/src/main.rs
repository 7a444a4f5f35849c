//! ddlport CLI: 레거시 MySQL DDL → PostgreSQL 마이그레이션 도구.
//!
//! # 사용 예시
//!
//! ```bash
//! # 스키마 분석 (모호한 참조가 있으면 종료 코드 2)
//! ddlport analyze legacy.sql --report analysis.json
//!
//! # 단일 SQL 파일 + 컴포넌트 파일로 변환
//! ddlport convert legacy.sql --output schema.sql --components-dir schema
//!
//! # 가역 마이그레이션 생성
//! ddlport generate-migrations legacy.sql --output migrations
//!
//! # 연결 확인 및 진단
//! ddlport health-check --db-url "postgres://..."
//! ddlport diagnose
//!
//! # 마이그레이션 적용
//! ddlport apply legacy.sql
//! ```
//!
//! 종료 코드: `0` 성공, `1` 실패, `2` 일부만 완료.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{connection::ConnectionOptions, migrations::ApplyOptions, Outcome};
use config::PipelineConfig;

#[derive(Parser)]
#[command(name = "ddlport")]
#[command(about = "Legacy MySQL DDL → PostgreSQL migration pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// 파이프라인 설정 파일 (기본: 현재 디렉토리의 ddlport.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// 스키마 분석 및 관계 추론
    Analyze {
        /// MySQL DDL 파일
        source: PathBuf,

        /// JSON 보고서 저장 경로
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// PostgreSQL DDL로 변환
    Convert {
        /// MySQL DDL 파일
        source: PathBuf,

        /// 단일 SQL 출력 파일
        #[arg(short, long, default_value = "schema.sql")]
        output: PathBuf,

        /// 컴포넌트 파일 디렉토리 (create_tables / foreign_keys / indexes / drop_tables)
        #[arg(long)]
        components_dir: Option<PathBuf>,
    },

    /// 가역 마이그레이션 파일 생성
    GenerateMigrations {
        /// MySQL DDL 파일
        source: PathBuf,

        /// 출력 디렉토리
        #[arg(short, long, default_value = "migrations")]
        output: PathBuf,

        /// 기존 파일 덮어쓰기
        #[arg(long)]
        force: bool,
    },

    /// 연결 헬스 체크
    #[command(alias = "test-connection")]
    HealthCheck {
        /// 데이터베이스 URL (기본: DATABASE_URL 환경변수)
        #[arg(long)]
        db_url: Option<String>,

        /// 연결 이름 (로그 표시용)
        #[arg(long)]
        name: Option<String>,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 연결 설정 진단
    Diagnose {
        /// 데이터베이스 URL (기본: DATABASE_URL 환경변수)
        #[arg(long)]
        db_url: Option<String>,

        /// 헬스 체크 없이 설정만 진단
        #[arg(long)]
        offline: bool,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 생성한 마이그레이션을 데이터베이스에 적용
    Apply {
        /// MySQL DDL 파일
        source: PathBuf,

        /// 데이터베이스 URL (기본: DATABASE_URL 환경변수)
        #[arg(long)]
        db_url: Option<String>,

        /// 트랜잭션 풀러(6543)에서도 적용
        #[arg(long)]
        allow_transaction_pooler: bool,

        /// 실행하지 않고 계획만 출력
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env 파일 로드 (없어도 에러 안남)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // 로깅 초기화 (stdout은 보고서 출력용)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "ddlport_core={},ddlport_exec={},ddlport_cli={}",
                    cli.log_level, cli.log_level, cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "명령 실패");
            eprintln!("\n❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let pipeline = PipelineConfig::load(cli.config.as_deref())?;
    if let Some(ref path) = pipeline.loaded_from {
        tracing::info!(path = %path.display(), "설정 파일 사용");
    }

    match cli.command {
        Commands::Analyze { source, report } => {
            commands::analyze::run(&pipeline, &source, report.as_deref())
        }
        Commands::Convert {
            source,
            output,
            components_dir,
        } => commands::convert::run(&pipeline, &source, &output, components_dir.as_deref()),
        Commands::GenerateMigrations {
            source,
            output,
            force,
        } => commands::migrations::run_generate(&pipeline, &source, &output, force),
        Commands::HealthCheck { db_url, name, json } => {
            commands::connection::run_health_check(ConnectionOptions { db_url, name, json }).await
        }
        Commands::Diagnose {
            db_url,
            offline,
            json,
        } => {
            let options = ConnectionOptions {
                db_url,
                name: None,
                json,
            };
            commands::connection::run_diagnose(options, offline).await
        }
        Commands::Apply {
            source,
            db_url,
            allow_transaction_pooler,
            dry_run,
        } => {
            let options = ApplyOptions {
                db_url,
                allow_transaction_pooler,
                dry_run,
            };
            commands::migrations::run_apply(&pipeline, &source, options).await
        }
    }
}
