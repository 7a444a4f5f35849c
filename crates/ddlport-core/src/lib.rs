//! 레거시 MySQL DDL → PostgreSQL 마이그레이션 파이프라인.
//!
//! 이 crate는 다음을 제공합니다:
//! - DDL 분석 및 관계 추론 ([`schema`])
//! - 테이블/컬럼 이름 정규화 ([`naming`])
//! - PostgreSQL 방언 변환 ([`convert`])
//! - 가역 마이그레이션 생성 ([`migration`])
//!
//! 모든 단계는 동기식이며 데이터베이스 연결 없이 동작합니다.
//!
//! # 예제
//!
//! ```rust,ignore
//! use ddlport_core::{convert_schema, generate_migrations, parse_schema_from_file};
//!
//! let model = parse_schema_from_file(Path::new("legacy.sql"))?;
//! let result = convert_schema(&model)?;
//! let units = generate_migrations(&model)?;
//! ```

pub mod convert;
pub mod error;
pub mod migration;
pub mod naming;
pub mod schema;

// 주요 타입 재내보내기
pub use convert::{
    convert_schema, ConversionPlan, ConversionResult, ConverterOptions, Dialect,
    DialectConverter, PostgresDialect, TypeMap,
};
pub use error::{ConversionError, EmissionError, ParseError};
pub use migration::{
    generate_migrations, save_conversion, save_migrations, MigrationEmitter, MigrationKind,
    MigrationUnit,
};
pub use naming::TableRenamer;
pub use schema::{
    parse_schema, parse_schema_from_file, AnalysisReport, Diagnostic, SchemaAnalyzer,
    SchemaModel, SchemaSummary, Severity,
};
