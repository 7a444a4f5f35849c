//! 레거시 MySQL DDL 스키마 분석.
//!
//! DDL 텍스트를 문장 단위로 분리하고, 테이블/컬럼/키/인덱스/관계를 담은
//! 불변 [`SchemaModel`]을 생성합니다. 명시되지 않은 관계는 컬럼 명명 규칙으로
//! 추론하며, 모호한 경우 추론하지 않고 진단으로 보고합니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use ddlport_core::schema::SchemaAnalyzer;
//!
//! let model = SchemaAnalyzer::new().parse_schema_from_file(Path::new("legacy.sql"))?;
//! println!("{}", model.summary());
//! ```

pub mod analyzer;
pub mod inference;
pub mod lexer;
pub mod models;
pub mod report;
pub mod splitter;

pub use analyzer::{parse_schema, parse_schema_from_file, SchemaAnalyzer};
pub use inference::{infer_relationships, InferenceOutcome};
pub use models::*;
pub use report::{AnalysisReport, TableReport};
pub use splitter::split_statements;
