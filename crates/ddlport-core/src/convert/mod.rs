//! PostgreSQL 방언 변환.
//!
//! 타입 매핑, 식별자 변환, 제약 변환을 거쳐 구문 트리를 만들고
//! 의존성 순서(create / foreign_key / index / drop)로 직렬화합니다.

pub mod converter;
pub mod graph;
pub mod statement;
pub mod types;

pub use converter::{
    convert_schema, ConversionPlan, ConversionResult, ConverterOptions, DialectConverter,
    TablePlan,
};
pub use graph::DependencyGraph;
pub use statement::{
    AddForeignKey, ColumnDef, CreateIndex, CreateTable, Dialect, PostgresDialect,
    TableConstraint,
};
pub use types::{ColumnType, TypeMap, TypeRule};
