//! 가역 마이그레이션 생성.
//!
//! 변환 계획을 sqlx 호환 `.up.sql` / `.down.sql` 쌍으로 나눕니다.
//! 테이블 단위가 먼저, 외래키 단위가 나중에 오며 버전 사전순이 곧 실행 순서입니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use ddlport_core::migration::{save_migrations, MigrationEmitter};
//!
//! let units = MigrationEmitter::new().with_base_date("20240101")?.generate(&model)?;
//! save_migrations(&units, Path::new("migrations"), false)?;
//! ```

pub mod emitter;
pub mod models;

pub use emitter::{
    generate_migrations, save_conversion, save_migrations, MigrationEmitter, COMPONENT_FILES,
    DEFAULT_BASE_DATE,
};
pub use models::{MigrationKind, MigrationUnit};
