//! 마이그레이션 단위 모델.

use std::fmt;

use serde::Serialize;

/// 마이그레이션 단위 유형 (보고/정렬용, 실행 순서는 파일명이 결정)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationKind {
    /// 테이블 생성 (+ 인덱스)
    Table,
    /// 테이블 간 외래키 제약
    ForeignKey,
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationKind::Table => write!(f, "table"),
            MigrationKind::ForeignKey => write!(f, "foreign_key"),
        }
    }
}

/// 가역 마이그레이션 단위 (`<stem>.up.sql` / `<stem>.down.sql`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationUnit {
    /// 1부터 증가하는 순번
    pub sequence: u32,
    /// 버전 (`{기준일}{순번:06}`)
    pub version: String,
    /// 설명 (`create_products_table`)
    pub description: String,
    pub kind: MigrationKind,
    /// 대상 테이블명
    pub table: String,
    /// 적용 SQL
    pub up: String,
    /// 되돌리기 SQL (up의 정확한 역)
    pub down: String,
}

impl MigrationUnit {
    /// 파일명 stem (`20240101000001_create_products_table`)
    pub fn stem(&self) -> String {
        format!("{}_{}", self.version, self.description)
    }

    /// 적용 파일명
    pub fn up_filename(&self) -> String {
        format!("{}.up.sql", self.stem())
    }

    /// 되돌리기 파일명
    pub fn down_filename(&self) -> String {
        format!("{}.down.sql", self.stem())
    }
}

impl fmt::Display for MigrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.kind, self.stem(), self.table)
    }
}
