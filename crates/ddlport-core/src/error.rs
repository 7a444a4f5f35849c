//! 파이프라인 에러 타입 정의.
//!
//! 분석/변환/출력 단계의 에러는 모두 치명적이며, 실행 전체를 중단합니다.
//! 메시지에는 항상 테이블, 컬럼, 타입 등 원인이 된 객체를 포함합니다.

use std::path::PathBuf;

use thiserror::Error;

/// DDL 파싱 에러
#[derive(Debug, Error)]
pub enum ParseError {
    /// 원본 파일 읽기 실패
    #[error("DDL 파일 읽기 실패 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CREATE TABLE 문이 하나도 없음
    #[error("CREATE TABLE 문을 찾을 수 없음: {0}")]
    NoTables(String),

    /// 괄호 불균형
    #[error("괄호 불균형 [{table}]: {snippet}")]
    UnbalancedParens { table: String, snippet: String },

    /// 해석할 수 없는 컬럼/키 정의
    #[error("정의 해석 실패 [{table}]: {snippet}")]
    InvalidDefinition { table: String, snippet: String },

    /// 지원하지 않는 구문 (복합 외래키 등)
    #[error("지원하지 않는 구문 [{table}]: {detail}")]
    Unsupported { table: String, detail: String },

    /// 존재하지 않는 테이블 참조 (ALTER 대상 등)
    #[error("알 수 없는 테이블 '{table}': {context}")]
    UnknownTable { table: String, context: String },

    /// 관계의 양 끝 테이블/컬럼이 모델에 없음
    #[error("관계 무결성 위반: {table}.{column} → {referenced_table}.{referenced_column} ({reason})")]
    DanglingRelationship {
        table: String,
        column: String,
        referenced_table: String,
        referenced_column: String,
        reason: String,
    },
}

/// 방언 변환 에러
#[derive(Debug, Error)]
pub enum ConversionError {
    /// 매핑 테이블에 없는 소스 타입
    #[error("매핑되지 않은 타입: {table}.{column} ({source_type})")]
    UnmappedType {
        table: String,
        column: String,
        source_type: String,
    },

    /// 관계가 가리키는 테이블/컬럼을 변환 모델에서 찾을 수 없음
    #[error("해결되지 않은 관계: {table}.{column} → {referenced_table}")]
    UnresolvedRelationship {
        table: String,
        column: String,
        referenced_table: String,
    },

    /// 명시적 외래키 순환
    #[error("명시적 외래키 순환: {}", .cycle.join(" → "))]
    CyclicForeignKeys { cycle: Vec<String> },

    /// 서로 다른 테이블이 같은 대상 이름으로 변환됨
    #[error("대상 테이블 이름 중복 '{target}': {}", .sources.join(", "))]
    DuplicateTargetName { target: String, sources: Vec<String> },

    /// 기본 정책상 중단하는 제약 (다중 컬럼 UNIQUE 등)
    #[error("지원하지 않는 제약 [{table}]: {detail}")]
    UnsupportedConstraint { table: String, detail: String },
}

/// 마이그레이션/SQL 파일 출력 에러
#[derive(Debug, Error)]
pub enum EmissionError {
    /// 동일한 파일이 이미 존재 (force=false)
    #[error("이미 존재하는 마이그레이션 파일 {} 개: {}", .files.len(), display_paths(.files))]
    AlreadyExists { files: Vec<PathBuf> },

    /// 파일 쓰기 실패 (이번 실행에서 쓴 파일은 정리됨)
    #[error("파일 쓰기 실패 {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 마이그레이션 버전 기준일 형식 오류 (YYYYMMDD)
    #[error("잘못된 마이그레이션 기준일 '{0}' (YYYYMMDD 형식 필요)")]
    InvalidBaseDate(String),

    /// 보고서 직렬화 실패
    #[error("보고서 직렬화 실패: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn display_paths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
