//! 스키마 분석을 위한 데이터 모델.

use std::fmt;

use serde::Serialize;

/// SQL 문장 유형
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatementType {
    /// CREATE TABLE
    CreateTable,
    /// ALTER TABLE
    AlterTable,
    /// CREATE [UNIQUE] INDEX
    CreateIndex,
    /// DROP TABLE
    DropTable,
    /// INSERT INTO (덤프 데이터, 스키마에는 무시)
    Insert,
    /// SET ... (덤프 세션 설정)
    Set,
    /// 기타 문장
    Other(String),
}

/// 분리된 SQL 문장
#[derive(Debug, Clone)]
pub struct SqlStatement {
    /// 문장 유형
    pub statement_type: StatementType,
    /// 대상 객체 이름 (테이블명, 인덱스명 등)
    pub object_name: String,
    /// 주석이 제거된 SQL
    pub raw_sql: String,
    /// 원본 내 시작 라인 번호 (1-based)
    pub line_number: usize,
}

impl SqlStatement {
    /// 새 SQL 문장 생성
    pub fn new(
        statement_type: StatementType,
        object_name: String,
        raw_sql: String,
        line_number: usize,
    ) -> Self {
        Self {
            statement_type,
            object_name,
            raw_sql,
            line_number,
        }
    }
}

/// 컬럼 기본값
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// DEFAULT NULL
    Null,
    /// 따옴표 문자열 리터럴 (따옴표 제거된 값)
    Text(String),
    /// 숫자 리터럴
    Number(String),
    /// CURRENT_TIMESTAMP / NOW()
    CurrentTimestamp,
    /// 그 외 표현식 (원문 유지)
    Expression(String),
}

impl DefaultValue {
    /// 원문 기본값 토큰에서 생성
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        let upper = trimmed.to_uppercase();

        if upper == "NULL" {
            return Self::Null;
        }
        if matches!(
            upper.as_str(),
            "CURRENT_TIMESTAMP" | "CURRENT_TIMESTAMP()" | "NOW()" | "LOCALTIMESTAMP"
        ) {
            return Self::CurrentTimestamp;
        }
        if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
            let inner = &trimmed[1..trimmed.len() - 1];
            return Self::Text(inner.replace("''", "'").replace("\\'", "'"));
        }
        if trimmed.parse::<f64>().is_ok() {
            return Self::Number(trimmed.to_string());
        }
        Self::Expression(trimmed.to_string())
    }
}

/// 테이블 컬럼
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// 컬럼명 (백틱 제거)
    pub name: String,
    /// 원본 타입 문자열 (예: `VARCHAR(255)`, `INT(11) UNSIGNED`)
    pub source_type: String,
    /// NULL 허용 여부
    pub nullable: bool,
    /// 기본값
    pub default: Option<DefaultValue>,
    /// AUTO_INCREMENT 여부
    pub auto_increment: bool,
    /// 선언 순서 (1-based)
    pub ordinal: usize,
    /// 인라인 UNIQUE 여부
    pub unique: bool,
    /// ON UPDATE CURRENT_TIMESTAMP 여부
    pub on_update_current_timestamp: bool,
    /// 컬럼 주석
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    /// 소문자 기본 타입명 (괄호 인자 제외)
    pub fn base_type(&self) -> String {
        self.source_type
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or("")
            .to_lowercase()
    }
}

/// 타임스탬프 컬럼 지원 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSupport {
    /// 생성/수정 시각 컬럼 없음
    None,
    /// 단일 레거시 날짜 컬럼 (date_added 등) 또는 한쪽만 존재
    Partial,
    /// 생성/수정 시각 컬럼 모두 존재
    Full,
}

/// 인덱스
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    /// 소유 테이블 (원본 이름)
    pub table: String,
    /// 원본 인덱스명
    pub name: String,
    /// 인덱스 컬럼 (순서 유지)
    pub columns: Vec<String>,
    /// UNIQUE 여부
    pub unique: bool,
}

/// 외래키 참조 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    /// `ON DELETE` 뒤의 키워드에서 파싱
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            "RESTRICT" => Some(Self::Restrict),
            "NO ACTION" => Some(Self::NoAction),
            _ => None,
        }
    }

    /// SQL 키워드
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }
}

/// 관계 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipOrigin {
    /// `FOREIGN KEY ... REFERENCES` 절에서 파싱
    Explicit,
    /// 컬럼 명명 규칙에서 추론
    Implied,
}

impl fmt::Display for RelationshipOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipOrigin::Explicit => write!(f, "explicit"),
            RelationshipOrigin::Implied => write!(f, "implied"),
        }
    }
}

/// 테이블 간 다대일 관계
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// 외래키를 가진 테이블
    pub table: String,
    /// 외래키 컬럼
    pub column: String,
    /// 참조 대상 테이블
    pub referenced_table: String,
    /// 참조 대상 컬럼
    pub referenced_column: String,
    /// 관계 출처
    pub origin: RelationshipOrigin,
    /// 원본 제약 이름
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

impl Relationship {
    /// 자기 자신을 참조하는 관계인지 확인
    pub fn is_self_referential(&self) -> bool {
        self.table.eq_ignore_ascii_case(&self.referenced_table)
    }
}

/// 여러 후보 테이블과 동일하게 매칭되어 추론하지 않은 컬럼
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousReference {
    pub table: String,
    pub column: String,
    /// 동점 후보 테이블 목록
    pub candidates: Vec<String>,
}

/// 테이블
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// 원본 테이블명
    pub name: String,
    /// 대상 테이블명 (이름 변환 규칙 적용)
    pub target_name: String,
    /// 컬럼 (선언 순서 유지)
    pub columns: Vec<Column>,
    /// 기본키 컬럼 (복합키 순서 유지)
    pub primary_key: Vec<String>,
    /// AUTO_INCREMENT 컬럼
    pub auto_increment: Option<String>,
    /// 타임스탬프 지원 수준
    pub timestamps: TimestampSupport,
    /// 인덱스
    pub indexes: Vec<Index>,
    /// 테이블 주석
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Table {
    /// 컬럼 조회 (대소문자 무시)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// 생성/수정 타임스탬프를 모두 가지는지 확인
    pub fn has_timestamps(&self) -> bool {
        self.timestamps == TimestampSupport::Full
    }

    /// 단일 컬럼 기본키
    pub fn single_primary_key(&self) -> Option<&str> {
        match self.primary_key.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

/// 진단 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// 정보 (권장사항)
    Info,
    /// 경고 (검토 필요)
    Warning,
    /// 에러 (수정 필수)
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// 분석/변환 진단 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 심각도
    pub severity: Severity,
    /// 진단 코드
    pub code: String,
    /// 설명
    pub message: String,
    /// 관련 테이블
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// 관련 컬럼
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// 권장 해결 방법
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// 새 진단 생성
    pub fn new(severity: Severity, code: &str, message: &str) -> Self {
        Self {
            severity,
            code: code.to_string(),
            message: message.to_string(),
            table: None,
            column: None,
            suggestion: None,
        }
    }

    /// 테이블 정보 추가
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// 컬럼 정보 추가
    pub fn with_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    /// 해결 방법 추가
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)?;

        match (&self.table, &self.column) {
            (Some(table), Some(column)) => write!(f, "\n  위치: {}.{}", table, column)?,
            (Some(table), None) => write!(f, "\n  위치: {}", table)?,
            _ => {}
        }

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  해결: {}", suggestion)?;
        }

        Ok(())
    }
}

/// 스키마 요약 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
    pub total_tables: usize,
    pub total_columns: usize,
    pub total_relationships: usize,
    pub explicit_relationships: usize,
    pub implied_relationships: usize,
    pub ambiguous_references: usize,
    pub total_indexes: usize,
    pub tables_with_timestamps: usize,
    pub tables_with_auto_increment: usize,
}

impl SchemaSummary {
    /// 완성된 모델을 한 번 순회하여 계산
    pub fn compute(
        tables: &[Table],
        relationships: &[Relationship],
        ambiguous: &[AmbiguousReference],
    ) -> Self {
        let mut summary = Self {
            total_tables: tables.len(),
            total_relationships: relationships.len(),
            ambiguous_references: ambiguous.len(),
            ..Default::default()
        };

        for table in tables {
            summary.total_columns += table.columns.len();
            summary.total_indexes += table.indexes.len();
            if table.has_timestamps() {
                summary.tables_with_timestamps += 1;
            }
            if table.auto_increment.is_some() {
                summary.tables_with_auto_increment += 1;
            }
        }

        for rel in relationships {
            match rel.origin {
                RelationshipOrigin::Explicit => summary.explicit_relationships += 1,
                RelationshipOrigin::Implied => summary.implied_relationships += 1,
            }
        }

        summary
    }

    /// 요약 로그 출력
    pub fn log_summary(&self, source: &str) {
        tracing::info!(
            source = source,
            tables = self.total_tables,
            columns = self.total_columns,
            relationships = self.total_relationships,
            explicit = self.explicit_relationships,
            implied = self.implied_relationships,
            ambiguous = self.ambiguous_references,
            indexes = self.total_indexes,
            timestamps = self.tables_with_timestamps,
            auto_increment = self.tables_with_auto_increment,
            "스키마 분석 완료"
        );
    }
}

impl fmt::Display for SchemaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 요약")?;
        writeln!(f, "  테이블: {} 개", self.total_tables)?;
        writeln!(f, "  컬럼: {} 개", self.total_columns)?;
        writeln!(
            f,
            "  관계: {} 개 (명시 {}, 추론 {}, 모호 {})",
            self.total_relationships,
            self.explicit_relationships,
            self.implied_relationships,
            self.ambiguous_references
        )?;
        writeln!(f, "  인덱스: {} 개", self.total_indexes)?;
        writeln!(f, "  타임스탬프 테이블: {} 개", self.tables_with_timestamps)?;
        write!(f, "  AUTO_INCREMENT 테이블: {} 개", self.tables_with_auto_increment)
    }
}

/// 스키마 모델 (분석 결과, 생성 후 불변)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaModel {
    pub(crate) tables: Vec<Table>,
    pub(crate) relationships: Vec<Relationship>,
    pub(crate) ambiguous: Vec<AmbiguousReference>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) summary: SchemaSummary,
}

impl SchemaModel {
    /// 테이블 (선언 순서)
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// 관계 (명시 관계 먼저, 이후 추론 관계)
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// 추론하지 않은 모호한 참조
    pub fn ambiguous_references(&self) -> &[AmbiguousReference] {
        &self.ambiguous
    }

    /// 분석 진단
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// 요약 통계
    pub fn summary(&self) -> &SchemaSummary {
        &self.summary
    }

    /// 전체 인덱스
    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.tables.iter().flat_map(|t| t.indexes.iter())
    }

    /// 테이블 조회 (원본 이름, 대소문자 무시)
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// 특정 테이블이 소유한 관계
    pub fn relationships_from<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships
            .iter()
            .filter(move |r| r.table.eq_ignore_ascii_case(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_value_from_raw() {
        assert_eq!(DefaultValue::from_raw("NULL"), DefaultValue::Null);
        assert_eq!(
            DefaultValue::from_raw("CURRENT_TIMESTAMP"),
            DefaultValue::CurrentTimestamp
        );
        assert_eq!(
            DefaultValue::from_raw("'it''s'"),
            DefaultValue::Text("it's".to_string())
        );
        assert_eq!(DefaultValue::from_raw("0.00"), DefaultValue::Number("0.00".to_string()));
        assert_eq!(
            DefaultValue::from_raw("uuid()"),
            DefaultValue::Expression("uuid()".to_string())
        );
    }

    #[test]
    fn test_referential_action_parse() {
        assert_eq!(ReferentialAction::parse("cascade"), Some(ReferentialAction::Cascade));
        assert_eq!(ReferentialAction::parse("SET  NULL"), Some(ReferentialAction::SetNull));
        assert_eq!(ReferentialAction::parse("NO ACTION"), Some(ReferentialAction::NoAction));
        assert_eq!(ReferentialAction::parse("explode"), None);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(Severity::Warning, "REL002", "모호한 참조")
            .with_table("tbl_order")
            .with_column("item_id")
            .with_suggestion("명시적 FOREIGN KEY 추가");

        let output = format!("{}", diag);
        assert!(output.contains("[WARNING] REL002"));
        assert!(output.contains("tbl_order.item_id"));
        assert!(output.contains("명시적 FOREIGN KEY"));
    }

    #[test]
    fn test_column_base_type() {
        let col = Column {
            name: "price".to_string(),
            source_type: "DECIMAL(10,2) UNSIGNED".to_string(),
            nullable: false,
            default: None,
            auto_increment: false,
            ordinal: 1,
            unique: false,
            on_update_current_timestamp: false,
            comment: None,
        };
        assert_eq!(col.base_type(), "decimal");
    }
}
