//! MySQL DDL 스키마 분석기.
//!
//! 문장 분리 → 테이블 정의 해석 → ALTER/CREATE INDEX 반영 → 관계 무결성 검증 →
//! 관계 추론 → 요약 계산 순서로 [`SchemaModel`]을 생성합니다.
//! 해석할 수 없는 정의가 하나라도 있으면 전체 실행을 중단합니다.

use std::{fs, path::Path};

use tracing::{debug, warn};

use super::inference::{infer_relationships, InferenceOutcome};
use super::lexer::{
    clean_identifier, matching_paren, parens_balanced, parse_column_list, snippet,
    split_top_level, tokenize, Token,
};
use super::models::*;
use super::splitter::split_statements;
use crate::error::ParseError;
use crate::naming::TableRenamer;

/// 부분 타임스탬프로 인정하는 레거시 단일 날짜 컬럼
const LEGACY_CREATED_COLUMNS: &[&str] = &[
    "date_added",
    "date_register",
    "date_registered",
    "reg_date",
    "regdate",
    "added_on",
];

/// 컬럼 정의에서 의미 없이 건너뛰는 수식어
const IGNORED_COLUMN_WORDS: &[&str] = &[
    "SIGNED", "ZEROFILL", "BINARY", "VISIBLE", "INVISIBLE", "SERIAL",
];

/// 외래키 정의 (검증 전)
#[derive(Debug, Clone)]
struct ForeignKeySpec {
    constraint_name: Option<String>,
    column: String,
    referenced_table: String,
    referenced_column: String,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
}

/// 해석된 정의 절
#[derive(Debug)]
enum Definition {
    Column {
        column: Column,
        inline_primary: bool,
        reference: Option<ForeignKeySpec>,
    },
    PrimaryKey(Vec<String>),
    ForeignKey(ForeignKeySpec),
    Index { index: Index, special: bool },
    Check,
    /// ALTER의 테이블 옵션 (AUTO_INCREMENT=, ENGINE= 등)
    TableOption { comment: Option<String> },
}

/// 스키마 분석기
#[derive(Debug, Clone, Default)]
pub struct SchemaAnalyzer {
    renamer: TableRenamer,
}

impl SchemaAnalyzer {
    /// 기본 이름 변환 규칙으로 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 이름 변환 규칙 지정
    pub fn with_renamer(renamer: TableRenamer) -> Self {
        Self { renamer }
    }

    /// 사용 중인 이름 변환 규칙
    pub fn renamer(&self) -> &TableRenamer {
        &self.renamer
    }

    /// DDL 파일 분석
    pub fn parse_schema_from_file(&self, path: &Path) -> Result<SchemaModel, ParseError> {
        let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let source = path.display().to_string();
        let model = self.build(&content, &source)?;
        model.summary.log_summary(&source);
        Ok(model)
    }

    /// DDL 텍스트 분석
    pub fn parse_schema(&self, content: &str) -> Result<SchemaModel, ParseError> {
        let model = self.build(content, "<input>")?;
        model.summary.log_summary("<input>");
        Ok(model)
    }

    fn build(&self, content: &str, source: &str) -> Result<SchemaModel, ParseError> {
        let statements = split_statements(content);

        if !statements
            .iter()
            .any(|s| s.statement_type == StatementType::CreateTable)
        {
            return Err(ParseError::NoTables(source.to_string()));
        }

        let mut builder = SchemaBuilder::default();

        for stmt in &statements {
            match stmt.statement_type {
                StatementType::CreateTable => {
                    let table = builder.parse_create_table(stmt, &self.renamer)?;
                    builder.tables.push(table);
                }
                StatementType::AlterTable => builder.apply_alter_table(stmt)?,
                StatementType::CreateIndex => builder.apply_create_index(stmt)?,
                ref other => {
                    debug!(
                        line = stmt.line_number,
                        statement = ?other,
                        "스키마와 무관한 문장 건너뜀"
                    );
                }
            }
        }

        builder.finish()
    }
}

/// 기본 분석기로 DDL 파일 분석
pub fn parse_schema_from_file(path: &Path) -> Result<SchemaModel, ParseError> {
    SchemaAnalyzer::new().parse_schema_from_file(path)
}

/// 기본 분석기로 DDL 텍스트 분석
pub fn parse_schema(content: &str) -> Result<SchemaModel, ParseError> {
    SchemaAnalyzer::new().parse_schema(content)
}

/// 분석 중간 상태
#[derive(Debug, Default)]
struct SchemaBuilder {
    tables: Vec<Table>,
    foreign_keys: Vec<(String, ForeignKeySpec)>,
    diagnostics: Vec<Diagnostic>,
}

impl SchemaBuilder {
    fn table_index(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// CREATE TABLE 해석
    fn parse_create_table(
        &mut self,
        stmt: &SqlStatement,
        renamer: &TableRenamer,
    ) -> Result<Table, ParseError> {
        let name = stmt.object_name.clone();
        let raw = &stmt.raw_sql;

        if self.table_index(&name).is_some() {
            return Err(ParseError::Unsupported {
                table: name,
                detail: "동일 테이블이 두 번 정의됨".to_string(),
            });
        }

        if !parens_balanced(raw) {
            return Err(ParseError::UnbalancedParens {
                table: name,
                snippet: snippet(raw),
            });
        }

        let open = raw.find('(').ok_or_else(|| ParseError::Unsupported {
            table: name.clone(),
            detail: "열 정의가 없는 CREATE TABLE (LIKE / AS SELECT)".to_string(),
        })?;
        let close = matching_paren(raw, open).ok_or_else(|| ParseError::UnbalancedParens {
            table: name.clone(),
            snippet: snippet(raw),
        })?;

        let mut table = Table {
            target_name: renamer.rename(&name),
            name: name.clone(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            auto_increment: None,
            timestamps: TimestampSupport::None,
            indexes: Vec::new(),
            comment: None,
        };

        for def in split_top_level(&raw[open + 1..close], ',') {
            let tokens = tokenize(&def);
            let ordinal = table.columns.len() + 1;
            let parsed = parse_definition(&name, &tokens, &def, ordinal)?;
            self.apply_definition(&mut table, parsed, &def)?;
        }

        if table.columns.is_empty() {
            return Err(ParseError::InvalidDefinition {
                table: name,
                snippet: snippet(raw),
            });
        }

        table.comment = table_comment(&tokenize(&raw[close + 1..]));

        debug!(
            table = %table.name,
            target = %table.target_name,
            columns = table.columns.len(),
            line = stmt.line_number,
            "테이블 정의 해석"
        );

        Ok(table)
    }

    /// ALTER TABLE 반영 (phpMyAdmin 덤프의 키/제약 추가 등)
    fn apply_alter_table(&mut self, stmt: &SqlStatement) -> Result<(), ParseError> {
        let name = stmt.object_name.clone();
        let idx = self
            .table_index(&name)
            .ok_or_else(|| ParseError::UnknownTable {
                table: name.clone(),
                context: format!("ALTER TABLE (line {})", stmt.line_number),
            })?;

        let tokens = tokenize(&stmt.raw_sql);
        let start = alter_actions_start(&tokens).ok_or_else(|| ParseError::InvalidDefinition {
            table: name.clone(),
            snippet: snippet(&stmt.raw_sql),
        })?;

        // 테이블 소유권을 잠시 가져와 정의 적용
        let mut table = self.tables[idx].clone();

        for clause in tokens[start..].split(|t| *t == Token::Punct(',')) {
            if clause.is_empty() {
                continue;
            }
            let raw = tokens_to_sql(clause);
            let parsed = parse_alter_clause(&name, clause, &raw, &mut table)?;
            if let Some(def) = parsed {
                self.apply_definition(&mut table, def, &raw)?;
            }
        }

        self.tables[idx] = table;
        Ok(())
    }

    /// CREATE [UNIQUE] INDEX name ON table (cols)
    fn apply_create_index(&mut self, stmt: &SqlStatement) -> Result<(), ParseError> {
        let tokens = tokenize(&stmt.raw_sql);
        let unique = tokens.get(1).is_some_and(|t| t.is_kw("UNIQUE"));
        let special = tokens
            .get(1)
            .is_some_and(|t| t.is_kw("FULLTEXT") || t.is_kw("SPATIAL"));

        let on_pos = tokens
            .iter()
            .position(|t| t.is_kw("ON"))
            .ok_or_else(|| ParseError::InvalidDefinition {
                table: stmt.object_name.clone(),
                snippet: snippet(&stmt.raw_sql),
            })?;

        let table_name = tokens
            .get(on_pos + 1)
            .and_then(|t| t.ident_text())
            .map(|t| clean_identifier(t).to_lowercase())
            .unwrap_or_default();

        let columns = tokens[on_pos + 1..]
            .iter()
            .find_map(|t| match t {
                Token::Group(g) => Some(parse_column_list(g)),
                _ => None,
            })
            .unwrap_or_default();

        let idx = self
            .table_index(&table_name)
            .ok_or_else(|| ParseError::UnknownTable {
                table: table_name.clone(),
                context: format!("CREATE INDEX {} (line {})", stmt.object_name, stmt.line_number),
            })?;

        if columns.is_empty() {
            return Err(ParseError::InvalidDefinition {
                table: table_name,
                snippet: snippet(&stmt.raw_sql),
            });
        }

        let mut table = self.tables[idx].clone();
        let index = Index {
            table: table.name.clone(),
            name: stmt.object_name.clone(),
            columns,
            unique,
        };
        self.apply_definition(&mut table, Definition::Index { index, special }, &stmt.raw_sql)?;
        self.tables[idx] = table;
        Ok(())
    }

    fn apply_definition(
        &mut self,
        table: &mut Table,
        def: Definition,
        raw: &str,
    ) -> Result<(), ParseError> {
        match def {
            Definition::Column {
                column,
                inline_primary,
                reference,
            } => {
                if inline_primary {
                    set_primary_key(table, vec![column.name.clone()], raw)?;
                }
                if let Some(fk) = reference {
                    self.foreign_keys.push((table.name.clone(), fk));
                }
                upsert_column(table, column);
            }
            Definition::PrimaryKey(columns) => set_primary_key(table, columns, raw)?,
            Definition::ForeignKey(fk) => self.foreign_keys.push((table.name.clone(), fk)),
            Definition::Index { index, special } => {
                if special {
                    self.diagnostics.push(
                        Diagnostic::new(
                            Severity::Warning,
                            "DDL003",
                            &format!("FULLTEXT/SPATIAL 인덱스 '{}'를 일반 인덱스로 변환", index.name),
                        )
                        .with_table(&table.name)
                        .with_suggestion("전문 검색은 tsvector + GIN 인덱스로 별도 설계"),
                    );
                }
                for col in &index.columns {
                    if table.column(col).is_none() {
                        return Err(ParseError::InvalidDefinition {
                            table: table.name.clone(),
                            snippet: format!("인덱스 '{}'의 컬럼 '{}' 없음", index.name, col),
                        });
                    }
                }
                table.indexes.push(index);
            }
            Definition::Check => {
                self.diagnostics.push(
                    Diagnostic::new(Severity::Warning, "DDL001", "CHECK 제약은 변환하지 않음")
                        .with_table(&table.name)
                        .with_suggestion(&format!("수동 검토 필요: {}", snippet(raw))),
                );
            }
            Definition::TableOption { comment } => {
                if comment.is_some() {
                    table.comment = comment;
                }
            }
        }
        Ok(())
    }

    /// 모든 문장 반영 후 파생 속성 계산, 무결성 검증, 관계 추론
    fn finish(mut self) -> Result<SchemaModel, ParseError> {
        for table in &mut self.tables {
            for pk in &table.primary_key {
                if table.column(pk).is_none() {
                    return Err(ParseError::InvalidDefinition {
                        table: table.name.clone(),
                        snippet: format!("기본키 컬럼 '{}' 없음", pk),
                    });
                }
            }
            let pk = table.primary_key.clone();
            for column in &mut table.columns {
                if pk.iter().any(|p| p.eq_ignore_ascii_case(&column.name)) {
                    column.nullable = false;
                }
            }
            table.auto_increment = table
                .columns
                .iter()
                .find(|c| c.auto_increment)
                .map(|c| c.name.clone());
            table.timestamps = detect_timestamps(&table.columns);
        }

        let explicit = self.resolve_foreign_keys()?;

        let mut relationships = explicit;
        let mut ambiguous = Vec::new();

        for outcome in infer_relationships(&self.tables, &relationships) {
            match outcome {
                InferenceOutcome::Implied(rel) => {
                    debug!(
                        table = %rel.table,
                        column = %rel.column,
                        referenced = %rel.referenced_table,
                        "관계 추론"
                    );
                    relationships.push(rel);
                }
                InferenceOutcome::Ambiguous(amb) => {
                    warn!(
                        table = %amb.table,
                        column = %amb.column,
                        candidates = ?amb.candidates,
                        "모호한 참조, 관계를 추론하지 않음"
                    );
                    self.diagnostics.push(
                        Diagnostic::new(
                            Severity::Warning,
                            "REL002",
                            &format!(
                                "동일하게 매칭되는 후보 테이블: {}",
                                amb.candidates.join(", ")
                            ),
                        )
                        .with_table(&amb.table)
                        .with_column(&amb.column)
                        .with_suggestion("명시적 FOREIGN KEY 절을 추가하거나 테이블 이름을 구분"),
                    );
                    ambiguous.push(amb);
                }
                InferenceOutcome::MissingKey {
                    table,
                    column,
                    candidate,
                } => {
                    self.diagnostics.push(
                        Diagnostic::new(
                            Severity::Info,
                            "REL003",
                            &format!("후보 테이블 '{}'에 단일 컬럼 기본키가 없어 추론하지 않음", candidate),
                        )
                        .with_table(&table)
                        .with_column(&column),
                    );
                }
            }
        }

        let summary = SchemaSummary::compute(&self.tables, &relationships, &ambiguous);

        Ok(SchemaModel {
            tables: self.tables,
            relationships,
            ambiguous,
            diagnostics: self.diagnostics,
            summary,
        })
    }

    /// 명시 외래키 검증 및 관계 변환 (양 끝 테이블/컬럼 존재)
    fn resolve_foreign_keys(&self) -> Result<Vec<Relationship>, ParseError> {
        let mut relationships: Vec<Relationship> = Vec::new();

        for (owner, fk) in &self.foreign_keys {
            let dangling = |reason: &str| ParseError::DanglingRelationship {
                table: owner.clone(),
                column: fk.column.clone(),
                referenced_table: fk.referenced_table.clone(),
                referenced_column: fk.referenced_column.clone(),
                reason: reason.to_string(),
            };

            let table = self
                .tables
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(owner))
                .ok_or_else(|| dangling("소유 테이블 없음"))?;
            let column = table
                .column(&fk.column)
                .ok_or_else(|| dangling("외래키 컬럼 없음"))?;
            let referenced = self
                .tables
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(&fk.referenced_table))
                .ok_or_else(|| dangling("참조 테이블 없음"))?;
            let referenced_column = referenced
                .column(&fk.referenced_column)
                .ok_or_else(|| dangling("참조 컬럼 없음"))?;

            let duplicate = relationships.iter().any(|r| {
                r.table == table.name && r.column.eq_ignore_ascii_case(&column.name)
            });
            if duplicate {
                continue;
            }

            relationships.push(Relationship {
                table: table.name.clone(),
                column: column.name.clone(),
                referenced_table: referenced.name.clone(),
                referenced_column: referenced_column.name.clone(),
                origin: RelationshipOrigin::Explicit,
                constraint_name: fk.constraint_name.clone(),
                on_delete: fk.on_delete,
                on_update: fk.on_update,
            });
        }

        Ok(relationships)
    }
}

fn invalid(table: &str, raw: &str) -> ParseError {
    ParseError::InvalidDefinition {
        table: table.to_string(),
        snippet: snippet(raw),
    }
}

fn tokens_to_sql(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_sql())
        .collect::<Vec<_>>()
        .join(" ")
}

fn unquote(s: &str) -> String {
    match DefaultValue::from_raw(s) {
        DefaultValue::Text(text) => text,
        _ => s.to_string(),
    }
}

fn set_primary_key(table: &mut Table, columns: Vec<String>, raw: &str) -> Result<(), ParseError> {
    if !table.primary_key.is_empty() {
        return Err(ParseError::InvalidDefinition {
            table: table.name.clone(),
            snippet: format!("기본키 중복 정의: {}", snippet(raw)),
        });
    }
    if columns.is_empty() {
        return Err(invalid(&table.name, raw));
    }
    table.primary_key = columns;
    Ok(())
}

/// 같은 이름의 컬럼이 있으면 선언 순서를 유지한 채 교체
fn upsert_column(table: &mut Table, mut column: Column) {
    match table
        .columns
        .iter_mut()
        .find(|c| c.name.eq_ignore_ascii_case(&column.name))
    {
        Some(existing) => {
            column.ordinal = existing.ordinal;
            *existing = column;
        }
        None => {
            column.ordinal = table.columns.len() + 1;
            table.columns.push(column);
        }
    }
}

/// 테이블 옵션의 COMMENT='...' 추출
fn table_comment(tokens: &[Token]) -> Option<String> {
    let pos = tokens.iter().position(|t| t.is_kw("COMMENT"))?;
    tokens[pos + 1..].iter().find_map(|t| match t {
        Token::Str(s) => Some(unquote(s)),
        _ => None,
    })
}

/// 이름 기반 타임스탬프 감지
fn detect_timestamps(columns: &[Column]) -> TimestampSupport {
    let names: Vec<String> = columns.iter().map(|c| c.name.to_lowercase()).collect();

    let created = names
        .iter()
        .any(|n| n.contains("created") || LEGACY_CREATED_COLUMNS.contains(&n.as_str()));
    let updated = names
        .iter()
        .any(|n| n.contains("updated") || n.contains("modified"));

    match (created, updated) {
        (true, true) => TimestampSupport::Full,
        (false, false) => TimestampSupport::None,
        _ => TimestampSupport::Partial,
    }
}

/// ALTER TABLE 문에서 테이블명 다음 동작 절의 시작 위치
fn alter_actions_start(tokens: &[Token]) -> Option<usize> {
    let table_pos = tokens.iter().position(|t| t.is_kw("TABLE"))?;
    let mut i = table_pos + 2;

    // `db`.`table` 형태
    while let Some(Token::Word(w)) = tokens.get(i) {
        if !w.starts_with('.') {
            break;
        }
        i += if w == "." { 2 } else { 1 };
    }

    (i <= tokens.len()).then_some(i)
}

/// ALTER TABLE의 개별 동작 절 해석
fn parse_alter_clause(
    table_name: &str,
    clause: &[Token],
    raw: &str,
    table: &mut Table,
) -> Result<Option<Definition>, ParseError> {
    let first = &clause[0];

    if first.is_kw("ADD") {
        let mut rest = &clause[1..];
        if rest.first().is_some_and(|t| t.is_kw("COLUMN")) {
            rest = &rest[1..];
        }
        if rest.is_empty() || matches!(rest[0], Token::Group(_)) {
            return Err(ParseError::Unsupported {
                table: table_name.to_string(),
                detail: format!("괄호로 묶은 다중 컬럼 추가: {}", snippet(raw)),
            });
        }
        let ordinal = table.columns.len() + 1;
        return parse_definition(table_name, rest, raw, ordinal).map(Some);
    }

    if first.is_kw("MODIFY") || first.is_kw("CHANGE") {
        let mut rest = &clause[1..];
        if rest.first().is_some_and(|t| t.is_kw("COLUMN")) {
            rest = &rest[1..];
        }

        let old_name = if first.is_kw("CHANGE") {
            let old = rest
                .first()
                .and_then(|t| t.ident_text())
                .map(clean_identifier)
                .ok_or_else(|| invalid(table_name, raw))?;
            rest = &rest[1..];
            old
        } else {
            rest.first()
                .and_then(|t| t.ident_text())
                .map(clean_identifier)
                .ok_or_else(|| invalid(table_name, raw))?
        };

        let existing = table
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(&old_name))
            .ok_or_else(|| ParseError::InvalidDefinition {
                table: table_name.to_string(),
                snippet: format!("존재하지 않는 컬럼 변경 '{}'", old_name),
            })?;

        let ordinal = table.columns[existing].ordinal;
        let parsed = parse_column(table_name, rest, raw, ordinal)?;
        if let Definition::Column { ref column, .. } = parsed {
            // CHANGE는 이름 변경 가능: 기존 위치에 덮어씀
            table.columns[existing].name = column.name.clone();
        }
        return Ok(Some(parsed));
    }

    // 테이블 옵션
    const TABLE_OPTIONS: &[&str] = &[
        "AUTO_INCREMENT",
        "ENGINE",
        "DEFAULT",
        "CHARSET",
        "CHARACTER",
        "COLLATE",
        "ROW_FORMAT",
        "DISABLE",
        "ENABLE",
        "COMMENT",
    ];
    if TABLE_OPTIONS.iter().any(|kw| first.is_kw(kw)) {
        let comment = if first.is_kw("COMMENT") {
            table_comment(clause)
        } else {
            None
        };
        return Ok(Some(Definition::TableOption { comment }));
    }

    Err(ParseError::Unsupported {
        table: table_name.to_string(),
        detail: format!("ALTER TABLE 동작: {}", snippet(raw)),
    })
}

/// 정의 절 하나 해석 (컬럼 또는 키/제약)
fn parse_definition(
    table: &str,
    tokens: &[Token],
    raw: &str,
    ordinal: usize,
) -> Result<Definition, ParseError> {
    let Some(first) = tokens.first() else {
        return Err(invalid(table, raw));
    };

    if first.is_kw("CONSTRAINT") {
        // CONSTRAINT [name] PRIMARY KEY / FOREIGN KEY / UNIQUE / CHECK
        let (name, rest) = match tokens.get(1) {
            Some(t) if is_key_keyword(t) => (None, &tokens[1..]),
            Some(t) => (t.ident_text().map(clean_identifier), &tokens[2..]),
            None => return Err(invalid(table, raw)),
        };
        return parse_key_clause(table, rest, raw, name)?.ok_or_else(|| invalid(table, raw));
    }

    if let Some(def) = parse_key_clause(table, tokens, raw, None)? {
        return Ok(def);
    }

    parse_column(table, tokens, raw, ordinal)
}

fn is_key_keyword(token: &Token) -> bool {
    ["PRIMARY", "FOREIGN", "UNIQUE", "CHECK", "KEY", "INDEX", "FULLTEXT", "SPATIAL"]
        .iter()
        .any(|kw| token.is_kw(kw))
}

fn first_group(tokens: &[Token]) -> Option<(usize, &str)> {
    tokens.iter().enumerate().find_map(|(i, t)| match t {
        Token::Group(g) => Some((i, g.as_str())),
        _ => None,
    })
}

/// 키/제약 절 해석, 컬럼 정의면 None
fn parse_key_clause(
    table: &str,
    tokens: &[Token],
    raw: &str,
    constraint_name: Option<String>,
) -> Result<Option<Definition>, ParseError> {
    let Some(first) = tokens.first() else {
        return Err(invalid(table, raw));
    };

    if first.is_kw("PRIMARY") && tokens.get(1).is_some_and(|t| t.is_kw("KEY")) {
        let (_, group) = first_group(tokens).ok_or_else(|| invalid(table, raw))?;
        return Ok(Some(Definition::PrimaryKey(parse_column_list(group))));
    }

    if first.is_kw("FOREIGN") {
        return parse_foreign_key(table, tokens, raw, constraint_name).map(Some);
    }

    if first.is_kw("CHECK") {
        return Ok(Some(Definition::Check));
    }

    let is_index = first.is_kw("UNIQUE")
        || first.is_kw("FULLTEXT")
        || first.is_kw("SPATIAL")
        || first.is_kw("KEY")
        || first.is_kw("INDEX");
    if !is_index {
        return Ok(None);
    }

    let unique = first.is_kw("UNIQUE");
    let special = first.is_kw("FULLTEXT") || first.is_kw("SPATIAL");
    let (group_pos, group) = first_group(tokens).ok_or_else(|| invalid(table, raw))?;
    let columns = parse_column_list(group);
    if columns.is_empty() {
        return Err(invalid(table, raw));
    }

    let name = tokens[..group_pos]
        .iter()
        .filter(|t| !is_key_keyword(t))
        .find_map(|t| t.ident_text().map(clean_identifier))
        .or(constraint_name)
        .unwrap_or_else(|| format!("{}_{}_idx", table, columns.join("_")));

    Ok(Some(Definition::Index {
        index: Index {
            table: table.to_string(),
            name,
            columns,
            unique,
        },
        special,
    }))
}

/// FOREIGN KEY [name] (col) REFERENCES tbl (col) [ON DELETE ..] [ON UPDATE ..]
fn parse_foreign_key(
    table: &str,
    tokens: &[Token],
    raw: &str,
    constraint_name: Option<String>,
) -> Result<Definition, ParseError> {
    let refs_pos = tokens
        .iter()
        .position(|t| t.is_kw("REFERENCES"))
        .ok_or_else(|| invalid(table, raw))?;

    let (_, cols_group) = first_group(&tokens[..refs_pos]).ok_or_else(|| invalid(table, raw))?;
    let columns = parse_column_list(cols_group);

    let spec = parse_reference(table, &tokens[refs_pos..], raw, &columns, constraint_name)?;
    Ok(Definition::ForeignKey(spec))
}

/// REFERENCES 절 해석 (`tokens[0]`은 REFERENCES)
fn parse_reference(
    table: &str,
    tokens: &[Token],
    raw: &str,
    columns: &[String],
    constraint_name: Option<String>,
) -> Result<ForeignKeySpec, ParseError> {
    let (group_pos, ref_group) = first_group(tokens).ok_or_else(|| invalid(table, raw))?;
    let referenced_table = tokens[1..group_pos]
        .iter()
        .rev()
        .find_map(|t| t.ident_text())
        .map(|t| clean_identifier(t).to_lowercase())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid(table, raw))?;
    let referenced_columns = parse_column_list(ref_group);

    if columns.len() != 1 || referenced_columns.len() != 1 {
        return Err(ParseError::Unsupported {
            table: table.to_string(),
            detail: format!(
                "복합 외래키 ({}) → {}({})",
                columns.join(", "),
                referenced_table,
                referenced_columns.join(", ")
            ),
        });
    }

    let mut on_delete = None;
    let mut on_update = None;
    let mut i = group_pos + 1;
    while i < tokens.len() {
        if tokens[i].is_kw("ON") {
            let target = tokens.get(i + 1);
            let first_word = tokens.get(i + 2).and_then(|t| t.ident_text()).unwrap_or("");
            let two_words = first_word.eq_ignore_ascii_case("SET") || first_word.eq_ignore_ascii_case("NO");
            let action_text = if two_words {
                let second = tokens.get(i + 3).and_then(|t| t.ident_text()).unwrap_or("");
                format!("{} {}", first_word, second)
            } else {
                first_word.to_string()
            };
            let action = ReferentialAction::parse(&action_text).ok_or_else(|| invalid(table, raw))?;

            match target {
                Some(t) if t.is_kw("DELETE") => on_delete = Some(action),
                Some(t) if t.is_kw("UPDATE") => on_update = Some(action),
                _ => return Err(invalid(table, raw)),
            }
            i += if two_words { 4 } else { 3 };
        } else {
            i += 1;
        }
    }

    Ok(ForeignKeySpec {
        constraint_name,
        column: columns[0].clone(),
        referenced_table,
        referenced_column: referenced_columns[0].clone(),
        on_delete,
        on_update,
    })
}

/// 컬럼 정의 해석
fn parse_column(
    table: &str,
    tokens: &[Token],
    raw: &str,
    ordinal: usize,
) -> Result<Definition, ParseError> {
    let name = tokens
        .first()
        .and_then(|t| t.ident_text())
        .map(clean_identifier)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| invalid(table, raw))?;

    let Some(Token::Word(type_word)) = tokens.get(1) else {
        return Err(invalid(table, raw));
    };

    let mut source_type = type_word.clone();
    let mut i = 2;

    if type_word.eq_ignore_ascii_case("DOUBLE") && tokens.get(i).is_some_and(|t| t.is_kw("PRECISION")) {
        source_type.push_str(" PRECISION");
        i += 1;
    }
    if let Some(Token::Group(args)) = tokens.get(i) {
        source_type.push_str(&format!("({})", args));
        i += 1;
    }
    if let Some(t) = tokens.get(i) {
        if t.is_kw("UNSIGNED") {
            source_type.push_str(" UNSIGNED");
            i += 1;
        }
    }

    let mut column = Column {
        name,
        source_type,
        nullable: true,
        default: None,
        auto_increment: false,
        ordinal,
        unique: false,
        on_update_current_timestamp: false,
        comment: None,
    };
    let mut inline_primary = false;
    let mut reference = None;

    while i < tokens.len() {
        let t = &tokens[i];

        if t.is_kw("NOT") && tokens.get(i + 1).is_some_and(|n| n.is_kw("NULL")) {
            column.nullable = false;
            i += 2;
        } else if t.is_kw("NULL") {
            column.nullable = true;
            i += 1;
        } else if t.is_kw("DEFAULT") {
            let (value, consumed) = parse_default(&tokens[i + 1..]).ok_or_else(|| invalid(table, raw))?;
            column.default = Some(value);
            i += 1 + consumed;
        } else if t.is_kw("AUTO_INCREMENT") {
            column.auto_increment = true;
            i += 1;
        } else if t.is_kw("PRIMARY") && tokens.get(i + 1).is_some_and(|n| n.is_kw("KEY")) {
            inline_primary = true;
            i += 2;
        } else if t.is_kw("UNIQUE") {
            column.unique = true;
            i += if tokens.get(i + 1).is_some_and(|n| n.is_kw("KEY")) { 2 } else { 1 };
        } else if t.is_kw("COMMENT") {
            match tokens.get(i + 1) {
                Some(Token::Str(s)) => column.comment = Some(unquote(s)),
                _ => return Err(invalid(table, raw)),
            }
            i += 2;
        } else if t.is_kw("ON") && tokens.get(i + 1).is_some_and(|n| n.is_kw("UPDATE")) {
            let (value, consumed) = parse_default(&tokens[i + 2..]).ok_or_else(|| invalid(table, raw))?;
            if value != DefaultValue::CurrentTimestamp {
                return Err(invalid(table, raw));
            }
            column.on_update_current_timestamp = true;
            i += 2 + consumed;
        } else if t.is_kw("CHARACTER") && tokens.get(i + 1).is_some_and(|n| n.is_kw("SET")) {
            i += 3;
        } else if t.is_kw("CHARSET") || t.is_kw("COLLATE") {
            i += 2;
        } else if t.is_kw("REFERENCES") {
            let spec = parse_reference(table, &tokens[i..], raw, &[column.name.clone()], None)?;
            reference = Some(spec);
            // 참조 절은 마지막 절로 취급
            break;
        } else if t.is_kw("CHECK") {
            i += 2;
        } else if IGNORED_COLUMN_WORDS.iter().any(|w| t.is_kw(w)) {
            i += 1;
        } else {
            return Err(invalid(table, raw));
        }
    }

    Ok(Definition::Column {
        column,
        inline_primary,
        reference,
    })
}

/// DEFAULT 뒤 값 해석 → (값, 소비한 토큰 수)
fn parse_default(tokens: &[Token]) -> Option<(DefaultValue, usize)> {
    match tokens.first()? {
        Token::Str(s) => Some((DefaultValue::from_raw(s), 1)),
        Token::Word(w) => match tokens.get(1) {
            // 비트/16진 리터럴: b'0', x'1F'
            Some(Token::Str(lit)) if w.eq_ignore_ascii_case("b") || w.eq_ignore_ascii_case("x") => {
                Some((DefaultValue::Expression(format!("{}{}", w, lit)), 2))
            }
            // CURRENT_TIMESTAMP(6), now()
            Some(Token::Group(args)) => {
                let raw = format!("{}({})", w, args);
                let upper = w.to_uppercase();
                if matches!(upper.as_str(), "CURRENT_TIMESTAMP" | "NOW" | "LOCALTIMESTAMP") {
                    Some((DefaultValue::CurrentTimestamp, 2))
                } else {
                    Some((DefaultValue::Expression(raw), 2))
                }
            }
            _ => Some((DefaultValue::from_raw(w), 1)),
        },
        Token::Group(g) => Some((DefaultValue::Expression(format!("({})", g)), 1)),
        _ => None,
    }
}
