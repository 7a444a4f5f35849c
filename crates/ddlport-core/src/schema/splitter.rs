//! DDL 원문을 개별 SQL 문장으로 분리.
//!
//! 주석(`--`, `#`, `/* */`, MySQL 조건부 주석 `/*! */`)을 제거하고
//! 따옴표 밖의 `;`에서만 문장을 나눕니다. 포맷팅 잡음(빈 줄, 덤프 헤더 등)에 관대합니다.

use super::lexer::clean_identifier;
use super::models::{SqlStatement, StatementType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// SQL 내용을 문장 단위로 분리
pub fn split_statements(content: &str) -> Vec<SqlStatement> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::Normal;
    let mut line = 1usize;
    let mut stmt_start_line = 1usize;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }

        match state {
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Normal;
                    current.push('\n');
                }
            }
            ScanState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = ScanState::Normal;
                    current.push(' ');
                }
            }
            ScanState::Quoted(q) => {
                current.push(c);
                if c == '\\' && q != '`' {
                    if let Some(next) = chars.next() {
                        if next == '\n' {
                            line += 1;
                        }
                        current.push(next);
                    }
                } else if c == q {
                    if chars.peek() == Some(&q) {
                        current.push(q);
                        chars.next();
                    } else {
                        state = ScanState::Normal;
                    }
                }
            }
            ScanState::Normal => match c {
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = ScanState::LineComment;
                }
                '#' => state = ScanState::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = ScanState::BlockComment;
                }
                '\'' | '"' | '`' => {
                    if current.trim().is_empty() {
                        stmt_start_line = line;
                    }
                    state = ScanState::Quoted(c);
                    current.push(c);
                }
                ';' => {
                    if let Some(stmt) = parse_single_statement(&current, stmt_start_line) {
                        statements.push(stmt);
                    }
                    current.clear();
                }
                _ => {
                    if current.trim().is_empty() && !c.is_whitespace() {
                        stmt_start_line = line;
                    }
                    current.push(c);
                }
            },
        }
    }

    // 마지막 문장 처리 (세미콜론 누락)
    if let Some(stmt) = parse_single_statement(&current, stmt_start_line) {
        statements.push(stmt);
    }

    statements
}

/// 단일 SQL 문장 파싱
fn parse_single_statement(sql: &str, line_number: usize) -> Option<SqlStatement> {
    let sql_trimmed = sql.trim();
    if sql_trimmed.is_empty() {
        return None;
    }

    let normalized = sql_trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    let sql_upper = normalized.to_uppercase();

    let (stmt_type, object_name) = detect_statement_type(&sql_upper, &normalized);

    Some(SqlStatement::new(
        stmt_type,
        object_name,
        sql_trimmed.to_string(),
        line_number,
    ))
}

/// 문장 유형 및 대상 객체 검출
fn detect_statement_type(sql_upper: &str, sql: &str) -> (StatementType, String) {
    for prefix in ["CREATE TABLE", "CREATE TEMPORARY TABLE"] {
        if sql_upper.starts_with(prefix) {
            return (
                StatementType::CreateTable,
                extract_name_after(sql_upper, sql, prefix.len()),
            );
        }
    }

    if sql_upper.starts_with("ALTER TABLE") {
        return (
            StatementType::AlterTable,
            extract_name_after(sql_upper, sql, "ALTER TABLE".len()),
        );
    }

    for prefix in [
        "CREATE UNIQUE INDEX",
        "CREATE FULLTEXT INDEX",
        "CREATE SPATIAL INDEX",
        "CREATE INDEX",
    ] {
        if sql_upper.starts_with(prefix) {
            return (
                StatementType::CreateIndex,
                extract_name_after(sql_upper, sql, prefix.len()),
            );
        }
    }

    if sql_upper.starts_with("DROP TABLE") {
        return (
            StatementType::DropTable,
            extract_name_after(sql_upper, sql, "DROP TABLE".len()),
        );
    }

    if sql_upper.starts_with("INSERT") {
        let after = sql_upper.find("INTO").map(|p| p + 4).unwrap_or(6);
        return (StatementType::Insert, extract_name_after(sql_upper, sql, after));
    }

    if sql_upper.starts_with("SET ") {
        return (StatementType::Set, String::new());
    }

    let first_word = sql_upper.split_whitespace().next().unwrap_or("UNKNOWN");
    (StatementType::Other(first_word.to_string()), String::new())
}

/// 키워드 뒤 객체명 추출 (IF [NOT] EXISTS 건너뜀)
fn extract_name_after(sql_upper: &str, sql: &str, offset: usize) -> String {
    let mut rest_upper = sql_upper.get(offset..).unwrap_or("").trim_start();
    let mut rest = sql.get(offset..).unwrap_or("").trim_start();

    for guard in ["IF NOT EXISTS", "IF EXISTS"] {
        if rest_upper.starts_with(guard) {
            rest_upper = rest_upper[guard.len()..].trim_start();
            rest = rest[guard.len()..].trim_start();
            break;
        }
    }

    let name = rest
        .split(|c: char| c == '(' || c.is_whitespace() || c == ',')
        .next()
        .unwrap_or("");

    clean_identifier(name).to_lowercase()
}
