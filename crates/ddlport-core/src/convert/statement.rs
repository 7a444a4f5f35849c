//! 대상 방언 독립 DDL 구문 트리와 직렬화기.
//!
//! 변환기는 문자열을 직접 조립하지 않고 구문 노드를 만든 뒤 [`Dialect`]로
//! 한 번만 직렬화합니다.

use crate::schema::ReferentialAction;

/// 컬럼 정의
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    /// GENERATED BY DEFAULT AS IDENTITY
    pub identity: bool,
    pub nullable: bool,
    /// 대상 방언으로 변환된 기본값 표현식
    pub default: Option<String>,
    pub unique: bool,
    pub comment: Option<String>,
}

/// 테이블 제약
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraint {
    PrimaryKey {
        columns: Vec<String>,
    },
    /// `column IN (values)` 검사 (ENUM 변환)
    CheckIn {
        name: String,
        column: String,
        values: Vec<String>,
    },
}

/// CREATE TABLE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub comment: Option<String>,
}

/// ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddForeignKey {
    pub table: String,
    pub name: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

/// CREATE [UNIQUE] INDEX
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// 구문 직렬화 방언
pub trait Dialect {
    /// 방언 이름 (보고용)
    fn name(&self) -> &'static str;

    /// 식별자 최대 길이
    fn max_identifier_len(&self) -> usize;

    /// 식별자 인용
    fn quote_identifier(&self, ident: &str) -> String;

    /// 문자열 리터럴 인용
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn create_table(&self, stmt: &CreateTable) -> String;

    fn add_foreign_key(&self, stmt: &AddForeignKey) -> String;

    fn create_index(&self, stmt: &CreateIndex) -> String;

    fn drop_table(&self, name: &str) -> String;

    fn drop_foreign_key(&self, table: &str, name: &str) -> String;

    /// 식별자 길이 제한에 맞춰 자르기
    fn truncate_identifier(&self, ident: &str) -> String {
        ident.chars().take(self.max_identifier_len()).collect()
    }
}

/// PostgreSQL 방언
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn column_def(&self, col: &ColumnDef) -> String {
        let mut sql = format!("{} {}", self.quote_identifier(&col.name), col.data_type);
        if col.identity {
            sql.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        if !col.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(ref default) = col.default {
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        if col.unique {
            sql.push_str(" UNIQUE");
        }
        sql
    }

    fn constraint(&self, constraint: &TableConstraint) -> String {
        match constraint {
            TableConstraint::PrimaryKey { columns } => {
                format!("PRIMARY KEY ({})", self.column_list(columns))
            }
            TableConstraint::CheckIn {
                name,
                column,
                values,
            } => format!(
                "CONSTRAINT {} CHECK ({} IN ({}))",
                self.quote_identifier(name),
                self.quote_identifier(column),
                values.join(", ")
            ),
        }
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn max_identifier_len(&self) -> usize {
        63
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn create_table(&self, stmt: &CreateTable) -> String {
        let body: Vec<String> = stmt
            .columns
            .iter()
            .map(|c| self.column_def(c))
            .chain(stmt.constraints.iter().map(|c| self.constraint(c)))
            .map(|line| format!("    {}", line))
            .collect();

        let table = self.quote_identifier(&stmt.name);
        let mut sql = format!("CREATE TABLE {} (\n{}\n);", table, body.join(",\n"));

        if let Some(ref comment) = stmt.comment {
            sql.push_str(&format!(
                "\nCOMMENT ON TABLE {} IS {};",
                table,
                self.quote_literal(comment)
            ));
        }
        for col in &stmt.columns {
            if let Some(ref comment) = col.comment {
                sql.push_str(&format!(
                    "\nCOMMENT ON COLUMN {}.{} IS {};",
                    table,
                    self.quote_identifier(&col.name),
                    self.quote_literal(comment)
                ));
            }
        }

        sql
    }

    fn add_foreign_key(&self, stmt: &AddForeignKey) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_identifier(&stmt.table),
            self.quote_identifier(&stmt.name),
            self.quote_identifier(&stmt.column),
            self.quote_identifier(&stmt.referenced_table),
            self.quote_identifier(&stmt.referenced_column)
        );
        if let Some(action) = stmt.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
        }
        if let Some(action) = stmt.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
        }
        sql.push(';');
        sql
    }

    fn create_index(&self, stmt: &CreateIndex) -> String {
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({});",
            if stmt.unique { "UNIQUE " } else { "" },
            self.quote_identifier(&stmt.name),
            self.quote_identifier(&stmt.table),
            self.column_list(&stmt.columns)
        )
    }

    fn drop_table(&self, name: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", self.quote_identifier(name))
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {};",
            self.quote_identifier(table),
            self.quote_identifier(name)
        )
    }
}
