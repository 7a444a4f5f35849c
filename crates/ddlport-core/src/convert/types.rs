//! MySQL → PostgreSQL 타입 매핑 레지스트리.
//!
//! 고정된 규칙 테이블로만 변환합니다. 등록되지 않은 타입은 추측하지 않고
//! [`ConversionError::UnmappedType`]으로 실패합니다.

use std::collections::BTreeMap;

use crate::error::ConversionError;
use crate::schema::lexer::split_top_level;
use crate::schema::{Column, DefaultValue};

/// 기본 타입별 변환 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRule {
    /// 인자와 무관한 고정 타입
    Fixed(&'static str),
    /// 정수 계열: 부호 여부에 따라 폭 선택
    Integer {
        signed: &'static str,
        unsigned: &'static str,
    },
    /// BIGINT는 부호와 무관하게 BIGINT (UNSIGNED는 상한이 좁아짐)
    BigInt,
    /// `TINYINT(1)`은 BOOLEAN, 나머지는 SMALLINT
    TinyInt,
    /// `BIT(1)`은 BOOLEAN, `BIT(n)`은 그대로
    Bit,
    /// 길이 인자 유지 (`VARCHAR(n)`, `CHAR(n)`)
    Sized(&'static str),
    /// 선택적 정밀도 인자 유지 (`TIMESTAMP(6)`)
    Precision(&'static str),
    /// 정밀도/스케일 유지 (`NUMERIC(p,s)`)
    Numeric,
    /// TEXT + CHECK (col IN (...))
    Enum,
}

/// 변환된 컬럼 타입
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// 대상 타입 SQL (예: `VARCHAR(255)`)
    pub sql: String,
    /// identity 컬럼 여부 (AUTO_INCREMENT 정수)
    pub identity: bool,
    /// BOOLEAN으로 변환되었는지 (기본값 0/1 변환용)
    pub boolean: bool,
    /// ENUM 허용 값 (따옴표 포함 SQL 리터럴)
    pub allowed_values: Option<Vec<String>>,
    /// 원본보다 값 범위가 좁아졌는지 (`BIGINT UNSIGNED` → `BIGINT`)
    pub narrowed: bool,
}

impl ColumnType {
    fn plain(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            identity: false,
            boolean: false,
            allowed_values: None,
            narrowed: false,
        }
    }

    fn boolean() -> Self {
        Self {
            boolean: true,
            ..Self::plain("BOOLEAN")
        }
    }

    /// 정수 계열 타입인지 확인
    pub fn is_integer(&self) -> bool {
        matches!(self.sql.as_str(), "SMALLINT" | "INTEGER" | "BIGINT")
    }
}

/// 타입 매핑 테이블
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    rules: BTreeMap<String, TypeRule>,
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::postgres()
    }
}

impl TypeMap {
    /// 빈 매핑 테이블
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// MySQL → PostgreSQL 기본 매핑
    pub fn postgres() -> Self {
        use TypeRule::*;

        let mut map = Self::empty();
        for (base, rule) in [
            ("tinyint", TinyInt),
            ("smallint", Integer { signed: "SMALLINT", unsigned: "INTEGER" }),
            ("mediumint", Integer { signed: "INTEGER", unsigned: "INTEGER" }),
            ("int", Integer { signed: "INTEGER", unsigned: "BIGINT" }),
            ("integer", Integer { signed: "INTEGER", unsigned: "BIGINT" }),
            ("bigint", BigInt),
            ("bool", Fixed("BOOLEAN")),
            ("boolean", Fixed("BOOLEAN")),
            ("bit", Bit),
            ("decimal", Numeric),
            ("numeric", Numeric),
            ("dec", Numeric),
            ("float", Fixed("REAL")),
            ("double", Fixed("DOUBLE PRECISION")),
            ("real", Fixed("DOUBLE PRECISION")),
            ("varchar", Sized("VARCHAR")),
            ("char", Sized("CHAR")),
            ("tinytext", Fixed("TEXT")),
            ("text", Fixed("TEXT")),
            ("mediumtext", Fixed("TEXT")),
            ("longtext", Fixed("TEXT")),
            ("datetime", Precision("TIMESTAMP")),
            ("timestamp", Precision("TIMESTAMP")),
            ("date", Fixed("DATE")),
            ("time", Precision("TIME")),
            ("year", Fixed("SMALLINT")),
            ("binary", Fixed("BYTEA")),
            ("varbinary", Fixed("BYTEA")),
            ("tinyblob", Fixed("BYTEA")),
            ("blob", Fixed("BYTEA")),
            ("mediumblob", Fixed("BYTEA")),
            ("longblob", Fixed("BYTEA")),
            ("json", Fixed("JSONB")),
            ("enum", Enum),
        ] {
            map.rules.insert(base.to_string(), rule);
        }
        map
    }

    /// 규칙 등록 (기존 규칙 교체)
    pub fn register(mut self, base: &str, rule: TypeRule) -> Self {
        self.rules.insert(base.to_lowercase(), rule);
        self
    }

    /// 규칙 제거
    pub fn without(mut self, base: &str) -> Self {
        self.rules.remove(&base.to_lowercase());
        self
    }

    /// 기본 타입의 규칙 조회
    pub fn rule(&self, base: &str) -> Option<TypeRule> {
        self.rules.get(&base.to_lowercase()).copied()
    }

    /// 등록된 전체 규칙 (기본 타입명 정렬)
    pub fn entries(&self) -> impl Iterator<Item = (&str, TypeRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// 컬럼 타입 변환
    pub fn map_column(&self, table: &str, column: &Column) -> Result<ColumnType, ConversionError> {
        let unmapped = || ConversionError::UnmappedType {
            table: table.to_string(),
            column: column.name.clone(),
            source_type: column.source_type.clone(),
        };

        let base = column.base_type();
        let rule = self.rule(&base).ok_or_else(unmapped)?;
        let args = type_args(&column.source_type);
        let unsigned = column.source_type.to_uppercase().contains("UNSIGNED");

        let mut mapped = match rule {
            TypeRule::Fixed(sql) => {
                if sql == "BOOLEAN" {
                    ColumnType::boolean()
                } else {
                    ColumnType::plain(sql)
                }
            }
            TypeRule::Integer { signed, unsigned: wide } => {
                ColumnType::plain(if unsigned { wide } else { signed })
            }
            TypeRule::BigInt => ColumnType {
                narrowed: unsigned,
                ..ColumnType::plain("BIGINT")
            },
            TypeRule::TinyInt => match args.as_deref() {
                Some("1") => ColumnType::boolean(),
                _ => ColumnType::plain("SMALLINT"),
            },
            TypeRule::Bit => match args.as_deref() {
                None | Some("1") => ColumnType::boolean(),
                Some(n) => ColumnType::plain(format!("BIT({})", n)),
            },
            TypeRule::Sized(sql) => match args {
                Some(n) => ColumnType::plain(format!("{}({})", sql, n)),
                None => ColumnType::plain(sql),
            },
            TypeRule::Precision(sql) => match args {
                Some(n) if n.chars().all(|c| c.is_ascii_digit()) => {
                    ColumnType::plain(format!("{}({})", sql, n))
                }
                _ => ColumnType::plain(sql),
            },
            TypeRule::Numeric => match args {
                Some(ps) => ColumnType::plain(format!("NUMERIC({})", ps.replace(' ', ""))),
                None => ColumnType::plain("NUMERIC"),
            },
            TypeRule::Enum => {
                let values = args.map(|a| enum_literals(&a)).unwrap_or_default();
                if values.is_empty() {
                    return Err(unmapped());
                }
                ColumnType {
                    allowed_values: Some(values),
                    ..ColumnType::plain("TEXT")
                }
            }
        };

        if column.auto_increment {
            if !mapped.is_integer() {
                return Err(ConversionError::UnsupportedConstraint {
                    table: table.to_string(),
                    detail: format!(
                        "정수가 아닌 AUTO_INCREMENT 컬럼 {} ({})",
                        column.name, column.source_type
                    ),
                });
            }
            mapped.identity = true;
        }

        Ok(mapped)
    }
}

/// 타입 괄호 인자 (`DECIMAL(10, 2)` → `10, 2`)
fn type_args(source_type: &str) -> Option<String> {
    let open = source_type.find('(')?;
    let close = source_type.rfind(')')?;
    (close > open).then(|| source_type[open + 1..close].trim().to_string())
}

/// ENUM 인자를 PostgreSQL 문자열 리터럴 목록으로 변환
fn enum_literals(args: &str) -> Vec<String> {
    split_top_level(args, ',')
        .iter()
        .filter_map(|raw| match DefaultValue::from_raw(raw) {
            DefaultValue::Text(value) => Some(format!("'{}'", value.replace('\'', "''"))),
            _ => None,
        })
        .collect()
}
