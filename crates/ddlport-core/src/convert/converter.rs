//! MySQL 스키마 모델 → PostgreSQL DDL 변환기.
//!
//! 변환은 두 단계입니다. [`DialectConverter::plan`]이 테이블별 구문 트리를 생성 순서대로
//! 만들고, [`ConversionPlan::render`]가 방언으로 직렬화해 네 개의 문장 그룹을 만듭니다.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::graph::DependencyGraph;
use super::statement::*;
use super::types::TypeMap;
use crate::error::ConversionError;
use crate::naming::column_name;
use crate::schema::{
    DefaultValue, Diagnostic, RelationshipOrigin, SchemaModel, Severity, Table,
};

/// 변환 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConverterOptions {
    /// 다중 컬럼 UNIQUE 인덱스 허용 (기본: 중단)
    pub allow_composite_unique: bool,
}

/// 테이블 하나의 변환 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    /// 원본 테이블명
    pub source: String,
    /// 대상 테이블명
    pub target: String,
    pub create: CreateTable,
    pub indexes: Vec<CreateIndex>,
    /// 이 테이블이 소유한 외래키 (자기 참조 포함)
    pub foreign_keys: Vec<AddForeignKey>,
}

/// 생성 순서로 정렬된 변환 계획
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    /// 생성 순서 (부모 먼저)
    pub tables: Vec<TablePlan>,
    pub diagnostics: Vec<Diagnostic>,
}

/// 방언 변환 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub create: Vec<String>,
    pub foreign_key: Vec<String>,
    pub index: Vec<String>,
    /// 생성 역순 (자식 먼저)
    pub drop: Vec<String>,
    /// 실행 순서: drop → create → index → foreign_key
    pub complete_sql: String,
    /// 생성 순서의 대상 테이블명
    pub table_order: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionPlan {
    /// 방언으로 직렬화
    pub fn render<D: Dialect>(&self, dialect: &D) -> ConversionResult {
        let create: Vec<String> = self
            .tables
            .iter()
            .map(|t| dialect.create_table(&t.create))
            .collect();
        let index: Vec<String> = self
            .tables
            .iter()
            .flat_map(|t| t.indexes.iter().map(|i| dialect.create_index(i)))
            .collect();
        let foreign_key: Vec<String> = self
            .tables
            .iter()
            .flat_map(|t| t.foreign_keys.iter().map(|fk| dialect.add_foreign_key(fk)))
            .collect();
        let drop: Vec<String> = self
            .tables
            .iter()
            .rev()
            .map(|t| dialect.drop_table(&t.target))
            .collect();

        let sections = [
            ("DROP TABLES (자식 → 부모)", &drop),
            ("CREATE TABLES (부모 → 자식)", &create),
            ("INDEXES", &index),
            ("FOREIGN KEYS", &foreign_key),
        ];

        let mut complete_sql = format!(
            "-- ddlport: MySQL → {} 변환 ({} 테이블)\n",
            dialect.name(),
            self.tables.len()
        );
        for (title, statements) in sections {
            if statements.is_empty() {
                continue;
            }
            complete_sql.push_str(&format!("\n-- ===== {} =====\n\n", title));
            complete_sql.push_str(&statements.join("\n\n"));
            complete_sql.push('\n');
        }

        ConversionResult {
            create,
            foreign_key,
            index,
            drop,
            complete_sql,
            table_order: self.tables.iter().map(|t| t.target.clone()).collect(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// 방언 변환기
#[derive(Debug, Clone, Default)]
pub struct DialectConverter<D: Dialect = PostgresDialect> {
    dialect: D,
    type_map: TypeMap,
    options: ConverterOptions,
}

impl DialectConverter<PostgresDialect> {
    /// PostgreSQL 기본 변환기
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Dialect> DialectConverter<D> {
    /// 다른 방언으로 변환기 생성
    pub fn with_dialect(dialect: D) -> Self {
        Self {
            dialect,
            type_map: TypeMap::postgres(),
            options: ConverterOptions::default(),
        }
    }

    /// 타입 매핑 테이블 지정
    pub fn with_type_map(mut self, type_map: TypeMap) -> Self {
        self.type_map = type_map;
        self
    }

    /// 변환 옵션 지정
    pub fn with_options(mut self, options: ConverterOptions) -> Self {
        self.options = options;
        self
    }

    /// 사용 중인 방언
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// 변환 후 직렬화
    pub fn convert(&self, model: &SchemaModel) -> Result<ConversionResult, ConversionError> {
        let plan = self.plan(model)?;
        let result = plan.render(&self.dialect);

        info!(
            tables = result.create.len(),
            foreign_keys = result.foreign_key.len(),
            indexes = result.index.len(),
            diagnostics = result.diagnostics.len(),
            "스키마 변환 완료"
        );

        Ok(result)
    }

    /// 생성 순서로 정렬된 테이블별 구문 트리 생성
    pub fn plan(&self, model: &SchemaModel) -> Result<ConversionPlan, ConversionError> {
        check_duplicate_targets(model)?;

        let mut diagnostics = Vec::new();
        let order = self.create_order(model, &mut diagnostics)?;

        let mut tables = Vec::with_capacity(order.len());
        for name in &order {
            let table = model
                .table(name)
                .ok_or_else(|| ConversionError::UnresolvedRelationship {
                    table: name.clone(),
                    column: String::new(),
                    referenced_table: name.clone(),
                })?;
            tables.push(self.plan_table(model, table, &mut diagnostics)?);
        }

        Ok(ConversionPlan {
            tables,
            diagnostics,
        })
    }

    /// 위상 정렬 기반 생성 순서
    ///
    /// 명시 외래키 순환은 에러, 추론 관계로 인한 순환은 명시 관계만으로 재정렬하고 경고합니다.
    fn create_order(
        &self,
        model: &SchemaModel,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<String>, ConversionError> {
        let names: Vec<&str> = model.tables().iter().map(|t| t.name.as_str()).collect();
        let mut explicit = DependencyGraph::new(names.iter().copied());
        let mut all = DependencyGraph::new(names.iter().copied());

        for rel in model.relationships() {
            let (Some(child), Some(parent)) =
                (model.table(&rel.table), model.table(&rel.referenced_table))
            else {
                return Err(ConversionError::UnresolvedRelationship {
                    table: rel.table.clone(),
                    column: rel.column.clone(),
                    referenced_table: rel.referenced_table.clone(),
                });
            };
            if child.column(&rel.column).is_none()
                || parent.column(&rel.referenced_column).is_none()
            {
                return Err(ConversionError::UnresolvedRelationship {
                    table: rel.table.clone(),
                    column: rel.column.clone(),
                    referenced_table: rel.referenced_table.clone(),
                });
            }

            if rel.origin == RelationshipOrigin::Explicit {
                explicit.add_dependency(&child.name, &parent.name);
            }
            all.add_dependency(&child.name, &parent.name);
        }

        if let Some(cycle) = explicit.find_cycles().into_iter().next() {
            return Err(ConversionError::CyclicForeignKeys { cycle });
        }

        match all.topological_order() {
            Ok(order) => Ok(order),
            Err(stuck) => {
                warn!(tables = ?stuck, "추론 관계로 인한 순환, 명시 관계만으로 정렬");
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        "CNV005",
                        &format!(
                            "추론 관계가 순환을 만들어 명시 관계만으로 생성 순서 결정: {}",
                            stuck.join(", ")
                        ),
                    )
                    .with_suggestion("추론된 관계를 검토하고 필요하면 명시적 FOREIGN KEY로 선언"),
                );
                explicit.topological_order().map_err(|cycle| {
                    ConversionError::CyclicForeignKeys { cycle }
                })
            }
        }
    }

    fn plan_table(
        &self,
        model: &SchemaModel,
        table: &Table,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<TablePlan, ConversionError> {
        let target = table.target_name.clone();
        let target_column = |name: &str| column_name(name);

        check_duplicate_columns(table)?;

        let mut columns = Vec::with_capacity(table.columns.len());
        let mut constraints = Vec::new();

        for column in &table.columns {
            let mapped = self.type_map.map_column(&table.name, column)?;
            let name = target_column(&column.name);

            let default = if mapped.identity {
                None
            } else {
                self.translate_default(table, column, mapped.boolean, diagnostics)
            };

            if column.on_update_current_timestamp {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        "CNV003",
                        "ON UPDATE CURRENT_TIMESTAMP는 변환되지 않음",
                    )
                    .with_table(&table.name)
                    .with_column(&column.name)
                    .with_suggestion("BEFORE UPDATE 트리거로 수정 시각 갱신"),
                );
            }

            if mapped.narrowed {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        "CNV006",
                        &format!(
                            "{}를 {}로 변환하여 상한이 9223372036854775807로 줄어듦",
                            column.source_type, mapped.sql
                        ),
                    )
                    .with_table(&table.name)
                    .with_column(&column.name)
                    .with_suggestion("기존 데이터의 최댓값이 BIGINT 범위 안인지 확인"),
                );
            }

            if let Some(values) = mapped.allowed_values.clone() {
                constraints.push(TableConstraint::CheckIn {
                    name: self
                        .dialect
                        .truncate_identifier(&format!("chk_{}_{}", target, name)),
                    column: name.clone(),
                    values,
                });
            }

            columns.push(ColumnDef {
                name,
                data_type: mapped.sql,
                identity: mapped.identity,
                nullable: column.nullable && !mapped.identity,
                default,
                unique: column.unique,
                comment: column.comment.clone(),
            });
        }

        if !table.primary_key.is_empty() {
            constraints.insert(
                0,
                TableConstraint::PrimaryKey {
                    columns: table.primary_key.iter().map(|c| target_column(c)).collect(),
                },
            );
        }

        let mut indexes = Vec::new();
        for index in &table.indexes {
            let cols: Vec<String> = index.columns.iter().map(|c| target_column(c)).collect();

            // 기본키와 동일한 인덱스는 중복
            let same_as_pk = index
                .columns
                .iter()
                .map(|c| c.to_lowercase())
                .eq(table.primary_key.iter().map(|c| c.to_lowercase()));
            if same_as_pk {
                continue;
            }

            if index.unique && cols.len() > 1 && !self.options.allow_composite_unique {
                return Err(ConversionError::UnsupportedConstraint {
                    table: table.name.clone(),
                    detail: format!(
                        "다중 컬럼 UNIQUE 인덱스 '{}' ({})",
                        index.name,
                        index.columns.join(", ")
                    ),
                });
            }

            let prefix = if index.unique { "uq" } else { "idx" };
            indexes.push(CreateIndex {
                name: self
                    .dialect
                    .truncate_identifier(&format!("{}_{}_{}", prefix, target, cols.join("_"))),
                table: target.clone(),
                columns: cols,
                unique: index.unique,
            });
        }

        let mut foreign_keys = Vec::new();
        for rel in model.relationships_from(&table.name) {
            let parent = model.table(&rel.referenced_table).ok_or_else(|| {
                ConversionError::UnresolvedRelationship {
                    table: rel.table.clone(),
                    column: rel.column.clone(),
                    referenced_table: rel.referenced_table.clone(),
                }
            })?;
            let column = target_column(&rel.column);

            if rel.is_self_referential() {
                debug!(table = %target, column = %column, "자기 참조 외래키는 외래키 그룹으로 연기");
            }

            foreign_keys.push(AddForeignKey {
                table: target.clone(),
                name: self
                    .dialect
                    .truncate_identifier(&format!("fk_{}_{}", target, column)),
                column,
                referenced_table: parent.target_name.clone(),
                referenced_column: target_column(&rel.referenced_column),
                on_delete: rel.on_delete,
                on_update: rel.on_update,
            });
        }

        Ok(TablePlan {
            source: table.name.clone(),
            target: target.clone(),
            create: CreateTable {
                name: target,
                columns,
                constraints,
                comment: table.comment.clone(),
            },
            indexes,
            foreign_keys,
        })
    }

    /// 기본값 변환 (boolean 0/1, zero date 제거)
    fn translate_default(
        &self,
        table: &Table,
        column: &crate::schema::Column,
        boolean: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<String> {
        let default = column.default.as_ref()?;

        if boolean {
            let raw = match default {
                DefaultValue::Number(n) | DefaultValue::Text(n) => n.trim().to_string(),
                DefaultValue::Expression(e) => e.trim().to_lowercase(),
                DefaultValue::Null => return Some("NULL".to_string()),
                DefaultValue::CurrentTimestamp => String::new(),
            };
            match raw.as_str() {
                "0" | "false" | "b'0'" => return Some("FALSE".to_string()),
                "1" | "true" | "b'1'" => return Some("TRUE".to_string()),
                _ => {}
            }
        }

        match default {
            DefaultValue::Null => Some("NULL".to_string()),
            DefaultValue::CurrentTimestamp => Some("CURRENT_TIMESTAMP".to_string()),
            DefaultValue::Number(n) => Some(n.clone()),
            DefaultValue::Text(text) => {
                if text.starts_with("0000-00-00") {
                    diagnostics.push(
                        Diagnostic::new(
                            Severity::Warning,
                            "CNV002",
                            &format!("zero date 기본값 '{}' 제거", text),
                        )
                        .with_table(&table.name)
                        .with_column(&column.name)
                        .with_suggestion("NULL 허용 또는 유효한 날짜 기본값 지정"),
                    );
                    return None;
                }
                Some(self.dialect.quote_literal(text))
            }
            DefaultValue::Expression(expr) => {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        "CNV004",
                        &format!("표현식 기본값 '{}'를 그대로 사용", expr),
                    )
                    .with_table(&table.name)
                    .with_column(&column.name)
                    .with_suggestion("PostgreSQL에서 동일하게 동작하는지 확인"),
                );
                Some(expr.clone())
            }
        }
    }
}

/// 기본 PostgreSQL 변환기로 변환
pub fn convert_schema(model: &SchemaModel) -> Result<ConversionResult, ConversionError> {
    DialectConverter::new().convert(model)
}

/// 서로 다른 원본 테이블이 같은 대상 이름을 갖지 않는지 확인
fn check_duplicate_targets(model: &SchemaModel) -> Result<(), ConversionError> {
    let mut by_target: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for table in model.tables() {
        by_target
            .entry(table.target_name.to_lowercase())
            .or_default()
            .push(table.name.clone());
    }

    match by_target.into_iter().find(|(_, sources)| sources.len() > 1) {
        Some((target, sources)) => Err(ConversionError::DuplicateTargetName { target, sources }),
        None => Ok(()),
    }
}

/// snake_case 변환 후 컬럼명 충돌 확인
fn check_duplicate_columns(table: &Table) -> Result<(), ConversionError> {
    let mut by_target: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for column in &table.columns {
        by_target
            .entry(column_name(&column.name))
            .or_default()
            .push(column.name.clone());
    }

    match by_target.into_iter().find(|(_, sources)| sources.len() > 1) {
        Some((target, sources)) => Err(ConversionError::DuplicateTargetName {
            target: format!("{}.{}", table.target_name, target),
            sources,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;

    const SCENARIO_A: &str = "CREATE TABLE tbl_product (product_id INT AUTO_INCREMENT PRIMARY KEY, product_name VARCHAR(255));\n\
                              CREATE TABLE tbl_order (order_id INT AUTO_INCREMENT PRIMARY KEY, product_id INT);";

    #[test]
    fn test_scenario_a_order() {
        let model = parse_schema(SCENARIO_A).unwrap();
        let result = convert_schema(&model).unwrap();

        assert_eq!(result.table_order, vec!["products", "orders"]);
        assert!(result.create[0].starts_with("CREATE TABLE \"products\""));
        assert_eq!(
            result.drop,
            vec![
                "DROP TABLE IF EXISTS \"orders\";",
                "DROP TABLE IF EXISTS \"products\";"
            ]
        );
        assert_eq!(result.foreign_key.len(), 1);
        assert!(result.foreign_key[0].contains("\"fk_orders_product_id\""));
        assert!(result.foreign_key[0].contains("REFERENCES \"products\" (\"product_id\")"));
    }

    #[test]
    fn test_child_declared_first_is_reordered() {
        let ddl = "CREATE TABLE tbl_order (order_id INT PRIMARY KEY, product_id INT, \
                   FOREIGN KEY (product_id) REFERENCES tbl_product (product_id));\n\
                   CREATE TABLE tbl_product (product_id INT PRIMARY KEY);";
        let result = convert_schema(&parse_schema(ddl).unwrap()).unwrap();
        assert_eq!(result.table_order, vec!["products", "orders"]);
    }

    #[test]
    fn test_complete_sql_section_order() {
        let result = convert_schema(&parse_schema(SCENARIO_A).unwrap()).unwrap();
        let sql = &result.complete_sql;

        let drop = sql.find("DROP TABLE").unwrap();
        let create = sql.find("CREATE TABLE").unwrap();
        let fk = sql.find("ADD CONSTRAINT").unwrap();
        assert!(drop < create && create < fk);
    }

    #[test]
    fn test_scenario_b_unmapped_enum() {
        let ddl = "CREATE TABLE tbl_order (order_id INT PRIMARY KEY, status ENUM('a','b'));";
        let model = parse_schema(ddl).unwrap();
        let converter = DialectConverter::new().with_type_map(TypeMap::postgres().without("enum"));

        match converter.convert(&model).unwrap_err() {
            ConversionError::UnmappedType {
                table,
                column,
                source_type,
            } => {
                assert_eq!(table, "tbl_order");
                assert_eq!(column, "status");
                assert_eq!(source_type, "ENUM('a','b')");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_enum_check_and_boolean_default() {
        let ddl = "CREATE TABLE tbl_product (product_id INT PRIMARY KEY, \
                   status ENUM('draft','live') NOT NULL DEFAULT 'draft', \
                   is_active TINYINT(1) NOT NULL DEFAULT '1', \
                   created_at DATETIME NOT NULL DEFAULT '0000-00-00 00:00:00');";
        let result = convert_schema(&parse_schema(ddl).unwrap()).unwrap();
        let create = &result.create[0];

        assert!(create.contains("CONSTRAINT \"chk_products_status\" CHECK (\"status\" IN ('draft', 'live'))"));
        assert!(create.contains("\"is_active\" BOOLEAN NOT NULL DEFAULT TRUE"));
        assert!(create.contains("\"created_at\" TIMESTAMP NOT NULL,"));
        assert!(result.diagnostics.iter().any(|d| d.code == "CNV002"));
    }

    #[test]
    fn test_unsigned_bigint_keys_stay_integer() {
        let ddl = "CREATE TABLE `tbl_user` (\n\
                     `id` bigint(20) unsigned NOT NULL AUTO_INCREMENT,\n\
                     `email` varchar(255) NOT NULL,\n\
                     PRIMARY KEY (`id`)\n\
                   ) ENGINE=InnoDB;\n\
                   CREATE TABLE `tbl_order` (\n\
                     `id` bigint(20) unsigned NOT NULL AUTO_INCREMENT,\n\
                     `user_id` bigint(20) unsigned NOT NULL,\n\
                     PRIMARY KEY (`id`),\n\
                     CONSTRAINT `fk_order_user` FOREIGN KEY (`user_id`) REFERENCES `tbl_user` (`id`)\n\
                   ) ENGINE=InnoDB;";
        let result = convert_schema(&parse_schema(ddl).unwrap()).unwrap();

        assert!(result.create[0].contains("\"id\" BIGINT GENERATED"));
        assert!(result.create[1].contains("\"user_id\" BIGINT NOT NULL"));
        assert!(!result.complete_sql.contains("NUMERIC"));
        assert_eq!(result.foreign_key.len(), 1);

        let narrowed: Vec<_> = result.diagnostics.iter().filter(|d| d.code == "CNV006").collect();
        assert_eq!(narrowed.len(), 3);
    }

    #[test]
    fn test_bit_literal_defaults() {
        let ddl = "CREATE TABLE tbl_flag (id INT PRIMARY KEY, \
                   `active` bit(1) NOT NULL DEFAULT b'0', \
                   `deleted` bit(1) NOT NULL DEFAULT b'1', \
                   `mask` bit(4) DEFAULT b'0101');";
        let result = convert_schema(&parse_schema(ddl).unwrap()).unwrap();
        let create = &result.create[0];

        assert!(create.contains("\"active\" BOOLEAN NOT NULL DEFAULT FALSE"));
        assert!(create.contains("\"deleted\" BOOLEAN NOT NULL DEFAULT TRUE"));
        assert!(create.contains("\"mask\" BIT(4) DEFAULT b'0101'"));
    }

    #[test]
    fn test_explicit_cycle_is_error() {
        let ddl = "CREATE TABLE a (id INT PRIMARY KEY, b_id INT, FOREIGN KEY (b_id) REFERENCES b (id));\n\
                   CREATE TABLE b (id INT PRIMARY KEY, a_id INT, FOREIGN KEY (a_id) REFERENCES a (id));";
        let err = convert_schema(&parse_schema(ddl).unwrap()).unwrap_err();
        match err {
            ConversionError::CyclicForeignKeys { cycle } => {
                assert_eq!(cycle, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_deferred_to_foreign_keys() {
        let ddl = "CREATE TABLE tbl_category (category_id INT PRIMARY KEY, parent_id INT, \
                   FOREIGN KEY (parent_id) REFERENCES tbl_category (category_id));";
        let result = convert_schema(&parse_schema(ddl).unwrap()).unwrap();

        assert!(!result.create[0].contains("REFERENCES"));
        assert_eq!(result.foreign_key.len(), 1);
        assert!(result.foreign_key[0].contains("REFERENCES \"categories\""));
    }

    #[test]
    fn test_implied_cycle_falls_back_to_explicit_order() {
        let ddl = "CREATE TABLE tbl_member (member_id INT PRIMARY KEY, coupon_id INT);\n\
                   CREATE TABLE tbl_coupon (coupon_id INT PRIMARY KEY, member_id INT, \
                   FOREIGN KEY (member_id) REFERENCES tbl_member (member_id));";
        let result = convert_schema(&parse_schema(ddl).unwrap()).unwrap();

        assert_eq!(result.table_order, vec!["members", "coupons"]);
        assert!(result.diagnostics.iter().any(|d| d.code == "CNV005"));
    }

    #[test]
    fn test_composite_unique_requires_opt_in() {
        let ddl = "CREATE TABLE tbl_cart (cart_id INT PRIMARY KEY, customer_id INT, product_id INT, \
                   UNIQUE KEY uq_cart (customer_id, product_id));";
        let model = parse_schema(ddl).unwrap();

        assert!(matches!(
            convert_schema(&model).unwrap_err(),
            ConversionError::UnsupportedConstraint { .. }
        ));

        let result = DialectConverter::new()
            .with_options(ConverterOptions {
                allow_composite_unique: true,
            })
            .convert(&model)
            .unwrap();
        assert!(result.index[0].starts_with("CREATE UNIQUE INDEX IF NOT EXISTS \"uq_cart_items_customer_id_product_id\""));
    }

    #[test]
    fn test_duplicate_target_name() {
        let ddl = "CREATE TABLE tbl_item (id INT PRIMARY KEY);\nCREATE TABLE tb_item (id INT PRIMARY KEY);";
        match convert_schema(&parse_schema(ddl).unwrap()).unwrap_err() {
            ConversionError::DuplicateTargetName { target, sources } => {
                assert_eq!(target, "items");
                assert_eq!(sources, vec!["tbl_item", "tb_item"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_topological_soundness() {
        let ddl = "CREATE TABLE tbl_order_detail (detail_id INT PRIMARY KEY, order_id INT, product_id INT);\n\
                   CREATE TABLE tbl_orders (order_id INT PRIMARY KEY, customer_id INT);\n\
                   CREATE TABLE tbl_product (product_id INT PRIMARY KEY, category_id INT);\n\
                   CREATE TABLE tbl_category (category_id INT PRIMARY KEY);\n\
                   CREATE TABLE tbl_customer_account (customer_id INT PRIMARY KEY);";
        let model = parse_schema(ddl).unwrap();
        let result = convert_schema(&model).unwrap();

        let position = |target: &str| result.table_order.iter().position(|t| t == target).unwrap();
        for rel in model.relationships() {
            let child = &model.table(&rel.table).unwrap().target_name;
            let parent = &model.table(&rel.referenced_table).unwrap().target_name;
            assert!(position(parent) < position(child), "{} → {}", child, parent);
        }
        assert_eq!(model.relationships().len(), 4);
    }
}
