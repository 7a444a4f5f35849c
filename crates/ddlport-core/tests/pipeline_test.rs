//! 분석 → 변환 → 마이그레이션 생성 통합 테스트
//!
//! phpMyAdmin 덤프 형식의 레거시 쇼핑몰 스키마(`fixtures/legacy_shop.sql`)를 사용합니다.
//! 자식 테이블이 부모보다 먼저 선언되고, 키와 AUTO_INCREMENT가 뒤쪽 ALTER 문에서
//! 추가되는 덤프 특유의 구조를 그대로 담고 있습니다.

use std::collections::HashMap;
use std::path::PathBuf;

use ddlport_core::convert::TypeMap;
use ddlport_core::schema::RelationshipOrigin;
use ddlport_core::{
    convert_schema, generate_migrations, parse_schema, parse_schema_from_file, save_migrations,
    ConversionError, DialectConverter, EmissionError, MigrationKind, SchemaModel, SchemaSummary,
};

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/legacy_shop.sql")
}

fn shop_model() -> SchemaModel {
    parse_schema_from_file(&fixture_path()).expect("fixture should parse")
}

// ============================================================================
// 분석
// ============================================================================

#[test]
fn test_legacy_shop_tables_and_targets() {
    let model = shop_model();

    let targets: Vec<(&str, &str)> = model
        .tables()
        .iter()
        .map(|t| (t.name.as_str(), t.target_name.as_str()))
        .collect();
    assert_eq!(
        targets,
        vec![
            ("tbl_category", "categories"),
            ("tbl_customer_account", "customers"),
            ("tbl_order_detail", "order_items"),
            ("tbl_product", "products"),
            ("tbl_orders", "orders"),
            ("tbl_cart", "cart_items"),
            ("tbl_review", "reviews"),
        ]
    );

    // ALTER 문으로 뒤늦게 추가된 키와 AUTO_INCREMENT
    let detail = model.table("tbl_order_detail").unwrap();
    assert_eq!(detail.primary_key, vec!["order_detail_id"]);
    assert_eq!(detail.auto_increment.as_deref(), Some("order_detail_id"));

    let orders = model.table("tbl_orders").unwrap();
    assert_eq!(orders.auto_increment.as_deref(), Some("order_id"));
    assert_eq!(orders.indexes.len(), 1);

    let review = model.table("tbl_review").unwrap();
    assert_eq!(review.indexes[0].columns, vec!["product_id"]);
}

#[test]
fn test_legacy_shop_relationships() {
    let model = shop_model();
    let summary = model.summary();

    assert_eq!(summary.total_tables, 7);
    assert_eq!(summary.explicit_relationships, 2);
    assert_eq!(summary.implied_relationships, 7);
    assert_eq!(summary.ambiguous_references, 0);

    let implied: Vec<(&str, &str, &str)> = model
        .relationships()
        .iter()
        .filter(|r| r.origin == RelationshipOrigin::Implied)
        .map(|r| (r.table.as_str(), r.column.as_str(), r.referenced_table.as_str()))
        .collect();
    assert!(implied.contains(&("tbl_order_detail", "order_id", "tbl_orders")));
    assert!(implied.contains(&("tbl_cart", "customer_id", "tbl_customer_account")));
    assert!(implied.contains(&("tbl_review", "product_id", "tbl_product")));

    // 명시적 FK가 있는 컬럼은 다시 추론하지 않음
    assert!(!implied.iter().any(|(t, c, _)| *t == "tbl_orders" && *c == "customer_id"));
    // 자기 테이블 PK는 관계가 아님
    assert!(!implied.iter().any(|(t, c, _)| *t == "tbl_cart" && *c == "cart_id"));
}

#[test]
fn test_summary_is_idempotent() {
    let first = shop_model();
    let second = shop_model();

    assert_eq!(first.summary(), second.summary());
    assert_eq!(
        first.summary(),
        &SchemaSummary::compute(
            first.tables(),
            first.relationships(),
            first.ambiguous_references()
        )
    );
}

// ============================================================================
// 변환
// ============================================================================

#[test]
fn test_scenario_a_parent_before_child() {
    let model = parse_schema(
        "CREATE TABLE tbl_product (product_id INT AUTO_INCREMENT PRIMARY KEY, product_name VARCHAR(255));\n\
         CREATE TABLE tbl_order (order_id INT AUTO_INCREMENT PRIMARY KEY, product_id INT);",
    )
    .unwrap();

    assert_eq!(model.tables().len(), 2);
    assert_eq!(model.relationships().len(), 1);
    let rel = &model.relationships()[0];
    assert_eq!(rel.origin, RelationshipOrigin::Implied);
    assert_eq!(
        (rel.table.as_str(), rel.column.as_str()),
        ("tbl_order", "product_id")
    );
    assert_eq!(
        (rel.referenced_table.as_str(), rel.referenced_column.as_str()),
        ("tbl_product", "product_id")
    );

    let result = convert_schema(&model).unwrap();
    assert_eq!(result.table_order, vec!["products", "orders"]);
    assert!(result.drop[0].contains("\"orders\""));
    assert!(result.drop[1].contains("\"products\""));
}

#[test]
fn test_scenario_b_unregistered_enum() {
    let model = parse_schema(
        "CREATE TABLE tbl_flag (flag_id INT PRIMARY KEY, kind ENUM('a','b') NOT NULL);",
    )
    .unwrap();
    let converter = DialectConverter::new().with_type_map(TypeMap::postgres().without("enum"));

    let err = converter.convert(&model).unwrap_err();
    assert!(matches!(err, ConversionError::UnmappedType { .. }));

    let message = err.to_string();
    assert!(message.contains("tbl_flag"));
    assert!(message.contains("kind"));
    assert!(message.contains("ENUM('a','b')"));
}

#[test]
fn test_legacy_shop_topological_soundness() {
    let model = shop_model();
    let result = convert_schema(&model).unwrap();

    assert_eq!(
        result.table_order,
        vec![
            "categories",
            "customers",
            "products",
            "orders",
            "order_items",
            "cart_items",
            "reviews",
        ]
    );

    let position: HashMap<&str, usize> = result
        .table_order
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();
    for rel in model.relationships() {
        let child = &model.table(&rel.table).unwrap().target_name;
        let parent = &model.table(&rel.referenced_table).unwrap().target_name;
        if child != parent {
            assert!(
                position[parent.as_str()] < position[child.as_str()],
                "{} 는 {} 보다 먼저 생성되어야 함",
                parent,
                child
            );
        }
    }

    let mut reversed = result.table_order.clone();
    reversed.reverse();
    for (drop, table) in result.drop.iter().zip(&reversed) {
        assert!(drop.contains(&format!("\"{}\"", table)));
    }
}

#[test]
fn test_legacy_shop_postgres_output() {
    let result = convert_schema(&shop_model()).unwrap();
    let sql = &result.complete_sql;

    assert!(sql.contains("GENERATED BY DEFAULT AS IDENTITY"));
    assert!(sql.contains("\"full_name\" VARCHAR(120)"));
    assert!(sql.contains("'cancelled'"));
    assert!(sql.contains("\"is_active\" BOOLEAN NOT NULL DEFAULT TRUE"));
    assert!(sql.contains("COMMENT ON TABLE \"categories\""));
    assert!(!sql.contains('`'));

    // drop → create → index → foreign key
    let drop_at = sql.find("DROP TABLE").unwrap();
    let create_at = sql.find("CREATE TABLE").unwrap();
    let fk_at = sql.find("FOREIGN KEY").unwrap();
    assert!(drop_at < create_at && create_at < fk_at);

    assert_eq!(result.foreign_key.len(), 9);
    let codes: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert!(codes.contains(&"CNV002"), "zero date 경고 없음: {:?}", codes);
    assert!(codes.contains(&"CNV003"), "ON UPDATE 경고 없음: {:?}", codes);
}

// ============================================================================
// 마이그레이션
// ============================================================================

#[test]
fn test_scenario_c_deterministic_and_collision_report() {
    let model = shop_model();
    let first = generate_migrations(&model).unwrap();
    let second = generate_migrations(&model).unwrap();
    assert_eq!(first, second);

    let table_units = first.iter().filter(|u| u.kind == MigrationKind::Table).count();
    assert_eq!(table_units, 7);
    assert!(first
        .iter()
        .skip(table_units)
        .all(|u| u.kind == MigrationKind::ForeignKey));

    let dir = tempfile::tempdir().unwrap();
    save_migrations(&first, dir.path(), false).unwrap();

    match save_migrations(&second, dir.path(), false).unwrap_err() {
        EmissionError::AlreadyExists { files } => {
            assert_eq!(files.len(), second.len() * 2);
            for unit in &second {
                assert!(files.contains(&dir.path().join(unit.up_filename())));
                assert!(files.contains(&dir.path().join(unit.down_filename())));
            }
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_migration_versions_sort_in_execution_order() {
    let units = generate_migrations(&shop_model()).unwrap();

    let mut names: Vec<String> = units.iter().map(|u| u.up_filename()).collect();
    let expected = names.clone();
    names.sort();
    assert_eq!(names, expected);

    let orders_fk = units
        .iter()
        .find(|u| u.description == "add_orders_foreign_keys")
        .unwrap();
    assert!(orders_fk.up.contains("REFERENCES \"customers\""));
    assert!(orders_fk.up.contains("ON DELETE CASCADE"));
    assert_eq!(
        orders_fk.up.matches("ADD CONSTRAINT").count(),
        orders_fk.down.matches("DROP CONSTRAINT").count()
    );
}
