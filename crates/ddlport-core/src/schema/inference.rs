//! 명명 규칙 기반 관계 추론.
//!
//! 완성된 테이블 목록만 보고 결과를 돌려주는 순수 함수입니다. 모델은 수정하지 않으며
//! 추론 관계는 항상 `RelationshipOrigin::Implied`로 표시됩니다.

use std::collections::BTreeSet;

use super::models::{AmbiguousReference, Relationship, RelationshipOrigin, Table};
use crate::naming::{singularize, table_stem};

/// 컬럼 하나에 대한 추론 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceOutcome {
    /// 단일 후보와 매칭 → 추론 관계
    Implied(Relationship),
    /// 동일하게 구체적인 후보가 여럿 → 추론하지 않음
    Ambiguous(AmbiguousReference),
    /// 후보 테이블에 단일 컬럼 기본키가 없음
    MissingKey {
        table: String,
        column: String,
        candidate: String,
    },
}

/// 테이블이 참조될 때 쓰이는 이름 어간
///
/// `tbl_customer_account`(대상 `customers`) → `customer_account`, `customer`, `customers`
fn reference_stems(table: &Table) -> BTreeSet<String> {
    let stem = table_stem(&table.name);
    let target = table.target_name.to_lowercase();

    [singularize(&stem), stem, singularize(&target), target]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
}

/// 컬럼명과 어간의 매칭 점수 (매칭 시 어간 길이)
///
/// `{stem}_id`, `{stem}id` 완전 일치 또는 `billing_{stem}_id`처럼 `_`로 구분된 접미사.
fn match_score(column: &str, stem: &str) -> Option<usize> {
    let patterns = [format!("{}_id", stem), format!("{}id", stem)];

    patterns
        .iter()
        .any(|p| column == p || column.ends_with(&format!("_{}", p)))
        .then_some(stem.len())
}

fn table_score(column: &str, table: &Table) -> Option<usize> {
    reference_stems(table)
        .iter()
        .filter_map(|stem| match_score(column, stem))
        .max()
}

/// 명시 관계가 없는 컬럼에 대해 관계 추론
pub fn infer_relationships(tables: &[Table], explicit: &[Relationship]) -> Vec<InferenceOutcome> {
    let mut outcomes = Vec::new();

    for table in tables {
        for column in &table.columns {
            let col_lower = column.name.to_lowercase();
            if !col_lower.ends_with("id") {
                continue;
            }

            let covered = explicit.iter().any(|r| {
                r.table.eq_ignore_ascii_case(&table.name)
                    && r.column.eq_ignore_ascii_case(&column.name)
            });
            if covered {
                continue;
            }

            let scored: Vec<(usize, &Table)> = tables
                .iter()
                .filter_map(|t| table_score(&col_lower, t).map(|score| (score, t)))
                .collect();

            let Some(best) = scored.iter().map(|(score, _)| *score).max() else {
                continue;
            };

            let winners: Vec<&Table> = scored
                .iter()
                .filter(|(score, _)| *score == best)
                .map(|(_, t)| *t)
                .collect();

            // 자기 테이블이 가장 구체적인 매칭이면 추론하지 않음 (예: 자신의 기본키)
            if winners.iter().any(|t| t.name.eq_ignore_ascii_case(&table.name)) {
                continue;
            }

            match winners.as_slice() {
                [only] => match only.single_primary_key() {
                    Some(pk) => outcomes.push(InferenceOutcome::Implied(Relationship {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        referenced_table: only.name.clone(),
                        referenced_column: pk.to_string(),
                        origin: RelationshipOrigin::Implied,
                        constraint_name: None,
                        on_delete: None,
                        on_update: None,
                    })),
                    None => outcomes.push(InferenceOutcome::MissingKey {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        candidate: only.name.clone(),
                    }),
                },
                many => outcomes.push(InferenceOutcome::Ambiguous(AmbiguousReference {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    candidates: many.iter().map(|t| t.name.clone()).collect(),
                })),
            }
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::TableRenamer;
    use crate::schema::models::{Column, TimestampSupport};

    fn column(name: &str, ordinal: usize) -> Column {
        Column {
            name: name.to_string(),
            source_type: "INT".to_string(),
            nullable: true,
            default: None,
            auto_increment: false,
            ordinal,
            unique: false,
            on_update_current_timestamp: false,
            comment: None,
        }
    }

    fn table(name: &str, pk: &[&str], cols: &[&str]) -> Table {
        Table {
            name: name.to_string(),
            target_name: TableRenamer::new().rename(name),
            columns: cols
                .iter()
                .enumerate()
                .map(|(i, c)| column(c, i + 1))
                .collect(),
            primary_key: pk.iter().map(|s| s.to_string()).collect(),
            auto_increment: None,
            timestamps: TimestampSupport::None,
            indexes: Vec::new(),
            comment: None,
        }
    }

    #[test]
    fn test_single_candidate_is_implied() {
        let tables = vec![
            table("tbl_product", &["product_id"], &["product_id", "product_name"]),
            table("tbl_order", &["order_id"], &["order_id", "product_id"]),
        ];

        let outcomes = infer_relationships(&tables, &[]);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            InferenceOutcome::Implied(rel) => {
                assert_eq!(rel.table, "tbl_order");
                assert_eq!(rel.column, "product_id");
                assert_eq!(rel.referenced_table, "tbl_product");
                assert_eq!(rel.referenced_column, "product_id");
                assert_eq!(rel.origin, RelationshipOrigin::Implied);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_equal_candidates_are_ambiguous() {
        let tables = vec![
            table("tbl_item", &["id"], &["id"]),
            table("tb_item", &["id"], &["id"]),
            table("tbl_wishlist", &["id"], &["id", "item_id"]),
        ];

        let outcomes = infer_relationships(&tables, &[]);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            InferenceOutcome::Ambiguous(amb) => {
                assert_eq!(amb.column, "item_id");
                assert_eq!(amb.candidates, vec!["tbl_item", "tb_item"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_longest_stem_wins() {
        let tables = vec![
            table("tbl_item", &["item_id"], &["item_id"]),
            table("tbl_order_item", &["order_item_id"], &["order_item_id"]),
            table("tbl_return", &["return_id"], &["return_id", "order_item_id"]),
        ];

        let outcomes = infer_relationships(&tables, &[]);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            InferenceOutcome::Implied(rel) => assert_eq!(rel.referenced_table, "tbl_order_item"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_target_name_and_role_prefix() {
        let tables = vec![
            table("tbl_customer_account", &["account_no"], &["account_no"]),
            table("tbl_orders", &["order_id"], &["order_id", "billing_customer_id"]),
        ];

        let outcomes = infer_relationships(&tables, &[]);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            InferenceOutcome::Implied(rel) => {
                assert_eq!(rel.referenced_table, "tbl_customer_account");
                assert_eq!(rel.referenced_column, "account_no");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_explicit_and_own_columns_skipped() {
        let tables = vec![
            table("tbl_product", &["product_id"], &["product_id"]),
            table("tbl_order", &["order_id"], &["order_id", "product_id"]),
        ];
        let explicit = vec![Relationship {
            table: "tbl_order".to_string(),
            column: "product_id".to_string(),
            referenced_table: "tbl_product".to_string(),
            referenced_column: "product_id".to_string(),
            origin: RelationshipOrigin::Explicit,
            constraint_name: None,
            on_delete: None,
            on_update: None,
        }];

        assert!(infer_relationships(&tables, &explicit).is_empty());
    }

    #[test]
    fn test_candidate_without_single_key() {
        let tables = vec![
            table("tbl_coupon", &[], &["code"]),
            table("tbl_order", &["order_id"], &["order_id", "coupon_id"]),
        ];

        let outcomes = infer_relationships(&tables, &[]);
        assert_eq!(
            outcomes,
            vec![InferenceOutcome::MissingKey {
                table: "tbl_order".to_string(),
                column: "coupon_id".to_string(),
                candidate: "tbl_coupon".to_string(),
            }]
        );
    }
}
