//! 스키마 분석 보고서 (사람용 텍스트 / JSON).

use std::{fmt, fs, path::Path};

use serde::Serialize;

use super::models::*;
use crate::error::EmissionError;

/// 보고서용 테이블 요약
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub name: String,
    pub target_name: String,
    pub columns: usize,
    pub primary_key: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<String>,
    pub timestamps: TimestampSupport,
    pub indexes: usize,
}

/// 분석 보고서
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// 분석 대상 (파일 경로)
    pub source: String,
    pub summary: SchemaSummary,
    pub tables: Vec<TableReport>,
    /// 명시/추론 관계 (origin으로 구분)
    pub relationships: Vec<Relationship>,
    pub ambiguous_references: Vec<AmbiguousReference>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    /// 스키마 모델에서 보고서 생성
    pub fn from_model(source: &str, model: &SchemaModel) -> Self {
        Self {
            source: source.to_string(),
            summary: model.summary().clone(),
            tables: model
                .tables()
                .iter()
                .map(|t| TableReport {
                    name: t.name.clone(),
                    target_name: t.target_name.clone(),
                    columns: t.columns.len(),
                    primary_key: t.primary_key.clone(),
                    auto_increment: t.auto_increment.clone(),
                    timestamps: t.timestamps,
                    indexes: t.indexes.len(),
                })
                .collect(),
            relationships: model.relationships().to_vec(),
            ambiguous_references: model.ambiguous_references().to_vec(),
            diagnostics: model.diagnostics().to_vec(),
        }
    }

    /// 사람의 검토가 필요한 항목이 있는지 확인 (모호한 참조)
    pub fn needs_review(&self) -> bool {
        !self.ambiguous_references.is_empty()
    }

    /// JSON 문자열
    pub fn to_json(&self) -> Result<String, EmissionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON 파일로 저장
    pub fn save_json(&self, path: &Path) -> Result<(), EmissionError> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| EmissionError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| EmissionError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

const BANNER: &str = "═══════════════════════════════════════════════════════════════";
const RULE: &str = "───────────────────────────────────────────────────────────────";

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", BANNER)?;
        writeln!(f, "                    스키마 분석 보고서")?;
        writeln!(f, "{}", BANNER)?;
        writeln!(f, "  대상: {}", self.source)?;
        writeln!(f)?;
        writeln!(f, "{}", self.summary)?;
        writeln!(f)?;

        writeln!(f, "{}", RULE)?;
        writeln!(f, "📋 테이블")?;
        writeln!(f, "{}", RULE)?;
        for t in &self.tables {
            writeln!(
                f,
                "  {} → {} (컬럼 {}, PK [{}], 인덱스 {})",
                t.name,
                t.target_name,
                t.columns,
                t.primary_key.join(", "),
                t.indexes
            )?;
        }

        if !self.relationships.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", RULE)?;
            writeln!(f, "🔗 관계")?;
            writeln!(f, "{}", RULE)?;
            for r in &self.relationships {
                writeln!(
                    f,
                    "  [{}] {}.{} → {}.{}",
                    r.origin, r.table, r.column, r.referenced_table, r.referenced_column
                )?;
            }
        }

        if !self.diagnostics.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", RULE)?;
            writeln!(f, "🔍 진단")?;
            writeln!(f, "{}", RULE)?;
            let mut sorted: Vec<&Diagnostic> = self.diagnostics.iter().collect();
            sorted.sort_by(|a, b| b.severity.cmp(&a.severity));
            for (i, diag) in sorted.iter().enumerate() {
                writeln!(f)?;
                writeln!(f, "{}. {}", i + 1, diag)?;
            }
        }

        writeln!(f)?;
        write!(f, "{}", BANNER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;

    const DDL: &str = "CREATE TABLE tbl_product (product_id INT AUTO_INCREMENT PRIMARY KEY, product_name VARCHAR(255));\n\
                       CREATE TABLE tbl_order (order_id INT AUTO_INCREMENT PRIMARY KEY, product_id INT);";

    #[test]
    fn test_report_json_distinguishes_origin() {
        let model = parse_schema(DDL).unwrap();
        let report = AnalysisReport::from_model("shop.sql", &model);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["summary"]["total_tables"], 2);
        assert_eq!(json["relationships"][0]["origin"], "implied");
        assert_eq!(json["tables"][1]["target_name"], "orders");
        assert!(!report.needs_review());
    }

    #[test]
    fn test_report_display() {
        let model = parse_schema(DDL).unwrap();
        let output = AnalysisReport::from_model("shop.sql", &model).to_string();
        assert!(output.contains("스키마 분석 보고서"));
        assert!(output.contains("[implied] tbl_order.product_id → tbl_product.product_id"));
    }

    #[test]
    fn test_save_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/analysis.json");
        let model = parse_schema(DDL).unwrap();
        AnalysisReport::from_model("shop.sql", &model)
            .save_json(&path)
            .unwrap();
        assert!(path.exists());
    }
}
