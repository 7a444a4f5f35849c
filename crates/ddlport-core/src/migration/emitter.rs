//! 마이그레이션 단위 생성 및 파일 출력.
//!
//! 테이블 단위를 생성 순서대로 먼저 만들고, 그 뒤에 테이블별 외래키 단위를 둡니다.
//! 실행 순서는 파일명(버전) 사전순과 같습니다.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use super::models::{MigrationKind, MigrationUnit};
use crate::convert::{ConversionResult, Dialect, DialectConverter, PostgresDialect};
use crate::error::{ConversionError, EmissionError};
use crate::schema::SchemaModel;

/// 기본 버전 기준일
pub const DEFAULT_BASE_DATE: &str = "20240101";

/// 컴포넌트 디렉토리 파일명
pub const COMPONENT_FILES: [&str; 4] = [
    "create_tables.sql",
    "foreign_keys.sql",
    "indexes.sql",
    "drop_tables.sql",
];

/// 마이그레이션 생성기
#[derive(Debug, Clone)]
pub struct MigrationEmitter<D: Dialect = PostgresDialect> {
    converter: DialectConverter<D>,
    base_date: String,
}

impl Default for MigrationEmitter<PostgresDialect> {
    fn default() -> Self {
        Self {
            converter: DialectConverter::new(),
            base_date: DEFAULT_BASE_DATE.to_string(),
        }
    }
}

impl MigrationEmitter<PostgresDialect> {
    /// 기본 PostgreSQL 변환기로 생성
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Dialect> MigrationEmitter<D> {
    /// 변환기 지정
    pub fn with_converter(converter: DialectConverter<D>) -> Self {
        Self {
            converter,
            base_date: DEFAULT_BASE_DATE.to_string(),
        }
    }

    /// 버전 기준일 지정 (YYYYMMDD)
    pub fn with_base_date(mut self, base_date: &str) -> Result<Self, EmissionError> {
        let valid = base_date.len() == 8 && base_date.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(EmissionError::InvalidBaseDate(base_date.to_string()));
        }
        self.base_date = base_date.to_string();
        Ok(self)
    }

    /// 마이그레이션 단위 생성 (테이블 단위 → 외래키 단위)
    pub fn generate(&self, model: &SchemaModel) -> Result<Vec<MigrationUnit>, ConversionError> {
        let plan = self.converter.plan(model)?;
        let dialect = self.converter.dialect();
        let mut units = Vec::new();

        for table in &plan.tables {
            let mut up = format!(
                "-- {} → {}\n\n{}\n",
                table.source,
                table.target,
                dialect.create_table(&table.create)
            );
            for index in &table.indexes {
                up.push('\n');
                up.push_str(&dialect.create_index(index));
                up.push('\n');
            }
            let down = format!("{}\n", dialect.drop_table(&table.target));

            units.push(self.unit(
                units.len(),
                MigrationKind::Table,
                &table.target,
                format!("create_{}_table", table.target),
                up,
                down,
            ));
        }

        for table in plan.tables.iter().filter(|t| !t.foreign_keys.is_empty()) {
            let up = table
                .foreign_keys
                .iter()
                .map(|fk| dialect.add_foreign_key(fk))
                .collect::<Vec<_>>()
                .join("\n");
            let down = table
                .foreign_keys
                .iter()
                .rev()
                .map(|fk| dialect.drop_foreign_key(&fk.table, &fk.name))
                .collect::<Vec<_>>()
                .join("\n");

            units.push(self.unit(
                units.len(),
                MigrationKind::ForeignKey,
                &table.target,
                format!("add_{}_foreign_keys", table.target),
                format!("{}\n", up),
                format!("{}\n", down),
            ));
        }

        info!(
            units = units.len(),
            tables = plan.tables.len(),
            base_date = %self.base_date,
            "마이그레이션 단위 생성"
        );

        Ok(units)
    }

    fn unit(
        &self,
        index: usize,
        kind: MigrationKind,
        table: &str,
        description: String,
        up: String,
        down: String,
    ) -> MigrationUnit {
        let sequence = index as u32 + 1;
        MigrationUnit {
            sequence,
            version: format!("{}{:06}", self.base_date, sequence),
            description,
            kind,
            table: table.to_string(),
            up,
            down,
        }
    }
}

/// 기본 설정으로 마이그레이션 단위 생성
pub fn generate_migrations(model: &SchemaModel) -> Result<Vec<MigrationUnit>, ConversionError> {
    MigrationEmitter::new().generate(model)
}

/// 마이그레이션 단위를 디렉토리에 저장
///
/// `force`가 false이고 같은 이름의 파일이 있으면 충돌 파일 전체를 나열하며 실패합니다.
/// 쓰기 중 하나라도 실패하면 이번 실행에서 쓴 파일을 모두 지우고 에러를 반환합니다.
pub fn save_migrations(
    units: &[MigrationUnit],
    dir: &Path,
    force: bool,
) -> Result<Vec<PathBuf>, EmissionError> {
    let files: Vec<(PathBuf, &str)> = units
        .iter()
        .flat_map(|u| {
            [
                (dir.join(u.up_filename()), u.up.as_str()),
                (dir.join(u.down_filename()), u.down.as_str()),
            ]
        })
        .collect();

    if !force {
        let existing: Vec<PathBuf> = files
            .iter()
            .filter(|(path, _)| path.exists())
            .map(|(path, _)| path.clone())
            .collect();
        if !existing.is_empty() {
            return Err(EmissionError::AlreadyExists { files: existing });
        }
    }

    let written = write_all(dir, &files)?;
    info!(dir = %dir.display(), files = written.len(), "마이그레이션 파일 저장");
    Ok(written)
}

/// 변환 결과 저장 (단일 SQL 파일 + 선택적 컴포넌트 디렉토리)
pub fn save_conversion(
    result: &ConversionResult,
    output: &Path,
    components_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, EmissionError> {
    let mut files: Vec<(PathBuf, String)> = vec![(output.to_path_buf(), result.complete_sql.clone())];

    if let Some(dir) = components_dir {
        let groups = [&result.create, &result.foreign_key, &result.index, &result.drop];
        for (name, statements) in COMPONENT_FILES.iter().zip(groups) {
            let mut content = statements.join("\n\n");
            content.push('\n');
            files.push((dir.join(name), content));
        }
    }

    let borrowed: Vec<(PathBuf, &str)> = files
        .iter()
        .map(|(path, content)| (path.clone(), content.as_str()))
        .collect();

    let mut dirs: Vec<&Path> = Vec::new();
    if let Some(parent) = output.parent() {
        dirs.push(parent);
    }
    if let Some(dir) = components_dir {
        dirs.push(dir);
    }
    for dir in dirs.into_iter().filter(|d| !d.as_os_str().is_empty()) {
        create_dir(dir)?;
    }

    let written = write_files(&borrowed)?;
    info!(files = written.len(), output = %output.display(), "변환 결과 저장");
    Ok(written)
}

fn create_dir(dir: &Path) -> Result<(), EmissionError> {
    fs::create_dir_all(dir).map_err(|source| EmissionError::Write {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_all(dir: &Path, files: &[(PathBuf, &str)]) -> Result<Vec<PathBuf>, EmissionError> {
    create_dir(dir)?;
    write_files(files)
}

/// 순서대로 쓰고, 실패 시 이번 실행에서 새로 만든 파일만 제거
///
/// 덮어쓴 기존 파일은 지우지 않습니다.
fn write_files(files: &[(PathBuf, &str)]) -> Result<Vec<PathBuf>, EmissionError> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());
    let mut created: Vec<PathBuf> = Vec::new();

    for (path, content) in files {
        let existed = path.exists();
        if let Err(source) = fs::write(path, content) {
            for done in &created {
                if let Err(e) = fs::remove_file(done) {
                    warn!(path = %done.display(), error = %e, "부분 출력 파일 제거 실패");
                }
            }
            return Err(EmissionError::Write {
                path: path.clone(),
                source,
            });
        }
        debug!(path = %path.display(), overwritten = existed, "파일 저장");
        if !existed {
            created.push(path.clone());
        }
        written.push(path.clone());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;

    const DDL: &str = "CREATE TABLE tbl_product (product_id INT AUTO_INCREMENT PRIMARY KEY, product_name VARCHAR(255), KEY idx_name (product_name));\n\
                       CREATE TABLE tbl_order (order_id INT AUTO_INCREMENT PRIMARY KEY, product_id INT);";

    #[test]
    fn test_units_tables_then_foreign_keys() {
        let units = generate_migrations(&parse_schema(DDL).unwrap()).unwrap();
        let stems: Vec<String> = units.iter().map(|u| u.stem()).collect();

        assert_eq!(
            stems,
            vec![
                "20240101000001_create_products_table",
                "20240101000002_create_orders_table",
                "20240101000003_add_orders_foreign_keys",
            ]
        );
        assert_eq!(units[2].kind, MigrationKind::ForeignKey);
        assert!(units[0].up.contains("CREATE INDEX IF NOT EXISTS \"idx_products_product_name\""));
        assert_eq!(units[1].down, "DROP TABLE IF EXISTS \"orders\";\n");
        assert!(units[2]
            .down
            .contains("DROP CONSTRAINT IF EXISTS \"fk_orders_product_id\""));
    }

    #[test]
    fn test_base_date() {
        let model = parse_schema(DDL).unwrap();
        let units = MigrationEmitter::new()
            .with_base_date("20250315")
            .unwrap()
            .generate(&model)
            .unwrap();
        assert_eq!(units[0].up_filename(), "20250315000001_create_products_table.up.sql");

        assert!(matches!(
            MigrationEmitter::new().with_base_date("2025-03-15"),
            Err(EmissionError::InvalidBaseDate(_))
        ));
    }

    #[test]
    fn test_save_refuses_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let units = generate_migrations(&parse_schema(DDL).unwrap()).unwrap();

        let written = save_migrations(&units, dir.path(), false).unwrap();
        assert_eq!(written.len(), units.len() * 2);

        match save_migrations(&units, dir.path(), false).unwrap_err() {
            EmissionError::AlreadyExists { files } => assert_eq!(files.len(), units.len() * 2),
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(save_migrations(&units, dir.path(), true).unwrap().len(), units.len() * 2);
    }

    #[test]
    fn test_failed_force_save_keeps_preexisting_files() {
        let dir = tempfile::tempdir().unwrap();
        let units = generate_migrations(&parse_schema(DDL).unwrap()).unwrap();

        // 기존 파일 하나와, 마지막 파일 자리에 디렉토리를 두어 쓰기 실패 유도
        let existing = dir.path().join(units[0].up_filename());
        fs::write(&existing, "-- old\n").unwrap();
        let blocked = dir.path().join(units.last().unwrap().down_filename());
        fs::create_dir(&blocked).unwrap();

        let err = save_migrations(&units, dir.path(), true).unwrap_err();
        assert!(matches!(err, EmissionError::Write { ref path, .. } if *path == blocked));

        assert!(existing.exists(), "덮어쓴 기존 파일은 남아야 함");
        assert!(!dir.path().join(units[0].down_filename()).exists());
        assert!(!dir.path().join(units[1].up_filename()).exists());
    }

    #[test]
    fn test_save_conversion_components() {
        let dir = tempfile::tempdir().unwrap();
        let model = parse_schema(DDL).unwrap();
        let result = crate::convert::convert_schema(&model).unwrap();

        let output = dir.path().join("out/schema.sql");
        let components = dir.path().join("out/components");
        let written = save_conversion(&result, &output, Some(&components)).unwrap();

        assert_eq!(written.len(), 5);
        for name in COMPONENT_FILES {
            assert!(components.join(name).exists(), "{} 없음", name);
        }
        let drops = fs::read_to_string(components.join("drop_tables.sql")).unwrap();
        assert!(drops.find("\"orders\"").unwrap() < drops.find("\"products\"").unwrap());
    }
}
