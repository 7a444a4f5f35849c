//! 레거시 → PostgreSQL 명명 규칙 변환.
//!
//! 테이블명은 고정 조회 테이블을 먼저 적용하고, 없으면 레거시 prefix 제거 후
//! snake_case 복수형으로 변환합니다. 조회 테이블은 [`TableRenamer::renames`]로 검사할 수 있습니다.

use std::collections::BTreeMap;

use heck::ToSnakeCase;
use lazy_static::lazy_static;

/// 레거시 테이블 prefix (긴 것부터 검사)
pub const LEGACY_PREFIXES: &[&str] = &["tbl_", "tb_", "t_"];

lazy_static! {
    /// 알려진 쇼핑몰 레거시 테이블 → 대상 테이블
    static ref KNOWN_RENAMES: BTreeMap<&'static str, &'static str> = {
        let mut m = BTreeMap::new();
        m.insert("tbl_product", "products");
        m.insert("tbl_customer_account", "customers");
        m.insert("tbl_orders", "orders");
        m.insert("tbl_order_detail", "order_items");
        m.insert("tbl_order_details", "order_items");
        m.insert("tbl_category", "categories");
        m.insert("tbl_cart", "cart_items");
        m.insert("tbl_admin", "admin_users");
        m.insert("tbl_brand", "brands");
        m.insert("tbl_review", "reviews");
        m.insert("tbl_payment", "payments");
        m.insert("tbl_shipping_address", "shipping_addresses");
        m
    };
}

/// 테이블명 변환기
///
/// 기본 조회 테이블에 프로젝트 설정(`[naming.renames]`)의 재정의를 덧붙일 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRenamer {
    renames: BTreeMap<String, String>,
}

impl Default for TableRenamer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenamer {
    /// 기본 조회 테이블로 생성
    pub fn new() -> Self {
        Self {
            renames: KNOWN_RENAMES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// 조회 테이블 없이 생성 (일반 규칙만 적용)
    pub fn empty() -> Self {
        Self {
            renames: BTreeMap::new(),
        }
    }

    /// 재정의 추가 (소스명은 대소문자 무시)
    pub fn with_override(mut self, source: &str, target: &str) -> Self {
        self.renames
            .insert(source.to_lowercase(), target.to_string());
        self
    }

    /// 여러 재정의 추가
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (source, target) in overrides {
            self = self.with_override(source.as_ref(), target.as_ref());
        }
        self
    }

    /// 조회 테이블에 등록된 대상명
    pub fn lookup(&self, source: &str) -> Option<&str> {
        self.renames
            .get(&source.to_lowercase())
            .map(|s| s.as_str())
    }

    /// 등록된 전체 매핑 (소스명 정렬)
    pub fn renames(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 대상 테이블명 계산
    pub fn rename(&self, source: &str) -> String {
        if let Some(target) = self.lookup(source) {
            return target.to_string();
        }
        pluralize(&table_stem(source))
    }
}

/// 레거시 prefix 제거
pub fn strip_legacy_prefix(name: &str) -> &str {
    let lower = name.to_lowercase();
    for prefix in LEGACY_PREFIXES {
        if lower.starts_with(prefix) && name.len() > prefix.len() {
            return &name[prefix.len()..];
        }
    }
    name
}

/// prefix를 제거한 snake_case 테이블 어간 (`tbl_OrderDetail` → `order_detail`)
pub fn table_stem(name: &str) -> String {
    strip_legacy_prefix(name).to_snake_case()
}

/// 컬럼 식별자 정규화 (`productName` → `product_name`)
pub fn column_name(name: &str) -> String {
    name.to_snake_case()
}

/// 영어 복수형 (snake_case의 마지막 단어에만 적용)
pub fn pluralize(name: &str) -> String {
    let (head, last) = split_last_word(name);
    if last.is_empty() {
        return name.to_string();
    }
    format!("{}{}", head, pluralize_word(last))
}

/// 영어 단수형 (snake_case의 마지막 단어에만 적용)
pub fn singularize(name: &str) -> String {
    let (head, last) = split_last_word(name);
    if last.is_empty() {
        return name.to_string();
    }
    format!("{}{}", head, singularize_word(last))
}

fn split_last_word(name: &str) -> (&str, &str) {
    match name.rfind('_') {
        Some(pos) => (&name[..=pos], &name[pos + 1..]),
        None => ("", name),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// 이미 복수형으로 보이는 단어 (`orders`, `items`)
fn looks_plural(word: &str) -> bool {
    word.len() > 1
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
}

fn pluralize_word(word: &str) -> String {
    if looks_plural(word) {
        return word.to_string();
    }

    let mut chars = word.chars().rev();
    let last = chars.next();
    let prev = chars.next();

    match (prev, last) {
        (Some(p), Some('y')) if !is_vowel(p) => format!("{}ies", &word[..word.len() - 1]),
        (_, Some('s' | 'x' | 'z')) => format!("{}es", word),
        (Some('c' | 's'), Some('h')) => format!("{}es", word),
        _ => format!("{}s", word),
    }
}

fn singularize_word(word: &str) -> String {
    if word.len() > 3 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes", "uses"] {
        if word.len() >= suffix.len() && word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if looks_plural(word) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_renames() {
        let renamer = TableRenamer::new();
        assert_eq!(renamer.rename("tbl_product"), "products");
        assert_eq!(renamer.rename("tbl_customer_account"), "customers");
        assert_eq!(renamer.rename("TBL_ORDERS"), "orders");
    }

    #[test]
    fn test_fallback_rename() {
        let renamer = TableRenamer::new();
        assert_eq!(renamer.rename("tbl_order"), "orders");
        assert_eq!(renamer.rename("tbl_wishlist_entry"), "wishlist_entries");
        assert_eq!(renamer.rename("tb_box"), "boxes");
        assert_eq!(renamer.rename("tbl_OrderStatus"), "order_statuses");
        assert_eq!(renamer.rename("coupons"), "coupons");
    }

    #[test]
    fn test_override_wins_over_known() {
        let renamer = TableRenamer::new().with_overrides([("tbl_product", "items")]);
        assert_eq!(renamer.rename("tbl_product"), "items");
        assert_eq!(renamer.lookup("TBL_PRODUCT"), Some("items"));
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("orders"), "order");
        assert_eq!(singularize("order_items"), "order_item");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("product"), "product");
    }

    #[test]
    fn test_known_targets_are_unique_and_non_empty() {
        let renamer = TableRenamer::new();
        let mut seen = std::collections::BTreeMap::new();
        for (source, target) in renamer.renames() {
            assert!(!target.is_empty(), "{} 대상명이 비어 있음", source);
            assert_eq!(renamer.rename(source), renamer.rename(source));
            if let Some(prev) = seen.insert(target.to_string(), source.to_string()) {
                // 동일 테이블의 단수/복수 표기만 같은 대상을 공유
                assert_eq!(singularize(&prev), singularize(source));
            }
        }
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name("productName"), "product_name");
        assert_eq!(column_name("product_id"), "product_id");
    }

    proptest! {
        #[test]
        fn prop_singularize_inverts_pluralize(word in "[a-rt-wx]{1,8}[b-df-hj-np-rtvwx]") {
            prop_assert_eq!(singularize(&pluralize(&word)), word);
        }

        #[test]
        fn prop_rename_is_deterministic_and_non_empty(name in "(tbl_|tb_)?[a-z]{1,10}(_[a-z]{1,6})?") {
            let renamer = TableRenamer::new();
            let first = renamer.rename(&name);
            prop_assert!(!first.is_empty());
            prop_assert_eq!(first, renamer.rename(&name));
        }
    }
}
