//! DDL 정의 절 토큰화 및 괄호/따옴표 인식 스캔 유틸리티.
//!
//! `DECIMAL(10,2)`, `ENUM('a,b','c')`처럼 괄호와 따옴표 안에 쉼표가
//! 들어가는 정의는 상태 기반 스캔으로 분리합니다.

/// 정의 절 토큰
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// 키워드/타입명/숫자 등 일반 단어
    Word(String),
    /// 백틱 또는 큰따옴표로 감싼 식별자 (따옴표 제거)
    Ident(String),
    /// 작은따옴표 문자열 (따옴표 포함 원문)
    Str(String),
    /// 괄호 그룹 내부 원문 (바깥 괄호 제외)
    Group(String),
    /// 기타 구두점 (`=`, `,` 등)
    Punct(char),
}

impl Token {
    /// 대소문자 무시 키워드 비교
    pub fn is_kw(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// 식별자로 사용할 수 있는 텍스트
    pub fn ident_text(&self) -> Option<&str> {
        match self {
            Token::Word(w) | Token::Ident(w) => Some(w.as_str()),
            _ => None,
        }
    }

    /// 원문 형태로 복원
    pub fn to_sql(&self) -> String {
        match self {
            Token::Word(w) => w.clone(),
            Token::Ident(i) => format!("`{}`", i),
            Token::Str(s) => s.clone(),
            Token::Group(g) => format!("({})", g),
            Token::Punct(c) => c.to_string(),
        }
    }
}

/// `open` 위치의 `(`와 짝이 맞는 `)` 위치 (따옴표 내부 무시)
pub fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' && q != b'`' {
                    i += 1;
                } else if b == q {
                    // 연속된 따옴표('')는 이스케이프
                    if bytes.get(i + 1) == Some(&q) {
                        i += 1;
                    } else {
                        quote = None;
                    }
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    None
}

/// 최상위 구분자로만 분리 (괄호/따옴표 내부 무시)
pub fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == '\\' && q != '`' {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                } else if c == q {
                    if chars.peek() == Some(&q) {
                        current.push(q);
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
            None => {
                if c == sep && depth == 0 {
                    parts.push(std::mem::take(&mut current));
                    continue;
                }
                match c {
                    '\'' | '"' | '`' => quote = Some(c),
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                current.push(c);
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current);
    }

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// 괄호 깊이가 음수가 되거나 닫히지 않으면 false
pub fn parens_balanced(s: &str) -> bool {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' && q != '`' {
                    chars.next();
                } else if c == q {
                    if chars.peek() == Some(&q) {
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            },
        }
    }

    depth == 0 && quote.is_none()
}

/// 정의 절 토큰화
pub fn tokenize(def: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = def.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '`' | '"' => {
                let (text, next) = read_quoted(&chars, i);
                tokens.push(Token::Ident(text));
                i = next;
            }
            '\'' => {
                let start = i;
                let (_, next) = read_quoted(&chars, i);
                tokens.push(Token::Str(chars[start..next].iter().collect()));
                i = next;
            }
            '(' => {
                let rest: String = chars[i..].iter().collect();
                match matching_paren(&rest, 0) {
                    Some(close) => {
                        let inner: String = rest[1..close].to_string();
                        // 바이트 인덱스를 문자 인덱스로 환산
                        i += rest[..=close].chars().count();
                        tokens.push(Token::Group(inner));
                    }
                    None => {
                        tokens.push(Token::Punct('('));
                        i += 1;
                    }
                }
            }
            ')' | ',' | '=' | ';' => {
                tokens.push(Token::Punct(c));
                i += 1;
            }
            _ => {
                let start = i;
                while i < chars.len()
                    && !chars[i].is_whitespace()
                    && !matches!(chars[i], '(' | ')' | ',' | '=' | '\'' | '"' | '`' | ';')
                {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
        }
    }

    tokens
}

/// 따옴표 문자열 읽기 → (내용, 다음 인덱스)
fn read_quoted(chars: &[char], start: usize) -> (String, usize) {
    let q = chars[start];
    let mut text = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && q != '`' && i + 1 < chars.len() {
            text.push(c);
            text.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == q {
            if i + 1 < chars.len() && chars[i + 1] == q {
                text.push(q);
                i += 2;
                continue;
            }
            return (text, i + 1);
        }
        text.push(c);
        i += 1;
    }

    (text, i)
}

/// 식별자 정리 (백틱/따옴표 및 스키마 prefix 제거)
pub fn clean_identifier(name: &str) -> String {
    let name = name.trim().trim_end_matches(';');
    let last = if name.contains('.') {
        name.rsplit('.').next().unwrap_or(name)
    } else {
        name
    };
    last.trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == '[' || c == ']')
        .to_string()
}

/// 괄호 그룹 내 컬럼 목록 파싱 (`(a, b(10) DESC)` → ["a", "b"])
pub fn parse_column_list(group: &str) -> Vec<String> {
    split_top_level(group, ',')
        .iter()
        .filter_map(|part| {
            let tokens = tokenize(part);
            tokens.first().and_then(|t| t.ident_text()).map(clean_identifier)
        })
        .filter(|c| !c.is_empty())
        .collect()
}

/// 에러 메시지용 원문 요약
pub fn snippet(s: &str) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 80 {
        let cut: String = flat.chars().take(77).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_paren_with_nested_type_args() {
        let s = "(id INT, price DECIMAL(10,2), note VARCHAR(20) DEFAULT ')')";
        let close = matching_paren(s, 0).unwrap();
        assert_eq!(close, s.len() - 1);
    }

    #[test]
    fn test_matching_paren_unbalanced() {
        assert_eq!(matching_paren("(a INT, b DECIMAL(10,2)", 0), None);
    }

    #[test]
    fn test_split_top_level_respects_parens_and_quotes() {
        let parts = split_top_level("a INT, b DECIMAL(10,2), c ENUM('x,y','z')", ',');
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], "b DECIMAL(10,2)");
        assert_eq!(parts[2], "c ENUM('x,y','z')");
    }

    #[test]
    fn test_tokenize_column_definition() {
        let tokens = tokenize("`price` decimal(10,2) NOT NULL DEFAULT '0.00'");
        assert_eq!(tokens[0], Token::Ident("price".to_string()));
        assert_eq!(tokens[1], Token::Word("decimal".to_string()));
        assert_eq!(tokens[2], Token::Group("10,2".to_string()));
        assert!(tokens[3].is_kw("not"));
        assert_eq!(tokens[6], Token::Str("'0.00'".to_string()));
    }

    #[test]
    fn test_parse_column_list() {
        assert_eq!(
            parse_column_list("`order_id`, `product_id`(10) DESC"),
            vec!["order_id".to_string(), "product_id".to_string()]
        );
    }

    #[test]
    fn test_parens_balanced() {
        assert!(parens_balanced("a (b) 'c)' (d (e))"));
        assert!(!parens_balanced("a (b"));
        assert!(!parens_balanced("a) (b"));
    }

    #[test]
    fn test_clean_identifier() {
        assert_eq!(clean_identifier("`shop`.`tbl_product`"), "tbl_product");
        assert_eq!(clean_identifier("\"orders\""), "orders");
    }
}
