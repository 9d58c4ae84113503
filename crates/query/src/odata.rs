//! OData literal escaping and expression checks.

use crate::QueryError;

/// Quote `s` as an OData string literal (`'` doubled).
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' { out.push('\''); }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Normalize a field path to OData form (`Author.Title` → `Author/Title`).
///
/// Accepts only identifier segments (`[A-Za-z0-9_]`, not starting with a digit) separated
/// by `.` or `/`. Anything else could alter the surrounding expression and is rejected.
pub fn field_path(path: &str) -> Result<String, QueryError> {
    let p = path.trim();
    let invalid = || QueryError::InvalidFieldPath(path.to_string());
    if p.is_empty() { return Err(invalid()); }
    let mut out = String::with_capacity(p.len());
    for (i, seg) in p.split(['.', '/']).enumerate() {
        let mut chars = seg.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(invalid()),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') { return Err(invalid()); }
        if i > 0 { out.push('/'); }
        out.push_str(seg);
    }
    Ok(out)
}

/// Normalize a caller `$select` entry. Anything the list accepts passes (`*`, `Author/Title`,
/// `OData__x0020_Name`); only characters that would split the list or the query string are refused.
pub fn select_field(field: &str) -> Result<String, QueryError> {
    let f = field.trim();
    let breaks_list = |c: char| c.is_whitespace() || c.is_control() || matches!(c, ',' | '&' | '=' | '#' | '?' | '\'' | '(' | ')');
    if f.is_empty() || f.chars().any(breaks_list) || f.split(['.', '/']).any(str::is_empty) {
        return Err(QueryError::InvalidFieldPath(field.to_string()));
    }
    Ok(f.replace('.', "/"))
}

/// Check that a caller filter keeps its parentheses balanced and its string literals closed,
/// so it cannot escape the `(...)` group it is wrapped in.
pub fn check_filter(expr: &str) -> Result<(), QueryError> {
    let mut depth: i64 = 0;
    let mut in_str = false;
    let mut chars = expr.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_str {
            if ch == '\'' {
                // '' is an escaped quote inside a literal
                if chars.peek() == Some(&'\'') { chars.next(); } else { in_str = false; }
            }
            continue;
        }
        match ch {
            '\'' => in_str = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 { return Err(QueryError::UnbalancedFilter(expr.to_string())); }
            }
            _ => {}
        }
    }
    if in_str || depth != 0 {
        return Err(QueryError::UnbalancedFilter(expr.to_string()));
    }
    Ok(())
}
