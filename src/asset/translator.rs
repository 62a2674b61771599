// src/asset/translator.rs

//! Mapping-to-binding predicate translation
//!
//! Callers query asset mappings with predicates over mapping fields; the
//! discovery store only understands predicates over bindings. The translator
//! rewrites one into the other and conjoins the fixed base predicate that
//! scopes every query to enabled asset bindings.
//!
//! The rewrite is a post-order walk: connectives are copied with rewritten
//! children, mapping fields are dispatched by name, and unknown fields pass
//! through so callers can filter on binding-native fields transparently.

use crate::discovery::{FIELD_ENABLED, FIELD_QUERY, FIELD_TYPE};
use crate::predicate::{Comparison, Expr};
use serde_json::Value;

use super::{FIELD_GLOB, FIELD_SERVER_NAME, FIELD_SERVER_PATH};

/// Binding type reserved for asset mappings
pub const ASSET_BINDING_TYPE: &str = "web/asset";
/// Binding parameter carrying the target server name
pub const PARAM_SERVER: &str = "server";
/// Binding parameter carrying the public path on the server
pub const PARAM_PATH: &str = "path";
/// Suffix appended to the glob so a binding query also matches everything
/// below a matched directory
pub const RECURSIVE_SUFFIX: &str = "{,/**/*}";

/// The fixed predicate every translated query is conjoined with: the binding
/// is enabled, carries the asset type, and ends with the recursive suffix
pub fn base_predicate() -> Expr {
    Expr::and(vec![
        Expr::same(FIELD_ENABLED, true),
        Expr::same(FIELD_TYPE, ASSET_BINDING_TYPE),
        Expr::ends_with(FIELD_QUERY, RECURSIVE_SUFFIX),
    ])
}

/// Translate an optional mapping-side predicate into a binding-side one
///
/// Without a caller predicate the base predicate stands alone.
pub fn translate(predicate: Option<&Expr>) -> Expr {
    match predicate {
        None => base_predicate(),
        Some(expr) => Expr::and(vec![base_predicate(), rewrite(expr)]),
    }
}

fn rewrite(expr: &Expr) -> Expr {
    match expr {
        Expr::True => Expr::True,
        Expr::And(operands) => Expr::And(operands.iter().map(rewrite).collect()),
        Expr::Or(operands) => Expr::Or(operands.iter().map(rewrite).collect()),
        Expr::Not(operand) => Expr::not(rewrite(operand)),
        Expr::Field { name, op } => match name.as_str() {
            FIELD_GLOB => Expr::field(FIELD_QUERY, suffix_comparison(op)),
            FIELD_SERVER_NAME => Expr::parameter(PARAM_SERVER, op.clone()),
            FIELD_SERVER_PATH => Expr::parameter(PARAM_PATH, op.clone()),
            // Binding-native fields pass through untouched
            _ => expr.clone(),
        },
        Expr::Parameter { .. } => expr.clone(),
    }
}

/// Append the recursive suffix to the compared glob literal, preserving the
/// comparison kind
///
/// Kinds with no defined suffix rule pass through unrewritten.
fn suffix_comparison(op: &Comparison) -> Comparison {
    match op {
        Comparison::Same(v) => Comparison::Same(suffix_value(v)),
        Comparison::Equals(v) => Comparison::Equals(suffix_value(v)),
        Comparison::NotSame(v) => Comparison::NotSame(suffix_value(v)),
        Comparison::NotEquals(v) => Comparison::NotEquals(suffix_value(v)),
        Comparison::EndsWith(s) => Comparison::EndsWith(format!("{s}{RECURSIVE_SUFFIX}")),
        other => other.clone(),
    }
}

fn suffix_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(format!("{s}{RECURSIVE_SUFFIX}")),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_predicate_yields_base_alone() {
        assert_eq!(translate(None), base_predicate());
    }

    #[test]
    fn test_glob_same_is_suffixed() {
        let input = Expr::same(FIELD_GLOB, "/path/{css,js}");
        let expected = Expr::and(vec![
            base_predicate(),
            Expr::same(FIELD_QUERY, "/path/{css,js}{,/**/*}"),
        ]);
        assert_eq!(translate(Some(&input)), expected);
    }

    #[test]
    fn test_glob_comparison_kinds() {
        let cases = [
            (
                Comparison::Equals(json!("/a")),
                Comparison::Equals(json!("/a{,/**/*}")),
            ),
            (
                Comparison::NotSame(json!("/a")),
                Comparison::NotSame(json!("/a{,/**/*}")),
            ),
            (
                Comparison::NotEquals(json!("/a")),
                Comparison::NotEquals(json!("/a{,/**/*}")),
            ),
            (
                Comparison::EndsWith("/css".into()),
                Comparison::EndsWith("/css{,/**/*}".into()),
            ),
        ];
        for (op, expected_op) in cases {
            let translated = translate(Some(&Expr::field(FIELD_GLOB, op.clone())));
            let expected = Expr::and(vec![base_predicate(), Expr::field(FIELD_QUERY, expected_op)]);
            assert_eq!(translated, expected, "comparison {op:?}");
        }
    }

    #[test]
    fn test_glob_starts_with_passes_through_unrewritten() {
        let op = Comparison::StartsWith("/path".into());
        let translated = translate(Some(&Expr::field(FIELD_GLOB, op.clone())));
        let expected = Expr::and(vec![base_predicate(), Expr::field(FIELD_QUERY, op)]);
        assert_eq!(translated, expected);
    }

    #[test]
    fn test_server_fields_become_parameter_lookups() {
        let input = Expr::and(vec![
            Expr::same(FIELD_SERVER_NAME, "localhost"),
            Expr::same(FIELD_SERVER_PATH, "/assets"),
        ]);
        let expected = Expr::and(vec![
            base_predicate(),
            Expr::and(vec![
                Expr::parameter(PARAM_SERVER, Comparison::Same(json!("localhost"))),
                Expr::parameter(PARAM_PATH, Comparison::Same(json!("/assets"))),
            ]),
        ]);
        assert_eq!(translate(Some(&input)), expected);
    }

    #[test]
    fn test_unknown_field_passes_through() {
        let input = Expr::same(crate::discovery::FIELD_UUID, "abc");
        let expected = Expr::and(vec![base_predicate(), input.clone()]);
        assert_eq!(translate(Some(&input)), expected);
    }

    #[test]
    fn test_connectives_rewritten_recursively() {
        let input = Expr::not(Expr::or(vec![
            Expr::same(FIELD_GLOB, "/a"),
            Expr::same(FIELD_SERVER_NAME, "cdn"),
        ]));
        let expected = Expr::and(vec![
            base_predicate(),
            Expr::not(Expr::or(vec![
                Expr::same(FIELD_QUERY, "/a{,/**/*}"),
                Expr::parameter(PARAM_SERVER, Comparison::Same(json!("cdn"))),
            ])),
        ]);
        assert_eq!(translate(Some(&input)), expected);
    }
}
