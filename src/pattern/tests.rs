#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{ParamVec, PathPattern, PatternError};
use std::sync::Arc;

fn bindings(pairs: &[(&str, &str)]) -> ParamVec {
    pairs
        .iter()
        .map(|(k, v)| (Arc::<str>::from(*k), v.to_string()))
        .collect()
}

fn names_and_values(params: &ParamVec) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn literal_template_matches_exactly() {
    let p = PathPattern::parse("/ping").unwrap();
    assert!(p.matches("/ping").is_some());
    assert!(p.matches("/ping/").is_none());
    assert!(p.matches("/pong").is_none());
}

#[test]
fn root_template() {
    let p = PathPattern::parse("/").unwrap();
    assert!(p.matches("/").is_some());
    assert!(p.matches("/a").is_none());
}

#[test]
fn single_segment_capture() {
    let p = PathPattern::parse("/users/{id}/profile").unwrap();
    let params = p.matches("/users/42/profile").unwrap();
    assert_eq!(names_and_values(&params), vec![("id".into(), "42".into())]);
    assert!(p.matches("/users/42/profile/extra").is_none());
    assert!(p.matches("/users//profile").is_none());
}

#[test]
fn capture_does_not_cross_segments() {
    let p = PathPattern::parse("/users/{id}").unwrap();
    assert!(p.matches("/users/a/b").is_none());
}

#[test]
fn constrained_capture() {
    let p = PathPattern::parse("/users/{id:[0-9]+}").unwrap();
    assert!(p.matches("/users/42").is_some());
    assert!(p.matches("/users/abc").is_none());
}

#[test]
fn constraint_with_inner_braces() {
    let p = PathPattern::parse("/codes/{code:[A-Z]{3}}").unwrap();
    assert!(p.matches("/codes/ABC").is_some());
    assert!(p.matches("/codes/AB").is_none());
    assert!(p.matches("/codes/ABCD").is_none());
}

#[test]
fn multi_segment_capture() {
    let p = PathPattern::parse("/files/{path:**}").unwrap();
    let params = p.matches("/files/a/b/c").unwrap();
    assert_eq!(
        names_and_values(&params),
        vec![("path".into(), "a/b/c".into())]
    );
    // zero segments also match, binding the empty string
    let params = p.matches("/files").unwrap();
    assert_eq!(names_and_values(&params), vec![("path".into(), "".into())]);
}

#[test]
fn multi_capture_with_trailing_literal() {
    let p = PathPattern::parse("/a/{rest:**}/b").unwrap();
    let params = p.matches("/a/x/b/y/b").unwrap();
    assert_eq!(
        names_and_values(&params),
        vec![("rest".into(), "x/b/y".into())]
    );
    assert!(p.matches("/a/x/y").is_none());
}

#[test]
fn bare_double_star_matches_but_binds_nothing() {
    let p = PathPattern::parse("/static/**").unwrap();
    let params = p.matches("/static/css/site.css").unwrap();
    assert!(params.is_empty());
}

#[test]
fn question_mark_and_star_wildcards() {
    let p = PathPattern::parse("/a?c").unwrap();
    assert!(p.matches("/abc").is_some());
    assert!(p.matches("/ac").is_none());
    assert!(p.matches("/a/c").is_none());

    let p = PathPattern::parse("/img/*.png").unwrap();
    assert!(p.matches("/img/logo.png").is_some());
    assert!(p.matches("/img/.png").is_some());
    assert!(p.matches("/img/a/b.png").is_none());
}

#[test]
fn unnamed_capture_constrains_without_binding() {
    let p = PathPattern::parse("/v/{:[0-9]+}/x").unwrap();
    let params = p.matches("/v/7/x").unwrap();
    assert!(params.is_empty());
    assert!(p.matches("/v/seven/x").is_none());
}

#[test]
fn rejects_relative_and_empty_templates() {
    assert!(matches!(
        PathPattern::parse("users/{id}"),
        Err(PatternError::Invalid { position: 0, .. })
    ));
    assert!(matches!(
        PathPattern::parse(""),
        Err(PatternError::Invalid { .. })
    ));
}

#[test]
fn rejects_malformed_braces() {
    assert!(matches!(
        PathPattern::parse("/users/{id"),
        Err(PatternError::Invalid { .. })
    ));
    assert!(matches!(
        PathPattern::parse("/users/id}"),
        Err(PatternError::Invalid { .. })
    ));
}

#[test]
fn rejects_duplicate_parameter_names() {
    let err = PathPattern::parse("/a/{id}/b/{id}").unwrap_err();
    assert_eq!(
        err,
        PatternError::DuplicateParameter { name: "id".into() }
    );
}

#[test]
fn rejects_second_multi_token() {
    assert!(matches!(
        PathPattern::parse("/a/{x:**}/b/{y:**}"),
        Err(PatternError::Invalid { .. })
    ));
    assert!(matches!(
        PathPattern::parse("/a/**/b/**"),
        Err(PatternError::Invalid { .. })
    ));
}

#[test]
fn rejects_invalid_constraint() {
    assert!(matches!(
        PathPattern::parse("/a/{id:[}"),
        Err(PatternError::Invalid { .. })
    ));
}

#[test]
fn specificity_prefers_literals_over_captures() {
    let lit = PathPattern::parse("/files/index.html").unwrap();
    let cap = PathPattern::parse("/files/{name}").unwrap();
    let multi = PathPattern::parse("/files/{p:**}").unwrap();
    assert!(lit.cmp_specificity(&cap).is_gt());
    assert!(cap.cmp_specificity(&multi).is_gt());
    assert!(lit.cmp_specificity(&multi).is_gt());
}

#[test]
fn specificity_is_a_total_order() {
    let a = PathPattern::parse("/x/{a}").unwrap();
    let b = PathPattern::parse("/x/{b}").unwrap();
    assert!(a.cmp_specificity(&b).is_ne());
    assert_eq!(
        a.cmp_specificity(&b),
        b.cmp_specificity(&a).reverse()
    );
}

#[test]
fn fill_round_trips_matched_paths() {
    let cases = [
        ("/users/{id}/profile", "/users/42/profile"),
        ("/files/{p:**}", "/files/a/b/c"),
        ("/files/{p:**}", "/files"),
        ("/codes/{code:[A-Z]{3}}", "/codes/ABC"),
    ];
    for (template, path) in cases {
        let p = PathPattern::parse(template).unwrap();
        let params = p.matches(path).unwrap();
        assert_eq!(p.fill(&params).as_deref(), Some(path), "{}", template);
    }
}

#[test]
fn fill_rejects_opaque_templates_and_missing_bindings() {
    let p = PathPattern::parse("/img/*.png").unwrap();
    assert!(p.fill(&bindings(&[])).is_none());

    let p = PathPattern::parse("/users/{id}").unwrap();
    assert!(p.fill(&bindings(&[("other", "1")])).is_none());
    assert_eq!(
        p.fill(&bindings(&[("id", "9")])).as_deref(),
        Some("/users/9")
    );
}
