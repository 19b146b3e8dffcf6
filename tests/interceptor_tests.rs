#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for client-side interceptor routing
//!
//! # Test Coverage
//!
//! Validates the interceptor variant of resolution:
//! - Prefix-matching of literal and pattern paths on segment boundaries
//! - Concatenation ordered by path specificity, then registration order
//! - Criteria filtering (method, authority, scheme) on the client side
//! - Enable/disable of registered chains
//!
//! # Test Strategy
//!
//! Interceptors are plain strings so chain contents and order assert
//! directly; requests carry authority and scheme the way a client
//! exchange would.

mod common;

use common::{get, req};
use http::Method;
use trellis::{InterceptorRouter, RequestParts};

#[test]
fn prefix_chains_concatenate_most_specific_first() {
    let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
    router.route().path("/api").interceptor("auth").register().unwrap();
    router
        .route()
        .path("/api/payments")
        .interceptor("audit")
        .register()
        .unwrap();

    assert_eq!(
        router.resolve(&req(Method::POST, "/api/payments/123")),
        vec!["audit", "auth"]
    );
    assert_eq!(router.resolve(&get("/api/users")), vec!["auth"]);
    assert_eq!(router.resolve(&get("/other")), Vec::<&str>::new());
}

#[test]
fn prefix_matching_respects_segment_boundaries() {
    let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
    router.route().path("/api").interceptor("auth").register().unwrap();

    // "/apiary" shares bytes but not a segment boundary
    assert_eq!(router.resolve(&get("/apiary")), Vec::<&str>::new());
    assert_eq!(router.resolve(&get("/api")), vec!["auth"]);
    assert_eq!(router.resolve(&get("/api/x")), vec!["auth"]);
}

#[test]
fn pattern_paths_prefix_match() {
    let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
    router
        .route()
        .path("/tenants/{id}")
        .interceptor("tenant_scope")
        .register()
        .unwrap();

    assert_eq!(router.resolve(&get("/tenants/7")), vec!["tenant_scope"]);
    assert_eq!(router.resolve(&get("/tenants/7/users")), vec!["tenant_scope"]);
    assert_eq!(router.resolve(&get("/tenants")), Vec::<&str>::new());
}

#[test]
fn equal_specificity_stabilizes_on_registration_order() {
    let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
    router.route().path("/svc").interceptor("first").register().unwrap();
    router.route().path("/svc").interceptor("second").register().unwrap();

    assert_eq!(router.resolve(&get("/svc/x")), vec!["first", "second"]);
}

#[test]
fn chains_register_in_order() {
    let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
    router
        .route()
        .path("/svc")
        .interceptor("retry")
        .interceptor("timeout")
        .register()
        .unwrap();

    assert_eq!(router.resolve(&get("/svc")), vec!["retry", "timeout"]);
}

#[test]
fn method_criterion_filters_chains() {
    let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
    router
        .route()
        .path("/api")
        .method(Method::POST)
        .interceptor("mutating")
        .register()
        .unwrap();

    assert_eq!(router.resolve(&req(Method::POST, "/api/x")), vec!["mutating"]);
    assert_eq!(router.resolve(&get("/api/x")), Vec::<&str>::new());
}

#[test]
fn authority_and_scheme_filter_chains() {
    let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
    router
        .route()
        .authority("*.example.com")
        .interceptor("example_only")
        .register()
        .unwrap();
    router
        .route()
        .scheme("https")
        .interceptor("tls_headers")
        .register()
        .unwrap();

    let request = RequestParts::new(Method::GET, "/x")
        .with_authority("api.example.com")
        .with_scheme("https");
    assert_eq!(router.resolve(&request), vec!["example_only", "tls_headers"]);

    let request = RequestParts::new(Method::GET, "/x")
        .with_authority("other.net")
        .with_scheme("http");
    assert_eq!(router.resolve(&request), Vec::<&str>::new());
}

#[test]
fn disabled_chains_do_not_contribute() {
    let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
    router.route().path("/api").interceptor("auth").register().unwrap();

    router.route().path("/api").disable().unwrap();
    assert_eq!(router.resolve(&get("/api/x")), Vec::<&str>::new());

    router.route().path("/api").enable().unwrap();
    assert_eq!(router.resolve(&get("/api/x")), vec!["auth"]);
}
