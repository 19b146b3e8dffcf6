#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for content and language negotiation
//!
//! # Test Coverage
//!
//! Validates the negotiation levels of the dispatch chain:
//! - `Accept` driven selection between produced representations
//! - `NotAcceptable` with the producible set on a strict miss
//! - `Content-Type` driven consumer selection and `UnsupportedMediaType`
//! - `Accept-Language` selection with the wildcard-loses-to-concrete rule
//! - Boundary behaviors: empty `Accept`, `q=0`, duplicate headers
//!
//! # Test Strategy
//!
//! One router per scenario with string resources; headers are set on
//! `RequestParts` exactly as a wire request would carry them.

mod common;

use common::{get, get_accepting, get_in_language};
use http::Method;
use trellis::{MediaRange, ResolveError, Router};

#[test]
fn produces_negotiation_prefers_higher_quality() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .method(Method::GET)
        .produces("application/json")
        .handler("hj")
        .unwrap();
    router
        .route()
        .path("/data")
        .method(Method::GET)
        .produces("application/xml")
        .handler("hx")
        .unwrap();

    let resolved = router
        .resolve(&get_accepting(
            "/data",
            "application/xml;q=0.9, application/json;q=0.8",
        ))
        .unwrap();
    assert_eq!(resolved.resource, "hx");
    assert_eq!(
        resolved.media_type,
        Some(MediaRange::parse("application/xml").unwrap())
    );
}

#[test]
fn produces_miss_reports_the_producible_set() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("hj")
        .unwrap();
    router
        .route()
        .path("/data")
        .produces("application/xml")
        .handler("hx")
        .unwrap();

    match router.resolve(&get_accepting("/data", "text/plain")) {
        Err(ResolveError::NotAcceptable { producible, .. }) => {
            let names: Vec<String> = producible.iter().map(ToString::to_string).collect();
            assert_eq!(names, vec!["application/json", "application/xml"]);
        }
        other => panic!("expected NotAcceptable, got {:?}", other),
    }
}

#[test]
fn empty_accept_header_matches_any_representation() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("hj")
        .unwrap();

    // no Accept header at all reads as */*;q=1
    assert_eq!(router.resolve(&get("/data")).unwrap().resource, "hj");
}

#[test]
fn wildcard_accept_ties_keep_registration_order() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("first")
        .unwrap();
    router
        .route()
        .path("/data")
        .produces("application/xml")
        .handler("second")
        .unwrap();

    assert_eq!(
        router.resolve(&get_accepting("/data", "*/*")).unwrap().resource,
        "first"
    );
}

#[test]
fn q_zero_eliminates_a_representation() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("hj")
        .unwrap();
    router
        .route()
        .path("/data")
        .produces("application/xml")
        .handler("hx")
        .unwrap();

    let resolved = router
        .resolve(&get_accepting("/data", "application/json;q=0, */*"))
        .unwrap();
    assert_eq!(resolved.resource, "hx");
}

#[test]
fn duplicate_accept_headers_merge_left_to_right() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("hj")
        .unwrap();
    router
        .route()
        .path("/data")
        .produces("application/xml")
        .handler("hx")
        .unwrap();

    let request = get("/data")
        .with_header("accept", "text/plain;q=0.1")
        .with_header("accept", "application/xml");
    assert_eq!(router.resolve(&request).unwrap().resource, "hx");
}

#[test]
fn consume_selection_by_content_type() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/upload")
        .method(Method::POST)
        .consumes("application/json")
        .handler("json_consumer")
        .unwrap();
    router
        .route()
        .path("/upload")
        .method(Method::POST)
        .consumes("text/csv")
        .handler("csv_consumer")
        .unwrap();

    let request = common::req(Method::POST, "/upload").with_header("content-type", "text/csv");
    assert_eq!(router.resolve(&request).unwrap().resource, "csv_consumer");

    let request =
        common::req(Method::POST, "/upload").with_header("content-type", "application/zip");
    match router.resolve(&request) {
        Err(ResolveError::UnsupportedMediaType { supported }) => {
            assert_eq!(supported.len(), 2);
        }
        other => panic!("expected UnsupportedMediaType, got {:?}", other),
    }
}

#[test]
fn missing_content_type_keeps_consumers_eligible() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/upload")
        .method(Method::POST)
        .consumes("application/json")
        .handler("json_consumer")
        .unwrap();

    let request = common::req(Method::POST, "/upload");
    assert_eq!(router.resolve(&request).unwrap().resource, "json_consumer");
}

#[test]
fn language_negotiation_with_wildcard_catch_all() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/doc")
        .language("en")
        .handler("he")
        .unwrap();
    router
        .route()
        .path("/doc")
        .language("fr")
        .handler("hf")
        .unwrap();
    router
        .route()
        .path("/doc")
        .language("*")
        .handler("hw")
        .unwrap();

    assert_eq!(
        router
            .resolve(&get_in_language("/doc", "fr-CA,fr;q=0.8"))
            .unwrap()
            .resource,
        "hf"
    );
    // the wildcard loses only to concrete matches
    assert_eq!(
        router.resolve(&get_in_language("/doc", "de")).unwrap().resource,
        "hw"
    );
}

#[test]
fn deeper_language_match_wins() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/doc")
        .language("fr")
        .handler("generic")
        .unwrap();
    router
        .route()
        .path("/doc")
        .language("fr-CA")
        .handler("canadian")
        .unwrap();

    assert_eq!(
        router
            .resolve(&get_in_language("/doc", "fr-CA"))
            .unwrap()
            .resource,
        "canadian"
    );
    assert_eq!(
        router.resolve(&get_in_language("/doc", "fr")).unwrap().resource,
        "generic"
    );
}

#[test]
fn language_miss_is_not_acceptable() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/doc")
        .language("en")
        .handler("he")
        .unwrap();

    match router.resolve(&get_in_language("/doc", "de")) {
        Err(ResolveError::NotAcceptable { languages, .. }) => {
            assert_eq!(languages.len(), 1);
        }
        other => panic!("expected NotAcceptable, got {:?}", other),
    }
}

#[test]
fn negotiated_values_surface_on_the_resolution() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/doc")
        .produces("text/html")
        .language("en-GB")
        .handler("page")
        .unwrap();

    let request = get("/doc")
        .with_header("accept", "text/html")
        .with_header("accept-language", "en-GB,en;q=0.7");
    let resolved = router.resolve(&request).unwrap();
    assert_eq!(resolved.media_type.unwrap().to_string(), "text/html");
    assert_eq!(resolved.language.unwrap().to_string(), "en-gb");
}

#[test]
fn unconstrained_route_serves_unmatched_accept() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("json")
        .unwrap();
    router.route().path("/data").handler("any").unwrap();

    // the produce-less sibling serves what negotiation cannot
    assert_eq!(
        router.resolve(&get_accepting("/data", "text/plain")).unwrap().resource,
        "any"
    );
    // but a successful negotiation outranks it
    assert_eq!(
        router
            .resolve(&get_accepting("/data", "application/json"))
            .unwrap()
            .resource,
        "json"
    );
}
