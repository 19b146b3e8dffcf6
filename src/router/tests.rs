#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{ResolveError, Router, RouterOptions};
use crate::exchange::RequestParts;
use crate::route::RouteFilter;
use http::Method;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn get(path: &str) -> RequestParts {
    RequestParts::new(Method::GET, path)
}

#[test]
fn registration_is_validated_at_the_terminal_call() {
    let router: Router<&'static str> = Router::new();
    let err = router.route().path("relative/{id}").handler("h").unwrap_err();
    assert!(err.to_string().contains("path pattern"));
    // the failed call registered nothing
    assert!(router.routes().is_empty());
}

#[test]
fn duplicate_registration_is_flagged_as_conflict() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/a")
        .method(Method::GET)
        .handler("first")
        .unwrap();
    router
        .route()
        .path("/a")
        .method(Method::GET)
        .handler("second")
        .unwrap();

    let conflicts = router.conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].first.index, 0);
    assert_eq!(conflicts[0].second.index, 1);
    // resolution still works: the earlier registration wins the tie
    assert_eq!(router.resolve(&get("/a")).unwrap().resource, "first");
    // conflicts are visible through find_routes
    assert!(router.routes().iter().all(|r| r.conflicted));
}

#[test]
fn overlapping_produce_ranges_conflict_at_equal_quality() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .produces("application/*")
        .handler("wide")
        .unwrap();
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("narrow")
        .unwrap();
    assert_eq!(router.conflicts().len(), 1);

    // different qualities do not conflict
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/data")
        .produces("application/json;q=0.5")
        .handler("half")
        .unwrap();
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("full")
        .unwrap();
    assert!(router.conflicts().is_empty());
}

#[test]
fn conflict_sink_receives_new_conflicts() {
    let router: Router<&'static str> = Router::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    router.on_conflict(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    router.route().path("/a").handler("one").unwrap();
    router.route().path("/a").handler("two").unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn find_routes_filters_by_criteria() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/a")
        .method(Method::GET)
        .handler("a_get")
        .unwrap();
    router
        .route()
        .path("/a")
        .method(Method::POST)
        .handler("a_post")
        .unwrap();
    router
        .route()
        .path("/b")
        .method(Method::GET)
        .handler("b_get")
        .unwrap();

    let all = router.routes();
    assert_eq!(all.len(), 3);
    let gets = router.find_routes(&RouteFilter::new().method(Method::GET));
    assert_eq!(gets.len(), 2);
    let a = router.find_routes(&RouteFilter::new().path("/a"));
    assert_eq!(a.len(), 2);
    let disabled = router.find_routes(&RouteFilter::new().enabled(false));
    assert!(disabled.is_empty());
}

#[test]
fn lenient_produce_falls_through_to_not_found() {
    let options = RouterOptions {
        lenient_produce: true,
        ..RouterOptions::default()
    };
    let router: Router<&'static str> = Router::with_options(options);
    router
        .route()
        .path("/data")
        .produces("application/json")
        .handler("json")
        .unwrap();

    let request = get("/data").with_header("accept", "text/plain");
    // strict would answer NotAcceptable; lenient yields a plain NotFound
    assert_eq!(router.resolve(&request), Err(ResolveError::NotFound));
}

#[test]
fn path_templates_lists_registered_templates() {
    let router: Router<&'static str> = Router::new();
    router.route().path("/a").handler("a").unwrap();
    router.route().path("/b/{id}").method(Method::GET).handler("b").unwrap();
    router.route().path("/b/{id}").method(Method::POST).handler("b2").unwrap();
    let templates = router.path_templates();
    assert_eq!(templates, vec!["/a".to_string(), "/b/{id}".to_string()]);
}

#[test]
fn subset_disable_spans_methods() {
    let router: Router<&'static str> = Router::new();
    router
        .route()
        .path("/a")
        .method(Method::GET)
        .handler("a_get")
        .unwrap();
    router
        .route()
        .path("/a")
        .method(Method::POST)
        .handler("a_post")
        .unwrap();

    // no method in the selector: both routes under /a are disabled
    assert_eq!(router.route().path("/a").disable().unwrap(), 2);
    assert_eq!(router.resolve(&get("/a")), Err(ResolveError::Disabled));
}

#[test]
fn cartesian_product_counts() {
    let router: Router<&'static str> = Router::new();
    let registered = router
        .route()
        .path("/a")
        .path("/b")
        .method(Method::GET)
        .method(Method::HEAD)
        .produces("application/json")
        .handler("h")
        .unwrap();
    assert_eq!(registered, 4);
    assert_eq!(router.routes().len(), 4);
}
