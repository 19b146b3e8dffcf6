use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::Method;
use trellis::{RequestParts, Router};

fn populated_router(routes: usize) -> Router<usize> {
    let router = Router::new();
    for i in 0..routes {
        router
            .route()
            .path(format!("/svc{}/items/{{id}}", i))
            .method(Method::GET)
            .produces("application/json")
            .handler(i)
            .expect("route registration");
        router
            .route()
            .path(format!("/svc{}/items", i))
            .method(Method::GET)
            .handler(i)
            .expect("route registration");
    }
    router
}

fn bench_literal_resolution(c: &mut Criterion) {
    let router = populated_router(50);
    let request = RequestParts::new(Method::GET, "/svc25/items");
    c.bench_function("resolve_literal_100_routes", |b| {
        b.iter(|| black_box(router.resolve(black_box(&request))))
    });
}

fn bench_pattern_resolution(c: &mut Criterion) {
    let router = populated_router(50);
    let request = RequestParts::new(Method::GET, "/svc25/items/12345")
        .with_header("accept", "application/json");
    c.bench_function("resolve_pattern_100_routes", |b| {
        b.iter(|| black_box(router.resolve(black_box(&request))))
    });
}

fn bench_negotiated_resolution(c: &mut Criterion) {
    let router: Router<usize> = Router::new();
    router
        .route()
        .path("/data")
        .method(Method::GET)
        .produces("application/json")
        .handler(0)
        .expect("route registration");
    router
        .route()
        .path("/data")
        .method(Method::GET)
        .produces("application/xml")
        .handler(1)
        .expect("route registration");
    let request = RequestParts::new(Method::GET, "/data")
        .with_header("accept", "application/xml;q=0.9, application/json;q=0.8");
    c.bench_function("resolve_negotiated", |b| {
        b.iter(|| black_box(router.resolve(black_box(&request))))
    });
}

criterion_group!(
    benches,
    bench_literal_resolution,
    bench_pattern_resolution,
    bench_negotiated_resolution
);
criterion_main!(benches);
