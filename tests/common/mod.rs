#![allow(dead_code)]

use http::Method;
use trellis::RequestParts;

/// Initialize test logging once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Build a GET request for a path.
pub fn get(path: &str) -> RequestParts {
    RequestParts::new(Method::GET, path)
}

/// Build a request with an arbitrary method.
pub fn req(method: Method, path: &str) -> RequestParts {
    RequestParts::new(method, path)
}

/// Build a GET request with an `Accept` header.
pub fn get_accepting(path: &str, accept: &str) -> RequestParts {
    get(path).with_header("accept", accept)
}

/// Build a GET request with an `Accept-Language` header.
pub fn get_in_language(path: &str, language: &str) -> RequestParts {
    get(path).with_header("accept-language", language)
}
