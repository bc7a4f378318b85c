use axum::{extract::Request, http::header, middleware::Next, response::Response};

/// Baseline hardening headers for every response.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let method = req.method();
    if method == "TRACE" || method == "TRACK" {
        return Response::builder()
            .status(axum::http::StatusCode::METHOD_NOT_ALLOWED)
            .body(axum::body::Body::empty())
            .unwrap();
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );

    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    headers.insert(
        header::SERVER,
        header::HeaderValue::from_static("lead-intake-backend"),
    );

    // Downloads set their own caching policy; everything else stays uncached
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
    }

    response
}
