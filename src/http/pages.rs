//! HTML pages from the public directory

use super::response::{error_response, html, not_found, HttpResponse};
use crate::error::ApiError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Serve `file` from `public_dir`; a missing file is a 404
pub async fn serve(public_dir: &Path, file: &str) -> HttpResponse {
    let path = public_dir.join(file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => html(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Page not found: {:?}", path);
            not_found()
        }
        Err(e) => error_response(&ApiError::internal("Page read failed", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;

    #[tokio::test]
    async fn test_serve_existing_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("login.html"), "<h1>login</h1>").unwrap();

        let found = serve(dir.path(), "login.html").await;
        assert_eq!(found.status(), StatusCode::OK);
        assert!(found.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let missing = serve(dir.path(), "orders.html").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
