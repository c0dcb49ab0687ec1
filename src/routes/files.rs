//! Static files from the web root.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::server::{Response, StatusCode};

/// Map a URL path onto a file under `web_root`.
///
/// The path is normalized lexically: empty and `.` segments are skipped and
/// `..` removes the previous segment. Returns `None` if the path would climb
/// out of the web root or contains a segment that is not a plain name.
pub fn resolve_file_path(web_root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            name if name.contains(['\\', '\0']) => return None,
            name => segments.push(name),
        }
    }

    let mut path = web_root.to_path_buf();
    path.extend(segments);
    Some(path)
}

/// The Content-Type for a file, guessed from its extension.
pub fn mime_type_for(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

/// Any `GET` without its own route: the file at `url_path` under `web_root`.
///
/// * 403 if the path escapes the web root or the file cannot be read
/// * 404 if there is no regular file at that path
pub async fn serve_file(web_root: &Path, url_path: &str) -> Response {
    info!("Handling http get file request, for {url_path}");

    let Some(file_path) = resolve_file_path(web_root, url_path) else {
        warn!("Path traversal attempt detected: {url_path}");
        return Response::text(StatusCode::Forbidden, format!("Permission denied: {url_path}"));
    };

    match tokio::fs::metadata(&file_path).await {
        Ok(metadata) if metadata.is_file() => {}
        _ => {
            info!("File was not found: {}", file_path.display());
            return Response::text(StatusCode::NotFound, format!("No such file: {url_path}"));
        }
    }

    match tokio::fs::read(&file_path).await {
        Ok(data) => Response::new(StatusCode::Ok)
            .with_content_type(mime_type_for(&file_path))
            .with_body_bytes(data),
        Err(e) => {
            warn!("Error reading {}: {e}", file_path.display());
            Response::text(StatusCode::Forbidden, format!("Permission denied: {url_path}"))
        }
    }
}
