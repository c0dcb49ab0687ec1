//! Tests for the bundled pages.

#[cfg(test)]
mod routes_tests {
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::parser::{Method, Request};
    use crate::routes::{
        build_router, hello_page, mime_type_for, quote_page, resolve_file_path, serve_file, split_quotes,
        status_json, status_page,
    };
    use crate::server::{ConnectionContext, Error, Response, ServerConfig, StatsAggregator, StatusCode};

    /// A scratch directory unique to one test.
    struct ScratchDir(PathBuf);

    impl ScratchDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!("webcore-rs-{}-{name}", std::process::id()));
            let _ = std::fs::remove_dir_all(&path);
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
            let path = self.0.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, contents).unwrap();
            path
        }

        fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn body_text(response: Response) -> String {
        String::from_utf8(response.body.map(|b| b.into_bytes()).unwrap_or_default()).unwrap()
    }

    fn get(path: &str, headers: &[&str]) -> Request {
        Request::new(
            Method::GET,
            path,
            "HTTP/1.1",
            headers.iter().map(|h| h.to_string()).collect(),
        )
    }

    fn context() -> ConnectionContext {
        ConnectionContext::new("127.0.0.1:40000".parse::<SocketAddr>().unwrap())
    }

    #[test]
    fn test_resolve_file_path() {
        let root = Path::new("/srv/www");
        assert_eq!(resolve_file_path(root, "/"), Some(PathBuf::from("/srv/www")));
        assert_eq!(
            resolve_file_path(root, "/docs/./guide.html"),
            Some(PathBuf::from("/srv/www/docs/guide.html"))
        );
        assert_eq!(
            resolve_file_path(root, "/a/../b.txt"),
            Some(PathBuf::from("/srv/www/b.txt"))
        );
        assert_eq!(resolve_file_path(root, "//double//slash"), Some(PathBuf::from("/srv/www/double/slash")));
    }

    #[test]
    fn test_resolve_file_path_rejects_escapes() {
        let root = Path::new("/srv/www");
        assert_eq!(resolve_file_path(root, "/../etc/passwd"), None);
        assert_eq!(resolve_file_path(root, "/a/b/../../../x"), None);
        assert_eq!(resolve_file_path(root, "/a\\..\\..\\x"), None);
        assert_eq!(resolve_file_path(root, "/nul\0byte"), None);
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("index.html")), "text/html");
        assert_eq!(mime_type_for(Path::new("INDEX.HTM")), "text/html");
        assert_eq!(mime_type_for(Path::new("style.css")), "text/css");
        assert_eq!(mime_type_for(Path::new("logo.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("photo.JPEG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(mime_type_for(Path::new("Makefile")), "application/octet-stream");
        assert_eq!(mime_type_for(Path::new("no-extension.")), "application/octet-stream");
        assert_eq!(mime_type_for(Path::new("photo.webp")), "image/webp");
        assert_eq!(mime_type_for(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(mime_type_for(Path::new("module.wasm")), "application/wasm");
        assert_eq!(mime_type_for(Path::new("table.csv")), "text/csv");
    }

    #[tokio::test]
    async fn test_serve_file() {
        let root = ScratchDir::new("serve-file");
        root.write("index.html", b"<h1>hi</h1>");
        root.write("img/dot.png", &[0x89, b'P', b'N', b'G', 0, 1, 2]);

        let response = serve_file(root.path(), "/index.html").await;
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.mime_type.as_deref(), Some("text/html"));
        assert_eq!(body_text(response), "<h1>hi</h1>");

        let response = serve_file(root.path(), "/img/dot.png").await;
        assert_eq!(response.mime_type.as_deref(), Some("image/png"));
        assert_eq!(
            response.body.map(|b| b.into_bytes()),
            Some(vec![0x89, b'P', b'N', b'G', 0, 1, 2])
        );
    }

    #[tokio::test]
    async fn test_serve_file_missing_and_forbidden() {
        let root = ScratchDir::new("serve-missing");
        root.write("img/dot.png", b"png");

        let response = serve_file(root.path(), "/nothing.html").await;
        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(body_text(response), "No such file: /nothing.html");

        // A directory is not a file
        let response = serve_file(root.path(), "/img").await;
        assert_eq!(response.status, StatusCode::NotFound);

        let response = serve_file(root.path(), "/../secret").await;
        assert_eq!(response.status, StatusCode::Forbidden);
        assert_eq!(body_text(response), "Permission denied: /../secret");
    }

    #[test]
    fn test_hello_first_visit() {
        let response = hello_page(&get("/hello", &[]), "http://127.0.0.1:8888");
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.cookies, Some(vec!["visits=1".to_string()]));

        let text = body_text(response);
        assert!(text.starts_with("Welcome, World!\n"));
        assert!(text.contains("This is your first visit to this page.\n"));
        assert!(text.contains("Set a `color` cookie"));
        assert!(text.contains("http://127.0.0.1:8888/status"));
    }

    #[test]
    fn test_hello_returning_visitor() {
        let request = get("/hello", &["Host: localhost", "Cookie: name=Ada; visits=2; color=teal"]);
        let response = hello_page(&request, "http://localhost");
        assert_eq!(response.cookies, Some(vec!["visits=3".to_string()]));

        let text = body_text(response);
        assert!(text.starts_with("Welcome, Ada!\n"));
        assert!(text.contains("You have visited this page 2 times before.\n"));
        assert!(text.contains("Your favorite color is teal.\n"));
    }

    #[test]
    fn test_hello_ignores_bad_cookies() {
        let request = get("/hello", &["Cookie: visits=lots; color=plaid; name="]);
        let response = hello_page(&request, "http://localhost");
        assert_eq!(response.cookies, Some(vec!["visits=1".to_string()]));

        let text = body_text(response);
        assert!(text.starts_with("Welcome, World!\n"));
        assert!(text.contains("This is your first visit"));
        assert!(!text.contains("plaid"));

        let response = hello_page(&get("/hello", &["Cookie: visits=1"]), "http://localhost");
        assert!(body_text(response).contains("You have visited this page 1 time before.\n"));
    }

    #[test]
    fn test_split_quotes() {
        let text = "one\n%\ntwo\nlines\n%\n\n%\nthree";
        assert_eq!(split_quotes(text), vec!["one\n", "two\nlines\n", "three\n"]);
        assert!(split_quotes("").is_empty());
        assert!(split_quotes("%\n%\n").is_empty());
        // Only a line of nothing but % separates
        assert_eq!(split_quotes("100%\n% \n"), vec!["100%\n% \n"]);
    }

    #[tokio::test]
    async fn test_quote_page() {
        let dir = ScratchDir::new("quotes");
        let file = dir.write("quotations.txt", b"Less is <more> & so on.\n");

        let response = quote_page(&file).await.unwrap();
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.mime_type.as_deref(), Some("text/html"));
        let text = body_text(response);
        assert!(text.contains("<pre>Less is &lt;more&gt; &amp; so on.\n</pre>"));
    }

    #[tokio::test]
    async fn test_quote_page_failures() {
        let dir = ScratchDir::new("quotes-bad");
        let missing = dir.path().join("missing.txt");
        assert!(matches!(quote_page(&missing).await, Err(Error::IoError(_))));

        let empty = dir.write("empty.txt", b"%\n%\n");
        assert!(matches!(quote_page(&empty).await, Err(Error::InternalError(_))));
    }

    #[test]
    fn test_status_page() {
        let stats = StatsAggregator::new();
        stats.connection_opened();
        stats.request_completed(Duration::from_millis(2));

        let mut ctx = context();
        ctx.requests_handled = 3;

        let text = body_text(status_page(&stats, &ctx));
        assert!(text.starts_with(&format!("Web server {}", env!("CARGO_PKG_NAME"))));
        assert!(text.contains("Server Statistics:\n1 connections in total\n"));
        assert!(text.contains("2.000 ms average request handling time\n"));
        assert!(text.contains("3 requests handled on this connection so far\n"));
        assert!(text.contains("s elapsed since start of this connection\n"));
    }

    #[test]
    fn test_status_json() {
        let stats = StatsAggregator::new();
        stats.error_observed();

        let response = status_json(&stats).unwrap();
        assert_eq!(response.mime_type.as_deref(), Some("application/json"));
        let json: serde_json::Value = serde_json::from_str(&body_text(response)).unwrap();
        assert_eq!(json["errors"], 1);
        assert_eq!(json["active_connections"], 0);
    }

    #[tokio::test]
    async fn test_build_router() {
        let root = ScratchDir::new("router");
        root.write("welcome.html", b"welcome");
        let config = ServerConfig {
            web_root: root.path().to_path_buf(),
            quotes_file: root.path().join("no-quotes.txt"),
            ..ServerConfig::default()
        };
        let stats = Arc::new(StatsAggregator::new());
        let router = build_router(&config, Arc::clone(&stats));

        let response = router.dispatch(get("/hello?lang=en", &[]), context()).await.unwrap();
        assert!(body_text(response).contains("http://127.0.0.1:8888/quote"));

        let response = router.dispatch(get("/status.json", &[]), context()).await.unwrap();
        assert_eq!(response.mime_type.as_deref(), Some("application/json"));

        let response = router.dispatch(get("/welcome.html", &[]), context()).await.unwrap();
        assert_eq!(body_text(response), "welcome");

        let response = router.dispatch(get("/welcome.html?v=2", &[]), context()).await.unwrap();
        assert_eq!(response.status, StatusCode::Ok);

        let post = Request::new(Method::POST, "/hello", "HTTP/1.1", Vec::new());
        let response = router.dispatch(post, context()).await.unwrap();
        assert_eq!(response.status, StatusCode::MethodNotAllowed);

        let post = Request::new(Method::POST, "/welcome.html", "HTTP/1.1", Vec::new());
        let response = router.dispatch(post, context()).await.unwrap();
        assert_eq!(response.status, StatusCode::MethodNotAllowed);

        // A missing quotes file surfaces as a handler error
        assert!(router.dispatch(get("/quote", &[]), context()).await.is_err());
    }
}
