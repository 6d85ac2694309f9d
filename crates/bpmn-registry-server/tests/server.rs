use bpmn_registry_server::{build_app, init_logging, LogFormat, RegistryService, ServerConfig};
use bpmn_registry_store::InMemoryProcessStore;
use std::sync::Arc;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
// Note: tower requires the 'util' feature for ServiceExt
use tower::ServiceExt;

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(cors_permissive: bool) -> ServerConfig {
        ServerConfig {
            port: 0, // Use a random available port
            bind_address: "127.0.0.1".to_string(),
            store_url: "memory://test".to_string(),
            store_max_connections: 1,
            log_level: "debug".to_string(),
            log_format: LogFormat::Text,
            cors_permissive,
        }
    }

    fn service() -> Arc<RegistryService> {
        Arc::new(RegistryService::new(Arc::new(InMemoryProcessStore::new())))
    }

    #[tokio::test]
    async fn test_permissive_cors_echoes_origin() {
        let app = build_app(service(), &test_config(true));

        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/processes")
            .header(header::ORIGIN, "http://editor.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://editor.example.com"
        );
    }

    #[tokio::test]
    async fn test_preflight_is_answered() {
        let app = build_app(service(), &test_config(true));

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/processes")
            .header(header::ORIGIN, "http://editor.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[tokio::test]
    async fn test_cors_can_be_disabled() {
        let app = build_app(service(), &test_config(false));

        let req = Request::builder()
            .uri("/api/processes")
            .header(header::ORIGIN, "http://editor.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_serves_over_tcp() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        init_logging(&test_config(true));
        init_logging(&test_config(true));

        let app = build_app(service(), &test_config(true));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Run the server in the background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200"));
        assert!(raw.contains("BPMN Flow Editor API"));
    }
}
