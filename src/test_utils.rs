//! Test utilities for driving the HTTP application in-process
//!
//! The app runs on the in-memory store and a temporary file store, so
//! every test gets a fresh, isolated instance.

#[cfg(test)]
pub mod test_app {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::{
        config::{
            AuthConfig, CipherConfig, Config, DatabaseConfig, LogFormat, ServerConfig,
            StorageConfig, StoreBackend, WorkflowConfig,
        },
        db::MemoryStore,
        middleware::auth::Claims,
        models::ActorContext,
        state::AppState,
        storage::LocalFileStore,
    };

    pub const JWT_SECRET: &str = "test_secret_key_for_testing_only";

    /// A running test application and the directory backing its file store
    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
        pub files: TempDir,
    }

    fn test_config(storage_root: PathBuf) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                rust_log: "debug".to_string(),
                log_format: LogFormat::Pretty,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            cipher: CipherConfig {
                keys: vec![("2026".to_string(), vec![7u8; 32])],
                active_key: "2026".to_string(),
            },
            storage: StorageConfig { root: storage_root },
            workflow: WorkflowConfig::default(),
        }
    }

    /// Create a test application on the in-memory store
    pub fn create_test_app() -> TestApp {
        let files = TempDir::new().expect("Failed to create file store directory");
        let config = test_config(files.path().to_path_buf());

        let store = Arc::new(MemoryStore::new());
        let cipher = config
            .cipher
            .build_cipher()
            .expect("Failed to build test cipher");
        let file_store = Arc::new(LocalFileStore::new(files.path()));

        let state = AppState::new(config, store.clone(), store, cipher, file_store);
        let router = crate::app(state.clone());

        TestApp {
            router,
            state,
            files,
        }
    }

    /// Mint a bearer token the way the identity provider would
    pub fn token_for(actor: &ActorContext) -> String {
        let claims = Claims {
            sub: actor.actor_id.to_string(),
            role: actor.role.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to encode test token")
    }

    impl TestApp {
        /// Write a deposited file into the file store
        pub fn put_file(&self, relative: &str, contents: &[u8]) {
            let path = self.files.path().join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create file directory");
            }
            std::fs::write(path, contents).expect("Failed to write file");
        }

        /// Send a request and decode the JSON response body
        pub async fn send(
            &self,
            method: Method,
            uri: &str,
            actor: Option<&ActorContext>,
            body: Option<String>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(actor) = actor {
                let bearer = format!("Bearer {}", token_for(actor));
                builder = builder.header(header::AUTHORIZATION, bearer);
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body)),
                None => builder.body(Body::empty()),
            }
            .expect("Failed to build request");

            let response = self
                .router
                .clone()
                .oneshot(request)
                .await
                .expect("Router is infallible");
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("Failed to read body");
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).expect("Response is not JSON")
            };
            (status, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use super::test_app::{TestApp, create_test_app};
    use crate::models::ActorContext;

    async fn open_contest(app: &TestApp, admin: &ActorContext) -> String {
        let now = Utc::now();
        let body = json!({
            "title": "Concours 2026",
            "opens_at": now - Duration::hours(1),
            "closes_at": now + Duration::days(1),
            "grading_grid": { "criteria": [
                { "key": "criterion1", "max_points": 10.0 },
                { "key": "criterion2", "max_points": 10.0 }
            ]}
        });
        let (status, contest) = app
            .send(Method::POST, "/api/v1/contests", Some(admin), Some(body.to_string()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(contest["status"], "draft");
        assert_eq!(contest["max_points"], 20.0);

        let id = contest["id"].as_str().unwrap().to_string();
        let (status, _) = app
            .send(
                Method::PUT,
                &format!("/api/v1/contests/{id}/status"),
                Some(admin),
                Some(json!({ "status": "open" }).to_string()),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = create_test_app();
        let (status, body) = app.send(Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["audit_failures"], 0);
    }

    #[tokio::test]
    async fn test_routes_require_a_token() {
        let app = create_test_app();
        let (status, body) = app.send(Method::GET, "/api/v1/contests", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_oversized_body_is_refused() {
        use axum::{
            body::Body,
            http::{Request, header},
        };
        use tower::ServiceExt;

        use super::test_app::token_for;
        use crate::constants::MAX_REQUEST_BODY_BYTES;

        let app = create_test_app();
        let admin = ActorContext::admin(Uuid::new_v4());
        let body = format!(
            r#"{{"title": "Concours", "description": "{}"}}"#,
            "x".repeat(MAX_REQUEST_BODY_BYTES)
        );

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/contests")
            .header(header::AUTHORIZATION, format!("Bearer {}", token_for(&admin)))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let (_, contests) = app.send(Method::GET, "/api/v1/contests", Some(&admin), None).await;
        assert_eq!(contests["total"], 0);
    }

    #[tokio::test]
    async fn test_candidate_cannot_create_contest() {
        let app = create_test_app();
        let candidate = ActorContext::candidate(Uuid::new_v4());
        let body = json!({
            "title": "Concours",
            "opens_at": Utc::now(),
            "closes_at": Utc::now() + Duration::days(1),
        });
        let (status, body) = app
            .send(Method::POST, "/api/v1/contests", Some(&candidate), Some(body.to_string()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_deposit_to_grade_over_http() {
        let app = create_test_app();
        let admin = ActorContext::admin(Uuid::new_v4());
        let candidate = ActorContext::candidate(Uuid::new_v4());
        let corrector = ActorContext::corrector(Uuid::new_v4());

        let contest_id = open_contest(&app, &admin).await;

        app.put_file("c1/copy.pdf", b"%PDF-1.7");
        let (status, submission) = app
            .send(
                Method::POST,
                "/api/v1/submissions",
                Some(&candidate),
                Some(json!({ "contest_id": contest_id, "path": "c1/copy.pdf" }).to_string()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(submission["status"], "pending");
        assert!(submission["anonymous_id"].as_str().unwrap().starts_with("ANO-"));
        assert!(submission.get("candidate_id").is_none());
        assert!(submission.get("encrypted_path").is_none());
        let submission_id = submission["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .send(
                Method::POST,
                &format!("/api/v1/submissions/{submission_id}/attribution"),
                Some(&admin),
                Some(json!({ "corrector_id": corrector.actor_id }).to_string()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, pending) = app
            .send(Method::GET, "/api/v1/attributions/pending", Some(&corrector), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending["attributions"].as_array().unwrap().len(), 1);

        let (status, file) = app
            .send(
                Method::GET,
                &format!("/api/v1/submissions/{submission_id}/file"),
                Some(&corrector),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(file["state"], "available");
        assert_eq!(file["size"], 8);

        let evaluation = r#"{"criterion1": 8, "criterion2": 7.5, "general_comment": "Solide"}"#;
        let (status, correction) = app
            .send(
                Method::POST,
                &format!("/api/v1/submissions/{submission_id}/corrections"),
                Some(&corrector),
                Some(evaluation.to_string()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(correction["correction"]["evaluation_json"], evaluation);
        assert_eq!(correction["score"]["points"], 15.5);
        let correction_id = correction["correction"]["id"].as_str().unwrap().to_string();

        let (status, validated) = app
            .send(
                Method::POST,
                &format!("/api/v1/corrections/{correction_id}/validate"),
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(validated["submission"]["status"], "graded");
        assert_eq!(validated["submission"]["final_score"], 15.5);

        let (status, refused) = app
            .send(
                Method::POST,
                &format!("/api/v1/corrections/{correction_id}/reject"),
                Some(&admin),
                Some(json!({ "comment": "Trop tard" }).to_string()),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(refused["error"]["code"], "ALREADY_VALIDATED");

        let (status, stats) = app
            .send(
                Method::GET,
                &format!("/api/v1/contests/{contest_id}/statistics"),
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["graded"], 1);
        assert_eq!(stats["mean_score"], 15.5);

        let (status, audit) = app
            .send(Method::GET, "/api/v1/audit?limit=10", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!audit.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_evaluation_is_unprocessable() {
        let app = create_test_app();
        let admin = ActorContext::admin(Uuid::new_v4());
        let candidate = ActorContext::candidate(Uuid::new_v4());
        let corrector = ActorContext::corrector(Uuid::new_v4());

        let contest_id = open_contest(&app, &admin).await;
        app.put_file("copy.pdf", b"data");
        let (_, submission) = app
            .send(
                Method::POST,
                "/api/v1/submissions",
                Some(&candidate),
                Some(json!({ "contest_id": contest_id, "path": "copy.pdf" }).to_string()),
            )
            .await;
        let submission_id = submission["id"].as_str().unwrap().to_string();
        app.send(
            Method::POST,
            &format!("/api/v1/submissions/{submission_id}/attribution"),
            Some(&admin),
            Some(json!({ "corrector_id": corrector.actor_id }).to_string()),
        )
        .await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/submissions/{submission_id}/corrections"),
                Some(&corrector),
                Some(r#"{"criterion1": 12}"#.to_string()),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_EVALUATION");

        let (_, view) = app
            .send(
                Method::GET,
                &format!("/api/v1/submissions/{submission_id}"),
                Some(&candidate),
                None,
            )
            .await;
        assert_eq!(view["status"], "in_correction");
        assert_eq!(view["file_available"], true);
    }
}
