//! The sandbox HTTP surface.
//!
//! Plain REST over hyper: one route per orchestrator operation, manual
//! method gating, CORS headers on every response. All project-scoped
//! routes require an opened project and answer 400 until `POST
//! /projects` has succeeded.

use crate::logs::LogCache;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use sandbox_config::{ChainConfig, ServerConfig};
use sandbox_project::Project;
use sandbox_source::LocalDirectorySource;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Shared server state.
pub struct AppState {
    /// The currently opened project, if any.
    pub project: RwLock<Option<Project>>,
    /// HTTP configuration.
    pub server_config: ServerConfig,
    /// Configuration for chains created by `POST /projects`.
    pub chain_config: ChainConfig,
    /// The session log cache served by `GET /projects/logs`.
    pub logs: LogCache,
}

impl AppState {
    /// Creates server state with no open project.
    pub fn new(server_config: ServerConfig, chain_config: ChainConfig, logs: LogCache) -> Self {
        Self {
            project: RwLock::new(None),
            server_config,
            chain_config,
            logs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    #[serde(rename = "projectUrl")]
    project_url: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    source: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    arguments: String,
}

/// Runs the HTTP server until the process is interrupted.
pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.server_config.bind_address;
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, state).await }
            }))
        }
    });

    info!(target: "sandbox::server", address = %addr, "server is running");
    Server::bind(&addr)
        .serve(make_svc)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!(target: "sandbox::server", "shutting down");
        })
        .await?;
    Ok(())
}

/// Dispatches one HTTP request.
pub async fn handle_request(
    req: Request<Body>,
    state: Arc<AppState>,
) -> Result<Response<Body>, hyper::Error> {
    let cors = state.server_config.cors_enabled;
    if req.method() == Method::OPTIONS {
        return Ok(preflight_response(cors));
    }

    let path = req.uri().path().to_string();
    let method = req.method().clone();
    let response = match (method, path.as_str()) {
        (Method::POST, "/projects") => create_project(req, &state).await,
        (Method::GET, "/projects/files") => list_files(&state).await,
        (Method::GET, "/projects/logs") => list_logs(&state).await,
        (Method::GET, "/projects/blockchain-state") => blockchain_state(&state).await,
        (Method::POST, "/projects/transactions") => execute(req, &state, Execution::Transaction).await,
        (Method::POST, "/projects/scripts") => execute(req, &state, Execution::Script).await,
        (
            _,
            "/projects"
            | "/projects/files"
            | "/projects/logs"
            | "/projects/blockchain-state"
            | "/projects/transactions"
            | "/projects/scripts",
        ) => text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    Ok(with_cors(response, cors))
}

async fn create_project(req: Request<Body>, state: &AppState) -> Response<Body> {
    let request: CreateProjectRequest = match read_json_body(req).await {
        Ok(request) => request,
        Err(response) => return *response,
    };

    // Drop any previous session before the new clone starts so its
    // chain does not outlive the project it belonged to.
    state.project.write().await.take();

    let repository = Box::new(LocalDirectorySource::new());
    match Project::open(repository, state.chain_config.clone(), &request.project_url).await {
        Ok(project) => {
            *state.project.write().await = Some(project);
            json_response(StatusCode::CREATED, b"{}".to_vec())
        }
        Err(e) => {
            error!(target: "sandbox::server", error = %e, "failed to open project");
            text_response(project_error_status(&e), &e.to_string())
        }
    }
}

async fn list_files(state: &AppState) -> Response<Body> {
    let project = state.project.read().await;
    let Some(project) = project.as_ref() else {
        return project_not_opened();
    };
    match project.files().await {
        Ok(files) => match serde_json::to_vec(&files) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => internal_error(&e),
        },
        Err(e) => text_response(project_error_status(&e), &e.to_string()),
    }
}

async fn list_logs(state: &AppState) -> Response<Body> {
    if state.project.read().await.is_none() {
        return project_not_opened();
    }
    match state.logs.to_json() {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(e) => internal_error(&e),
    }
}

async fn blockchain_state(state: &AppState) -> Response<Body> {
    let project = state.project.read().await;
    let Some(project) = project.as_ref() else {
        return project_not_opened();
    };
    match project.chain_state().to_json() {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(e) => internal_error(&e),
    }
}

enum Execution {
    Script,
    Transaction,
}

async fn execute(req: Request<Body>, state: &AppState, mode: Execution) -> Response<Body> {
    let request: ExecuteRequest = match read_json_body(req).await {
        Ok(request) => request,
        Err(response) => return *response,
    };

    let project = state.project.read().await;
    let Some(project) = project.as_ref() else {
        return project_not_opened();
    };

    let result = match mode {
        Execution::Script => project
            .execute_script(&request.source, &request.location, &request.arguments)
            .await
            .and_then(|value| Ok(serde_json::to_vec(&value)?)),
        Execution::Transaction => project
            .execute_transaction(&request.source, &request.location, &request.arguments)
            .await
            .and_then(|value| Ok(serde_json::to_vec(&value)?)),
    };

    match result {
        Ok(body) => json_response(StatusCode::CREATED, body),
        Err(e) => text_response(project_error_status(&e), &e.to_string()),
    }
}

async fn read_json_body<T: serde::de::DeserializeOwned>(
    req: Request<Body>,
) -> Result<T, Box<Response<Body>>> {
    let bytes = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|e| Box::new(text_response(StatusCode::BAD_REQUEST, &format!("error reading request body: {e}"))))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        Box::new(text_response(
            StatusCode::BAD_REQUEST,
            &format!("error parsing request body: {e}"),
        ))
    })
}

fn project_error_status(error: &sandbox_project::Error) -> StatusCode {
    use sandbox_project::Error;
    match error {
        Error::Source(_) | Error::Manifest(_) | Error::InvalidArguments(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::Chain(sandbox_chain::Error::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn project_not_opened() -> Response<Body> {
    text_response(StatusCode::BAD_REQUEST, "project not opened")
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert("Content-Type", "application/json".parse().expect("static header"));
    response
}

fn text_response(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(message.to_string()));
    *response.status_mut() = status;
    response
}

fn internal_error(error: &dyn std::error::Error) -> Response<Body> {
    error!(target: "sandbox::server", error = %error, "internal error");
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

fn preflight_response(cors: bool) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    with_cors_headers(&mut response, cors, true);
    response
}

fn with_cors(mut response: Response<Body>, cors: bool) -> Response<Body> {
    with_cors_headers(&mut response, cors, false);
    response
}

fn with_cors_headers(response: &mut Response<Body>, cors: bool, preflight: bool) {
    if !cors {
        return;
    }
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", "*".parse().expect("static header"));
    if preflight {
        headers.insert(
            "Access-Control-Allow-Methods",
            "GET, POST, OPTIONS".parse().expect("static header"),
        );
        headers.insert(
            "Access-Control-Allow-Headers",
            "Content-Type".parse().expect("static header"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            ServerConfig::default(),
            ChainConfig::default(),
            LogCache::new(),
        ))
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn test_wrong_methods_are_rejected() {
        let state = state();
        for (method, path) in [
            (Method::DELETE, "/projects"),
            (Method::GET, "/projects"),
            (Method::POST, "/projects/files"),
            (Method::PUT, "/projects/scripts"),
            (Method::GET, "/projects/transactions"),
        ] {
            let response = handle_request(request(method, path, ""), state.clone())
                .await
                .expect("handled");
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn test_project_scoped_routes_require_open_project() {
        let state = state();
        for (method, path, body) in [
            (Method::GET, "/projects/files", ""),
            (Method::GET, "/projects/logs", ""),
            (Method::GET, "/projects/blockchain-state", ""),
            (
                Method::POST,
                "/projects/scripts",
                r#"{"source": "{}", "location": "", "arguments": ""}"#,
            ),
            (
                Method::POST,
                "/projects/transactions",
                r#"{"source": "{}", "location": "", "arguments": ""}"#,
            ),
        ] {
            let response = handle_request(request(method, path, body), state.clone())
                .await
                .expect("handled");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = handle_request(request(Method::GET, "/nope", ""), state())
            .await
            .expect("handled");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preflight_carries_cors_headers() {
        let response = handle_request(request(Method::OPTIONS, "/projects", ""), state())
            .await
            .expect("handled");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key("Access-Control-Allow-Origin"));
    }

    #[tokio::test]
    async fn test_malformed_project_body_is_400() {
        let response = handle_request(
            request(Method::POST, "/projects", "not json"),
            state(),
        )
        .await
        .expect("handled");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
