use std::sync::Arc;

use lambda_http::http::header::{HeaderValue, CACHE_CONTROL, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use serde::Serialize;
use tarefas_atoms::comments::{self, Comment};
use tarefas_atoms::tasks::{self, Task, TaskAccess};
use tarefas_atoms::users::Viewer;
use tarefas_shared::{auth, stats, AppState};

/// Initial load of the task page.
#[derive(Debug, Serialize)]
struct TaskPage {
    task_id: String,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<Task>,
    comments: Vec<Comment>,
}

fn with_cors_headers(mut resp: Response<Body>, origin: &str) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,X-User-Id,X-User-Name"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
    resp
}

/// Routes the read-only API.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    tracing::info!("API invoked - Method: {} Path: {}", method, path);

    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, &state.config.public_url));
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let resp = match (method, parts.as_slice()) {
        (&Method::GET, ["stats"]) => get_stats(&state).await,
        (&Method::GET, ["task", task_id]) => {
            let viewer = auth::viewer_from_headers(event.headers());
            get_task_page(&state, task_id, viewer.as_ref()).await
        }
        (_, ["stats"]) | (_, ["task", _]) => method_not_allowed(),
        _ => {
            tracing::warn!("No route matched - Method: {} Path: {}", method, path);
            not_found()
        }
    };

    resp.map(|r| with_cors_headers(r, &state.config.public_url))
}

async fn get_stats(state: &AppState) -> Result<Response<Body>, Error> {
    let stats = match stats::load_stats(state.store.as_ref()).await {
        Ok(stats) => stats,
        Err(e) => return server_error("Failed to load stats", &e),
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header(CACHE_CONTROL, "public, max-age=60")
        .body(serde_json::to_string(&stats)?.into())
        .map_err(Box::new)?)
}

async fn get_task_page(
    state: &AppState,
    task_id: &str,
    viewer: Option<&Viewer>,
) -> Result<Response<Body>, Error> {
    let store = state.store.as_ref();
    let access = match tasks::load_task_access(store, task_id, viewer).await {
        Ok(access) => access,
        Err(e) => return server_error("Failed to load task", &e),
    };

    let page = match access {
        TaskAccess::Allowed(task) => {
            let comments = match comments::load_comments_for_task(store, task_id).await {
                Ok(comments) => comments,
                Err(e) => return server_error("Failed to load comments", &e),
            };
            TaskPage {
                task_id: task_id.to_string(),
                allowed: true,
                task: Some(task),
                comments,
            }
        }
        TaskAccess::Denied => TaskPage {
            task_id: task_id.to_string(),
            allowed: false,
            task: None,
            comments: Vec::new(),
        },
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&page)?.into())
        .map_err(Box::new)?)
}

fn server_error(context: &str, err: &dyn std::error::Error) -> Result<Response<Body>, Error> {
    tracing::error!("{}: {}", context, err);
    Ok(Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({"error": context, "details": err.to_string()})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

fn method_not_allowed() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({"error": "Method not allowed"})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}
