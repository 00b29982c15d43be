use actix_cors::Cors;
use actix_web::{
    delete, get, post, put, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult,
};
use doccore::{
    FileStore, IoType, Node, NodeKind, SessionStatus, SessionStore, Value, Workflow, WorkflowId,
    WorkflowStore,
};
use docnodes::{LocalFileStore, OpenRouterConfig, PdfiumExtractor, PdfiumRenderer};
use docruntime::{
    ExecutionCoordinator, InMemorySessionStore, InMemoryWorkflowStore, PipelineExecutor,
    ProcessorRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Application state shared across handlers
struct AppState {
    store: Arc<dyn WorkflowStore>,
    files: Arc<dyn FileStore>,
    sessions: Arc<dyn SessionStore>,
    coordinator: Arc<ExecutionCoordinator>,
}

fn default_io_type() -> IoType {
    IoType::Text
}

/// Request body for workflow creation
#[derive(Debug, Deserialize)]
struct CreateWorkflowRequest {
    name: String,
    #[serde(default = "default_io_type")]
    input_type: IoType,
    #[serde(default = "default_io_type")]
    output_type: IoType,
    #[serde(default)]
    input_data: Option<String>,
}

/// Request body for workflow updates
#[derive(Debug, Deserialize)]
struct UpdateWorkflowRequest {
    name: String,
    input_type: IoType,
    output_type: IoType,
    #[serde(default)]
    input_data: Option<String>,
}

/// Request body for appending a node
#[derive(Debug, Deserialize)]
struct AddNodeRequest {
    node_type: NodeKind,
    #[serde(default)]
    config: HashMap<String, Value>,
}

/// Response for scheduling a run
#[derive(Debug, Serialize)]
struct RunResponse {
    session_id: String,
    status: SessionStatus,
    message: String,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Query parameters for file upload
#[derive(Debug, Deserialize)]
struct UploadQuery {
    filename: String,
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "docserver"
    }))
}

/// List all workflows with their node sequences
#[get("/api/workflows")]
async fn list_workflows(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let mut workflows = Vec::new();
    for workflow in data.store.list_workflows().await {
        let nodes = data.store.list_nodes(workflow.id).await;
        workflows.push(workflow.with_nodes(nodes));
    }

    Ok(HttpResponse::Ok().json(workflows))
}

/// Create a new workflow with an empty node sequence
#[post("/api/workflows")]
async fn create_workflow(
    data: web::Data<AppState>,
    req: web::Json<CreateWorkflowRequest>,
) -> ActixResult<impl Responder> {
    let req = req.into_inner();
    let workflow = Workflow::new(req.name, req.input_type, req.output_type, req.input_data);

    info!("Creating workflow: {} ({})", workflow.name, workflow.id);

    let workflow = data.store.save_workflow(workflow).await;

    Ok(HttpResponse::Created().json(workflow))
}

/// Get a specific workflow with its nodes
#[get("/api/workflows/{id}")]
async fn get_workflow(
    data: web::Data<AppState>,
    path: web::Path<WorkflowId>,
) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();

    match data.store.find_workflow(workflow_id).await {
        Some(workflow) => {
            let nodes = data.store.list_nodes(workflow_id).await;
            Ok(HttpResponse::Ok().json(workflow.with_nodes(nodes)))
        }
        None => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Workflow {} not found", workflow_id),
        })),
    }
}

/// Update a workflow's name and input/output configuration.
/// Copy-on-write: the stored record is replaced by a new version.
#[put("/api/workflows/{id}")]
async fn update_workflow(
    data: web::Data<AppState>,
    path: web::Path<WorkflowId>,
    req: web::Json<UpdateWorkflowRequest>,
) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();
    let req = req.into_inner();

    match data.store.find_workflow(workflow_id).await {
        Some(workflow) => {
            let updated = workflow
                .update_io_config(req.input_type, req.output_type, req.input_data)
                .rename(req.name);
            let updated = data.store.save_workflow(updated).await;
            let nodes = data.store.list_nodes(workflow_id).await;
            Ok(HttpResponse::Ok().json(updated.with_nodes(nodes)))
        }
        None => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Workflow {} not found", workflow_id),
        })),
    }
}

/// Delete a workflow and its nodes
#[delete("/api/workflows/{id}")]
async fn delete_workflow(
    data: web::Data<AppState>,
    path: web::Path<WorkflowId>,
) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();

    if data.store.delete_workflow(workflow_id).await {
        info!("Deleted workflow: {}", workflow_id);
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Workflow deleted successfully"
        })))
    } else {
        Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Workflow {} not found", workflow_id),
        }))
    }
}

/// Append a node to a workflow's pipeline.
/// The domain rules are checked against the currently persisted node
/// sequence on every request.
#[post("/api/workflows/{id}/nodes")]
async fn add_node(
    data: web::Data<AppState>,
    path: web::Path<WorkflowId>,
    req: web::Json<AddNodeRequest>,
) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();
    let req = req.into_inner();

    let workflow = match data.store.find_workflow(workflow_id).await {
        Some(workflow) => workflow,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorResponse {
                error: format!("Workflow {} not found", workflow_id),
            }))
        }
    };

    let nodes = data.store.list_nodes(workflow_id).await;
    if let Err(e) = workflow.with_nodes(nodes).validate_append(req.node_type) {
        return Ok(HttpResponse::UnprocessableEntity().json(ErrorResponse {
            error: e.to_string(),
        }));
    }

    let node = Node::new(workflow_id, req.node_type, req.config);
    let node = data.store.append_node(node).await;

    info!("Appended {} node to workflow {}", node.kind, workflow_id);

    Ok(HttpResponse::Created().json(node))
}

/// Schedule an asynchronous workflow run; returns a session id to poll
#[post("/api/workflows/{id}/run")]
async fn run_workflow(
    data: web::Data<AppState>,
    path: web::Path<WorkflowId>,
) -> ActixResult<impl Responder> {
    let workflow_id = path.into_inner();

    if data.store.find_workflow(workflow_id).await.is_none() {
        return Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Workflow {} not found", workflow_id),
        }));
    }

    match data.coordinator.start(workflow_id).await {
        Ok(session_id) => Ok(HttpResponse::Accepted().json(RunResponse {
            session_id,
            status: SessionStatus::Processing,
            message: "Workflow execution started".to_string(),
        })),
        Err(e) => {
            error!("Failed to schedule workflow {}: {}", workflow_id, e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
    }
}

/// Poll an execution session for its status.
/// Responses distinguish still-running, completed-with-trace, and
/// failed-with-message; the status never moves backwards.
#[get("/api/workflows/execution/{session_id}")]
async fn execution_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let session_id = path.into_inner();

    let record = match data.sessions.get(&session_id).await {
        Some(record) => record,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "status": "not_found"
            })))
        }
    };

    let body = match record.status {
        SessionStatus::Processing => serde_json::json!({ "status": "processing" }),
        SessionStatus::Completed => serde_json::json!({
            "status": "completed",
            "result": record.result,
        }),
        SessionStatus::Error => {
            let message = record
                .result
                .as_ref()
                .and_then(|r| r.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("workflow execution failed")
                .to_string();
            serde_json::json!({ "status": "error", "message": message })
        }
    };

    Ok(HttpResponse::Ok().json(body))
}

/// Upload a PDF; the body is the raw file content
#[post("/api/files/upload")]
async fn upload_file(
    data: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> ActixResult<impl Responder> {
    let filename = query.into_inner().filename;

    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "only PDF files can be uploaded".to_string(),
        }));
    }
    if body.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "uploaded file is empty".to_string(),
        }));
    }

    let filename = filename.replace(['/', '\\'], "_");
    let path = format!("uploads/{}_{}", chrono::Utc::now().timestamp(), filename);

    if let Err(e) = data.files.write_binary(&path, &body).await {
        error!("Failed to store upload {}: {}", path, e);
        return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
            error: format!("failed to store file: {e}"),
        }));
    }

    info!("Stored upload {} ({} bytes)", path, body.len());

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "File uploaded successfully",
        "filename": filename,
        "path": path,
        "size": body.len(),
    })))
}

/// Register the API routes on an actix app
fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(list_workflows)
        .service(create_workflow)
        .service(execution_status)
        .service(get_workflow)
        .service(update_workflow)
        .service(delete_workflow)
        .service(add_node)
        .service(run_workflow)
        .service(upload_file);
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting docflow server");

    let storage_root =
        std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".to_string());
    let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(storage_root));

    let mut registry = ProcessorRegistry::new();
    docnodes::register_all(
        &mut registry,
        Arc::clone(&files),
        Arc::new(PdfiumExtractor),
        OpenRouterConfig::from_env(),
    );
    let registry = Arc::new(registry);

    let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryWorkflowStore::new());
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let executor = Arc::new(PipelineExecutor::new(
        Arc::clone(&store),
        registry,
        Arc::new(PdfiumRenderer),
    ));
    let coordinator = Arc::new(ExecutionCoordinator::new(executor, Arc::clone(&sessions)));

    info!("Runtime initialized with standard nodes");

    let app_state = web::Data::new(AppState {
        store,
        files,
        sessions,
        coordinator,
    });

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    info!("Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .configure(configure_api)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
