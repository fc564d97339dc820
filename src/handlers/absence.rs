use actix_web::{
    HttpResponse,
    web::{Data, Json, Path},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::models::{ApprovalAction, ApprovalStage, CreateAbsenceRequestInput},
    error::AppError,
    handlers::shared::ApiResponse,
    services::WorkflowEngine,
};

/// Body of an approve or decline call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInput {
    pub approver_id: Uuid,
    pub stage: ApprovalStage,
    pub comments: Option<String>,
}

pub async fn create_request(
    engine: Data<WorkflowEngine>,
    input: Json<CreateAbsenceRequestInput>,
) -> Result<HttpResponse, AppError> {
    let request = engine.create(input.into_inner()).await?;

    Ok(ApiResponse::created(request))
}

pub async fn get_request(
    engine: Data<WorkflowEngine>,
    path: Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let request = engine.get(path.into_inner()).await?;

    Ok(ApiResponse::ok(request))
}

pub async fn get_request_history(
    engine: Data<WorkflowEngine>,
    path: Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let timeline = engine.timeline(path.into_inner()).await?;

    Ok(ApiResponse::ok(timeline))
}

pub async fn approve_request(
    engine: Data<WorkflowEngine>,
    path: Path<Uuid>,
    input: Json<DecisionInput>,
) -> Result<HttpResponse, AppError> {
    decide(engine, path.into_inner(), input.into_inner(), ApprovalAction::Approved).await
}

pub async fn decline_request(
    engine: Data<WorkflowEngine>,
    path: Path<Uuid>,
    input: Json<DecisionInput>,
) -> Result<HttpResponse, AppError> {
    decide(engine, path.into_inner(), input.into_inner(), ApprovalAction::Declined).await
}

async fn decide(
    engine: Data<WorkflowEngine>,
    request_id: Uuid,
    input: DecisionInput,
    action: ApprovalAction,
) -> Result<HttpResponse, AppError> {
    let request = engine
        .approve(
            request_id,
            input.approver_id,
            input.stage,
            action,
            input.comments,
        )
        .await?;

    Ok(ApiResponse::ok(request))
}

pub async fn archive_request(
    engine: Data<WorkflowEngine>,
    path: Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let request = engine.archive(path.into_inner()).await?;

    Ok(ApiResponse::ok(request))
}

pub async fn delete_request(
    engine: Data<WorkflowEngine>,
    path: Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    engine.delete(path.into_inner()).await?;

    Ok(ApiResponse::<()>::message("Absence request deleted"))
}
