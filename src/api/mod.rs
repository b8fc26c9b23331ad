use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::*;
use crate::services::{
    AutoAssignmentReport, AutoAssignmentService, AvailabilityService, CatalogService, Diagnostic,
    GenerationRequest, GenerationSummary, ScheduleGenerationService, ScheduleService,
};
use crate::state::AppState;

#[derive(Deserialize)]
struct HistoryQueryParams {
    #[serde(default = "default_history_limit")]
    limit: i64,
}

fn default_history_limit() -> i64 {
    50
}

#[derive(Serialize)]
struct DeletedResponse {
    deleted: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/teachers", get(list_teachers).post(create_teacher))
        .route("/teachers/{id}/availability", get(list_availability).put(upsert_availability))
        .route("/teachers/{id}/availability/default", post(default_availability))
        .route("/subjects", get(list_subjects).post(create_subject))
        .route("/courses", get(list_courses).post(create_course))
        .route("/assignments", post(create_assignment))
        .route("/assignments/auto", post(auto_assign))
        .route("/schedules", get(list_schedules).delete(clear_schedules))
        .route("/schedules/{id}", delete(delete_schedule))
        .route("/schedules/day/{day}", delete(delete_schedules_by_day))
        .route("/schedules/generate", post(generate))
        .route("/schedules/generate/auto", post(auto_generate))
        .route("/schedules/generate/course/{id}", post(generate_for_course))
        .route("/schedules/regenerate", post(regenerate))
        .route("/schedules/diagnostic", get(diagnostic))
        .route("/history", get(list_history))
        .with_state(state)
}

fn generation_service(state: &AppState) -> ScheduleGenerationService {
    ScheduleGenerationService::new(state.stores.clone(), state.run_lock.clone())
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_teachers(State(state): State<AppState>) -> Result<Json<Vec<Teacher>>, AppError> {
    let teachers = CatalogService::new(state.stores.clone()).list_teachers().await?;
    Ok(Json(teachers))
}

async fn create_teacher(
    State(state): State<AppState>,
    Json(req): Json<NewTeacherRequest>,
) -> Result<(StatusCode, Json<Teacher>), AppError> {
    let teacher = CatalogService::new(state.stores.clone()).create_teacher(req).await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

async fn list_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Availability>>, AppError> {
    let service = AvailabilityService::new(state.stores.teachers.clone(), state.stores.availabilities.clone());
    Ok(Json(service.list(&id).await?))
}

async fn upsert_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<Availability>, AppError> {
    let service = AvailabilityService::new(state.stores.teachers.clone(), state.stores.availabilities.clone());
    Ok(Json(service.upsert(&id, req).await?))
}

async fn default_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Availability>>, AppError> {
    let service = AvailabilityService::new(state.stores.teachers.clone(), state.stores.availabilities.clone());
    Ok(Json(service.ensure_default(&id).await?))
}

async fn list_subjects(State(state): State<AppState>) -> Result<Json<Vec<Subject>>, AppError> {
    let subjects = CatalogService::new(state.stores.clone()).list_subjects().await?;
    Ok(Json(subjects))
}

async fn create_subject(
    State(state): State<AppState>,
    Json(req): Json<NewSubjectRequest>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let subject = CatalogService::new(state.stores.clone()).create_subject(req).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CatalogService::new(state.stores.clone()).list_courses().await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CatalogService::new(state.stores.clone()).create_course(req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn create_assignment(
    State(state): State<AppState>,
    Json(req): Json<NewAssignmentRequest>,
) -> Result<Json<TeacherSubject>, AppError> {
    let link = CatalogService::new(state.stores.clone()).assign(req).await?;
    Ok(Json(link))
}

async fn auto_assign(State(state): State<AppState>) -> Result<Json<AutoAssignmentReport>, AppError> {
    let report = AutoAssignmentService::new(state.stores.clone())
        .assign_unassigned_courses()
        .await?;
    Ok(Json(report))
}

async fn list_schedules(State(state): State<AppState>) -> Result<Json<Vec<Schedule>>, AppError> {
    let schedules = ScheduleService::new(state.stores.schedules.clone()).list().await?;
    Ok(Json(schedules))
}

async fn clear_schedules(State(state): State<AppState>) -> Result<Json<DeletedResponse>, AppError> {
    let deleted = generation_service(&state).clear_all().await?;
    Ok(Json(DeletedResponse { deleted }))
}

async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    ScheduleService::new(state.stores.schedules.clone()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_schedules_by_day(
    State(state): State<AppState>,
    Path(day): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    let day = day
        .parse::<DayOfWeek>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let deleted = ScheduleService::new(state.stores.schedules.clone())
        .delete_by_day(day)
        .await?;
    Ok(Json(DeletedResponse { deleted }))
}

async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerationRequest>,
) -> Result<Json<GenerationSummary>, AppError> {
    Ok(Json(generation_service(&state).generate(req).await?))
}

async fn auto_generate(State(state): State<AppState>) -> Result<Json<GenerationSummary>, AppError> {
    Ok(Json(generation_service(&state).auto_generate().await?))
}

async fn generate_for_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<GenerationRequest>,
) -> Result<Json<GenerationSummary>, AppError> {
    Ok(Json(generation_service(&state).generate_for_course(&id, req).await?))
}

async fn regenerate(State(state): State<AppState>) -> Result<Json<GenerationSummary>, AppError> {
    Ok(Json(generation_service(&state).regenerate().await?))
}

async fn diagnostic(State(state): State<AppState>) -> Result<Json<Diagnostic>, AppError> {
    Ok(Json(generation_service(&state).diagnostic().await?))
}

async fn list_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<Vec<GenerationHistory>>, AppError> {
    let history = state.stores.history.find_recent(params.limit.clamp(1, 500)).await?;
    Ok(Json(history))
}
