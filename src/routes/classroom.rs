use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, TeacherUser};
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::classroom::{
    ClassroomContent, ClassroomSubunit, ClassroomUnit,
};
use crate::validation::{validate_short_field, validate_text, validate_title};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/unit", get(list_units).post(create_unit))
        .route("/unit/:unit_id", get(get_unit))
        .route(
            "/unit/:unit_id/subunit",
            get(list_subunits).post(create_subunit),
        )
        .route("/subunit/:subunit_id", get(get_subunit))
        .route(
            "/subunit/:subunit_id/content",
            get(list_contents).post(create_content),
        )
        .route("/content/:content_id", get(get_content))
}

#[derive(Debug, Serialize)]
struct UnitList {
    units: Vec<ClassroomUnit>,
}

#[derive(Debug, Serialize)]
struct SubunitList {
    subunits: Vec<ClassroomSubunit>,
}

#[derive(Debug, Serialize)]
struct ContentList {
    contents: Vec<ClassroomContent>,
}

#[derive(Debug, Serialize)]
struct UnitDetail {
    #[serde(flatten)]
    unit: ClassroomUnit,
    subunits: Vec<ClassroomSubunit>,
}

#[derive(Debug, Serialize)]
struct SubunitDetail {
    #[serde(flatten)]
    subunit: ClassroomSubunit,
    contents: Vec<ClassroomContent>,
}

#[derive(Debug, Deserialize)]
struct CreateUnitRequest {
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct CreateSubunitRequest {
    code: String,
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct CreateContentRequest {
    #[serde(rename = "type")]
    content_type: String,
    label: String,
    #[serde(default)]
    body: String,
}

fn invalid(msg: &str) -> AppError {
    AppError::bad_request("CLASSROOM_INVALID_INPUT", msg)
}

async fn list_units(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let units = match state
        .store()
        .get_classroom_by_name(&state.config().demo_classroom)?
    {
        Some(classroom) => state.store().list_units(&classroom.id)?,
        None => Vec::new(),
    };
    Ok(ok(UnitList { units }))
}

async fn create_unit(
    TeacherUser(auth): TeacherUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateUnitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = req.title.trim();
    validate_title(title).map_err(invalid)?;
    validate_text(&req.description).map_err(invalid)?;

    let classroom = state
        .store()
        .ensure_classroom(&state.config().demo_classroom)?;
    let unit = state
        .store()
        .create_unit(&classroom.id, title, &req.description)?;

    tracing::info!(unit_id = %unit.id, teacher_id = %auth.user_id, "Unit created");
    Ok(created(unit))
}

async fn get_unit(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let unit = state
        .store()
        .get_unit(&unit_id)?
        .ok_or_else(|| AppError::not_found("Unit not found"))?;
    let subunits = state.store().list_subunits(&unit.id)?;
    Ok(ok(UnitDetail { unit, subunits }))
}

async fn list_subunits(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subunits = state.store().list_subunits(&unit_id)?;
    Ok(ok(SubunitList { subunits }))
}

async fn create_subunit(
    TeacherUser(auth): TeacherUser,
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
    JsonBody(req): JsonBody<CreateSubunitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let code = req.code.trim();
    let title = req.title.trim();
    validate_short_field(code, "code").map_err(|msg| invalid(&msg))?;
    validate_title(title).map_err(invalid)?;
    validate_text(&req.description).map_err(invalid)?;

    let subunit = state
        .store()
        .create_subunit(&unit_id, code, title, &req.description)?;

    tracing::info!(subunit_id = %subunit.id, unit_id = %unit_id, teacher_id = %auth.user_id, "Subunit created");
    Ok(created(subunit))
}

async fn get_subunit(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(subunit_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subunit = state
        .store()
        .get_subunit(&subunit_id)?
        .ok_or_else(|| AppError::not_found("Subunit not found"))?;
    let contents = state.store().list_contents(&subunit.id)?;
    Ok(ok(SubunitDetail { subunit, contents }))
}

async fn list_contents(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(subunit_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let contents = state.store().list_contents(&subunit_id)?;
    Ok(ok(ContentList { contents }))
}

async fn create_content(
    TeacherUser(auth): TeacherUser,
    State(state): State<AppState>,
    Path(subunit_id): Path<String>,
    JsonBody(req): JsonBody<CreateContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let content_type = req.content_type.trim();
    let label = req.label.trim();
    validate_short_field(content_type, "type").map_err(|msg| invalid(&msg))?;
    validate_short_field(label, "label").map_err(|msg| invalid(&msg))?;
    validate_text(&req.body).map_err(invalid)?;

    let content = state
        .store()
        .create_content(&subunit_id, content_type, label, &req.body)?;

    tracing::info!(content_id = %content.id, subunit_id = %subunit_id, teacher_id = %auth.user_id, "Content created");
    Ok(created(content))
}

async fn get_content(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let content = state
        .store()
        .get_content(&content_id)?
        .ok_or_else(|| AppError::not_found("Content not found"))?;
    Ok(ok(content))
}
