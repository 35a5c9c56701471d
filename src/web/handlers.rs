use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use std::sync::MutexGuard;

use crate::db::Database;
use crate::models::{
    NewPost, Post, PostFilter, PostPatch, PostUpdate, Section, TagWithCount, validate_section_name,
    validate_tag_name, validate_title,
};
use crate::web::AppState;
use crate::web::errors::{AppError, AppResult};

fn lock_db(state: &AppState) -> Result<MutexGuard<'_, Database>, AppError> {
    state
        .db
        .lock()
        .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
}

fn validate_tag_names(names: &[String]) -> Result<(), AppError> {
    for name in names {
        validate_tag_name(name).map_err(AppError::Validation)?;
    }
    Ok(())
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// -- Posts --

pub async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> AppResult<Json<Vec<Post>>> {
    let db = lock_db(&state)?;
    let posts = db.list_posts(&filter)?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Post>> {
    let db = lock_db(&state)?;
    let post = db
        .get_post(id)?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<NewPost>,
) -> AppResult<(StatusCode, Json<Post>)> {
    validate_title(&body.title).map_err(AppError::Validation)?;
    validate_tag_names(&body.tags)?;

    let db = lock_db(&state)?;
    db.get_section(body.section_id)?
        .ok_or_else(|| AppError::NotFound(format!("Section {} not found", body.section_id)))?;

    let post = db.create_post(&body)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post_full(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PostUpdate>,
) -> AppResult<Json<Post>> {
    validate_title(&body.title).map_err(AppError::Validation)?;
    validate_tag_names(&body.tags)?;

    let db = lock_db(&state)?;
    db.get_section(body.section_id)?
        .ok_or_else(|| AppError::NotFound(format!("Section {} not found", body.section_id)))?;

    let post = db
        .update_post_full(id, &body)?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;
    Ok(Json(post))
}

pub async fn update_post_partial(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PostPatch>,
) -> AppResult<Json<Post>> {
    if let Some(title) = body.title.as_deref() {
        validate_title(title).map_err(AppError::Validation)?;
    }
    if let Some(tags) = body.tags.as_deref() {
        validate_tag_names(tags)?;
    }

    let db = lock_db(&state)?;
    if let Some(section_id) = body.section_id {
        db.get_section(section_id)?
            .ok_or_else(|| AppError::NotFound(format!("Section {section_id} not found")))?;
    }

    let post = db
        .update_post_partial(id, &body)?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let db = lock_db(&state)?;
    if !db.delete_post(id)? {
        return Err(AppError::NotFound(format!("Post {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

// -- Tags --

pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<Vec<TagWithCount>>> {
    let db = lock_db(&state)?;
    let tags = db.list_tags_with_post_count()?;
    Ok(Json(tags))
}

// -- Sections --

#[derive(serde::Deserialize)]
pub struct SectionBody {
    pub name: String,
}

pub async fn list_sections(State(state): State<AppState>) -> AppResult<Json<Vec<Section>>> {
    let db = lock_db(&state)?;
    let sections = db.list_sections()?;
    Ok(Json(sections))
}

pub async fn get_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Section>> {
    let db = lock_db(&state)?;
    let section = db
        .get_section(id)?
        .ok_or_else(|| AppError::NotFound(format!("Section {id} not found")))?;
    Ok(Json(section))
}

pub async fn create_section(
    State(state): State<AppState>,
    Json(body): Json<SectionBody>,
) -> AppResult<(StatusCode, Json<Section>)> {
    validate_section_name(&body.name).map_err(AppError::Validation)?;

    let db = lock_db(&state)?;
    if db.get_section_by_name(&body.name)?.is_some() {
        return Err(AppError::Conflict(format!(
            "section already exists: {}",
            body.name
        )));
    }

    let section = db.insert_section(&body.name)?;
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SectionBody>,
) -> AppResult<Json<Section>> {
    validate_section_name(&body.name).map_err(AppError::Validation)?;

    let db = lock_db(&state)?;
    if let Some(existing) = db.get_section_by_name(&body.name)? {
        if existing.id != id {
            return Err(AppError::Conflict(format!(
                "section already exists: {}",
                body.name
            )));
        }
    }

    let section = db
        .update_section(id, &body.name)?
        .ok_or_else(|| AppError::NotFound(format!("Section {id} not found")))?;
    Ok(Json(section))
}

pub async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let db = lock_db(&state)?;
    db.get_section(id)?
        .ok_or_else(|| AppError::NotFound(format!("Section {id} not found")))?;

    let in_use = db.section_post_count(id)?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "section {id} still has {in_use} posts"
        )));
    }

    db.delete_section(id)?;
    Ok(StatusCode::NO_CONTENT)
}
