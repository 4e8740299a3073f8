//! API routes for levelupd
//!
//! Handlers resolve an explicit session, validate before touching the
//! store, and answer every failure once: validation 400, bad token 401,
//! missing role 403, missing profile 404 `onboarding_required`, store
//! failure 500. No retries anywhere; the user re-triggers the action.

use crate::events::ChangedTable;
use crate::server::AppState;
use crate::session::{self, Session};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use levelup_common::api::{
    AdminUserRow, ApiError, CompletionToggleRequest, CompletionToggleResponse,
    CreateHabitRequest, OnboardingRequest, ProfileView, SignupRequest, SignupResponse, SkillView,
    SkillsResponse, WhoamiResponse,
};
use levelup_common::error::LevelUpError;
use levelup_common::progression::{
    attribute_level, attribute_progress_fraction, rank_for_level, required_attribute_xp,
};
use levelup_common::types::{Attribute, CompletionRecord, Habit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

type AppStateArc = Arc<AppState>;
type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Map the error taxonomy onto status codes.
fn reject(e: LevelUpError) -> (StatusCode, Json<ApiError>) {
    let status = match &e {
        LevelUpError::Validation(_) => StatusCode::BAD_REQUEST,
        LevelUpError::Unauthorized => StatusCode::UNAUTHORIZED,
        LevelUpError::Forbidden(_) => StatusCode::FORBIDDEN,
        LevelUpError::OnboardingRequired | LevelUpError::NotFound(_) => StatusCode::NOT_FOUND,
        LevelUpError::Conflict(_) => StatusCode::CONFLICT,
        LevelUpError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Store failure: {}", e);
    }
    (status, Json(ApiError::new(e.code(), e.to_string())))
}

/// Resolve the bearer token to a session.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Session, LevelUpError> {
    let token = session::bearer_token(headers)?;
    let digest = session::token_digest(token);
    let store = state.store.lock().await;
    let (user_id, role, email) = store
        .user_by_token_digest(&digest)?
        .ok_or(LevelUpError::Unauthorized)?;
    Ok(Session {
        user_id,
        role,
        email,
    })
}

fn validate_habit_name(name: &str) -> Result<(), LevelUpError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LevelUpError::Validation("habit name is required".into()));
    }
    if trimmed.len() > 100 {
        return Err(LevelUpError::Validation(
            "habit name is limited to 100 characters".into(),
        ));
    }
    Ok(())
}

// ============================================================================
// Auth Routes
// ============================================================================

pub fn auth_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/auth/signup", post(signup))
        .route("/v1/auth/whoami", get(whoami))
}

async fn signup(
    State(state): State<AppStateArc>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<SignupResponse> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(reject(LevelUpError::Validation(
            "a valid email is required".into(),
        )));
    }

    let token = session::generate_token();
    let digest = session::token_digest(&token);
    let mut store = state.store.lock().await;
    let user_id = store.create_user(&email, &digest).map_err(reject)?;
    info!("Signup: {}", email);
    Ok(Json(SignupResponse { user_id, token }))
}

async fn whoami(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<WhoamiResponse> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    let store = state.store.lock().await;
    let has_profile = store.has_profile(session.user_id).map_err(reject)?;
    Ok(Json(WhoamiResponse {
        user_id: session.user_id,
        email: session.email,
        role: session.role,
        has_profile,
    }))
}

// ============================================================================
// Onboarding Routes
// ============================================================================

pub fn onboarding_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/onboarding", post(onboard))
}

async fn onboard(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<OnboardingRequest>,
) -> ApiResult<ProfileView> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;

    if req.full_name.trim().is_empty() {
        return Err(reject(LevelUpError::Validation(
            "full name is required".into(),
        )));
    }
    for habit in &req.habits {
        validate_habit_name(&habit.name).map_err(reject)?;
    }

    let mut store = state.store.lock().await;
    let profile = store
        .onboard(
            session.user_id,
            &session.email,
            req.full_name.trim(),
            &req.habits,
        )
        .map_err(reject)?;
    drop(store);

    state.feed.publish(session.user_id, ChangedTable::Profiles);
    state.feed.publish(session.user_id, ChangedTable::Habits);
    Ok(Json(ProfileView::from_profile(&profile)))
}

// ============================================================================
// Profile Routes
// ============================================================================

pub fn profile_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/profile", get(get_profile))
}

async fn get_profile(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<ProfileView> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    let store = state.store.lock().await;
    let profile = store.profile(session.user_id).map_err(reject)?;
    Ok(Json(ProfileView::from_profile(&profile)))
}

// ============================================================================
// Habit Routes
// ============================================================================

pub fn habit_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/habits", get(list_habits).post(create_habit))
        .route("/v1/habits/:habit_id/deactivate", post(deactivate_habit))
}

async fn list_habits(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<Vec<Habit>> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    let store = state.store.lock().await;
    let habits = store.habits(session.user_id).map_err(reject)?;
    Ok(Json(habits))
}

async fn create_habit(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<CreateHabitRequest>,
) -> ApiResult<Habit> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    validate_habit_name(&req.name).map_err(reject)?;

    let mut store = state.store.lock().await;
    let habit = store
        .create_habit(
            session.user_id,
            req.name.trim(),
            req.attribute,
            req.difficulty,
        )
        .map_err(reject)?;
    drop(store);

    state.feed.publish(session.user_id, ChangedTable::Habits);
    Ok(Json(habit))
}

async fn deactivate_habit(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Path(habit_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    let mut store = state.store.lock().await;
    store
        .deactivate_habit(session.user_id, habit_id)
        .map_err(reject)?;
    drop(store);

    state.feed.publish(session.user_id, ChangedTable::Habits);
    Ok(Json(serde_json::json!({ "deactivated": habit_id })))
}

// ============================================================================
// Completion Routes
// ============================================================================

pub fn completion_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/completions/today", get(today_completions))
        .route("/v1/completions/toggle", post(toggle_completion))
}

async fn today_completions(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<Vec<CompletionRecord>> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    let today = Local::now().date_naive();
    let store = state.store.lock().await;
    let records = store
        .completions_on(session.user_id, today)
        .map_err(reject)?;
    Ok(Json(records))
}

async fn toggle_completion(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<CompletionToggleRequest>,
) -> ApiResult<CompletionToggleResponse> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    let date = req.date.unwrap_or_else(|| Local::now().date_naive());

    // Apply, then answer with the profile re-read after the committed
    // write. Nothing is reported before the store confirms.
    let mut store = state.store.lock().await;
    let outcome = store
        .toggle_completion(session.user_id, req.habit_id, date)
        .map_err(reject)?;
    let profile = store.profile(session.user_id).map_err(reject)?;
    drop(store);

    state
        .feed
        .publish(session.user_id, ChangedTable::Completions);
    state.feed.publish(session.user_id, ChangedTable::Profiles);

    Ok(Json(CompletionToggleResponse {
        completed: outcome.completed,
        xp_delta: outcome.xp_delta,
        profile: ProfileView::from_profile(&profile),
    }))
}

// ============================================================================
// Skills Routes
// ============================================================================

pub fn skills_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/skills", get(get_skills))
}

async fn get_skills(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<SkillsResponse> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    let store = state.store.lock().await;
    let profile = store.profile(session.user_id).map_err(reject)?;
    let totals = store.attribute_xp(session.user_id).map_err(reject)?;
    let counts = store
        .attribute_habit_counts(session.user_id)
        .map_err(reject)?;
    drop(store);

    let skills = Attribute::ALL
        .iter()
        .map(|&attribute| {
            let xp = totals.get(&attribute).copied().unwrap_or(0);
            let level = attribute_level(xp);
            SkillView {
                attribute,
                xp,
                level,
                next_level_xp: required_attribute_xp(level),
                progress_fraction: attribute_progress_fraction(xp),
                habit_count: counts.get(&attribute).copied().unwrap_or(0),
            }
        })
        .collect();

    Ok(Json(SkillsResponse {
        total_xp: profile.current_xp,
        overall_level: profile.current_level,
        rank: rank_for_level(profile.current_level).label().to_string(),
        skills,
    }))
}

// ============================================================================
// Admin Routes
// ============================================================================

pub fn admin_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/admin/users", get(admin_users))
        .route("/v1/admin/users/:user_id/delete", post(admin_delete))
        .route("/v1/admin/users/:user_id/reset", post(admin_reset))
}

async fn admin_users(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<Vec<AdminUserRow>> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    session.require_admin().map_err(reject)?;
    let store = state.store.lock().await;
    let users = store.admin_list_users().map_err(reject)?;
    Ok(Json(users))
}

async fn admin_delete(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    session.require_admin().map_err(reject)?;
    let mut store = state.store.lock().await;
    store.admin_delete_user(user_id).map_err(reject)?;
    drop(store);

    state.feed.publish(user_id, ChangedTable::Profiles);
    info!("Admin {} deleted user {}", session.user_id, user_id);
    Ok(Json(serde_json::json!({ "deleted": user_id })))
}

async fn admin_reset(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let session = authenticate(&state, &headers).await.map_err(reject)?;
    session.require_admin().map_err(reject)?;
    let mut store = state.store.lock().await;
    store.admin_reset_progress(user_id).map_err(reject)?;
    drop(store);

    state.feed.publish(user_id, ChangedTable::Profiles);
    state.feed.publish(user_id, ChangedTable::Completions);
    info!("Admin {} reset progress for {}", session.user_id, user_id);
    Ok(Json(serde_json::json!({ "reset": user_id })))
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
