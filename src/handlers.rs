use crate::calculations::{self, filter_by_month, habit_stats_at, streak_at};
use crate::date_grid::{day_label, format_date, is_today, parse_month, today, weeks_in_month};
use crate::errors::AppError;
use crate::models::{
    CreateHabitRequest, GOAL_PER_WEEK_RANGE, GoalAchievement, GridDay, Habit, HabitCompletion, HabitStats,
    MOOD_RANGE, MonthQuery, MoodEntry, MoodPoint, MoodRequest, ProgressPoint, StreakResponse, SummaryResponse,
    ToggleRequest, UpdateHabitRequest,
};
use crate::state::AppState;
use crate::storage::{export_data, import_data};
use crate::store::SnapshotStore;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

pub async fn list_habits(State(state): State<AppState>) -> Json<Vec<Habit>> {
    let data = state.data.lock().await;
    Json(data.habits.clone())
}

pub async fn create_habit(
    State(state): State<AppState>,
    Json(payload): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let name = validate_name(&payload.name)?;
    let goal = validate_goal(payload.goal_per_week.unwrap_or(*GOAL_PER_WEEK_RANGE.end()))?;
    let mut habit = Habit::new(name, payload.color.trim(), goal, payload.created_at.unwrap_or_else(today));
    habit.icon = payload.icon.filter(|icon| !icon.trim().is_empty());

    let mut data = state.data.lock().await;
    data.add_habit(habit.clone());
    state.store.save(&state.workspace, &data).await?;

    info!(habit_id = %habit.id, name = %habit.name, "habit created");
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateHabitRequest>,
) -> Result<Json<Habit>, AppError> {
    let mut data = state.data.lock().await;
    let mut habit = data.habit(&id).cloned().ok_or_else(|| unknown_habit(&id))?;
    if let Some(name) = payload.name.as_deref() {
        habit.name = validate_name(name)?;
    }
    if let Some(color) = payload.color {
        habit.color = color.trim().to_string();
    }
    if let Some(icon) = payload.icon {
        habit.icon = Some(icon).filter(|icon| !icon.trim().is_empty());
    }
    if let Some(goal) = payload.goal_per_week {
        habit.goal_per_week = validate_goal(goal)?;
    }

    data.update_habit(habit.clone());
    state.store.save(&state.workspace, &data).await?;
    Ok(Json(habit))
}

pub async fn delete_habit(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    if !data.delete_habit(&id) {
        return Err(unknown_habit(&id));
    }
    state.store.save(&state.workspace, &data).await?;

    info!(habit_id = %id, "habit deleted with its completions");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_habit_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<HabitStats>, AppError> {
    let month = resolve_month(&query)?;
    let data = state.data.lock().await;
    let habit = data.habit(&id).ok_or_else(|| unknown_habit(&id))?;
    Ok(Json(habit_stats_at(
        today(),
        habit,
        &data.completions,
        month,
        state.streak_horizon_weeks,
    )))
}

pub async fn get_habit_streak(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StreakResponse>, AppError> {
    let data = state.data.lock().await;
    let habit = data.habit(&id).ok_or_else(|| unknown_habit(&id))?;
    let streak = streak_at(
        today(),
        &habit.id,
        &data.completions,
        habit.goal_per_week,
        state.streak_horizon_weeks,
    );
    Ok(Json(StreakResponse {
        habit_id: habit.id.clone(),
        goal_per_week: habit.goal_per_week,
        streak,
    }))
}

pub async fn toggle_completion(
    State(state): State<AppState>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<HabitCompletion>, AppError> {
    let mut data = state.data.lock().await;
    if data.habit(&payload.habit_id).is_none() {
        return Err(unknown_habit(&payload.habit_id));
    }
    let completion = data.toggle_completion(&payload.habit_id, payload.date);
    state.store.save(&state.workspace, &data).await?;
    Ok(Json(completion))
}

pub async fn month_completions(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<HabitCompletion>>, AppError> {
    let month = resolve_month(&query)?;
    let data = state.data.lock().await;
    Ok(Json(filter_by_month(&data.completions, month)))
}

pub async fn set_mood(
    State(state): State<AppState>,
    Json(payload): Json<MoodRequest>,
) -> Result<Json<MoodEntry>, AppError> {
    if !MOOD_RANGE.contains(&payload.mood) {
        return Err(AppError::bad_request("mood must be between 0 and 100"));
    }
    let mut data = state.data.lock().await;
    let entry = data.set_mood(payload.date, payload.mood);
    state.store.save(&state.workspace, &data).await?;
    Ok(Json(entry))
}

pub async fn get_moods(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<MoodPoint>>, AppError> {
    let month = resolve_month(&query)?;
    let data = state.data.lock().await;
    Ok(Json(calculations::mood_series(&data.moods, month)))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    let month = resolve_month(&query)?;
    let data = state.data.lock().await;
    Ok(Json(calculations::month_summary(&data, month)))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<ProgressPoint>>, AppError> {
    let month = resolve_month(&query)?;
    let data = state.data.lock().await;
    Ok(Json(calculations::daily_progress_series(
        &data.habits,
        &data.completions,
        month,
    )))
}

pub async fn get_achievements(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<GoalAchievement>>, AppError> {
    let month = resolve_month(&query)?;
    let data = state.data.lock().await;
    Ok(Json(calculations::goal_achievements(&data.habits, &data.completions, month)))
}

pub async fn get_grid(Query(query): Query<MonthQuery>) -> Result<Json<Vec<Vec<GridDay>>>, AppError> {
    let month = resolve_month(&query)?;
    Ok(Json(month_grid(month)))
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.data.lock().await;
    let body = export_data(&data)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

pub async fn import(State(state): State<AppState>, body: String) -> Result<StatusCode, AppError> {
    let imported = match import_data(&body) {
        Ok(imported) => imported,
        Err(err) => {
            warn!("rejected import: {err}");
            return Err(AppError::bad_request("invalid data file"));
        }
    };

    let mut data = state.data.lock().await;
    state.store.save(&state.workspace, &imported).await?;
    info!(
        habits = imported.habits.len(),
        completions = imported.completions.len(),
        moods = imported.moods.len(),
        "snapshot imported"
    );
    *data = imported;
    Ok(StatusCode::NO_CONTENT)
}

fn month_grid(month: NaiveDate) -> Vec<Vec<GridDay>> {
    weeks_in_month(month)
        .iter()
        .map(|week| {
            week.iter()
                .map(|day| GridDay {
                    date: format_date(*day),
                    label: day_label(*day),
                    in_month: day.year() == month.year() && day.month() == month.month(),
                    is_today: is_today(*day),
                })
                .collect()
        })
        .collect()
}

fn resolve_month(query: &MonthQuery) -> Result<NaiveDate, AppError> {
    match query.month.as_deref() {
        None => Ok(today()),
        Some(raw) => parse_month(raw).ok_or_else(|| AppError::bad_request("month must be YYYY-MM or YYYY-MM-DD")),
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    Ok(name.to_string())
}

fn validate_goal(goal: u32) -> Result<u32, AppError> {
    if GOAL_PER_WEEK_RANGE.contains(&goal) {
        Ok(goal)
    } else {
        Err(AppError::bad_request("goalPerWeek must be between 1 and 7"))
    }
}

fn unknown_habit(id: &str) -> AppError {
    AppError::not_found(format!("no habit with id `{id}`"))
}
