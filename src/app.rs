use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/habits", get(handlers::list_habits).post(handlers::create_habit))
        .route(
            "/api/habits/:id",
            put(handlers::update_habit).delete(handlers::delete_habit),
        )
        .route("/api/habits/:id/stats", get(handlers::get_habit_stats))
        .route("/api/habits/:id/streak", get(handlers::get_habit_streak))
        .route("/api/completions", get(handlers::month_completions))
        .route("/api/completions/toggle", post(handlers::toggle_completion))
        .route("/api/moods", get(handlers::get_moods).put(handlers::set_mood))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/achievements", get(handlers::get_achievements))
        .route("/api/grid", get(handlers::get_grid))
        .route("/api/export", get(handlers::export))
        .route("/api/import", post(handlers::import))
        .with_state(state)
}
