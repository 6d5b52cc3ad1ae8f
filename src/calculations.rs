use crate::date_grid::{
    DAYS_PER_WEEK, days_between, days_in_month, format_date, month_end, month_start, today, week_start, weeks_in_month,
};
use crate::models::{
    AppData, GoalAchievement, Habit, HabitCompletion, HabitStats, MoodEntry, MoodPoint, NEUTRAL_MOOD, ProgressPoint,
    SummaryResponse,
};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Upper bound on how many weeks a streak scan walks back.
pub const STREAK_HORIZON_WEEKS: u32 = 104;

pub fn filter_by_month(completions: &[HabitCompletion], month: NaiveDate) -> Vec<HabitCompletion> {
    let (first, last) = (month_start(month), month_end(month));
    completions
        .iter()
        .filter(|completion| completion.date >= first && completion.date <= last)
        .cloned()
        .collect()
}

pub fn count_completed(completions: &[HabitCompletion]) -> usize {
    completions.iter().filter(|completion| completion.completed).count()
}

pub fn progress_percentage(habits: &[Habit], completions: &[HabitCompletion], month: NaiveDate) -> f64 {
    progress_percentage_at(today(), habits, completions, month)
}

/// Share of the prorated weekly goals met between each habit's start and the
/// end of the evaluated window. Completions beyond a habit's goal are capped.
pub fn progress_percentage_at(
    today: NaiveDate,
    habits: &[Habit],
    completions: &[HabitCompletion],
    month: NaiveDate,
) -> f64 {
    if habits.is_empty() {
        return 0.0;
    }
    let Some((start, end)) = active_window(today, habits, completions, month) else {
        return 0.0;
    };

    let mut total_goal = 0u64;
    let mut total_completed = 0u64;
    for habit in habits {
        let habit_start = habit.created_at.max(start);
        if habit_start > end {
            continue;
        }
        let days = (end - habit_start).num_days() + 1;
        let goal = prorated_goal(days, habit.goal_per_week);
        let done = completed_dates(&habit.id, completions)
            .range(habit_start..=end)
            .count() as u64;

        total_goal += goal;
        total_completed += done.min(goal);
    }

    if total_goal == 0 {
        return 0.0;
    }
    round_percent(total_completed as f64 / total_goal as f64 * 100.0)
}

/// Weekly goal scaled to `days`: whole weeks count fully, the remaining days
/// contribute their share of one week rounded up.
pub fn prorated_goal(days: i64, goal_per_week: u32) -> u64 {
    if days <= 0 {
        return 0;
    }
    let goal = u64::from(goal_per_week);
    let full_weeks = (days / DAYS_PER_WEEK) as u64;
    let remainder = (days % DAYS_PER_WEEK) as u64;
    full_weeks * goal + (remainder * goal).div_ceil(DAYS_PER_WEEK as u64)
}

pub fn daily_progress_series(habits: &[Habit], completions: &[HabitCompletion], month: NaiveDate) -> Vec<ProgressPoint> {
    daily_progress_series_at(today(), habits, completions, month)
}

pub fn daily_progress_series_at(
    today: NaiveDate,
    habits: &[Habit],
    completions: &[HabitCompletion],
    month: NaiveDate,
) -> Vec<ProgressPoint> {
    let Some((start, end)) = active_window(today, habits, completions, month) else {
        return Vec::new();
    };

    let mut completed_by_day: HashMap<NaiveDate, HashSet<&str>> = HashMap::new();
    for completion in completions.iter().filter(|c| c.completed && c.date >= start && c.date <= end) {
        completed_by_day
            .entry(completion.date)
            .or_default()
            .insert(completion.habit_id.as_str());
    }

    days_between(start, end)
        .into_iter()
        .map(|day| {
            let existing = habits.iter().filter(|habit| habit.created_at <= day).count();
            let done = completed_by_day.get(&day).map_or(0, HashSet::len);
            let progress = if existing > 0 {
                (done as f64 / existing as f64) * 100.0
            } else {
                0.0
            };
            ProgressPoint {
                date: format_date(day),
                progress,
            }
        })
        .collect()
}

pub fn streak(habit_id: &str, completions: &[HabitCompletion], goal_per_week: u32) -> u32 {
    streak_at(today(), habit_id, completions, goal_per_week, STREAK_HORIZON_WEEKS)
}

/// Consecutive Monday-start weeks meeting `goal_per_week`, counted backwards
/// from the current week. An unfinished current week falls back to last week
/// as the anchor. At most `horizon_weeks` weeks are counted.
pub fn streak_at(
    today: NaiveDate,
    habit_id: &str,
    completions: &[HabitCompletion],
    goal_per_week: u32,
    horizon_weeks: u32,
) -> u32 {
    let mut weeks: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for date in completed_dates(habit_id, completions) {
        *weeks.entry(week_start(date)).or_default() += 1;
    }
    if weeks.is_empty() {
        return 0;
    }

    let met = |week: NaiveDate| weeks.get(&week).copied().unwrap_or(0) >= goal_per_week;
    let current = week_start(today);
    let previous = current - Duration::weeks(1);
    let anchor = if met(current) {
        current
    } else if met(previous) {
        previous
    } else {
        return 0;
    };
    debug!(habit_id, anchor = %anchor, "streak anchored");

    let mut streak = 1;
    while streak < horizon_weeks {
        if !met(anchor - Duration::weeks(i64::from(streak))) {
            break;
        }
        streak += 1;
    }
    streak
}

pub fn habit_stats(habit: &Habit, completions: &[HabitCompletion], month: NaiveDate) -> HabitStats {
    habit_stats_at(today(), habit, completions, month, STREAK_HORIZON_WEEKS)
}

/// Per-habit view. The completion rate divides by every displayed week of the
/// month and ignores the creation date, unlike `progress_percentage_at`.
pub fn habit_stats_at(
    today: NaiveDate,
    habit: &Habit,
    completions: &[HabitCompletion],
    month: NaiveDate,
    horizon_weeks: u32,
) -> HabitStats {
    let all_dates = completed_dates(&habit.id, completions);
    let total_completions = all_dates.range(month_start(month)..=month_end(month)).count();

    let total_goal = weeks_in_month(month).len() as u64 * u64::from(habit.goal_per_week);
    let completion_rate = if total_goal > 0 {
        round_percent(total_completions as f64 / total_goal as f64 * 100.0)
    } else {
        0.0
    };

    HabitStats {
        streak: streak_at(today, &habit.id, completions, habit.goal_per_week, horizon_weeks),
        total_completions,
        completion_rate,
        first_date: all_dates.first().copied().map(format_date),
        last_date: all_dates.last().copied().map(format_date),
        all_completion_dates: all_dates.into_iter().map(format_date).collect(),
    }
}

pub fn month_summary(data: &AppData, month: NaiveDate) -> SummaryResponse {
    month_summary_at(today(), data, month)
}

pub fn month_summary_at(today: NaiveDate, data: &AppData, month: NaiveDate) -> SummaryResponse {
    SummaryResponse {
        month: format_date(month_start(month)),
        habit_count: data.habits.len(),
        completed_count: count_completed(&filter_by_month(&data.completions, month)),
        progress: progress_percentage_at(today, &data.habits, &data.completions, month),
    }
}

/// One point per day of the month; days without an entry read as neutral.
pub fn mood_series(moods: &[MoodEntry], month: NaiveDate) -> Vec<MoodPoint> {
    let by_date: HashMap<NaiveDate, u8> = moods.iter().map(|entry| (entry.date, entry.mood)).collect();
    days_in_month(month)
        .into_iter()
        .map(|day| MoodPoint {
            date: format_date(day),
            mood: by_date.get(&day).copied().unwrap_or(NEUTRAL_MOOD),
        })
        .collect()
}

/// Completed records per habit in the month, most completed first.
pub fn goal_achievements(habits: &[Habit], completions: &[HabitCompletion], month: NaiveDate) -> Vec<GoalAchievement> {
    let in_month = filter_by_month(completions, month);
    let mut achievements: Vec<GoalAchievement> = habits
        .iter()
        .map(|habit| GoalAchievement {
            habit_id: habit.id.clone(),
            name: habit.name.clone(),
            color: habit.color.clone(),
            count: in_month
                .iter()
                .filter(|completion| completion.completed && completion.habit_id == habit.id)
                .count(),
        })
        .collect();
    achievements.sort_by(|a, b| b.count.cmp(&a.count));
    achievements
}

/// Days between the first tracked activity (clamped to the month) and today
/// (clamped to the month end). `None` when the window is empty.
fn active_window(
    today: NaiveDate,
    habits: &[Habit],
    completions: &[HabitCompletion],
    month: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let (first, last) = (month_start(month), month_end(month));
    let earliest = habits
        .iter()
        .map(|habit| habit.created_at)
        .chain(completions.iter().filter(|c| c.completed).map(|c| c.date))
        .min()
        .unwrap_or(first);

    let start = earliest.max(first);
    let end = today.min(last);
    (start <= end).then_some((start, end))
}

fn completed_dates(habit_id: &str, completions: &[HabitCompletion]) -> BTreeSet<NaiveDate> {
    completions
        .iter()
        .filter(|completion| completion.completed && completion.habit_id == habit_id)
        .map(|completion| completion.date)
        .collect()
}

fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
