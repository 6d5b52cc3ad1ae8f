use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::ops::RangeInclusive;
use uuid::Uuid;

pub const GOAL_PER_WEEK_RANGE: RangeInclusive<u32> = 1..=7;
pub const MOOD_RANGE: RangeInclusive<u8> = 0..=100;
pub const NEUTRAL_MOOD: u8 = 50;

fn default_goal_per_week() -> u32 {
    7
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default = "default_goal_per_week")]
    pub goal_per_week: u32,
    #[serde(with = "created_at")]
    pub created_at: NaiveDate,
}

impl Habit {
    pub fn new(name: impl Into<String>, color: impl Into<String>, goal_per_week: u32, created_at: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            color: color.into(),
            icon: None,
            goal_per_week,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HabitCompletion {
    pub habit_id: String,
    pub date: NaiveDate,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodEntry {
    pub date: NaiveDate,
    pub mood: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppData {
    pub habits: Vec<Habit>,
    pub completions: Vec<HabitCompletion>,
    pub moods: Vec<MoodEntry>,
}

impl AppData {
    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn add_habit(&mut self, habit: Habit) {
        self.habits.push(habit);
    }

    /// Replaces the habit with the same id in place. Returns false when absent.
    pub fn update_habit(&mut self, updated: Habit) -> bool {
        match self.habits.iter_mut().find(|habit| habit.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    /// Removes the habit together with all of its completions.
    pub fn delete_habit(&mut self, id: &str) -> bool {
        let before = self.habits.len();
        self.habits.retain(|habit| habit.id != id);
        if self.habits.len() == before {
            return false;
        }
        self.completions.retain(|completion| completion.habit_id != id);
        true
    }

    /// Flips the record for `(habit_id, date)` or inserts a completed one.
    pub fn toggle_completion(&mut self, habit_id: &str, date: NaiveDate) -> HabitCompletion {
        if let Some(existing) = self
            .completions
            .iter_mut()
            .find(|completion| completion.habit_id == habit_id && completion.date == date)
        {
            existing.completed = !existing.completed;
            return existing.clone();
        }
        let completion = HabitCompletion {
            habit_id: habit_id.to_string(),
            date,
            completed: true,
        };
        self.completions.push(completion.clone());
        completion
    }

    pub fn set_mood(&mut self, date: NaiveDate, mood: u8) -> MoodEntry {
        match self.moods.iter_mut().find(|entry| entry.date == date) {
            Some(entry) => {
                entry.mood = mood;
                entry.clone()
            }
            None => {
                let entry = MoodEntry { date, mood };
                self.moods.push(entry.clone());
                entry
            }
        }
    }

    pub fn mood_on(&self, date: NaiveDate) -> Option<u8> {
        self.moods.iter().find(|entry| entry.date == date).map(|entry| entry.mood)
    }

    /// Collapses repeated `(habit_id, date)` completions and repeated mood
    /// dates. The last record wins and keeps the position of the first.
    pub fn dedup_records(&mut self) {
        self.completions = keep_last(std::mem::take(&mut self.completions), |completion| {
            (completion.habit_id.clone(), completion.date)
        });
        self.moods = keep_last(std::mem::take(&mut self.moods), |entry| entry.date);
    }
}

fn keep_last<T, K: Eq + Hash>(records: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut kept: Vec<T> = Vec::with_capacity(records.len());
    for record in records {
        match slots.entry(key(&record)) {
            Entry::Occupied(slot) => kept[*slot.get()] = record,
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(record);
            }
        }
    }
    kept
}

/// `createdAt` is kept at day precision. Older snapshots carry a full RFC 3339
/// timestamp, which is reduced to its local calendar day.
mod created_at {
    use chrono::{DateTime, Local, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::date_grid::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Some(date) = crate::date_grid::parse_date(&raw) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|timestamp| timestamp.with_timezone(&Local).date_naive())
            .map_err(|err| D::Error::custom(format!("invalid createdAt `{raw}`: {err}")))
    }
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateHabitRequest {
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub icon: Option<String>,
    pub goal_per_week: Option<u32>,
    pub created_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub goal_per_week: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToggleRequest {
    pub habit_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoodRequest {
    pub date: NaiveDate,
    pub mood: u8,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: String,
    pub progress: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodPoint {
    pub date: String,
    pub mood: u8,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalAchievement {
    pub habit_id: String,
    pub name: String,
    pub color: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub streak: u32,
    pub total_completions: usize,
    pub completion_rate: f64,
    pub all_completion_dates: Vec<String>,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub habit_id: String,
    pub goal_per_week: u32,
    pub streak: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub month: String,
    pub habit_count: usize,
    pub completed_count: usize,
    pub progress: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDay {
    pub date: String,
    pub label: u32,
    pub in_month: bool,
    pub is_today: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn toggle_flips_existing_record_instead_of_duplicating() {
        let mut data = AppData::default();
        let habit = Habit::new("Read", "#fff", 3, ymd(2026, 1, 1));
        let id = habit.id.clone();
        data.add_habit(habit);

        assert!(data.toggle_completion(&id, ymd(2026, 1, 2)).completed);
        assert!(!data.toggle_completion(&id, ymd(2026, 1, 2)).completed);
        assert!(data.toggle_completion(&id, ymd(2026, 1, 2)).completed);
        assert_eq!(data.completions.len(), 1);
    }

    #[test]
    fn delete_cascades_completions() {
        let mut data = AppData::default();
        let keep = Habit::new("Run", "", 2, ymd(2026, 1, 1));
        let swim = Habit::new("Swim", "", 2, ymd(2026, 1, 1));
        let (keep_id, swim_id) = (keep.id.clone(), swim.id.clone());
        data.add_habit(keep);
        data.add_habit(swim);
        data.toggle_completion(&keep_id, ymd(2026, 1, 3));
        data.toggle_completion(&swim_id, ymd(2026, 1, 3));

        assert!(data.delete_habit(&swim_id));
        assert!(!data.delete_habit(&swim_id));
        assert_eq!(data.habits.len(), 1);
        assert!(data.completions.iter().all(|c| c.habit_id == keep_id));
    }

    #[test]
    fn set_mood_keeps_one_entry_per_date() {
        let mut data = AppData::default();
        data.set_mood(ymd(2026, 1, 4), 30);
        data.set_mood(ymd(2026, 1, 4), 80);
        assert_eq!(data.moods.len(), 1);
        assert_eq!(data.mood_on(ymd(2026, 1, 4)), Some(80));
    }

    #[test]
    fn legacy_habit_without_goal_defaults_to_daily() {
        let raw = r#"{"id":"h1","name":"Walk","color":"red","createdAt":"2025-11-03T08:15:00.000Z"}"#;
        let habit: Habit = serde_json::from_str(raw).unwrap();
        assert_eq!(habit.goal_per_week, 7);
        // Any timezone keeps this timestamp within a day of the UTC date.
        let delta = (habit.created_at - ymd(2025, 11, 3)).num_days();
        assert!(delta.abs() <= 1);
    }

    #[test]
    fn persisted_shape_uses_camel_case_keys() {
        let habit = Habit {
            id: "h1".into(),
            name: "Walk".into(),
            color: "red".into(),
            icon: None,
            goal_per_week: 4,
            created_at: ymd(2026, 1, 1),
        };
        let value = serde_json::to_value(&habit).unwrap();
        assert_eq!(value["goalPerWeek"], 4);
        assert_eq!(value["createdAt"], "2026-01-01");
        assert!(value.get("icon").is_none());

        let completion = HabitCompletion {
            habit_id: "h1".into(),
            date: ymd(2026, 1, 2),
            completed: true,
        };
        let value = serde_json::to_value(&completion).unwrap();
        assert_eq!(value["habitId"], "h1");
        assert_eq!(value["date"], "2026-01-02");
    }

    #[test]
    fn icon_survives_a_round_trip_when_present() {
        let raw = r#"{"id":"h1","name":"Walk","icon":"shoe","goalPerWeek":3,"createdAt":"2026-01-01"}"#;
        let habit: Habit = serde_json::from_str(raw).unwrap();
        assert_eq!(habit.icon.as_deref(), Some("shoe"));
        assert_eq!(serde_json::to_value(&habit).unwrap()["icon"], "shoe");
    }

    #[test]
    fn requests_use_camel_case_and_reject_unknown_keys() {
        let create: CreateHabitRequest = serde_json::from_str(r#"{"name":"Run","goalPerWeek":3}"#).unwrap();
        assert_eq!(create.goal_per_week, Some(3));
        assert!(serde_json::from_str::<CreateHabitRequest>(r#"{"name":"Run","goal_per_week":3}"#).is_err());

        let toggle: ToggleRequest = serde_json::from_str(r#"{"habitId":"h1","date":"2026-01-05"}"#).unwrap();
        assert_eq!(toggle.habit_id, "h1");
        assert!(serde_json::from_str::<UpdateHabitRequest>(r#"{"colour":"red"}"#).is_err());
    }

    #[test]
    fn responses_use_camel_case_keys() {
        let stats = HabitStats {
            streak: 2,
            total_completions: 5,
            completion_rate: 41.67,
            all_completion_dates: vec!["2026-01-05".into()],
            first_date: Some("2026-01-05".into()),
            last_date: None,
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["totalCompletions"], 5);
        assert_eq!(value["completionRate"], 41.67);
        assert_eq!(value["allCompletionDates"][0], "2026-01-05");
        assert!(value["lastDate"].is_null());
    }

    #[test]
    fn dedup_records_keeps_last_record_per_key() {
        let mut data = AppData {
            habits: Vec::new(),
            completions: vec![
                HabitCompletion {
                    habit_id: "h".into(),
                    date: ymd(2026, 1, 5),
                    completed: true,
                },
                HabitCompletion {
                    habit_id: "g".into(),
                    date: ymd(2026, 1, 5),
                    completed: true,
                },
                HabitCompletion {
                    habit_id: "h".into(),
                    date: ymd(2026, 1, 5),
                    completed: false,
                },
            ],
            moods: vec![
                MoodEntry {
                    date: ymd(2026, 1, 5),
                    mood: 10,
                },
                MoodEntry {
                    date: ymd(2026, 1, 5),
                    mood: 20,
                },
            ],
        };
        data.dedup_records();

        assert_eq!(data.completions.len(), 2);
        assert_eq!(data.completions[0].habit_id, "h");
        assert!(!data.completions[0].completed);
        assert_eq!(data.completions[1].habit_id, "g");
        assert_eq!(data.moods, vec![MoodEntry { date: ymd(2026, 1, 5), mood: 20 }]);
    }
}
