use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// `YYYY-MM-DD` on the wire.
pub mod iso_date {
    use serde::{de, ser, Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn parse(raw: &str) -> Result<Date, String> {
        Date::parse(raw.trim(), FORMAT).map_err(|e| format!("invalid date `{raw}`: {e}"))
    }

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        let text = date.format(FORMAT).map_err(ser::Error::custom)?;
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(de::Error::custom)
    }
}

pub const HIGH_DAY_CALORIES: f64 = 2500.0;
pub const LOW_DAY_CALORIES: f64 = 1200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
}

impl Meal {
    pub const ALL: [Meal; 3] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner];
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
        })
    }
}

/// Recipe ids planned for each meal of one day, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(default)]
    pub breakfast: Vec<Uuid>,
    #[serde(default)]
    pub lunch: Vec<Uuid>,
    #[serde(default)]
    pub dinner: Vec<Uuid>,
}

impl DayPlan {
    pub fn meal(&self, meal: Meal) -> &[Uuid] {
        match meal {
            Meal::Breakfast => &self.breakfast,
            Meal::Lunch => &self.lunch,
            Meal::Dinner => &self.dinner,
        }
    }

    fn meal_mut(&mut self, meal: Meal) -> &mut Vec<Uuid> {
        match meal {
            Meal::Breakfast => &mut self.breakfast,
            Meal::Lunch => &mut self.lunch,
            Meal::Dinner => &mut self.dinner,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekPlan {
    #[serde(default)]
    pub monday: DayPlan,
    #[serde(default)]
    pub tuesday: DayPlan,
    #[serde(default)]
    pub wednesday: DayPlan,
    #[serde(default)]
    pub thursday: DayPlan,
    #[serde(default)]
    pub friday: DayPlan,
    #[serde(default)]
    pub saturday: DayPlan,
    #[serde(default)]
    pub sunday: DayPlan,
}

impl WeekPlan {
    pub fn day(&self, day: Day) -> &DayPlan {
        match day {
            Day::Monday => &self.monday,
            Day::Tuesday => &self.tuesday,
            Day::Wednesday => &self.wednesday,
            Day::Thursday => &self.thursday,
            Day::Friday => &self.friday,
            Day::Saturday => &self.saturday,
            Day::Sunday => &self.sunday,
        }
    }

    fn day_mut(&mut self, day: Day) -> &mut DayPlan {
        match day {
            Day::Monday => &mut self.monday,
            Day::Tuesday => &mut self.tuesday,
            Day::Wednesday => &mut self.wednesday,
            Day::Thursday => &mut self.thursday,
            Day::Friday => &mut self.friday,
            Day::Saturday => &mut self.saturday,
            Day::Sunday => &mut self.sunday,
        }
    }

    pub fn add(&mut self, day: Day, meal: Meal, recipe_id: Uuid) {
        self.day_mut(day).meal_mut(meal).push(recipe_id);
    }

    /// Removes the entry at `index`, if there is one.
    pub fn remove(&mut self, day: Day, meal: Meal, index: usize) -> Option<Uuid> {
        let cell = self.day_mut(day).meal_mut(meal);
        (index < cell.len()).then(|| cell.remove(index))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        Day::ALL
            .iter()
            .all(|d| Meal::ALL.iter().all(|m| self.day(*d).meal(*m).is_empty()))
    }

    /// Every distinct recipe id in the plan.
    pub fn recipe_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Day::ALL
            .iter()
            .flat_map(|d| Meal::ALL.iter().flat_map(move |m| self.day(*d).meal(*m).iter().copied()))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalorieLevel {
    High,
    Low,
    Good,
}

impl CalorieLevel {
    pub fn of(calories: f64) -> Self {
        if calories > HIGH_DAY_CALORIES {
            CalorieLevel::High
        } else if calories < LOW_DAY_CALORIES {
            CalorieLevel::Low
        } else {
            CalorieLevel::Good
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCalories {
    pub day: Day,
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
    pub total: f64,
    pub level: CalorieLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieSummary {
    pub days: Vec<DayCalories>,
    pub week_total: f64,
}

/// Sums `calories` per cell, day and week. Ids missing from `calories` count 0.
pub fn calorie_summary(week: &WeekPlan, calories: &HashMap<Uuid, f64>) -> CalorieSummary {
    let cell = |day: Day, meal: Meal| -> f64 {
        week.day(day)
            .meal(meal)
            .iter()
            .map(|id| calories.get(id).copied().unwrap_or(0.0))
            .sum()
    };

    let days: Vec<DayCalories> = Day::ALL
        .iter()
        .map(|&day| {
            let breakfast = cell(day, Meal::Breakfast);
            let lunch = cell(day, Meal::Lunch);
            let dinner = cell(day, Meal::Dinner);
            let total = breakfast + lunch + dinner;
            DayCalories {
                day,
                breakfast,
                lunch,
                dinner,
                total,
                level: CalorieLevel::of(total),
            }
        })
        .collect();
    let week_total = days.iter().map(|d| d.total).sum();
    CalorieSummary { days, week_total }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "iso_date")]
    pub week_start: Date,
    pub week: WeekPlan,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePlanRequest {
    #[serde(with = "iso_date")]
    pub week_start: Date,
    #[serde(default)]
    pub week: WeekPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub day: Day,
    pub meal: Meal,
    pub recipe_id: Uuid,
}
