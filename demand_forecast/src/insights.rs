//! Descriptive statistics over sales history
//!
//! These do not touch the models. They summarize what already happened:
//! which conditions each item sells best under, the overall best seller,
//! and which items are usually sold on each weekday and time slot.

use crate::classifier::Trend;
use crate::data::{group_by_item, ExamPeriod, SalesObservation, TimeSlot, Weather};
use chrono::{Datelike, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

/// Conditions under which one item sells best
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemInsight {
    pub item: String,
    /// Weather with the highest mean quantity
    pub best_weather: Option<Weather>,
    /// Exam period with the highest mean quantity, unless that is "no exams"
    pub peak_exam_period: Option<ExamPeriod>,
    /// Time slot with the highest mean quantity
    pub best_time_slot: Option<TimeSlot>,
    pub trend: Trend,
}

/// Totals over the whole history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalSummary {
    pub most_popular_item: String,
    pub most_popular_units: u64,
    pub total_units: u64,
    pub items: usize,
}

/// Items sold on one weekday, by time slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuDay {
    pub day: &'static str,
    pub slots: BTreeMap<TimeSlot, Vec<String>>,
}

/// Key with the highest mean quantity. Ties keep the smallest key.
fn best_by_mean<K, F>(observations: &[&SalesObservation], key: F) -> Option<K>
where
    K: Copy + Eq + Hash + Ord,
    F: Fn(&SalesObservation) -> Option<K>,
{
    let mut totals: HashMap<K, (f64, usize)> = HashMap::new();
    for obs in observations {
        if let Some(k) = key(*obs) {
            let entry = totals.entry(k).or_insert((0.0, 0));
            entry.0 += obs.quantity as f64;
            entry.1 += 1;
        }
    }

    let mut means: Vec<(K, f64)> = totals
        .into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect();
    means.sort_by_key(|(k, _)| *k);
    means
        .into_iter()
        .fold(None, |best: Option<(K, f64)>, (k, mean)| match best {
            Some((_, best_mean)) if best_mean >= mean => best,
            _ => Some((k, mean)),
        })
        .map(|(k, _)| k)
}

/// Per-item insights, in item name order
pub fn item_insights(observations: &[SalesObservation]) -> Vec<ItemInsight> {
    group_by_item(observations)
        .into_iter()
        .map(|(item, group)| {
            let quantities: Vec<f64> = group.iter().map(|obs| obs.quantity as f64).collect();
            ItemInsight {
                item: item.to_string(),
                best_weather: best_by_mean(&group, |obs| obs.weather),
                peak_exam_period: best_by_mean(&group, |obs| Some(obs.exams.unwrap_or_default()))
                    .filter(|exams| *exams != ExamPeriod::NoExams),
                best_time_slot: best_by_mean(&group, |obs| obs.time_slot),
                trend: Trend::from_history(&quantities),
            }
        })
        .collect()
}

/// Best-selling item and total units; `None` without history
pub fn historical_summary(observations: &[SalesObservation]) -> Option<HistoricalSummary> {
    let mut per_item: BTreeMap<&str, u64> = BTreeMap::new();
    for obs in observations {
        *per_item.entry(obs.item.as_str()).or_default() += obs.quantity as u64;
    }

    let (item, units) = per_item
        .iter()
        .fold(None, |best: Option<(&str, u64)>, (item, units)| match best {
            Some((_, best_units)) if best_units >= *units => best,
            _ => Some((*item, *units)),
        })?;

    Some(HistoricalSummary {
        most_popular_item: item.to_string(),
        most_popular_units: units,
        total_units: per_item.values().sum(),
        items: per_item.len(),
    })
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Items sold per weekday and time slot, Monday first.
/// Records without a time slot are left out.
pub fn menu_plan(observations: &[SalesObservation]) -> Vec<MenuDay> {
    let mut plan: BTreeMap<u32, BTreeMap<TimeSlot, BTreeSet<&str>>> = BTreeMap::new();
    for obs in observations {
        if let Some(slot) = obs.time_slot {
            plan.entry(obs.date.weekday().num_days_from_monday())
                .or_default()
                .entry(slot)
                .or_default()
                .insert(obs.item.as_str());
        }
    }

    plan.into_iter()
        .filter_map(|(day, slots)| {
            let weekday = *WEEK.get(day as usize)?;
            Some(MenuDay {
                day: day_name(weekday),
                slots: slots
                    .into_iter()
                    .map(|(slot, items)| (slot, items.into_iter().map(str::to_string).collect()))
                    .collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ForecastContext, Region};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sale(item: &str, qty: u32, day: u32, weather: Weather, exams: ExamPeriod, slot: TimeSlot) -> SalesObservation {
        // 2024-01-01 is a Monday
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        SalesObservation::new("o", item, qty, date).with_context(&ForecastContext::new(
            weather,
            exams,
            Region::Urban,
            slot,
        ))
    }

    #[test]
    fn test_item_insights() {
        let obs = vec![
            sale("Tea", 10, 1, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Morning),
            sale("Tea", 30, 2, Weather::Rainy, ExamPeriod::Finals, TimeSlot::Evening),
            sale("Tea", 20, 3, Weather::Rainy, ExamPeriod::NoExams, TimeSlot::Morning),
            sale("Juice", 50, 1, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Afternoon),
        ];
        let insights = item_insights(&obs);
        assert_eq!(insights.len(), 2);

        let juice = &insights[0];
        assert_eq!(juice.item, "Juice");
        assert_eq!(juice.peak_exam_period, None);

        let tea = &insights[1];
        assert_eq!(tea.best_weather, Some(Weather::Rainy));
        assert_eq!(tea.peak_exam_period, Some(ExamPeriod::Finals));
        assert_eq!(tea.best_time_slot, Some(TimeSlot::Evening));
        assert_eq!(tea.trend, Trend::Stable);
    }

    #[test]
    fn test_historical_summary() {
        let obs = vec![
            sale("Tea", 10, 1, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Morning),
            sale("Tea", 30, 2, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Morning),
            sale("Juice", 35, 1, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Morning),
        ];
        let summary = historical_summary(&obs).unwrap();
        assert_eq!(summary.most_popular_item, "Tea");
        assert_eq!(summary.most_popular_units, 40);
        assert_eq!(summary.total_units, 75);
        assert_eq!(summary.items, 2);
        assert!(historical_summary(&[]).is_none());
    }

    #[test]
    fn test_menu_plan() {
        let mut untimed = sale("Cake", 1, 1, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Night);
        untimed.time_slot = None;
        let obs = vec![
            sale("Tea", 10, 2, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Morning),
            sale("Coffee", 10, 1, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Morning),
            sale("Tea", 10, 1, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Morning),
            sale("Tea", 10, 8, Weather::Sunny, ExamPeriod::NoExams, TimeSlot::Morning),
            untimed,
        ];
        let plan = menu_plan(&obs);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].day, "Monday");
        assert_eq!(
            plan[0].slots[&TimeSlot::Morning],
            vec!["Coffee".to_string(), "Tea".to_string()]
        );
        assert_eq!(plan[1].day, "Tuesday");
    }
}
