// Display series derived from the analytics payloads.
//
// The backend sends keyed maps; widgets and the plain-text summary need
// ordered `(label, value)` sequences.

use std::collections::BTreeMap;

use crate::api::{GithubActivity, SlackTimeAnalysis};

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Counts in Monday..Sunday order. Missing days count as zero; keys that
/// are not weekday names are ignored.
pub fn weekly_pattern(counts: &BTreeMap<String, u32>) -> Vec<(&'static str, u32)> {
    WEEKDAYS
        .iter()
        .map(|day| {
            let n = counts
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(day))
                .map(|(_, v)| *v)
                .unwrap_or(0);
            (*day, n)
        })
        .collect()
}

/// Date-keyed counts in chronological order. ISO dates sort lexically.
pub fn by_date(counts: &BTreeMap<String, u32>) -> Vec<(String, u32)> {
    counts.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

/// GitHub events per day, summed across event types.
pub fn github_daily_totals(activity: &GithubActivity) -> Vec<(String, u32)> {
    activity
        .events_by_day
        .iter()
        .map(|(day, types)| (day.clone(), types.values().sum()))
        .collect()
}

/// Total events per type across all days, largest first. `PushEvent`
/// becomes `Push`.
pub fn event_type_distribution(activity: &GithubActivity) -> Vec<(String, u32)> {
    let mut totals: BTreeMap<String, u32> = BTreeMap::new();
    for types in activity.events_by_day.values() {
        for (kind, n) in types {
            let label = kind.strip_suffix("Event").unwrap_or(kind);
            *totals.entry(label.to_string()).or_default() += n;
        }
    }
    let mut out: Vec<(String, u32)> = totals.into_iter().collect();
    // Stable sort keeps ties alphabetical.
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Messages per hour of day, index 0 = midnight. Accepts `"9"` and `"09"`.
pub fn hourly_heatmap(time: &SlackTimeAnalysis) -> [u32; 24] {
    let mut hours = [0u32; 24];
    for (key, n) in &time.hourly_heatmap {
        if let Ok(h) = key.trim().parse::<usize>() {
            if h < 24 {
                hours[h] += n;
            }
        }
    }
    hours
}

/// The `n` busiest weekdays. Uses the backend's ranking when present,
/// otherwise ranks `daily_breakdown`.
pub fn busiest_days(time: &SlackTimeAnalysis, n: usize) -> Vec<(String, u32)> {
    let mut days = if time.busiest_days.is_empty() {
        let mut ranked = by_date(&time.daily_breakdown);
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    } else {
        time.busiest_days.clone()
    };
    days.truncate(n);
    days
}

/// The `n` most active hours as `(hour, count)`, most active first.
pub fn peak_hours(time: &SlackTimeAnalysis, n: usize) -> Vec<(u32, u32)> {
    let mut ranked: Vec<(u32, u32)> = hourly_heatmap(time)
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(h, c)| (h as u32, *c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// `2025-01-14` -> `01-14`. Other labels pass through.
pub fn short_date(label: &str) -> &str {
    match label.split_once('-') {
        Some((year, rest)) if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => label,
    }
}

/// Minutes as `"2h 05m"` or `"45m"`.
pub fn format_minutes(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    match (total / 60, total % 60) {
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m:02}m"),
    }
}
