use chrono::{DateTime, Utc};

/// Render a distance for display: metres below 1 km, one decimal above.
#[must_use]
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round())
    } else {
        format!("{km:.1} km")
    }
}

/// Relative posting age, e.g. `"3 hours ago"`. `None` when the posting date
/// is unknown.
#[must_use]
pub fn time_ago(listed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
    let listed_at = listed_at?;
    let mins = (now - listed_at).num_minutes();
    if mins < 1 {
        return Some("Just now".to_string());
    }
    if mins < 60 {
        return Some(format!("{mins}m ago"));
    }
    let hours = mins / 60;
    if hours < 24 {
        return Some(format!("{hours}h ago"));
    }
    let days = hours / 24;
    if days < 7 {
        return Some(format!("{days}d ago"));
    }
    Some(format!("{}w ago", days / 7))
}
