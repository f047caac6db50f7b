//! Colour mapping for the terminal dashboard.

use ratatui::style::Color;

use crate::fields::{Priority, TaskStatus};

pub const DARK_GREEN: Color = Color::Rgb(0, 120, 0);
pub const GOLD: Color = Color::Rgb(255, 215, 0);
pub const DARK_RED: Color = Color::Rgb(160, 0, 0);
pub const DARK_PURPLE: Color = Color::Rgb(120, 80, 140);

pub fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::White,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Review => DARK_PURPLE,
        TaskStatus::Completed => Color::DarkGray,
        TaskStatus::Blocked => DARK_RED,
        TaskStatus::Cancelled => Color::Gray,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Gray,
        Priority::Medium => Color::White,
        Priority::High => GOLD,
        Priority::Urgent => Color::Red,
    }
}

/// Green under 75% of budget, gold up to 100%, red past it.
pub fn utilization_color(percent: f64) -> Color {
    if percent > 100.0 {
        Color::Red
    } else if percent >= 75.0 {
        GOLD
    } else {
        DARK_GREEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_color() {
        assert_eq!(utilization_color(10.0), DARK_GREEN);
        assert_eq!(utilization_color(80.0), GOLD);
        assert_eq!(utilization_color(120.0), Color::Red);
    }
}
