use chrono::{DateTime, Utc};

/// Platform shown when the API reports no actual track (replacement bus service).
pub const REPLACEMENT_BUS: &str = "Bus";

/// Time shown when the API gave no usable departure time.
pub const UNKNOWN_TIME: &str = "-";

// Represents a single departure row on the board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Departure {
    /// Scheduled local time `HH:MM`, `-` if unknown, empty for a blank row
    pub scheduled_time: String,
    pub delay_minutes: u32,
    /// Scheduled instant plus delay; only used to drop departed trains
    pub actual_departure: Option<DateTime<Utc>>,
    pub platform: String,
    pub platform_changed: bool,
    /// Line or category prefix followed by the destination, e.g. "IC Zwolle"
    pub service_label: String,
    pub destination_changed: bool,
    /// Formation summary such as "VIRM-6", empty if unknown
    pub rolling_stock: String,
    /// Human readable departure status, e.g. "On station"
    pub status: String,
    pub cancelled: bool,
}

impl Departure {
    /// A blank row used to pad the board to its fixed height.
    pub fn empty_slot() -> Self {
        Self::default()
    }

    /// Placeholder row shown while live departures are suspended overnight.
    pub fn suspended(until_hour: u32) -> Self {
        Self {
            scheduled_time: UNKNOWN_TIME.to_string(),
            service_label: format!("Suspended NS API calls till {until_hour}:00..."),
            ..Self::default()
        }
    }

    pub fn is_empty_slot(&self) -> bool {
        *self == Self::default()
    }

    // "+3" for delayed trains, empty when on time
    pub fn delay_text(&self) -> String {
        if self.delay_minutes > 0 {
            format!("+{}", self.delay_minutes)
        } else {
            String::new()
        }
    }

    // Format as "14:35 +3 [5] IC Zwolle VIRM-6"
    pub fn format(&self) -> String {
        let mut parts = Vec::with_capacity(6);
        parts.push(self.scheduled_time.clone());
        let delay = self.delay_text();
        if !delay.is_empty() {
            parts.push(delay);
        }
        if !self.platform.is_empty() {
            let marker = if self.platform_changed { "!" } else { "" };
            parts.push(format!("[{}{}]", self.platform, marker));
        }
        parts.push(self.service_label.clone());
        if !self.rolling_stock.is_empty() {
            parts.push(self.rolling_stock.clone());
        }
        if self.cancelled {
            parts.push("CANCELLED".to_string());
        }
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    // Truncate the service label so the whole row fits within max_chars
    pub fn format_truncated(&self, max_chars: usize) -> String {
        let formatted = self.format();
        if formatted.chars().count() <= max_chars {
            return formatted;
        }

        // Everything except the service label: "TIME +D [P] " and " STOCK CANCELLED"
        let mut head = self.scheduled_time.clone();
        let delay = self.delay_text();
        if !delay.is_empty() {
            head.push(' ');
            head.push_str(&delay);
        }
        if !self.platform.is_empty() {
            let marker = if self.platform_changed { "!" } else { "" };
            head.push_str(&format!(" [{}{}]", self.platform, marker));
        }
        head.push(' ');

        let mut tail = String::new();
        if !self.rolling_stock.is_empty() {
            tail.push(' ');
            tail.push_str(&self.rolling_stock);
        }
        if self.cancelled {
            tail.push_str(" CANCELLED");
        }

        let overhead = head.chars().count() + tail.chars().count();
        if overhead >= max_chars {
            // Can't fit any of the label, cut the plain row
            return formatted.chars().take(max_chars).collect();
        }

        let label_max_len = max_chars - overhead;
        let truncated_label: String = self.service_label.chars().take(label_max_len).collect();

        format!("{}{}{}", head, truncated_label, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Departure {
        Departure {
            scheduled_time: "14:35".into(),
            delay_minutes: 3,
            actual_departure: None,
            platform: "5".into(),
            platform_changed: false,
            service_label: "IC Zwolle".into(),
            destination_changed: false,
            rolling_stock: "VIRM-6".into(),
            status: "On station".into(),
            cancelled: false,
        }
    }

    #[test]
    fn test_departure_format() {
        assert_eq!(sample().format(), "14:35 +3 [5] IC Zwolle VIRM-6");
    }

    #[test]
    fn test_format_marks_changes_and_cancellation() {
        let dep = Departure {
            delay_minutes: 0,
            platform_changed: true,
            cancelled: true,
            rolling_stock: String::new(),
            ..sample()
        };
        assert_eq!(dep.format(), "14:35 [5!] IC Zwolle CANCELLED");
    }

    #[test]
    fn test_format_truncated_keeps_time_and_stock() {
        let dep = Departure {
            service_label: "SPR Amsterdam Centraal".into(),
            ..sample()
        };
        let truncated = dep.format_truncated(30);
        assert_eq!(truncated.chars().count(), 30);
        assert!(truncated.starts_with("14:35 +3 [5] SPR"));
        assert!(truncated.ends_with(" VIRM-6"));
    }

    #[test]
    fn test_format_truncated_tiny_width() {
        let truncated = sample().format_truncated(5);
        assert_eq!(truncated, "14:35");
    }

    #[test]
    fn test_empty_slot() {
        let slot = Departure::empty_slot();
        assert!(slot.is_empty_slot());
        assert_eq!(slot.format(), "");
        assert!(!sample().is_empty_slot());
    }

    #[test]
    fn test_suspended_entry() {
        let dep = Departure::suspended(5);
        assert_eq!(dep.service_label, "Suspended NS API calls till 5:00...");
        assert!(!dep.is_empty_slot());
        assert_eq!(dep.delay_minutes, 0);
    }
}
