use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Look-back window for a one-shot history fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SinceWindow {
    #[default]
    TenMinutes,
    OneHour,
    OneDay,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown since window {0:?} (expected 10m, 1h, 24h or all)")]
pub struct UnknownSinceWindow(pub String);

impl SinceWindow {
    pub const ALL: [SinceWindow; 4] = [
        SinceWindow::TenMinutes,
        SinceWindow::OneHour,
        SinceWindow::OneDay,
        SinceWindow::All,
    ];

    /// Value sent as the `since` query parameter.
    pub fn query_value(self) -> &'static str {
        match self {
            SinceWindow::TenMinutes => "10m",
            SinceWindow::OneHour => "1h",
            SinceWindow::OneDay => "24h",
            SinceWindow::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SinceWindow::TenMinutes => "10 minutes",
            SinceWindow::OneHour => "1 hour",
            SinceWindow::OneDay => "24 hours",
            SinceWindow::All => "all",
        }
    }
}

impl fmt::Display for SinceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

impl FromStr for SinceWindow {
    type Err = UnknownSinceWindow;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|window| {
                window.query_value().eq_ignore_ascii_case(needle)
                    || window.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownSinceWindow(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_values_and_labels() {
        assert_eq!("10m".parse(), Ok(SinceWindow::TenMinutes));
        assert_eq!("1 hour".parse(), Ok(SinceWindow::OneHour));
        assert_eq!(" 24H ".parse(), Ok(SinceWindow::OneDay));
        assert_eq!("all".parse(), Ok(SinceWindow::All));
        assert!("2d".parse::<SinceWindow>().is_err());
    }

    #[test]
    fn display_uses_query_value() {
        assert_eq!(SinceWindow::OneDay.to_string(), "24h");
    }
}
