//! Session naming and screenshot paths.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use bevy::prelude::*;

/// Fallback when the prompt gets an empty answer.
const DEFAULT_SESSION_NAME: &str = "session";

/// A UTC calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for SimpleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl SimpleDate {
    /// Today's date in UTC.
    #[must_use]
    pub fn today() -> Self {
        use std::time::SystemTime;
        let since_epoch = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_days_since_epoch((since_epoch.as_secs() / 86400) as i32)
    }

    /// Date `days` after 1970-01-01.
    #[must_use]
    pub fn from_days_since_epoch(days: i32) -> Self {
        // Howard Hinnant's civil_from_days.
        let z = days + 719_468;
        let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
        let doe = (z - era * 146_097) as u32;
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
        let y = yoe as i32 + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = doy - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        Self {
            year: if month <= 2 { y + 1 } else { y },
            month,
            day,
        }
    }
}

/// Name of the viewing session and the screenshot counter.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    label: String,
    counter: u32,
}

impl Session {
    /// Session labelled `<name>-<date>`.
    #[must_use]
    pub fn new(name: &str, date: SimpleDate) -> Self {
        Self {
            label: format!("{name}-{date}"),
            counter: 0,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Screenshots requested so far.
    #[must_use]
    pub fn screenshots_taken(&self) -> u32 {
        self.counter
    }

    /// Path of the next screenshot, `<dir>/<label>-<i>.png`.
    pub fn next_screenshot_path(&mut self, dir: &Path) -> PathBuf {
        let path = dir.join(format!("{}-{}.png", self.label, self.counter));
        self.counter += 1;
        path
    }
}

/// Ask for the session name on the terminal.
pub fn prompt_session_name(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<String> {
    write!(output, "enter the name of the session: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let name = line.trim();
    Ok(if name.is_empty() {
        DEFAULT_SESSION_NAME.to_string()
    } else {
        name.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_dates() {
        assert_eq!(
            SimpleDate::from_days_since_epoch(0),
            SimpleDate {
                year: 1970,
                month: 1,
                day: 1
            }
        );
        // 2000-02-29, a leap day.
        assert_eq!(SimpleDate::from_days_since_epoch(11_016).to_string(), "2000-02-29");
        assert_eq!(SimpleDate::from_days_since_epoch(19_723).to_string(), "2024-01-01");
        assert_eq!(SimpleDate::from_days_since_epoch(-1).to_string(), "1969-12-31");
    }

    #[test]
    fn test_screenshot_paths_count_up() {
        let date = SimpleDate {
            year: 2024,
            month: 6,
            day: 3,
        };
        let mut session = Session::new("dunes", date);
        assert_eq!(session.label(), "dunes-2024-06-03");

        let dir = Path::new("screenshots");
        assert_eq!(
            session.next_screenshot_path(dir),
            dir.join("dunes-2024-06-03-0.png")
        );
        assert_eq!(
            session.next_screenshot_path(dir),
            dir.join("dunes-2024-06-03-1.png")
        );
        assert_eq!(session.screenshots_taken(), 2);
    }

    #[test]
    fn test_prompt_session_name() {
        let mut output = Vec::new();
        let name = prompt_session_name(&mut &b"  canyon \n"[..], &mut output).unwrap();
        assert_eq!(name, "canyon");
        assert_eq!(output, b"enter the name of the session: ");

        let empty = prompt_session_name(&mut &b"\n"[..], &mut Vec::new()).unwrap();
        assert_eq!(empty, DEFAULT_SESSION_NAME);
    }
}
