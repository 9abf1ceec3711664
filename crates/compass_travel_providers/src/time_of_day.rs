use std::{fmt, str::FromStr};

use jiff::{
    Timestamp, Zoned,
    civil::{Date, Weekday},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Representative departure times used to request traffic-aware estimates.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDaySelection {
    #[default]
    Now,
    Morning,
    Evening,
    Weekend,
}

impl TimeOfDaySelection {
    pub const ALL: [TimeOfDaySelection; 4] = [
        TimeOfDaySelection::Now,
        TimeOfDaySelection::Morning,
        TimeOfDaySelection::Evening,
        TimeOfDaySelection::Weekend,
    ];

    fn clock(&self) -> Option<(i8, i8)> {
        match self {
            TimeOfDaySelection::Now => None,
            TimeOfDaySelection::Morning => Some((8, 0)),
            TimeOfDaySelection::Evening => Some((17, 30)),
            TimeOfDaySelection::Weekend => Some((11, 0)),
        }
    }

    fn accepts(&self, date: Date) -> bool {
        let weekend = matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday);
        match self {
            TimeOfDaySelection::Now => true,
            TimeOfDaySelection::Morning | TimeOfDaySelection::Evening => !weekend,
            TimeOfDaySelection::Weekend => date.weekday() == Weekday::Saturday,
        }
    }

    /// The first instant strictly after `now` matching this bucket, in the
    /// time zone of `now`. `Now` resolves to `now` itself.
    pub fn departure_time(&self, now: &Zoned) -> Result<Timestamp, jiff::Error> {
        let Some((hour, minute)) = self.clock() else {
            return Ok(now.timestamp());
        };

        let mut date = now.date();
        // A week always contains a matching day, the eighth covers "today but already past".
        for _ in 0..8 {
            if self.accepts(date) {
                let candidate = date
                    .at(hour, minute, 0, 0)
                    .to_zoned(now.time_zone().clone())?;
                if candidate.timestamp() > now.timestamp() {
                    return Ok(candidate.timestamp());
                }
            }
            date = date.tomorrow()?;
        }

        Ok(now.timestamp())
    }
}

impl fmt::Display for TimeOfDaySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TimeOfDaySelection::Now => "now",
                TimeOfDaySelection::Morning => "morning",
                TimeOfDaySelection::Evening => "evening",
                TimeOfDaySelection::Weekend => "weekend",
            }
        )
    }
}

impl FromStr for TimeOfDaySelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDaySelection::ALL
            .into_iter()
            .find(|selection| selection.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown time of day `{s}`, expected now|morning|evening|weekend"))
    }
}
