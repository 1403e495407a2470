use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::Error;

/// `HH:mm` is the canonical wire format for every time-of-day field.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)
    }
}

pub(crate) mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_some(&t.format(super::hhmm::FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        raw.map(|v| NaiveTime::parse_from_str(&v, super::hhmm::FORMAT).map_err(de::Error::custom))
            .transpose()
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DayType {
    NormalShift,
    WorkFromHome,
    Task,
    DayOff,
    Absent,
    PublicHoliday,
    AnnualLeave,
    Tardy,
    EarlyLeave,
}

impl DayType {
    /// Types that display an underlying time window. The remaining types
    /// never carry a `shift`.
    pub fn carries_shift(self) -> bool {
        matches!(
            self,
            DayType::NormalShift
                | DayType::WorkFromHome
                | DayType::Task
                | DayType::Tardy
                | DayType::EarlyLeave
        )
    }

    /// `minutes` is a duration metric used only for tardiness and early leave.
    pub fn carries_minutes(self) -> bool {
        matches!(self, DayType::Tardy | DayType::EarlyLeave)
    }

    /// The subset of classifications an employee may request as leave.
    pub fn is_leave_kind(self) -> bool {
        matches!(
            self,
            DayType::AnnualLeave | DayType::PublicHoliday | DayType::EarlyLeave
        )
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BreakWindow {
    #[serde(with = "hhmm")]
    #[schema(example = "10:15", value_type = String)]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(example = "10:30", value_type = String)]
    pub end: NaiveTime,
}

/// A working window with exactly three breaks (morning, lunch, afternoon).
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Shift {
    #[serde(with = "hhmm")]
    #[schema(example = "09:00", value_type = String)]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(example = "17:30", value_type = String)]
    pub end_time: NaiveTime,
    #[schema(value_type = Vec<BreakWindow>)]
    pub breaks: [BreakWindow; 3],
}

impl Shift {
    pub fn validate(&self) -> Result<(), Error> {
        if self.end_time <= self.start_time {
            return Err(Error::validation("shift end must be after its start"));
        }
        for brk in &self.breaks {
            if brk.end <= brk.start {
                return Err(Error::validation("break end must be after its start"));
            }
        }
        Ok(())
    }
}

/// One date's classification for one user. Keyed by (user, date) in storage.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleDay {
    #[schema(example = "2026-03-10", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub day_type: DayType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<Shift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 20, nullable = true)]
    pub minutes: Option<u32>,
}

/// Partial update for a single day. Absent fields keep their current value,
/// so reclassifying a day does not discard its recorded time window unless
/// the new type cannot carry one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DayPatch {
    #[serde(rename = "type")]
    pub day_type: Option<DayType>,
    pub shift: Option<Shift>,
    #[schema(example = 20, nullable = true)]
    pub minutes: Option<u32>,
}

impl DayPatch {
    pub fn day(day_type: DayType) -> Self {
        DayPatch {
            day_type: Some(day_type),
            ..DayPatch::default()
        }
    }

    /// Shallow-merge this patch over the existing entry (if any) for `date`.
    ///
    /// Explicit fields that contradict the merged type are rejected; fields
    /// merely inherited from the previous entry are dropped when the new type
    /// cannot carry them, keeping the type/shift invariant intact.
    pub fn apply_to(
        &self,
        existing: Option<&ScheduleDay>,
        date: NaiveDate,
    ) -> Result<ScheduleDay, Error> {
        let day_type = self
            .day_type
            .or(existing.map(|d| d.day_type))
            .ok_or_else(|| Error::validation("a day type is required for a new entry"))?;

        if self.shift.is_some() && !day_type.carries_shift() {
            return Err(Error::Validation(format!(
                "{day_type} days do not carry a shift"
            )));
        }
        if self.minutes.is_some() && !day_type.carries_minutes() {
            return Err(Error::Validation(format!(
                "{day_type} days do not carry a minutes value"
            )));
        }

        let shift = self
            .shift
            .clone()
            .or_else(|| existing.and_then(|d| d.shift.clone()))
            .filter(|_| day_type.carries_shift());
        let minutes = self
            .minutes
            .or(existing.and_then(|d| d.minutes))
            .filter(|_| day_type.carries_minutes());

        if let Some(shift) = &shift {
            shift.validate()?;
        }

        Ok(ScheduleDay {
            date,
            day_type,
            shift,
            minutes,
        })
    }
}

/// Fixture shared by unit and integration tests.
#[cfg(test)]
pub(crate) fn sample_shift() -> Shift {
    let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
    Shift {
        start_time: t(9, 0),
        end_time: t(17, 30),
        breaks: [
            BreakWindow {
                start: t(10, 15),
                end: t(10, 30),
            },
            BreakWindow {
                start: t(12, 30),
                end: t(13, 15),
            },
            BreakWindow {
                start: t(15, 30),
                end: t(15, 45),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn patch_preserves_absent_fields() {
        let day = ScheduleDay {
            date: date("2026-03-10"),
            day_type: DayType::NormalShift,
            shift: Some(sample_shift()),
            minutes: None,
        };

        let merged = DayPatch::day(DayType::Tardy)
            .apply_to(Some(&day), day.date)
            .unwrap();
        assert_eq!(merged.day_type, DayType::Tardy);
        assert_eq!(merged.shift, day.shift);

        let merged = DayPatch {
            minutes: Some(25),
            ..DayPatch::default()
        }
        .apply_to(Some(&merged), day.date)
        .unwrap();
        assert_eq!(merged.day_type, DayType::Tardy);
        assert_eq!(merged.minutes, Some(25));
        assert_eq!(merged.shift, day.shift);
    }

    #[test]
    fn inherited_shift_cleared_when_type_cannot_carry_it() {
        let day = ScheduleDay {
            date: date("2026-03-10"),
            day_type: DayType::NormalShift,
            shift: Some(sample_shift()),
            minutes: None,
        };

        let merged = DayPatch::day(DayType::DayOff)
            .apply_to(Some(&day), day.date)
            .unwrap();
        assert_eq!(merged.day_type, DayType::DayOff);
        assert!(merged.shift.is_none());
    }

    #[test]
    fn explicit_contradictions_are_rejected() {
        let patch = DayPatch {
            day_type: Some(DayType::DayOff),
            shift: Some(sample_shift()),
            minutes: None,
        };
        assert!(matches!(
            patch.apply_to(None, date("2026-03-10")),
            Err(Error::Validation(_))
        ));

        let patch = DayPatch {
            day_type: Some(DayType::NormalShift),
            shift: None,
            minutes: Some(10),
        };
        assert!(matches!(
            patch.apply_to(None, date("2026-03-10")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn patch_on_empty_slot_needs_a_type() {
        let patch = DayPatch {
            minutes: Some(5),
            ..DayPatch::default()
        };
        assert!(matches!(
            patch.apply_to(None, date("2026-03-10")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn hhmm_round_trips_in_wire_format() {
        let day = ScheduleDay {
            date: date("2026-03-10"),
            day_type: DayType::NormalShift,
            shift: Some(sample_shift()),
            minutes: None,
        };
        let raw = serde_json::to_string(&day).unwrap();
        assert!(raw.contains("\"09:00\""), "{raw}");
        assert!(raw.contains("\"NORMAL_SHIFT\""), "{raw}");
        let back: ScheduleDay = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, day);
    }
}
