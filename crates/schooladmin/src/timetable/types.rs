//! Types shared by the timetable grid engine and the wire layer.

use super::error::SlotError;
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A teaching day. The week runs Monday through Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    /// Every teaching day, in week order.
    pub const ALL: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = SlotError;

    /// Parses a day name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Day::ALL
            .iter()
            .copied()
            .find(|day| day.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SlotError::UnknownDay(trimmed.to_string()))
    }
}

/// One cell of the grid: what is taught and by whom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Empty string means no subject assigned.
    pub subject: String,
    pub teacher_id: Option<String>,
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        self.subject.is_empty() && self.teacher_id.is_none()
    }
}

/// The editable fields of a [`Slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotField {
    Subject,
    TeacherId,
}

impl FromStr for SlotField {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subject" => Ok(SlotField::Subject),
            "teacherId" | "teacher_id" | "teacher" => Ok(SlotField::TeacherId),
            other => Err(SlotError::UnknownField(other.to_string())),
        }
    }
}

/// Start and end time of a period index, shared by every day and class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMeta {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl PeriodMeta {
    /// Builds a period from hour/minute pairs. Out-of-range values yield `None`.
    pub fn from_hm(start: (u32, u32), end: (u32, u32)) -> Option<Self> {
        Some(Self {
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0)?,
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0)?,
        })
    }

    pub fn start_label(&self) -> String {
        self.start_time.format(hhmm::FORMAT).to_string()
    }

    pub fn end_label(&self) -> String {
        self.end_time.format(hhmm::FORMAT).to_string()
    }
}

/// `HH:MM` (de)serialization for [`NaiveTime`]. Seconds are accepted on input.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// Day set and period-time table a grid is built against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableLayout {
    pub days: Vec<Day>,
    pub periods: Vec<PeriodMeta>,
}

impl TimetableLayout {
    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    /// Six teaching days with eight periods each.
    pub fn reference() -> Self {
        let times = [
            ((8, 0), (8, 45)),
            ((8, 45), (9, 30)),
            ((9, 30), (10, 15)),
            ((10, 30), (11, 15)),
            ((11, 15), (12, 0)),
            ((12, 0), (12, 45)),
            ((13, 30), (14, 15)),
            ((14, 15), (15, 0)),
        ];

        Self {
            days: Day::ALL.to_vec(),
            periods: times
                .iter()
                .filter_map(|&(start, end)| PeriodMeta::from_hm(start, end))
                .collect(),
        }
    }
}

impl Default for TimetableLayout {
    fn default() -> Self {
        Self::reference()
    }
}

/// A period as stored by the remote API inside a per-day record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEntry {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subject: String,
    #[serde(
        default,
        deserialize_with = "teacher_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub teacher_id: Option<String>,
}

/// One persisted timetable record: the periods of a single class on a single day.
///
/// `day` stays a plain string so that records for days this build does not know
/// about still deserialize; hydration skips them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRecord {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub school_id: String,
    #[serde(default)]
    pub periods: Vec<PeriodEntry>,
}

/// A teacher as listed by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTeacher")]
pub struct Teacher {
    pub id: String,
    pub name: String,
}

/// Teacher documents may carry `_id`, `id` or both.
#[derive(Deserialize)]
struct RawTeacher {
    #[serde(rename = "_id", default)]
    object_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<RawTeacher> for Teacher {
    fn from(raw: RawTeacher) -> Self {
        Self {
            id: raw.object_id.or(raw.id).unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
        }
    }
}

/// Read-only lookup from teacher id to display name.
#[derive(Debug, Clone, Default)]
pub struct TeacherDirectory {
    teachers: Vec<Teacher>,
}

impl TeacherDirectory {
    pub fn new(teachers: Vec<Teacher>) -> Self {
        Self { teachers }
    }

    /// Resolves a teacher id to a name. Unknown ids and blank names give `None`.
    pub fn resolve(&self, teacher_id: &str) -> Option<&str> {
        self.teachers
            .iter()
            .find(|t| t.id == teacher_id)
            .map(|t| t.name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn len(&self) -> usize {
        self.teachers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A teacher reference as the API may send it: a bare id, or a populated object.
#[derive(Deserialize)]
#[serde(untagged)]
enum TeacherRef {
    Id(String),
    Populated {
        #[serde(rename = "_id", default)]
        object_id: Option<String>,
        #[serde(default)]
        id: Option<String>,
    },
}

fn teacher_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<TeacherRef>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|r| match r {
            TeacherRef::Id(id) => Some(id),
            TeacherRef::Populated { object_id, id } => object_id.or(id),
        })
        .filter(|id| !id.is_empty()))
}
