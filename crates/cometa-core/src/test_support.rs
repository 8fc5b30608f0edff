//! Fixture builders shared by the unit tests.

use chrono::NaiveDate;

use crate::types::{ChildId, ChildProfile, ClassroomId, Exception, ExceptionId, StaffId, TimeOfDay};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn time(s: &str) -> TimeOfDay {
    TimeOfDay::parse("test", s).unwrap()
}

pub fn profile(
    id: &str,
    name: &str,
    default_in: &str,
    default_out: &str,
    bus_morning: bool,
    bus_afternoon: bool,
) -> ChildProfile {
    ChildProfile {
        id: ChildId::new(id).unwrap(),
        name: name.to_string(),
        classroom_id: Some(ClassroomId::new("aula-1").unwrap()),
        default_in: time(default_in),
        default_out: time(default_out),
        bus_morning_default: bus_morning,
        bus_afternoon_default: bus_afternoon,
        active: true,
    }
}

/// An exception that overrides nothing.
pub fn exception(id: &str, child_id: &str, on: &str) -> Exception {
    Exception {
        id: ExceptionId::new(id).unwrap(),
        child_id: ChildId::new(child_id).unwrap(),
        date: date(on),
        new_in: None,
        new_out: None,
        bus_morning_override: None,
        bus_afternoon_override: None,
        absent: false,
        note: None,
        created_by: StaffId::new("staff-1").unwrap(),
    }
}
