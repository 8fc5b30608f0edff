//! Shared fixtures for command tests.

use std::path::Path;

use chrono::NaiveDate;
use cometa_core::{ChildProfile, Exception, Locale, StaffId, TimeOfDay};
use cometa_db::{Classroom, Database, NewChild, NewException};

use crate::Config;

pub struct Roster {
    pub classroom: Classroom,
    pub ana: ChildProfile,
    pub bruno: ChildProfile,
    pub carla: ChildProfile,
}

pub fn config(db_path: &Path, locale: Locale) -> Config {
    Config {
        database_path: db_path.to_path_buf(),
        locale,
        staff_id: Some("marta".to_string()),
        read_back_attempts: 3,
        read_back_backoff_ms: 0,
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn time(s: &str) -> TimeOfDay {
    TimeOfDay::parse("time", s).unwrap()
}

pub fn new_child(name: &str, default_in: &str, default_out: &str) -> NewChild {
    NewChild {
        name: name.to_string(),
        classroom_id: None,
        default_in: time(default_in),
        default_out: time(default_out),
        bus_morning: false,
        bus_afternoon: false,
    }
}

pub fn new_exception(child: &ChildProfile, on: &str) -> NewException {
    NewException {
        child_id: child.id.clone(),
        date: date(on),
        new_in: None,
        new_out: None,
        bus_morning_override: None,
        bus_afternoon_override: None,
        absent: false,
        note: None,
        created_by: StaffId::new("marta").unwrap(),
    }
}

/// Three children: Ana rides the morning bus and sits in the only classroom.
pub fn seed_roster(db: &mut Database) -> Roster {
    let classroom = db.add_classroom("Girasoles").unwrap();
    let ana = db
        .add_child(NewChild {
            classroom_id: Some(classroom.id.clone()),
            bus_morning: true,
            ..new_child("Ana López", "08:00", "17:00")
        })
        .unwrap();
    let bruno = db.add_child(new_child("Bruno Díaz", "09:00", "16:00")).unwrap();
    let carla = db.add_child(new_child("Carla Núñez", "08:00", "15:00")).unwrap();
    Roster {
        classroom,
        ana,
        bruno,
        carla,
    }
}

/// Changes on 2024-03-01: Ana arrives late and takes the afternoon bus,
/// Carla is absent with a note.
pub fn seed_friday(db: &mut Database, roster: &Roster) -> (Exception, Exception) {
    let ana = db
        .create_exception(NewException {
            new_in: Some(time("08:30")),
            bus_afternoon_override: Some(true),
            ..new_exception(&roster.ana, "2024-03-01")
        })
        .unwrap();
    let carla = db
        .create_exception(NewException {
            absent: true,
            note: Some("dentist".to_string()),
            ..new_exception(&roster.carla, "2024-03-01")
        })
        .unwrap();
    (ana, carla)
}
