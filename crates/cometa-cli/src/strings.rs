//! User-facing text for the terminal views.

use cometa_core::Locale;

/// Headings and words used around the engine's labels.
pub struct Strings {
    pub day_title: &'static str,
    pub week_title: &'static str,
    pub arrive: &'static str,
    pub leave: &'static str,
    pub bus: &'static str,
    pub absent: &'static str,
    pub note: &'static str,
    pub classroom: &'static str,
    pub no_children_today: &'static str,
    pub no_children: &'static str,
    pub no_classrooms: &'static str,
    pub no_changes: &'static str,
    pub changed: &'static str,
    pub noted: &'static str,
    pub absent_count: &'static str,
    pub inactive: &'static str,
    pub saved: &'static str,
    pub reverted: &'static str,
    pub weekdays: [&'static str; 7],
}

const ES: Strings = Strings {
    day_title: "Día",
    week_title: "Semana",
    arrive: "Entrada",
    leave: "Salida",
    bus: "Bus",
    absent: "Ausente",
    note: "Nota",
    classroom: "Aula",
    no_children_today: "No hay alumn@s para mostrar.",
    no_children: "No hay alumn@s aún.",
    no_classrooms: "No hay aulas aún.",
    no_changes: "Sin cambios registrados.",
    changed: "cambios",
    noted: "notas",
    absent_count: "ausentes",
    inactive: "baja",
    saved: "Guardado ✓",
    reverted: "Horario por defecto restaurado",
    weekdays: ["lun", "mar", "mié", "jue", "vie", "sáb", "dom"],
};

const EN: Strings = Strings {
    day_title: "Day",
    week_title: "Week",
    arrive: "In",
    leave: "Out",
    bus: "Bus",
    absent: "Absent",
    note: "Note",
    classroom: "Classroom",
    no_children_today: "No children to show.",
    no_children: "No children yet.",
    no_classrooms: "No classrooms yet.",
    no_changes: "No changes recorded.",
    changed: "changed",
    noted: "noted",
    absent_count: "absent",
    inactive: "inactive",
    saved: "Saved ✓",
    reverted: "Default schedule restored",
    weekdays: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
};

/// The strings for `locale`.
pub const fn strings(locale: Locale) -> &'static Strings {
    match locale {
        Locale::En => &EN,
        Locale::Es => &ES,
    }
}
