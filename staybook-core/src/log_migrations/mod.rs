//! Event log migrations - embedded SQL files
//!
//! Compiled into the binary with include_str!, applied in order by name.

/// Format: (filename, sql_content)
///
/// New migrations get the next NNN_description.sql name and an entry here.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
