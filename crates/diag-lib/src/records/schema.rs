//! Record store schema, versioned through SQLite's `user_version` header

use super::DatabaseError;
use rusqlite::Connection;
use tracing::info;

/// Entry `i` upgrades a database from version `i` to `i + 1`
const MIGRATIONS: &[&str] = &[include_str!("../../resources/migrations/001_initial.sql")];

/// Version of a fully migrated database
pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;

pub fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Apply every pending migration, each in its own transaction
pub fn migrate(conn: &mut Connection) -> Result<(), DatabaseError> {
    conn.pragma_update(None, "foreign_keys", true)?;

    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DatabaseError::MigrationFailed {
            version: current,
            reason: format!("database is newer than supported version {}", SCHEMA_VERSION),
        });
    }

    for (index, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = index as i64 + 1;
        let tx = conn.transaction()?;
        tx.execute_batch(sql)
            .and_then(|_| tx.pragma_update(None, "user_version", version))
            .map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        tx.commit()?;
        info!(version, "Record store schema upgraded");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn
    }

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn fresh_database_reaches_latest_version() {
        let conn = migrated();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(table_names(&conn), vec!["diagnoses", "diseases", "patients"]);
    }

    #[test]
    fn every_domain_has_a_disease_row() {
        let conn = migrated();
        for domain in crate::domain::Domain::ALL {
            let name: String = conn
                .query_row(
                    "SELECT name FROM diseases WHERE code = ?1",
                    [domain.disease_code()],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(!name.is_empty());
        }
    }

    #[test]
    fn migrating_twice_is_a_no_op() {
        let mut conn = migrated();
        migrate(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
        let diseases: i64 = conn
            .query_row("SELECT COUNT(*) FROM diseases", [], |row| row.get(0))
            .unwrap();
        assert_eq!(diseases, 3);
    }

    #[test]
    fn newer_database_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        match migrate(&mut conn) {
            Err(DatabaseError::MigrationFailed { version, .. }) => {
                assert_eq!(version, SCHEMA_VERSION + 1)
            }
            other => panic!("expected MigrationFailed, got {:?}", other),
        }
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = migrated();
        let result = conn.execute(
            "INSERT INTO diagnoses (patient_id, disease_code, label, probability, created_at) \
             VALUES (999, 'DIABETES', 1, 0.9, '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
