use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::Project;
use anyhow::{Context, Result};

/// Directory behind the `project=` filter. Leads refer to a project by name;
/// imports create unknown names on the fly.
///
/// ```no_run
/// use leadboard::db::DbConnection;
/// use leadboard::repo::ProjectRepo;
///
/// let conn = DbConnection::connect_in_memory().unwrap();
/// let skyline = ProjectRepo::get_or_create(&conn, "skyline").unwrap();
/// ```
pub struct ProjectRepo;

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        created_ts: row.get("created_ts")?,
    })
}

impl ProjectRepo {
    pub fn create(conn: &Connection, name: &str) -> Result<Project> {
        let created_ts = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO projects (name, created_ts) VALUES (?1, ?2)",
            rusqlite::params![name, created_ts],
        )
        .with_context(|| format!("Failed to create project: {}", name))?;
        Ok(Project {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            created_ts,
        })
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Project>> {
        let project = conn
            .query_row(
                "SELECT id, name, created_ts FROM projects WHERE name = ?1",
                [name],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    pub fn get_or_create(conn: &Connection, name: &str) -> Result<Project> {
        if let Some(existing) = Self::get_by_name(conn, name)? {
            return Ok(existing);
        }
        log::info!("Creating project '{}'", name);
        Self::create(conn, name)
    }

    /// All projects, alphabetical
    pub fn list(conn: &Connection) -> Result<Vec<Project>> {
        let mut stmt = conn.prepare("SELECT id, name, created_ts FROM projects ORDER BY name")?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    #[test]
    fn test_create_and_list() {
        let conn = DbConnection::connect_in_memory().unwrap();
        ProjectRepo::create(&conn, "skyline").unwrap();
        ProjectRepo::create(&conn, "harbor").unwrap();

        let names: Vec<String> = ProjectRepo::list(&conn).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["harbor", "skyline"]);
    }

    #[test]
    fn test_duplicate_name_fails() {
        let conn = DbConnection::connect_in_memory().unwrap();
        ProjectRepo::create(&conn, "skyline").unwrap();
        assert!(ProjectRepo::create(&conn, "skyline").is_err());
    }

    #[test]
    fn test_get_or_create() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let first = ProjectRepo::get_or_create(&conn, "skyline").unwrap();
        let second = ProjectRepo::get_or_create(&conn, "skyline").unwrap();
        assert_eq!(first.id, second.id);
        assert!(ProjectRepo::get_by_name(&conn, "harbor").unwrap().is_none());
    }
}
