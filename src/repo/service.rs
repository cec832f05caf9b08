use crate::filter::FilterState;
use crate::models::{LeadRecord, Project};
use crate::pipeline::{LeadService, ProjectDirectory, ServiceError, ServiceFuture};
use crate::repo::{LeadRepo, ProjectRepo};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed system of record for leads and projects
pub struct SqliteLeadService {
    conn: Mutex<Connection>,
}

impl SqliteLeadService {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Direct access for setup and reporting outside the engine
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|err| err.into_inner())
    }
}

fn storage_error(err: anyhow::Error) -> ServiceError {
    ServiceError::Storage(format!("{:#}", err))
}

impl LeadService for SqliteLeadService {
    fn list(&self, filters: FilterState) -> ServiceFuture<'_, Vec<LeadRecord>> {
        Box::pin(async move {
            let now = chrono::Utc::now().timestamp();
            LeadRepo::list(&self.connection(), &filters, now).map_err(storage_error)
        })
    }

    fn update_stage(&self, id: String, stage: String) -> ServiceFuture<'_, ()> {
        Box::pin(async move {
            let updated = LeadRepo::update_stage(&self.connection(), &id, &stage).map_err(storage_error)?;
            if updated {
                Ok(())
            } else {
                Err(ServiceError::NotFound(id))
            }
        })
    }
}

impl ProjectDirectory for SqliteLeadService {
    fn list_projects(&self) -> ServiceFuture<'_, Vec<Project>> {
        Box::pin(async move { ProjectRepo::list(&self.connection()).map_err(storage_error) })
    }
}
