use serde::{Deserialize, Serialize};

/// Project entry from the project directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub created_ts: i64,
}
