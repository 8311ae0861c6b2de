use serde::{ Deserialize, Serialize };

/// Metadata of a document held by the remote store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub created_at: i64,
}

impl StoredFile {
    /// Record used when the details of a listed file cannot be fetched.
    pub fn placeholder(id: &str, created_at: i64) -> Self {
        let short: String = id.chars().take(8).collect();
        Self {
            id: id.to_string(),
            name: format!("File-{}", short),
            size: 0,
            created_at,
        }
    }
}
