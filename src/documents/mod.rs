use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ AppError, Result };
use crate::models::files::StoredFile;
use crate::provider::AssistantApi;

/// Documents indexed for the assistant's file search.
pub struct DocumentStore {
    api: Arc<dyn AssistantApi>,
}

impl DocumentStore {
    pub fn new(api: Arc<dyn AssistantApi>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<StoredFile>> {
        self.api.list_files().await
    }

    pub async fn upload(&self, path: &Path) -> Result<StoredFile> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Validation(format!("Ruta de archivo inválida: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        info!("Uploading {} ({} bytes)", name, bytes.len());
        self.api.create_file(&name, bytes).await
    }

    /// Detaches the document from the store. The uploaded file object itself is kept.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        if file_id.trim().is_empty() {
            return Err(AppError::Validation("Falta el identificador del archivo".to_string()));
        }
        self.api.delete_file(file_id).await
    }
}

/// Case-insensitive substring match on file names. An empty term keeps everything.
pub fn search<'a>(files: &'a [StoredFile], term: &str) -> Vec<&'a StoredFile> {
    let term = term.trim().to_lowercase();
    files
        .iter()
        .filter(|f| term.is_empty() || f.name.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, name: &str) -> StoredFile {
        StoredFile { id: id.into(), name: name.into(), size: 10, created_at: 0 }
    }

    #[test]
    fn search_ignores_case() {
        let files = vec![file("a", "Informe-Anual.pdf"), file("b", "notas.txt")];
        let hits = search(&files, "informe");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
        assert_eq!(search(&files, "TXT")[0].id, "b");
    }

    #[test]
    fn blank_search_keeps_all() {
        let files = vec![file("a", "x"), file("b", "y")];
        assert_eq!(search(&files, "  ").len(), 2);
    }

    #[test]
    fn placeholder_uses_short_id() {
        let f = StoredFile::placeholder("file-abcdef123456", 42);
        assert_eq!(f.name, "File-file-abc");
        assert_eq!(f.size, 0);
        assert_eq!(f.created_at, 42);
    }
}
