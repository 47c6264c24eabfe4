use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use tenantlens_core::DocumentAnalysis;

use crate::types::{DocumentStatistics, StoredDocument};

/// Persistence seam for analyzed documents.
///
/// Every read and write is scoped to an owner: a document belonging to
/// someone else behaves exactly like a missing one.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Store a new analysis and return its id.
    async fn save(
        &self,
        owner_id: &str,
        filename: &str,
        extracted_text: &str,
        analysis: DocumentAnalysis,
    ) -> Result<u64>;

    async fn get(&self, id: u64, owner_id: &str) -> Result<Option<StoredDocument>>;

    /// All of an owner's documents, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoredDocument>>;

    /// Replace the analysis of an existing document. Returns false when not found.
    async fn update_analysis(
        &self,
        id: u64,
        owner_id: &str,
        analysis: DocumentAnalysis,
    ) -> Result<bool>;

    /// Returns false when not found.
    async fn delete(&self, id: u64, owner_id: &str) -> Result<bool>;

    async fn statistics(&self, owner_id: &str) -> Result<DocumentStatistics>;
}

/// Process-local repository for development and tests.
pub struct InMemoryDocumentRepository {
    documents: RwLock<HashMap<u64, StoredDocument>>,
    next_id: AtomicU64,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryDocumentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn save(
        &self,
        owner_id: &str,
        filename: &str,
        extracted_text: &str,
        analysis: DocumentAnalysis,
    ) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let doc = StoredDocument {
            id,
            owner_id: owner_id.to_string(),
            filename: filename.to_string(),
            extracted_text: extracted_text.to_string(),
            analysis,
            created_at: now,
            updated_at: now,
        };

        self.documents.write().await.insert(id, doc);
        info!(id, owner = %owner_id, filename, "Saved document analysis");
        Ok(id)
    }

    async fn get(&self, id: u64, owner_id: &str) -> Result<Option<StoredDocument>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&id)
            .filter(|doc| doc.owner_id == owner_id)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoredDocument>> {
        let documents = self.documents.read().await;
        let mut owned: Vec<StoredDocument> = documents
            .values()
            .filter(|doc| doc.owner_id == owner_id)
            .cloned()
            .collect();
        // Ids break ties between documents saved within the same instant.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn update_analysis(
        &self,
        id: u64,
        owner_id: &str,
        analysis: DocumentAnalysis,
    ) -> Result<bool> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&id).filter(|doc| doc.owner_id == owner_id) {
            Some(doc) => {
                doc.analysis = analysis;
                doc.updated_at = Utc::now();
                debug!(id, "Updated document analysis");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: u64, owner_id: &str) -> Result<bool> {
        let mut documents = self.documents.write().await;
        if documents.get(&id).is_some_and(|doc| doc.owner_id == owner_id) {
            documents.remove(&id);
            info!(id, "Deleted document");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn statistics(&self, owner_id: &str) -> Result<DocumentStatistics> {
        let documents = self.documents.read().await;
        Ok(DocumentStatistics::compute(
            documents.values().filter(|doc| doc.owner_id == owner_id),
            Utc::now(),
        ))
    }
}
