//! In-memory store of open document texts, keyed by URI.
//!
//! Synchronization is full-content: every change replaces the whole text,
//! so the last content change in a `didChange` batch wins.

use std::collections::HashMap;
use std::sync::Mutex;

pub struct DocumentStore {
    documents: Mutex<HashMap<String, String>>,
    max_documents: usize,
}

impl DocumentStore {
    pub fn new(max_documents: usize) -> Self {
        DocumentStore {
            documents: Mutex::new(HashMap::new()),
            max_documents,
        }
    }

    pub fn open(&self, uri: &str, text: String) {
        let mut documents = self.lock();
        documents.insert(uri.to_string(), text);
        if documents.len() > self.max_documents {
            log::warn!(
                "document cache holds {} entries, above the configured limit of {}",
                documents.len(),
                self.max_documents
            );
        }
    }

    pub fn update(&self, uri: &str, text: String) {
        self.lock().insert(uri.to_string(), text);
    }

    pub fn close(&self, uri: &str) {
        self.lock().remove(uri);
    }

    pub fn text(&self, uri: &str) -> Option<String> {
        self.lock().get(uri).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}
