//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{
    config::Config,
    db::{AuditSink, Store},
    services::{AttributionStore, AuditLog, ContestService, CorrectionWorkflow, SubmissionService},
    storage::FileStore,
    utils::crypto::PathCipher,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    config: Config,
    audit: Arc<AuditLog>,
    contests: ContestService,
    submissions: SubmissionService,
    attributions: AttributionStore,
    workflow: CorrectionWorkflow,
}

impl AppState {
    /// Wire every service onto one store, audit sink, cipher and file store
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        audit_sink: Arc<dyn AuditSink>,
        cipher: PathCipher,
        files: Arc<dyn FileStore>,
    ) -> Self {
        let audit = Arc::new(AuditLog::new(audit_sink));
        let cipher = Arc::new(cipher);

        Self {
            inner: Arc::new(AppStateInner {
                contests: ContestService::new(store.clone(), audit.clone()),
                submissions: SubmissionService::new(
                    store.clone(),
                    audit.clone(),
                    cipher,
                    files,
                    config.workflow.clone(),
                ),
                attributions: AttributionStore::new(store.clone(), audit.clone()),
                workflow: CorrectionWorkflow::new(
                    store,
                    audit.clone(),
                    config.workflow.grading_scale,
                ),
                audit,
                config,
            }),
        }
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn audit(&self) -> &AuditLog {
        &self.inner.audit
    }

    pub fn contests(&self) -> &ContestService {
        &self.inner.contests
    }

    pub fn submissions(&self) -> &SubmissionService {
        &self.inner.submissions
    }

    pub fn attributions(&self) -> &AttributionStore {
        &self.inner.attributions
    }

    pub fn workflow(&self) -> &CorrectionWorkflow {
        &self.inner.workflow
    }
}
