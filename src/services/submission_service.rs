//! Submission service
//!
//! Deposits, file replacement and file access. Plaintext paths only exist
//! inside this service and in the [`FileAccess::Available`] result of an
//! authorized download; everything persisted holds the sealed form.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::WorkflowConfig,
    db::Store,
    error::{AppError, AppResult},
    models::{
        ActorContext, AuditAction, Correction, FileReplacement, ModificationRecord, NewSubmission,
        RejectionRecord, Role, Submission, SubmissionStatus,
    },
    storage::FileStore,
    utils::{
        crypto::PathCipher,
        validation::{normalize_comment, validate_file_path},
    },
};

use super::AuditLog;

/// Outcome of opening a submission's file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileAccess {
    Available { path: String, size: u64 },
    Inaccessible { reason: String },
}

/// Presentation view of a submission, without any file reference
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    pub id: Uuid,
    pub anonymous_id: String,
    pub contest_id: Uuid,
    pub status: SubmissionStatus,
    pub final_score: Option<f64>,
    pub deposited_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_available: bool,
}

/// Everything that ever happened to a submission's file and grades
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionHistory {
    pub submission_id: Uuid,
    pub modifications: Vec<ModificationRecord>,
    pub corrections: Vec<Correction>,
    pub rejections: Vec<RejectionRecord>,
}

/// Submission service for business logic
pub struct SubmissionService {
    store: Arc<dyn Store>,
    audit: Arc<AuditLog>,
    cipher: Arc<PathCipher>,
    files: Arc<dyn FileStore>,
    workflow: WorkflowConfig,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn Store>,
        audit: Arc<AuditLog>,
        cipher: Arc<PathCipher>,
        files: Arc<dyn FileStore>,
        workflow: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            audit,
            cipher,
            files,
            workflow,
        }
    }

    /// Deposit a file already written to the file store.
    ///
    /// The path is sealed and the submission gets a fresh anonymous id,
    /// minted again whenever it collides with a stored one.
    pub async fn deposit(
        &self,
        actor: &ActorContext,
        contest_id: Uuid,
        plain_path: &str,
    ) -> AppResult<Submission> {
        actor.require_role(Role::Candidate)?;

        let contest = self
            .store
            .find_contest(contest_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;
        let now = Utc::now();
        if !contest.accepts_deposits(now) {
            return Err(AppError::Validation(
                "Contest is not accepting deposits".to_string(),
            ));
        }

        self.ensure_file_present(plain_path).await?;
        let encrypted_path = self.seal(plain_path)?;

        for attempt in 1..=self.workflow.anonymous_id_max_attempts {
            let anonymous_id = self.cipher.new_anonymous_id(&contest_id);
            if self.store.anonymous_id_exists(&anonymous_id).await? {
                tracing::debug!(attempt, "Anonymous id collision, retrying");
                continue;
            }

            let created = self
                .store
                .create_submission(&NewSubmission {
                    anonymous_id,
                    encrypted_path: encrypted_path.clone(),
                    contest_id,
                    candidate_id: actor.actor_id,
                    deposited_at: now,
                })
                .await;

            match created {
                Ok(submission) => {
                    tracing::info!(
                        submission_id = %submission.id,
                        anonymous_id = %submission.anonymous_id,
                        contest_id = %contest_id,
                        "Submission deposited"
                    );
                    self.audit
                        .record(
                            actor,
                            AuditAction::SubmissionDeposited,
                            format!("submission {}", submission.anonymous_id),
                        )
                        .await;
                    return Ok(submission);
                }
                Err(e) if e.is_retryable() => {
                    tracing::debug!(attempt, "Anonymous id taken concurrently, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::error!(
            contest_id = %contest_id,
            attempts = self.workflow.anonymous_id_max_attempts,
            "Could not mint a unique anonymous id"
        );
        Err(AppError::ConcurrentModification {
            subject: "anonymous identifier".to_string(),
        })
    }

    /// Replace the deposited file while nobody has graded it yet
    pub async fn replace_file(
        &self,
        actor: &ActorContext,
        submission_id: Uuid,
        new_plain_path: &str,
        reason: &str,
    ) -> AppResult<Submission> {
        actor.require_role(Role::Candidate)?;

        let submission = self.find(submission_id).await?;
        if submission.candidate_id != actor.actor_id {
            return Err(AppError::Forbidden(
                "Cannot modify another candidate's submission".to_string(),
            ));
        }
        if !submission.status.allows_file_replacement() {
            return Err(AppError::LockedSubmission {
                submission_id,
                status: submission.status,
            });
        }

        let reason = normalize_comment(reason)
            .map_err(|e| AppError::Validation(e.to_string()))?
            .ok_or_else(|| AppError::Validation("A reason is required".to_string()))?;
        self.ensure_file_present(new_plain_path).await?;

        let (updated, _record) = self
            .store
            .replace_submission_file(&FileReplacement {
                submission_id,
                new_encrypted_path: self.seal(new_plain_path)?,
                reason,
                modified_by: actor.actor_id,
                modified_at: Utc::now(),
            })
            .await?;

        tracing::info!(submission_id = %submission_id, "Submission file replaced");
        self.audit
            .record(
                actor,
                AuditAction::FileReplaced,
                format!("submission {}", updated.anonymous_id),
            )
            .await;

        Ok(updated)
    }

    /// Decrypt and check the submission's file for download.
    ///
    /// A failed decryption or a missing file is reported as
    /// [`FileAccess::Inaccessible`]; the submission itself stays usable.
    pub async fn open_file(
        &self,
        actor: &ActorContext,
        submission_id: Uuid,
    ) -> AppResult<FileAccess> {
        let submission = self.find(submission_id).await?;
        self.authorize(actor, &submission).await?;

        let access = self.check_file(&submission).await;
        let subject = format!("submission {}", submission.anonymous_id);
        match &access {
            FileAccess::Available { .. } => {
                self.audit
                    .record(actor, AuditAction::FileAccessed, subject)
                    .await;
            }
            FileAccess::Inaccessible { reason } => {
                tracing::warn!(
                    submission_id = %submission_id,
                    reason = %reason,
                    "Submission file inaccessible"
                );
                self.audit
                    .record(
                        actor,
                        AuditAction::FileAccessFailed,
                        format!("{}: {}", subject, reason),
                    )
                    .await;
            }
        }

        Ok(access)
    }

    /// Presentation view of a submission
    pub async fn view(
        &self,
        actor: &ActorContext,
        submission_id: Uuid,
    ) -> AppResult<SubmissionView> {
        let submission = self.find(submission_id).await?;
        self.authorize(actor, &submission).await?;

        let file_available = matches!(
            self.check_file(&submission).await,
            FileAccess::Available { .. }
        );
        Ok(SubmissionView {
            id: submission.id,
            anonymous_id: submission.anonymous_id,
            contest_id: submission.contest_id,
            status: submission.status,
            final_score: submission.final_score,
            deposited_at: submission.deposited_at,
            updated_at: submission.updated_at,
            file_available,
        })
    }

    /// File replacements, corrections and rejections of a submission (admin)
    pub async fn history(
        &self,
        actor: &ActorContext,
        submission_id: Uuid,
    ) -> AppResult<SubmissionHistory> {
        actor.require_admin()?;
        self.find(submission_id).await?;

        Ok(SubmissionHistory {
            submission_id,
            modifications: self.store.list_modifications(submission_id).await?,
            corrections: self.store.list_corrections(submission_id).await?,
            rejections: self.store.list_rejections(submission_id).await?,
        })
    }

    async fn find(&self, submission_id: Uuid) -> AppResult<Submission> {
        self.store
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }

    /// Admins, the owning candidate and the attributed corrector may look
    async fn authorize(&self, actor: &ActorContext, submission: &Submission) -> AppResult<()> {
        let allowed = match actor.role {
            Role::Admin => true,
            Role::Candidate => submission.candidate_id == actor.actor_id,
            Role::Corrector => self
                .store
                .find_attribution(submission.id)
                .await?
                .is_some_and(|a| a.corrector_id == actor.actor_id),
        };

        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "No access to this submission".to_string(),
            ))
        }
    }

    async fn check_file(&self, submission: &Submission) -> FileAccess {
        let path = match self.cipher.decrypt(&submission.encrypted_path) {
            Ok(path) => path,
            Err(e) => {
                return FileAccess::Inaccessible {
                    reason: e.to_string(),
                };
            }
        };

        match self.files.exists(&path).await {
            Ok(true) => match self.files.size(&path).await {
                Ok(size) => FileAccess::Available { path, size },
                Err(e) => FileAccess::Inaccessible {
                    reason: e.to_string(),
                },
            },
            Ok(false) => FileAccess::Inaccessible {
                reason: "file is missing from the store".to_string(),
            },
            Err(e) => FileAccess::Inaccessible {
                reason: e.to_string(),
            },
        }
    }

    async fn ensure_file_present(&self, plain_path: &str) -> AppResult<()> {
        validate_file_path(plain_path).map_err(|e| AppError::Validation(e.to_string()))?;

        let exists = self
            .files
            .exists(plain_path)
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if !exists {
            return Err(AppError::Validation(
                "File not found in the file store".to_string(),
            ));
        }
        Ok(())
    }

    fn seal(&self, plain_path: &str) -> AppResult<String> {
        self.cipher
            .encrypt(plain_path)
            .map_err(|e| AppError::Internal(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{ContestStatus, NewAttribution, NewContest};
    use crate::storage::{MockFileStore, StorageError};
    use chrono::Duration;

    const KEY: [u8; 32] = [5u8; 32];

    struct Fixture {
        store: Arc<MemoryStore>,
        service: SubmissionService,
        contest_id: Uuid,
        candidate: ActorContext,
    }

    fn files_present(size: u64) -> MockFileStore {
        let mut files = MockFileStore::new();
        files.expect_exists().returning(|_| Ok(true));
        files.expect_size().returning(move |_| Ok(size));
        files
    }

    async fn fixture_with(files: MockFileStore, cipher: PathCipher) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(AuditLog::new(store.clone()));
        let now = Utc::now();
        let contest = store
            .create_contest(&NewContest {
                title: "Concours".to_string(),
                description: None,
                opens_at: now - Duration::hours(1),
                closes_at: now + Duration::hours(1),
                grading_grid: None,
            })
            .await
            .unwrap();
        store
            .update_contest_status(contest.id, ContestStatus::Open)
            .await
            .unwrap();

        Fixture {
            service: SubmissionService::new(
                store.clone(),
                audit,
                Arc::new(cipher),
                Arc::new(files),
                WorkflowConfig::default(),
            ),
            store,
            contest_id: contest.id,
            candidate: ActorContext::candidate(Uuid::new_v4()),
        }
    }

    fn cipher() -> PathCipher {
        PathCipher::new([("k1", &KEY[..])], "k1").unwrap()
    }

    async fn fixture() -> Fixture {
        fixture_with(files_present(2048), cipher()).await
    }

    async fn audit_actions(store: &MemoryStore) -> Vec<AuditAction> {
        crate::db::AuditSink::recent(store, 50)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect()
    }

    #[tokio::test]
    async fn test_deposit_seals_path_and_mints_anonymous_id() {
        let f = fixture().await;
        let submission = f
            .service
            .deposit(&f.candidate, f.contest_id, "2026/copie-42.pdf")
            .await
            .unwrap();

        assert_eq!(submission.status, SubmissionStatus::Pending);
        assert!(submission.anonymous_id.starts_with("ANO-"));
        assert!(!submission.encrypted_path.contains("copie-42"));
        assert_eq!(
            cipher().decrypt(&submission.encrypted_path).unwrap(),
            "2026/copie-42.pdf"
        );
        assert!(audit_actions(&f.store)
            .await
            .contains(&AuditAction::SubmissionDeposited));
    }

    #[tokio::test]
    async fn test_one_submission_per_candidate_and_contest() {
        let f = fixture().await;
        f.service
            .deposit(&f.candidate, f.contest_id, "a.pdf")
            .await
            .unwrap();

        let err = f
            .service
            .deposit(&f.candidate, f.contest_id, "b.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_deposit_requires_open_contest_and_existing_file() {
        let mut files = MockFileStore::new();
        files.expect_exists().returning(|_| Ok(false));
        let f = fixture_with(files, cipher()).await;

        let err = f
            .service
            .deposit(&f.candidate, f.contest_id, "absent.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        f.store
            .update_contest_status(f.contest_id, ContestStatus::Closed)
            .await
            .unwrap();
        let err = f
            .service
            .deposit(&f.candidate, f.contest_id, "absent.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_replace_file_records_history() {
        let f = fixture().await;
        let submission = f
            .service
            .deposit(&f.candidate, f.contest_id, "v1.pdf")
            .await
            .unwrap();

        let updated = f
            .service
            .replace_file(&f.candidate, submission.id, "v2.pdf", "wrong version uploaded")
            .await
            .unwrap();

        assert_eq!(updated.anonymous_id, submission.anonymous_id);
        assert_eq!(cipher().decrypt(&updated.encrypted_path).unwrap(), "v2.pdf");

        let history = f.store.list_modifications(submission.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].previous_encrypted_path, submission.encrypted_path);
        assert_eq!(history[0].reason, "wrong version uploaded");
    }

    #[tokio::test]
    async fn test_replace_file_of_graded_submission_is_locked() {
        let f = fixture().await;
        let submission = f
            .service
            .deposit(&f.candidate, f.contest_id, "v1.pdf")
            .await
            .unwrap();

        // Drive the submission to graded through the store
        let corrector = Uuid::new_v4();
        f.store
            .create_attribution(&NewAttribution {
                submission_id: submission.id,
                corrector_id: corrector,
                assigned_by: Uuid::new_v4(),
                assigned_at: Utc::now(),
            })
            .await
            .unwrap();
        let correction = f
            .store
            .submit_correction(&crate::models::NewCorrection {
                submission_id: submission.id,
                corrector_id: corrector,
                evaluation_json: r#"{"total_score": 12}"#.to_string(),
                submitted_at: Utc::now(),
                scored_against: None,
            })
            .await
            .unwrap();
        f.store
            .validate_correction(&crate::models::CorrectionApproval {
                correction_id: correction.id,
                validated_by: Uuid::new_v4(),
                validated_at: Utc::now(),
                final_score: 12.0,
            })
            .await
            .unwrap();

        let err = f
            .service
            .replace_file(&f.candidate, submission.id, "v2.pdf", "late fix")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::LockedSubmission { status: SubmissionStatus::Graded, .. }
        ));
        assert!(f.store.list_modifications(submission.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_candidates_cannot_replace() {
        let f = fixture().await;
        let submission = f
            .service
            .deposit(&f.candidate, f.contest_id, "v1.pdf")
            .await
            .unwrap();

        let intruder = ActorContext::candidate(Uuid::new_v4());
        let err = f
            .service
            .replace_file(&intruder, submission.id, "v2.pdf", "mine now")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_open_file_is_audited() {
        let f = fixture().await;
        let submission = f
            .service
            .deposit(&f.candidate, f.contest_id, "copie.pdf")
            .await
            .unwrap();

        let admin = ActorContext::admin(Uuid::new_v4());
        let access = f.service.open_file(&admin, submission.id).await.unwrap();
        assert_eq!(
            access,
            FileAccess::Available {
                path: "copie.pdf".to_string(),
                size: 2048
            }
        );
        assert!(audit_actions(&f.store).await.contains(&AuditAction::FileAccessed));
    }

    #[tokio::test]
    async fn test_rotated_key_degrades_to_inaccessible() {
        let f = fixture().await;
        let submission = f
            .service
            .deposit(&f.candidate, f.contest_id, "copie.pdf")
            .await
            .unwrap();

        // Same store, but the service now only knows a different key
        let rotated = PathCipher::new([("k2", &[8u8; 32][..])], "k2").unwrap();
        let audit = Arc::new(AuditLog::new(f.store.clone()));
        let service = SubmissionService::new(
            f.store.clone(),
            audit,
            Arc::new(rotated),
            Arc::new(files_present(1)),
            WorkflowConfig::default(),
        );

        let admin = ActorContext::admin(Uuid::new_v4());
        let access = service.open_file(&admin, submission.id).await.unwrap();
        assert!(matches!(access, FileAccess::Inaccessible { .. }));

        let view = service.view(&admin, submission.id).await.unwrap();
        assert!(!view.file_available);
        assert_eq!(view.anonymous_id, submission.anonymous_id);
        assert!(audit_actions(&f.store)
            .await
            .contains(&AuditAction::FileAccessFailed));
    }

    #[tokio::test]
    async fn test_storage_errors_degrade_to_inaccessible() {
        let mut files = MockFileStore::new();
        let mut first = true;
        files.expect_exists().returning(move |_| {
            if first {
                first = false;
                Ok(true)
            } else {
                Err(StorageError::Io(std::io::Error::other("disk offline")))
            }
        });
        let f = fixture_with(files, cipher()).await;
        let submission = f
            .service
            .deposit(&f.candidate, f.contest_id, "copie.pdf")
            .await
            .unwrap();

        let access = f
            .service
            .open_file(&f.candidate, submission.id)
            .await
            .unwrap();
        assert!(matches!(
            access,
            FileAccess::Inaccessible { reason } if reason.contains("disk offline")
        ));
    }

    #[tokio::test]
    async fn test_unattributed_corrector_cannot_open() {
        let f = fixture().await;
        let submission = f
            .service
            .deposit(&f.candidate, f.contest_id, "copie.pdf")
            .await
            .unwrap();

        let corrector = ActorContext::corrector(Uuid::new_v4());
        assert!(matches!(
            f.service.open_file(&corrector, submission.id).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
