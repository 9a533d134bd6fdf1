use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::directory::{PersonDirectory, display_name};
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceView, Justification, JustificationStatus};
use crate::notify::{NotificationSink, Recipient};
use crate::store::AttendanceStore;

pub const FORCE_APPROVE_COMMENT: &str = "administratively authorized";

/// Justification and disposition of learner absences and late arrivals.
///
/// ```text
/// TO_JUSTIFY | PENDING | APPROVED | REJECTED --submit--> PENDING
/// PENDING | TO_JUSTIFY --dispose--> APPROVED | REJECTED
/// any --force_approve--> APPROVED
/// ```
pub struct JustificationWorkflow {
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn PersonDirectory>,
    notifier: Arc<dyn NotificationSink>,
}

impl JustificationWorkflow {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        directory: Arc<dyn PersonDirectory>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
        }
    }

    pub async fn record(&self, id: Uuid) -> Result<AttendanceRecord, AttendanceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AttendanceError::record_not_found(id))
    }

    /// The record with its person populated.
    pub async fn view(&self, id: Uuid) -> Result<AttendanceView, AttendanceError> {
        let record = self.record(id).await?;
        Ok(self.populate(record).await)
    }

    /// Stores the learner's explanation and puts the record back in the
    /// review queue, whatever its previous status.
    #[instrument(name = "submit_justification", skip(self, text, document_url))]
    pub async fn submit(
        &self,
        id: Uuid,
        text: String,
        document_url: Option<String>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let record = self.record(id).await?;
        learner_justification(&record)?;

        let text = Some(text).filter(|t| !t.trim().is_empty());
        let document_url = document_url.filter(|d| !d.trim().is_empty());
        if text.is_none() && document_url.is_none() {
            return Err(AttendanceError::PreconditionFailed(
                "A justification text or a supporting document is required".into(),
            ));
        }

        let updated = self
            .store
            .submit_justification(id, text, document_url)
            .await?
            .ok_or_else(|| AttendanceError::record_not_found(id))?;
        info!(person_id = updated.person_id, date = %updated.date, "Justification submitted");

        let person = self.directory.find(updated.person()).await.ok().flatten();
        let message = format!(
            "{} submitted a justification for {}",
            display_name(person.as_ref(), updated.person()),
            updated.date.format("%d/%m/%Y")
        );
        self.send(Recipient::Admins, message).await;

        Ok(updated)
    }

    /// Records an administrator's decision on a submitted justification. The
    /// decision only applies to the submission that was read; if the record
    /// changed in between, nothing is written.
    #[instrument(name = "dispose_justification", skip(self, comment))]
    pub async fn dispose(
        &self,
        id: Uuid,
        status: JustificationStatus,
        comment: Option<String>,
    ) -> Result<AttendanceView, AttendanceError> {
        if !matches!(
            status,
            JustificationStatus::Approved | JustificationStatus::Rejected
        ) {
            return Err(AttendanceError::InvalidTransition(format!(
                "A disposition must be APPROVED or REJECTED, got {}",
                status
            )));
        }

        let record = self.record(id).await?;
        let current = learner_justification(&record)?;

        if status == JustificationStatus::Approved && current.status == JustificationStatus::Approved
        {
            return Err(already_approved());
        }
        if !current.has_evidence() {
            return Err(AttendanceError::PreconditionFailed(
                "Nothing to evaluate: no justification or document was submitted".into(),
            ));
        }

        let updated = match self
            .store
            .set_disposition(id, Some(current), status, comment)
            .await?
        {
            Some(updated) => updated,
            None => return Err(self.stale_disposition(id, status).await),
        };
        info!(person_id = updated.person_id, %status, "Justification disposed");

        let view = self.populate(updated).await;
        let message = format!(
            "Your justification for {} was {}",
            view.record.date.format("%d/%m/%Y"),
            match status {
                JustificationStatus::Approved => "approved",
                _ => "rejected",
            }
        );
        self.send(Recipient::Person(view.record.person()), message)
            .await;

        Ok(view)
    }

    /// Approves without requiring any evidence.
    #[instrument(name = "force_approve", skip(self))]
    pub async fn force_approve(&self, id: Uuid) -> Result<AttendanceView, AttendanceError> {
        let record = self.record(id).await?;
        learner_justification(&record)?;

        let updated = self
            .store
            .set_disposition(
                id,
                None,
                JustificationStatus::Approved,
                Some(FORCE_APPROVE_COMMENT.to_string()),
            )
            .await?
            .ok_or_else(|| AttendanceError::record_not_found(id))?;
        warn!(person_id = updated.person_id, date = %updated.date, "Attendance force-approved");
        Ok(self.populate(updated).await)
    }

    /// Error for a disposition whose compare-and-set missed.
    async fn stale_disposition(&self, id: Uuid, status: JustificationStatus) -> AttendanceError {
        let latest = match self.record(id).await {
            Ok(latest) => latest,
            Err(e) => return e,
        };
        match latest.justification() {
            Some(j)
                if status == JustificationStatus::Approved
                    && j.status == JustificationStatus::Approved =>
            {
                already_approved()
            }
            _ => AttendanceError::InvalidTransition(
                "The justification changed while it was being reviewed".into(),
            ),
        }
    }

    /// The write already happened, so a failed person lookup only leaves
    /// `person` empty.
    async fn populate(&self, record: AttendanceRecord) -> AttendanceView {
        let person = match self.directory.find(record.person()).await {
            Ok(person) => person,
            Err(e) => {
                warn!(error = %e, person_id = record.person_id, "Person lookup failed");
                None
            }
        };
        AttendanceView { record, person }
    }

    async fn send(&self, recipient: Recipient, message: String) {
        if let Err(e) = self.notifier.notify(recipient, message).await {
            warn!(error = %e, ?recipient, "Notification delivery failed");
        }
    }
}

fn already_approved() -> AttendanceError {
    AttendanceError::InvalidTransition("This attendance is already approved".into())
}

fn learner_justification(record: &AttendanceRecord) -> Result<&Justification, AttendanceError> {
    record.justification().ok_or_else(|| {
        AttendanceError::InvalidTransition(
            "Coach attendance has no justification workflow".into(),
        )
    })
}
