use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use super::{suggest_category_and_priority, Complaint, NewComplaint};
use crate::priority::Priority;
use crate::session::Session;
use crate::store::{ComplaintStore, ImageStorage, StoreError};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("an image was attached but no image storage is configured")]
    NoImageStorage,

    #[error("image upload failed: {0}")]
    Upload(#[source] StoreError),

    #[error("could not save the complaint: {0}")]
    Store(#[source] StoreError),
}

impl SubmissionError {
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            SubmissionError::Upload(e) | SubmissionError::Store(e) => Some(e),
            _ => None,
        }
    }
}

/// What the user filled in on the submission form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionForm {
    pub title: String,
    pub description: String,
    /// Left empty, the keyword suggestion decides
    pub category: Option<String>,
    /// Left empty, the keyword suggestion decides
    pub priority: Option<Priority>,
    pub image: Option<PathBuf>,
}

impl SubmissionForm {
    fn validate(&self) -> Result<(), SubmissionError> {
        if self.title.trim().is_empty() {
            return Err(SubmissionError::MissingField("title"));
        }
        if self.description.trim().is_empty() {
            return Err(SubmissionError::MissingField("description"));
        }
        Ok(())
    }

    /// Form contents as a row, filling blanks from the suggestion rules
    pub fn to_new_complaint(&self, image_url: Option<String>) -> NewComplaint {
        let suggestion =
            suggest_category_and_priority(&format!("{} {}", self.title, self.description));

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(suggestion.category);

        NewComplaint::new(self.title.trim(), self.description.trim())
            .with_category(category)
            .with_priority(self.priority.unwrap_or(suggestion.priority))
            .with_image_url(image_url)
    }
}

/// File a new complaint in OPEN for the signed-in user.
///
/// The image, if any, is uploaded first; a failed upload stops the submission.
pub async fn submit_complaint(
    store: &dyn ComplaintStore,
    images: Option<&ImageStorage>,
    session: &Session,
    form: &SubmissionForm,
) -> Result<Complaint, SubmissionError> {
    form.validate()?;

    let image_url = match &form.image {
        Some(path) => {
            let storage = images.ok_or(SubmissionError::NoImageStorage)?;
            Some(storage.upload(path).await.map_err(SubmissionError::Upload)?)
        }
        None => None,
    };

    let new_complaint = form
        .to_new_complaint(image_url)
        .submitted_by(Some(session.user_id.clone()), session.email.clone());

    let complaint = store
        .insert(&new_complaint)
        .await
        .map_err(SubmissionError::Store)?;

    info!(
        complaint_id = %complaint.id,
        category = %complaint.category,
        priority = %complaint.priority,
        evidence = complaint.has_evidence(),
        "Complaint submitted"
    );
    Ok(complaint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complaints::ComplaintStatus;
    use crate::session::Role;
    use crate::store::InMemoryComplaintStore;

    fn session() -> Session {
        Session {
            access_token: "jwt".into(),
            user_id: "u-1".into(),
            email: Some("me@x.io".into()),
            role: Role::User,
            expires_at: None,
        }
    }

    fn form(title: &str, description: &str) -> SubmissionForm {
        SubmissionForm {
            title: title.into(),
            description: description.into(),
            ..SubmissionForm::default()
        }
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let store = InMemoryComplaintStore::new();

        let err = submit_complaint(&store, None, &session(), &form("  ", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::MissingField("title")));

        let err = submit_complaint(&store, None, &session(), &form("Title", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::MissingField("description")));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_submission_is_open_and_owned() {
        let store = InMemoryComplaintStore::new();

        let complaint = submit_complaint(
            &store,
            None,
            &session(),
            &form("Kitchen tap", "water leak under the sink"),
        )
        .await
        .unwrap();

        assert_eq!(complaint.status, ComplaintStatus::Open);
        assert_eq!(complaint.user_id.as_deref(), Some("u-1"));
        assert_eq!(complaint.user_email.as_deref(), Some("me@x.io"));
        // blanks filled in by the keyword rules
        assert_eq!(complaint.category, "Plumbing");
        assert_eq!(complaint.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_explicit_choices_win_over_suggestion() {
        let store = InMemoryComplaintStore::new();
        let mut form = form("Kitchen tap", "water leak");
        form.category = Some("Water".into());
        form.priority = Some(Priority::Medium);

        let complaint = submit_complaint(&store, None, &session(), &form)
            .await
            .unwrap();
        assert_eq!(complaint.category, "Water");
        assert_eq!(complaint.priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_image_without_storage_is_rejected() {
        let store = InMemoryComplaintStore::new();
        let mut form = form("Broken light", "dark corridor");
        form.image = Some(PathBuf::from("photo.jpg"));

        let err = submit_complaint(&store, None, &session(), &form)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::NoImageStorage));
        assert!(store.is_empty().await);
    }
}
