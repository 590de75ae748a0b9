use anyhow::Result;

use super::{report_store_error, AppContext, Command};
use crate::complaints::{
    submit_complaint, suggest_category_and_priority, SubmissionError, SubmissionForm, CATEGORIES,
};

pub struct SubmitCommand {
    pub form: SubmissionForm,
}

impl Command for SubmitCommand {
    async fn execute(&self) -> Result<()> {
        let ctx = AppContext::load()?;
        let session = ctx.session().await?;

        if let Some(category) = &self.form.category {
            if !CATEGORIES.iter().any(|c| c.eq_ignore_ascii_case(category)) {
                println!("ℹ️  '{}' is not one of {}; filing it anyway", category, CATEGORIES.join(", "));
            }
        }

        println!("📝 Filing complaint: {}", self.form.title);
        if let Some(image) = &self.form.image {
            println!("   📎 Uploading {}...", image.display());
        }

        let store = ctx.store(&session).await?;
        let images = ctx.images(&session)?;

        match submit_complaint(store.as_ref(), images.as_ref(), &session, &self.form).await {
            Ok(complaint) => {
                println!("✅ Complaint #{} filed", complaint.id);
                println!("   🏷️  Category: {}", complaint.category);
                println!("   {} Priority: {}", complaint.priority.emoji(), complaint.priority);
                println!("   {} Status: {}", complaint.status.emoji(), complaint.status.label());
                if let Some(url) = &complaint.image_url {
                    println!("   🖼️  Evidence: {url}");
                }
                Ok(())
            }
            Err(e) => {
                match e.store_error() {
                    Some(store_error) => report_store_error("Submission failed", store_error),
                    None => println!("❌ {e}"),
                }
                if matches!(e, SubmissionError::NoImageStorage) {
                    println!("   💡 Images can only be attached with the supabase backend");
                }
                Err(e.into())
            }
        }
    }
}

pub struct SuggestCommand {
    pub text: String,
}

impl Command for SuggestCommand {
    async fn execute(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            anyhow::bail!("nothing to suggest from; pass the complaint text");
        }

        let suggestion = suggest_category_and_priority(&self.text);
        println!("🤖 Suggestion");
        println!("   🏷️  Category: {}", suggestion.category);
        println!("   {} Priority: {}", suggestion.priority.emoji(), suggestion.priority);
        Ok(())
    }
}
