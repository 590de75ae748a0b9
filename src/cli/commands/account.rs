use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use super::{report_session_error, report_store_error, AppContext, Command};
use crate::session::{Role, Session};
use crate::store::SignUpRequest;

pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl Command for LoginCommand {
    async fn execute(&self) -> Result<()> {
        let ctx = AppContext::load()?;
        println!("🔑 Signing in as {}...", self.email);

        let grant = match ctx
            .auth(None)?
            .sign_in_with_password(&self.email, &self.password)
            .await
        {
            Ok(grant) => grant,
            Err(e) => {
                report_store_error("Sign-in failed", &e);
                return Err(e.into());
            }
        };

        let session = Session::establish(&grant, &ctx.config.session.admin_emails, Utc::now());
        session.save(&ctx.config.session.file).await?;

        println!("✅ Signed in as {} ({})", session.display_name(), session.role);
        match session.role {
            Role::Admin => println!("💡 Run 'complaint-tracker admin' to review all complaints"),
            Role::User => println!("💡 Run 'complaint-tracker list' to see your complaints"),
        }
        Ok(())
    }
}

pub struct SignupCommand {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
}

impl SignupCommand {
    fn request(&self) -> Result<SignUpRequest> {
        for (field, value) in [
            ("email", &self.email),
            ("password", &self.password),
            ("first name", &self.first_name),
            ("last name", &self.last_name),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{field} is required");
            }
        }

        Ok(SignUpRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            role: if self.admin { "admin" } else { "user" }.to_string(),
        })
    }
}

impl Command for SignupCommand {
    async fn execute(&self) -> Result<()> {
        let request = self.request()?;
        let ctx = AppContext::load()?;
        println!("📝 Creating account for {}...", request.email);

        match ctx.auth(None)?.sign_up(&request).await {
            Ok(user) => {
                println!("✅ Account created ({})", user.id);
                println!("💡 Confirm your email if required, then run 'complaint-tracker login --email {}'", request.email);
                Ok(())
            }
            Err(e) => {
                report_store_error("Sign-up failed", &e);
                Err(e.into())
            }
        }
    }
}

pub struct LogoutCommand;

impl Command for LogoutCommand {
    async fn execute(&self) -> Result<()> {
        let ctx = AppContext::load()?;
        let path = &ctx.config.session.file;

        match Session::load(path).await {
            Ok(Some(session)) => {
                // Token revocation is best effort; the local session goes regardless
                let revoked = match ctx.auth(Some(&session)) {
                    Ok(auth) => auth.sign_out().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = revoked {
                    warn!(error = %e, "Server-side sign-out failed");
                }
            }
            Ok(None) => {
                println!("ℹ️  Not signed in");
                return Ok(());
            }
            Err(e) => warn!(error = %e, "Discarding unreadable session file"),
        }

        Session::clear(path).await?;
        println!("👋 Signed out");
        Ok(())
    }
}

pub struct WhoamiCommand;

impl Command for WhoamiCommand {
    async fn execute(&self) -> Result<()> {
        let ctx = AppContext::load()?;
        match Session::load_active(&ctx.config.session.file, Utc::now()).await {
            Ok(session) => {
                println!("👤 {}", session.display_name());
                println!("   🆔 User: {}", session.user_id);
                println!("   🎭 Role: {}", session.role);
                if let Some(expires_at) = session.expires_at {
                    println!("   ⏳ Expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
                }
                Ok(())
            }
            Err(e) => {
                report_session_error(&e);
                Err(e.into())
            }
        }
    }
}
