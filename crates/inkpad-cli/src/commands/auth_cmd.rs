use inkpad_core::auth::SignUpOutcome;

use crate::auth::{clear_stored_session, load_stored_session};
use crate::cli::AuthCommands;
use crate::commands::common::{
    apply_session_or_stay_local, mode_label, open_workspace, CliContext,
};
use crate::config_profiles::BackendSource;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, context: &CliContext) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email, password } => {
            let workspace = open_workspace(context).await?;
            if !workspace.session.is_configured() {
                return Err(CliError::AuthNotConfigured);
            }

            let user = workspace.session.sign_in(&email, &password).await?;
            apply_session_or_stay_local(&workspace.store, Some(user.clone())).await;

            let email_label = user.email.as_deref().unwrap_or("(no email)");
            println!(
                "Signed in profile '{}' as {email_label}",
                workspace.profile_name
            );
            Ok(())
        }
        AuthCommands::Signup { email, password } => {
            let workspace = open_workspace(context).await?;
            if !workspace.session.is_configured() {
                return Err(CliError::AuthNotConfigured);
            }

            match workspace.session.sign_up(&email, &password).await? {
                SignUpOutcome::SignedIn(session) => {
                    apply_session_or_stay_local(&workspace.store, Some(session.user)).await;
                    println!("Account created and signed in as {email}");
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!("Account created. Check {email} to confirm it, then run `inkpad auth login`.");
                }
            }
            Ok(())
        }
        AuthCommands::Status => {
            let workspace = open_workspace(context).await?;
            let mode = workspace.store.mode().await;

            match workspace.session.current_session() {
                Some(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!(
                        "Profile '{}' is signed in as {} (expires_at={})",
                        workspace.profile_name, email_label, session.expires_at
                    );
                }
                None => println!("Profile '{}' is not signed in.", workspace.profile_name),
            }
            let backend = match workspace.backend_source {
                BackendSource::Profile => "profile settings",
                BackendSource::Environment => "environment",
                BackendSource::None => "not configured",
            };
            println!("Backend: {backend}");
            println!("Mode: {}", mode_label(mode));
            Ok(())
        }
        AuthCommands::Logout => {
            let workspace = open_workspace(context).await?;
            if workspace.session.is_configured() {
                workspace.session.sign_out().await?;
            } else if load_stored_session(&workspace.profile_name)?.is_some() {
                clear_stored_session(&workspace.profile_name)?;
            }
            workspace.store.apply_session(None).await?;

            println!("Signed out profile '{}'", workspace.profile_name);
            Ok(())
        }
    }
}
