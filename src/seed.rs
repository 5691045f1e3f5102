use anyhow::{Context, anyhow};

use crate::{
    config::AppConfig,
    models::{NewUser, Role, normalize_email},
    password::hash_password,
    repository::RepositoryState,
};

/// ensure_admin
///
/// Makes sure the account named by `ADMIN_EMAIL`/`ADMIN_PASSWORD` exists, is active and
/// holds the admin role. An existing account is promoted and gets the configured password.
/// Does nothing unless both values are set.
pub async fn ensure_admin(repo: &RepositoryState, config: &AppConfig) -> anyhow::Result<()> {
    let (Some(raw_email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::debug!("No admin account configured; skipping seed");
        return Ok(());
    };

    let email = normalize_email(raw_email).map_err(|e| anyhow!("ADMIN_EMAIL: {e}"))?;
    let password_hash =
        hash_password(password).map_err(|e| anyhow!("hashing admin password: {e}"))?;

    match repo
        .find_user_by_email(&email)
        .await
        .context("looking up admin account")?
    {
        Some(user) => {
            repo.set_role(user.id, Role::Admin)
                .await
                .context("promoting admin account")?;
            repo.set_active(user.id, true)
                .await
                .context("activating admin account")?;
            repo.set_password(user.id, &password_hash)
                .await
                .context("resetting admin password")?;
            tracing::info!(user_id = %user.id, "Admin account refreshed");
        }
        None => {
            let user = repo
                .create_user(NewUser {
                    email,
                    full_name: Some("Administrator".to_string()),
                    phone_number: None,
                    password_hash,
                    role: Role::Admin,
                })
                .await
                .context("creating admin account")?;
            tracing::info!(user_id = %user.id, "Admin account created");
        }
    }
    Ok(())
}
