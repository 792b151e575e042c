//! Subcommands of the crm-auth tool.

use std::process::ExitCode;

use clap::Subcommand;
use crm_auth_adapter::{DashboardAuthProvider, Error, Result, SharedLocation};
use crm_auth_common::{AccessParams, Credentials, Location, RedirectSignal, SetPasswordParams};
use serde_json::json;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and cache the matching sale
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CRM_AUTH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Run the route guard for a dashboard URL
    Check {
        #[arg(long, default_value = "/", value_parser = parse_location)]
        url: Location,
    },
    /// Show the identity of the signed-in sale
    Identity,
    /// Ask whether the signed-in sale may perform an action on a resource
    CanAccess {
        #[arg(long)]
        resource: String,
        #[arg(long, default_value = "list")]
        action: String,
    },
    /// Send a password recovery email
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password from a recovery or invitation link
    SetPassword {
        #[arg(long, value_parser = parse_location)]
        url: Location,
        #[arg(long, env = "CRM_AUTH_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn parse_location(input: &str) -> std::result::Result<Location, String> {
    Location::parse(input).map_err(|e| format!("invalid URL {:?}: {}", input, e))
}

/// What a command ended with.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Done(String),
    Redirect(RedirectSignal),
    Denied(String),
}

impl Outcome {
    /// Print the outcome and map it to the process exit code.
    pub fn report(&self) -> ExitCode {
        match self {
            Outcome::Done(message) => {
                println!("{}", message);
                ExitCode::SUCCESS
            }
            Outcome::Redirect(signal) => {
                println!("{}", json!(signal));
                ExitCode::from(2)
            }
            Outcome::Denied(message) => {
                println!("{}", message);
                ExitCode::from(1)
            }
        }
    }
}

/// Run `command` against `provider`, pointing `location` at the URL the
/// command is about first.
pub async fn run<P: DashboardAuthProvider>(
    provider: &P,
    location: &SharedLocation,
    command: Command,
) -> Result<Outcome> {
    match command {
        Command::Login { email, password } => {
            let session = provider.login(&Credentials::new(email, password)).await?;
            let identity = provider.get_identity().await?;
            Ok(Outcome::Done(format!(
                "Signed in as {} ({})",
                identity.full_name,
                session.user.email.unwrap_or_default()
            )))
        }
        Command::Logout => {
            provider.logout().await?;
            Ok(Outcome::Done("Signed out".to_string()))
        }
        Command::Check { url } => {
            location.set(url.clone());
            match provider.check_auth(&json!({})).await {
                Ok(()) => Ok(Outcome::Done(format!("{} is accessible", url))),
                Err(Error::Redirect(signal)) => Ok(Outcome::Redirect(signal)),
                Err(Error::Unauthenticated) => Ok(Outcome::Denied("Not signed in".to_string())),
                Err(e) => Err(e),
            }
        }
        Command::Identity => {
            let identity = provider.get_identity().await?;
            Ok(Outcome::Done(serde_json::to_string_pretty(&identity)?))
        }
        Command::CanAccess { resource, action } => {
            let params = AccessParams::new(action, resource);
            if provider.can_access(&params).await? {
                Ok(Outcome::Done(format!("allowed: {} {}", params.action, params.resource)))
            } else {
                Ok(Outcome::Denied(format!("denied: {} {}", params.action, params.resource)))
            }
        }
        Command::ResetPassword { email } => {
            provider.reset_password(&email).await?;
            Ok(Outcome::Done(format!("Recovery email sent to {}", email)))
        }
        Command::SetPassword { url, password } => {
            let access_token = url
                .param("access_token")
                .ok_or_else(|| Error::MissingRecoveryTokens("set-password".to_string()))?;
            let params = SetPasswordParams {
                access_token,
                refresh_token: url.param("refresh_token"),
                password,
            };
            provider.set_password(&params).await?;
            Ok(Outcome::Done("Password updated".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location_argument() {
        let location = parse_location("/#/sign-up").unwrap();
        assert!(location.is_on_page("/sign-up"));
    }

    #[test]
    fn test_parse_location_rejects_garbage() {
        assert!(parse_location("http://[::1").is_err());
    }
}
