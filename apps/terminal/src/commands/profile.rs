//! Company profile and config file commands.

use std::path::PathBuf;

use anyhow::bail;
use cajero_core::validation::validate_company_profile;
use cajero_core::CompanyProfile;
use clap::{Args, Subcommand};
use tracing::info;

use super::Terminal;
use crate::config::TerminalConfig;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: Option<ProfileCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Print the company profile (credentials masked)
    Show,
    /// Update company profile fields
    Set(ProfileSetArgs),
}

#[derive(Args, Debug, Default)]
pub struct ProfileSetArgs {
    #[arg(long)]
    pub ruc: Option<String>,
    #[arg(long)]
    pub legal_name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub ubigeo: Option<String>,
    #[arg(long)]
    pub sol_user: Option<String>,
    #[arg(long)]
    pub sol_password: Option<String>,
    #[arg(long)]
    pub invoice_series: Option<String>,
    #[arg(long)]
    pub receipt_series: Option<String>,
    #[arg(long)]
    pub credit_note_series: Option<String>,
    #[arg(long)]
    pub logo_url: Option<String>,
    #[arg(long)]
    pub lookup_token: Option<String>,
    #[arg(long)]
    pub messaging_instance: Option<String>,
    #[arg(long)]
    pub messaging_token: Option<String>,
    /// Minutes east of UTC, e.g. -300 for Lima
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,
}

impl ProfileSetArgs {
    fn apply(self, profile: &mut CompanyProfile) {
        fn set(field: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *field = value.trim().to_string();
            }
        }
        // Empty string clears an optional field.
        fn set_opt(field: &mut Option<String>, value: Option<String>) {
            if let Some(value) = value {
                let value = value.trim().to_string();
                *field = (!value.is_empty()).then_some(value);
            }
        }

        set(&mut profile.ruc, self.ruc);
        set(&mut profile.legal_name, self.legal_name);
        set(&mut profile.address, self.address);
        set(&mut profile.ubigeo, self.ubigeo);
        set(&mut profile.sol_user, self.sol_user);
        set(&mut profile.sol_password, self.sol_password);
        set(&mut profile.invoice_series, self.invoice_series.map(|s| s.to_ascii_uppercase()));
        set(&mut profile.receipt_series, self.receipt_series.map(|s| s.to_ascii_uppercase()));
        set(
            &mut profile.credit_note_series,
            self.credit_note_series.map(|s| s.to_ascii_uppercase()),
        );
        set_opt(&mut profile.logo_url, self.logo_url);
        set_opt(&mut profile.lookup_token, self.lookup_token);
        set_opt(&mut profile.messaging_instance, self.messaging_instance);
        set_opt(&mut profile.messaging_token, self.messaging_token);
        if let Some(offset) = self.utc_offset_minutes {
            profile.utc_offset_minutes = offset;
        }
    }
}

fn configured(value: &Option<String>) -> &'static str {
    if value.as_deref().is_some_and(|v| !v.is_empty()) {
        "configured"
    } else {
        "not set"
    }
}

fn print_profile(profile: &CompanyProfile) {
    println!("RUC:            {}", profile.ruc);
    println!("Legal name:     {}", profile.legal_name);
    println!("Address:        {}", profile.address);
    println!("Ubigeo:         {}", profile.ubigeo);
    println!("SOL user:       {}", profile.sol_user);
    println!(
        "Series:         {} / {} / {}",
        profile.invoice_series, profile.receipt_series, profile.credit_note_series
    );
    println!("UTC offset:     {} min", profile.utc_offset_minutes);
    println!("Logo:           {}", profile.logo_url.as_deref().unwrap_or("-"));
    println!("Lookup token:   {}", configured(&profile.lookup_token));
    println!("Messaging:      {}", configured(&profile.messaging_instance));
}

/// Shows or edits the profile. Edits are validated and saved through the store.
pub async fn run_profile(terminal: &mut Terminal, args: ProfileArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(ProfileCommand::Show) {
        ProfileCommand::Show => print_profile(&terminal.profile),
        ProfileCommand::Set(set) => {
            let mut profile = terminal.profile.clone();
            set.apply(&mut profile);
            validate_company_profile(&profile)?;

            terminal.store().save_profile(&profile).await?;
            info!(ruc = %profile.ruc, "Company profile updated");
            terminal.profile = profile;
            print_profile(&terminal.profile);
        }
    }
    Ok(())
}

/// Writes a config file with default values.
pub fn run_init(config_path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let target = config_path.or_else(TerminalConfig::default_config_path);
    if let Some(path) = &target {
        if path.exists() && !force {
            bail!("{} already exists; pass --force to overwrite", path.display());
        }
    }

    let path = TerminalConfig::default().save(target)?;
    println!("Config written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;

    #[test]
    fn test_set_args_apply() {
        let mut profile = CompanyProfile::demo();
        ProfileSetArgs {
            legal_name: Some(" BODEGA SAN JUAN E.I.R.L. ".to_string()),
            receipt_series: Some("b002".to_string()),
            lookup_token: Some("tok".to_string()),
            ..Default::default()
        }
        .apply(&mut profile);

        assert_eq!(profile.legal_name, "BODEGA SAN JUAN E.I.R.L.");
        assert_eq!(profile.receipt_series, "B002");
        assert_eq!(profile.lookup_token.as_deref(), Some("tok"));
        assert_eq!(profile.ruc, "20123456789");

        ProfileSetArgs {
            lookup_token: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut profile);
        assert!(profile.lookup_token.is_none());
    }

    #[tokio::test]
    async fn test_invalid_profile_is_not_saved() {
        let mut terminal = testing::terminal(true).await;
        let args = ProfileArgs {
            command: Some(ProfileCommand::Set(ProfileSetArgs {
                ruc: Some("123".to_string()),
                ..Default::default()
            })),
        };

        assert!(run_profile(&mut terminal, args).await.is_err());
        assert_eq!(
            terminal.store().load_profile().await.unwrap(),
            Some(CompanyProfile::demo())
        );
    }

    #[tokio::test]
    async fn test_profile_update_is_saved() {
        let mut terminal = testing::terminal(true).await;
        let args = ProfileArgs {
            command: Some(ProfileCommand::Set(ProfileSetArgs {
                invoice_series: Some("F002".to_string()),
                ..Default::default()
            })),
        };
        run_profile(&mut terminal, args).await.unwrap();

        let stored = terminal.store().load_profile().await.unwrap().unwrap();
        assert_eq!(stored.invoice_series, "F002");
        assert_eq!(terminal.profile, stored);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let path = std::env::temp_dir().join(format!("cajero-init-{}.toml", uuid::Uuid::new_v4()));
        run_init(Some(path.clone()), false).unwrap();
        assert!(run_init(Some(path.clone()), false).is_err());
        run_init(Some(path.clone()), true).unwrap();

        let written = TerminalConfig::load(Some(path.clone())).unwrap();
        assert_eq!(written.database, TerminalConfig::default().database);
        std::fs::remove_file(path).unwrap();
    }
}
