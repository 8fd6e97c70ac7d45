use std::env;

use inkpad_core::config::{NOTES_TABLE_ENV, SUPABASE_ANON_KEY_ENV, SUPABASE_URL_ENV};

use crate::cli::ConfigCommands;
use crate::config_profiles::{
    is_http_url, normalize_text_option, BackendSource, CliProfile, CliProfilesConfig,
};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            supabase_url,
            supabase_anon_key,
            notes_table,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            ProfileValues {
                supabase_url,
                supabase_anon_key,
                notes_table,
            },
            no_activate,
        ),
        ConfigCommands::Show { profile } => run_config_show(profile.as_deref().or(global_profile)),
    }
}

/// Values passed on the command line for `config init`.
#[derive(Debug, Default)]
pub struct ProfileValues {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub notes_table: Option<String>,
}

pub fn run_config_init(
    profile_name: Option<&str>,
    values: ProfileValues,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(&existing, values, |name| env::var(name).ok());
    validate_profile(&merged)?;
    *config.profile_mut_or_default(&profile_name) = merged;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profile(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let mut missing_fields = Vec::new();
    if profile.supabase_url().is_none() {
        missing_fields.push("supabase_url");
    }
    if profile.supabase_anon_key().is_none() {
        missing_fields.push("supabase_anon_key");
    }
    if missing_fields.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `inkpad auth login --email <email> --password <password>`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {} (notes stay local until it is complete)",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Explicit values win, then the environment, then what the profile had.
pub fn merge_profile(
    existing: &CliProfile,
    values: ProfileValues,
    lookup_env: impl Fn(&str) -> Option<String>,
) -> CliProfile {
    let from_env = |name: &str| normalize_text_option(lookup_env(name));
    CliProfile {
        supabase_url: normalize_text_option(values.supabase_url)
            .or_else(|| from_env(SUPABASE_URL_ENV))
            .or_else(|| existing.supabase_url()),
        supabase_anon_key: normalize_text_option(values.supabase_anon_key)
            .or_else(|| from_env(SUPABASE_ANON_KEY_ENV))
            .or_else(|| existing.supabase_anon_key()),
        notes_table: normalize_text_option(values.notes_table)
            .or_else(|| from_env(NOTES_TABLE_ENV))
            .or_else(|| normalize_text_option(existing.notes_table.clone())),
    }
}

fn validate_profile(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.supabase_url() {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let (backend, source) = config
        .backend_for(&profile_name)
        .map_err(CliError::Config)?;

    println!("Profile: {profile_name}");
    match (backend, source) {
        (Some(backend), source) => {
            let origin = if source == BackendSource::Profile {
                "profile"
            } else {
                "environment"
            };
            println!("Supabase URL: {} (from {origin})", backend.supabase_url);
            println!("Notes table: {}", backend.notes_table);
        }
        (None, _) => println!("No Supabase backend configured; notes stay on this device."),
    }
    Ok(())
}
