//! CLI entry point for kiroswitch.

mod cli;

use clap::Parser;
use kiroswitch::browser::try_open_browser;
use kiroswitch::config::{load_config, Config};
use kiroswitch::oauth::{build_token_record, DeviceFlowClient};
use kiroswitch::quota::QuotaClient;
use kiroswitch::register::{run_registration, AttemptRegistry, AttemptStatus, RegistrationParams};
use kiroswitch::spoof::{self, gpu::GpuProfile, SpoofProfile};
use kiroswitch::sso::SsoImporter;
use kiroswitch::token::{StoredToken, TokenService, TokenStore};
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    init_tracing();

    let args = cli::Args::parse();
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    let service = TokenService::new(TokenStore::new(&config.tokens_dir), &config.ide_auth_path);

    if let Err(message) = run(args.command, &config, &service).await {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter =
        EnvFilter::try_from_env("KIROSWITCH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(
    command: cli::Command,
    config: &Config,
    service: &TokenService,
) -> Result<(), String> {
    match command {
        cli::Command::Status => cmd_status(config, service),
        cli::Command::List => cmd_list(service),
        cli::Command::Switch {
            name,
            force_refresh,
        } => cmd_switch(service, &name, force_refresh).await,
        cli::Command::Refresh { name } => cmd_refresh(service, &name).await,
        cli::Command::Delete { name } => cmd_delete(service, &name),
        cli::Command::Clean => {
            let deleted = service.delete_all_expired();
            println!("deleted {deleted} expired token(s)");
            Ok(())
        }
        cli::Command::Login { name, no_browser } => {
            cmd_login(config, service, &name, no_browser).await
        }
        cli::Command::Quota { name, all } => cmd_quota(config, service, name.as_deref(), all).await,
        cli::Command::ImportSso {
            cookie,
            name,
            region,
        } => cmd_import_sso(config, service, &cookie, &name, region.as_deref()).await,
        cli::Command::Register { name, seed } => cmd_register(config, service, &name, seed).await,
        cli::Command::SpoofScript {
            seed,
            gpu,
            location,
        } => cmd_spoof_script(seed, gpu.as_deref(), location.as_deref()),
    }
}

fn cmd_status(config: &Config, service: &TokenService) -> Result<(), String> {
    let tokens = service.list();
    let expired = tokens
        .iter()
        .filter(|token| token.record.is_expired())
        .count();
    println!("tokens: {} total, {} valid, {} expired", tokens.len(), tokens.len() - expired, expired);
    match service.current() {
        Some(current) => println!("active: {}", describe(&current)),
        None => println!("active: none"),
    }
    println!("tokens dir: {}", config.tokens_dir.display());
    println!("ide auth file: {}", config.ide_auth_path.display());
    Ok(())
}

fn cmd_list(service: &TokenService) -> Result<(), String> {
    let tokens = service.list();
    if tokens.is_empty() {
        println!("no tokens found in {}", service.store().dir().display());
        return Ok(());
    }
    let current = service.current();
    let now = chrono::Utc::now();
    for token in tokens {
        let active = current
            .as_ref()
            .is_some_and(|active| active.file_name == token.file_name);
        let marker = if active { "→" } else { " " };
        let state = if token.record.is_expired_at(now) {
            "expired".to_string()
        } else {
            format!("expires in {}", token.record.expires_in_text(now))
        };
        println!(
            "{marker} {name} [{provider}/{region}] {state}  ({file})",
            name = token.record.account_name,
            provider = token.record.provider,
            region = token.record.region,
            file = token.file_name,
        );
    }
    Ok(())
}

async fn cmd_switch(
    service: &TokenService,
    name: &str,
    force_refresh: bool,
) -> Result<(), String> {
    let token = service.find(name).map_err(|err| err.to_string())?;
    let activated = service
        .activate(&token.file_name, force_refresh)
        .await
        .map_err(|err| err.to_string())?;
    println!("switched to {}", describe(&activated));
    Ok(())
}

async fn cmd_refresh(service: &TokenService, name: &str) -> Result<(), String> {
    let token = service.find(name).map_err(|err| err.to_string())?;
    let refreshed = service
        .refresh(&token.file_name)
        .await
        .map_err(|err| err.to_string())?;
    println!(
        "refreshed {}; expires {}",
        refreshed.record.account_name, refreshed.record.expires_at
    );
    Ok(())
}

fn cmd_delete(service: &TokenService, name: &str) -> Result<(), String> {
    let token = service.find(name).map_err(|err| err.to_string())?;
    service
        .delete(&token.file_name)
        .map_err(|err| err.to_string())?;
    println!("deleted {}", token.file_name);
    Ok(())
}

async fn cmd_login(
    config: &Config,
    service: &TokenService,
    name: &str,
    no_browser: bool,
) -> Result<(), String> {
    let client = DeviceFlowClient::new(&config.region, &config.start_url)
        .with_timeout(Duration::from_secs(config.registration_timeout_secs));
    let session = client.start().await.map_err(|err| err.to_string())?;

    println!("user code: {}", session.user_code);
    println!("verify at: {}", session.authorization_url());
    if !no_browser && try_open_browser(session.authorization_url()) {
        println!("opened the verification page in your browser");
    }

    // The sender stays alive for the whole wait; Ctrl-C ends the process.
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let issued = client
        .wait_for_token(&session, cancel_rx)
        .await
        .map_err(|err| err.to_string())?;

    let record = build_token_record(
        issued,
        &session,
        &config.region,
        &config.start_url,
        name,
        chrono::Utc::now(),
    );
    let file_name = service
        .store()
        .save_new(&record)
        .map_err(|err| err.to_string())?;
    println!("token saved to {file_name}");
    Ok(())
}

async fn cmd_quota(
    config: &Config,
    service: &TokenService,
    name: Option<&str>,
    all: bool,
) -> Result<(), String> {
    let client = QuotaClient::new(&config.quota_base_url);
    if all {
        for token in service.list() {
            match quota_line(&client, service, &token).await {
                Ok(line) => println!("{}: {line}", token.record.account_name),
                Err(message) => println!("{}: {message}", token.record.account_name),
            }
        }
        return Ok(());
    }

    let token = match name {
        Some(name) => service.find(name).map_err(|err| err.to_string())?,
        None => service
            .best()
            .ok_or_else(|| "no stored accounts".to_string())?,
    };
    let line = quota_line(&client, service, &token).await?;
    println!("{}: {line}", token.record.account_name);
    Ok(())
}

/// One formatted quota line, refreshing the token first when expired.
async fn quota_line(
    client: &QuotaClient,
    service: &TokenService,
    token: &StoredToken,
) -> Result<String, String> {
    let access_token = if token.record.is_expired() {
        let refreshed = service
            .refresh(&token.file_name)
            .await
            .map_err(|err| format!("token expired and refresh failed: {err}"))?;
        refreshed.record.access_token
    } else {
        token.record.access_token.clone()
    };

    let usage = client
        .usage_limits(&access_token)
        .await
        .map_err(|err| err.to_string())?;
    let mut line = format!(
        "{}/{} used ({:.1}%)",
        usage.current_usage,
        usage.usage_limit,
        usage.percent_used()
    );
    if let Some(days) = usage.days_until_reset(chrono::Utc::now()) {
        line.push_str(&format!(", resets in {days}d"));
    }
    if let (Some(trial_used), Some(trial_limit)) = (usage.trial_usage, usage.trial_limit) {
        line.push_str(&format!(", trial {trial_used}/{trial_limit}"));
    }
    if usage.suspended {
        line.push_str(", SUSPENDED");
    }
    Ok(line)
}

async fn cmd_import_sso(
    config: &Config,
    service: &TokenService,
    cookie: &str,
    name: &str,
    region: Option<&str>,
) -> Result<(), String> {
    let region = region.unwrap_or(&config.region);
    let importer = SsoImporter::new(region, &config.start_url);
    let quota = QuotaClient::new(&config.quota_base_url);
    let imported = importer
        .import(cookie, name, service.store(), Some(&quota))
        .await
        .map_err(|err| err.to_string())?;
    println!("imported {}", describe(&imported));
    Ok(())
}

async fn cmd_register(
    config: &Config,
    service: &TokenService,
    name: &str,
    seed: Option<u64>,
) -> Result<(), String> {
    let registry = AttemptRegistry::new();
    let params = RegistrationParams {
        account_name: name.to_string(),
        region: config.region.clone(),
        start_url: config.start_url.clone(),
        timeout: Duration::from_secs(config.registration_timeout_secs),
        profile_seed: seed,
    };
    let store = service.store().clone();
    registry
        .start(move |status, cancel| run_registration(params, store, None, status, cancel))
        .map_err(|err| err.to_string())?;

    let mut last_status: Option<AttemptStatus> = None;
    loop {
        let Some((_, status)) = registry.status() else {
            break;
        };
        if last_status.as_ref() != Some(&status) {
            match &status {
                AttemptStatus::Starting => println!("starting attempt..."),
                AttemptStatus::AwaitingAuthorization {
                    verification_url,
                    user_code,
                } => {
                    println!("user code: {user_code}");
                    println!("verify at: {verification_url}");
                }
                AttemptStatus::Polling => println!("waiting for authorization..."),
                AttemptStatus::Completed { file_name } => println!("token saved to {file_name}"),
                AttemptStatus::Failed { message } => {
                    return Err(format!("registration failed: {message}"))
                }
                AttemptStatus::Cancelled => println!("registration cancelled"),
            }
            let terminal = status.is_terminal();
            last_status = Some(status);
            if terminal {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    Ok(())
}

fn cmd_spoof_script(
    seed: Option<u64>,
    gpu: Option<&str>,
    location: Option<&str>,
) -> Result<(), String> {
    let mut profile = match seed {
        Some(seed) => SpoofProfile::randomized(seed),
        None => SpoofProfile::default(),
    };
    if let Some(key) = location {
        let preset = SpoofProfile::preset(key)
            .ok_or_else(|| format!("unknown location preset `{key}`"))?;
        profile.locale = preset.locale.to_string();
        profile.timezone = preset.timezone.to_string();
        profile.timezone_offset_minutes = preset.offset_minutes;
        profile.latitude = preset.latitude;
        profile.longitude = preset.longitude;
    }
    if let Some(key) = gpu {
        profile.gpu =
            GpuProfile::by_key(key).ok_or_else(|| format!("unknown gpu profile `{key}`"))?;
    }
    print!("{}", spoof::compose(&profile));
    Ok(())
}

fn describe(token: &StoredToken) -> String {
    match token.record.email.as_deref() {
        Some(email) => format!("{} <{email}>", token.record.account_name),
        None => token.record.account_name.clone(),
    }
}
