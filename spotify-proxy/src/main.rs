use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use rand::Rng;
use spotify_api::oauth::parse_response_code;
use spotify_proxy::config::{self, ProxyConfig};
use spotify_proxy::{logger, run_service, supervise};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "spotify-proxy",
    version,
    about = "Share one authenticated Spotify session over HTTP"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the proxy service (restarted automatically on failure)
    Serve {
        /// Identity whose credential cache is used
        #[arg(short, long)]
        user: Option<String>,
        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Listen address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Authorize the application and write the credential cache
    Login {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Delete the credential cache
    Logout {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Show whether a token is cached and how long it stays valid
    Status {
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = config::data_dir().context("failed to prepare data directory")?;
    let mut config = config::load_config(&data_dir).context("failed to load config")?;
    config.apply_env()?;

    match cli.command {
        Command::Serve { user, port, bind } => {
            override_user(&mut config, user);
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            cmd_serve(&config, &data_dir).await
        }
        Command::Login { user } => {
            override_user(&mut config, user);
            cmd_login(&config).await
        }
        Command::Logout { user } => {
            override_user(&mut config, user);
            cmd_logout(&config)
        }
        Command::Status { user } => {
            override_user(&mut config, user);
            cmd_status(&config)
        }
    }
}

fn override_user(config: &mut ProxyConfig, user: Option<String>) {
    if user.is_some() {
        config.user = user;
    }
}

async fn cmd_serve(config: &ProxyConfig, data_dir: &Path) -> Result<()> {
    let log_dir = logger::log_dir(data_dir).ok();
    let _guard = logger::init_logger(log_dir.as_deref());
    config.validate()?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            signal.cancel();
        }
    });

    let token = shutdown.clone();
    supervise(config.restart_delay(), shutdown, move || {
        run_service(config, token.clone())
    })
    .await;
    Ok(())
}

async fn cmd_login(config: &ProxyConfig) -> Result<()> {
    let oauth = config.oauth()?;
    let cache = config.cache()?;
    let state = format!("{:016x}", rand::rng().random::<u64>());

    println!("Open this URL in a browser and authorize the application:\n");
    println!("  {}\n", oauth.authorize_url(&state));
    print!("Paste the URL you were redirected to: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    if line.contains("state=") && !line.contains(&format!("state={state}")) {
        bail!("state mismatch in redirect URL");
    }
    let code = parse_response_code(&line).context("no authorization code in input")?;

    let token = oauth
        .exchange_code(&code)
        .await
        .context("failed to exchange authorization code")?;
    cache.save(&token)?;
    println!("Token cached at {}", cache.path().display());
    Ok(())
}

fn cmd_logout(config: &ProxyConfig) -> Result<()> {
    let cache = config.cache()?;
    cache.clear()?;
    println!("Credential cache cleared.");
    Ok(())
}

fn cmd_status(config: &ProxyConfig) -> Result<()> {
    let cache = config.cache()?;
    let Some(token) = cache.load()? else {
        println!("Not logged in ({} not found).", cache.path().display());
        return Ok(());
    };
    let expires = Local
        .timestamp_opt(token.expires_at, 0)
        .single()
        .map_or_else(|| token.expires_at.to_string(), |t| t.to_rfc3339());
    println!("User:    {}", config.user()?);
    println!("Cache:   {}", cache.path().display());
    println!("Scopes:  {}", token.scope);
    println!("Expires: {expires} ({}s left)", token.remaining().as_secs());
    Ok(())
}
