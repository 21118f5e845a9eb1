//! Service lifecycle: startup authentication, the refresh loop and the
//! HTTP server running side by side, and a supervisor that restarts the
//! whole thing when it fails.

use crate::config::ProxyConfig;
use crate::dispatch::Registry;
use crate::error::{ProxyError, Result};
use crate::refresh::{CachedOAuth, TokenRefresher, TokenSource};
use crate::server::{ProxyServer, router};
use spotify_api::SpotifyClient;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Authenticate from the credential cache and serve until `shutdown` fires.
///
/// A failed startup authentication is returned as
/// [`ProxyError::Startup`]; it is never retried here.
pub async fn run_service(config: &ProxyConfig, shutdown: CancellationToken) -> Result<()> {
    config.validate()?;
    let user = config.user()?;
    let oauth = config.oauth()?;
    let cache = config.cache()?;

    let token = oauth
        .authenticate(&cache)
        .await
        .map_err(ProxyError::Startup)?;
    info!(user, cache = %cache.path().display(), "authenticated");

    let client = Arc::new(SpotifyClient::with_token(token)?);
    serve(
        client,
        Registry::spotify(),
        CachedOAuth::new(oauth, cache),
        config.bind_addr()?,
        shutdown,
    )
    .await
}

/// Run the refresh loop and the server over `client` until `shutdown`
/// fires or the server dies. Both tasks are joined before returning.
pub async fn serve<S: TokenSource + 'static>(
    client: Arc<SpotifyClient>,
    registry: Registry<SpotifyClient>,
    source: S,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<()> {
    let tasks = shutdown.child_token();
    let refresher = TokenRefresher::new(Arc::clone(&client), source).spawn(tasks.clone());

    let mut server = match ProxyServer::start(addr, router(client, registry), tasks.clone()).await {
        Ok(server) => server,
        Err(e) => {
            tasks.cancel();
            if let Err(join) = refresher.await {
                warn!(error = %join, "refresh task ended abnormally");
            }
            return Err(e);
        }
    };

    let outcome = tokio::select! {
        () = shutdown.cancelled() => Ok(()),
        res = server.stopped() => Err(res.err().unwrap_or_else(|| {
            ProxyError::Server("server exited unexpectedly".into())
        })),
    };

    tasks.cancel();
    let stopped = server.stop().await;
    if let Err(join) = refresher.await {
        warn!(error = %join, "refresh task ended abnormally");
    }
    outcome.and(stopped)
}

/// Call `run` until it returns `Ok`, sleeping `restart_delay` after every
/// failure. Cancelling `shutdown` during the delay ends the loop.
pub async fn supervise<F, Fut>(restart_delay: Duration, shutdown: CancellationToken, mut run: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut failures: u64 = 0;
    loop {
        match run().await {
            Ok(()) => {
                info!("service stopped");
                return;
            }
            Err(e) => {
                failures += 1;
                error!(error = %e, failures, "service failed, restarting in {}s", restart_delay.as_secs());
            }
        }
        tokio::select! {
            () = shutdown.cancelled() => {
                info!("shutdown requested during restart delay");
                return;
            }
            () = tokio::time::sleep(restart_delay) => {}
        }
    }
}
