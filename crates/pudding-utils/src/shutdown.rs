use std::sync::LazyLock;
use tokio::sync::watch;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    Graceful,
    Abort,
}

static MODE: LazyLock<watch::Sender<Option<ShutdownMode>>> =
    LazyLock::new(|| watch::channel(None).0);

/// Requests a process-wide shutdown.
///
/// The mode may only escalate: once [`ShutdownMode::Abort`] is set,
/// later graceful requests are ignored.
pub fn trigger(mode: ShutdownMode) {
    MODE.send_if_modified(|current| match (*current, mode) {
        (None, _) | (Some(ShutdownMode::Graceful), ShutdownMode::Abort) => {
            *current = Some(mode);
            true
        }
        _ => false,
    });
}

#[must_use]
pub fn mode() -> Option<ShutdownMode> {
    *MODE.borrow()
}

#[must_use]
pub fn is_shutting_down() -> bool {
    mode().is_some()
}

/// Resolves once any shutdown mode has been requested.
pub async fn triggered() {
    wait(|mode| mode.is_some()).await;
}

/// Resolves once an abort shutdown has been requested.
pub async fn aborted() {
    wait(|mode| matches!(mode, Some(ShutdownMode::Abort))).await;
}

async fn wait(predicate: impl Fn(Option<ShutdownMode>) -> bool) {
    let mut rx = MODE.subscribe();
    loop {
        if predicate(*rx.borrow()) {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Waits for termination signals from the host and translates them
/// into shutdown requests.
///
/// The first signal requests a graceful shutdown; a second one makes
/// the process abort without waiting for in-flight work.
pub async fn catch_signals() {
    signals::graceful().await;
    warn!("received shutdown signal. performing graceful shutdown...");
    trigger(ShutdownMode::Graceful);

    signals::abort().await;
    warn!("received abort signal. aborting process...");
    trigger(ShutdownMode::Abort);
}

#[allow(clippy::expect_used)]
mod signals {
    #[cfg(target_family = "unix")]
    use tokio::signal::unix::{signal, SignalKind};

    #[cfg(not(target_family = "unix"))]
    pub async fn graceful() {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
    }

    #[cfg(target_family = "unix")]
    pub async fn graceful() {
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = sigint.recv() => {},
            _ = sigterm.recv() => {},
        };
    }

    #[cfg(not(target_family = "unix"))]
    pub async fn abort() {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
    }

    #[cfg(target_family = "unix")]
    pub async fn abort() {
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        let mut sigquit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");
        tokio::select! {
            _ = sigint.recv() => {},
            _ = sigterm.recv() => {},
            _ = sigquit.recv() => {},
        };
    }
}
