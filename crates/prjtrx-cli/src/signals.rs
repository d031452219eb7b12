use std::sync::Arc;

use prjtrx_core::session::{QuitReason, SessionController};
use prjtrx_core::surface::StatusSurface;

/// Keeps the termination binding alive until the event loop has ended.
pub struct SignalGuard {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: Option<std::thread::JoinHandle<()>>,
}

/// Routes SIGTERM and SIGINT to `SessionController::quit` from a dedicated
/// thread.
#[cfg(unix)]
pub fn install<S>(controller: &Arc<SessionController<S>>) -> std::io::Result<SignalGuard>
where
    S: StatusSurface + 'static,
{
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    let handle = signals.handle();
    let controller = Arc::clone(controller);
    let thread = std::thread::Builder::new()
        .name("prjtrx-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                let reason = if signal == SIGTERM {
                    QuitReason::Sigterm
                } else {
                    QuitReason::Sigint
                };
                tracing::info!(signal, %reason, "termination signal");
                controller.quit(reason);
            }
        })?;
    Ok(SignalGuard {
        handle,
        thread: Some(thread),
    })
}

/// Only the console interrupt is observable here; it maps to SIGINT.
#[cfg(windows)]
pub fn install<S>(controller: &Arc<SessionController<S>>) -> std::io::Result<SignalGuard>
where
    S: StatusSurface + 'static,
{
    let controller = Arc::clone(controller);
    ctrlc::set_handler(move || {
        controller.quit(QuitReason::Sigint);
    })
    .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    Ok(SignalGuard {})
}

#[cfg(not(any(unix, windows)))]
pub fn install<S>(_controller: &Arc<SessionController<S>>) -> std::io::Result<SignalGuard>
where
    S: StatusSurface + 'static,
{
    tracing::debug!("no termination signal support on this platform");
    Ok(SignalGuard {})
}

impl SignalGuard {
    pub fn close(self) {
        #[cfg(unix)]
        {
            let mut guard = self;
            guard.handle.close();
            if let Some(thread) = guard.thread.take() {
                let _ = thread.join();
            }
        }
    }
}
