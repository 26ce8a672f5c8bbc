//! Keeps cached sudo credentials alive during chroot builds

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::toolchain::{ToolInvocation, ToolRunner};

/// Background task re-running a credential refresh on an interval.
///
/// Stopped explicitly with [`PrivilegeWatchdog::stop`]; dropping it aborts
/// the task.
pub struct PrivilegeWatchdog {
    stop_sender: watch::Sender<bool>,
    handle: Option<JoinHandle<u32>>,
}

impl PrivilegeWatchdog {
    /// Start refreshing every `interval`, beginning immediately
    pub fn spawn(runner: Arc<dyn ToolRunner>, refresh: ToolInvocation, interval: Duration) -> Self {
        let (stop_sender, mut stop_receiver) = watch::channel(false);

        info!("Keeping privileges alive every {}s", interval.as_secs());
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut refreshes = 0u32;

            loop {
                tokio::select! {
                    changed = stop_receiver.changed() => {
                        if changed.is_err() || *stop_receiver.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match runner.run(&refresh).await {
                            Ok(output) if output.success => {
                                refreshes += 1;
                                debug!("Privileges refreshed ({refreshes})");
                            }
                            Ok(output) => {
                                warn!("Privilege refresh failed: {}", output.failure_reason());
                            }
                            Err(e) => warn!("Privilege refresh could not run: {e}"),
                        }
                    }
                }
            }

            refreshes
        });

        Self { stop_sender, handle: Some(handle) }
    }

    /// Stop the task and return how many refreshes succeeded
    pub async fn stop(mut self) -> u32 {
        let _ = self.stop_sender.send(true);
        let refreshes = match self.handle.take() {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                warn!("Privilege watchdog ended abnormally: {e}");
                0
            }),
            None => 0,
        };
        debug!("Privilege watchdog stopped after {refreshes} refresh(es)");
        refreshes
    }
}

impl Drop for PrivilegeWatchdog {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::Result;
    use crate::toolchain::ToolOutput;

    #[derive(Default)]
    struct CountingRunner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolRunner for CountingRunner {
        fn locate(&self, program: &str) -> Option<PathBuf> {
            Some(PathBuf::from(program))
        }

        async fn run(&self, _invocation: &ToolInvocation) -> Result<ToolOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::ok())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_until_stopped() {
        let runner = Arc::new(CountingRunner::default());
        let watchdog = PrivilegeWatchdog::spawn(
            runner.clone(),
            ToolInvocation::new("sudo").args(["-n", "-v"]),
            Duration::from_secs(60),
        );

        tokio::time::sleep(Duration::from_secs(150)).await;
        let refreshes = watchdog.stop().await;
        assert_eq!(refreshes, 3);

        let calls = runner.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(runner.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_stop_immediately() {
        let runner = Arc::new(CountingRunner::default());
        let watchdog = PrivilegeWatchdog::spawn(
            runner.clone(),
            ToolInvocation::new("sudo"),
            Duration::from_secs(3600),
        );
        let refreshes = watchdog.stop().await;
        assert!(refreshes <= 1);
    }
}
