use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Outcome of the liveness check for one target.
#[derive(Debug, Clone, Copy)]
pub struct PingOutcome {
    pub reachable: bool,
    /// Wall-clock duration of the whole check divided by the attempt
    /// count on success; zero when unreachable.
    pub latency: Duration,
}

impl PingOutcome {
    pub fn unreachable() -> Self {
        Self { reachable: false, latency: Duration::ZERO }
    }
}

/// Low-level reachability checks. Failure is a status, never an error;
/// the seam exists so tests can substitute a deterministic prober.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn ping(&self, target: &str) -> PingOutcome;
    async fn check_port(&self, target: &str, port: u16) -> bool;
}

/// Prober backed by the system `ping` binary and real TCP connects.
///
/// Shelling out to `ping` sidesteps the raw-socket privileges a native
/// ICMP implementation would need; the result is a best-effort liveness
/// signal, not a certified diagnostic.
pub struct SystemProber {
    attempts: u32,
    ping_deadline: Duration,
    port_timeout: Duration,
}

impl SystemProber {
    pub fn new(attempts: u32, ping_deadline: Duration, port_timeout: Duration) -> Self {
        let attempts = if attempts == 0 { 3 } else { attempts };
        Self { attempts, ping_deadline, port_timeout }
    }

    fn ping_command(&self, target: &str) -> Command {
        let mut cmd = Command::new("ping");
        if cfg!(windows) {
            cmd.arg("-n").arg(self.attempts.to_string()).arg("-w").arg("5000");
        } else {
            cmd.arg("-c").arg(self.attempts.to_string()).arg("-W").arg("5");
        }
        cmd.arg(target).stdout(Stdio::null()).stderr(Stdio::null());
        cmd
    }
}

#[async_trait::async_trait]
impl Prober for SystemProber {
    async fn ping(&self, target: &str) -> PingOutcome {
        let start = Instant::now();
        let status = timeout(self.ping_deadline, self.ping_command(target).status()).await;

        match status {
            Ok(Ok(status)) if status.success() => {
                let latency = start.elapsed() / self.attempts;
                debug!(target, ?latency, "ping succeeded");
                PingOutcome { reachable: true, latency }
            }
            Ok(Ok(status)) => {
                debug!(target, ?status, "ping reported unreachable");
                PingOutcome::unreachable()
            }
            Ok(Err(err)) => {
                debug!(target, %err, "ping could not be executed");
                PingOutcome::unreachable()
            }
            Err(_) => {
                debug!(target, "ping deadline exceeded");
                PingOutcome::unreachable()
            }
        }
    }

    async fn check_port(&self, target: &str, port: u16) -> bool {
        match timeout(self.port_timeout, TcpStream::connect((target, port))).await {
            Ok(Ok(_stream)) => {
                debug!(target, port, "port open");
                true
            }
            Ok(Err(err)) => {
                debug!(target, port, %err, "port closed");
                false
            }
            Err(_) => {
                debug!(target, port, "port connect timed out");
                false
            }
        }
    }
}
