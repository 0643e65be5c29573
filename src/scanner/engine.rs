//! Main scanning engine implementation
//!
//! The engine drives a bounded pool of connect probes over a port set. At
//! most `max_workers` probes are in flight at once; a new one is issued each
//! time another completes. Completions arrive in arbitrary order and are
//! resequenced by port before the report is returned.

use crate::error::ScanError;
use crate::network::{resolve_target, PortResult, PortState, Prober, TcpConnectProber};
use crate::ports::PortSpec;
use crate::scanner::{ScanProgress, ScanReport, ScanRequest};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Worker cap used when the caller does not choose one.
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// Bounded-concurrency scan coordinator
pub struct ScanEngine {
    prober: Arc<dyn Prober>,
    max_workers: usize,
    progress: Option<UnboundedSender<ScanProgress>>,
    cancel: CancellationToken,
}

impl ScanEngine {
    /// Create an engine that probes with TCP connect and the given timeout.
    pub fn new(timeout: Duration, max_workers: usize) -> Self {
        Self::with_prober(Arc::new(TcpConnectProber::new(timeout)), max_workers)
    }

    /// Create an engine around a custom prober.
    pub fn with_prober(prober: Arc<dyn Prober>, max_workers: usize) -> Self {
        let max_workers = if max_workers == 0 {
            warn!("Worker cap of 0 requested, using 1");
            1
        } else {
            max_workers
        };

        Self {
            prober,
            max_workers,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Send one [`ScanProgress`] event per completed probe to `sender`.
    pub fn with_progress(mut self, sender: UnboundedSender<ScanProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Stop issuing new probes once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Resolve `target` and scan every port in `ports`.
    pub async fn scan(&self, target: &str, ports: &PortSpec) -> crate::Result<ScanReport> {
        let resolved = resolve_target(target).await?;
        info!(
            "Scanning {} ({}) on {} ports with {} workers",
            resolved.hostname,
            resolved.address,
            ports.len(),
            self.max_workers
        );

        let start_time = Instant::now();
        let results = self.scan_address(resolved.address, ports).await?;
        let duration = start_time.elapsed();

        let report = ScanReport::new(resolved.target, resolved.address, results, duration);
        info!(
            "Scan of {} finished in {:?}: {} open, {} closed",
            report.resolved_address,
            duration,
            report.open_ports().len(),
            report.closed_ports().len()
        );
        Ok(report)
    }

    /// Probe every port in `ports` on `addr`.
    ///
    /// Returns one result per port, ascending. The only possible error is
    /// [`ScanError::Interrupted`], raised when the cancellation token fired
    /// before all probes were issued.
    pub async fn scan_address(
        &self,
        addr: Ipv4Addr,
        ports: &PortSpec,
    ) -> crate::Result<Vec<PortResult>> {
        let total = ports.len();
        let prober = self.prober.as_ref();
        let probe = move |port: u16| async move { (port, prober.probe(addr, port).await) };

        let mut queue = ports.iter();
        let mut in_flight = FuturesUnordered::new();
        let mut states: BTreeMap<u16, PortState> = BTreeMap::new();

        while in_flight.len() < self.max_workers && !self.cancel.is_cancelled() {
            match queue.next() {
                Some(port) => in_flight.push(probe(port)),
                None => break,
            }
        }

        while let Some((port, state)) = in_flight.next().await {
            states.insert(port, state);
            self.report_progress(port, state, states.len(), total);

            if !self.cancel.is_cancelled() {
                if let Some(next) = queue.next() {
                    in_flight.push(probe(next));
                }
            }
        }

        if states.len() < total {
            warn!("Scan of {} interrupted: {} of {} ports probed", addr, states.len(), total);
            return Err(ScanError::Interrupted {
                completed: states.len(),
                total,
            });
        }

        Ok(states
            .into_iter()
            .map(|(port, state)| PortResult::new(port, state))
            .collect())
    }

    fn report_progress(&self, port: u16, state: PortState, completed: usize, total: usize) {
        debug!("[{}/{}] port {} {}", completed, total, port, state);
        if let Some(sender) = &self.progress {
            let _ = sender.send(ScanProgress {
                port,
                state,
                completed,
                total,
            });
        }
    }
}

/// Validate `request`, resolve its target and run the scan.
///
/// Input errors (port spec, timeout) are reported before any network I/O.
pub async fn scan(request: &ScanRequest) -> crate::Result<ScanReport> {
    let (ports, timeout) = request.validate()?;
    ScanEngine::new(timeout, request.max_workers)
        .scan(&request.target, &ports)
        .await
}
