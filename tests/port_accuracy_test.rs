//! Port accuracy tests against real loopback listeners
//!
//! Every scan here runs against 127.0.0.1, where closed ports answer with
//! an immediate reset, so the tests stay fast even for large port sets.

use portsweep::network::PortState;
use portsweep::{PortSpec, ScanEngine, ScanProgress, ScanReport};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_millis(500);

/// Loopback listeners that accept and immediately drop connections
struct TestServer {
    ports: Vec<u16>,
    tasks: Vec<JoinHandle<()>>,
}

impl TestServer {
    async fn new(count: usize) -> std::io::Result<Self> {
        let mut ports = Vec::new();
        let mut tasks = Vec::new();

        for _ in 0..count {
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            ports.push(listener.local_addr()?.port());
            tasks.push(tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    drop(stream);
                }
            }));
        }

        ports.sort_unstable();
        Ok(Self { ports, tasks })
    }

    fn ports(&self) -> &[u16] {
        &self.ports
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Ports that were bound a moment ago and are now released
fn released_ports(count: usize) -> Vec<u16> {
    (0..count)
        .map(|_| {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        })
        .collect()
}

async fn scan(ports: &PortSpec, max_workers: usize) -> ScanReport {
    ScanEngine::new(TIMEOUT, max_workers)
        .scan("127.0.0.1", ports)
        .await
        .unwrap()
}

#[tokio::test]
async fn open_and_released_ports_are_classified() {
    let server = TestServer::new(3).await.unwrap();
    let closed = released_ports(3);
    let spec = PortSpec::from_ports(server.ports().iter().chain(&closed).copied()).unwrap();

    let report = scan(&spec, 20).await;

    assert_eq!(report.len(), spec.len());
    for &port in server.ports() {
        assert_eq!(report.state_of(port), Some(PortState::Open), "port {}", port);
    }
    for &port in &closed {
        assert_eq!(report.state_of(port), Some(PortState::Closed), "port {}", port);
    }
}

#[tokio::test]
async fn report_is_ascending_and_complete() {
    let server = TestServer::new(2).await.unwrap();
    let spec = PortSpec::from_ports(server.ports().iter().copied().chain(1..=200)).unwrap();

    let report = scan(&spec, 50).await;

    assert_eq!(report.ports(), spec.ports());
    assert!(report.ports().windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn worker_count_does_not_change_results() {
    let server = TestServer::new(4).await.unwrap();
    let closed = released_ports(4);
    let spec = PortSpec::from_ports(server.ports().iter().chain(&closed).copied()).unwrap();

    let sequential = scan(&spec, 1).await;
    let default = scan(&spec, 20).await;
    let wide = scan(&spec, spec.len() * 4).await;

    assert_eq!(sequential.results, default.results);
    assert_eq!(default.results, wide.results);
    assert_eq!(sequential.open_ports(), server.ports());
}

#[tokio::test]
async fn large_scan_misses_no_open_port() {
    let server = TestServer::new(10).await.unwrap();
    let spec =
        PortSpec::from_ports(server.ports().iter().copied().chain(20000..21000)).unwrap();

    for _ in 0..3 {
        let report = scan(&spec, 100).await;
        assert_eq!(report.len(), spec.len());

        let open: BTreeSet<u16> = report.open_ports().into_iter().collect();
        for &port in server.ports() {
            assert!(open.contains(&port), "missed open port {}", port);
        }
    }
}

#[tokio::test]
async fn concurrent_scans_agree() {
    let server = TestServer::new(3).await.unwrap();
    let closed = released_ports(2);
    let spec = PortSpec::from_ports(server.ports().iter().chain(&closed).copied()).unwrap();

    let (a, b) = tokio::join!(scan(&spec, 5), scan(&spec, 5));

    assert_eq!(a.results, b.results);
    assert_eq!(a.open_ports(), server.ports());
}

#[tokio::test]
async fn progress_reports_every_probe() {
    let server = TestServer::new(2).await.unwrap();
    let closed = released_ports(3);
    let spec = PortSpec::from_ports(server.ports().iter().chain(&closed).copied()).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<ScanProgress>();
    let engine = ScanEngine::new(TIMEOUT, 2).with_progress(tx);
    let report = engine.scan("127.0.0.1", &spec).await.unwrap();
    drop(engine);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), spec.len());
    assert_eq!(
        events.iter().map(|e| e.completed).collect::<Vec<_>>(),
        (1..=spec.len()).collect::<Vec<_>>()
    );
    assert!(events.iter().all(|e| e.total == spec.len()));
    for event in &events {
        assert_eq!(report.state_of(event.port), Some(event.state));
    }
}

#[tokio::test]
async fn cancelled_scan_returns_no_report() {
    let spec = PortSpec::parse("30000-30100").unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let result = ScanEngine::new(TIMEOUT, 10)
        .with_cancellation(token)
        .scan("127.0.0.1", &spec)
        .await;

    assert!(matches!(
        result,
        Err(portsweep::ScanError::Interrupted { completed: 0, total: 101 })
    ));
}
