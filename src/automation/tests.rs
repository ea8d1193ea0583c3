use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::{
    CoordinatorControl, HttpCoordinator, RetryPolicy, RunSession, SessionOutcome,
    run_automated_session,
};
use crate::args::ReadinessPolicy;
use crate::error::{AppError, AutomationError};
use crate::shutdown_handlers::shutdown_channel;

const REPORT_BODY: &[u8] = b"<html><body>report</body></html>";

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn run_paused_test<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn session(control_url: &str, report_dir: PathBuf, readiness: ReadinessPolicy) -> RunSession {
    RunSession {
        control_url: control_url.to_owned(),
        users: 10,
        hatch_rate: 2,
        duration: Duration::from_secs(5),
        retry: RetryPolicy {
            attempts: 5,
            interval: Duration::from_secs(3),
        },
        readiness,
        report_dir,
        request_timeout: Duration::from_secs(5),
    }
}

/// Scripted coordinator: probe answers are consumed in order, every call is
/// recorded with the (virtual) time it happened at.
struct ScriptedControl {
    probes: Mutex<VecDeque<Option<u16>>>,
    start_status: u16,
    started_at: Instant,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl ScriptedControl {
    fn new(probes: Vec<Option<u16>>, start_status: u16) -> Self {
        Self {
            probes: Mutex::new(probes.into()),
            start_status,
            started_at: Instant::now(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((call.to_owned(), self.started_at.elapsed()));
        }
    }

    fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }
}

fn refused() -> AutomationError {
    AutomationError::Request {
        endpoint: "http://locust-master:8089/".to_owned(),
        source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
    }
}

#[async_trait]
impl CoordinatorControl for ScriptedControl {
    async fn probe(&self) -> Result<u16, AutomationError> {
        self.record("probe");
        let next = self
            .probes
            .lock()
            .ok()
            .and_then(|mut probes| probes.pop_front())
            .flatten();
        next.ok_or_else(refused)
    }

    async fn start(&self, users: u64, hatch_rate: u64) -> Result<u16, AutomationError> {
        self.record(&format!("start {} {}", users, hatch_rate));
        Ok(self.start_status)
    }

    async fn stop(&self) -> Result<u16, AutomationError> {
        self.record("stop");
        Ok(200)
    }

    async fn report(&self) -> Result<(u16, Vec<u8>), AutomationError> {
        self.record("report");
        Ok((200, REPORT_BODY.to_vec()))
    }
}

#[test]
fn ready_on_third_probe_starts_once_after_six_seconds_of_failures() -> Result<(), String> {
    run_paused_test(async {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let report_dir = dir.path().join("reports");
        let control = ScriptedControl::new(vec![None, Some(503), Some(200)], 200);
        let session = session("http://locust-master:8089", report_dir.clone(), ReadinessPolicy::Fail);
        let (_shutdown_tx, mut shutdown_rx) = shutdown_channel();

        let outcome = run_automated_session(&session, &control, &mut shutdown_rx)
            .await
            .map_err(|err| err.to_string())?;

        let calls = control.calls();
        let probe_times: Vec<Duration> = calls
            .iter()
            .filter(|(name, _)| name == "probe")
            .map(|(_, at)| *at)
            .collect();
        let expected_probes = [
            Duration::from_secs(3),
            Duration::from_secs(6),
            Duration::from_secs(9),
        ];
        if probe_times != expected_probes {
            return Err(format!("Unexpected probe times {:?}", probe_times));
        }
        if control.names() != ["probe", "probe", "probe", "start 10 2", "stop", "report"] {
            return Err(format!("Unexpected call order {:?}", control.names()));
        }
        let stop_at = calls
            .iter()
            .find(|(name, _)| name == "stop")
            .map(|(_, at)| *at)
            .ok_or_else(|| "Missing stop".to_owned())?;
        if stop_at != Duration::from_secs(14) {
            return Err(format!("Expected stop after the 5s run, got {:?}", stop_at));
        }

        let report_path = report_dir.join("reports.html");
        if outcome != (SessionOutcome::Completed { report_path: report_path.clone() }) {
            return Err(format!("Unexpected outcome {:?}", outcome));
        }
        let written = std::fs::read(&report_path).map_err(|err| err.to_string())?;
        if written != REPORT_BODY {
            return Err("Report body must be written verbatim".to_owned());
        }
        Ok(())
    })
}

#[test]
fn unreachable_master_fails_after_five_probes() -> Result<(), String> {
    run_paused_test(async {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let control = ScriptedControl::new(Vec::new(), 200);
        let session = session(
            "http://locust-master:8089",
            dir.path().join("reports"),
            ReadinessPolicy::Fail,
        );
        let (_shutdown_tx, mut shutdown_rx) = shutdown_channel();

        match run_automated_session(&session, &control, &mut shutdown_rx).await {
            Err(AppError::Automation(AutomationError::CoordinatorUnavailable { attempts: 5 })) => {}
            other => return Err(format!("Expected unavailable coordinator, got {:?}", other)),
        }
        if control.names() != ["probe"; 5] {
            return Err(format!("Expected exactly five probes, got {:?}", control.names()));
        }
        if dir.path().join("reports").exists() {
            return Err("No report directory may be created".to_owned());
        }
        Ok(())
    })
}

#[test]
fn unreachable_master_is_tolerated_when_ignored() -> Result<(), String> {
    run_paused_test(async {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let control = ScriptedControl::new(vec![Some(502); 5], 200);
        let session = session(
            "http://locust-master:8089",
            dir.path().join("reports"),
            ReadinessPolicy::Ignore,
        );
        let (_shutdown_tx, mut shutdown_rx) = shutdown_channel();

        let outcome = run_automated_session(&session, &control, &mut shutdown_rx)
            .await
            .map_err(|err| err.to_string())?;
        if outcome != SessionOutcome::CoordinatorUnavailable {
            return Err(format!("Unexpected outcome {:?}", outcome));
        }
        if control.names().iter().any(|name| name.starts_with("start")) {
            return Err("The run must not be started".to_owned());
        }
        Ok(())
    })
}

#[test]
fn rejected_start_is_stopped_and_reported() -> Result<(), String> {
    run_paused_test(async {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let control = ScriptedControl::new(vec![Some(200)], 500);
        let session = session(
            "http://locust-master:8089",
            dir.path().join("reports"),
            ReadinessPolicy::Fail,
        );
        let (_shutdown_tx, mut shutdown_rx) = shutdown_channel();

        match run_automated_session(&session, &control, &mut shutdown_rx).await {
            Err(AppError::Automation(AutomationError::RunStartRejected { status: 500 })) => {}
            other => return Err(format!("Expected rejected start, got {:?}", other)),
        }
        if control.names() != ["probe", "start 10 2", "stop"] {
            return Err(format!("Unexpected call order {:?}", control.names()));
        }
        Ok(())
    })
}

#[test]
fn existing_report_directory_fails_after_stop() -> Result<(), String> {
    run_paused_test(async {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let report_dir = dir.path().join("reports");
        std::fs::create_dir(&report_dir).map_err(|err| err.to_string())?;
        let control = ScriptedControl::new(vec![Some(200)], 200);
        let session = session("http://locust-master:8089", report_dir, ReadinessPolicy::Fail);
        let (_shutdown_tx, mut shutdown_rx) = shutdown_channel();

        match run_automated_session(&session, &control, &mut shutdown_rx).await {
            Err(AppError::Automation(AutomationError::ReportDirExists { .. })) => {}
            other => return Err(format!("Expected existing directory error, got {:?}", other)),
        }
        if control.names() != ["probe", "start 10 2", "stop"] {
            return Err(format!("Unexpected call order {:?}", control.names()));
        }
        Ok(())
    })
}

#[test]
fn shutdown_during_run_stops_and_cancels() -> Result<(), String> {
    run_paused_test(async {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let control = Arc::new(ScriptedControl::new(vec![Some(200)], 200));
        let mut session = session(
            "http://locust-master:8089",
            dir.path().join("reports"),
            ReadinessPolicy::Fail,
        );
        session.duration = Duration::from_secs(600);
        let (shutdown_tx, mut shutdown_rx) = shutdown_channel();

        let task = {
            let control = Arc::clone(&control);
            tokio::spawn(async move {
                run_automated_session(&session, control.as_ref(), &mut shutdown_rx).await
            })
        };
        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown_tx
            .send(())
            .map_err(|err| format!("Failed to send shutdown: {}", err))?;

        match task.await.map_err(|err| err.to_string())? {
            Err(AppError::Automation(AutomationError::Cancelled)) => {}
            other => return Err(format!("Expected cancellation, got {:?}", other)),
        }
        if control.names() != ["probe", "start 10 2", "stop"] {
            return Err(format!("Unexpected call order {:?}", control.names()));
        }
        Ok(())
    })
}

/// Minimal Locust web UI: records `METHOD /path body` per request and closes
/// every connection after answering.
async fn serve_mock_master(listener: TcpListener, log: Arc<Mutex<Vec<String>>>) {
    loop {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut buffer = Vec::new();
        let mut chunk = [0_u8; 1024];
        let header_end = loop {
            let Ok(read) = stream.read(&mut chunk).await else {
                break None;
            };
            if read == 0 {
                break None;
            }
            buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
            if let Some(pos) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
                break Some(pos.saturating_add(4));
            }
        };
        let Some(header_end) = header_end else {
            continue;
        };
        let head = String::from_utf8_lossy(buffer.get(..header_end).unwrap_or_default()).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buffer.len() < header_end.saturating_add(content_length) {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(read) => buffer.extend_from_slice(chunk.get(..read).unwrap_or_default()),
            }
        }
        let body = String::from_utf8_lossy(buffer.get(header_end..).unwrap_or_default()).to_string();
        let request_line = head.lines().next().unwrap_or_default();
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default();
        let path = parts.next().unwrap_or_default();
        if let Ok(mut log) = log.lock() {
            log.push(format!("{} {} {}", method, path, body).trim_end().to_owned());
        }

        let response_body: &[u8] = match path {
            "/htmlreport" => REPORT_BODY,
            _ => b"ok",
        };
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            response_body.len()
        );
        drop(stream.write_all(head.as_bytes()).await);
        drop(stream.write_all(response_body).await);
        drop(stream.shutdown().await);
    }
}

#[test]
fn http_session_drives_mock_master_end_to_end() -> Result<(), String> {
    run_async_test(async {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("local addr failed: {}", err))?;
        let log = Arc::new(Mutex::new(Vec::new()));
        let server = tokio::spawn(serve_mock_master(listener, Arc::clone(&log)));

        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let report_dir = dir.path().join("reports");
        let control_url = format!("http://{}", addr);
        let mut session = session(&control_url, report_dir.clone(), ReadinessPolicy::Fail);
        session.duration = Duration::from_millis(50);
        session.retry.interval = Duration::from_millis(10);
        let control = HttpCoordinator::new(&session.control_url, session.request_timeout)
            .map_err(|err| err.to_string())?;
        let (_shutdown_tx, mut shutdown_rx) = shutdown_channel();

        let outcome = run_automated_session(&session, &control, &mut shutdown_rx)
            .await
            .map_err(|err| err.to_string())?;
        server.abort();

        let requests = log.lock().map(|log| log.clone()).unwrap_or_default();
        let expected = [
            "GET /",
            "POST /swarm locust_count=10&hatch_rate=2",
            "GET /stop",
            "GET /htmlreport",
        ];
        if requests != expected {
            return Err(format!("Unexpected requests {:?}", requests));
        }
        match outcome {
            SessionOutcome::Completed { report_path } if report_path == report_dir.join("reports.html") => {
                let written = std::fs::read(&report_path).map_err(|err| err.to_string())?;
                if written != REPORT_BODY {
                    return Err("Report body must be written verbatim".to_owned());
                }
                Ok(())
            }
            other => Err(format!("Unexpected outcome {:?}", other)),
        }
    })
}

#[test]
fn invalid_control_url_is_rejected() -> Result<(), String> {
    match HttpCoordinator::new("not a url", Duration::from_secs(1)) {
        Err(AutomationError::InvalidControlUrl { .. }) => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected invalid url".to_owned()),
    }
}
