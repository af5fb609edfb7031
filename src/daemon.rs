//! Rotation daemon state machine and timer loop
//!
//! The daemon owns the rotation schedule. It runs a single task that
//! multiplexes two wait sources with `tokio::select!`:
//!
//! - the rotation timer deadline, which advances to the next endpoint
//! - the control socket, which delivers verbs from CLI invocations
//!
//! Nothing runs in parallel with anything else: a control request that
//! arrives during a tick waits in the socket backlog until the tick
//! completes, and the external client call blocks the loop until the
//! command returns. `stop` (or SIGINT/SIGTERM) is the only exit path.

use crate::connector::VpnClient;
use crate::control::{Reply, Request};
use crate::journal::Journal;
use crate::lists::{ListError, ListStore};
use crate::profile::{Profile, ProfileError};
use crate::state::{RotationState, StateError};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Bound on reading a request line from an accepted connection, so a
/// writer that connects and goes silent cannot wedge the loop.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Daemon already running for this profile (PID {0})")]
    AlreadyRunning(i32),
    #[error("Control socket error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Profile error: {0}")]
    ProfileError(#[from] ProfileError),
    #[error("State error: {0}")]
    StateError(#[from] StateError),
    #[error("List error: {0}")]
    ListError(#[from] ListError),
}

/// Result of one rotation attempt.
enum RotateOutcome {
    Connected(String),
    ConnectFailed { endpoint: String, detail: String },
    EmptyGroup,
}

pub struct RotationDaemon {
    profile: Profile,
    lists: ListStore,
    journal: Journal,
    client: Box<dyn VpnClient>,
    state: RotationState,
    /// Endpoint we believe the external client is connected to.
    current: Option<String>,
    /// The index was just (re)set by start or switch; the next rotation
    /// connects it as-is instead of advancing past it.
    fresh_index: bool,
    shutdown: bool,
}

impl RotationDaemon {
    /// Prepare a daemon for the given profile: seed the directory on
    /// first run, load state and enter the RUNNING state (not yet
    /// persisted as running until [`run`](Self::run) acquires the PID
    /// lock).
    pub fn new(profile: Profile, client: Box<dyn VpnClient>) -> Result<Self, DaemonError> {
        profile.init()?;

        let lists = ListStore::new(profile.dir());
        let journal = Journal::new(profile.journal_path());

        let mut state = RotationState::load(&profile.state_path())?;
        let active_len = lists.load(state.active_group)?.len();
        state.clamp_index(active_len);
        state.running = true;
        state.paused = false;

        Ok(Self {
            profile,
            lists,
            journal,
            client,
            state,
            current: None,
            fresh_index: true,
            shutdown: false,
        })
    }

    /// Run the daemon loop until `stop` or a termination signal.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        if let Some(pid) = self.profile.live_daemon_pid() {
            return Err(DaemonError::AlreadyRunning(pid));
        }
        self.profile.write_pid()?;
        self.persist()?;

        let socket_path = self.profile.socket_path();
        let _ = std::fs::remove_file(&socket_path);
        let listener = UnixListener::bind(&socket_path)?;

        info!(
            "Rotation daemon started: group {}, interval {}m, control socket {}",
            self.state.active_group,
            self.state.interval_minutes,
            socket_path.display()
        );
        self.journal.record("start", None, "ok");

        // Connect right away rather than waiting out the first interval
        self.rotate_and_log();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        let sleep = tokio::time::sleep(self.interval());
        tokio::pin!(sleep);

        while !self.shutdown {
            tokio::select! {
                // Rotation timer; disarmed while paused
                () = &mut sleep, if !self.state.paused => {
                    self.rotate_and_log();
                    sleep.as_mut().reset(tokio::time::Instant::now() + self.interval());
                }

                // One control request per connection
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let rearm = self.handle_connection(stream).await;
                            if rearm {
                                sleep.as_mut().reset(tokio::time::Instant::now() + self.interval());
                            }
                        }
                        Err(e) => warn!("Control accept failed: {}", e),
                    }
                }

                () = &mut shutdown => {
                    info!("Termination signal received");
                    self.shutdown = true;
                }
            }
        }

        self.stop_cleanup();
        Ok(())
    }

    /// The interval the next timer arm should use.
    fn interval(&self) -> Duration {
        Duration::from_secs(self.state.interval_minutes * 60)
    }

    fn persist(&self) -> Result<(), StateError> {
        self.state.save(&self.profile.state_path())
    }

    /// Rotate to the next endpoint of the active group: advance the
    /// index (unless it was just reset), drop the old connection and
    /// connect the new endpoint. The advanced index is persisted even
    /// when the connect fails, so the next tick tries the endpoint
    /// after the broken one.
    fn rotate(&mut self) -> Result<RotateOutcome, DaemonError> {
        let endpoints = self.lists.load(self.state.active_group)?;
        if endpoints.is_empty() {
            self.state.clamp_index(0);
            self.persist()?;
            return Ok(RotateOutcome::EmptyGroup);
        }

        let next = if self.fresh_index {
            self.state.current_index % endpoints.len()
        } else {
            (self.state.current_index + 1) % endpoints.len()
        };
        self.fresh_index = false;

        if self.current.is_some() {
            self.disconnect();
        }

        let endpoint = endpoints[next].clone();
        self.state.current_index = next;
        self.persist()?;

        match self.client.connect(&endpoint) {
            Ok(()) => {
                info!("Connected to {} (index {}/{})", endpoint, next, endpoints.len());
                self.journal.record("connect", Some(&endpoint), "ok");
                self.current = Some(endpoint.clone());
                Ok(RotateOutcome::Connected(endpoint))
            }
            Err(e) => {
                self.journal
                    .record("connect", Some(&endpoint), &format!("err {}", e));
                self.current = None;
                Ok(RotateOutcome::ConnectFailed {
                    endpoint,
                    detail: e.to_string(),
                })
            }
        }
    }

    /// Rotate on the timer path, where every outcome is non-fatal.
    fn rotate_and_log(&mut self) {
        match self.rotate() {
            Ok(RotateOutcome::Connected(_)) => {}
            Ok(RotateOutcome::ConnectFailed { endpoint, detail }) => {
                error!("Failed to connect to {}: {}", endpoint, detail);
            }
            Ok(RotateOutcome::EmptyGroup) => {
                warn!(
                    "Active group {} is empty; holding without a connection",
                    self.state.active_group
                );
            }
            Err(e) => error!("Rotation failed: {}", e),
        }
    }

    /// Best-effort disconnect of whatever the client has up.
    fn disconnect(&mut self) {
        match self.client.disconnect() {
            Ok(()) => self.journal.record("disconnect", self.current.as_deref(), "ok"),
            Err(e) => {
                warn!("Disconnect failed: {}", e);
                self.journal
                    .record("disconnect", self.current.as_deref(), &format!("err {}", e));
            }
        }
        self.current = None;
    }

    /// Apply one control request. Returns the reply to send back and
    /// whether the rotation timer must be re-armed with a full interval.
    fn handle_request(&mut self, request: &Request) -> (Reply, bool) {
        match request {
            Request::Stop => {
                self.shutdown = true;
                (Reply::ok("stopping"), false)
            }

            Request::Pause => {
                if self.state.paused {
                    return (Reply::ok("already paused"), false);
                }
                self.state.paused = true;
                match self.persist() {
                    // The current connection is left intact
                    Ok(()) => (Reply::ok("paused"), false),
                    Err(e) => (Reply::err(e.to_string()), false),
                }
            }

            Request::Resume => {
                if !self.state.paused {
                    return (Reply::ok("not paused"), false);
                }
                self.state.paused = false;
                match self.persist() {
                    Ok(()) => (Reply::ok("resumed"), true),
                    Err(e) => (Reply::err(e.to_string()), false),
                }
            }

            Request::Skip => {
                if self.state.paused {
                    return (Reply::err("rotation is paused; resume first"), false);
                }
                match self.rotate() {
                    Ok(RotateOutcome::Connected(endpoint)) => {
                        (Reply::ok(format!("connected {}", endpoint)), true)
                    }
                    Ok(RotateOutcome::ConnectFailed { endpoint, detail }) => (
                        Reply::err(format!("failed to connect {}: {}", endpoint, detail)),
                        true,
                    ),
                    Ok(RotateOutcome::EmptyGroup) => (
                        Reply::err(format!("active group {} is empty", self.state.active_group)),
                        false,
                    ),
                    Err(e) => (Reply::err(e.to_string()), false),
                }
            }

            Request::Switch(group) => {
                if *group == self.state.active_group {
                    return (Reply::ok(format!("already on group {}", group)), false);
                }
                self.state.active_group = *group;
                self.state.current_index = 0;
                self.fresh_index = true;
                match self.persist() {
                    // The next tick or skip connects the new group's head
                    Ok(()) => (Reply::ok(format!("switched to group {}", group)), false),
                    Err(e) => (Reply::err(e.to_string()), false),
                }
            }

            Request::Interval(minutes) => match RotationState::validate_interval(*minutes) {
                Ok(minutes) => {
                    self.state.interval_minutes = minutes;
                    match self.persist() {
                        // Takes effect on the next timer arm
                        Ok(()) => (
                            Reply::ok(format!("interval set to {} minutes", minutes)),
                            false,
                        ),
                        Err(e) => (Reply::err(e.to_string()), false),
                    }
                }
                Err(e) => (Reply::err(e.to_string()), false),
            },

            Request::Status => (Reply::ok(self.status_line()), false),
        }
    }

    fn status_line(&self) -> String {
        let mode = if self.state.paused { "PAUSED" } else { "RUNNING" };
        let len = self
            .lists
            .load(self.state.active_group)
            .map(|endpoints| endpoints.len())
            .unwrap_or(0);
        format!(
            "{} list={} interval={}m index={}/{} endpoint={}",
            mode,
            self.state.active_group,
            self.state.interval_minutes,
            self.state.current_index,
            len,
            self.current.as_deref().unwrap_or("none")
        )
    }

    /// Serve one accepted control connection: read a request line,
    /// apply it, write the reply. Returns whether the timer must be
    /// re-armed.
    async fn handle_connection(&mut self, stream: UnixStream) -> bool {
        let (read_half, mut write_half) = stream.into_split();
        let mut line = String::new();
        let mut reader = BufReader::new(read_half);

        let (reply, rearm) = match timeout(REQUEST_READ_TIMEOUT, reader.read_line(&mut line)).await
        {
            Ok(Ok(n)) if n > 0 => match line.trim_end().parse::<Request>() {
                Ok(request) => {
                    info!("Control request: {}", request);
                    self.handle_request(&request)
                }
                Err(e) => (Reply::err(e.to_string()), false),
            },
            Ok(Ok(_)) => (Reply::err("empty control request"), false),
            Ok(Err(e)) => (Reply::err(format!("failed to read control request: {}", e)), false),
            Err(_) => (Reply::err("control request timed out"), false),
        };

        if let Err(e) = write_half
            .write_all(format!("{}\n", reply).as_bytes())
            .await
        {
            warn!("Failed to write control reply: {}", e);
        }
        rearm
    }

    /// Leave the RUNNING state: best-effort disconnect, persist the
    /// stopped state and remove the socket and PID file.
    fn stop_cleanup(&mut self) {
        self.disconnect();

        self.state.running = false;
        self.state.paused = false;
        if let Err(e) = self.persist() {
            warn!("Failed to persist stopped state: {}", e);
        }

        let _ = std::fs::remove_file(self.profile.socket_path());
        self.profile.remove_pid();
        self.journal.record("stop", None, "ok");
        info!("Rotation daemon stopped");
    }
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install SIGINT handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorError;
    use crate::state::Group;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records every call instead of touching a real VPN client.
    struct RecordingClient {
        calls: Arc<Mutex<Vec<String>>>,
        fail_connects: bool,
    }

    impl VpnClient for RecordingClient {
        fn connect(&self, endpoint: &str) -> Result<(), ConnectorError> {
            self.calls.lock().unwrap().push(format!("connect {}", endpoint));
            if self.fail_connects {
                Err(ConnectorError::ClientFailed {
                    action: format!("connect to {}", endpoint),
                    detail: "refused".to_string(),
                })
            } else {
                Ok(())
            }
        }

        fn disconnect(&self) -> Result<(), ConnectorError> {
            self.calls.lock().unwrap().push("disconnect".to_string());
            Ok(())
        }
    }

    fn make_daemon(
        list_a: &[&str],
        list_b: &[&str],
        fail_connects: bool,
    ) -> (TempDir, RotationDaemon, Arc<Mutex<Vec<String>>>) {
        let dir = TempDir::new().unwrap();
        let profile = Profile::new(dir.path());
        profile.init().unwrap();

        let lists = ListStore::new(profile.dir());
        lists
            .save(Group::A, &list_a.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .unwrap();
        lists
            .save(Group::B, &list_b.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let client = RecordingClient {
            calls: Arc::clone(&calls),
            fail_connects,
        };
        let daemon = RotationDaemon::new(profile, Box::new(client)).unwrap();
        (dir, daemon, calls)
    }

    fn assert_reply_ok(reply: &Reply) {
        assert!(matches!(reply, Reply::Ok(_)), "expected ok, got {:?}", reply);
    }

    #[test]
    fn test_start_connects_current_index_without_advancing() {
        let (_dir, mut daemon, calls) = make_daemon(&["US#1", "CA#2"], &[], false);

        daemon.rotate_and_log();
        assert_eq!(daemon.state.current_index, 0);
        assert_eq!(daemon.current.as_deref(), Some("US#1"));
        assert_eq!(*calls.lock().unwrap(), vec!["connect US#1"]);
    }

    #[test]
    fn test_skip_cycles_through_group_and_wraps() {
        let (_dir, mut daemon, calls) = make_daemon(&["US#1", "CA#2"], &[], false);
        daemon.rotate_and_log();

        let (reply, rearm) = daemon.handle_request(&Request::Skip);
        assert_eq!(reply, Reply::ok("connected CA#2"));
        assert!(rearm);
        assert_eq!(daemon.state.current_index, 1);

        let (reply, _) = daemon.handle_request(&Request::Skip);
        assert_eq!(reply, Reply::ok("connected US#1"));
        assert_eq!(daemon.state.current_index, 0);

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "connect US#1",
                "disconnect",
                "connect CA#2",
                "disconnect",
                "connect US#1",
            ]
        );
    }

    #[test]
    fn test_len_skips_return_to_first_endpoint() {
        let (_dir, mut daemon, _calls) = make_daemon(&["US#1", "CA#2", "NL#3"], &[], false);
        daemon.rotate_and_log();

        for _ in 0..3 {
            let (reply, _) = daemon.handle_request(&Request::Skip);
            assert_reply_ok(&reply);
        }
        assert_eq!(daemon.state.current_index, 0);
        assert_eq!(daemon.current.as_deref(), Some("US#1"));
    }

    #[test]
    fn test_skip_on_empty_group_is_reported() {
        let (_dir, mut daemon, calls) = make_daemon(&[], &[], false);

        let (reply, rearm) = daemon.handle_request(&Request::Skip);
        assert_eq!(reply, Reply::err("active group A is empty"));
        assert!(!rearm);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_connect_advances_index() {
        let (_dir, mut daemon, _calls) = make_daemon(&["US#1", "CA#2"], &[], true);
        daemon.rotate_and_log();
        assert_eq!(daemon.state.current_index, 0);
        assert!(daemon.current.is_none());

        let (reply, rearm) = daemon.handle_request(&Request::Skip);
        assert!(matches!(reply, Reply::Err(_)));
        assert!(rearm);
        assert_eq!(daemon.state.current_index, 1);
    }

    #[test]
    fn test_switch_resets_index_and_defers_reconnect() {
        let (_dir, mut daemon, calls) = make_daemon(&["US#1", "CA#2", "NL#3"], &["JP#1"], false);
        daemon.rotate_and_log();
        daemon.handle_request(&Request::Skip);
        daemon.handle_request(&Request::Skip);
        assert_eq!(daemon.state.current_index, 2);

        let calls_before = calls.lock().unwrap().len();
        let (reply, rearm) = daemon.handle_request(&Request::Switch(Group::B));
        assert_eq!(reply, Reply::ok("switched to group B"));
        assert!(!rearm);
        assert_eq!(daemon.state.active_group, Group::B);
        assert_eq!(daemon.state.current_index, 0);
        // No reconnect until the next tick or skip
        assert_eq!(calls.lock().unwrap().len(), calls_before);

        // The next rotation connects the new group's head, not entry 1
        let (reply, _) = daemon.handle_request(&Request::Skip);
        assert_eq!(reply, Reply::ok("connected JP#1"));
        assert_eq!(daemon.state.current_index, 0);
    }

    #[test]
    fn test_switch_to_empty_group_holds_without_crash() {
        let (_dir, mut daemon, _calls) = make_daemon(&["US#1"], &[], false);
        daemon.rotate_and_log();

        let (reply, _) = daemon.handle_request(&Request::Switch(Group::B));
        assert_reply_ok(&reply);

        daemon.rotate_and_log();
        assert_eq!(daemon.state.current_index, 0);

        let (reply, _) = daemon.handle_request(&Request::Status);
        match reply {
            Reply::Ok(status) => {
                assert!(status.contains("list=B"));
                assert!(status.contains("index=0/0"));
                assert!(status.contains("endpoint=none"));
            }
            Reply::Err(e) => panic!("status failed: {}", e),
        }
    }

    #[test]
    fn test_status_index_in_bounds_after_switch() {
        let (_dir, mut daemon, _calls) = make_daemon(&["US#1", "CA#2", "NL#3"], &["JP#1"], false);
        daemon.rotate_and_log();
        daemon.handle_request(&Request::Skip);
        daemon.handle_request(&Request::Skip);

        daemon.handle_request(&Request::Switch(Group::B));
        let len = daemon.lists.load(Group::B).unwrap().len();
        assert!(daemon.state.current_index < len);
    }

    #[test]
    fn test_pause_keeps_connection_and_blocks_skip() {
        let (_dir, mut daemon, calls) = make_daemon(&["US#1", "CA#2"], &[], false);
        daemon.rotate_and_log();

        let (reply, _) = daemon.handle_request(&Request::Pause);
        assert_eq!(reply, Reply::ok("paused"));
        assert!(daemon.state.paused);
        // Pausing never touches the client
        assert_eq!(*calls.lock().unwrap(), vec!["connect US#1"]);

        let (reply, _) = daemon.handle_request(&Request::Skip);
        assert!(matches!(reply, Reply::Err(_)));
    }

    #[test]
    fn test_interval_change_while_paused_triggers_no_connection() {
        let (_dir, mut daemon, calls) = make_daemon(&["US#1", "CA#2"], &[], false);
        daemon.rotate_and_log();
        daemon.handle_request(&Request::Pause);

        let calls_before = calls.lock().unwrap().len();
        let (reply, rearm) = daemon.handle_request(&Request::Interval(15));
        assert_eq!(reply, Reply::ok("interval set to 15 minutes"));
        assert!(!rearm);
        assert_eq!(daemon.state.interval_minutes, 15);
        assert_eq!(calls.lock().unwrap().len(), calls_before);
    }

    #[test]
    fn test_resume_rearms_timer() {
        let (_dir, mut daemon, _calls) = make_daemon(&["US#1"], &[], false);
        daemon.handle_request(&Request::Pause);

        let (reply, rearm) = daemon.handle_request(&Request::Resume);
        assert_eq!(reply, Reply::ok("resumed"));
        assert!(rearm);
        assert!(!daemon.state.paused);
    }

    #[test]
    fn test_resume_when_not_paused_is_noop() {
        let (_dir, mut daemon, _calls) = make_daemon(&["US#1"], &[], false);
        let (reply, rearm) = daemon.handle_request(&Request::Resume);
        assert_eq!(reply, Reply::ok("not paused"));
        assert!(!rearm);
    }

    #[test]
    fn test_interval_out_of_range_is_rejected() {
        let (_dir, mut daemon, _calls) = make_daemon(&["US#1"], &[], false);
        let (reply, _) = daemon.handle_request(&Request::Interval(0));
        assert!(matches!(reply, Reply::Err(_)));
        assert_eq!(daemon.state.interval_minutes, 10);
    }

    #[test]
    fn test_interval_persists_across_reload() {
        let (dir, mut daemon, _calls) = make_daemon(&["US#1"], &[], false);
        daemon.handle_request(&Request::Interval(30));

        let state = RotationState::load(&Profile::new(dir.path()).state_path()).unwrap();
        assert_eq!(state.interval_minutes, 30);
    }

    #[test]
    fn test_stop_requests_shutdown() {
        let (_dir, mut daemon, _calls) = make_daemon(&["US#1"], &[], false);
        let (reply, _) = daemon.handle_request(&Request::Stop);
        assert_eq!(reply, Reply::ok("stopping"));
        assert!(daemon.shutdown);
    }

    #[test]
    fn test_stop_cleanup_disconnects_and_persists_stopped() {
        let (dir, mut daemon, calls) = make_daemon(&["US#1"], &[], false);
        daemon.rotate_and_log();
        daemon.stop_cleanup();

        assert!(calls.lock().unwrap().contains(&"disconnect".to_string()));
        let state = RotationState::load(&Profile::new(dir.path()).state_path()).unwrap();
        assert!(!state.running);
    }

    #[test]
    fn test_new_clamps_out_of_bounds_index() {
        let dir = TempDir::new().unwrap();
        let profile = Profile::new(dir.path());
        profile.init().unwrap();

        let mut state = RotationState::default();
        state.current_index = 99;
        state.save(&profile.state_path()).unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let client = RecordingClient {
            calls,
            fail_connects: false,
        };
        let daemon = RotationDaemon::new(profile, Box::new(client)).unwrap();
        // Seeded list A has 3 entries
        assert!(daemon.state.current_index < 3);
    }

    #[tokio::test]
    async fn test_run_loop_serves_control_requests() {
        let (dir, mut daemon, calls) = make_daemon(&["US#1", "CA#2"], &[], false);
        let profile = Profile::new(dir.path());
        let socket_path = profile.socket_path();

        let handle = tokio::spawn(async move { daemon.run().await });

        for _ in 0..100 {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let reply = crate::control::send(&socket_path, &Request::Status).await.unwrap();
        match reply {
            Reply::Ok(status) => assert!(status.starts_with("RUNNING")),
            Reply::Err(e) => panic!("status failed: {}", e),
        }

        let reply = crate::control::send(&socket_path, &Request::Skip).await.unwrap();
        assert_eq!(reply, Reply::ok("connected CA#2"));

        let reply = crate::control::send(&socket_path, &Request::Stop).await.unwrap();
        assert_eq!(reply, Reply::ok("stopping"));
        handle.await.unwrap().unwrap();

        assert!(!socket_path.exists());
        assert!(!profile.pid_path().exists());
        assert!(calls.lock().unwrap().contains(&"connect US#1".to_string()));

        let state = RotationState::load(&profile.state_path()).unwrap();
        assert!(!state.running);
    }

    #[test]
    fn test_journal_records_rotation() {
        let (dir, mut daemon, _calls) = make_daemon(&["US#1"], &[], false);
        daemon.rotate_and_log();

        let journal = std::fs::read_to_string(dir.path().join("rotation.log")).unwrap();
        assert!(journal.contains("action=connect"));
        assert!(journal.contains("endpoint=US#1"));
        assert!(journal.contains("result=ok"));
    }
}
