//! Session manager
//!
//! The state machine that owns one authenticated connection.
//!
//! ## State Machine
//! ```text
//! Disconnected ──connect──▶ Authenticating ──login ok──▶ Active
//!                                │                         │
//!                          login failure             close / transport
//!                                │                         │
//!                                ▼                         ▼
//!                             Closed ◀──drained/timeout── Closing
//! ```
//!
//! Login failure is fatal for the session — no silent retry; the caller
//! reconnects explicitly.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, tick, Receiver, Sender};
use parking_lot::Mutex;

use crate::codec::{self, Response, ERROR_ENVELOPE_TAG};
use crate::config::SessionConfig;
use crate::entity::{Entity, Value};
use crate::error::{OciError, Result};
use crate::schema::{SchemaCatalog, SchemaDef};
use crate::transport::{FrameRead, FrameWrite, Transport};
use super::auth::{
    CredentialSource, AUTH_REQUEST, FIELD_NONCE, FIELD_SIGNED_PASSWORD, FIELD_USER_ID,
    LOGIN_REQUEST,
};
use super::frame::{decode_frame, encode_frame, Frame};
use super::pending::{PendingTable, ResponseHandle};

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Authenticating,
    Active,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::Authenticating => "Authenticating",
            SessionState::Active => "Active",
            SessionState::Closing => "Closing",
            SessionState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// State shared between the handle and the session threads
struct Shared {
    config: SessionConfig,
    catalog: Arc<SchemaCatalog>,
    state: Mutex<SessionState>,
    pending: Arc<PendingTable>,

    /// Serialized write path: concurrent senders must not interleave
    /// frames
    writer: Mutex<Box<dyn FrameWrite>>,

    /// Monotonic, unique per session lifetime
    next_correlation: AtomicU64,

    /// Last successful write or read; drives keep-alive
    last_activity: Mutex<Instant>,
}

impl Shared {
    fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Closed is terminal; transitions out of it are ignored
    fn set_state(&self, next: SessionState) {
        let mut state = self.state.lock();
        if *state == SessionState::Closed || *state == next {
            return;
        }
        tracing::debug!("Session state {} -> {}", *state, next);
        *state = next;
    }

    fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }
}

/// Handle to an authenticated session
///
/// Shareable across threads by reference; dropping it tears the session
/// down.
pub struct SessionHandle {
    shared: Arc<Shared>,
    shutdown_tx: Sender<()>,
    reader: Option<JoinHandle<()>>,
    housekeeper: Option<JoinHandle<()>>,
}

/// Connect and authenticate a session
///
/// Performs the two-step login handshake before returning. Handshake
/// failure (error envelope, missing nonce, or timeout) is fatal: the
/// session lands in Closed and the caller must reconnect.
pub fn connect(
    transport: Box<dyn Transport>,
    catalog: Arc<SchemaCatalog>,
    credentials: &dyn CredentialSource,
    config: SessionConfig,
) -> Result<SessionHandle> {
    let (reader, writer) = transport.split()?;

    let shared = Arc::new(Shared {
        config,
        catalog,
        state: Mutex::new(SessionState::Authenticating),
        pending: Arc::new(PendingTable::new()),
        writer: Mutex::new(writer),
        next_correlation: AtomicU64::new(1),
        last_activity: Mutex::new(Instant::now()),
    });

    let (shutdown_tx, shutdown_rx) = bounded(1);

    let reader_handle = spawn_thread("ocilink-reader", {
        let shared = Arc::clone(&shared);
        move || reader_loop(shared, reader)
    })?;
    let housekeeper_handle = spawn_thread("ocilink-housekeeper", {
        let shared = Arc::clone(&shared);
        move || housekeeping_loop(shared, shutdown_rx)
    })?;

    let mut handle = SessionHandle {
        shared: Arc::clone(&shared),
        shutdown_tx,
        reader: Some(reader_handle),
        housekeeper: Some(housekeeper_handle),
    };

    match authenticate(&shared, credentials) {
        Ok(()) => {
            shared.set_state(SessionState::Active);
            tracing::debug!("Session active as {}", credentials.user_id());
            Ok(handle)
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            handle.teardown("login failed");
            Err(e)
        }
    }
}

fn spawn_thread(
    name: &str,
    body: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map_err(OciError::Io)
}

impl SessionHandle {
    /// Send a command; valid only while Active
    ///
    /// The command schema is looked up by the entity's command name, the
    /// response schema by that command's declared response (a bare
    /// acknowledgement when it declares none). Returns immediately after
    /// the frame is written; wait on the returned handle.
    pub fn send(&self, entity: &Entity) -> Result<ResponseHandle> {
        self.ensure_active()?;

        let name = entity
            .command_name()
            .ok_or_else(|| {
                OciError::NotACommand("entity carries no command name".to_string())
            })?
            .to_string();
        let command = self.shared.catalog.lookup(&name)?;
        let response = expected_response(&self.shared, &command)?;

        submit(&self.shared, entity, &command, response, None)
    }

    /// Send with explicit command and response schema ids
    pub fn send_with(
        &self,
        entity: &Entity,
        command_id: &str,
        response_id: &str,
    ) -> Result<ResponseHandle> {
        self.ensure_active()?;

        let command = self.shared.catalog.lookup(command_id)?;
        let response = self.shared.catalog.lookup(response_id)?;

        submit(&self.shared, entity, &command, response, None)
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Number of requests in flight
    pub fn in_flight(&self) -> usize {
        self.shared.pending.len()
    }

    /// Close the session gracefully
    ///
    /// Waits up to the drain timeout for in-flight requests, fails any
    /// remainder, then tears the connection down.
    pub fn close(mut self) -> Result<()> {
        self.close_inner();
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        match self.shared.state() {
            SessionState::Active => Ok(()),
            other => Err(OciError::SessionNotActive(other.to_string())),
        }
    }

    fn close_inner(&mut self) {
        match self.shared.state() {
            SessionState::Closed => return,
            SessionState::Closing => {}
            _ => self.shared.set_state(SessionState::Closing),
        }

        let in_flight = self.shared.pending.len();
        if in_flight > 0 {
            tracing::debug!("Closing with {} requests in flight; draining", in_flight);
            let deadline = Instant::now() + self.shared.config.drain_timeout;
            while !self.shared.pending.is_empty() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(20));
            }
        }

        self.teardown("session closed with the request in flight");
    }

    fn teardown(&mut self, fail_message: &str) {
        let failed = self.shared.pending.fail_all(fail_message);
        if failed > 0 {
            tracing::warn!("Failed {} undrained requests at teardown", failed);
        }

        {
            let mut writer = self.shared.writer.lock();
            if let Err(e) = writer.shutdown() {
                tracing::debug!("Transport shutdown: {}", e);
            }
        }
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.housekeeper.take() {
            let _ = handle.join();
        }

        self.shared.set_state(SessionState::Closed);
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.close_inner();
    }
}

// =============================================================================
// Send Path
// =============================================================================

/// Serialize, frame, register and write one command
///
/// The pending entry is registered before the write so a fast response
/// can never miss its waiter; a failed write withdraws the entry.
fn submit(
    shared: &Arc<Shared>,
    entity: &Entity,
    command: &Arc<SchemaDef>,
    response_schema: Arc<SchemaDef>,
    deadline: Option<Instant>,
) -> Result<ResponseHandle> {
    let document = codec::serialize(entity, command, &shared.catalog)?;
    let payload = codec::to_xml(&document)?;

    let correlation_id = shared.next_correlation.fetch_add(1, Ordering::Relaxed);
    let frame = encode_frame(&Frame::new(correlation_id, payload))?;

    let deadline =
        deadline.unwrap_or_else(|| Instant::now() + shared.config.response_timeout);
    let handle = shared
        .pending
        .register(correlation_id, response_schema, deadline);

    let write_result = {
        let mut writer = shared.writer.lock();
        writer.write_frame(&frame)
    };
    if let Err(e) = write_result {
        shared.pending.remove(correlation_id);
        return Err(e);
    }

    shared.touch();
    tracing::trace!(
        "Sent {} as request {}",
        command.command_wire_name(),
        correlation_id
    );
    Ok(handle)
}

/// The command's declared response schema, or a bare acknowledgement
fn expected_response(shared: &Shared, command: &SchemaDef) -> Result<Arc<SchemaDef>> {
    match command.response() {
        Some(id) => shared.catalog.lookup(id),
        None => Ok(success_response_def()),
    }
}

fn success_response_def() -> Arc<SchemaDef> {
    static DEF: OnceLock<Arc<SchemaDef>> = OnceLock::new();
    DEF.get_or_init(|| SchemaDef::empty("SuccessResponse")).clone()
}

// =============================================================================
// Receive Loop
// =============================================================================

fn reader_loop(shared: Arc<Shared>, mut reader: Box<dyn FrameRead>) {
    loop {
        let raw = match reader.read_frame() {
            Ok(raw) => raw,
            Err(e) => {
                match shared.state() {
                    SessionState::Closing | SessionState::Closed => {
                        tracing::debug!("Receive loop ending: {}", e);
                    }
                    _ => {
                        tracing::warn!("Transport lost: {}", e);
                        shared
                            .pending
                            .fail_all("connection lost with the request in flight");
                        shared.set_state(SessionState::Closing);
                    }
                }
                return;
            }
        };

        let frame = match decode_frame(&raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Discarding undecodable frame: {}", e);
                continue;
            }
        };

        shared.touch();

        // Late or cancelled responses have no waiter; that is not an
        // error for the session as a whole
        let Some(request) = shared.pending.remove(frame.correlation_id) else {
            tracing::debug!(
                "Orphaned response for correlation id {}, discarding",
                frame.correlation_id
            );
            continue;
        };

        let response = decode_response(&shared, &frame, &request.schema);
        let _ = request.tx.send(response);
    }
}

/// Parse a response payload against the expected schema
///
/// When the server answers with a different, catalog-known document
/// shape, that shape wins — commands may legitimately be acknowledged by
/// a generic success document.
fn decode_response(
    shared: &Shared,
    frame: &Frame,
    expected: &Arc<SchemaDef>,
) -> Result<Response> {
    let document = codec::from_xml(&frame.payload)?;

    let root = document.root.name.as_str();
    let schema = if root == expected.command_wire_name() || root == ERROR_ENVELOPE_TAG {
        Arc::clone(expected)
    } else if let Ok(alternate) = shared.catalog.lookup(root) {
        alternate
    } else {
        Arc::clone(expected)
    };

    codec::deserialize(&document, &schema, &shared.catalog)
}

// =============================================================================
// Housekeeping
// =============================================================================

/// Deadline sweep and keep-alive, on one timer thread
fn housekeeping_loop(shared: Arc<Shared>, shutdown_rx: Receiver<()>) {
    let ticker = tick(shared.config.sweep_interval);
    let mut outstanding_ping: Option<ResponseHandle> = None;

    loop {
        crossbeam::select! {
            recv(shutdown_rx) -> _ => return,
            recv(ticker) -> _ => {}
        }

        let evicted = shared.pending.sweep_expired(Instant::now());
        if evicted > 0 {
            tracing::debug!("Evicted {} timed-out requests", evicted);
        }

        if let Some(ping) = outstanding_ping.take() {
            match ping.try_wait() {
                None => {
                    // still in flight; the sweep bounds it
                    outstanding_ping = Some(ping);
                    continue;
                }
                Some(Ok(Response::Success(_))) => {}
                Some(_) => {
                    tracing::warn!("Keep-alive failed; closing session");
                    close_from_housekeeping(&shared);
                    return;
                }
            }
        }

        let idle = shared.last_activity.lock().elapsed();
        if shared.state() == SessionState::Active
            && idle >= shared.config.keepalive_interval
        {
            match send_keepalive(&shared) {
                Ok(handle) => outstanding_ping = Some(handle),
                Err(e) => {
                    tracing::warn!("Keep-alive send failed: {}; closing session", e);
                    close_from_housekeeping(&shared);
                    return;
                }
            }
        }
    }
}

/// Issue the no-op keep-alive command
///
/// Catalog definitions win when present; otherwise built-in empty shapes
/// keep the probe schema-valid.
fn send_keepalive(shared: &Arc<Shared>) -> Result<ResponseHandle> {
    let command = shared
        .catalog
        .lookup(&shared.config.keepalive_command)
        .unwrap_or_else(|_| SchemaDef::empty(&shared.config.keepalive_command));

    let response = match command.response() {
        Some(id) => shared.catalog.lookup(id)?,
        None => shared
            .catalog
            .lookup(&shared.config.keepalive_response)
            .unwrap_or_else(|_| SchemaDef::empty(&shared.config.keepalive_response)),
    };

    tracing::debug!("Issuing keep-alive {}", shared.config.keepalive_command);
    let entity = Entity::command(&shared.config.keepalive_command);
    submit(shared, &entity, &command, response, None)
}

fn close_from_housekeeping(shared: &Arc<Shared>) {
    shared.set_state(SessionState::Closing);
    shared
        .pending
        .fail_all("session closing after keep-alive failure");
    let mut writer = shared.writer.lock();
    if let Err(e) = writer.shutdown() {
        tracing::debug!("Transport shutdown: {}", e);
    }
    shared.set_state(SessionState::Closed);
}

// =============================================================================
// Authentication Handshake
// =============================================================================

/// Two-step login: request a nonce, answer the challenge
fn authenticate(shared: &Arc<Shared>, credentials: &dyn CredentialSource) -> Result<()> {
    // Step 1: request the challenge nonce
    let auth_entity =
        Entity::command(AUTH_REQUEST).with(FIELD_USER_ID, credentials.user_id());
    let auth_response = handshake_step(shared, &auth_entity, AUTH_REQUEST)?;

    let nonce = auth_response
        .get(FIELD_NONCE)
        .and_then(Value::as_text)
        .ok_or_else(|| {
            OciError::LoginFailed("authentication response carried no nonce".to_string())
        })?;

    // Step 2: answer it; the answer is opaque to the session
    let signed = credentials.respond(&nonce);
    let login_entity = Entity::command(LOGIN_REQUEST)
        .with(FIELD_USER_ID, credentials.user_id())
        .with(FIELD_SIGNED_PASSWORD, signed);
    handshake_step(shared, &login_entity, LOGIN_REQUEST)?;

    Ok(())
}

fn handshake_step(
    shared: &Arc<Shared>,
    entity: &Entity,
    command_id: &str,
) -> Result<Entity> {
    let command = shared.catalog.lookup(command_id)?;
    let response_schema = expected_response(shared, &command)?;

    let deadline = Instant::now() + shared.config.auth_timeout;
    let handle = submit(shared, entity, &command, response_schema, Some(deadline))?;

    let response = match handle.wait_timeout(shared.config.auth_timeout) {
        Some(result) => result?,
        None => {
            handle.cancel();
            return Err(OciError::LoginFailed(format!(
                "{} timed out",
                command_id
            )));
        }
    };

    match response {
        Response::Success(entity) => Ok(entity),
        Response::Failure { code, message } => Err(OciError::LoginFailed(format!(
            "{} rejected: {} {}",
            command_id, code, message
        ))),
    }
}
