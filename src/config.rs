// ABOUTME: Central defaults for façade construction, gathered in one place per spec §6
// ABOUTME: No file, env var, or CLI surface backs these — callers pass them as constructor args

use std::time::Duration;

/// Default payload ceiling for a frame, in bytes. Façades accept their own
/// `max_message_size` at construction; this is only the fallback used by the
/// demo binaries and tests.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// `ServiceServer::advertise` default receive timeout (spec §6).
pub const DEFAULT_SERVER_RECV_TIMEOUT: Duration = Duration::from_secs(60);

/// `ServiceServer::advertise` default send timeout (spec §6).
pub const DEFAULT_SERVER_SEND_TIMEOUT: Duration = Duration::from_secs(10);
