//! Connection Pool Module
//!
//! Fixed-size pool of store connections shared by all cache callers.
//! `acquire` blocks until a connection is free; the returned guard puts the
//! connection back when it goes out of scope.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::storage::schema::{init_schema, open_connection, StoreTarget};

#[derive(Default)]
struct PoolState {
    /// Connections not currently handed out
    idle: Vec<Connection>,
    closed: bool,
}

// == Connection Pool ==
/// Fixed-size set of connections to one store.
pub struct ConnectionPool {
    state: Mutex<PoolState>,
    /// Signalled whenever a connection is returned or the pool closes
    available: Condvar,
    size: usize,
    acquire_timeout: Duration,
}

impl ConnectionPool {
    // == Constructor ==
    /// Wraps already-open connections in a pool.
    pub fn new(connections: Vec<Connection>, acquire_timeout: Duration) -> Self {
        let size = connections.len();
        Self {
            state: Mutex::new(PoolState {
                idle: connections,
                closed: false,
            }),
            available: Condvar::new(),
            size,
            acquire_timeout,
        }
    }

    /// Opens `size` connections to `target` and makes sure the schema exists.
    pub fn open(
        target: &StoreTarget,
        size: usize,
        busy_timeout: Duration,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = open_connection(target, busy_timeout)?;
            if connections.is_empty() {
                init_schema(&conn)?;
            }
            connections.push(conn);
        }
        debug!("Opened connection pool of size {}", size);
        Ok(Self::new(connections, acquire_timeout))
    }

    // == Acquire ==
    /// Takes a free connection, waiting up to the acquire timeout for one to
    /// be released.
    ///
    /// Fails with `Closed` once the pool is closed, including for callers
    /// that were already waiting.
    pub fn acquire(&self) -> Result<PooledConnection<'_>> {
        let deadline = Instant::now() + self.acquire_timeout;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(CacheError::Closed);
            }
            if let Some(conn) = state.idle.pop() {
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                if state.closed {
                    return Err(CacheError::Closed);
                }
                if let Some(conn) = state.idle.pop() {
                    return Ok(PooledConnection {
                        pool: self,
                        conn: Some(conn),
                    });
                }
                warn!(
                    "No pooled connection freed within {:?} (pool size {})",
                    self.acquire_timeout, self.size
                );
                return Err(CacheError::PoolTimeout(self.acquire_timeout));
            }
        }
    }

    // == Release ==
    /// Returns a connection to the free set, or drops it if the pool closed
    /// while it was checked out.
    fn release(&self, conn: Connection) {
        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            drop(conn);
            return;
        }
        state.idle.push(conn);
        drop(state);
        self.available.notify_one();
    }

    // == Close ==
    /// Drops all idle connections and rejects further acquisitions.
    ///
    /// Returns false if the pool was already closed.
    pub fn close(&self) -> bool {
        let idle = {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
            std::mem::take(&mut state.idle)
        };
        self.available.notify_all();
        debug!(
            "Closing connection pool: {} idle, {} in use",
            idle.len(),
            self.size - idle.len()
        );
        drop(idle);
        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Total number of connections the pool was built with.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Connections currently free to acquire.
    pub fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ConnectionPool")
            .field("size", &self.size)
            .field("idle", &state.idle.len())
            .field("closed", &state.closed)
            .finish()
    }
}

// == Pooled Connection ==
/// Connection checked out of a [`ConnectionPool`].
///
/// Derefs to [`Connection`] and goes back to the pool on drop, whatever path
/// the caller leaves by.
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

impl fmt::Debug for PooledConnection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection").finish_non_exhaustive()
    }
}
