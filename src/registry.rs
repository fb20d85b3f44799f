//! Session registry (component G).
//!
//! Maps an opaque session id to an independent [`TerminalState`]. The
//! registry is the sole owner of every session's state and buffers;
//! callers only ever see a read-only view.

use crate::config::Config;
use crate::error::{Result, TerminalError};
use crate::state::TerminalState;
use std::collections::HashMap;

/// A read-only view into a session's terminal state, handed to change
/// callbacks and returned by [`SessionRegistry::get_buffer`]. Borrows
/// the registry's own storage; it cannot outlive the call that
/// produced it, which is what keeps mutation out of a callback's reach.
pub type TerminalView<'a> = &'a TerminalState;

/// Invoked after a `process_output` call that produced a visible state
/// change, once per call, with the session id and a read-only view.
/// Must not be called for no-op invocations. Implementations must not
/// hold anything that would let the callback call back into the
/// registry — only a borrowed view is passed, never an owning handle.
pub type ChangeCallback = Box<dyn FnMut(&str, TerminalView<'_>) + Send>;

struct SessionEntry {
    state: TerminalState,
    on_change: Option<ChangeCallback>,
}

/// Keyed map from session id to terminal state, with per-session
/// change notification.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, SessionEntry>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("session_count", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session sized `cols x rows` using `config`'s
    /// scrollback bound and CR-handling behavior. Errors if `id`
    /// already exists.
    pub fn create_buffer(&mut self, id: &str, cols: u16, rows: u16, config: &Config) -> Result<()> {
        self.create_buffer_with_callback(id, cols, rows, config, None)
    }

    /// As [`Self::create_buffer`], additionally registering a change
    /// callback invoked after every mutating `process_output`.
    pub fn create_buffer_with_callback(
        &mut self,
        id: &str,
        cols: u16,
        rows: u16,
        config: &Config,
        on_change: Option<ChangeCallback>,
    ) -> Result<()> {
        if self.sessions.contains_key(id) {
            return Err(TerminalError::SessionAlreadyExists {
                session_id: id.to_string(),
            });
        }
        let state = TerminalState::with_config(
            id.to_string(),
            cols,
            rows,
            config.effective_max_buffer_lines(),
            config.handle_carriage_return,
        );
        self.sessions.insert(
            id.to_string(),
            SessionEntry { state, on_change },
        );
        log::debug!("created session {id} ({cols}x{rows})");
        Ok(())
    }

    /// A read-only view of session `id`'s state, if it exists.
    #[must_use]
    pub fn get_buffer(&self, id: &str) -> Option<TerminalView<'_>> {
        self.sessions.get(id).map(|entry| &entry.state)
    }

    /// Feed bytes to session `id`. Fires the registered change callback
    /// exactly once if (and only if) the bytes produced a visible
    /// mutation. Errors with [`TerminalError::SessionNotFound`] if `id`
    /// is unknown.
    pub fn process_output(&mut self, id: &str, bytes: &[u8]) -> Result<()> {
        let entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TerminalError::SessionNotFound {
                session_id: id.to_string(),
            })?;
        let mutated = entry.state.process_output(bytes);
        if mutated {
            if let Some(callback) = entry.on_change.as_mut() {
                callback(id, &entry.state);
            }
        }
        Ok(())
    }

    /// Exactly `rows` plain-text lines: the active buffer's bottom
    /// `rows` visible rows, each padded with spaces to `cols`.
    pub fn get_visible_lines(&self, id: &str) -> Result<Vec<String>> {
        let entry = self
            .sessions
            .get(id)
            .ok_or_else(|| TerminalError::SessionNotFound {
                session_id: id.to_string(),
            })?;
        Ok(entry.state.active_buffer().visible_plain_lines())
    }

    /// Resize session `id`. Clamps the cursor into the new bounds and
    /// clamps (or clears) the scroll region; existing lines are not
    /// re-wrapped. Rejects non-positive dimensions with
    /// [`TerminalError::InvalidSize`].
    pub fn resize(&mut self, id: &str, cols: i32, rows: i32) -> Result<()> {
        if cols <= 0 || rows <= 0 {
            return Err(TerminalError::InvalidSize { cols, rows });
        }
        let entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TerminalError::SessionNotFound {
                session_id: id.to_string(),
            })?;
        let (cols, rows) = (cols as u16, rows as u16);
        entry.state.primary.resize(cols, rows);
        entry.state.alternate.resize(cols, rows);
        entry.state.cols = cols;
        entry.state.rows = rows;
        entry.state.clamp_cursor();
        if let Some(region) = entry.state.scroll_region {
            if region.top as u32 > u32::from(rows) || region.bottom as u32 > u32::from(rows) {
                entry.state.scroll_region = None;
            }
        }
        log::trace!("resized session {id} to {cols}x{rows}");
        Ok(())
    }

    /// Clear the active buffer, home the cursor, and reset attributes.
    pub fn clear_buffer(&mut self, id: &str) -> Result<()> {
        let entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TerminalError::SessionNotFound {
                session_id: id.to_string(),
            })?;
        entry.state.active_buffer_mut().reset_to_blank();
        entry.state.reset_transient_state();
        Ok(())
    }

    /// Drop session `id`'s state entirely. A no-op if `id` is unknown.
    pub fn remove_buffer(&mut self, id: &str) {
        if self.sessions.remove(id).is_some() {
            log::debug!("removed session {id}");
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
