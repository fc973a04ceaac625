//! Change notification for the karaoke model
//!
//! Timing views and the karaoke timing controller register handlers on the
//! model and redraw whenever the syllable set changes. Handlers are plain
//! closures or any type implementing [`EventHandler`].
//!
//! # Example
//!
//! ```rust
//! use ass_karaoke::events::{EventChannel, KaraokeEvent};
//! use std::{cell::Cell, rc::Rc};
//!
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//!
//! let mut channel = EventChannel::new();
//! channel
//!     .register_handler(Box::new(move |_: &KaraokeEvent| counter.set(counter.get() + 1)))
//!     .unwrap();
//!
//! channel.dispatch(&KaraokeEvent::SyllablesChanged { syllable_count: 3 });
//! assert_eq!(seen.get(), 1);
//! ```

use core::fmt;

use crate::errors::{KaraokeError, Result};

/// Events emitted by [`KaraokeModel`](crate::KaraokeModel)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KaraokeEvent {
    /// Syllables were added, removed, reloaded or retagged
    SyllablesChanged {
        /// Syllable count after the change
        syllable_count: usize,
    },
}

impl KaraokeEvent {
    /// Human-readable description for logs
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::SyllablesChanged { syllable_count } => {
                format!("Syllables changed ({syllable_count} syllables)")
            }
        }
    }
}

/// Receiver of karaoke events
pub trait EventHandler {
    /// Handle an event
    fn handle_event(&mut self, event: &KaraokeEvent);

    /// Get handler priority (higher numbers run first)
    fn priority(&self) -> i32 {
        0
    }
}

impl<F> EventHandler for F
where
    F: FnMut(&KaraokeEvent),
{
    fn handle_event(&mut self, event: &KaraokeEvent) {
        self(event);
    }
}

/// Statistics about event handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventStats {
    /// Events delivered to handlers
    pub events_dispatched: usize,
    /// Events dropped while notifications were suppressed
    pub events_suppressed: usize,
    /// Handlers currently registered
    pub handlers_count: usize,
}

/// Event channel configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventChannelConfig {
    /// Maximum number of handlers
    pub max_handlers: usize,
    /// Whether to log every dispatch at debug level
    pub enable_logging: bool,
}

impl Default for EventChannelConfig {
    fn default() -> Self {
        Self {
            max_handlers: 100,
            enable_logging: false,
        }
    }
}

/// Registered handler with its bookkeeping
struct HandlerInfo {
    /// Unique handler ID
    id: usize,
    /// Handler implementation
    handler: Box<dyn EventHandler>,
    /// Cached priority
    priority: i32,
    /// Number of events processed by this handler
    events_processed: usize,
}

impl fmt::Debug for HandlerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerInfo")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("events_processed", &self.events_processed)
            .field("handler", &"<EventHandler>")
            .finish()
    }
}

/// Ordered list of handlers with a suppression switch
#[derive(Debug)]
pub struct EventChannel {
    /// Configuration for this channel
    config: EventChannelConfig,
    /// Registered handlers, highest priority first
    handlers: Vec<HandlerInfo>,
    /// Event statistics
    stats: EventStats,
    /// Next handler ID
    next_handler_id: usize,
    /// Nesting depth of [`EventChannel::suppress`] calls
    suppressed: usize,
}

impl EventChannel {
    /// Create a channel with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EventChannelConfig::default())
    }

    /// Create a channel with custom configuration
    #[must_use]
    pub fn with_config(config: EventChannelConfig) -> Self {
        Self {
            config,
            handlers: Vec::new(),
            stats: EventStats::default(),
            next_handler_id: 0,
            suppressed: 0,
        }
    }

    /// Register a handler and return its ID
    ///
    /// # Errors
    ///
    /// Returns [`KaraokeError::HandlerLimit`] when `max_handlers` handlers
    /// are already registered.
    pub fn register_handler(&mut self, handler: Box<dyn EventHandler>) -> Result<usize> {
        if self.handlers.len() >= self.config.max_handlers {
            return Err(KaraokeError::HandlerLimit {
                limit: self.config.max_handlers,
            });
        }

        let id = self.next_handler_id;
        self.next_handler_id += 1;

        let priority = handler.priority();
        self.handlers.push(HandlerInfo {
            id,
            handler,
            priority,
            events_processed: 0,
        });
        // Stable sort keeps registration order among equal priorities
        self.handlers.sort_by(|a, b| b.priority.cmp(&a.priority));

        self.stats.handlers_count = self.handlers.len();
        Ok(id)
    }

    /// Unregister a handler, returning whether it was registered
    pub fn unregister_handler(&mut self, handler_id: usize) -> bool {
        let Some(pos) = self.handlers.iter().position(|h| h.id == handler_id) else {
            return false;
        };
        self.handlers.remove(pos);
        self.stats.handlers_count = self.handlers.len();
        true
    }

    /// Deliver an event to every handler unless suppressed
    pub fn dispatch(&mut self, event: &KaraokeEvent) {
        if self.is_suppressed() {
            self.stats.events_suppressed += 1;
            return;
        }

        self.stats.events_dispatched += 1;
        for info in &mut self.handlers {
            info.handler.handle_event(event);
            info.events_processed += 1;
        }

        if self.config.enable_logging {
            tracing::debug!(
                handlers = self.handlers.len(),
                "{}",
                event.description()
            );
        }
    }

    /// Stop delivering events until the matching [`EventChannel::resume`]
    pub fn suppress(&mut self) {
        self.suppressed += 1;
    }

    /// Undo one [`EventChannel::suppress`]
    pub fn resume(&mut self) {
        self.suppressed = self.suppressed.saturating_sub(1);
    }

    /// Whether events are currently dropped
    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        self.suppressed > 0
    }

    /// Get event statistics
    #[must_use]
    pub const fn stats(&self) -> &EventStats {
        &self.stats
    }

    /// Remove all handlers
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
        self.stats.handlers_count = 0;
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}
