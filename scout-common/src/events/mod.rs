//! Event types for the scouting sync event system
//!
//! Provides the shared event definitions and the EventBus that replaces the
//! "form submitted" broadcast. Subscribers unsubscribe by dropping their receiver.

use crate::Variant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Scouting sync event types
///
/// Events are broadcast via EventBus; derived views (fused data, assignment
/// lists) refetch when they see one that concerns their variant and team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScoutEvent {
    /// A form submission reached a terminal state
    ///
    /// Triggers:
    /// - Assignment Reconciler: recompute outstanding work
    /// - Data views: refetch fused records
    SubmissionCompleted {
        /// Observation kind
        variant: Variant,
        /// Team/org the observation belongs to
        team_id: Option<String>,
        /// true when the record went to the local queue
        is_local: bool,
        /// When the submission completed
        timestamp: DateTime<Utc>,
    },

    /// A re-upload pass over the local queue finished
    QueueFlushed {
        /// Observation kind
        variant: Variant,
        /// Records confirmed delivered and pruned
        delivered: usize,
        /// Records still queued
        remaining: usize,
        /// When the pass finished
        timestamp: DateTime<Utc>,
    },

    /// Network reachability changed
    ConnectivityChanged {
        /// New reachability state
        online: bool,
        /// When the change was observed
        timestamp: DateTime<Utc>,
    },

    /// A screen listing assignments regained focus
    ScreenFocused {
        /// Observation kind shown on the screen
        variant: Variant,
        /// When focus was regained
        timestamp: DateTime<Utc>,
    },
}

impl ScoutEvent {
    /// Get event type as string
    pub fn event_type(&self) -> &str {
        match self {
            ScoutEvent::SubmissionCompleted { .. } => "SubmissionCompleted",
            ScoutEvent::QueueFlushed { .. } => "QueueFlushed",
            ScoutEvent::ConnectivityChanged { .. } => "ConnectivityChanged",
            ScoutEvent::ScreenFocused { .. } => "ScreenFocused",
        }
    }

    /// Variant this event concerns, if any
    pub fn variant(&self) -> Option<Variant> {
        match self {
            ScoutEvent::SubmissionCompleted { variant, .. }
            | ScoutEvent::QueueFlushed { variant, .. }
            | ScoutEvent::ScreenFocused { variant, .. } => Some(*variant),
            ScoutEvent::ConnectivityChanged { .. } => None,
        }
    }

    /// Whether views derived from `variant` should be recomputed
    pub fn invalidates(&self, variant: Variant) -> bool {
        match self {
            ScoutEvent::ConnectivityChanged { online, .. } => *online,
            other => other.variant() == Some(variant),
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use scout_common::events::{EventBus, ScoutEvent};
/// use scout_common::Variant;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(ScoutEvent::SubmissionCompleted {
///     variant: Variant::Match,
///     team_id: Some("team".to_string()),
///     is_local: true,
///     timestamp: chrono::Utc::now(),
/// });
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.event_type(), "SubmissionCompleted");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ScoutEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity: capacity.max(1) }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ScoutEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ScoutEvent,
    ) -> Result<usize, broadcast::error::SendError<ScoutEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ScoutEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
