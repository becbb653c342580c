//! Production and transfer events.
//!
//! The world records events as they happen and hands them to listeners in one
//! batch at the end of [`World::update`](crate::world::World::update). Each
//! kind keeps a bounded history in its own [`EventBuffer`].
//!
//! Listeners only observe; they get `&Event` and no world access. A kind
//! silenced with [`EventBus::suppress`] is neither buffered nor counted.

use std::collections::VecDeque;

use crate::building::StopReason;
use crate::fixed::Frames;
use crate::id::{BlockId, BuildingId, StorageId, TransferPoint};
use crate::resource::ResourceType;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the frame at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Production --
    ProductionStarted {
        building: BuildingId,
        frame: Frames,
    },
    ProductionStopped {
        building: BuildingId,
        reason: StopReason,
        frame: Frames,
    },
    ProductionResumed {
        building: BuildingId,
        frame: Frames,
    },
    ProductionCompleted {
        building: BuildingId,
        frame: Frames,
    },

    // -- Blocks --
    BlockProduced {
        building: BuildingId,
        block: BlockId,
        resource: ResourceType,
        frame: Frames,
    },
    BlockConsumed {
        building: BuildingId,
        block: BlockId,
        resource: ResourceType,
        frame: Frames,
    },

    // -- Transfers --
    TransferStarted {
        from: TransferPoint,
        to: TransferPoint,
        block: BlockId,
        resource: ResourceType,
        frame: Frames,
    },
    TransferCompleted {
        to: TransferPoint,
        block: BlockId,
        resource: ResourceType,
        frame: Frames,
    },

    // -- Storage --
    ResourcesChanged {
        storage: StorageId,
        frame: Frames,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProductionStarted,
    ProductionStopped,
    ProductionResumed,
    ProductionCompleted,
    BlockProduced,
    BlockConsumed,
    TransferStarted,
    TransferCompleted,
    ResourcesChanged,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 9;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ProductionStarted { .. } => EventKind::ProductionStarted,
            Event::ProductionStopped { .. } => EventKind::ProductionStopped,
            Event::ProductionResumed { .. } => EventKind::ProductionResumed,
            Event::ProductionCompleted { .. } => EventKind::ProductionCompleted,
            Event::BlockProduced { .. } => EventKind::BlockProduced,
            Event::BlockConsumed { .. } => EventKind::BlockConsumed,
            Event::TransferStarted { .. } => EventKind::TransferStarted,
            Event::TransferCompleted { .. } => EventKind::TransferCompleted,
            Event::ResourcesChanged { .. } => EventKind::ResourcesChanged,
        }
    }

    /// Frame the event was emitted in.
    pub fn frame(&self) -> Frames {
        match self {
            Event::ProductionStarted { frame, .. }
            | Event::ProductionStopped { frame, .. }
            | Event::ProductionResumed { frame, .. }
            | Event::ProductionCompleted { frame, .. }
            | Event::BlockProduced { frame, .. }
            | Event::BlockConsumed { frame, .. }
            | Event::TransferStarted { frame, .. }
            | Event::TransferCompleted { frame, .. }
            | Event::ResourcesChanged { frame, .. } => *frame,
        }
    }
}

impl EventKind {
    /// Convert to usize index for array lookups.
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Bounded per-kind history. Once `capacity` events are held, each push
/// evicts the oldest.
#[derive(Debug)]
pub struct EventBuffer {
    events: VecDeque<Event>,
    capacity: usize,
    /// Pushes over the buffer's lifetime, evicted ones included.
    total_written: u64,
    evicted: u64,
}

impl EventBuffer {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
            evicted: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        if self.events.len() == self.capacity && self.events.pop_front().is_some() {
            self.evicted += 1;
        }
        self.events.push_back(event);
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events evicted before anyone saw them.
    pub fn dropped_count(&self) -> u64 {
        self.evicted
    }

    /// Oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Event> {
        self.events.iter()
    }

    /// Empties the history; `total_written` keeps counting.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Optional predicate that filters events for a listener.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

/// Priority level for listeners. Lower priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

struct ListenerEntry {
    listener: Listener,
    priority: ListenerPriority,
    filter: Option<EventFilter>,
    insertion_order: u64,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("priority", &self.priority)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("insertion_order", &self.insertion_order)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Holds one ring buffer per event kind, listener lists, and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<ListenerEntry>; EVENT_KIND_COUNT],
    default_capacity: usize,
    /// Monotonically increasing counter for stable sort ordering.
    next_insertion_order: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a new event bus with the given default buffer capacity per kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            default_capacity,
            next_insertion_order: 0,
        }
    }

    /// Suppress an event kind. Suppressed events are never allocated or buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Store an event in its ring buffer. No-op if the kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }

        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Register a listener with Normal priority and no filter.
    pub fn on(&mut self, kind: EventKind, listener: Listener) {
        self.on_filtered(kind, ListenerPriority::Normal, None, listener);
    }

    /// Register a listener with explicit priority and optional filter.
    pub fn on_filtered(
        &mut self,
        kind: EventKind,
        priority: ListenerPriority,
        filter: Option<EventFilter>,
        listener: Listener,
    ) {
        let order = self.next_insertion_order;
        self.next_insertion_order += 1;
        self.listeners[kind.index()].push(ListenerEntry {
            listener,
            priority,
            filter,
            insertion_order: order,
        });
    }

    /// Hand every buffered event to its kind's listeners, ordered by
    /// priority and then registration, and empty the buffers.
    pub fn deliver(&mut self) {
        for (buffer, listeners) in self.buffers.iter_mut().zip(self.listeners.iter_mut()) {
            let Some(buffer) = buffer.as_mut().filter(|b| !b.is_empty()) else {
                continue;
            };
            let events: Vec<Event> = buffer.iter().cloned().collect();
            buffer.clear();

            listeners.sort_by_key(|entry| (entry.priority, entry.insertion_order));
            for entry in listeners.iter_mut() {
                for event in events.iter().filter(|e| entry.filter.as_ref().is_none_or(|f| f(*e))) {
                    (entry.listener)(event);
                }
            }
        }
    }

    /// Read-only access to the buffer for a kind.
    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Events currently buffered for a kind.
    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffer(kind).map_or(0, EventBuffer::len)
    }

    /// Events emitted for a kind since the bus was created.
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffer(kind).map_or(0, EventBuffer::total_written)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
