use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::error::AggregateError;
use super::event::DomainEvent;

// ============================================================================
// Event Dispatch - Routes an event to the handler that mutates an aggregate
// ============================================================================
//
// Aggregates declare their handlers once, per type:
//
//     fn handlers(table: &mut DispatchTableBuilder<Self>) {
//         table.on(Self::apply_deposited).on(Self::apply_withdrawn);
//     }
//
// The resulting table is immutable and shared by every instance of the type.
//
// ============================================================================

/// The `Apply(event)` capability.
///
/// `DispatchTable` is the default implementation. An aggregate that already
/// knows how to apply its events (e.g. a `match` over a closed enum) can
/// supply its own through `Aggregate::event_applier`.
pub trait EventApplier<A>: Send + Sync {
    fn apply(&self, target: &mut A, event: &dyn DomainEvent) -> Result<(), AggregateError>;
}

type Handler<A> = Box<dyn Fn(&mut A, &dyn DomainEvent) + Send + Sync>;

struct HandlerEntry<A> {
    event_type: &'static str,
    handler: Handler<A>,
}

pub struct DispatchTable<A> {
    handlers: HashMap<TypeId, HandlerEntry<A>>,
}

impl<A: 'static> DispatchTable<A> {
    pub fn builder() -> DispatchTableBuilder<A> {
        DispatchTableBuilder {
            handlers: HashMap::new(),
            collisions: Vec::new(),
        }
    }

    pub fn handles<E: DomainEvent>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Rust type names of every handled event, sorted.
    pub fn event_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.values().map(|entry| entry.event_type).collect();
        names.sort_unstable();
        names
    }
}

impl<A: 'static> EventApplier<A> for DispatchTable<A> {
    fn apply(&self, target: &mut A, event: &dyn DomainEvent) -> Result<(), AggregateError> {
        match self.handlers.get(&event.payload_type_id()) {
            Some(entry) => {
                (entry.handler)(target, event);
                Ok(())
            }
            None => Err(AggregateError::NoHandler {
                event_type: event.event_type().to_string(),
            }),
        }
    }
}

impl<A: 'static> fmt::Debug for DispatchTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("target", &type_name::<A>())
            .field("event_types", &self.event_types())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct DispatchTableBuilder<A> {
    handlers: HashMap<TypeId, HandlerEntry<A>>,
    collisions: Vec<&'static str>,
}

impl<A: 'static> DispatchTableBuilder<A> {
    /// Route events of type `E` to `handler`.
    ///
    /// Registering a second handler for the same `E` is recorded and
    /// reported by [`build`](Self::build).
    pub fn on<E, F>(&mut self, handler: F) -> &mut Self
    where
        E: DomainEvent,
        F: Fn(&mut A, &E) + Send + Sync + 'static,
    {
        let event_type = type_name::<E>();
        let entry = HandlerEntry {
            event_type,
            handler: Box::new(move |target: &mut A, event: &dyn DomainEvent| {
                // Keyed by TypeId, so the downcast cannot miss.
                if let Some(event) = event.downcast_ref::<E>() {
                    handler(target, event);
                }
            }),
        };

        if self.handlers.insert(TypeId::of::<E>(), entry).is_some() {
            self.collisions.push(event_type);
        }
        self
    }

    pub fn build(self) -> Result<DispatchTable<A>, AggregateError> {
        if let Some(&rust_type) = self.collisions.first() {
            return Err(AggregateError::HandlerCollision { rust_type });
        }
        Ok(DispatchTable {
            handlers: self.handlers,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
