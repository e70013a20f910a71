use std::sync::Arc;
use uuid::Uuid;

use crate::event_sourcing::core::{
    Aggregate, AggregateError, AggregateRootBase, AggregateType, DomainEvent, EventApplier,
};
use crate::event_sourcing::registry::AggregateRegistry;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{OrderItem, OrderStatus};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

pub const ORDER_AGGREGATE: &str = "Order";

#[derive(Debug, Clone)]
pub struct OrderAggregate {
    base: AggregateRootBase<Self>,

    // Current State (derived from events)
    pub customer_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,

    // Optional fields
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub cancelled_reason: Option<String>,
}

impl OrderAggregate {
    pub fn new(base: AggregateRootBase<Self>) -> Self {
        Self {
            base,
            customer_id: None,
            items: Vec::new(),
            status: OrderStatus::Draft,
            tracking_number: None,
            carrier: None,
            cancelled_reason: None,
        }
    }

    pub fn aggregate_type() -> Result<AggregateType, AggregateError> {
        AggregateType::new(ORDER_AGGREGATE)
    }

    pub fn register(registry: &mut AggregateRegistry) -> Result<(), AggregateError> {
        registry.register(Self::aggregate_type()?, Self::new)
    }

    /// Validate business rules before emitting events
    fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for item in items {
            if item.quantity <= 0 {
                return Err(OrderError::InvalidQuantity(item.quantity));
            }
        }

        Ok(())
    }

    pub fn handle(&mut self, command: &OrderCommand) -> Result<(), OrderError> {
        let event = match command {
            OrderCommand::CreateOrder { customer_id, items } => {
                if self.status != OrderStatus::Draft {
                    return Err(OrderError::AlreadyCreated);
                }
                Self::validate_items(items)?;

                OrderEvent::Created(OrderCreated {
                    customer_id: *customer_id,
                    items: items.clone(),
                })
            }

            OrderCommand::UpdateItems { items, reason } => {
                match self.status {
                    OrderStatus::Created => {}
                    OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
                    status => return Err(OrderError::InvalidStatusTransition(status)),
                }
                Self::validate_items(items)?;

                OrderEvent::ItemsUpdated(OrderItemsUpdated {
                    items: items.clone(),
                    reason: reason.clone(),
                })
            }

            OrderCommand::ConfirmOrder => match self.status {
                OrderStatus::Created => OrderEvent::Confirmed,
                status => return Err(OrderError::InvalidStatusTransition(status)),
            },

            OrderCommand::ShipOrder { tracking_number, carrier } => {
                match self.status {
                    OrderStatus::Confirmed => {}
                    OrderStatus::Created => return Err(OrderError::NotConfirmed),
                    status => return Err(OrderError::InvalidStatusTransition(status)),
                }

                OrderEvent::Shipped(OrderShipped {
                    tracking_number: tracking_number.clone(),
                    carrier: carrier.clone(),
                })
            }

            OrderCommand::CancelOrder { reason } => {
                match self.status {
                    OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
                    status if status.is_terminal() || status == OrderStatus::Draft => {
                        return Err(OrderError::InvalidStatusTransition(status))
                    }
                    _ => {}
                }

                OrderEvent::Cancelled(OrderCancelled { reason: reason.clone() })
            }
        };

        self.raise(event)?;
        Ok(())
    }

    fn apply_event(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::Created(e) => {
                self.customer_id = Some(e.customer_id);
                self.items = e.items.clone();
                self.status = OrderStatus::Created;
            }
            OrderEvent::ItemsUpdated(e) => {
                self.items = e.items.clone();
            }
            OrderEvent::Confirmed => {
                self.status = OrderStatus::Confirmed;
            }
            OrderEvent::Shipped(e) => {
                self.status = OrderStatus::Shipped;
                self.tracking_number = Some(e.tracking_number.clone());
                self.carrier = Some(e.carrier.clone());
            }
            OrderEvent::Cancelled(e) => {
                self.status = OrderStatus::Cancelled;
                self.cancelled_reason = e.reason.clone();
            }
        }
    }
}

/// Applies the closed `OrderEvent` enum directly.
pub struct OrderEventApplier;

impl EventApplier<OrderAggregate> for OrderEventApplier {
    fn apply(&self, order: &mut OrderAggregate, event: &dyn DomainEvent) -> Result<(), AggregateError> {
        let event = event
            .downcast_ref::<OrderEvent>()
            .ok_or_else(|| AggregateError::NoHandler {
                event_type: event.event_type().to_string(),
            })?;
        order.apply_event(event);
        Ok(())
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    fn base(&self) -> &AggregateRootBase<Self> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AggregateRootBase<Self> {
        &mut self.base
    }

    fn event_applier() -> Result<Arc<dyn EventApplier<Self>>, AggregateError> {
        Ok(Arc::new(OrderEventApplier))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
