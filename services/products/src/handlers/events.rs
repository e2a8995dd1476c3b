use tracing::debug;
use uuid::Uuid;

use bazaar_events::contracts::customer::{CustomerCreated, CustomerDeleted, CustomerUpdated};
use bazaar_events::{Event, EventHandler, HandlerRegistry, RegistryError};

use crate::domain::repository::KnownCustomerRepository;
use crate::domain::types::SyncOutcome;
use crate::usecase::customer::SyncCustomerUseCase;

/// Event handler feeding customer events into the local directory.
#[derive(Clone)]
pub struct CustomerSync<R> {
    pub repo: R,
}

impl<R: KnownCustomerRepository + Clone> CustomerSync<R> {
    fn usecase(&self) -> SyncCustomerUseCase<R> {
        SyncCustomerUseCase {
            repo: self.repo.clone(),
        }
    }
}

fn trace_outcome(outcome: SyncOutcome, event_type: &str, customer_id: Uuid) {
    match outcome {
        SyncOutcome::Applied => debug!(event_type, %customer_id, "customer event applied"),
        SyncOutcome::Stale => debug!(event_type, %customer_id, "stale customer event ignored"),
    }
}

impl<R: KnownCustomerRepository + Clone + 'static> EventHandler<CustomerCreated> for CustomerSync<R> {
    async fn handle(&self, event: CustomerCreated) -> anyhow::Result<()> {
        let customer_id = event.customer_id;
        let outcome = self.usecase().created(event).await?;
        trace_outcome(outcome, CustomerCreated::EVENT_TYPE, customer_id);
        Ok(())
    }
}

impl<R: KnownCustomerRepository + Clone + 'static> EventHandler<CustomerUpdated> for CustomerSync<R> {
    async fn handle(&self, event: CustomerUpdated) -> anyhow::Result<()> {
        let customer_id = event.customer_id;
        let outcome = self.usecase().updated(event).await?;
        trace_outcome(outcome, CustomerUpdated::EVENT_TYPE, customer_id);
        Ok(())
    }
}

impl<R: KnownCustomerRepository + Clone + 'static> EventHandler<CustomerDeleted> for CustomerSync<R> {
    async fn handle(&self, event: CustomerDeleted) -> anyhow::Result<()> {
        let customer_id = event.customer_id;
        let outcome = self.usecase().deleted(event).await?;
        trace_outcome(outcome, CustomerDeleted::EVENT_TYPE, customer_id);
        Ok(())
    }
}

/// Registry with the customer-event bindings of this service.
pub fn customer_registry<R>(repo: R) -> Result<HandlerRegistry, RegistryError>
where
    R: KnownCustomerRepository + Clone + 'static,
{
    let sync = CustomerSync { repo };
    let mut registry = HandlerRegistry::new();
    registry
        .register::<CustomerCreated, _>(sync.clone())?
        .register::<CustomerUpdated, _>(sync.clone())?
        .register::<CustomerDeleted, _>(sync)?;
    Ok(registry)
}
