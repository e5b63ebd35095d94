use crate::admission::AdmissionController;
use crate::clients::{BayClient, CounterClient, NoteClient, OrderClient};
use crate::clock::{BusinessCalendar, Clock, SystemClock};
use crate::config::BayConfig;
use crate::error::BayError;
use crate::model::{BaySlot, DayCounter, DeliveryNote, Order};
use crate::ports::{FileStore, InMemoryFileStore, LinkNotifier, NotificationPort};
use crate::retry::RetryPolicy;
use crate::sequencer::QueueSequencer;
use crate::wait::WaitEstimator;
use actor_framework::{ResourceActor, ResourceClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Collaborators the bay does not own.
#[derive(Clone)]
pub struct BayDeps {
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn NotificationPort>,
    pub files: Arc<dyn FileStore>,
}

impl BayDeps {
    /// System clock, link-only notifications and in-memory file storage.
    pub fn defaults(config: &BayConfig) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            notifier: Arc::new(LinkNotifier::new(config.client_base_url.clone())),
            files: Arc::new(InMemoryFileStore::new(config.client_base_url.clone())),
        }
    }
}

/// Client ends of the four store actors.
pub struct BayStores {
    pub orders: ResourceClient<Order>,
    pub counters: ResourceClient<DayCounter>,
    pub bay: ResourceClient<BaySlot>,
    pub notes: ResourceClient<DeliveryNote>,
}

/// Commands and queries over the bay. Cheap to clone; every clone talks to the same
/// stores.
#[derive(Clone)]
pub struct BayService {
    pub(crate) config: Arc<BayConfig>,
    pub(crate) orders: OrderClient,
    pub(crate) notes: NoteClient,
    pub(crate) sequencer: QueueSequencer,
    pub(crate) admission: AdmissionController,
    pub(crate) estimator: WaitEstimator,
    pub(crate) retry: RetryPolicy,
    pub(crate) calendar: BusinessCalendar,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) notifier: Arc<dyn NotificationPort>,
    pub(crate) files: Arc<dyn FileStore>,
    pub(crate) notify_timeout: Duration,
}

/// The running bay: its store actors and the service that uses them.
///
/// # Example
///
/// ```rust,no_run
/// use loading_bay::config::BayConfig;
/// use loading_bay::runtime::{BayDeps, BaySystem};
///
/// # async fn run() -> Result<(), loading_bay::error::BayError> {
/// let config = BayConfig::default();
/// let deps = BayDeps::defaults(&config);
/// let system = BaySystem::start(config, deps).await?;
///
/// let next = system.service.call_next().await;
/// println!("{next:?}");
///
/// system.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct BaySystem {
    pub service: BayService,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl BaySystem {
    /// Validates `config`, spawns the order, counter, bay and note stores, and installs
    /// the free bay record.
    pub async fn start(config: BayConfig, deps: BayDeps) -> Result<Self, BayError> {
        Self::start_with(config, deps, |stores| stores).await
    }

    /// Like [`BaySystem::start`], but `route` sees the store clients before the service
    /// does and may put something in front of them.
    pub async fn start_with(
        config: BayConfig,
        deps: BayDeps,
        route: impl FnOnce(BayStores) -> BayStores,
    ) -> Result<Self, BayError> {
        config
            .validate()
            .map_err(|e| BayError::Validation(e.to_string()))?;
        let offset = config
            .utc_offset()
            .map_err(|e| BayError::Validation(e.to_string()))?;

        let capacity = config.store.channel_capacity;
        let timeout = config.store_timeout();

        // 1. Create actors
        let (order_actor, order_inner) = ResourceActor::<Order>::new(capacity);
        let (counter_actor, counter_inner) = ResourceActor::<DayCounter>::new(capacity);
        let (bay_actor, bay_inner) = ResourceActor::<BaySlot>::new(capacity);
        let (note_actor, note_inner) = ResourceActor::<DeliveryNote>::new(capacity);

        // 2. Start actors
        let handles = vec![
            tokio::spawn(order_actor.run()),
            tokio::spawn(counter_actor.run()),
            tokio::spawn(bay_actor.run()),
            tokio::spawn(note_actor.run()),
        ];

        // 3. Wire clients
        let stores = route(BayStores {
            orders: order_inner,
            counters: counter_inner,
            bay: bay_inner,
            notes: note_inner,
        });
        let orders = OrderClient::new(stores.orders, timeout);
        let counters = CounterClient::new(stores.counters, timeout);
        let bay = BayClient::new(stores.bay, timeout);
        let notes = NoteClient::new(stores.notes, timeout);
        bay.install().await?;

        let retry = RetryPolicy::new(&config.retry);
        let calendar = BusinessCalendar::new(offset);
        let service = BayService {
            sequencer: QueueSequencer::new(counters, retry.clone()),
            admission: AdmissionController::new(
                orders.clone(),
                bay,
                retry.clone(),
                deps.clock.clone(),
            ),
            estimator: WaitEstimator::new(
                orders.clone(),
                config.slot_minutes,
                calendar,
                deps.clock.clone(),
            ),
            orders,
            notes,
            retry,
            calendar,
            clock: deps.clock,
            notifier: deps.notifier,
            files: deps.files,
            notify_timeout: timeout,
            config: Arc::new(config),
        };

        info!(
            slot_minutes = service.config.slot_minutes,
            utc_offset_minutes = service.config.utc_offset_minutes,
            "Loading bay started"
        );
        Ok(Self { service, handles })
    }

    /// Drops the service and waits for every store actor to drain and stop.
    ///
    /// Actors stop once all clients are gone, so clones of the service handed to other
    /// tasks must be dropped first.
    pub async fn shutdown(self) -> Result<(), BayError> {
        info!("Shutting down loading bay...");
        drop(self.service);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(BayError::Dependency(format!("actor task failed: {e}")));
            }
        }

        info!("Loading bay shutdown complete.");
        Ok(())
    }
}
