//! Simulated station platform for host builds.
//!
//! [`SimPlatform`] implements every collaborator service in memory. It records
//! each call in order, can be told to fail chosen operations, and delivers
//! events to subscribed callbacks synchronously on the calling thread.
//!
//! Clones share state, so a test keeps one clone to drive events and inspect
//! calls while the controller owns another.

use super::config::{Ssid, StationConfig};
use super::event::{EventClass, IpEvent, WifiEvent};
use super::platform::{
    ApRecord, AuthMode, DriverError, EventCallback, EventDispatch, MacAddressSource, MacKind,
    NetifService, RadioDriver, WifiMode,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Code returned by operations marked as failing (`ESP_FAIL`).
pub const SIM_FAILURE: DriverError = DriverError::new(-1);

/// Code returned by an AP query while not associated (`ESP_ERR_WIFI_NOT_CONNECT`).
pub const SIM_NOT_CONNECTED: DriverError = DriverError::new(0x300f);

/// Operation kinds, used to inject failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOp {
    ReadMac,
    CreateNetif,
    Init,
    Subscribe(EventClass),
    Unsubscribe(EventClass),
    SetMode,
    SetConfig,
    Start,
    Connect,
    SetHostname,
    QueryAp,
    DestroyNetif,
    Deinit,
}

/// A recorded call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    ReadMac,
    CreateNetif,
    Init,
    Subscribe(EventClass),
    Unsubscribe(EventClass),
    SetMode(WifiMode),
    SetConfig(StationConfig),
    Start,
    Connect,
    SetHostname { netif: u32, hostname: String },
    QueryAp,
    /// The interface handle was dropped.
    DestroyNetif { netif: u32 },
    /// The initialised driver was dropped.
    Deinit,
}

impl SimCall {
    pub fn op(&self) -> SimOp {
        match self {
            Self::ReadMac => SimOp::ReadMac,
            Self::CreateNetif => SimOp::CreateNetif,
            Self::Init => SimOp::Init,
            Self::Subscribe(class) => SimOp::Subscribe(*class),
            Self::Unsubscribe(class) => SimOp::Unsubscribe(*class),
            Self::SetMode(_) => SimOp::SetMode,
            Self::SetConfig(_) => SimOp::SetConfig,
            Self::Start => SimOp::Start,
            Self::Connect => SimOp::Connect,
            Self::SetHostname { .. } => SimOp::SetHostname,
            Self::QueryAp => SimOp::QueryAp,
            Self::DestroyNetif { .. } => SimOp::DestroyNetif,
            Self::Deinit => SimOp::Deinit,
        }
    }
}

/// Simulated network interface. Records its destruction when dropped.
pub struct SimNetif {
    id: u32,
    state: Arc<SimState>,
}

impl SimNetif {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for SimNetif {
    fn drop(&mut self) {
        lock(&self.state.calls).push(SimCall::DestroyNetif { netif: self.id });
    }
}

impl fmt::Debug for SimNetif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimNetif").field("id", &self.id).finish()
    }
}

/// Driver brought up by `init`, shared by clones taken afterwards.
struct SimDriver {
    state: Arc<SimState>,
}

impl Drop for SimDriver {
    fn drop(&mut self) {
        lock(&self.state.calls).push(SimCall::Deinit);
    }
}

/// Token for a simulated subscription.
#[derive(Debug, PartialEq, Eq)]
pub struct SimSubscription {
    id: u32,
    class: EventClass,
}

type SharedCallback = Arc<dyn Fn(EventClass, i32) + Send + Sync>;

struct Subscriber {
    id: u32,
    class: EventClass,
    callback: SharedCallback,
}

struct SimState {
    mac: [u8; 6],
    calls: Mutex<Vec<SimCall>>,
    failing: Mutex<HashSet<SimOp>>,
    subscribers: Mutex<Vec<Subscriber>>,
    associated: Mutex<Option<ApRecord>>,
    next_id: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory implementation of the station collaborators.
///
/// The driver is deinitialised when the last clone holding it is dropped.
/// Clones taken before `init` do not hold it.
#[derive(Clone)]
pub struct SimPlatform {
    state: Arc<SimState>,
    driver: Option<Arc<SimDriver>>,
}

impl SimPlatform {
    /// Create a platform reporting `mac` as the station hardware address.
    pub fn new(mac: [u8; 6]) -> Self {
        Self {
            state: Arc::new(SimState {
                mac,
                calls: Mutex::new(Vec::new()),
                failing: Mutex::new(HashSet::new()),
                subscribers: Mutex::new(Vec::new()),
                associated: Mutex::new(None),
                next_id: AtomicU32::new(1),
            }),
            driver: None,
        }
    }

    /// Make every future call of `op` fail with [`SIM_FAILURE`].
    ///
    /// For [`SimOp::CreateNetif`] the interface service returns nothing.
    pub fn fail(&self, op: SimOp) {
        lock(&self.state.failing).insert(op);
    }

    /// Let `op` succeed again.
    pub fn recover(&self, op: SimOp) {
        lock(&self.state.failing).remove(&op);
    }

    /// Set the AP reported by association queries. `None` means not associated.
    pub fn set_associated(&self, record: Option<ApRecord>) {
        *lock(&self.state.associated) = record;
    }

    /// Deliver an event to every callback subscribed to `class`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn deliver(&self, class: EventClass, id: i32) -> usize {
        let callbacks: Vec<SharedCallback> = lock(&self.state.subscribers)
            .iter()
            .filter(|s| s.class == class)
            .map(|s| s.callback.clone())
            .collect();

        // Callbacks call back into the platform, so no lock is held here.
        for callback in &callbacks {
            callback(class, id);
        }
        callbacks.len()
    }

    pub fn deliver_wifi(&self, event: WifiEvent) -> usize {
        self.deliver(EventClass::Wifi, event.id())
    }

    pub fn deliver_ip(&self, event: IpEvent) -> usize {
        self.deliver(EventClass::Ip, event.id())
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<SimCall> {
        lock(&self.state.calls).clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        lock(&self.state.calls).clear();
    }

    /// Number of recorded calls of `op`.
    pub fn count(&self, op: SimOp) -> usize {
        lock(&self.state.calls)
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        lock(&self.state.subscribers).len()
    }

    fn record(&self, call: SimCall) -> Result<(), DriverError> {
        let op = call.op();
        lock(&self.state.calls).push(call);
        if lock(&self.state.failing).contains(&op) {
            Err(SIM_FAILURE)
        } else {
            Ok(())
        }
    }

    fn next_id(&self) -> u32 {
        self.state.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])
    }
}

impl RadioDriver for SimPlatform {
    fn init(&mut self) -> Result<(), DriverError> {
        self.record(SimCall::Init)?;
        self.driver = Some(Arc::new(SimDriver {
            state: self.state.clone(),
        }));
        Ok(())
    }

    fn set_mode(&self, mode: WifiMode) -> Result<(), DriverError> {
        self.record(SimCall::SetMode(mode))
    }

    fn set_config(&self, config: &StationConfig) -> Result<(), DriverError> {
        self.record(SimCall::SetConfig(config.clone()))
    }

    fn start(&self) -> Result<(), DriverError> {
        self.record(SimCall::Start)
    }

    fn connect(&self) -> Result<(), DriverError> {
        self.record(SimCall::Connect)
    }

    fn query_associated_ap(&self) -> Result<ApRecord, DriverError> {
        self.record(SimCall::QueryAp)?;
        lock(&self.state.associated)
            .clone()
            .ok_or(SIM_NOT_CONNECTED)
    }
}

impl NetifService for SimPlatform {
    type Netif = SimNetif;

    fn create_default_station(&mut self) -> Option<SimNetif> {
        self.record(SimCall::CreateNetif).ok()?;
        Some(SimNetif {
            id: self.next_id(),
            state: self.state.clone(),
        })
    }

    fn set_hostname(&self, netif: &SimNetif, hostname: &str) -> Result<(), DriverError> {
        self.record(SimCall::SetHostname {
            netif: netif.id,
            hostname: hostname.to_owned(),
        })
    }
}

impl EventDispatch for SimPlatform {
    type Subscription = SimSubscription;

    fn subscribe(
        &self,
        class: EventClass,
        callback: EventCallback,
    ) -> Result<SimSubscription, DriverError> {
        self.record(SimCall::Subscribe(class))?;
        let id = self.next_id();
        lock(&self.state.subscribers).push(Subscriber {
            id,
            class,
            callback: Arc::from(callback),
        });
        Ok(SimSubscription { id, class })
    }

    fn unsubscribe(&self, subscription: SimSubscription) -> Result<(), DriverError> {
        self.record(SimCall::Unsubscribe(subscription.class))?;
        let mut subscribers = lock(&self.state.subscribers);
        let before = subscribers.len();
        subscribers.retain(|s| s.id != subscription.id);
        if subscribers.len() == before {
            // ESP_ERR_INVALID_ARG
            return Err(DriverError::new(0x102));
        }
        Ok(())
    }
}

impl MacAddressSource for SimPlatform {
    fn read_mac(&self, _kind: MacKind) -> [u8; 6] {
        // Reading the MAC cannot fail on the device either.
        let _ = self.record(SimCall::ReadMac);
        self.state.mac
    }
}

/// A plausible AP record for demos and tests.
pub fn sample_ap(ssid: &str) -> ApRecord {
    ApRecord {
        bssid: [0x10, 0x20, 0x30, 0x40, 0x50, 0x60],
        ssid: Ssid::from_truncating(ssid.as_bytes()),
        channel: 6,
        rssi: -52,
        auth_mode: AuthMode::Wpa2Psk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let platform = SimPlatform::default();
        platform.connect().unwrap();
        platform.start().unwrap();
        assert_eq!(platform.calls(), vec![SimCall::Connect, SimCall::Start]);
    }

    #[test]
    fn test_fail_and_recover() {
        let platform = SimPlatform::default();
        platform.fail(SimOp::Connect);
        assert_eq!(platform.connect(), Err(SIM_FAILURE));
        platform.recover(SimOp::Connect);
        assert_eq!(platform.connect(), Ok(()));
        // Failed calls are still recorded
        assert_eq!(platform.count(SimOp::Connect), 2);
    }

    #[test]
    fn test_failed_netif_creation_returns_none() {
        let mut platform = SimPlatform::default();
        platform.fail(SimOp::CreateNetif);
        assert!(platform.create_default_station().is_none());
    }

    #[test]
    fn test_deliver_only_to_matching_class() {
        let platform = SimPlatform::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        platform
            .subscribe(
                EventClass::Ip,
                Box::new(move |class, id| sink.lock().unwrap().push((class, id))),
            )
            .unwrap();

        assert_eq!(platform.deliver(EventClass::Wifi, 2), 0);
        assert_eq!(platform.deliver(EventClass::Ip, 0), 1);
        assert_eq!(*seen.lock().unwrap(), vec![(EventClass::Ip, 0)]);
    }

    #[test]
    fn test_unsubscribe_removes_callback() {
        let platform = SimPlatform::default();
        let sub = platform
            .subscribe(EventClass::Wifi, Box::new(|_, _| {}))
            .unwrap();
        assert_eq!(platform.subscription_count(), 1);
        platform.unsubscribe(sub).unwrap();
        assert_eq!(platform.subscription_count(), 0);
        assert_eq!(platform.deliver(EventClass::Wifi, 0), 0);
    }

    #[test]
    fn test_dropping_netif_and_driver_is_recorded() {
        let mut platform = SimPlatform::default();
        let netif = platform.create_default_station().unwrap();
        let id = netif.id();
        let observer = platform.clone();
        platform.init().unwrap();

        drop(netif);
        drop(platform);

        let calls = observer.calls();
        assert_eq!(
            &calls[calls.len() - 2..],
            &[SimCall::DestroyNetif { netif: id }, SimCall::Deinit]
        );
    }

    #[test]
    fn test_query_not_associated() {
        let platform = SimPlatform::default();
        assert_eq!(platform.query_associated_ap(), Err(SIM_NOT_CONNECTED));
        platform.set_associated(Some(sample_ap("Home")));
        assert_eq!(platform.query_associated_ap().unwrap().channel, 6);
    }
}
