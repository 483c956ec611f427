//! Test doubles for the hardware capability traits
//!
//! Each double hands out a cloneable handle sharing its state, so a test
//! can keep steering the fake after moving it into a registry or scheduler.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use gridtherm_hal::{
    BusError, Clock, Connectivity, DeviceIdentity, SensorBus, SensorId, Transport, TransportError,
    MAX_BUS_DEVICES,
};

/// Identity with family code 0x28 and `n` as serial
pub fn sensor(n: u8) -> SensorId {
    SensorId::new([0x28, n, 0, 0, 0, 0, 0, n])
}

pub const AMBIENT_C: f32 = 20.0;

#[derive(Default)]
struct BusState {
    ids: Vec<SensorId>,
    readings: BTreeMap<SensorId, f32>,
    unplugged: BTreeSet<SensorId>,
    conversions: usize,
    fail_conversions: bool,
}

pub struct FakeBus {
    state: Rc<RefCell<BusState>>,
}

#[derive(Clone)]
pub struct BusHandle {
    state: Rc<RefCell<BusState>>,
}

impl FakeBus {
    /// Bus with every sensor at [`AMBIENT_C`]
    pub fn new(ids: &[SensorId]) -> Self {
        let state = BusState {
            ids: ids.to_vec(),
            readings: ids.iter().map(|id| (*id, AMBIENT_C)).collect(),
            ..BusState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn handle(&self) -> BusHandle {
        BusHandle {
            state: self.state.clone(),
        }
    }
}

impl BusHandle {
    pub fn set(&self, id: SensorId, celsius: f32) {
        self.state.borrow_mut().readings.insert(id, celsius);
    }

    pub fn unplug(&self, id: SensorId) {
        self.state.borrow_mut().unplugged.insert(id);
    }

    pub fn replug(&self, id: SensorId) {
        self.state.borrow_mut().unplugged.remove(&id);
    }

    pub fn attach(&self, id: SensorId, celsius: f32) {
        let mut state = self.state.borrow_mut();
        state.ids.push(id);
        state.readings.insert(id, celsius);
    }

    pub fn fail_conversions(&self, fail: bool) {
        self.state.borrow_mut().fail_conversions = fail;
    }

    pub fn conversions(&self) -> usize {
        self.state.borrow().conversions
    }
}

impl SensorBus for FakeBus {
    fn discover(&mut self) -> heapless::Vec<SensorId, MAX_BUS_DEVICES> {
        self.state.borrow().ids.iter().copied().collect()
    }

    fn request_conversion(&mut self) -> Result<(), BusError> {
        let mut state = self.state.borrow_mut();
        if state.fail_conversions {
            return Err(BusError::Bus);
        }
        state.conversions += 1;
        Ok(())
    }

    fn read_celsius(&mut self, id: &SensorId) -> Result<f32, BusError> {
        let state = self.state.borrow();
        if state.unplugged.contains(id) {
            return Err(BusError::Disconnected);
        }
        state
            .readings
            .get(id)
            .copied()
            .ok_or(BusError::Disconnected)
    }
}

#[derive(Default)]
struct TransportState {
    posts: Vec<(String, Vec<u8>)>,
    response: Vec<u8>,
    error: Option<TransportError>,
}

pub struct FakeTransport {
    state: Rc<RefCell<TransportState>>,
}

#[derive(Clone)]
pub struct TransportHandle {
    state: Rc<RefCell<TransportState>>,
}

impl FakeTransport {
    /// Endpoint answering every request with `response`
    pub fn new(response: &[u8]) -> Self {
        let state = TransportState {
            response: response.to_vec(),
            ..TransportState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn handle(&self) -> TransportHandle {
        TransportHandle {
            state: self.state.clone(),
        }
    }
}

impl TransportHandle {
    pub fn respond_with(&self, response: &[u8]) {
        self.state.borrow_mut().response = response.to_vec();
    }

    pub fn fail_with(&self, error: Option<TransportError>) {
        self.state.borrow_mut().error = error;
    }

    pub fn post_count(&self) -> usize {
        self.state.borrow().posts.len()
    }

    /// URL and decoded JSON body of the most recent request
    pub fn last_post(&self) -> Option<(String, serde_json::Value)> {
        let state = self.state.borrow();
        let (url, body) = state.posts.last()?;
        let value = serde_json::from_slice(body).ok()?;
        Some((url.clone(), value))
    }
}

impl Transport for FakeTransport {
    fn post(
        &mut self,
        url: &str,
        body: &[u8],
        response: &mut [u8],
    ) -> Result<usize, TransportError> {
        let mut state = self.state.borrow_mut();
        state.posts.push((url.to_string(), body.to_vec()));
        if let Some(error) = state.error {
            return Err(error);
        }
        let len = state.response.len();
        if len > response.len() {
            return Err(TransportError::ResponseTooLarge);
        }
        response[..len].copy_from_slice(&state.response);
        Ok(len)
    }
}

#[derive(Default)]
struct NetworkState {
    connected: bool,
    reconnects_succeed: bool,
    reconnects: Vec<(String, String)>,
}

pub struct FakeNetwork {
    state: Rc<RefCell<NetworkState>>,
}

#[derive(Clone)]
pub struct NetworkHandle {
    state: Rc<RefCell<NetworkState>>,
}

impl FakeNetwork {
    pub fn connected() -> Self {
        Self::with_link(true)
    }

    pub fn disconnected() -> Self {
        Self::with_link(false)
    }

    fn with_link(connected: bool) -> Self {
        let state = NetworkState {
            connected,
            reconnects_succeed: true,
            ..NetworkState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn handle(&self) -> NetworkHandle {
        NetworkHandle {
            state: self.state.clone(),
        }
    }
}

impl NetworkHandle {
    pub fn drop_link(&self) {
        self.state.borrow_mut().connected = false;
    }

    pub fn reconnects_succeed(&self, succeed: bool) {
        self.state.borrow_mut().reconnects_succeed = succeed;
    }

    pub fn reconnects(&self) -> Vec<(String, String)> {
        self.state.borrow().reconnects.clone()
    }
}

impl Connectivity for FakeNetwork {
    fn is_connected(&mut self) -> bool {
        self.state.borrow().connected
    }

    fn reconnect(&mut self, ssid: &str, password: &str) {
        let mut state = self.state.borrow_mut();
        state
            .reconnects
            .push((ssid.to_string(), password.to_string()));
        state.connected = state.reconnects_succeed;
    }
}

/// Clock advanced by hand
#[derive(Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

pub struct FixedIdentity(pub &'static str);

impl DeviceIdentity for FixedIdentity {
    fn device_id(&self) -> &str {
        self.0
    }
}
