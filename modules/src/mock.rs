//! # Test Doubles
//!
//! Recording implementations of the host traits, with failure injection.

use crate::config::ModuleConfig;
use crate::registry::DriverRegistry;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use keyshim_hal::input::{InputDeviceId, InputDeviceInfo, InputEvent, InputSubsystem};
use keyshim_hal::platform::{PlatformBus, PlatformDevice, PlatformDeviceId, PlatformDriver};
use keyshim_hal::{HalError, HalResult};
use spin::Mutex;
use std::time::Duration;

/// Host call, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateBundle(String),
    UnregisterDevice(PlatformDeviceId),
    UnregisterDriver(String),
    AllocateInput(InputDeviceId),
    RegisterInput(InputDeviceId),
    UnregisterInput(InputDeviceId),
    FreeInput(InputDeviceId),
}

/// Shared call log across all doubles of one test
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

pub struct MockPlatformDriver {
    name: String,
    probe_result: HalResult<()>,
    probe_delay: Option<Duration>,
    probes: AtomicUsize,
    removes: AtomicUsize,
}

impl MockPlatformDriver {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, Ok(()), None))
    }

    pub fn failing(name: &str, err: HalError) -> Arc<Self> {
        Arc::new(Self::build(name, Err(err), None))
    }

    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(name, Ok(()), Some(delay)))
    }

    fn build(name: &str, probe_result: HalResult<()>, probe_delay: Option<Duration>) -> Self {
        Self {
            name: String::from(name),
            probe_result,
            probe_delay,
            probes: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

impl PlatformDriver for MockPlatformDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self, _device: &PlatformDevice) -> HalResult<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.probe_delay {
            std::thread::sleep(delay);
        }
        self.probe_result
    }

    fn remove(&self, _device: &PlatformDevice) {
        self.removes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Platform bus that probes synchronously inside `create_bundle`
pub struct MockPlatformBus {
    journal: Journal,
    next_id: AtomicU64,
    bound: Mutex<Vec<(PlatformDevice, Arc<dyn PlatformDriver>)>>,
    bundles: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockPlatformBus {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            next_id: AtomicU64::new(1),
            bound: Mutex::new(Vec::new()),
            bundles: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Successful bundle creations
    pub fn bundles_created(&self) -> usize {
        self.bundles.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `create_bundle` calls seen
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl PlatformBus for MockPlatformBus {
    fn create_bundle(&self, driver: Arc<dyn PlatformDriver>) -> HalResult<PlatformDevice> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.journal.push(Call::CreateBundle(String::from(driver.name())));

        let id = PlatformDeviceId::from_raw(self.next_id.fetch_add(1, Ordering::SeqCst));
        let device = PlatformDevice::new(id, driver.name());
        let result = driver.probe(&device).map(|()| {
            self.bound.lock().push((device.clone(), driver.clone()));
            self.bundles.fetch_add(1, Ordering::SeqCst);
            device
        });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn unregister_device(&self, device: &PlatformDevice) {
        self.journal.push(Call::UnregisterDevice(device.id()));
        let mut bound = self.bound.lock();
        if let Some(pos) = bound.iter().position(|(d, _)| d.id() == device.id()) {
            let (device, driver) = bound.remove(pos);
            driver.remove(&device);
        }
    }

    fn unregister_driver(&self, driver: &dyn PlatformDriver) {
        self.journal.push(Call::UnregisterDriver(String::from(driver.name())));
    }
}

pub struct MockInputSubsystem {
    journal: Journal,
    next_id: AtomicU64,
    fail_allocate: AtomicBool,
    fail_register: AtomicBool,
    registered: Mutex<Vec<(InputDeviceId, InputDeviceInfo)>>,
    packets: Mutex<Vec<(InputDeviceId, Vec<InputEvent>)>>,
}

impl MockInputSubsystem {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            next_id: AtomicU64::new(100),
            fail_allocate: AtomicBool::new(false),
            fail_register: AtomicBool::new(false),
            registered: Mutex::new(Vec::new()),
            packets: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_allocate(&self, fail: bool) {
        self.fail_allocate.store(fail, Ordering::SeqCst);
    }

    pub fn fail_register(&self, fail: bool) {
        self.fail_register.store(fail, Ordering::SeqCst);
    }

    /// Devices currently registered
    pub fn registered(&self) -> Vec<InputDeviceId> {
        self.registered.lock().iter().map(|(id, _)| *id).collect()
    }

    /// Packets emitted so far
    pub fn packets(&self) -> Vec<(InputDeviceId, Vec<InputEvent>)> {
        self.packets.lock().clone()
    }
}

impl InputSubsystem for MockInputSubsystem {
    fn allocate_device(&self) -> HalResult<InputDeviceId> {
        if self.fail_allocate.load(Ordering::SeqCst) {
            return Err(HalError::OutOfMemory);
        }
        let id = InputDeviceId::from_raw(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.journal.push(Call::AllocateInput(id));
        Ok(id)
    }

    fn register_device(&self, id: InputDeviceId, info: &InputDeviceInfo) -> HalResult<()> {
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(HalError::RegistrationFailed);
        }
        self.journal.push(Call::RegisterInput(id));
        self.registered.lock().push((id, info.clone()));
        Ok(())
    }

    fn unregister_device(&self, id: InputDeviceId) {
        self.journal.push(Call::UnregisterInput(id));
        self.registered.lock().retain(|(d, _)| *d != id);
    }

    fn free_device(&self, id: InputDeviceId) {
        self.journal.push(Call::FreeInput(id));
    }

    fn emit(&self, id: InputDeviceId, events: &[InputEvent]) {
        self.packets.lock().push((id, events.to_vec()));
    }
}

/// A registry wired to fresh doubles
pub struct Harness {
    pub journal: Journal,
    pub bus: Arc<MockPlatformBus>,
    pub input: Arc<MockInputSubsystem>,
    pub registry: DriverRegistry,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        let bus = Arc::new(MockPlatformBus::new(journal.clone()));
        let input = Arc::new(MockInputSubsystem::new(journal.clone()));
        let registry = DriverRegistry::new(bus.clone(), input.clone(), &ModuleConfig::default());
        Self { journal, bus, input, registry }
    }
}

/// Logger keeping every record, installed once per test binary
pub struct CaptureLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

static LOGGER: CaptureLogger = CaptureLogger { records: Mutex::new(Vec::new()) };

impl CaptureLogger {
    pub fn install() -> &'static CaptureLogger {
        // Another test may have installed it already
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Debug);
        &LOGGER
    }

    pub fn contains(&self, level: log::Level, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        use alloc::string::ToString;
        self.records.lock().push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}
