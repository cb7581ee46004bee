//! Bluetooth module
//!
//! Carries the weather data-sync channel over a custom GATT service and lets
//! the phone set the clock through the Current Time Service.

use core::{
    cell::RefCell,
    num::NonZeroU32,
    sync::atomic::{AtomicBool, Ordering},
};

use embassy_futures::select::{select, select3, Either, Either3};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel, signal::Signal};
use heapless::Vec;
use nrf_softdevice::{
    ble::{gatt_server, peripheral, Connection},
    raw, Softdevice,
};
use sunshine_face::{
    clock,
    sync::{DataItem, OutboundSlot, MAX_WIRE_LEN},
    DataEvent, DataLink, LinkError, SyncError,
};

use crate::events::{FaceEvent, FACE_EVENTS};
use crate::system::config::DEVICE_NAME;

pub type Payload = Vec<u8, MAX_WIRE_LEN>;

/// Whether the face wants the phone link up
static LINK_ENABLED: Signal<ThreadModeRawMutex, bool> = Signal::new();
/// Whether a phone is currently connected
static PEER_CONNECTED: AtomicBool = AtomicBool::new(false);
/// Items waiting to be notified to the phone
static OUTBOX: Channel<ThreadModeRawMutex, Payload, 2> = Channel::new();

const ADV_DATA_LEN: usize = 3 + 2 + DEVICE_NAME.len();
// Legacy advertising payload limit
const _: () = assert!(ADV_DATA_LEN <= 31);

/// Flags, complete local name
static ADV_DATA: [u8; ADV_DATA_LEN] = adv_data();

/// Complete list of 128-bit services: weather sync
static SCAN_DATA: [u8; 18] = [
    0x11, 0x07, 0x3f, 0x2e, 0x1d, 0x0c, 0x9b, 0x3a, 0x7e, 0x8d, 0x5a, 0x4b, 0x3b, 0x9c, 0x01,
    0x00, 0x1f, 0x5e,
];

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub sync: WeatherSyncService,
    pub cts: CurrentTimeService,
}

#[nrf_softdevice::gatt_service(uuid = "5e1f0001-9c3b-4b5a-8d7e-3a9b0c1d2e3f")]
pub struct WeatherSyncService {
    /// Data items written by the phone
    #[characteristic(uuid = "5e1f0002-9c3b-4b5a-8d7e-3a9b0c1d2e3f", write)]
    pub data_item: Payload,
    /// Data items published by the watch
    #[characteristic(uuid = "5e1f0003-9c3b-4b5a-8d7e-3a9b0c1d2e3f", read, notify)]
    pub request: Payload,
}

#[nrf_softdevice::gatt_service(uuid = "1805")]
pub struct CurrentTimeService {
    #[characteristic(uuid = "2a2b", read, write)]
    pub current_time: [u8; clock::CTS_CURRENT_TIME_LEN],
    #[characteristic(uuid = "2a0f", read, write)]
    pub local_time_info: [u8; clock::CTS_LOCAL_TIME_INFO_LEN],
}

/// `DataLink` backed by the BLE link task
pub struct BleLink {
    enabled: bool,
}

impl BleLink {
    pub const fn new() -> Self {
        Self { enabled: false }
    }
}

impl DataLink for BleLink {
    fn connect(&mut self) {
        self.enabled = true;
        LINK_ENABLED.signal(true);
    }

    fn disconnect(&mut self) {
        self.enabled = false;
        LINK_ENABLED.signal(false);
    }

    /// The link counts as connected from `connect` until `disconnect`, while
    /// it advertises as well as while a phone is attached.
    fn is_connected(&self) -> bool {
        self.enabled
    }

    fn put_data_item(&mut self, item: &DataItem) -> Result<(), LinkError> {
        if !PEER_CONNECTED.load(Ordering::Relaxed) {
            return Err(LinkError::NotConnected);
        }

        let mut buf = [0u8; MAX_WIRE_LEN];
        let encoded = item.encode(&mut buf)?;
        let payload = Payload::from_slice(encoded).map_err(|_| SyncError::BufferTooSmall)?;
        OUTBOX.try_send(payload).map_err(|_| LinkError::Busy)
    }
}

/// RNG backed by the SoftDevice, which owns the RNG peripheral
pub struct SoftdeviceRng {
    sd: &'static Softdevice,
}

impl SoftdeviceRng {
    const UNAVAILABLE: NonZeroU32 = match NonZeroU32::new(rand_core::Error::CUSTOM_START) {
        Some(code) => code,
        None => panic!(),
    };

    pub fn new(sd: &'static Softdevice) -> Self {
        Self { sd }
    }
}

impl rand_core::RngCore for SoftdeviceRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if self.try_fill_bytes(dest).is_err() {
            defmt::warn!("SoftDevice RNG pool empty");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        nrf_softdevice::random_bytes(self.sd, dest).map_err(|_| Self::UNAVAILABLE.into())
    }
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Advertise while the face wants the link and serve one phone at a time
#[embassy_executor::task]
pub async fn link_task(sd: &'static Softdevice, server: &'static Server) {
    let config = peripheral::Config::default();

    loop {
        // Idle until the face asks for the phone
        while !LINK_ENABLED.wait().await {}
        defmt::info!("Advertising");

        loop {
            let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
                adv_data: &ADV_DATA,
                scan_data: &SCAN_DATA,
            };

            let conn = match select(
                peripheral::advertise_connectable(sd, adv, &config),
                LINK_ENABLED.wait(),
            )
            .await
            {
                Either::First(Ok(conn)) => conn,
                Either::First(Err(err)) => {
                    defmt::warn!("Advertising failed: {:?}", err);
                    FACE_EVENTS.send(FaceEvent::ConnectionFailed).await;
                    break;
                }
                Either::Second(true) => continue,
                Either::Second(false) => break,
            };

            PEER_CONNECTED.store(true, Ordering::Relaxed);
            FACE_EVENTS.send(FaceEvent::Connected).await;

            let disabled = serve(&conn, server).await;

            PEER_CONNECTED.store(false, Ordering::Relaxed);
            FACE_EVENTS.send(FaceEvent::ConnectionSuspended).await;

            if disabled {
                break;
            }
        }
    }
}

/// Serve one connection. Returns whether the face disabled the link.
async fn serve(conn: &Connection, server: &Server) -> bool {
    let outbound = RefCell::new(OutboundSlot::<Payload>::new());

    let gatt = gatt_server::run(conn, server, |event| match event {
        ServerEvent::Sync(WeatherSyncServiceEvent::DataItemWrite(bytes)) => {
            match DataItem::decode(&bytes) {
                Ok(item) => forward(FaceEvent::DataChanged(DataEvent::Changed(item))),
                Err(err) => defmt::warn!("Dropping malformed data item: {:?}", err),
            }
        }
        ServerEvent::Sync(WeatherSyncServiceEvent::RequestCccdWrite { notifications }) => {
            defmt::debug!("Request notifications: {}", notifications);
            let mut slot = outbound.borrow_mut();
            let pending = slot.set_subscribed(notifications).cloned();
            if let Some(payload) = pending {
                if notify(conn, server, &payload) {
                    slot.mark_delivered();
                }
            }
        }
        ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeWrite(bytes)) => {
            match clock::decode_current_time(&bytes) {
                Ok(time) => forward(FaceEvent::SetTime(time)),
                Err(err) => defmt::warn!("Invalid current time: {:?}", err),
            }
        }
        ServerEvent::Cts(CurrentTimeServiceEvent::LocalTimeInfoWrite(bytes)) => {
            match clock::decode_local_time_info(&bytes) {
                Ok(offset) => forward(FaceEvent::TimeZone(offset)),
                Err(err) => defmt::warn!("Invalid local time information: {:?}", err),
            }
        }
    });

    let pump = async {
        loop {
            let payload = OUTBOX.receive().await;
            // Readable even if the phone never subscribes
            if let Err(err) = server.sync.request_set(&payload) {
                defmt::warn!("Failed to set request value: {:?}", err);
            }

            let mut slot = outbound.borrow_mut();
            let ready = slot.push(payload).cloned();
            match ready {
                Some(payload) => {
                    if notify(conn, server, &payload) {
                        slot.mark_delivered();
                    }
                }
                None => defmt::debug!("Request held until the phone subscribes"),
            }
        }
    };

    let disabled = async { while LINK_ENABLED.wait().await {} };

    match select3(gatt, pump, disabled).await {
        Either3::First(reason) => {
            defmt::info!("Phone disconnected: {:?}", reason);
            false
        }
        Either3::Second(_) => false,
        Either3::Third(()) => {
            defmt::info!("Link disabled, disconnecting");
            if let Err(err) = conn.disconnect() {
                defmt::warn!("Disconnect failed: {:?}", err);
            }
            true
        }
    }
}

fn notify(conn: &Connection, server: &Server, payload: &Payload) -> bool {
    match server.sync.request_notify(conn, payload) {
        Ok(()) => true,
        Err(err) => {
            defmt::warn!("Failed to notify phone: {:?}", err);
            false
        }
    }
}

const fn adv_data() -> [u8; ADV_DATA_LEN] {
    let mut data = [0u8; ADV_DATA_LEN];
    data[0] = 0x02;
    data[1] = 0x01;
    data[2] = raw::BLE_GAP_ADV_FLAGS_LE_ONLY_GENERAL_DISC_MODE as u8;
    data[3] = DEVICE_NAME.len() as u8 + 1;
    data[4] = 0x09;

    let mut i = 0;
    while i < DEVICE_NAME.len() {
        data[5 + i] = DEVICE_NAME[i];
        i += 1;
    }
    data
}

fn forward(event: FaceEvent) {
    if FACE_EVENTS.try_send(event).is_err() {
        defmt::warn!("Face event queue full, dropping event");
    }
}
