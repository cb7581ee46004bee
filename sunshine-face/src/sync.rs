//! Weather data-sync channel
//!
//! The phone and the watch exchange small data items: a path plus a handful of
//! string keys and values, postcard-encoded on the wire.
//!
//! ```text
//! watch ──► phone   "/weather" { uuid: <random v4 UUID> }        (request)
//! phone ──► watch   "/weather" { high: "24°", low: "9°", ... }   (update)
//! ```
//!
//! Requests are fire-and-forget: there is no acknowledgement, no retry and no
//! matching of updates to requests.

use heapless::{String, Vec};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{LinkError, SyncError};
use crate::weather::{Temperature, WeatherUpdate, MAX_TEMPERATURE_LEN};

/// Path carrying weather requests and updates
pub const WEATHER_PATH: &str = "/weather";

pub const KEY_UUID: &str = "uuid";
pub const KEY_HIGH: &str = "high";
pub const KEY_LOW: &str = "low";
pub const KEY_WEATHER_ID: &str = "weatherID";

pub const MAX_PATH_LEN: usize = 32;
pub const MAX_KEY_LEN: usize = 16;
pub const MAX_VALUE_LEN: usize = 40;
pub const MAX_ENTRIES: usize = 8;

/// Largest encoded item carried in one GATT write or notification
pub const MAX_WIRE_LEN: usize = 244;

pub type Path = String<MAX_PATH_LEN>;
pub type Key = String<MAX_KEY_LEN>;
pub type Value = String<MAX_VALUE_LEN>;

/// String-keyed payload of a data item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataMap {
    entries: Vec<(Key, Value), MAX_ENTRIES>,
}

impl DataMap {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert or replace a string entry
    pub fn put_string(&mut self, key: &str, value: &str) -> Result<(), SyncError> {
        let value = Value::try_from(value).map_err(|_| SyncError::ValueTooLong)?;

        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            *existing = value;
            return Ok(());
        }

        let key = Key::try_from(key).map_err(|_| SyncError::KeyTooLong)?;
        self.entries
            .push((key, value))
            .map_err(|_| SyncError::MapFull)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get_string(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A path and its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataItem {
    path: Path,
    data: DataMap,
}

impl DataItem {
    pub fn new(path: &str) -> Result<Self, SyncError> {
        Ok(Self {
            path: Path::try_from(path).map_err(|_| SyncError::PathTooLong)?,
            data: DataMap::new(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data(&self) -> &DataMap {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataMap {
        &mut self.data
    }

    /// Encode into `buf`, returning the used prefix
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], SyncError> {
        Ok(postcard::to_slice(self, buf)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

/// Change notification delivered by the sync transport
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataEvent {
    Changed(DataItem),
    Deleted(Path),
}

/// Transport client for the data-sync channel
pub trait DataLink {
    /// Start connecting to the paired phone. Completion is reported back to
    /// the engine through `on_connected` or `on_connection_failed`.
    fn connect(&mut self);

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Publish an item to the phone
    fn put_data_item(&mut self, item: &DataItem) -> Result<(), LinkError>;
}

/// Latest outbound payload of one connection.
///
/// A notification only reaches the phone once it has subscribed, so the
/// payload is held until then. Only the newest payload is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSlot<T> {
    latest: Option<T>,
    delivered: bool,
    subscribed: bool,
}

impl<T> OutboundSlot<T> {
    pub const fn new() -> Self {
        Self {
            latest: None,
            delivered: false,
            subscribed: false,
        }
    }

    /// Store a payload. Returns it when the phone is subscribed and it can be
    /// notified right away.
    pub fn push(&mut self, payload: T) -> Option<&T> {
        self.latest = Some(payload);
        self.delivered = false;
        if self.subscribed {
            self.latest.as_ref()
        } else {
            None
        }
    }

    /// Phone changed its subscription. Returns the undelivered payload to
    /// notify now.
    pub fn set_subscribed(&mut self, subscribed: bool) -> Option<&T> {
        self.subscribed = subscribed;
        if subscribed && !self.delivered {
            self.latest.as_ref()
        } else {
            None
        }
    }

    /// Last notification went out
    pub fn mark_delivered(&mut self) {
        self.delivered = true;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Newest payload, delivered or not
    pub fn latest(&self) -> Option<&T> {
        self.latest.as_ref()
    }
}

impl<T> Default for OutboundSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the temperatures of a weather item.
///
/// Returns `None` for items on any other path. Values longer than a cached
/// temperature are cut at a character boundary.
pub fn weather_update(item: &DataItem) -> Option<WeatherUpdate> {
    if item.path() != WEATHER_PATH {
        return None;
    }

    let data = item.data();
    Some(WeatherUpdate {
        high: data.get_string(KEY_HIGH).map(temperature),
        low: data.get_string(KEY_LOW).map(temperature),
    })
}

fn temperature(value: &str) -> Temperature {
    let mut end = value.len().min(MAX_TEMPERATURE_LEN);
    while !value.is_char_boundary(end) {
        end -= 1;
    }

    let mut temp = Temperature::new();
    // Fits by construction
    let _ = temp.push_str(&value[..end]);
    temp
}

/// Build the item asking the phone for fresh weather data
pub fn request_weather_data<R: RngCore + ?Sized>(rng: &mut R) -> Result<DataItem, SyncError> {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    let id = uuid::Builder::from_random_bytes(bytes).into_uuid();

    let mut buf = [0u8; uuid::fmt::Hyphenated::LENGTH];
    let id = id.hyphenated().encode_lower(&mut buf);

    let mut item = DataItem::new(WEATHER_PATH)?;
    item.data_mut().put_string(KEY_UUID, id)?;
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counter-based RNG, deterministic across runs
    struct StepRng(u32);

    impl RngCore for StepRng {
        fn next_u32(&mut self) -> u32 {
            self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            self.0
        }

        fn next_u64(&mut self) -> u64 {
            rand_core::impls::next_u64_via_u32(self)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            rand_core::impls::fill_bytes_via_next(self, dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn weather_item(high: Option<&str>, low: Option<&str>) -> DataItem {
        let mut item = DataItem::new(WEATHER_PATH).unwrap();
        if let Some(high) = high {
            item.data_mut().put_string(KEY_HIGH, high).unwrap();
        }
        if let Some(low) = low {
            item.data_mut().put_string(KEY_LOW, low).unwrap();
        }
        item
    }

    #[test]
    fn test_put_replaces_existing_key() {
        let mut map = DataMap::new();
        map.put_string(KEY_HIGH, "20°").unwrap();
        map.put_string(KEY_HIGH, "22°").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_string(KEY_HIGH), Some("22°"));
    }

    #[test]
    fn test_put_rejects_oversize_and_overflow() {
        let mut map = DataMap::new();
        assert_eq!(
            map.put_string("a-key-that-is-far-too-long", "x"),
            Err(SyncError::KeyTooLong)
        );
        assert_eq!(
            map.put_string("k", "0123456789012345678901234567890123456789!"),
            Err(SyncError::ValueTooLong)
        );

        let keys = ["a", "b", "c", "d", "e", "f", "g", "h"];
        for key in keys {
            map.put_string(key, "1").unwrap();
        }
        assert_eq!(map.put_string("i", "1"), Err(SyncError::MapFull));
        assert_eq!(map.iter().count(), MAX_ENTRIES);
    }

    #[test]
    fn test_weather_update_from_full_payload() {
        let mut item = weather_item(Some("25°"), Some("16°"));
        item.data_mut().put_string(KEY_WEATHER_ID, "800").unwrap();

        let update = weather_update(&item).unwrap();
        assert_eq!(update.high.as_deref(), Some("25°"));
        assert_eq!(update.low.as_deref(), Some("16°"));
    }

    #[test]
    fn test_weather_update_reports_missing_fields() {
        let update = weather_update(&weather_item(Some("25°"), None)).unwrap();
        assert_eq!(update.high.as_deref(), Some("25°"));
        assert_eq!(update.low, None);
    }

    #[test]
    fn test_other_paths_are_ignored() {
        let mut item = DataItem::new("/weather-data").unwrap();
        item.data_mut().put_string(KEY_HIGH, "25°").unwrap();
        assert_eq!(weather_update(&item), None);
    }

    #[test]
    fn test_long_temperature_is_cut_on_char_boundary() {
        // 15 ASCII bytes then a two-byte degree sign straddling the limit
        let item = weather_item(Some("123456789012345°C"), Some("1"));
        let update = weather_update(&item).unwrap();
        assert_eq!(update.high.as_deref(), Some("123456789012345"));
    }

    #[test]
    fn test_wire_format_survives_transport() {
        let item = weather_item(Some("-3°"), Some("-11°"));
        let mut buf = [0u8; MAX_WIRE_LEN];
        let len = item.encode(&mut buf).unwrap().len();
        assert_eq!(DataItem::decode(&buf[..len]).unwrap(), item);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(DataItem::decode(&[]), Err(SyncError::Malformed));

        // Path length prefix of 40 exceeds MAX_PATH_LEN
        let mut bytes = [b'x'; 48];
        bytes[0] = 40;
        assert_eq!(DataItem::decode(&bytes), Err(SyncError::Malformed));
    }

    #[test]
    fn test_encode_into_short_buffer() {
        let item = weather_item(Some("25°"), Some("16°"));
        let mut buf = [0u8; 4];
        assert_eq!(item.encode(&mut buf), Err(SyncError::BufferTooSmall));
    }

    #[test]
    fn test_outbound_held_until_subscribed() {
        let mut slot = OutboundSlot::new();
        assert_eq!(slot.push(1u8), None);
        assert_eq!(slot.latest(), Some(&1));

        assert_eq!(slot.set_subscribed(true), Some(&1));
        slot.mark_delivered();

        // Re-subscribing does not repeat a delivered payload
        assert_eq!(slot.set_subscribed(false), None);
        assert_eq!(slot.set_subscribed(true), None);
    }

    #[test]
    fn test_outbound_sent_at_once_when_subscribed() {
        let mut slot = OutboundSlot::new();
        assert_eq!(slot.set_subscribed(true), None);
        assert_eq!(slot.push(7u8), Some(&7));
    }

    #[test]
    fn test_outbound_keeps_newest_only() {
        let mut slot = OutboundSlot::new();
        slot.push(1u8);
        slot.push(2u8);
        assert_eq!(slot.set_subscribed(true), Some(&2));
    }

    #[test]
    fn test_outbound_retries_failed_notification_on_resubscribe() {
        let mut slot = OutboundSlot::new();
        slot.push(3u8);
        // Notification failed, not marked delivered
        assert_eq!(slot.set_subscribed(true), Some(&3));
        assert_eq!(slot.set_subscribed(true), Some(&3));
        assert!(slot.is_subscribed());
    }

    #[test]
    fn test_request_carries_random_v4_uuid() {
        let mut rng = StepRng(7);
        let first = request_weather_data(&mut rng).unwrap();
        let second = request_weather_data(&mut rng).unwrap();

        assert_eq!(first.path(), WEATHER_PATH);
        assert_eq!(first.data().len(), 1);

        let id = first.data().get_string(KEY_UUID).unwrap();
        assert_eq!(id.len(), 36);
        assert_eq!(id.as_bytes()[14], b'4');
        assert!(matches!(id.as_bytes()[19], b'8' | b'9' | b'a' | b'b'));
        assert!(id.bytes().all(|b| b == b'-' || b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));

        assert_ne!(second.data().get_string(KEY_UUID), Some(id));
    }
}
