//! Error types

/// Errors building, encoding or decoding data-sync items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    /// Path longer than `MAX_PATH_LEN`
    PathTooLong,
    /// Key longer than `MAX_KEY_LEN`
    KeyTooLong,
    /// Value longer than `MAX_VALUE_LEN`
    ValueTooLong,
    /// Data map already holds `MAX_ENTRIES` entries
    MapFull,
    /// Output buffer too small for the encoded item
    BufferTooSmall,
    /// Bytes on the wire are not a valid data item
    Malformed,
}

impl From<postcard::Error> for SyncError {
    fn from(err: postcard::Error) -> Self {
        match err {
            postcard::Error::SerializeBufferFull => SyncError::BufferTooSmall,
            _ => SyncError::Malformed,
        }
    }
}

/// Errors reported by a data-sync transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// No peer is connected
    NotConnected,
    /// Outbound queue is full
    Busy,
    /// Item could not be encoded for transport
    Sync(SyncError),
}

impl From<SyncError> for LinkError {
    fn from(err: SyncError) -> Self {
        LinkError::Sync(err)
    }
}

/// Errors decoding clock data sent by the phone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Value shorter than the characteristic requires
    TooShort,
    /// Fields do not form a valid calendar date or time of day
    InvalidDateTime,
    /// Phone reported the time zone as unknown
    UnknownTimeZone,
}
