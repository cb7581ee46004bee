//! Communication channels between tasks

use chrono::NaiveDateTime;
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel};
use sunshine_face::{DataEvent, TapType};

/// Everything the watchface task reacts to, in arrival order
pub enum FaceEvent {
    /// Side button pressed
    Button,
    /// Touch gesture
    Touch(TapType),
    /// Phone connected
    Connected,
    /// Phone went away
    ConnectionSuspended,
    /// Could not start advertising
    ConnectionFailed,
    /// Data item written by the phone
    DataChanged(DataEvent),
    /// Phone wrote its current local time
    SetTime(NaiveDateTime),
    /// Phone reported its UTC offset
    TimeZone(i32),
}

pub static FACE_EVENTS: Channel<ThreadModeRawMutex, FaceEvent, 8> = Channel::new();
