//! General system configuration
//!
//! Chip setup for embassy, the SoftDevice's own clock and connection setup
//! and the watchface settings.

use core::mem;

use embassy_nrf::{
    config::{Config, Debug},
    interrupt::Priority,
};
use nrf_softdevice::raw;
use sunshine_face::FaceConfig;

/// Offset of local time from UTC until the phone reports its time zone
const TIMEZONE: i32 = 3_600;

/// Name shown while advertising
pub const DEVICE_NAME: &[u8] = b"Sunshine";

/// Watchface settings for the PineTime panel
pub const FACE_CONFIG: FaceConfig = FaceConfig {
    utc_offset_secs: TIMEZONE,
    ..FaceConfig::DEFAULT
};

/// Chip configuration for `embassy_nrf::init`
pub fn chip() -> Config {
    // Generate default config, required because Config is set as
    // `non_exhaustive`. Clocks are left alone, the SoftDevice owns them.
    let mut config = Config::default();

    // Enable DC/DC regulator to massively reduce runtime current consumption
    config.dcdc.reg1 = true;

    // Configure interrupt priorities to exclude 0 (default), 1, and 4,
    // which are reserved for the nrf SoftDevice
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;

    // Allow debugging
    config.debug = Debug::Allowed;

    config
}

/// SoftDevice configuration: 32 kHz crystal, one peripheral link
pub fn softdevice() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            // SAFETY: all-zero is the "no access" security mode
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}
