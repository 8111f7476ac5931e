//! Device-management endpoint of the radio module.
//!
//! Covers the module-wide services every firmware exposes under endpoint
//! `0x01`: ping, device and firmware information, restart, the real-time
//! clock and the system option flags. Responses decode into key/value
//! records; nested fields use dotted keys such as `Device Info.Module ID`.

use chrono::{DateTime, Utc};
use radiohub_endpoint::{Endpoint, MessageEntry, MessageTable, RegistryConfig};
use radiohub_frame::message::{EVENT_DATA_INDEX, RESPONSE_DATA_INDEX};
use radiohub_frame::{hex_string_lsb, KeyValueStore, WireMessage};

pub const ENDPOINT_ID: u8 = 0x01;

pub const STARTUP_IND: u8 = 0x00;
pub const PING_REQ: u8 = 0x01;
pub const PING_RSP: u8 = 0x02;
pub const GET_DEVICE_INFO_REQ: u8 = 0x03;
pub const GET_DEVICE_INFO_RSP: u8 = 0x04;
pub const GET_FIRMWARE_VERSION_REQ: u8 = 0x05;
pub const GET_FIRMWARE_VERSION_RSP: u8 = 0x06;
pub const RESTART_DEVICE_REQ: u8 = 0x07;
pub const RESTART_DEVICE_RSP: u8 = 0x08;
pub const SET_DATE_TIME_REQ: u8 = 0x0D;
pub const SET_DATE_TIME_RSP: u8 = 0x0E;
pub const GET_DATE_TIME_REQ: u8 = 0x0F;
pub const GET_DATE_TIME_RSP: u8 = 0x10;
pub const SET_SYSTEM_OPTIONS_REQ: u8 = 0xF7;
pub const SET_SYSTEM_OPTIONS_RSP: u8 = 0xF8;
pub const GET_SYSTEM_OPTIONS_REQ: u8 = 0xF9;
pub const GET_SYSTEM_OPTIONS_RSP: u8 = 0xFA;

/// Response status codes.
pub mod status {
    pub const OK: u8 = 0x00;
    pub const ERROR: u8 = 0x01;
    pub const COMMAND_NOT_SUPPORTED: u8 = 0x02;
    pub const WRONG_PARAMETER: u8 = 0x03;
    pub const WRONG_APPLICATION_MODE: u8 = 0x04;
    pub const RESERVED: u8 = 0x05;
    pub const APPLICATION_BUSY: u8 = 0x06;
    pub const WRONG_MESSAGE_LENGTH: u8 = 0x07;
    pub const NVM_WRITE_ERROR: u8 = 0x08;
    pub const NVM_READ_ERROR: u8 = 0x09;
    pub const COMMAND_REJECTED: u8 = 0x0A;
}

/// System option bits.
pub const OPTION_APS: u32 = 1 << 0;
pub const OPTION_TRACE: u32 = 1 << 1;
pub const OPTION_RTC: u32 = 1 << 2;
pub const OPTION_WATCHDOG: u32 = 1 << 3;
pub const OPTION_STARTUP_EVENT: u32 = 1 << 4;

const OPTION_NAMES: [(u32, &str); 5] = [
    (OPTION_APS, "APS"),
    (OPTION_TRACE, "Trace"),
    (OPTION_RTC, "RTC"),
    (OPTION_WATCHDOG, "WatchDog"),
    (OPTION_STARTUP_EVENT, "Startup Event"),
];

/// Result store size that fits a fully decoded startup indication.
pub const RESULT_CAPACITY: usize = 512;

// Module type(1) + module id(4) + product type(4) + product id(4).
const DEVICE_INFO_SIZE: usize = 13;
// Version(2) + build count(2) + build date(10) + name(at least 1).
const FIRMWARE_INFO_MIN_SIZE: usize = 15;
const BUILD_DATE_SIZE: usize = 10;
const REQUEST_CAPACITY: usize = 16;
const DATE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

const MESSAGES: [MessageEntry; 9] = [
    MessageEntry::new(STARTUP_IND, "startup indication", decode_startup),
    MessageEntry::new(PING_RSP, "ping device response", decode_default),
    MessageEntry::new(GET_DEVICE_INFO_RSP, "get device info response", decode_device_info),
    MessageEntry::new(
        GET_FIRMWARE_VERSION_RSP,
        "get firmware version response",
        decode_firmware_version,
    ),
    MessageEntry::new(GET_DATE_TIME_RSP, "get date time response", decode_date_time),
    MessageEntry::new(SET_DATE_TIME_RSP, "set date time response", decode_default),
    MessageEntry::new(RESTART_DEVICE_RSP, "restart device response", decode_default),
    MessageEntry::new(SET_SYSTEM_OPTIONS_RSP, "set system options response", decode_default),
    MessageEntry::new(
        GET_SYSTEM_OPTIONS_RSP,
        "get system options response",
        decode_system_options,
    ),
];

/// Text for a response status byte. Unknown codes read as `error`.
pub fn status_text(code: u8) -> &'static str {
    match code {
        status::OK => "ok",
        status::ERROR => "error",
        status::COMMAND_NOT_SUPPORTED => "command not supported",
        status::WRONG_PARAMETER => "wrong parameter",
        status::WRONG_APPLICATION_MODE => "wrong application mode",
        status::RESERVED => "reserved",
        status::APPLICATION_BUSY => "application busy",
        status::WRONG_MESSAGE_LENGTH => "wrong message length",
        status::NVM_WRITE_ERROR => "NVM write error",
        status::NVM_READ_ERROR => "NVM read error",
        status::COMMAND_REJECTED => "command rejected",
        _ => "error",
    }
}

pub fn module_type_name(module_type: u8) -> Option<&'static str> {
    match module_type {
        104 => Some("iM284A-XL"),
        109 => Some("iM891A-XL"),
        110 => Some("iU891A-XL"),
        163 => Some("iM881A-XL"),
        _ => None,
    }
}

/// Registry settings sized for this endpoint's largest result.
pub fn registry_config() -> RegistryConfig {
    RegistryConfig {
        result_capacity: RESULT_CAPACITY,
        ..RegistryConfig::default()
    }
}

/// Changes to apply with a set-system-options request. `None` leaves the
/// option as it is on the module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemOptionsUpdate {
    pub trace: Option<bool>,
    pub startup_event: Option<bool>,
}

impl SystemOptionsUpdate {
    /// `(mask, options)` as sent on the wire.
    pub fn mask_and_options(&self) -> (u32, u32) {
        let mut mask = 0;
        let mut options = 0;
        for (setting, bit) in [
            (self.trace, OPTION_TRACE),
            (self.startup_event, OPTION_STARTUP_EVENT),
        ] {
            if let Some(on) = setting {
                mask |= bit;
                if on {
                    options |= bit;
                }
            }
        }
        (mask, options)
    }
}

/// Requests a host can send to the device-management endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Ping,
    GetDeviceInfo,
    GetFirmwareVersion,
    RestartDevice,
    GetDateTime,
    /// Set the module clock, in seconds since the Unix epoch.
    SetDateTime(u32),
    GetSystemOptions,
    SetSystemOptions(SystemOptionsUpdate),
}

impl Request {
    /// Set the module clock to the host's current time.
    pub fn set_date_time_now() -> Self {
        let now = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        Self::SetDateTime(now)
    }

    pub fn message_id(&self) -> u8 {
        match self {
            Self::Ping => PING_REQ,
            Self::GetDeviceInfo => GET_DEVICE_INFO_REQ,
            Self::GetFirmwareVersion => GET_FIRMWARE_VERSION_REQ,
            Self::RestartDevice => RESTART_DEVICE_REQ,
            Self::GetDateTime => GET_DATE_TIME_REQ,
            Self::SetDateTime(_) => SET_DATE_TIME_REQ,
            Self::GetSystemOptions => GET_SYSTEM_OPTIONS_REQ,
            Self::SetSystemOptions(_) => SET_SYSTEM_OPTIONS_REQ,
        }
    }

    /// Message id of the matching response.
    pub fn response_id(&self) -> u8 {
        self.message_id() + 1
    }

    /// Build the request message, ready for `send`.
    pub fn to_message(&self) -> WireMessage {
        let mut msg = WireMessage::request(REQUEST_CAPACITY, ENDPOINT_ID, self.message_id());
        match self {
            Self::SetDateTime(seconds) => {
                msg.append_u32(*seconds);
            }
            Self::SetSystemOptions(update) => {
                let (mask, options) = update.mask_and_options();
                msg.append_u32(mask);
                msg.append_u32(options);
            }
            _ => {}
        }
        msg
    }
}

/// The device-management endpoint.
#[derive(Debug, Clone)]
pub struct DeviceManagement {
    table: MessageTable,
}

impl DeviceManagement {
    pub fn new() -> Self {
        Self {
            table: MessageTable::from_entries(&MESSAGES),
        }
    }
}

impl Default for DeviceManagement {
    fn default() -> Self {
        Self::new()
    }
}

impl Endpoint for DeviceManagement {
    fn id(&self) -> u8 {
        ENDPOINT_ID
    }

    fn name(&self) -> &str {
        "Device Management"
    }

    fn table(&self) -> &MessageTable {
        &self.table
    }
}

fn decode_default(msg: &WireMessage, result: &mut KeyValueStore) -> bool {
    if msg.payload_length().unwrap_or(0) < 1 {
        return false;
    }
    result.append("Status", status_text(msg.response_status()));
    true
}

fn decode_startup(msg: &WireMessage, result: &mut KeyValueStore) -> bool {
    if msg.payload_length().unwrap_or(0) < DEVICE_INFO_SIZE + FIRMWARE_INFO_MIN_SIZE {
        return false;
    }
    result.append_nested("Device Info", &device_info(msg, EVENT_DATA_INDEX));
    result.append_nested(
        "Firmware Info",
        &firmware_info(msg, EVENT_DATA_INDEX + DEVICE_INFO_SIZE),
    );
    true
}

fn decode_device_info(msg: &WireMessage, result: &mut KeyValueStore) -> bool {
    if msg.response_payload_length().unwrap_or(0) < DEVICE_INFO_SIZE {
        return false;
    }
    let status = msg.response_status();
    result.append("Status", status_text(status));
    if status == status::OK {
        result.append_nested("Device Info", &device_info(msg, RESPONSE_DATA_INDEX));
    }
    true
}

fn decode_firmware_version(msg: &WireMessage, result: &mut KeyValueStore) -> bool {
    if msg.response_payload_length().unwrap_or(0) < FIRMWARE_INFO_MIN_SIZE {
        return false;
    }
    let status = msg.response_status();
    result.append("Status", status_text(status));
    if status == status::OK {
        result.append_nested("Firmware Info", &firmware_info(msg, RESPONSE_DATA_INDEX));
    }
    true
}

fn decode_date_time(msg: &WireMessage, result: &mut KeyValueStore) -> bool {
    if msg.response_payload_length().unwrap_or(0) < 4 {
        return false;
    }
    let status = msg.response_status();
    result.append("Status", status_text(status));
    if status == status::OK {
        let seconds = msg.read_u32(RESPONSE_DATA_INDEX);
        let mut info = KeyValueStore::default();
        info.append("Seconds since epoch", seconds.to_string());
        info.append("Date Time", format_date_time(seconds));
        result.append_nested("Date Time Info", &info);
    }
    true
}

fn decode_system_options(msg: &WireMessage, result: &mut KeyValueStore) -> bool {
    if msg.response_payload_length().unwrap_or(0) < 4 {
        return false;
    }
    let status = msg.response_status();
    result.append("Status", status_text(status));
    if status == status::OK {
        let options = msg.read_u32(RESPONSE_DATA_INDEX);
        for (bit, name) in OPTION_NAMES {
            let state = if options & bit != 0 { "on" } else { "off" };
            result.append(format!("System Options.Options.{name}"), state);
        }
    }
    true
}

fn device_info(msg: &WireMessage, index: usize) -> KeyValueStore {
    let mut info = KeyValueStore::default();
    let module_type = msg.read_u8(index);
    match module_type_name(module_type) {
        Some(name) => info.append("Module Type", name),
        None => info.append("Module Type", format!("unknown module type:{module_type}")),
    };
    info.append("Module ID", msg.read_u32(index + 1).to_string());
    info.append("Product Type", hex_string_lsb(msg.read_bytes(index + 5, Some(4))));
    info.append("Product ID", hex_string_lsb(msg.read_bytes(index + 9, Some(4))));
    info
}

fn firmware_info(msg: &WireMessage, index: usize) -> KeyValueStore {
    let mut info = KeyValueStore::default();
    let version = format!("{}.{}", msg.read_u8(index + 1), msg.read_u8(index));
    info.append("Version", version);
    info.append("Build Count", msg.read_u16(index + 2).to_string());
    info.append("Build Date", msg.read_bytes(index + 4, Some(BUILD_DATE_SIZE)));
    info.append("Firmware Name", msg.read_bytes(index + 4 + BUILD_DATE_SIZE, None));
    info
}

/// `dd-mm-yyyy hh:mm:ss`, UTC.
fn format_date_time(seconds: u32) -> String {
    DateTime::<Utc>::from_timestamp(i64::from(seconds), 0)
        .map(|dt| dt.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_default()
}
