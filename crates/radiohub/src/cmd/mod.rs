use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use radiohub::device::Request;
use radiohub_frame::buffer::BoundedBuffer;
use radiohub_frame::message::{CRC_SIZE, HEADER_SIZE};
use radiohub_frame::WireMessage;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a request and print its SLIP encoding.
    Encode(EncodeArgs),
    /// Deframe SLIP bytes and print every decoded message.
    Decode(DecodeArgs),
    /// Send one request to a device.
    Send(SendArgs),
    /// Print decoded messages from a device until interrupted.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Device-management requests available by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeviceRequest {
    Ping,
    DeviceInfo,
    FirmwareVersion,
    Restart,
    GetDateTime,
    SetDateTime,
    GetSystemOptions,
}

impl From<DeviceRequest> for Request {
    fn from(request: DeviceRequest) -> Self {
        match request {
            DeviceRequest::Ping => Request::Ping,
            DeviceRequest::DeviceInfo => Request::GetDeviceInfo,
            DeviceRequest::FirmwareVersion => Request::GetFirmwareVersion,
            DeviceRequest::Restart => Request::RestartDevice,
            DeviceRequest::GetDateTime => Request::GetDateTime,
            DeviceRequest::SetDateTime => Request::set_date_time_now(),
            DeviceRequest::GetSystemOptions => Request::GetSystemOptions,
        }
    }
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Device-management request by name.
    #[arg(long, conflicts_with_all = ["endpoint", "message", "payload"])]
    pub request: Option<DeviceRequest>,
    /// Endpoint id (decimal or 0x-prefixed hex).
    #[arg(long, short = 'e', value_parser = parse_id, required_unless_present = "request")]
    pub endpoint: Option<u8>,
    /// Message id (decimal or 0x-prefixed hex).
    #[arg(long, short = 'm', value_parser = parse_id, required_unless_present = "request")]
    pub message: Option<u8>,
    /// Payload bytes as hex (separators `-`, `:` and spaces are ignored).
    #[arg(long, short = 'p')]
    pub payload: Option<String>,
    /// END bytes sent ahead of the frame to wake the module's UART.
    #[arg(long, default_value = "0")]
    pub wakeup: usize,
}

impl RequestArgs {
    /// Build the request message, without CRC.
    pub fn to_message(&self) -> CliResult<WireMessage> {
        if let Some(request) = self.request {
            return Ok(Request::from(request).to_message());
        }
        let (Some(endpoint), Some(message)) = (self.endpoint, self.message) else {
            return Err(CliError::new(
                USAGE,
                "either --request or both --endpoint and --message are required",
            ));
        };
        let payload = match &self.payload {
            Some(hex) => parse_hex(hex)?,
            None => Vec::new(),
        };
        let mut msg = WireMessage::request(HEADER_SIZE + payload.len() + CRC_SIZE, endpoint, message);
        msg.append_bytes(&payload);
        Ok(msg)
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// SLIP bytes as hex. Reads raw bytes from stdin when omitted.
    #[arg(conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read raw SLIP bytes from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial device, already configured for the module's baud rate.
    pub path: PathBuf,
    #[command(flatten)]
    pub request: RequestArgs,
    /// Wait for one decoded message and print it.
    #[arg(long)]
    pub wait: bool,
    /// Write timeout, and wait timeout with --wait (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device, already configured for the module's baud rate.
    pub path: PathBuf,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse an 8-bit id written as decimal or `0x`-prefixed hex.
pub fn parse_id(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid id `{input}` (expected 0-255 or 0x00-0xff)"))
}

/// Parse hex text into bytes. Separators are ignored; anything else that
/// is not a hex digit is rejected.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !matches!(b, b'-' | b':' | b' ' | b'\t' | b'\n' | b'\r'))
        .collect();
    if let Some(bad) = digits.iter().find(|b| !b.is_ascii_hexdigit()) {
        return Err(CliError::new(
            USAGE,
            format!("invalid hex digit `{}`", char::from(*bad)),
        ));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }
    Ok(BoundedBuffer::from(digits).decode_hex_pairs().as_slice().to_vec())
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
