use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use radiohub_endpoint::DispatchOutcome;
use radiohub_frame::{hex_string, KeyValueStore, WireMessage};
use radiohub_hub::HubClient;
use serde::Serialize;
use tracing::warn;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    records: &'a KeyValueStore,
    timestamp: String,
}

#[derive(Serialize)]
struct EncodedOutput {
    endpoint: u8,
    message: u8,
    message_bytes: String,
    wire: String,
    wire_size: usize,
}

/// Prints decoded events as they arrive, up to an optional limit.
pub struct EventPrinter {
    format: OutputFormat,
    limit: Option<usize>,
    printed: usize,
    dropped: usize,
}

impl EventPrinter {
    pub fn new(format: OutputFormat, limit: Option<usize>) -> Self {
        Self {
            format,
            limit,
            printed: 0,
            dropped: 0,
        }
    }

    pub fn printed(&self) -> usize {
        self.printed
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_done(&self) -> bool {
        self.limit.is_some_and(|limit| self.printed >= limit)
    }
}

impl HubClient for EventPrinter {
    fn on_data_event(&mut self, result: &KeyValueStore) {
        if self.is_done() {
            return;
        }
        print_event(result, self.format);
        self.printed += 1;
    }

    fn on_dropped(&mut self, frame: &WireMessage, outcome: DispatchOutcome) {
        self.dropped += 1;
        warn!(reason = %outcome, frame = %frame, "frame dropped");
    }
}

/// Print one decoded event.
pub fn print_event(result: &KeyValueStore, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EventOutput {
                records: result,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KEY", "VALUE"]);
            for record in result {
                table.add_row(vec![
                    record.key_str().into_owned(),
                    record.value_str().into_owned(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            print!("{result}");
            println!();
        }
        OutputFormat::Raw => print_raw(result.as_bytes()),
    }
}

/// Print an encoded request: the message with its CRC and the SLIP bytes.
pub fn print_encoded(
    endpoint: u8,
    message: u8,
    message_bytes: &[u8],
    wire: &[u8],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                endpoint,
                message,
                message_bytes: hex_string(message_bytes),
                wire: hex_string(wire),
                wire_size: wire.len(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ENDPOINT", "MESSAGE", "SIZE", "WIRE"])
                .add_row(vec![
                    format!("0x{endpoint:02x}"),
                    format!("0x{message:02x}"),
                    wire.len().to_string(),
                    hex_string(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", hex_string(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
