use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use radiohub::device::{self, DeviceManagement};
use radiohub_hub::{open, HubConfig};

use crate::cmd::ListenArgs;
use crate::exit::{hub_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{EventPrinter, OutputFormat};

const IDLE_SLEEP: Duration = Duration::from_millis(10);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = HubConfig {
        registry: device::registry_config(),
        ..HubConfig::default()
    };
    let mut hub = open(&args.path, config).map_err(|err| hub_error("open failed", err))?;
    hub.register(DeviceManagement::new())
        .map_err(|err| hub_error("register failed", err))?;
    hub.enable();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printer = EventPrinter::new(format, args.count);
    while running.load(Ordering::SeqCst) {
        let consumed = hub
            .poll(&mut printer)
            .map_err(|err| hub_error("receive failed", err))?;
        if printer.is_done() {
            break;
        }
        if consumed == 0 {
            thread::sleep(IDLE_SLEEP);
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
