use pulse_engine::device::GpuInit;
use pulse_engine::logging::{LoggingConfig, init_logging};
use pulse_engine::window::{Runtime, RuntimeConfig};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());
    log::info!("pulse starting");

    Runtime::run(RuntimeConfig::default(), GpuInit::default())
}
