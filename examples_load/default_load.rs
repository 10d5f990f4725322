use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use mqtt_log_backend::init::{init_tracing_with_config, LayerConfig};
use mqtt_log_backend::noop_sink::NoopBackend;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LayerConfig { enable_stdout: false, ..LayerConfig::default() };
    init_tracing_with_config(Arc::new(NoopBackend), config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("default config: dispatched {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
