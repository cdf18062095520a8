use pollscope::capture::{FrameSource, SimulatedReader};
use pollscope::core::format::{format_delta, gain_percentage, hex, loop_signature};
use pollscope::engine::{ObserveRuntime, PipelineConfig};
use pollscope::observability::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging("info");

    println!("Pollscope - Simulated Reader Demo");
    println!("=================================\n");

    let config = PipelineConfig::from_json(serde_json::json!({
        "sample_threshold": 64,
        "history_limit": 4096
    }))?;

    // Clock starts just below a 32-bit rollover so the wrap shows up early
    let mut reader = SimulatedReader::default();
    reader
        .configure(serde_json::json!({
            "frames_per_batch": 5,
            "start_timestamp": u32::MAX as u64 - 500_000,
            "counter_modulus": u32::MAX as u64 + 1,
            "interval_ms": 10,
            "max_batches": 40
        }))
        .await?;

    let mut runtime = ObserveRuntime::new(config);
    runtime.start()?;
    runtime.attach_source(Box::new(reader))?;
    runtime.join_feed().await?;
    runtime.shutdown().await?;

    let view = runtime.latest();
    println!(
        "History: {} events, period: {} frames ({})\n",
        view.history_len,
        view.cycle.len(),
        loop_signature(&view.cycle)
    );

    for (i, activation) in view.loops.iter().enumerate() {
        println!(
            "Loop {}: idle {} -> {} frames, closed after {}",
            i + 1,
            format_delta(activation.start_delta),
            activation.events.len(),
            format_delta(activation.end_delta)
        );
        for event in &activation.events {
            println!(
                "  {} {:<24} {:>10} {:>5}  {}",
                event.frame_type.short_name(),
                event.name(),
                format_delta(event.delta),
                gain_percentage(event.vendor_gain),
                hex(&event.data)
            );
        }
    }

    if let Some(monitor) = runtime.get_monitor() {
        println!("\n{}", monitor.generate_report());
    }

    Ok(())
}
