use super::event::{LoopEvent, CONTINUOUS};

/// Gain readings above this are treated as full power
const MAX_VENDOR_GAIN: u8 = 12;

/// Human-readable delta, rounded up to the largest fitting unit
pub fn format_delta(micros: i64) -> String {
    if micros == CONTINUOUS {
        return "Continuous".to_string();
    }
    let ceil_div = |unit: i64| micros / unit + i64::from(micros % unit != 0);
    match micros {
        m if m >= 60_000_000 => format!("{} min", ceil_div(60_000_000)),
        m if m >= 1_000_000 => format!("{} s", ceil_div(1_000_000)),
        m if m >= 1_000 => format!("{} ms", ceil_div(1_000)),
        m => format!("{} us", m),
    }
}

/// Rough field strength as a percentage of the expected gain range
pub fn gain_percentage(vendor_gain: u8) -> String {
    let squashed = vendor_gain.min(MAX_VENDOR_GAIN) as u32;
    format!("{}%", squashed * 100 / MAX_VENDOR_GAIN as u32)
}

/// Compact rendering of a frame sequence, e.g. `OABFX`
pub fn loop_signature<'a>(events: impl IntoIterator<Item = &'a LoopEvent>) -> String {
    events
        .into_iter()
        .map(|event| event.frame_type.short_name())
        .collect()
}

/// Payload as uppercase hex, the form readers' logs usually use
pub fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02X}", b)).collect()
}
