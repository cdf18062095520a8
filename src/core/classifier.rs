//! Byte-level labelling of polling frames.
//!
//! Every lookup works on fixed byte offsets of the payload. A range that
//! falls outside the payload never matches, so [`classify`] is total.

use super::event::FrameType;

/// Label for frames nothing else recognizes
pub const FALLBACK_LABEL: &str = "PLF";

const FELICA_SYSTEM_CODES: &[([u8; 2], &str)] = &[
    ([0xFF, 0xFF], "WILDCARD"),
    ([0x00, 0x03], "CJRC"),
    ([0x80, 0x08], "OCTOPUS"),
    ([0xFE, 0x00], "COMMON"),
    ([0x12, 0xFC], "NDEF"),
    ([0x88, 0xB4], "LITE"),
    ([0x95, 0x7A], "ID"),
];

const ECP_TRANSIT_CODES: &[([u8; 3], &str)] = &[
    ([0x03, 0x00, 0x00], "VENTRA"),
    ([0x03, 0x04, 0x00], "HOPCARD"),
    ([0x03, 0x00, 0x02], "TFL"),
    ([0x03, 0x00, 0x01], "WMATA"),
    ([0x03, 0x00, 0x05], "LATAP"),
    ([0x03, 0x00, 0x07], "CLIPPER"),
    ([0x03, 0x09, 0x5A], "NAVIGO"),
];

const ECP_ACCESS_SUBTYPES: &[(u8, &str)] = &[
    (0x00, "UNIVERSITY"),
    (0x01, "AUTOMOTIVE"),
    (0x08, "AUTOMOTIVE"),
    (0x09, "AUTOMOTIVE"),
    (0x0A, "AUTOMOTIVE"),
    (0x0B, "AUTOMOTIVE"),
    (0x06, "HOME"),
];

const ECP1_FIXED: &[(&[u8], &str)] = &[
    (&[0x6A, 0x01, 0x00, 0x00, 0x00], "VAS_OR_PAYMENT"),
    (&[0x6A, 0x01, 0x00, 0x00, 0x01], "VAS_AND_PAYMENT"),
    (&[0x6A, 0x01, 0x00, 0x00, 0x02], "VAS_ONLY"),
    (&[0x6A, 0x01, 0x00, 0x00, 0x03], "PAY_ONLY"),
    (&[0x6A, 0x01, 0xCF, 0x00, 0x00], "IGNORE"),
    (&[0x6A, 0x01, 0xC3, 0x00, 0x00], "GYMKIT"),
];

const ECP1_TRANSIT_PREFIX: &[u8] = &[0x6A, 0x01, 0x03];

/// Semantic label for a frame. ON and OFF are field markers and get an empty label.
pub fn classify(frame_type: FrameType, data: &[u8]) -> String {
    match frame_type {
        FrameType::On | FrameType::Off => String::new(),
        FrameType::A => classify_type_a(data),
        FrameType::B => classify_type_b(data),
        FrameType::F => classify_type_f(data),
        FrameType::Unknown(_) => classify_other(data),
    }
}

fn classify_type_a(data: &[u8]) -> String {
    match data.first() {
        Some(0x52) => "WUPA".to_string(),
        Some(0x26) => "REQA".to_string(),
        _ => classify_other(data),
    }
}

fn classify_type_b(data: &[u8]) -> String {
    if data.first() == Some(&0x05) {
        let last = data.last().copied().unwrap_or(0);
        return if last & 0x08 != 0 { "WUPB" } else { "REQB" }.to_string();
    }
    classify_other(data)
}

fn classify_type_f(data: &[u8]) -> String {
    match bytes_at(data, 1, 2) {
        Some(code) => lookup(FELICA_SYSTEM_CODES, code).unwrap_or("UNKNOWN").to_string(),
        None => classify_other(data),
    }
}

/// Fallback table shared by every technology
fn classify_other(data: &[u8]) -> String {
    match data {
        // Innovatron B'
        [0x01, 0x0B, 0x3F, 0x80] => return "APGEN".to_string(),
        // ST SRx
        [0x06, 0x00] => return "INITIATE".to_string(),
        // ASK CTx
        [0x10] => return "REQT".to_string(),
        [0x50, 0x00] => return "HLTA".to_string(),
        [0x50, _, _, _, _] => return "HLTB".to_string(),
        _ => {}
    }

    // Picopass, no proper CRC
    if (1..=2).contains(&data.len()) {
        match data.last() {
            Some(0x0A) => return "ACTALL".to_string(),
            Some(0x0C) => return "IDENTIFY".to_string(),
            _ => {}
        }
    }

    if data.first() == Some(&0x6A) && data.len() >= 4 {
        return match data[1] {
            0x01 => format!("ECP1_{}", classify_ecp1(data)),
            0x02 => format!("ECP2_{}", classify_ecp2(data)),
            _ => "ECP_UNKNOWN".to_string(),
        };
    }

    if let [byte] = data {
        match *byte {
            0x7A => return "MAGWUP1".to_string(),
            0x7B => return "MAGWUP2".to_string(),
            0x7C => return "MAGWUP3".to_string(),
            0x7D => return "MAGWUP4".to_string(),
            0x70..=0x7F => return "MAGWUPU".to_string(),
            // Mifare backdoor wakeups
            0x40 | 0x20 => return "WUPC1".to_string(),
            0x43 | 0x23 => return "WUPC2".to_string(),
            _ => {}
        }
    }

    FALLBACK_LABEL.to_string()
}

fn classify_ecp1(data: &[u8]) -> String {
    if let Some((_, label)) = ECP1_FIXED.iter().find(|(pattern, _)| *pattern == data) {
        return label.to_string();
    }
    if data.starts_with(ECP1_TRANSIT_PREFIX) {
        return format!("TRANSIT_{}", transit_name(bytes_at(data, 3, 3)));
    }
    "UNKNOWN".to_string()
}

fn classify_ecp2(data: &[u8]) -> String {
    match bytes_at(data, 3, 1) {
        Some([0x01]) => format!("TRANSIT_{}", transit_name(bytes_at(data, 5, 3))),
        Some([0x02]) => {
            let subtype = bytes_at(data, 4, 1)
                .and_then(|b| {
                    ECP_ACCESS_SUBTYPES
                        .iter()
                        .find(|(code, _)| *code == b[0])
                        .map(|(_, label)| *label)
                })
                .unwrap_or("UNKNOWN");
            format!("ACCESS_{}", subtype)
        }
        Some([0x03]) => "IDENTITY".to_string(),
        Some([0x05]) => "HANDOVER".to_string(),
        _ => "UNKNOWN".to_string(),
    }
}

fn transit_name(code: Option<&[u8]>) -> &'static str {
    code.and_then(|c| lookup(ECP_TRANSIT_CODES, c)).unwrap_or("UNKNOWN")
}

fn lookup<const N: usize>(
    table: &[([u8; N], &'static str)],
    key: &[u8],
) -> Option<&'static str> {
    table
        .iter()
        .find(|(code, _)| code.as_slice() == key)
        .map(|(_, label)| *label)
}

fn bytes_at(data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    data.get(offset..offset.checked_add(len)?)
}
