use chrono::Duration;

use crate::model::attendance::AttendanceType;

fn hours_minutes(total: i64) -> (i64, i64) {
    (total / 60, total % 60)
}

fn span(total: i64) -> String {
    match hours_minutes(total) {
        (0, m) => format!("{} menit", m),
        (h, m) => format!("{} jam {} menit", h, m),
    }
}

/// Human-readable text for a stored time note.
///
/// Check-in notes (`"-70"`, `"+5"`) become "Telat ..." / "Lebih cepat ...";
/// check-out notes are already prose and pass through. Anything unparsable
/// also passes through.
pub fn format_note(note: &str, kind: AttendanceType) -> String {
    if kind == AttendanceType::Keluar {
        return note.to_string();
    }

    let trimmed = note.trim();
    let (label, digits) = if let Some(rest) = trimmed.strip_prefix('-') {
        ("Telat", rest)
    } else if let Some(rest) = trimmed.strip_prefix('+') {
        ("Lebih cepat", rest)
    } else {
        return note.to_string();
    };

    match digits.parse::<i64>() {
        Ok(minutes) if minutes >= 0 => format!("{} {}", label, span(minutes)),
        _ => note.to_string(),
    }
}

/// Note stored on a check-out record.
pub fn checkout_note(present_for: Option<Duration>) -> String {
    match present_for {
        Some(d) => {
            let (h, m) = hours_minutes(d.num_minutes().max(0));
            format!("Hadir selama {} jam {} menit", h, m)
        }
        None => "Tidak absen masuk".to_string(),
    }
}
