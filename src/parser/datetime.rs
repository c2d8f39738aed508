//! Decoder for the Lotus Notes compact date-time encoding.
//!
//! Notes view exports carry timestamps like `20100405T170000,00-04`: fixed
//! character positions, a `,NN` fractional-second field, and a sign+hours
//! timezone fragment. Parsing is positional, not delimiter-based, and the
//! offsets below are a wire contract — do not "clean them up".

use chrono::{DateTime, FixedOffset};

use crate::error::{NotesError, Result};

/// Minimum accepted input length (through the fractional-second field).
const MIN_LEN: usize = 18;

/// Decode a Notes compact date-time string into an offset-carrying instant.
///
/// Field layout (byte offsets):
///
/// ```text
/// 2 0 1 0 0 4 0 5 T 1 7 0 0 0 0 , 0 0 - 0 4
/// 0       4   6   8 9    11   13  16   18
/// [year ) [mo)[dy)  [hr)[min)[sec) [ff)[tz )
/// ```
///
/// Position 8 is a separator and is skipped without being validated. The
/// fractional seconds at `[16,18)` are discarded. The `±hh` timezone fragment
/// at `[18,21)` is right-padded with `00` to a full `±hhmm` offset, so `-04`
/// becomes `-0400`. The reconstructed `YYYY-MM-DD HH:MM:SS±HHMM` string is
/// handed to chrono for calendar validation, and the returned instant keeps
/// that exact offset.
///
/// Errors: [`NotesError::DateTooShort`] when the input is under 18
/// characters; [`NotesError::DateFormat`] when the timezone fragment is
/// missing, a slice lands off a character boundary, or the reconstructed
/// string is not a valid calendar date-time (month 13, stray letters, ...).
pub fn parse_notes_datetime(input: &str) -> Result<DateTime<FixedOffset>> {
    if input.len() < MIN_LEN {
        return Err(NotesError::DateTooShort(input.to_string()));
    }

    let field = |range: std::ops::Range<usize>, what: &str| -> Result<&str> {
        input.get(range).ok_or_else(|| NotesError::DateFormat {
            input: input.to_string(),
            reason: format!("{what} fragment missing or not sliceable"),
        })
    };

    let year = field(0..4, "year")?;
    let month = field(4..6, "month")?;
    let day = field(6..8, "day")?;
    let hour = field(9..11, "hour")?;
    let minute = field(11..13, "minute")?;
    let second = field(13..15, "second")?;
    let zone = field(18..21, "timezone")?;

    let canonical = format!("{year}-{month}-{day} {hour}:{minute}:{second}{zone}00");
    DateTime::parse_from_str(&canonical, "%Y-%m-%d %H:%M:%S%z").map_err(|e| {
        NotesError::DateFormat {
            input: input.to_string(),
            reason: e.to_string(),
        }
    })
}
