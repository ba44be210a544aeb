//! Shared-secret gate in front of the interactive console.

use std::io::{self, BufRead, Write};

/// Number of tries before the console refuses access.
pub const MAX_ATTEMPTS: u32 = 3;

/// Prompt for `secret` up to `attempts` times.
///
/// Returns `Ok(true)` once the trimmed answer matches. End of input counts as
/// a denial.
pub fn authenticate<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    secret: &str,
    attempts: u32,
) -> io::Result<bool> {
    let mut remaining = attempts;
    let mut line = String::new();

    while remaining > 0 {
        write!(output, "Enter system password: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        if line.trim() == secret {
            writeln!(output, "\nAccess granted.\n")?;
            tracing::info!("console access granted");
            return Ok(true);
        }

        remaining -= 1;
        writeln!(output, "Incorrect password. {remaining} attempt(s) remaining.\n")?;
    }

    writeln!(output, "Access denied. Exiting program.")?;
    tracing::warn!("console access denied");
    Ok(false)
}
