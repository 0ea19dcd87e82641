//! Interactive pixel format selection
// (c) 2024 Ross Younger

use anyhow::Result;
use console::Term;

use crate::device::DeviceAdapter;
use crate::util::Selection;

/// Decides which pixel format(s) to calibrate.
///
/// An explicit request always wins. Otherwise: a camera with a single
/// supported format needs no choice; with several, we ask the user when a
/// terminal is attended, and calibrate everything when it is not (so
/// unattended runs never hang on a prompt).
pub(crate) fn resolve_selection<A: DeviceAdapter>(
    requested: Option<Selection>,
    adapter: &mut A,
) -> Result<Selection> {
    if let Some(s) = requested {
        return Ok(s);
    }
    let formats: Vec<_> = adapter
        .enumerate_pixel_formats()?
        .into_iter()
        .filter(|f| f.supported)
        .collect();
    if formats.len() <= 1 || !console::user_attended() {
        return Ok(Selection::All);
    }

    let term = Term::stderr();
    term.write_line(&format!(
        "{} supports {} pixel formats:",
        adapter.identity()?,
        formats.len()
    ))?;
    for (i, f) in formats.iter().enumerate() {
        term.write_line(&format!("  {i}: {}", f.name))?;
    }
    term.write_line(&format!("  {}: all of the above", formats.len()))?;
    loop {
        term.write_str("Which format would you like to calibrate? ")?;
        let line = term.read_line()?;
        match line.trim().parse::<usize>() {
            Ok(n) if n < formats.len() => return Ok(Selection::Index(n)),
            Ok(n) if n == formats.len() => return Ok(Selection::All),
            _ => term.write_line(&format!(
                "Please enter a number between 0 and {}",
                formats.len()
            ))?,
        }
    }
}
