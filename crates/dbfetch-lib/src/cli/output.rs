use std::io::Write;
use std::path::Path;

/// Writes `<md5>  <path>` lines, the layout `md5sum` uses.
pub(crate) fn write_hash_lines<'a>(
    mut out: impl Write,
    entries: impl IntoIterator<Item = (&'a str, &'a Path)>,
) -> std::io::Result<()> {
    for (hash, path) in entries {
        writeln!(out, "{}  {}", hash, path.display())?;
    }
    out.flush()
}
