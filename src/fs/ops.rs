use std::fs::{self, FileTimes};
use std::io;
use std::path::Path;

/// Copy file `src` to `tgt`, replacing `tgt`, and carry over the source's
/// permissions plus access and modification times.
/// An existing `tgt` is removed first, since it may carry read-only permissions
/// from an earlier copy.
pub fn copy_preserving(src: &Path, tgt: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    let mut reader = fs::File::open(src)?;
    match fs::remove_file(tgt) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    let mut writer = fs::File::create(tgt)?;
    io::copy(&mut reader, &mut writer)?;

    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    writer.set_times(times)?;
    writer.set_permissions(meta.permissions())?;
    Ok(())
}
