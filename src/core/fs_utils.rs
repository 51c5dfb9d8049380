use std::path::Path;
use tracing::warn;

/// Disables copy-on-write for the file at `path` (btrfs and friends), which
/// otherwise fragments a memory-mapped database badly. Failures are logged
/// and ignored.
#[cfg(target_os = "linux")]
pub fn disable_cow(path: &Path) {
    use std::fs::File;
    use std::os::unix::io::AsRawFd;

    // From linux/fs.h
    const FS_IOC_GETFLAGS: libc::c_ulong = 0x8008_6601;
    const FS_IOC_SETFLAGS: libc::c_ulong = 0x4008_6602;
    const FS_NOCOW_FL: libc::c_long = 0x0080_0000;

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to open file to modify flags");
            return;
        }
    };
    let fd = file.as_raw_fd();

    let mut flags: libc::c_long = 0;
    unsafe {
        if libc::ioctl(fd, FS_IOC_GETFLAGS as _, &mut flags as *mut libc::c_long) == -1 {
            let err = std::io::Error::last_os_error();
            // ENOTTY: no attribute support, and most likely no COW either
            if err.raw_os_error() != Some(libc::ENOTTY) {
                warn!(error = %err, "ioctl error: failed to get file flags");
            }
            return;
        }

        if flags & FS_NOCOW_FL == 0 {
            flags |= FS_NOCOW_FL;
            if libc::ioctl(fd, FS_IOC_SETFLAGS as _, &flags as *const libc::c_long) == -1 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::EOPNOTSUPP) {
                    warn!(error = %err, "ioctl error: failed to set file flags");
                }
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn disable_cow(_path: &Path) {}

/// True when the current user may create files inside `dir`.
pub fn is_writable_dir(dir: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(dir.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), libc::W_OK | libc::X_OK) == 0 }
}
