//! Raising the scheduling priority of another process
//!
//! Windows uses `HIGH_PRIORITY_CLASS`, Unix lowers the nice value.
//! Raising priority usually needs elevated privileges on both.

/// Raise `pid` to high priority. The error string is the OS error text.
#[cfg(windows)]
pub fn raise(pid: u32) -> Result<(), String> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        OpenProcess, SetPriorityClass, HIGH_PRIORITY_CLASS, PROCESS_SET_INFORMATION,
    };

    unsafe {
        let handle = OpenProcess(PROCESS_SET_INFORMATION, false, pid).map_err(|e| e.to_string())?;
        let result = SetPriorityClass(handle, HIGH_PRIORITY_CLASS);
        let _ = CloseHandle(handle);
        result.map_err(|e| e.to_string())
    }
}

#[cfg(unix)]
pub fn raise(pid: u32) -> Result<(), String> {
    use crate::constants::UNIX_BOOST_NICE;

    // 0 = success, -1 = failure with errno set
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, pid as libc::id_t, UNIX_BOOST_NICE) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error().to_string())
    }
}

#[cfg(not(any(windows, unix)))]
pub fn raise(_pid: u32) -> Result<(), String> {
    Err("priority changes are not supported on this platform".to_string())
}
