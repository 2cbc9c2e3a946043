//! # sys (UNIX)
//!
//! UNIX-specific structs and functions. Imported as `sys` on UNIX systems.
#![allow(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering::Relaxed};

// On UNIX systems, termios represents the terminal mode.
pub use libc::termios as TermMode;
use libc::{SA_SIGINFO, STDIN_FILENO, STDOUT_FILENO, TCSADRAIN, TIOCGWINSZ, VMIN, VTIME};
use libc::{c_int, c_void, sigaction, sighandler_t, siginfo_t, winsize};

use crate::Error;

fn cerr(err: c_int) -> Result<(), Error> {
    match err {
        0..=c_int::MAX => Ok(()),
        _ => Err(std::io::Error::last_os_error().into()),
    }
}

/// Return the current window size as (rows, columns), using the `TIOCGWINSZ` ioctl.
///
/// <http://man7.org/linux/man-pages/man4/tty_ioctl.4.html>
pub fn get_window_size() -> Result<(usize, usize), Error> {
    let mut maybe_ws = std::mem::MaybeUninit::<winsize>::uninit();
    cerr(unsafe { libc::ioctl(STDOUT_FILENO, TIOCGWINSZ, maybe_ws.as_mut_ptr()) })
        .map_or(None, |()| unsafe { Some(maybe_ws.assume_init()) })
        .filter(|ws| ws.ws_col != 0 && ws.ws_row != 0)
        .map_or(Err(Error::InvalidWindowSize), |ws| Ok((ws.ws_row as usize, ws.ws_col as usize)))
}

/// Stores whether the window size has changed since the last call to `has_window_size_changed`.
static WSC: AtomicBool = AtomicBool::new(false);

/// Handle a change in window size.
extern "C" fn handle_wsize(_: c_int, _: *mut siginfo_t, _: *mut c_void) { WSC.store(true, Relaxed) }

#[allow(clippy::fn_to_numeric_cast_any)]
/// Register a signal handler that sets a global flag when the window size changes. After calling
/// this, use `has_window_size_changed` to query and clear the flag.
pub fn register_winsize_change_signal_handler() -> Result<(), Error> {
    unsafe {
        let mut maybe_sa = std::mem::MaybeUninit::<sigaction>::uninit();
        cerr(libc::sigemptyset(&mut (*maybe_sa.as_mut_ptr()).sa_mask))?;
        // sigaction in libc has no sa_handler field, so we use sa_sigaction instead.
        (*maybe_sa.as_mut_ptr()).sa_flags = SA_SIGINFO;
        (*maybe_sa.as_mut_ptr()).sa_sigaction = handle_wsize as sighandler_t;
        cerr(sigaction(libc::SIGWINCH, maybe_sa.as_ptr(), std::ptr::null_mut()))
    }
}

/// Check if the window size has changed since the last call to this function.
/// `register_winsize_change_signal_handler` must be called first.
pub fn has_window_size_changed() -> bool { WSC.swap(false, Relaxed) }

/// Set the terminal mode.
pub fn set_term_mode(term: &TermMode) -> std::io::Result<()> {
    match unsafe { libc::tcsetattr(STDIN_FILENO, TCSADRAIN, term) } {
        0..=c_int::MAX => Ok(()),
        _ => Err(std::io::Error::last_os_error()),
    }
}

/// Put the terminal into raw mode and return the original termios, so it can be restored later.
///
/// Flags are cleared individually, rather than via `cfmakeraw`, to keep the exact set of
/// disabled behaviors visible at the call site: echo, canonical (line-buffered) input, extended
/// input processing and signal-generating keys are disabled on `c_lflag`; output
/// post-processing is disabled on `c_oflag`; software flow control, CR-to-LF translation, parity
/// checking, break-to-interrupt conversion and 8th-bit stripping are disabled on `c_iflag`; the
/// character size is forced to 8 bits on `c_cflag`. `VMIN`/`VTIME` make reads return after ~100ms
/// even if no byte is available.
///
/// <http://man7.org/linux/man-pages/man3/termios.3.html>
pub fn enable_raw_mode() -> Result<TermMode, Error> {
    let mut maybe_term = std::mem::MaybeUninit::<TermMode>::uninit();
    cerr(unsafe { libc::tcgetattr(STDIN_FILENO, maybe_term.as_mut_ptr()) })?;
    let orig_term = unsafe { maybe_term.assume_init() };
    let mut term = orig_term;
    term.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
    term.c_oflag &= !libc::OPOST;
    term.c_iflag &= !(libc::IXON | libc::ICRNL | libc::INPCK | libc::BRKINT | libc::ISTRIP);
    term.c_cflag |= libc::CS8;
    (term.c_cc[VMIN], term.c_cc[VTIME]) = (0, 1);
    set_term_mode(&term)?;
    Ok(orig_term)
}

#[allow(clippy::unnecessary_wraps)] // Result required on other platforms
pub fn stdin() -> std::io::Result<std::io::Stdin> { Ok(std::io::stdin()) }

pub fn path(filename: &str) -> std::path::PathBuf { std::path::PathBuf::from(filename) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_rejects_zero_dimensions() {
        let ws = winsize { ws_row: 0, ws_col: 80, ws_xpixel: 0, ws_ypixel: 0 };
        assert!(Some(ws).filter(|w| w.ws_col != 0 && w.ws_row != 0).is_none());
    }
}
