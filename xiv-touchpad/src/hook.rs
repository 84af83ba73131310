//! Window-procedure hook that captures raw wheel messages before the game's
//! own input layer coalesces them.
//!
//! The game gates and normalizes wheel input (it is suppressed while any UI
//! element claims the mouse, and multi-notch scrolls arrive merged), which is
//! too coarse for smooth touchpad camera control. Swapping the window
//! procedure captures the untouched OS signal and forwards every message to
//! the original procedure, so the game sees exactly what it would have seen.

use thiserror::Error;

#[cfg(windows)]
use std::panic::{self, AssertUnwindSafe};
#[cfg(windows)]
use std::ptr;
#[cfg(windows)]
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

#[cfg(windows)]
use log::info;
#[cfg(windows)]
use winapi::shared::minwindef::{LPARAM, LRESULT, UINT, WPARAM};
#[cfg(windows)]
use winapi::shared::windef::HWND;
#[cfg(windows)]
use winapi::um::winuser::{CallWindowProcA, GetWindowLongPtrA, SetWindowLongPtrA, GWLP_WNDPROC};

const WM_MOUSEWHEEL: u32 = 0x020A;
const WM_MOUSEHWHEEL: u32 = 0x020E;

/// Listener invoked for every nonzero wheel event: `(steps, is_horizontal)`.
///
/// A plain `fn` pointer is `'static`, so the callback address is valid for as
/// long as the hook can possibly be installed.
pub type WheelListener = fn(i16, bool);

#[derive(Debug, Error)]
pub enum HookError {
    #[error("target window could not be resolved")]
    WindowNotFound,
    #[error("a wheel hook is already installed in this process")]
    AlreadyInstalled,
    #[error("window procedure could not be replaced")]
    SetProcFailed,
}

/// Signed step count from the high-order word of `wParam`.
fn wheel_steps(wparam: usize) -> i16 {
    ((wparam >> 16) & 0xFFFF) as u16 as i16
}

/// Decodes one window message into a wheel event, if it is one. Zero-step
/// wheel messages are suppressed rather than forwarded as no-op events.
fn decode_wheel_message(msg: u32, wparam: usize) -> Option<(i16, bool)> {
    if msg != WM_MOUSEWHEEL && msg != WM_MOUSEHWHEEL {
        return None;
    }
    let steps = wheel_steps(wparam);
    if steps == 0 {
        return None;
    }
    Some((steps, msg == WM_MOUSEHWHEEL))
}

// A window procedure carries no user pointer, so the hook context lives in
// process statics: the original procedure, the hooked window and the
// registered listener.
#[cfg(windows)]
static ORIGINAL_WNDPROC: AtomicPtr<std::ffi::c_void> = AtomicPtr::new(ptr::null_mut());
#[cfg(windows)]
static HOOKED_HWND: AtomicPtr<std::ffi::c_void> = AtomicPtr::new(ptr::null_mut());
#[cfg(windows)]
static WHEEL_LISTENER: AtomicUsize = AtomicUsize::new(0);

#[cfg(windows)]
unsafe extern "system" fn wheel_wnd_proc(
    hwnd: HWND,
    msg: UINT,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if let Some((steps, is_horizontal)) = decode_wheel_message(msg, wparam as usize) {
        let listener = WHEEL_LISTENER.load(Ordering::SeqCst);
        if listener != 0 {
            let listener: WheelListener = std::mem::transmute(listener);
            // The pump belongs to the game; a panic must not cross this
            // boundary or the whole render loop goes down with it.
            let _ = panic::catch_unwind(AssertUnwindSafe(|| listener(steps, is_horizontal)));
        }
    }

    // Forward everything, wheel messages included, so game behavior is
    // unchanged.
    let original = ORIGINAL_WNDPROC.load(Ordering::SeqCst);
    if !original.is_null() {
        CallWindowProcA(std::mem::transmute(original), hwnd, msg, wparam, lparam)
    } else {
        0
    }
}

/// Owns the window-procedure replacement for one window.
///
/// At most one hook can be active per process; the component that installed
/// it is the one that tears it down.
#[cfg(windows)]
pub struct MouseHook {
    installed: bool,
}

#[cfg(windows)]
impl MouseHook {
    pub fn install(hwnd: HWND, listener: WheelListener) -> Result<Self, HookError> {
        if hwnd.is_null() {
            return Err(HookError::WindowNotFound);
        }
        if !HOOKED_HWND.load(Ordering::SeqCst).is_null() {
            return Err(HookError::AlreadyInstalled);
        }

        unsafe {
            let original = GetWindowLongPtrA(hwnd, GWLP_WNDPROC);
            if original == 0 {
                return Err(HookError::SetProcFailed);
            }

            WHEEL_LISTENER.store(listener as usize, Ordering::SeqCst);
            ORIGINAL_WNDPROC.store(original as *mut std::ffi::c_void, Ordering::SeqCst);
            HOOKED_HWND.store(hwnd as *mut std::ffi::c_void, Ordering::SeqCst);

            if SetWindowLongPtrA(hwnd, GWLP_WNDPROC, wheel_wnd_proc as isize) == 0 {
                ORIGINAL_WNDPROC.store(ptr::null_mut(), Ordering::SeqCst);
                HOOKED_HWND.store(ptr::null_mut(), Ordering::SeqCst);
                WHEEL_LISTENER.store(0, Ordering::SeqCst);
                return Err(HookError::SetProcFailed);
            }

            info!(
                "[HOOK] Window procedure replaced on {:p}, original at {:#x}",
                hwnd, original
            );
        }

        Ok(Self { installed: true })
    }

    /// Restores the original procedure. Idempotent; calling it twice or
    /// after a failed install is a no-op.
    pub fn uninstall(&mut self) {
        if !self.installed {
            return;
        }
        self.installed = false;
        restore();
    }
}

#[cfg(windows)]
impl Drop for MouseHook {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// Puts the original window procedure back if one is recorded. Safe to call
/// at any time, including from the panic hook and DllMain detach.
#[cfg(windows)]
pub fn restore() {
    let hwnd = HOOKED_HWND.swap(ptr::null_mut(), Ordering::SeqCst) as HWND;
    let original = ORIGINAL_WNDPROC.swap(ptr::null_mut(), Ordering::SeqCst);
    WHEEL_LISTENER.store(0, Ordering::SeqCst);

    if !hwnd.is_null() && !original.is_null() {
        unsafe {
            SetWindowLongPtrA(hwnd, GWLP_WNDPROC, original as isize);
        }
        info!("[HOOK] Original window procedure restored");
    }
}

/// Whether a hook is currently installed somewhere in this process.
#[cfg(windows)]
pub fn is_installed() -> bool {
    !HOOKED_HWND.load(Ordering::SeqCst).is_null()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_steps_sign() {
        assert_eq!(wheel_steps(120 << 16), 120);
        assert_eq!(wheel_steps((0xFF88 << 16) | 0x0008), -120);
        assert_eq!(wheel_steps(0x0000_FFFF), 0);
    }

    #[test]
    fn test_decode_ignores_other_messages() {
        const WM_MOUSEMOVE: u32 = 0x0200;
        assert_eq!(decode_wheel_message(WM_MOUSEMOVE, 120 << 16), None);
    }

    #[test]
    fn test_decode_suppresses_zero_steps() {
        assert_eq!(decode_wheel_message(WM_MOUSEWHEEL, 0), None);
        assert_eq!(decode_wheel_message(WM_MOUSEHWHEEL, 0x0008), None);
    }

    #[test]
    fn test_decode_tags_axis() {
        assert_eq!(decode_wheel_message(WM_MOUSEWHEEL, 240 << 16), Some((240, false)));
        assert_eq!(
            decode_wheel_message(WM_MOUSEHWHEEL, 0xFF88usize << 16),
            Some((-120, true))
        );
    }
}
