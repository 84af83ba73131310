use std::time::{Duration, Instant};

#[cfg(windows)]
use std::ffi::CString;

#[cfg(windows)]
use winapi::um::winuser;

/// Rising-edge hotkey trigger with a debounce window, fed the raw key state
/// once per frame.
pub struct HotkeyLatch {
    was_down: bool,
    last_fire: Option<Instant>,
    debounce: Duration,
}

impl HotkeyLatch {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            was_down: false,
            last_fire: None,
            debounce: Duration::from_millis(debounce_ms),
        }
    }

    pub fn fire(&mut self, is_down: bool) -> bool {
        let was_down = self.was_down;
        self.was_down = is_down;

        // Only trigger on the down edge
        if !is_down || was_down {
            return false;
        }

        let now = Instant::now();
        if let Some(last) = self.last_fire {
            if now.duration_since(last) < self.debounce {
                return false;
            }
        }
        self.last_fire = Some(now);
        true
    }
}

#[cfg(windows)]
pub fn check_key_press(key: i32) -> bool {
    (unsafe { winuser::GetAsyncKeyState(key) } as u32) & 0x8000 != 0
}

/// Key press with no modifier held, so F-key hotkeys don't collide with the
/// game's own Ctrl/Alt/Shift chords.
#[cfg(windows)]
pub fn check_hotkey_press(key: i32) -> bool {
    if !check_key_press(key) {
        return false;
    }

    let ctrl_pressed = check_key_press(winuser::VK_CONTROL);
    let alt_pressed = check_key_press(winuser::VK_MENU);
    let shift_pressed = check_key_press(winuser::VK_SHIFT);
    let win_pressed = check_key_press(winuser::VK_LWIN) || check_key_press(winuser::VK_RWIN);

    !ctrl_pressed && !alt_pressed && !shift_pressed && !win_pressed
}

#[cfg(windows)]
pub fn error_message(message: &str) {
    let title = CString::new("Touchpad Camera Error").unwrap();
    let message = CString::new(message).unwrap();

    unsafe {
        winuser::MessageBoxA(
            std::ptr::null_mut(),
            message.as_ptr(),
            title.as_ptr(),
            0x10,
        );
    }
}

// Disable console Quick Edit mode to prevent pauses when selecting text
#[cfg(windows)]
pub fn disable_console_quick_edit() {
    use winapi::um::consoleapi::{GetConsoleMode, SetConsoleMode};
    use winapi::um::processenv::GetStdHandle;
    use winapi::um::winbase::STD_INPUT_HANDLE;

    unsafe {
        let h_in = GetStdHandle(STD_INPUT_HANDLE);
        if !h_in.is_null() {
            let mut mode: u32 = 0;
            if GetConsoleMode(h_in, &mut mode) != 0 {
                const ENABLE_QUICK_EDIT_MODE: u32 = 0x0040;
                const ENABLE_MOUSE_INPUT: u32 = 0x0010;
                let new_mode = mode & !ENABLE_QUICK_EDIT_MODE & !ENABLE_MOUSE_INPUT;
                let _ = SetConsoleMode(h_in, new_mode);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_fires_on_down_edge_only() {
        let mut latch = HotkeyLatch::new(0);
        assert!(latch.fire(true));
        assert!(!latch.fire(true)); // still held
        assert!(!latch.fire(false));
        assert!(latch.fire(true)); // released and pressed again
    }

    #[test]
    fn test_latch_debounces_rapid_presses() {
        let mut latch = HotkeyLatch::new(10_000);
        assert!(latch.fire(true));
        latch.fire(false);
        assert!(!latch.fire(true)); // inside the debounce window
    }
}
