//! Touchpad camera control for FFXIV.
//!
//! Injected as a DLL, the mod swaps the game window's message procedure to
//! capture raw two-finger scroll deltas before the game's input layer eats
//! them, accumulates them across frames, and steers the in-game camera by
//! writing yaw/pitch into the live camera block.

pub mod apply;
pub mod camera;
pub mod config;
pub mod hook;
pub mod utils;
pub mod wheel;

#[cfg(windows)]
mod focus;
#[cfg(windows)]
mod menu;

/// Last-gesture input state published by the frame loop for the menu's
/// diagnostics view.
pub mod diag {
    use crate::wheel::WheelSnapshot;
    use std::sync::atomic::{AtomicU32, Ordering};

    static LAST_VERTICAL: AtomicU32 = AtomicU32::new(0);
    static LAST_HORIZONTAL: AtomicU32 = AtomicU32::new(0);

    /// Called once per frame with the drained snapshot. Empty frames are
    /// skipped so the view keeps the most recent actual gesture; the menu
    /// blocks the frame loop, and the frame right before it opened is
    /// always empty.
    pub fn publish(snap: &WheelSnapshot) {
        if snap.is_zero() {
            return;
        }
        LAST_VERTICAL.store(snap.vertical.to_bits(), Ordering::Relaxed);
        LAST_HORIZONTAL.store(snap.horizontal.to_bits(), Ordering::Relaxed);
    }

    pub fn last_snapshot() -> WheelSnapshot {
        WheelSnapshot {
            vertical: f32::from_bits(LAST_VERTICAL.load(Ordering::Relaxed)),
            horizontal: f32::from_bits(LAST_HORIZONTAL.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(windows)]
use std::ffi::CString;
#[cfg(windows)]
use std::path::PathBuf;
#[cfg(windows)]
use std::time::Duration;

#[cfg(windows)]
use log::{error, info, warn};
#[cfg(windows)]
use memory_rs::internal::{memory::resolve_module_path, process_info::ProcessInfo};
#[cfg(windows)]
use simplelog::{CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger};
#[cfg(windows)]
use winapi::shared::minwindef::{BOOL, DWORD, TRUE};
#[cfg(windows)]
use winapi::um::consoleapi::AllocConsole;
#[cfg(windows)]
use winapi::um::libloaderapi::{DisableThreadLibraryCalls, FreeLibraryAndExitThread};
#[cfg(windows)]
use winapi::um::wincon::{FreeConsole, SetConsoleTitleA};
#[cfg(windows)]
use winapi::um::winnt::{DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH};
#[cfg(windows)]
use winapi::um::winuser;

#[cfg(windows)]
use crate::apply::RotationConfig;
#[cfg(windows)]
use crate::camera::CameraResolver;
#[cfg(windows)]
use crate::config::Config;
#[cfg(windows)]
use crate::focus::FocusDetector;
#[cfg(windows)]
use crate::menu::ConfigMenu;
#[cfg(windows)]
use crate::utils::{check_hotkey_press, HotkeyLatch};

#[cfg(windows)]
const CONFIG_PATH: &str = "xiv_touchpad_config.toml";

// The game renders at whatever rate it likes; the steering loop self-paces
#[cfg(windows)]
const FRAME_INTERVAL: Duration = Duration::from_millis(4);

#[cfg(windows)]
fn init_logging(lib: *mut std::ffi::c_void) {
    // Log next to the DLL when possible, falling back to temp dir, then CWD
    let mut base_path = resolve_module_path(lib as *const std::ffi::c_void)
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    if base_path.is_file() {
        base_path.pop();
    }
    let primary = base_path.join("xiv-touchpad.log");
    let _ = std::fs::remove_file(&primary);

    let log_file = std::fs::File::create(&primary)
        .or_else(|_| std::fs::File::create(std::env::temp_dir().join("xiv-touchpad.log")))
        .or_else(|_| std::fs::File::create("xiv-touchpad.log"));

    let config = ConfigBuilder::new().set_time_to_local(true).build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        TerminalMode::Mixed,
    )];
    if let Ok(file) = log_file {
        loggers.push(WriteLogger::new(log::LevelFilter::Info, config, file));
    }
    let _ = CombinedLogger::init(loggers);
}

#[cfg(windows)]
fn print_init_banner() -> std::io::Result<()> {
    use std::io::Write;
    use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    stdout.set_color(
        ColorSpec::new()
            .set_fg(Some(Color::Green))
            .set_intense(true)
            .set_bold(true),
    )?;
    writeln!(&mut stdout)?;
    writeln!(
        &mut stdout,
        "=============================================================="
    )?;
    writeln!(
        &mut stdout,
        "=            XIV TouchPad: initialization complete           ="
    )?;
    writeln!(
        &mut stdout,
        "=============================================================="
    )?;
    writeln!(&mut stdout)?;
    stdout.reset()?;
    Ok(())
}

#[cfg(windows)]
fn instructions() -> String {
    r#"------------------------------
XIV TOUCHPAD CAMERA:
Two-finger scroll   Rotate the camera (horizontal = yaw, vertical = pitch)
F3                  Scroll camera on/off
F4                  Open configuration menu
HOME                Exit mod

Focus required:     Scrolling only steers the camera while the game
                    window is focused
------------------------------"#
        .to_string()
}

#[cfg(windows)]
fn patch(_lib: *mut std::ffi::c_void) -> Result<(), Box<dyn std::error::Error>> {
    unsafe {
        let title = CString::new("XIV TouchPad").unwrap();
        SetConsoleTitleA(title.as_ptr());
    }

    let mut config = Config::load_or_create(CONFIG_PATH);

    let proc_inf = ProcessInfo::new(None)?;
    let resolver = match CameraResolver::new(&proc_inf) {
        Ok(resolver) => Some(resolver),
        Err(e) => {
            // One-shot report; diagnostics and the menu still work
            warn!("[CAMERA] ✗ {} - camera steering unavailable", e);
            None
        }
    };

    if !config.first_run_done {
        let mut menu = ConfigMenu::new(config.clone(), CONFIG_PATH.to_string(), resolver.as_ref());
        let continue_to_game = menu.show_main_menu()?;
        config = menu.config;
        config.first_run_done = true;
        let _ = config.save(CONFIG_PATH);
        if !continue_to_game {
            return Ok(());
        }
    }

    print_init_banner()?;
    println!("{}", instructions());

    let mut focus = FocusDetector::new();

    // One attempt per session: a hook that cannot install stays uninstalled,
    // everything else keeps running
    let mut mouse_hook = match hook::MouseHook::install(focus::get_game_hwnd(), wheel::record_raw)
    {
        Ok(hook) => Some(hook),
        Err(e) => {
            error!("[HOOK] ✗ Install failed: {} - scroll camera disabled for this session", e);
            None
        }
    };

    run_loop(&mut config, resolver.as_ref(), &mut focus);

    if let Some(hook) = mouse_hook.as_mut() {
        hook.uninstall();
    }
    let _ = config.save(CONFIG_PATH);
    Ok(())
}

#[cfg(windows)]
fn run_loop(config: &mut Config, resolver: Option<&CameraResolver>, focus: &mut FocusDetector) {
    let mut toggle_key = HotkeyLatch::new(300);
    let mut menu_key = HotkeyLatch::new(300);
    let mut exit_key = HotkeyLatch::new(500);

    loop {
        if toggle_key.fire(check_hotkey_press(winuser::VK_F3)) {
            config.scroll_camera_enabled = !config.scroll_camera_enabled;
            info!(
                "[INPUT] F3 pressed - scroll camera {}",
                if config.scroll_camera_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            let _ = config.save(CONFIG_PATH);
        }

        if menu_key.fire(check_hotkey_press(winuser::VK_F4)) {
            info!("[INPUT] F4 pressed - opening configuration menu");
            let mut menu = ConfigMenu::new(config.clone(), CONFIG_PATH.to_string(), resolver);
            match menu.show_main_menu() {
                Ok(true) => *config = menu.config,
                Ok(false) => break,
                Err(e) => warn!("[MENU] {}", e),
            }
        }

        if exit_key.fire(check_hotkey_press(winuser::VK_HOME)) {
            info!("[INPUT] HOME pressed - exiting mod");
            break;
        }

        // Drain exactly once per frame, whether or not anything gets applied
        let snap = wheel::WHEEL_SINK.drain();
        diag::publish(&snap);

        let veto = !focus.is_game_focused();
        if let Some(resolver) = resolver {
            let rotation = RotationConfig::from(&*config);
            apply::apply_rotation(
                resolver,
                &snap,
                &rotation,
                veto || !config.scroll_camera_enabled,
            );
        }

        std::thread::sleep(FRAME_INTERVAL);
    }
}

#[cfg(windows)]
fn wrapper(lib: *mut std::ffi::c_void) -> u32 {
    unsafe {
        AllocConsole();
    }
    utils::disable_console_quick_edit();

    init_logging(lib);

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic: {}", panic_info);
        // The game must never be left with a procedure pointer into an
        // unloading DLL
        hook::restore();
    }));

    info!("=== XIV TOUCHPAD LOADED ===");

    match patch(lib) {
        Ok(_) => (),
        Err(e) => {
            let msg = format!("Something went wrong:\n{}", e);
            error!("{}", msg);
            utils::error_message(&msg);
        }
    }

    unsafe {
        FreeConsole();
        FreeLibraryAndExitThread(lib as _, 0);
    }
    0
}

#[cfg(windows)]
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn DllMain(
    hinstance: *mut std::ffi::c_void,
    fdw_reason: DWORD,
    _lpv_reserved: *mut std::ffi::c_void,
) -> BOOL {
    match fdw_reason {
        DLL_PROCESS_ATTACH => {
            // Disable thread attach/detach notifications to improve performance
            DisableThreadLibraryCalls(hinstance as _);

            // Convert pointer to usize for thread safety
            let hinstance_addr = hinstance as usize;

            let _handle = std::thread::spawn(move || {
                wrapper(hinstance_addr as *mut std::ffi::c_void);
            });

            TRUE
        }
        DLL_PROCESS_DETACH => {
            hook::restore();
            TRUE
        }
        _ => TRUE,
    }
}
