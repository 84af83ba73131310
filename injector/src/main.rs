#[cfg(windows)]
mod windows_main {
    use std::{
        ffi::{CString, OsString},
        fs, mem,
        os::windows::ffi::OsStringExt,
        path::PathBuf,
        ptr::null_mut,
        thread,
        time::Duration,
    };
    use winapi::{
        shared::minwindef::{DWORD, FALSE},
        um::{
            errhandlingapi::GetLastError,
            handleapi::CloseHandle,
            libloaderapi::{GetModuleHandleA, GetProcAddress},
            memoryapi::{VirtualAllocEx, VirtualFreeEx, WriteProcessMemory},
            processthreadsapi::{
                CreateRemoteThread, GetCurrentProcess, GetExitCodeThread, OpenProcess,
                OpenProcessToken,
            },
            securitybaseapi::GetTokenInformation,
            synchapi::WaitForSingleObject,
            tlhelp32::{
                CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
                TH32CS_SNAPPROCESS,
            },
            winbase::WAIT_OBJECT_0,
            winnt::{
                TokenElevation, HANDLE, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
                PROCESS_ALL_ACCESS, PROCESS_CREATE_THREAD, PROCESS_QUERY_INFORMATION,
                PROCESS_VM_OPERATION, PROCESS_VM_READ, PROCESS_VM_WRITE, TOKEN_QUERY,
            },
        },
    };

    const DLL_NAME: &str = "xiv_touchpad.dll";
    const GAME_PROCESS_NAME: &str = "ffxiv_dx11.exe";
    const INJECTION_TIMEOUT_MS: u32 = 15000;
    const WAIT_TIMEOUT: u32 = 258;
    const MAX_RETRY_ATTEMPTS: u32 = 3;

    struct Console;

    impl Console {
        fn success(msg: &str) {
            println!("SUCCESS: {}", msg);
        }

        fn error(msg: &str) {
            println!("ERROR: {}", msg);
        }

        fn info(msg: &str) {
            println!("INFO: {}", msg);
        }

        fn warning(msg: &str) {
            println!("WARNING: {}", msg);
        }

        fn progress(msg: &str) {
            println!("... {}", msg);
        }

        fn header() {
            println!("╔════════════════════════════════════════════════╗");
            println!("║            XIV TouchPad Injector               ║");
            println!("╚════════════════════════════════════════════════╝");
            println!();
        }

        fn controls() {
            println!("CONTROLS:");
            println!("   Two-finger scroll ... Rotate the camera");
            println!("   F3 .................. Toggle scroll camera");
            println!("   F4 .................. Open configuration menu");
            println!("   HOME ................ Exit mod");
        }
    }

    #[derive(Debug, Clone)]
    struct TargetProcess {
        pid: DWORD,
        name: String,
    }

    struct InjectionError {
        message: String,
        code: Option<DWORD>,
    }

    impl InjectionError {
        fn new(message: &str) -> Self {
            Self {
                message: message.to_string(),
                code: None,
            }
        }

        fn with_code(message: &str, code: DWORD) -> Self {
            Self {
                message: message.to_string(),
                code: Some(code),
            }
        }

        fn display(&self) -> String {
            match self.code {
                Some(code) => format!("{} (Error Code: {})", self.message, code),
                None => self.message.clone(),
            }
        }
    }

    type Result<T> = std::result::Result<T, InjectionError>;

    struct Injector {
        dll_path: PathBuf,
        targets: Vec<TargetProcess>,
    }

    impl Injector {
        fn new() -> Result<Self> {
            let dll_path = Self::find_dll_path()?;
            let targets = Self::find_target_processes()?;
            Ok(Self { dll_path, targets })
        }

        fn find_dll_path() -> Result<PathBuf> {
            let current_dir = std::env::current_dir()
                .map_err(|_| InjectionError::new("Failed to get current directory"))?;

            let dll_path = current_dir.join(DLL_NAME);

            if !dll_path.exists() {
                return Err(InjectionError::new(&format!(
                    "DLL not found: {}. Make sure {} is in the same folder as the injector.",
                    dll_path.display(),
                    DLL_NAME
                )));
            }

            let metadata = fs::metadata(&dll_path)
                .map_err(|_| InjectionError::new("Cannot read DLL file metadata"))?;

            if metadata.len() == 0 {
                return Err(InjectionError::new("DLL file is empty"));
            }

            Console::success(&format!(
                "DLL found: {} ({} bytes)",
                dll_path.display(),
                metadata.len()
            ));
            Ok(dll_path)
        }

        fn find_target_processes() -> Result<Vec<TargetProcess>> {
            Console::progress("Searching for FFXIV processes...");

            unsafe {
                let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
                if snapshot == null_mut() {
                    return Err(InjectionError::with_code(
                        "Failed to create process snapshot",
                        GetLastError(),
                    ));
                }

                let mut entry: PROCESSENTRY32W = mem::zeroed();
                entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as DWORD;

                if Process32FirstW(snapshot, &mut entry) == 0 {
                    CloseHandle(snapshot);
                    return Err(InjectionError::with_code(
                        "Failed to enumerate processes",
                        GetLastError(),
                    ));
                }

                let mut targets = Vec::new();

                loop {
                    let process_name = Self::extract_process_name(&entry.szExeFile);

                    if process_name.to_lowercase() == GAME_PROCESS_NAME {
                        targets.push(TargetProcess {
                            pid: entry.th32ProcessID,
                            name: process_name.clone(),
                        });
                    }

                    if Process32NextW(snapshot, &mut entry) == 0 {
                        break;
                    }
                }

                CloseHandle(snapshot);

                if targets.is_empty() {
                    return Err(InjectionError::new("FFXIV process not detected"));
                }

                Console::success(&format!("Found {} FFXIV process(es)", targets.len()));
                for (i, target) in targets.iter().enumerate() {
                    Console::info(&format!(
                        "  {}: {} (PID: {})",
                        i + 1,
                        target.name,
                        target.pid
                    ));
                }

                Ok(targets)
            }
        }

        fn extract_process_name(sz_exe_file: &[u16]) -> String {
            let len = sz_exe_file
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(sz_exe_file.len());
            OsString::from_wide(&sz_exe_file[..len])
                .to_string_lossy()
                .to_string()
        }

        fn check_privileges(&self) -> Result<bool> {
            unsafe {
                let mut token: HANDLE = null_mut();
                if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
                    return Ok(false);
                }

                let mut elevation = mem::zeroed::<winapi::um::winnt::TOKEN_ELEVATION>();
                let mut size = mem::size_of::<winapi::um::winnt::TOKEN_ELEVATION>() as DWORD;

                let result = GetTokenInformation(
                    token,
                    TokenElevation,
                    &mut elevation as *mut _ as *mut _,
                    size,
                    &mut size,
                );

                CloseHandle(token);

                if result == 0 {
                    return Ok(false);
                }

                Ok(elevation.TokenIsElevated != 0)
            }
        }

        fn open_process(&self, pid: DWORD) -> Result<HANDLE> {
            unsafe {
                let process_handle = OpenProcess(PROCESS_ALL_ACCESS, FALSE, pid);
                if !process_handle.is_null() {
                    return Ok(process_handle);
                }

                // Fallback to minimal required permissions
                let process_handle = OpenProcess(
                    PROCESS_CREATE_THREAD
                        | PROCESS_QUERY_INFORMATION
                        | PROCESS_VM_OPERATION
                        | PROCESS_VM_WRITE
                        | PROCESS_VM_READ,
                    FALSE,
                    pid,
                );

                if process_handle.is_null() {
                    return Err(InjectionError::with_code(
                        "Failed to open target process. Try running as Administrator.",
                        GetLastError(),
                    ));
                }

                Ok(process_handle)
            }
        }

        fn inject_loadlibrary(&self, process_handle: HANDLE) -> Result<()> {
            Console::progress("Using LoadLibrary injection method...");

            unsafe {
                let dll_abs_path = fs::canonicalize(&self.dll_path).map_err(|e| {
                    InjectionError::new(&format!("Failed to get absolute DLL path: {}", e))
                })?;

                let dll_path_str = dll_abs_path.to_string_lossy();
                let dll_path_cstr = CString::new(dll_path_str.as_ref())
                    .map_err(|_| InjectionError::new("Invalid characters in DLL path"))?;

                let kernel32 = GetModuleHandleA(CString::new("kernel32.dll").unwrap().as_ptr());
                if kernel32.is_null() {
                    return Err(InjectionError::new("Failed to get kernel32.dll handle"));
                }

                let loadlibrary_addr =
                    GetProcAddress(kernel32, CString::new("LoadLibraryA").unwrap().as_ptr());
                if loadlibrary_addr.is_null() {
                    return Err(InjectionError::new("Failed to get LoadLibraryA address"));
                }

                let path_len = dll_path_cstr.as_bytes_with_nul().len();
                let remote_memory = VirtualAllocEx(
                    process_handle,
                    null_mut(),
                    path_len,
                    MEM_COMMIT | MEM_RESERVE,
                    PAGE_READWRITE,
                );

                if remote_memory.is_null() {
                    return Err(InjectionError::with_code(
                        "Failed to allocate memory in target process",
                        GetLastError(),
                    ));
                }

                let mut bytes_written = 0;
                let write_result = WriteProcessMemory(
                    process_handle,
                    remote_memory,
                    dll_path_cstr.as_ptr() as *const _,
                    path_len,
                    &mut bytes_written,
                );

                if write_result == 0 || bytes_written != path_len {
                    VirtualFreeEx(process_handle, remote_memory, 0, MEM_RELEASE);
                    return Err(InjectionError::with_code(
                        "Failed to write DLL path to target process",
                        GetLastError(),
                    ));
                }

                let thread_handle = CreateRemoteThread(
                    process_handle,
                    null_mut(),
                    0,
                    Some(mem::transmute(loadlibrary_addr)),
                    remote_memory,
                    0,
                    null_mut(),
                );

                if thread_handle.is_null() {
                    VirtualFreeEx(process_handle, remote_memory, 0, MEM_RELEASE);
                    return Err(InjectionError::with_code(
                        "Failed to create remote thread",
                        GetLastError(),
                    ));
                }

                Console::progress("Remote thread created, waiting for completion...");

                let wait_result = WaitForSingleObject(thread_handle, INJECTION_TIMEOUT_MS);

                let result = match wait_result {
                    WAIT_OBJECT_0 => {
                        let mut exit_code = 0;
                        GetExitCodeThread(thread_handle, &mut exit_code);

                        if exit_code == 0 {
                            Err(InjectionError::new(
                                "LoadLibrary returned NULL - DLL failed to load. Check for missing dependencies or antivirus interference.",
                            ))
                        } else {
                            Console::success(&format!(
                                "LoadLibrary succeeded (module handle: 0x{:x})",
                                exit_code
                            ));
                            Ok(())
                        }
                    }
                    WAIT_TIMEOUT => Err(InjectionError::new("Injection timed out")),
                    _ => Err(InjectionError::with_code("Wait failed", GetLastError())),
                };

                CloseHandle(thread_handle);
                VirtualFreeEx(process_handle, remote_memory, 0, MEM_RELEASE);

                result
            }
        }

        fn inject_into_process(&self, target: &TargetProcess, attempt: u32) -> Result<()> {
            Console::progress(&format!(
                "Attempting injection into PID {} (attempt {}/{})",
                target.pid, attempt, MAX_RETRY_ATTEMPTS
            ));

            let process_handle = self.open_process(target.pid)?;
            let result = self.inject_loadlibrary(process_handle);

            unsafe {
                CloseHandle(process_handle);
            }

            result
        }

        fn run(&self) -> Result<()> {
            Console::header();

            if !self.check_privileges()? {
                Console::warning("Not running as Administrator - injection may be blocked");
                Console::info("For best results, right-click and 'Run as Administrator'");
            } else {
                Console::success("Running with Administrator privileges");
            }

            println!();

            let mut injection_successful = false;

            for target in &self.targets {
                for attempt in 1..=MAX_RETRY_ATTEMPTS {
                    match self.inject_into_process(target, attempt) {
                        Ok(()) => {
                            Console::success(&format!(
                                "Successfully injected into PID {}",
                                target.pid
                            ));
                            injection_successful = true;
                            break;
                        }
                        Err(e) => {
                            if attempt == MAX_RETRY_ATTEMPTS {
                                Console::error(&format!(
                                    "Failed to inject into PID {}: {}",
                                    target.pid,
                                    e.display()
                                ));
                            } else {
                                Console::warning(&format!(
                                    "Attempt {} failed: {}",
                                    attempt,
                                    e.display()
                                ));
                                Console::info("Retrying in 2 seconds...");
                                thread::sleep(Duration::from_secs(2));
                            }
                        }
                    }
                }

                if injection_successful {
                    break;
                }
            }

            if !injection_successful {
                return Err(InjectionError::new(
                    "Failed to inject into any FFXIV process",
                ));
            }

            println!();
            Console::success("INJECTION SUCCESSFUL");
            println!();
            Console::controls();
            println!();
            Console::info("Closing injector...");

            Ok(())
        }
    }

    fn show_troubleshooting() {
        println!();
        Console::error("INJECTION FAILED");
        println!();
        println!("TROUBLESHOOTING STEPS:");
        println!("   1. Right-click injector.exe → 'Run as Administrator'");
        println!("   2. Temporarily disable antivirus/Windows Defender");
        println!("   3. Make sure you are logged in with a character, not at the launcher");
        println!("   4. Try restarting the game completely");
        println!("   5. Verify {} is not corrupted", DLL_NAME);
    }

    fn show_game_not_found_message() {
        println!();
        println!("FFXIV was not detected.");
        println!();
        println!("To proceed:");
        println!("  1. Start FINAL FANTASY XIV (DirectX 11 client) and log in.");
        println!("  2. Run injector.exe again.");
        println!();
        println!("If the issue persists:");
        println!("  - If the game runs as Administrator, run injector.exe as Administrator too.");
        println!("  - Temporarily disable antivirus or add an exception for injector.exe.");
    }

    fn pause_and_exit() {
        println!();
        println!("Press Enter to exit...");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok();
    }

    pub fn main() {
        let result = Injector::new().and_then(|injector| injector.run());

        match result {
            Ok(()) => {}
            Err(e) => {
                let msg = e.display();
                if msg.contains("FFXIV process not detected") {
                    show_game_not_found_message();
                } else {
                    Console::error(&msg);
                    show_troubleshooting();
                }
                pause_and_exit();
            }
        }
    }
}

#[cfg(windows)]
fn main() {
    windows_main::main();
}

#[cfg(not(windows))]
fn main() {
    eprintln!("The injector only runs on Windows.");
}
