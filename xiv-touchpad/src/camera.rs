//! Overlay onto the game's world camera, reached through the CameraManager
//! singleton.
//!
//! The camera block is owned by the game. Nothing here owns or allocates
//! memory: the pointer chain is re-followed every frame and a view is only
//! valid until the frame ends. All offsets are a per-patch contract with the
//! game binary; a patch that moves them produces wrong values, not crashes.

use std::fmt;
use std::ptr;

#[cfg(windows)]
use log::info;
#[cfg(windows)]
use memory_rs::internal::process_info::ProcessInfo;

/// Field offsets inside the camera block, from EasyZoomReborn / Hypostasis
/// reverse engineering. Yaw and pitch are the only fields ever written.
mod offsets {
    pub const CURRENT_ZOOM: usize = 0x124;
    pub const MIN_ZOOM: usize = 0x128;
    pub const MAX_ZOOM: usize = 0x12C;
    pub const CURRENT_FOV: usize = 0x130;
    pub const H_ROTATION: usize = 0x140; // yaw, radians, -pi..pi
    pub const V_ROTATION: usize = 0x144; // pitch, radians
    pub const MIN_V_ROTATION: usize = 0x158;
    pub const MAX_V_ROTATION: usize = 0x15C;
    pub const MODE: usize = 0x180; // 0 = first person, 1 = third person
}

/// Bytes of the camera block the overlay may touch.
pub const CAMERA_BLOCK_LEN: usize = 0x200;

/// Offset of the world camera pointer inside the manager. The manager also
/// holds idle/menu/spectator cameras at +0x8/+0x10/+0x18; only the world
/// camera is steered.
#[cfg(windows)]
const WORLD_CAMERA: usize = 0x0;

/// Resolves the static CameraManager slot once; `locate` re-follows the
/// pointer chain from it every frame.
#[cfg(windows)]
pub struct CameraResolver {
    manager_slot: usize,
}

#[cfg(windows)]
impl CameraResolver {
    pub fn new(proc_inf: &ProcessInfo) -> Result<Self, Box<dyn std::error::Error>> {
        let manager_slot = find_camera_manager(proc_inf)?;
        info!("[CAMERA] CameraManager slot at {:#x}", manager_slot);
        Ok(Self { manager_slot })
    }

    /// Slot address injected directly, bypassing the signature scan.
    pub fn from_slot_address(manager_slot: usize) -> Self {
        Self { manager_slot }
    }

    /// Follows slot -> manager -> world camera. The game may tear the camera
    /// down between any two frames (login screen, cutscene, zone change), so
    /// `None` is routine and the result must not be cached.
    pub fn locate(&self) -> Option<CameraView> {
        let manager = read_live_ptr(self.manager_slot)?;
        let camera = read_live_ptr(manager + WORLD_CAMERA)?;
        if !is_memory_readable(camera, CAMERA_BLOCK_LEN) {
            return None;
        }
        // Readability was just verified for the whole block
        Some(unsafe { CameraView::from_raw(camera) })
    }
}

/// Finds the address of the static CameraManager instance slot by scanning
/// for the `lea rcx, [rip+disp32]` that loads it ahead of the world camera
/// update call, then decoding the RIP-relative displacement. The byte
/// signature is re-verified against the client on every game patch.
#[cfg(windows)]
fn find_camera_manager(proc_inf: &ProcessInfo) -> Result<usize, Box<dyn std::error::Error>> {
    let ins = proc_inf
        .region
        .scan_aob(&memory_rs::generate_aob_pattern![
            0x48, 0x8D, 0x0D, _, _, _, _, 0xE8, _, _, _, _, 0x48, 0x83, 0x3D
        ])?
        .ok_or("CameraManager signature not found")?;

    let disp = unsafe { ptr::read_unaligned((ins + 3) as *const i32) };
    Ok(ins.wrapping_add(7).wrapping_add(disp as isize as usize))
}

/// Reads a pointer-sized value, treating unreadable pages and null as the
/// same "not there right now" condition.
#[cfg(windows)]
fn read_live_ptr(addr: usize) -> Option<usize> {
    if !is_memory_readable(addr, std::mem::size_of::<usize>()) {
        return None;
    }
    let value = unsafe { ptr::read_unaligned(addr as *const usize) };
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

#[cfg(windows)]
fn is_memory_readable(addr: usize, len: usize) -> bool {
    use winapi::um::memoryapi::VirtualQuery;
    use winapi::um::winnt::{
        MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
        PAGE_READONLY, PAGE_READWRITE,
    };

    unsafe {
        let mut mbi: MEMORY_BASIC_INFORMATION = std::mem::zeroed();
        let result = VirtualQuery(
            addr as *const _,
            &mut mbi,
            std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
        );

        if result == 0 || mbi.State != MEM_COMMIT {
            return false;
        }

        let readable = matches!(
            mbi.Protect,
            PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE | PAGE_READONLY | PAGE_READWRITE
        );

        // The queried region must cover the whole range we overlay
        readable && mbi.BaseAddress as usize + mbi.RegionSize >= addr + len
    }
}

/// Non-owning view over one frame's camera block.
///
/// Accessors go straight to game memory through the offset table; there is no
/// caching and no clamping. The game keeps pitch inside its own bounds
/// (observed ~-0.35..+1.57 rad in third person); out-of-range writes are
/// passed through as-is.
pub struct CameraView {
    base: usize,
}

impl CameraView {
    /// Overlay onto `base`.
    ///
    /// # Safety
    /// `base` must point to at least [`CAMERA_BLOCK_LEN`] bytes that stay
    /// readable and writable for the lifetime of the view.
    pub unsafe fn from_raw(base: usize) -> Self {
        Self { base }
    }

    pub fn as_ptr(&self) -> usize {
        self.base
    }

    fn read_f32(&self, offset: usize) -> f32 {
        debug_assert!(offset + 4 <= CAMERA_BLOCK_LEN);
        unsafe { ptr::read_unaligned((self.base + offset) as *const f32) }
    }

    fn write_f32(&self, offset: usize, value: f32) {
        debug_assert!(offset + 4 <= CAMERA_BLOCK_LEN);
        unsafe { ptr::write_unaligned((self.base + offset) as *mut f32, value) }
    }

    fn read_i32(&self, offset: usize) -> i32 {
        debug_assert!(offset + 4 <= CAMERA_BLOCK_LEN);
        unsafe { ptr::read_unaligned((self.base + offset) as *const i32) }
    }

    pub fn current_yaw(&self) -> f32 {
        self.read_f32(offsets::H_ROTATION)
    }

    pub fn set_current_yaw(&self, value: f32) {
        self.write_f32(offsets::H_ROTATION, value)
    }

    pub fn current_pitch(&self) -> f32 {
        self.read_f32(offsets::V_ROTATION)
    }

    pub fn set_current_pitch(&self, value: f32) {
        self.write_f32(offsets::V_ROTATION, value)
    }

    // Diagnostics-only fields below; never written.

    pub fn current_zoom(&self) -> f32 {
        self.read_f32(offsets::CURRENT_ZOOM)
    }

    pub fn zoom_range(&self) -> (f32, f32) {
        (
            self.read_f32(offsets::MIN_ZOOM),
            self.read_f32(offsets::MAX_ZOOM),
        )
    }

    pub fn current_fov(&self) -> f32 {
        self.read_f32(offsets::CURRENT_FOV)
    }

    pub fn pitch_bounds(&self) -> (f32, f32) {
        (
            self.read_f32(offsets::MIN_V_ROTATION),
            self.read_f32(offsets::MAX_V_ROTATION),
        )
    }

    pub fn mode(&self) -> i32 {
        self.read_i32(offsets::MODE)
    }
}

impl fmt::Debug for CameraView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraView")
            .field("self", &format_args!("{:x}", self.base))
            .field("yaw", &self.current_yaw())
            .field("pitch", &self.current_pitch())
            .field("zoom", &self.current_zoom())
            .field("fov", &self.current_fov())
            .field("mode", &self.mode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(align(8))]
    struct Block([u8; CAMERA_BLOCK_LEN]);

    fn view_over(block: &mut Block) -> CameraView {
        unsafe { CameraView::from_raw(block.0.as_mut_ptr() as usize) }
    }

    #[test]
    fn test_yaw_pitch_roundtrip() {
        let mut block = Block([0u8; CAMERA_BLOCK_LEN]);
        let view = view_over(&mut block);
        view.set_current_yaw(1.5);
        view.set_current_pitch(-0.25);
        assert_eq!(view.current_yaw(), 1.5);
        assert_eq!(view.current_pitch(), -0.25);
    }

    #[test]
    fn test_fields_map_to_distinct_offsets() {
        let mut block = Block([0u8; CAMERA_BLOCK_LEN]);
        let view = view_over(&mut block);
        view.set_current_yaw(1.0);
        assert_eq!(view.current_pitch(), 0.0);
        assert_eq!(view.current_zoom(), 0.0);
        view.set_current_pitch(2.0);
        assert_eq!(view.current_yaw(), 1.0);
    }

    #[cfg(windows)]
    #[test]
    fn test_locate_follows_chain_and_rejects_null() {
        // slot -> manager -> camera over local buffers; locate's readability
        // checks run against this process's own pages
        let mut camera = Block([0u8; CAMERA_BLOCK_LEN]);
        camera.0[0x140..0x144].copy_from_slice(&0.5f32.to_le_bytes());
        let mut manager = [camera.0.as_mut_ptr() as usize, 0, 0, 0];
        let slot_value = manager.as_ptr() as usize;
        let slot = &slot_value as *const usize as usize;

        let resolver = CameraResolver::from_slot_address(slot);
        let view = resolver.locate().expect("chain should resolve");
        assert_eq!(view.current_yaw(), 0.5);

        manager[0] = 0;
        assert!(resolver.locate().is_none());
    }

    #[test]
    fn test_diagnostic_fields_read_raw_bytes() {
        let mut block = Block([0u8; CAMERA_BLOCK_LEN]);
        block.0[0x124..0x128].copy_from_slice(&6.0f32.to_le_bytes());
        block.0[0x128..0x12C].copy_from_slice(&1.5f32.to_le_bytes());
        block.0[0x12C..0x130].copy_from_slice(&20.0f32.to_le_bytes());
        block.0[0x180..0x184].copy_from_slice(&1i32.to_le_bytes());
        let view = view_over(&mut block);
        assert_eq!(view.current_zoom(), 6.0);
        assert_eq!(view.zoom_range(), (1.5, 20.0));
        assert_eq!(view.mode(), 1);
    }
}
