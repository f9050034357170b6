//! TJpgDec as baked into ESP32 mask ROM (`jd_prepare` / `jd_decomp`).
//!
//! The ROM symbols come from the chip's linker scripts, so this module only
//! links on targets that provide them. The active input and sink are
//! published in one global slot for the ROM callbacks, installed and cleared
//! by [`DispatchGuard`]. Only one ROM decode may run at a time.

use core::ffi::c_void;

use jpgband_core::{
    BlockRect, BlockSink, Decompressor, ImageHeader, JdrStatus, JpegInput, Scale,
    decoder::WorkArea,
};
use log::warn;

/// Size of the ROM `JDEC` state block.
pub const JDEC_BYTES: usize = 1536;
const JDEC_WORDS: usize = JDEC_BYTES / core::mem::size_of::<u32>();

/// `JRECT`: inclusive output rectangle.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RomRect {
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
}

impl From<RomRect> for BlockRect {
    fn from(rect: RomRect) -> Self {
        BlockRect::new(rect.left, rect.top, rect.right, rect.bottom)
    }
}

/// Leading fields of the ROM `JDEC`, up to the image size.
#[repr(C)]
#[derive(Clone, Copy)]
#[allow(dead_code)]
struct JdecHead {
    dctr: u32,
    dptr: *mut u8,
    inbuf: *mut u8,
    dmsk: u8,
    scale: u8,
    msx: u8,
    msy: u8,
    qtid: [u8; 3],
    dcv: [i16; 3],
    nrst: u16,
    width: u32,
    height: u32,
}

fn header_from_state(state: &[u32; JDEC_WORDS]) -> Result<ImageHeader, JdrStatus> {
    // SAFETY: the state block is larger than `JdecHead` and every bit pattern
    // is a valid `JdecHead`.
    let head = unsafe { core::ptr::read_unaligned(state.as_ptr() as *const JdecHead) };
    let width = u16::try_from(head.width).map_err(|_| JdrStatus::Parameter)?;
    let height = u16::try_from(head.height).map_err(|_| JdrStatus::Parameter)?;
    Ok(ImageHeader::new(width, height))
}

type ReadFn = unsafe fn(*mut c_void, *mut u8, usize) -> usize;
type SkipFn = unsafe fn(*mut c_void, usize) -> usize;
type PutFn = unsafe fn(*mut c_void, BlockRect, &[u8]) -> bool;

#[derive(Clone, Copy)]
struct RomDispatch {
    input: *mut c_void,
    read: ReadFn,
    skip: SkipFn,
    sink: *mut c_void,
    put: Option<PutFn>,
}

static mut ROM_DISPATCH: Option<RomDispatch> = None;

#[inline]
unsafe fn dispatch_load() -> Option<RomDispatch> {
    // SAFETY: Access is serialized by DispatchGuard.
    unsafe { core::ptr::read(core::ptr::addr_of!(ROM_DISPATCH)) }
}

#[inline]
unsafe fn dispatch_store(value: Option<RomDispatch>) {
    // SAFETY: Access is serialized by DispatchGuard.
    unsafe { core::ptr::write(core::ptr::addr_of_mut!(ROM_DISPATCH), value) }
}

struct DispatchGuard;

impl DispatchGuard {
    /// Publishes `dispatch`; `None` when another decode holds the slot.
    unsafe fn install(dispatch: RomDispatch) -> Option<Self> {
        // SAFETY: install/drop pair is the only writer of the slot.
        unsafe {
            if dispatch_load().is_some() {
                return None;
            }
            dispatch_store(Some(dispatch));
        }
        Some(Self)
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        // SAFETY: Clear callback context on scope exit.
        unsafe { dispatch_store(None) }
    }
}

unsafe fn read_thunk<I: JpegInput>(user: *mut c_void, buf: *mut u8, len: usize) -> usize {
    // SAFETY: `user` is the live `I` installed for this decode and `buf` is
    // the ROM's buffer of `len` bytes.
    let input = unsafe { &mut *(user as *mut I) };
    let out = unsafe { core::slice::from_raw_parts_mut(buf, len) };
    input.read(out)
}

unsafe fn skip_thunk<I: JpegInput>(user: *mut c_void, len: usize) -> usize {
    // SAFETY: `user` is the live `I` installed for this decode.
    let input = unsafe { &mut *(user as *mut I) };
    input.skip(len)
}

unsafe fn put_thunk<S: BlockSink>(user: *mut c_void, rect: BlockRect, rgb: &[u8]) -> bool {
    // SAFETY: `user` is the live `S` installed for this decode.
    let sink = unsafe { &mut *(user as *mut S) };
    sink.put_block(rect, rgb)
}

unsafe extern "C" {
    fn jd_prepare(
        jd: *mut c_void,
        infunc: Option<unsafe extern "C" fn(*mut c_void, *mut u8, u32) -> u32>,
        pool: *mut c_void,
        sz_pool: u32,
        device: *mut c_void,
    ) -> i32;

    fn jd_decomp(
        jd: *mut c_void,
        outfunc: Option<unsafe extern "C" fn(*mut c_void, *mut c_void, *mut RomRect) -> u32>,
        scale: u8,
    ) -> i32;
}

/// ROM input callback: a null `buff` asks for a skip.
unsafe extern "C" fn rom_input(_jd: *mut c_void, buff: *mut u8, nbyte: u32) -> u32 {
    let want = nbyte as usize;
    if want == 0 {
        return 0;
    }

    // SAFETY: Read dispatch installed by DispatchGuard.
    let Some(io) = (unsafe { dispatch_load() }) else {
        return 0;
    };

    let got = if buff.is_null() {
        // SAFETY: input pointer and thunk were installed together.
        unsafe { (io.skip)(io.input, want) }
    } else {
        // SAFETY: as above; `buff` holds `want` bytes.
        unsafe { (io.read)(io.input, buff, want) }
    };
    got.min(want) as u32
}

/// ROM output callback: `bitmap` is RGB888 for `rect`. Returns 1 to go on.
unsafe extern "C" fn rom_output(_jd: *mut c_void, bitmap: *mut c_void, rect: *mut RomRect) -> u32 {
    if bitmap.is_null() || rect.is_null() {
        return 0;
    }

    // SAFETY: Read dispatch installed by DispatchGuard.
    let Some(io) = (unsafe { dispatch_load() }) else {
        return 0;
    };
    let Some(put) = io.put else {
        return 0;
    };

    // SAFETY: the ROM hands a valid rectangle and its RGB888 pixels for the
    // duration of the callback.
    let rect = BlockRect::from(unsafe { *rect });
    let rgb = unsafe { core::slice::from_raw_parts(bitmap as *const u8, rect.pixel_count() * 3) };
    // SAFETY: sink pointer and thunk were installed together.
    unsafe { put(io.sink, rect, rgb) as u32 }
}

fn status(code: i32) -> Result<(), JdrStatus> {
    match JdrStatus::from_code(code) {
        None => Ok(()),
        Some(status) => Err(status),
    }
}

/// ROM TJpgDec driven through [`Decompressor`].
pub struct RomTjpgd {
    state: [u32; JDEC_WORDS],
    pool: *mut u32,
}

impl Default for RomTjpgd {
    fn default() -> Self {
        Self::new()
    }
}

impl RomTjpgd {
    pub const fn new() -> Self {
        Self {
            state: [0; JDEC_WORDS],
            pool: core::ptr::null_mut(),
        }
    }
}

impl Decompressor for RomTjpgd {
    fn prepare<I: JpegInput>(
        &mut self,
        input: &mut I,
        work: &mut WorkArea,
    ) -> Result<ImageHeader, JdrStatus> {
        let Ok(sz_pool) = u32::try_from(work.len_bytes()) else {
            return Err(JdrStatus::Parameter);
        };
        let dispatch = RomDispatch {
            input: input as *mut I as *mut c_void,
            read: read_thunk::<I>,
            skip: skip_thunk::<I>,
            sink: core::ptr::null_mut(),
            put: None,
        };
        // SAFETY: `input` outlives the guard.
        let Some(_guard) = (unsafe { DispatchGuard::install(dispatch) }) else {
            warn!("jpeg: rom callback slot busy");
            return Err(JdrStatus::Parameter);
        };

        self.state = [0; JDEC_WORDS];
        self.pool = core::ptr::null_mut();
        // SAFETY: ROM TJPGD expects opaque state pointer + callbacks + work pool;
        // the pool is 4-byte aligned and `sz_pool` bytes long.
        let code = unsafe {
            jd_prepare(
                self.state.as_mut_ptr() as *mut c_void,
                Some(rom_input),
                work.as_mut_ptr() as *mut c_void,
                sz_pool,
                core::ptr::null_mut(),
            )
        };
        status(code)?;

        self.pool = work.as_mut_ptr();
        header_from_state(&self.state)
    }

    fn decompress<I: JpegInput, S: BlockSink>(
        &mut self,
        input: &mut I,
        work: &mut WorkArea,
        sink: &mut S,
        scale: Scale,
    ) -> Result<(), JdrStatus> {
        if self.pool.is_null() || self.pool != work.as_mut_ptr() {
            warn!("jpeg: rom decompress without matching prepare");
            return Err(JdrStatus::Parameter);
        }

        let dispatch = RomDispatch {
            input: input as *mut I as *mut c_void,
            read: read_thunk::<I>,
            skip: skip_thunk::<I>,
            sink: sink as *mut S as *mut c_void,
            put: Some(put_thunk::<S>),
        };
        // SAFETY: `input` and `sink` outlive the guard.
        let Some(_guard) = (unsafe { DispatchGuard::install(dispatch) }) else {
            warn!("jpeg: rom callback slot busy");
            return Err(JdrStatus::Parameter);
        };

        // SAFETY: Decoder state and pool were initialized by jd_prepare on
        // this same work area.
        let code = unsafe {
            jd_decomp(
                self.state.as_mut_ptr() as *mut c_void,
                Some(rom_output),
                scale.ordinal(),
            )
        };
        self.pool = core::ptr::null_mut();
        status(code)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use jpgband_core::input::BufferInput;

    use super::*;

    static SLOT: Mutex<()> = Mutex::new(());

    struct Collect(Vec<(BlockRect, Vec<u8>)>);

    impl BlockSink for Collect {
        fn put_block(&mut self, rect: BlockRect, rgb: &[u8]) -> bool {
            self.0.push((rect, rgb.to_vec()));
            rect.left == 0
        }
    }

    fn input_only<I: JpegInput>(input: &mut I) -> RomDispatch {
        RomDispatch {
            input: input as *mut I as *mut c_void,
            read: read_thunk::<I>,
            skip: skip_thunk::<I>,
            sink: core::ptr::null_mut(),
            put: None,
        }
    }

    #[test]
    fn rom_status_codes_map_to_results() {
        assert_eq!(status(0), Ok(()));
        assert_eq!(status(1), Err(JdrStatus::Interrupted));
        assert_eq!(status(8), Err(JdrStatus::Format3));
    }

    #[test]
    fn input_callback_reads_and_skips() {
        let _slot = SLOT.lock().unwrap();
        let data = [1u8, 2, 3, 4, 5];
        let mut input = BufferInput::new(&data);
        let _guard = unsafe { DispatchGuard::install(input_only(&mut input)) }.unwrap();

        let mut buf = [0u8; 2];
        let skipped = unsafe { rom_input(core::ptr::null_mut(), core::ptr::null_mut(), 2) };
        let read = unsafe { rom_input(core::ptr::null_mut(), buf.as_mut_ptr(), 2) };

        assert_eq!((skipped, read), (2, 2));
        assert_eq!(buf, [3, 4]);
    }

    #[test]
    fn output_callback_forwards_blocks_and_stop_requests() {
        let _slot = SLOT.lock().unwrap();
        let data = [0u8; 1];
        let mut input = BufferInput::new(&data);
        let mut sink = Collect(Vec::new());
        let dispatch = RomDispatch {
            sink: &mut sink as *mut Collect as *mut c_void,
            put: Some(put_thunk::<Collect>),
            ..input_only(&mut input)
        };

        let mut rgb = [0xAAu8; 2 * 3];
        let mut first = RomRect {
            left: 0,
            right: 1,
            top: 0,
            bottom: 0,
        };
        let mut second = RomRect {
            left: 2,
            right: 3,
            top: 0,
            bottom: 0,
        };
        let (go, stop) = {
            let _guard = unsafe { DispatchGuard::install(dispatch) }.unwrap();
            let bitmap = rgb.as_mut_ptr() as *mut c_void;
            unsafe {
                (
                    rom_output(core::ptr::null_mut(), bitmap, &mut first),
                    rom_output(core::ptr::null_mut(), bitmap, &mut second),
                )
            }
        };

        assert_eq!((go, stop), (1, 0));
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[0].0, BlockRect::new(0, 0, 1, 0));
        assert_eq!(sink.0[0].1, vec![0xAA; 6]);
    }

    #[test]
    fn callbacks_without_installed_slot_stop_the_decoder() {
        let _slot = SLOT.lock().unwrap();
        let mut buf = [0u8; 4];
        let mut rgb = [0u8; 3];
        let mut rect = RomRect::default();

        unsafe {
            assert_eq!(rom_input(core::ptr::null_mut(), buf.as_mut_ptr(), 4), 0);
            assert_eq!(
                rom_output(
                    core::ptr::null_mut(),
                    rgb.as_mut_ptr() as *mut c_void,
                    &mut rect
                ),
                0
            );
        }
    }

    #[test]
    fn second_install_is_refused_until_release() {
        let _slot = SLOT.lock().unwrap();
        let data = [0u8; 1];
        let mut first = BufferInput::new(&data);
        let mut second = BufferInput::new(&data);

        let guard = unsafe { DispatchGuard::install(input_only(&mut first)) };
        assert!(guard.is_some());
        assert!(unsafe { DispatchGuard::install(input_only(&mut second)) }.is_none());

        drop(guard);
        assert!(unsafe { DispatchGuard::install(input_only(&mut second)) }.is_some());
    }

    #[test]
    fn image_size_comes_from_jdec_head() {
        let mut state = [0u32; JDEC_WORDS];
        let head = JdecHead {
            dctr: 0,
            dptr: core::ptr::null_mut(),
            inbuf: core::ptr::null_mut(),
            dmsk: 0,
            scale: 0,
            msx: 2,
            msy: 2,
            qtid: [0; 3],
            dcv: [0; 3],
            nrst: 0,
            width: 320,
            height: 240,
        };
        unsafe { core::ptr::write_unaligned(state.as_mut_ptr() as *mut JdecHead, head) };
        assert_eq!(header_from_state(&state), Ok(ImageHeader::new(320, 240)));

        let oversized = JdecHead {
            width: 70_000,
            ..head
        };
        unsafe { core::ptr::write_unaligned(state.as_mut_ptr() as *mut JdecHead, oversized) };
        assert_eq!(header_from_state(&state), Err(JdrStatus::Parameter));
    }
}
