//! TEAM_470: Device node tests

use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use linux_raw_sys::general::{SEEK_CUR, SEEK_SET};

use super::setup;
use crate::driver::{FileOps, FileOpsRef};
use crate::error::{VfsError, VfsResult};
use crate::file::{FileTableNode, OpenFlags, SeekWhence};
use crate::mode;
use crate::syscall::sys_lseek;
use crate::task::TaskContext;

const GET_COUNT: u32 = 0x5401;

/// Endless stream of one byte value; counts closes and writes
struct ByteDevice {
    value: u8,
    closes: AtomicUsize,
    written: AtomicUsize,
}

impl ByteDevice {
    fn new(value: u8) -> Arc<Self> {
        Arc::new(Self {
            value,
            closes: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
        })
    }
}

impl FileOps for ByteDevice {
    fn close(&self, _file: &FileTableNode) -> VfsResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read(&self, _file: &FileTableNode, _position: u64, segments: &mut [&mut [u8]]) -> VfsResult<usize> {
        let mut total = 0;
        for segment in segments.iter_mut() {
            segment.fill(self.value);
            total += segment.len();
        }
        Ok(total)
    }

    fn write(&self, _file: &FileTableNode, _position: u64, segments: &[&[u8]]) -> VfsResult<usize> {
        let length = segments.iter().map(|s| s.len()).sum();
        self.written.fetch_add(length, Ordering::SeqCst);
        Ok(length)
    }

    fn device_control(
        &self,
        _file: &FileTableNode,
        request: u32,
        _input: &[u8],
        output: &mut [u8],
    ) -> VfsResult<usize> {
        if request != GET_COUNT {
            return Err(VfsError::NotSupported);
        }
        let count = self.written.load(Ordering::SeqCst) as u32;
        let bytes = count.to_le_bytes();
        let n = bytes.len().min(output.len());
        output[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }
}

/// Tests: [V1] a registered device appears under /dev with its own operations,
/// [V2] ioctl reaches the device
#[test]
fn test_register_device() {
    let fx = setup();
    let dev = ByteDevice::new(b'z');
    let ops: FileOpsRef = dev.clone();
    let ino = fx.vfs.register_device("input/kbd", ops).unwrap();

    let stat = fx.vfs.stat(&fx.task, None, "/dev/input/kbd").unwrap();
    assert!(mode::is_chr(stat.mode));
    assert_eq!(stat.ino, ino);
    assert!(fx.resolve("/dev/input").unwrap().is_dir());

    let h = fx.open("/dev/input/kbd", OpenFlags::O_RDWR).unwrap();
    let mut buf = [0u8; 3];
    fx.vfs.read_exact(&fx.task, h, &mut buf).unwrap();
    assert_eq!(&buf, b"zzz"); // [V1]
    fx.vfs.write_exact(&fx.task, h, b"hello").unwrap();

    let mut out = [0u8; 4];
    let n = fx
        .vfs
        .device_control(&fx.task, h, GET_COUNT, &[], &mut out)
        .unwrap();
    assert_eq!(n, 4);
    assert_eq!(u32::from_le_bytes(out), 5); // [V2]
    assert_eq!(
        fx.vfs.device_control(&fx.task, h, 1, &[], &mut out),
        Err(VfsError::NotSupported)
    );
}

/// Tests: [V3] the device closes once, when the last duplicate goes
#[test]
fn test_device_close_once() {
    let fx = setup();
    let dev = ByteDevice::new(0);
    fx.vfs.register_device("null", dev.clone()).unwrap();

    let h = fx.open("/dev/null", OpenFlags::O_RDONLY).unwrap();
    let dup = fx.vfs.dup(&fx.task, h).unwrap();
    fx.vfs.close(&fx.task, h).unwrap();
    assert_eq!(dev.closes.load(Ordering::SeqCst), 0);
    fx.vfs.close(&fx.task, dup).unwrap();
    assert_eq!(dev.closes.load(Ordering::SeqCst), 1); // [V3]

    // A failed open does not reach close
    assert!(fx.open("/dev/null", OpenFlags::O_RDONLY | OpenFlags::O_DIRECTORY).is_err());
    assert_eq!(dev.closes.load(Ordering::SeqCst), 1);

    // Path handles never opened the device, so they do not close it
    let path = fx.open("/dev/null", OpenFlags::O_PATH).unwrap();
    fx.vfs.close(&fx.task, path).unwrap();
    assert_eq!(dev.closes.load(Ordering::SeqCst), 1);

    let h = fx.open("/dev/null", OpenFlags::O_RDONLY).unwrap();
    fx.task.io_context().close_all();
    assert_eq!(dev.closes.load(Ordering::SeqCst), 2);
    assert_eq!(fx.vfs.close(&fx.task, h), Err(VfsError::BadFd));
}

/// Tests: devices can be renamed and removed by id
#[test]
fn test_rename_and_remove_device() {
    let fx = setup();
    let ino = fx.vfs.register_device("tty0", ByteDevice::new(1)).unwrap();
    assert_eq!(
        fx.vfs.register_device("tty0", ByteDevice::new(2)).err(),
        Some(VfsError::AlreadyExists)
    );

    fx.vfs.rename_device(ino, "term/console").unwrap();
    assert_eq!(fx.resolve("/dev/tty0").err(), Some(VfsError::NotFound));
    assert_eq!(fx.resolve("/dev/term/console").unwrap().ino(), ino);

    fx.vfs.remove_device(ino).unwrap();
    assert_eq!(fx.resolve("/dev/term/console").err(), Some(VfsError::NotFound));
    assert_eq!(fx.vfs.remove_device(ino), Err(VfsError::NotFound));
    assert_eq!(
        fx.vfs.register_device("", ByteDevice::new(3)).err(),
        Some(VfsError::InvalidArgument)
    );
}

/// Tests: [V4] seeks stop at the largest signed offset, [V5] reads near it keep a valid cursor
#[test]
fn test_device_cursor_limit() {
    let fx = setup();
    fx.vfs.register_device("zero", ByteDevice::new(0)).unwrap();
    let h = fx.open("/dev/zero", OpenFlags::O_RDWR).unwrap();

    let max = i64::MAX as u64;
    assert_eq!(fx.vfs.lseek(&fx.task, h, i64::MAX, SeekWhence::Set), Ok(max));
    assert_eq!(
        fx.vfs.lseek(&fx.task, h, i64::MAX, SeekWhence::Cur),
        Err(VfsError::InvalidArgument)
    ); // [V4]
    assert_eq!(
        fx.vfs.lseek(&fx.task, h, 1, SeekWhence::Cur),
        Err(VfsError::InvalidArgument)
    );
    assert_eq!(fx.vfs.lseek(&fx.task, h, 0, SeekWhence::Cur), Ok(max));

    let mut buf = [1u8; 16];
    assert_eq!(fx.vfs.read(&fx.task, h, &mut buf), Ok(16)); // [V5]
    assert_eq!(buf, [0u8; 16]);
    assert_eq!(fx.vfs.write(&fx.task, h, b"abc"), Ok(3));
    assert_eq!(fx.vfs.file_node(&fx.task, h).unwrap().position(), max + 19);

    let fd = h.raw();
    assert_eq!(
        sys_lseek(&fx.vfs, &fx.task, fd, 0, SEEK_CUR),
        Err(linux_raw_sys::errno::EINVAL)
    );
    assert_eq!(sys_lseek(&fx.vfs, &fx.task, fd, 8, SEEK_SET), Ok(8));
}
