//! TEAM_202: Read/write/seek tests

use super::setup;
use crate::error::VfsError;
use crate::file::{OpenFlags, SeekWhence};
use crate::stat::{Stat, StatMask};

fn hundred_bytes() -> [u8; 100] {
    let mut data = [0u8; 100];
    for (i, b) in data.iter_mut().enumerate() {
        *b = i as u8;
    }
    data
}

/// Tests: [IO1] the primitive read returns a short count, [IO2] the exact wrapper turns it into IoError
#[test]
fn test_short_read() {
    let fx = setup();
    fx.write_file("/f", &hundred_bytes());
    let h = fx.open("/f", OpenFlags::O_RDONLY).unwrap();

    assert_eq!(fx.vfs.lseek(&fx.task, h, 60, SeekWhence::Set).unwrap(), 60);
    let mut buf = [0u8; 100];
    assert_eq!(fx.vfs.read(&fx.task, h, &mut buf).unwrap(), 40); // [IO1]
    assert_eq!(buf[0], 60);
    assert_eq!(buf[39], 99);
    assert_eq!(fx.vfs.read(&fx.task, h, &mut buf).unwrap(), 0);

    fx.vfs.lseek(&fx.task, h, 60, SeekWhence::Set).unwrap();
    assert_eq!(fx.vfs.read_exact(&fx.task, h, &mut buf), Err(VfsError::IoError)); // [IO2]
    assert_eq!(
        fx.vfs.pread_exact(&fx.task, h, 90, &mut buf[..20]),
        Err(VfsError::IoError)
    );
    fx.vfs.pread_exact(&fx.task, h, 90, &mut buf[..10]).unwrap();
    assert_eq!(buf[0], 90);
}

/// Tests: positional I/O leaves the cursor alone
#[test]
fn test_positional_io() {
    let fx = setup();
    fx.write_file("/f", b"0123456789");
    let h = fx.open("/f", OpenFlags::O_RDWR).unwrap();
    fx.vfs.lseek(&fx.task, h, 2, SeekWhence::Set).unwrap();

    let mut buf = [0u8; 3];
    assert_eq!(fx.vfs.pread(&fx.task, h, 5, &mut buf).unwrap(), 3);
    assert_eq!(&buf, b"567");
    fx.vfs.pwrite_exact(&fx.task, h, 8, b"XYZ").unwrap();
    assert_eq!(fx.vfs.lseek(&fx.task, h, 0, SeekWhence::Cur).unwrap(), 2);
    assert_eq!(fx.read_file("/f"), b"01234567XYZ");
}

/// Tests: scatter/gather segments are filled and consumed in order
#[test]
fn test_vectored_io() {
    let fx = setup();
    let h = fx
        .open("/v", OpenFlags::O_CREAT | OpenFlags::O_RDWR)
        .unwrap();
    assert_eq!(fx.vfs.writev(&fx.task, h, &[&b"abc"[..], &b""[..], &b"defg"[..]]).unwrap(), 7);

    fx.vfs.lseek(&fx.task, h, 0, SeekWhence::Set).unwrap();
    let mut first = [0u8; 2];
    let mut second = [0u8; 4];
    let mut third = [0u8; 4];
    let n = fx
        .vfs
        .readv(&fx.task, h, &mut [&mut first[..], &mut second[..], &mut third[..]])
        .unwrap();
    assert_eq!(n, 7);
    assert_eq!(&first, b"ab");
    assert_eq!(&second, b"cdef");
    assert_eq!(&third[..1], b"g");

    let mut tail = [0u8; 3];
    assert_eq!(fx.vfs.preadv(&fx.task, h, 5, &mut [&mut tail[..]]).unwrap(), 2);
    assert_eq!(fx.vfs.pwritev(&fx.task, h, 7, &[&b"h"[..], &b"i"[..]]).unwrap(), 2);
    assert_eq!(fx.read_file("/v"), b"abcdefghi");
}

/// Tests: seek origins and invalid targets
#[test]
fn test_seek() {
    let fx = setup();
    fx.write_file("/f", b"0123456789");
    let h = fx.open("/f", OpenFlags::O_RDONLY).unwrap();
    assert_eq!(fx.vfs.lseek(&fx.task, h, -3, SeekWhence::End).unwrap(), 7);
    assert_eq!(fx.vfs.lseek(&fx.task, h, 2, SeekWhence::Cur).unwrap(), 9);
    assert_eq!(fx.vfs.lseek(&fx.task, h, 5, SeekWhence::End).unwrap(), 15);
    assert_eq!(
        fx.vfs.lseek(&fx.task, h, -1, SeekWhence::Set),
        Err(VfsError::InvalidArgument)
    );
    assert_eq!(
        fx.vfs.lseek(&fx.task, h, -20, SeekWhence::Cur),
        Err(VfsError::InvalidArgument)
    );
    // Failed seeks keep the old position
    assert_eq!(fx.vfs.lseek(&fx.task, h, 0, SeekWhence::Cur).unwrap(), 15);
    assert!(SeekWhence::from_raw(7).is_err());
}

/// Tests: writes past the end leave a zero-filled gap
#[test]
fn test_sparse_write() {
    let fx = setup();
    let h = fx
        .open("/s", OpenFlags::O_CREAT | OpenFlags::O_WRONLY)
        .unwrap();
    fx.vfs.lseek(&fx.task, h, 4, SeekWhence::Set).unwrap();
    fx.vfs.write_exact(&fx.task, h, b"x").unwrap();
    assert_eq!(fx.read_file("/s"), b"\0\0\0\0x");
    assert_eq!(fx.vfs.write(&fx.task, h, b"").unwrap(), 0);
    assert_eq!(fx.vfs.fstat(&fx.task, h).unwrap().size, 5);

    let too_far = crate::tmpfs::MAX_FILE_SIZE as u64;
    assert_eq!(
        fx.vfs.pwrite(&fx.task, h, too_far, b"y"),
        Err(VfsError::FileTooLarge)
    );
}

/// Tests: O_TRUNC empties, O_APPEND writes at the end regardless of the cursor
#[test]
fn test_truncate_and_append() {
    let fx = setup();
    fx.write_file("/f", b"long contents");
    let h = fx.open("/f", OpenFlags::O_WRONLY | OpenFlags::O_TRUNC).unwrap();
    assert_eq!(fx.vfs.fstat(&fx.task, h).unwrap().size, 0);
    fx.vfs.write_exact(&fx.task, h, b"ab").unwrap();

    let a = fx.open("/f", OpenFlags::O_WRONLY | OpenFlags::O_APPEND).unwrap();
    fx.vfs.lseek(&fx.task, a, 0, SeekWhence::Set).unwrap();
    fx.vfs.write_exact(&fx.task, a, b"cd").unwrap();
    assert_eq!(fx.vfs.lseek(&fx.task, a, 0, SeekWhence::Cur).unwrap(), 4);
    assert_eq!(fx.read_file("/f"), b"abcd");
}

/// Tests: write_stat applies only masked fields
#[test]
fn test_write_stat() {
    let fx = setup();
    fx.write_file("/f", b"0123456789");
    let h = fx.open("/f", OpenFlags::O_RDWR).unwrap();
    let before = fx.vfs.fstat(&fx.task, h).unwrap();

    let change = Stat {
        size: 4,
        mode: 0o600,
        uid: 42,
        mtime: 1234,
        ..Stat::default()
    };
    fx.vfs
        .write_stat(&fx.task, h, &change, StatMask::SIZE | StatMask::MODE | StatMask::MTIME)
        .unwrap();
    let after = fx.vfs.fstat(&fx.task, h).unwrap();
    assert_eq!(after.size, 4);
    assert_eq!(crate::mode::permissions(after.mode), 0o600);
    assert!(crate::mode::is_reg(after.mode));
    assert_eq!(after.mtime, 1234);
    assert_eq!(after.uid, before.uid);
    assert_eq!(fx.read_file("/f"), b"0123");
}

/// Tests: directory handles refuse byte I/O, file handles refuse readdir
#[test]
fn test_kind_mismatch() {
    let fx = setup();
    fx.write_file("/f", b"x");
    let dir = fx.open("/dev", OpenFlags::O_RDONLY).unwrap();
    let mut buf = [0u8; 1];
    assert_eq!(fx.vfs.read(&fx.task, dir, &mut buf), Err(VfsError::IsADirectory));
    assert_eq!(
        fx.vfs.lseek(&fx.task, dir, 0, SeekWhence::Set),
        Err(VfsError::IsADirectory)
    );
    assert_eq!(
        fx.open("/dev", OpenFlags::O_RDWR).err(),
        Some(VfsError::IsADirectory)
    );

    let file = fx.open("/f", OpenFlags::O_RDONLY).unwrap();
    assert_eq!(
        fx.vfs.read_directory(&fx.task, file),
        Err(VfsError::NotADirectory)
    );
    assert!(fx.vfs.fsync(&fx.task, file).is_ok());
}
