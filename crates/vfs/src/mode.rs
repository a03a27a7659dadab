//! TEAM_201: POSIX file mode helpers
//!
//! Type and permission bits of `st_mode`. The constants themselves come from
//! `linux-raw-sys` so they always agree with the syscall ABI.

pub use linux_raw_sys::general::{
    S_IFBLK, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFMT, S_IFREG, S_IFSOCK,
};
use linux_raw_sys::general::{
    DT_BLK, DT_CHR, DT_DIR, DT_FIFO, DT_LNK, DT_REG, DT_SOCK, DT_UNKNOWN,
};

/// Permission and set-id bits
pub const S_IALLUGO: u32 = 0o7777;

/// Write permission for owner, group and others
pub const S_IWUGO: u32 = 0o222;

#[inline]
pub const fn is_reg(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFREG
}

#[inline]
pub const fn is_dir(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFDIR
}

#[inline]
pub const fn is_lnk(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFLNK
}

#[inline]
pub const fn is_chr(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFCHR
}

/// TEAM_201: Extract just the file type from mode
#[inline]
pub const fn file_type(mode: u32) -> u32 {
    mode & S_IFMT
}

/// TEAM_201: Extract just the permission bits from mode
#[inline]
pub const fn permissions(mode: u32) -> u32 {
    mode & S_IALLUGO
}

/// TEAM_201: Create a mode with file type and permissions
#[inline]
pub const fn make_mode(file_type: u32, perms: u32) -> u32 {
    (file_type & S_IFMT) | (perms & S_IALLUGO)
}

/// TEAM_470: `d_type` value for a directory entry of this mode
pub const fn dirent_type(mode: u32) -> u32 {
    match mode & S_IFMT {
        S_IFDIR => DT_DIR,
        S_IFREG => DT_REG,
        S_IFLNK => DT_LNK,
        S_IFCHR => DT_CHR,
        S_IFBLK => DT_BLK,
        S_IFIFO => DT_FIFO,
        S_IFSOCK => DT_SOCK,
        _ => DT_UNKNOWN,
    }
}
