//! TEAM_470: Node attributes and directory entries.

use alloc::string::String;

use bitflags::bitflags;

use crate::inode::Inode;
use crate::volume::VolumeId;

/// Attributes of one node, as returned by stat
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stat {
    /// Volume the node lives on
    pub dev: VolumeId,
    pub ino: u64,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
}

impl Stat {
    /// Minimal attributes derived from the inode alone
    pub fn from_inode(inode: &Inode) -> Self {
        Self {
            dev: inode.volume_id(),
            ino: inode.ino(),
            mode: inode.mode(),
            nlink: 1,
            ..Self::default()
        }
    }
}

bitflags! {
    /// TEAM_470: Which [`Stat`] fields a write_stat call applies
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct StatMask: u32 {
        const MODE = 0x01;
        const UID = 0x02;
        const GID = 0x04;
        const SIZE = 0x08;
        const ATIME = 0x10;
        const MTIME = 0x20;
        const CTIME = 0x40;
    }
}

/// TEAM_202: Directory entry returned by readdir
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirEntry {
    /// Inode number, only meaningful within `volume`
    pub ino: u64,
    pub volume: VolumeId,
    pub name: String,
    /// `d_type` value
    pub file_type: u32,
}
