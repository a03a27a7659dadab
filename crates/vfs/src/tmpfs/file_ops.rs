//! TEAM_203: Tmpfs File Operations

use alloc::string::String;

use crate::driver::FileOps;
use crate::error::{VfsError, VfsResult};
use crate::file::{FileTableNode, OpenFlags};
use crate::inode::InodeRef;
use crate::stat::{DirEntry, Stat, StatMask};
use crate::volume::VolumeRef;

use super::Tmpfs;
use super::dir_ops;
use super::node::{Content, MAX_FILE_SIZE, node};

impl FileOps for Tmpfs {
    fn open_file(
        &self,
        _volume: &VolumeRef,
        inode: &InodeRef,
        flags: OpenFlags,
    ) -> VfsResult<FileTableNode> {
        if flags.is_truncate() && flags.is_writable() {
            if let Content::File(data) = &mut *node(inode)?.content.lock() {
                data.clear();
            }
        }
        Ok(FileTableNode::file(inode.clone(), flags))
    }

    fn read(
        &self,
        file: &FileTableNode,
        position: u64,
        segments: &mut [&mut [u8]],
    ) -> VfsResult<usize> {
        let content = node(file.inode())?.content.lock();
        let data = match &*content {
            Content::File(data) => data,
            Content::Directory(_) => return Err(VfsError::IsADirectory),
            Content::Symlink(_) | Content::Device => return Err(VfsError::InvalidArgument),
        };

        let mut offset = usize::try_from(position).unwrap_or(usize::MAX);
        let mut total = 0;
        for segment in segments.iter_mut() {
            if offset >= data.len() {
                break;
            }
            let count = segment.len().min(data.len() - offset);
            segment[..count].copy_from_slice(&data[offset..offset + count]);
            offset += count;
            total += count;
        }
        Ok(total)
    }

    fn write(&self, file: &FileTableNode, position: u64, segments: &[&[u8]]) -> VfsResult<usize> {
        let mut content = node(file.inode())?.content.lock();
        let Content::File(data) = &mut *content else {
            return Err(if file.inode().is_dir() {
                VfsError::IsADirectory
            } else {
                VfsError::InvalidArgument
            });
        };

        let offset = usize::try_from(position).map_err(|_| VfsError::FileTooLarge)?;
        let length: usize = segments.iter().map(|s| s.len()).sum();
        if length == 0 {
            return Ok(0);
        }
        let end = offset.checked_add(length).ok_or(VfsError::FileTooLarge)?;
        if end > MAX_FILE_SIZE {
            return Err(VfsError::FileTooLarge);
        }

        if data.len() < end {
            data.resize(end, 0);
        }
        let mut cursor = offset;
        for segment in segments {
            data[cursor..cursor + segment.len()].copy_from_slice(segment);
            cursor += segment.len();
        }
        Ok(length)
    }

    fn read_link(&self, _volume: &VolumeRef, inode: &InodeRef) -> VfsResult<String> {
        match &*node(inode)?.content.lock() {
            Content::Symlink(target) => Ok(target.clone()),
            _ => Err(VfsError::InvalidArgument),
        }
    }

    fn read_directory(
        &self,
        _volume: &VolumeRef,
        dir: &FileTableNode,
    ) -> VfsResult<Option<DirEntry>> {
        let index = dir.cursor();
        let entry = dir_ops::entry_at(dir.inode(), index)?;
        if entry.is_some() {
            dir.set_cursor(index + 1);
        }
        Ok(entry)
    }

    fn read_stat(&self, volume: &VolumeRef, inode: &InodeRef) -> VfsResult<Stat> {
        let tmp = node(inode)?;
        let size = tmp.content.lock().size();
        let attrs = *tmp.attrs.lock();
        Ok(Stat {
            dev: volume.id(),
            ino: inode.ino(),
            mode: inode.mode(),
            nlink: if inode.is_dir() { 2 } else { 1 },
            uid: attrs.uid,
            gid: attrs.gid,
            size,
            atime: attrs.atime,
            mtime: attrs.mtime,
            ctime: attrs.ctime,
        })
    }

    fn write_stat(
        &self,
        _volume: &VolumeRef,
        inode: &InodeRef,
        stat: &Stat,
        mask: StatMask,
    ) -> VfsResult<()> {
        let tmp = node(inode)?;
        if mask.contains(StatMask::SIZE) {
            let size = usize::try_from(stat.size).map_err(|_| VfsError::FileTooLarge)?;
            if size > MAX_FILE_SIZE {
                return Err(VfsError::FileTooLarge);
            }
            match &mut *tmp.content.lock() {
                Content::File(data) => data.resize(size, 0),
                Content::Directory(_) => return Err(VfsError::IsADirectory),
                Content::Symlink(_) | Content::Device => return Err(VfsError::InvalidArgument),
            }
        }
        if mask.contains(StatMask::MODE) {
            inode.set_permissions(stat.mode);
        }

        let mut attrs = tmp.attrs.lock();
        if mask.contains(StatMask::UID) {
            attrs.uid = stat.uid;
        }
        if mask.contains(StatMask::GID) {
            attrs.gid = stat.gid;
        }
        if mask.contains(StatMask::ATIME) {
            attrs.atime = stat.atime;
        }
        if mask.contains(StatMask::MTIME) {
            attrs.mtime = stat.mtime;
        }
        if mask.contains(StatMask::CTIME) {
            attrs.ctime = stat.ctime;
        }
        Ok(())
    }
}
