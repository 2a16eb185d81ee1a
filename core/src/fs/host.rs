//! Card backend over a host directory.
//!
//! Lets the whole launch pipeline run against an unpacked copy of a storage
//! card. Host directories have no allocation table, so allocation units are
//! handed out in first-touch order from the configured geometry.
//!
//! Creating opens also create missing parent directories, so a fresh
//! directory works as a card without a prepared `/NILESWAN`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;

use hashbrown::HashMap;

use super::{CardFile, CardFs, FileInfo, FsGeometry, OpenMode};

const SECTOR_SIZE: u64 = 512;
const FIRST_DATA_CLUSTER: u32 = 2;

/// A storage card mounted from a host directory.
pub struct HostCard {
    root: PathBuf,
    cwd: String,
    geometry: FsGeometry,
    clusters: HashMap<String, u32>,
    next_cluster: u32,
}

impl HostCard {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cwd: "/".to_string(),
            geometry: FsGeometry::default(),
            clusters: HashMap::new(),
            next_cluster: FIRST_DATA_CLUSTER,
        }
    }

    pub fn with_geometry(mut self, geometry: FsGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Change the working directory. The directory must exist on the card.
    pub fn set_cwd(&mut self, path: &str) -> io::Result<()> {
        let card_path = self.normalize(path);
        if !self.host_path(&card_path).is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {card_path}"),
            ));
        }
        self.cwd = card_path;
        Ok(())
    }

    /// Host location of a card path.
    pub fn host_path(&self, path: &str) -> PathBuf {
        self.root.join(self.normalize(path).trim_start_matches('/'))
    }

    /// Absolute, `.`/`..`-free card path.
    fn normalize(&self, path: &str) -> String {
        let joined;
        let full = if path.starts_with('/') {
            path
        } else {
            joined = format!("{}/{}", self.cwd, path);
            &joined
        };

        let mut parts: Vec<&str> = Vec::new();
        for part in full.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                name => parts.push(name),
            }
        }
        format!("/{}", parts.join("/"))
    }

    fn cluster_for(&mut self, card_path: &str, size: u64) -> u32 {
        if let Some(&cluster) = self.clusters.get(card_path) {
            return cluster;
        }
        let cluster_bytes = u64::from(self.geometry.cluster_size.max(1)) * SECTOR_SIZE;
        let count = size.div_ceil(cluster_bytes).max(1);
        let first = self.next_cluster;
        self.next_cluster = first.saturating_add(u32::try_from(count).unwrap_or(u32::MAX));
        self.clusters.insert(card_path.to_string(), first);
        first
    }
}

impl CardFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

impl CardFs for HostCard {
    type File = File;

    fn open(&mut self, path: &str, mode: OpenMode) -> io::Result<File> {
        let host_path = self.host_path(path);
        if matches!(mode, OpenMode::ReadWriteAlways | OpenMode::CreateAlways) {
            if let Some(parent) = host_path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::ReadExisting => options.read(true),
            OpenMode::WriteExisting => options.write(true),
            OpenMode::ReadWriteAlways => options.read(true).write(true).create(true),
            OpenMode::CreateAlways => options.write(true).create(true).truncate(true),
        };
        options.open(host_path)
    }

    fn stat(&mut self, path: &str) -> io::Result<FileInfo> {
        let card_path = self.normalize(path);
        let metadata = fs::metadata(self.host_path(&card_path))?;
        let size = if metadata.is_dir() { 0 } else { metadata.len() };
        Ok(FileInfo {
            size,
            first_cluster: self.cluster_for(&card_path, size),
        })
    }

    fn unlink(&mut self, path: &str) -> io::Result<()> {
        let card_path = self.normalize(path);
        fs::remove_file(self.host_path(&card_path))?;
        self.clusters.remove(&card_path);
        Ok(())
    }

    fn cwd(&self) -> io::Result<String> {
        Ok(self.cwd.clone())
    }

    fn geometry(&self) -> FsGeometry {
        self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::TempDir;

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("games/ws")).unwrap();
        let mut card = HostCard::new(dir.path());
        card.set_cwd("/games/ws").unwrap();

        assert_eq!(card.cwd().unwrap(), "/games/ws");
        assert_eq!(card.host_path("GAME.WS"), dir.path().join("games/ws/GAME.WS"));
        assert_eq!(card.host_path("../x/./A.WS"), dir.path().join("games/x/A.WS"));
        assert_eq!(card.host_path("/../../ROOT.WS"), dir.path().join("ROOT.WS"));
    }

    #[test]
    fn set_cwd_rejects_missing_directories() {
        let dir = TempDir::new().unwrap();
        let mut card = HostCard::new(dir.path());
        let err = card.set_cwd("/nowhere").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(card.cwd().unwrap(), "/");
    }

    #[test]
    fn open_modes_follow_create_and_truncate_rules() {
        let dir = TempDir::new().unwrap();
        let mut card = HostCard::new(dir.path());

        assert_eq!(
            card.open("/A.BIN", OpenMode::ReadExisting).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );

        let mut f = card.open("/A.BIN", OpenMode::ReadWriteAlways).unwrap();
        f.write_all(b"hello").unwrap();
        drop(f);

        // Reopening without truncation keeps the contents.
        let f = card.open("/A.BIN", OpenMode::ReadWriteAlways).unwrap();
        assert_eq!(f.size().unwrap(), 5);
        drop(f);

        let f = card.open("/A.BIN", OpenMode::CreateAlways).unwrap();
        assert_eq!(f.size().unwrap(), 0);
        drop(f);

        let mut f = card.open("/A.BIN", OpenMode::ReadExisting).unwrap();
        let mut contents = Vec::new();
        f.read_to_end(&mut contents).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn creating_opens_make_missing_directories() {
        let dir = TempDir::new().unwrap();
        let mut card = HostCard::new(dir.path());

        assert_eq!(
            card.open("/NILESWAN/SAVE.INI", OpenMode::WriteExisting)
                .unwrap_err()
                .kind(),
            io::ErrorKind::NotFound
        );
        assert!(!dir.path().join("NILESWAN").exists());

        card.open("/NILESWAN/SAVE.INI", OpenMode::CreateAlways).unwrap();
        assert!(dir.path().join("NILESWAN/SAVE.INI").is_file());
    }

    #[test]
    fn clusters_are_stable_and_do_not_overlap() {
        let dir = TempDir::new().unwrap();
        let geometry = FsGeometry {
            cluster_size: 1,
            ..FsGeometry::default()
        };
        let mut card = HostCard::new(dir.path()).with_geometry(geometry);
        fs::write(dir.path().join("A.WS"), vec![0u8; 1500]).unwrap();
        fs::write(dir.path().join("B.WS"), vec![0u8; 10]).unwrap();

        let a = card.stat("/A.WS").unwrap();
        let b = card.stat("B.WS").unwrap();
        assert_eq!(a.size, 1500);
        assert_eq!(a.first_cluster, FIRST_DATA_CLUSTER);
        // 1500 bytes span three 512-byte clusters.
        assert_eq!(b.first_cluster, FIRST_DATA_CLUSTER + 3);
        assert_eq!(card.stat("/A.WS").unwrap().first_cluster, a.first_cluster);
    }

    #[test]
    fn unlink_removes_file() {
        let dir = TempDir::new().unwrap();
        let mut card = HostCard::new(dir.path());
        fs::write(dir.path().join("SAVE.INI"), b"[save]\n").unwrap();
        card.unlink("/SAVE.INI").unwrap();
        assert!(!dir.path().join("SAVE.INI").exists());
        assert_eq!(
            card.unlink("/SAVE.INI").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
