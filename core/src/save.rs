//! Battery-save persistence: one raw dump of the engine's save region per
//! ROM, flushed once the region has stopped changing.

use std::io;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::engine::Engine;
use crate::overlay::Overlay;

/// Appended to the full ROM file name to form the save path.
pub const SAVE_EXTENSION: &str = "sav";

const SAVED_TICKS: u32 = 3;
const FAILED_TICKS: u32 = 10;

/// `game.gba` -> `game.gba.sav`, next to the ROM.
pub fn save_path_for(rom_path: &Path) -> PathBuf {
    let mut name = rom_path.as_os_str().to_os_string();
    name.push(".");
    name.push(SAVE_EXTENSION);
    PathBuf::from(name)
}

/// Durable byte storage for save files.
pub trait Storage {
    /// Read a whole file. `Ok(None)` when it does not exist.
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Replace a whole file.
    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// [`Storage`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        std::fs::write(path, data)
    }
}

/// A save file could not be written.
#[derive(Debug)]
pub struct SaveError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to write {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// What one debounce check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Autosave is turned off.
    Disabled,
    /// Region unchanged and nothing pending.
    Idle,
    /// Region differs from the snapshot; snapshot updated, flush deferred.
    Changed,
    /// First quiet check after a change; snapshot written.
    Flushed,
    /// As `Flushed`, but the write failed. Not retried until the next
    /// change settles.
    FlushFailed,
}

/// Two-check hysteresis over the engine's save region.
///
/// A flush happens on the first check that sees the region unchanged after
/// a check that saw it change, so a save in progress is never written
/// half-done.
pub struct Autosave<S: Storage> {
    storage: S,
    path: PathBuf,
    snapshot: Vec<u8>,
    changed_last_check: bool,
    enabled: bool,
}

impl<S: Storage> Autosave<S> {
    /// Seed the engine's save region from `path` (if present) and take the
    /// initial snapshot from the engine.
    pub fn attach<E: Engine + ?Sized>(
        storage: S,
        path: PathBuf,
        engine: &mut E,
        enabled: bool,
    ) -> Self {
        match storage.read(&path) {
            Ok(Some(data)) => {
                info!("Loading save file: {} ({} bytes)", path.display(), data.len());
                if data.len() != engine.save_region().len() {
                    warn!(
                        "Save file is {} bytes, save region is {}",
                        data.len(),
                        engine.save_region().len()
                    );
                }
                engine.load_save_region(&data);
            }
            Ok(None) => info!("No save file at {}", path.display()),
            Err(e) => warn!("Ignoring unreadable save file {}: {e}", path.display()),
        }

        Self {
            storage,
            snapshot: engine.save_region().to_vec(),
            path,
            changed_last_check: false,
            enabled,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Compare `live` against the snapshot and flush once it settles.
    pub fn check(&mut self, live: &[u8], overlay: &mut Overlay) -> CheckOutcome {
        if !self.enabled {
            return CheckOutcome::Disabled;
        }

        let changed = live != self.snapshot.as_slice();
        let was_changed = std::mem::replace(&mut self.changed_last_check, changed);
        if changed {
            self.snapshot.clear();
            self.snapshot.extend_from_slice(live);
            CheckOutcome::Changed
        } else if was_changed {
            match self.write_snapshot(overlay) {
                Ok(()) => CheckOutcome::Flushed,
                Err(_) => CheckOutcome::FlushFailed,
            }
        } else {
            CheckOutcome::Idle
        }
    }

    /// Unconditional flush of `live`, used on shutdown regardless of the
    /// debounce state or the enabled flag.
    pub fn flush_final(&mut self, live: &[u8], overlay: &mut Overlay) -> Result<(), SaveError> {
        self.snapshot.clear();
        self.snapshot.extend_from_slice(live);
        self.changed_last_check = false;
        self.write_snapshot(overlay)
    }

    fn write_snapshot(&mut self, overlay: &mut Overlay) -> Result<(), SaveError> {
        match self.storage.write(&self.path, &self.snapshot) {
            Ok(()) => {
                info!("Saved save file: {}", self.path.display());
                overlay.show(SAVED_TICKS, "Auto saved.");
                Ok(())
            }
            Err(source) => {
                let e = SaveError {
                    path: self.path.clone(),
                    source,
                };
                error!("{e}");
                overlay.show(FAILED_TICKS, "Save failed!");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TestPatternEngine;
    use crate::engine::test_pattern::SAVE_REGION_LEN;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct MapStorage {
        files: HashMap<PathBuf, Vec<u8>>,
        writes: usize,
        /// Shared so a test can make the disk recover after attach.
        fail: Rc<Cell<bool>>,
    }

    impl Storage for MapStorage {
        fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
            Ok(self.files.get(path).cloned())
        }

        fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
            if self.fail.get() {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.writes += 1;
            self.files.insert(path.to_path_buf(), data.to_vec());
            Ok(())
        }
    }

    fn attached(storage: MapStorage) -> (Autosave<MapStorage>, TestPatternEngine) {
        let mut engine = TestPatternEngine::new();
        let save = Autosave::attach(storage, PathBuf::from("game.gba.sav"), &mut engine, true);
        (save, engine)
    }

    #[test]
    fn save_path_appends_extension() {
        assert_eq!(
            save_path_for(Path::new("/roms/game.gba")),
            PathBuf::from("/roms/game.gba.sav")
        );
        assert_eq!(save_path_for(Path::new("noext")), PathBuf::from("noext.sav"));
    }

    #[test]
    fn attach_seeds_engine_and_snapshot() {
        let mut storage = MapStorage::default();
        storage
            .files
            .insert(PathBuf::from("game.gba.sav"), vec![0xAB; 8]);
        let (save, engine) = attached(storage);
        assert_eq!(&engine.save_region()[..8], &[0xAB; 8]);
        assert_eq!(save.snapshot(), engine.save_region());
        assert_eq!(save.snapshot().len(), SAVE_REGION_LEN);
    }

    #[test]
    fn change_then_quiet_flushes_exactly_once() {
        let (mut save, _) = attached(MapStorage::default());
        let mut overlay = Overlay::default();
        let mut live = save.snapshot().to_vec();

        live[0] = 1;
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Changed);
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Flushed);
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Idle);
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Idle);
        assert_eq!(save.storage().writes, 1);
        assert_eq!(overlay.message(), Some("Auto saved."));
        assert_eq!(save.snapshot(), live.as_slice());
    }

    #[test]
    fn region_changing_every_check_never_flushes() {
        let (mut save, _) = attached(MapStorage::default());
        let mut overlay = Overlay::default();
        let mut live = save.snapshot().to_vec();
        for i in 1..=20u8 {
            live[0] = i;
            assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Changed);
        }
        assert_eq!(save.storage().writes, 0);
    }

    #[test]
    fn failed_flush_is_reported_and_not_retried() {
        let storage = MapStorage {
            fail: Rc::new(Cell::new(true)),
            ..Default::default()
        };
        let (mut save, _) = attached(storage);
        let mut overlay = Overlay::default();
        let mut live = save.snapshot().to_vec();
        live[1] = 9;
        save.check(&live, &mut overlay);
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::FlushFailed);
        assert_eq!(overlay.message(), Some("Save failed!"));
        assert_eq!(overlay.remaining_ticks(), FAILED_TICKS);
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Idle);
    }

    #[test]
    fn failed_flush_is_retried_after_next_change_settles() {
        let fail = Rc::new(Cell::new(true));
        let storage = MapStorage {
            fail: Rc::clone(&fail),
            ..Default::default()
        };
        let (mut save, _) = attached(storage);
        let mut overlay = Overlay::default();
        let mut live = save.snapshot().to_vec();

        live[2] = 1;
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Changed);
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::FlushFailed);

        fail.set(false);
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Idle);
        assert_eq!(save.storage().writes, 0);

        live[2] = 2;
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Changed);
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Flushed);
        assert_eq!(save.storage().writes, 1);
        assert_eq!(save.storage().files[save.path()], live);
        assert_eq!(overlay.message(), Some("Auto saved."));
    }

    #[test]
    fn disabled_autosave_still_flushes_on_shutdown() {
        let mut engine = TestPatternEngine::new();
        let mut save = Autosave::attach(
            MapStorage::default(),
            PathBuf::from("x.sav"),
            &mut engine,
            false,
        );
        assert!(!save.is_enabled());
        assert_eq!(save.path(), Path::new("x.sav"));
        let mut overlay = Overlay::default();
        let live = vec![3u8; SAVE_REGION_LEN];
        assert_eq!(save.check(&live, &mut overlay), CheckOutcome::Disabled);
        save.flush_final(&live, &mut overlay).unwrap();
        assert_eq!(save.storage().writes, 1);
        assert_eq!(save.storage().files[Path::new("x.sav")], live);
    }

    #[test]
    fn fs_storage_reports_missing_file_as_none() {
        let dir = std::env::temp_dir().join("cadence_save_test_missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let mut storage = FsStorage;
        let path = dir.join("game.gba.sav");
        assert!(storage.read(&path).unwrap().is_none());
        storage.write(&path, &[1, 2, 3]).unwrap();
        assert_eq!(storage.read(&path).unwrap(), Some(vec![1, 2, 3]));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
