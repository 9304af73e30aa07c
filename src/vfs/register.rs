use crate::{
    path,
    vfs::{self, FileSystemArchive, Manager},
    Error, Result,
};
use bstr::{BStr, BString, ByteSlice as _, ByteVec as _};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Where to find resources, and in which order they override each other.
#[derive(Clone, Debug)]
pub struct Config {
    data_dirs: Vec<PathBuf>,
    archives: Vec<BString>,
    use_loose_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dirs: Vec::new(),
            archives: Vec::new(),
            use_loose_files: true,
        }
    }
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Archive file names in load order.
    #[must_use]
    pub fn archives(&self) -> &[BString] {
        &self.archives
    }

    /// Data directories in priority order, lowest first.
    #[must_use]
    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    #[must_use]
    pub fn use_loose_files(&self) -> bool {
        self.use_loose_files
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder(Config);

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an archive after every archive added so far.
    #[must_use]
    pub fn archive<S>(mut self, name: S) -> Self
    where
        S: Into<BString>,
    {
        self.0.archives.push(name.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Config {
        self.0
    }

    /// Appends a data directory that takes priority over every directory added so far.
    #[must_use]
    pub fn data_dir<P>(mut self, dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.0.data_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn use_loose_files(mut self, use_loose_files: bool) -> Self {
        self.0.use_loose_files = use_loose_files;
        self
    }
}

/// Registers everything `config` names with `manager`, then rebuilds its index.
///
/// Archives are registered in load order. Each one is looked up by name without regard to case, starting with the data directory of the highest priority. When loose files are enabled, every data directory is registered afterwards so that loose files override the contents of archives.
pub fn register_archives(manager: &mut Manager, config: &Config) -> Result<()> {
    for name in config.archives() {
        let path = locate_archive(config.data_dirs(), name.as_bstr())?;
        debug!(path = %path.display(), "registering archive");
        manager.add_archive(vfs::open_archive(&path)?);
    }

    if config.use_loose_files() {
        for dir in config.data_dirs() {
            manager.add_archive(FileSystemArchive::new(dir.as_path())?);
        }
    }

    manager.build_index();
    Ok(())
}

fn locate_archive(data_dirs: &[PathBuf], name: &BStr) -> Result<PathBuf> {
    for dir in data_dirs.iter().rev() {
        if let Some(path) = find_in_dir(dir, name)? {
            return Ok(path);
        }
    }

    Err(Error::ArchiveNotFound(name.to_owned()))
}

fn find_in_dir(dir: &Path, name: &BStr) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let candidate = <Vec<u8>>::from_os_str_lossy(&file_name);
        if path::paths_equal(candidate.as_bstr(), name) && entry.file_type()?.is_file() {
            matches.push(entry.path());
        }
    }

    matches.sort();
    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use crate::{
        test_support::tes3,
        vfs::{self, Config, Manager},
        Error,
    };
    use std::{fs, io::Read as _, path::Path};

    fn write_archive(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> anyhow::Result<()> {
        fs::write(dir.join(name), tes3::archive(files))?;
        Ok(())
    }

    fn contents(manager: &Manager, path: &str) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::new();
        manager.get(path)?.read_to_end(&mut out)?;
        Ok(out)
    }

    #[test]
    fn builder_defaults() {
        let config = Config::builder().build();
        assert!(config.data_dirs().is_empty());
        assert!(config.archives().is_empty());
        assert!(config.use_loose_files());

        let config = Config::builder()
            .data_dir("a")
            .data_dir("b")
            .archive("x.bsa")
            .use_loose_files(false)
            .build();
        assert_eq!(config.data_dirs().len(), 2);
        assert_eq!(config.archives(), ["x.bsa"]);
        assert!(!config.use_loose_files());
    }

    #[test]
    fn archives_and_loose_files() -> anyhow::Result<()> {
        let data = tempfile::tempdir()?;
        write_archive(
            data.path(),
            "Base.BSA",
            &[("icons\\gold.dds", b"base"), ("a.txt", b"a")],
        )?;
        write_archive(data.path(), "patch.bsa", &[("Icons\\Gold.dds", b"patch")])?;
        fs::write(data.path().join("a.txt"), b"loose")?;

        let config = Config::builder()
            .data_dir(data.path())
            .archive("base.bsa")
            .archive("PATCH.bsa")
            .build();
        let mut manager = Manager::new();
        vfs::register_archives(&mut manager, &config)?;

        assert_eq!(manager.archive_count(), 3);
        assert_eq!(contents(&manager, "icons/gold.dds")?, b"patch");
        assert_eq!(contents(&manager, "A.TXT")?, b"loose");
        assert!(manager.exists("base.bsa"));
        Ok(())
    }

    #[test]
    fn loose_files_can_be_disabled() -> anyhow::Result<()> {
        let data = tempfile::tempdir()?;
        write_archive(data.path(), "base.bsa", &[("a.txt", b"packed")])?;
        fs::write(data.path().join("a.txt"), b"loose")?;

        let config = Config::builder()
            .data_dir(data.path())
            .archive("base.bsa")
            .use_loose_files(false)
            .build();
        let mut manager = Manager::new();
        vfs::register_archives(&mut manager, &config)?;

        assert_eq!(manager.archive_count(), 1);
        assert_eq!(contents(&manager, "a.txt")?, b"packed");
        assert!(!manager.exists("base.bsa"));
        Ok(())
    }

    #[test]
    fn later_data_dirs_are_searched_first() -> anyhow::Result<()> {
        let low = tempfile::tempdir()?;
        let high = tempfile::tempdir()?;
        write_archive(low.path(), "shared.bsa", &[("a.txt", b"low")])?;
        write_archive(high.path(), "Shared.bsa", &[("a.txt", b"high")])?;

        let config = Config::builder()
            .data_dir(low.path())
            .data_dir(high.path())
            .archive("shared.bsa")
            .use_loose_files(false)
            .build();
        let mut manager = Manager::new();
        vfs::register_archives(&mut manager, &config)?;

        assert_eq!(contents(&manager, "a.txt")?, b"high");
        let description = manager.archive_description("a.txt").unwrap_or_default();
        assert!(description.contains("Shared.bsa"), "{description}");
        Ok(())
    }

    #[test]
    fn missing_archives() -> anyhow::Result<()> {
        let data = tempfile::tempdir()?;
        let config = Config::builder()
            .data_dir(data.path())
            .data_dir(data.path().join("does-not-exist"))
            .archive("missing.bsa")
            .build();
        let mut manager = Manager::new();
        match vfs::register_archives(&mut manager, &config) {
            Err(Error::ArchiveNotFound(name)) => assert_eq!(name, "missing.bsa"),
            other => anyhow::bail!("unexpected result: {other:?}"),
        }
        Ok(())
    }
}
