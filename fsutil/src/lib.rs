use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File, ReadDir},
    io::BufReader,
    path::{Path, PathBuf},
    time::SystemTime,
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("No entry matched glob '{0}' in '{1}'")]
        NoEntryMatchedGlob(::glob::Pattern, PathBuf),

        #[error("Cannot serialize to JSON (dest='{0}'): {1}")]
        SerializeToJson(PathBuf, #[source] serde_json::Error),

        #[error("Cannot deserialize from JSON (src='{0}'): {1}")]
        DeserializeFromJson(PathBuf, #[source] serde_json::Error),
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

#[must_use]
pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        self::mkdir_all(dir)?;
    }
    self::write(filepath, contents)
}

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn remove_file(filepath: impl AsRef<Path>) -> Result<()> {
    fs::remove_file(&filepath)
        .map_err(|e| Error::SingleIO("Cannot remove file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_json_with_mkdir<P, T>(filepath: P, data: &T) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let s = serde_json::to_string(data)
        .map_err(|e| Error::SerializeToJson(filepath.as_ref().to_owned(), e))?;
    write_with_mkdir(filepath, &s)
}

#[must_use]
pub fn read_json_with_deserialize<P, T>(filepath: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let filepath = filepath.as_ref();
    let f = File::open(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.to_owned(), e))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| Error::DeserializeFromJson(filepath.to_owned(), e))
}

#[must_use]
pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

pub fn find_most_recently_modified_file(
    dir: impl AsRef<Path>,
    filename_pattern: &::glob::Pattern,
) -> Result<PathBuf> {
    let mut ans_filepath = None;
    let mut max_modified = SystemTime::UNIX_EPOCH;

    for entry in self::read_dir(&dir)?.filter_map(std::result::Result::ok) {
        let file_type = entry.file_type();
        let modified = entry.metadata().and_then(|info| info.modified());
        let (Ok(file_type), Ok(modified)) = (file_type, modified) else {
            continue
        };
        if file_type.is_dir() {
            continue;
        }
        let filename = entry.file_name();
        if filename_pattern.matches(filename.to_string_lossy().as_ref()) {
            if max_modified < modified {
                max_modified = modified;
                ans_filepath = Some(entry.path());
            }
        }
    }
    match ans_filepath {
        Some(filepath) => Ok(filepath),
        None => Err(self::Error::NoEntryMatchedGlob(
            filename_pattern.to_owned(),
            dir.as_ref().to_owned(),
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    fn tmp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fsutil-test-{}-{}", std::process::id(), name))
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct Data {
        id: u32,
        tag: String,
    }

    #[test]
    fn json_roundtrip_with_mkdir() {
        let dir = tmp_dir("json");
        let filepath = dir.join("nested").join("data.json");
        let data = Data {
            id: 42,
            tag: "hello".to_owned(),
        };

        write_json_with_mkdir(&filepath, &data).unwrap();
        let loaded: Data = read_json_with_deserialize(&filepath).unwrap();
        assert_eq!(loaded, data);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn find_by_glob_skips_non_matching() {
        let dir = tmp_dir("glob");
        mkdir_all(&dir).unwrap();
        write(dir.join("main.cpp"), "int main() {}").unwrap();
        write(dir.join("notes.txt"), "x").unwrap();

        let pat = ::glob::Pattern::new("[mM]ain.*").unwrap();
        let found = find_most_recently_modified_file(&dir, &pat).unwrap();
        assert_eq!(found.file_name().unwrap(), "main.cpp");

        let pat = ::glob::Pattern::new("*.rs").unwrap();
        assert!(find_most_recently_modified_file(&dir, &pat).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
