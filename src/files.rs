//! Files - Reading and writing game data files, copying data folders
//!
//! Dat files are a single gzip member wrapping a minified JSON document.
//! Settings files are Java properties XML: flat `<entry key="...">` elements
//! under one root element, every value a string.

use crate::{Error, Result};
use filetime::FileTime;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

const XML_HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<!DOCTYPE properties SYSTEM \"http://java.sun.com/dtd/properties.dtd\">\n",
    "<properties>\n",
);
const XML_FOOTER: &str = "</properties>\n";

fn malformed(path: &Path, reason: impl ToString) -> Error {
    Error::Malformed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Modification time of a file or directory
pub fn modified(path: &Path) -> Result<SystemTime> {
    Ok(fs::metadata(path)?.modified()?)
}

/// Read a dat file into a JSON value
pub fn read_dat(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let mut content = Vec::new();
    GzDecoder::new(File::open(path)?)
        .read_to_end(&mut content)
        .map_err(|e| malformed(path, e))?;

    serde_json::from_slice(&content).map_err(|e| malformed(path, e))
}

/// Write any serializable value into a dat file
pub fn write_dat<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_vec(data).map_err(|e| malformed(path, e))?;

    let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
    encoder.write_all(&json)?;
    encoder.finish()?;

    Ok(())
}

fn entry_key(path: &Path, element: &BytesStart) -> Result<Option<String>> {
    if element.name().as_ref() != b"entry" {
        return Ok(None);
    }

    let attr = element
        .try_get_attribute("key")
        .map_err(|e| malformed(path, e))?
        .ok_or_else(|| malformed(path, "entry without a key"))?;
    let key = attr.unescape_value().map_err(|e| malformed(path, e))?;

    Ok(Some(key.into_owned()))
}

/// Read a settings file into a flat map of strings
pub fn read_settings(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let xml = fs::read_to_string(path)?;
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut values = BTreeMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| malformed(path, e))? {
            Event::Start(e) => {
                if let Some(key) = entry_key(path, &e)? {
                    values.insert(key.clone(), String::new());
                    current = Some(key);
                }
            }
            Event::Empty(e) => {
                if let Some(key) = entry_key(path, &e)? {
                    values.insert(key, String::new());
                }
            }
            Event::Text(t) => {
                if let Some(ref key) = current {
                    let text = t.unescape().map_err(|e| malformed(path, e))?;
                    values.insert(key.clone(), text.into_owned());
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(values)
}

/// Write a flat map of strings as a settings file
pub fn write_settings<'a, I>(path: &Path, data: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut xml = String::from(XML_HEADER);
    for (key, value) in data {
        xml.push_str(&format!(
            "<entry key=\"{}\">{}</entry>\n",
            quick_xml::escape::escape(key.as_str()),
            quick_xml::escape::escape(value.as_str())
        ));
    }
    xml.push_str(XML_FOOTER);

    fs::write(path, xml)?;
    Ok(())
}

/// Copy a directory tree over `dest`, removing whatever was there.
///
/// Copies keep the modification times of their sources, directories
/// included. Fails with `NotFound` if `src` does not exist.
pub fn replace(src: &Path, dest: &Path) -> Result<()> {
    if !src.exists() {
        return Err(Error::NotFound(src.to_path_buf()));
    }

    debug!("replacing {} with {}", dest.display(), src.display());

    remove(dest)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    for entry in WalkDir::new(src) {
        let entry = entry?;
        let target = dest.join(relative(src, entry.path())?);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    // Directories last, once nothing else gets written into them
    for entry in WalkDir::new(src).contents_first(true) {
        let entry = entry?;
        let target = dest.join(relative(src, entry.path())?);
        let mtime = FileTime::from_last_modification_time(&fs::metadata(entry.path())?);
        filetime::set_file_mtime(&target, mtime)?;
    }

    Ok(())
}

fn relative<'a>(root: &Path, path: &'a Path) -> Result<&'a Path> {
    Ok(path.strip_prefix(root).map_err(std::io::Error::other)?)
}

/// Make sure a directory tree is gone
pub fn remove(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn dat_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rankings.dat");
        let data = json!({"won": 5, "total": 10, "records": []});

        write_dat(&path, &data).unwrap();
        assert_eq!(read_dat(&path).unwrap(), data);
    }

    #[test]
    fn dat_is_minified_gzip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("game.dat");

        write_dat(&path, &json!({"hero": {"HP": 130}})).unwrap();

        let mut raw = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut raw)
            .unwrap();
        assert_eq!(raw, r#"{"hero":{"HP":130}}"#);
    }

    #[test]
    fn missing_dat_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = read_dat(&tmp.path().join("wrong.dat")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn plain_file_is_malformed_dat() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.dat");
        fs::write(&path, "{\"not\": \"gzipped\"}").unwrap();

        let err = read_dat(&path).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn reads_java_properties_settings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.xml");
        fs::write(
            &path,
            [
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<!DOCTYPE properties SYSTEM "http://java.sun.com/dtd/properties.dtd">"#,
                "<properties>",
                r#"<entry key="scale">3</entry>"#,
                r#"<entry key="fullscreen">false</entry>"#,
                r#"<entry key="empty"></entry>"#,
                "</properties>",
                "",
            ]
            .join("\n"),
        )
        .unwrap();

        let settings = read_settings(&path).unwrap();
        assert_eq!(settings.len(), 3);
        assert_eq!(settings["scale"], "3");
        assert_eq!(settings["fullscreen"], "false");
        assert_eq!(settings["empty"], "");
    }

    #[test]
    fn settings_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.xml");
        let mut data = BTreeMap::new();
        data.insert("scale".to_string(), "3".to_string());
        data.insert("last_class".to_string(), "<Huntress & co>".to_string());

        write_settings(&path, &data).unwrap();
        assert_eq!(read_settings(&path).unwrap(), data);
    }

    #[test]
    fn replace_overwrites_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("data");
        let dest = tmp.path().join("slots").join("manual").join("default");

        fs::create_dir_all(src.join("game1")).unwrap();
        fs::write(src.join("journal.dat"), "journal").unwrap();
        fs::write(src.join("game1").join("game.dat"), "game").unwrap();

        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.dat"), "stale").unwrap();

        replace(&src, &dest).unwrap();

        assert!(!dest.join("stale.dat").exists());
        assert_eq!(fs::read_to_string(dest.join("journal.dat")).unwrap(), "journal");
        assert_eq!(
            fs::read_to_string(dest.join("game1").join("game.dat")).unwrap(),
            "game"
        );
    }

    #[test]
    fn replace_keeps_modification_times() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("data");
        let dest = tmp.path().join("copy");
        let old = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);

        fs::create_dir_all(src.join("game1")).unwrap();
        fs::write(src.join("journal.dat"), "journal").unwrap();
        fs::write(src.join("game1").join("game.dat"), "game").unwrap();
        for entry in WalkDir::new(&src).contents_first(true) {
            File::open(entry.unwrap().path())
                .unwrap()
                .set_modified(old)
                .unwrap();
        }

        replace(&src, &dest).unwrap();

        for path in [
            dest.clone(),
            dest.join("journal.dat"),
            dest.join("game1"),
            dest.join("game1").join("game.dat"),
        ] {
            assert_eq!(modified(&path).unwrap(), old, "{}", path.display());
        }
    }

    #[test]
    fn replace_without_source_leaves_destination() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();

        let err = replace(&tmp.path().join("nope"), &dest).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(dest.exists());
    }

    #[test]
    fn remove_is_silent_when_absent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("gone");
        fs::create_dir_all(dir.join("deeper")).unwrap();

        remove(&dir).unwrap();
        assert!(!dir.exists());
        remove(&dir).unwrap();
    }
}
