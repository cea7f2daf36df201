use std::env;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use log::debug;

use crate::errors::{RuntimeError, RuntimeErrorKind};

/// Produces the raw bytes of a class given its binary name. The loader only
/// ever sees this trait; where the bytes come from is not its business.
pub trait ClassProvider {
    fn class_bytes(&mut self, binary_name: &str) -> Result<Vec<u8>, RuntimeError>;
}

/// The default provider: `$JAVA_HOME/jmods/java.base.jmod` first, then the
/// search directories from the command line, in order.
pub struct ClassPath {
    java_home: Option<PathBuf>,
    directories: Vec<PathBuf>,
}

impl ClassPath {
    /// `search_path` is a colon-separated list of directories.
    pub fn new(search_path: &str) -> ClassPath {
        ClassPath {
            java_home: env::var_os("JAVA_HOME").map(PathBuf::from),
            directories: search_path
                .split(':')
                .filter(|segment| !segment.is_empty())
                .map(PathBuf::from)
                .collect(),
        }
    }

    fn jmod_bytes(&self, binary_name: &str) -> Result<Option<Vec<u8>>, RuntimeError> {
        let Some(java_home) = &self.java_home else {
            return Ok(None);
        };
        let jmod_path = java_home.join("jmods").join("java.base.jmod");
        let file = File::open(&jmod_path)?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|error| std::io::Error::other(error))?;
        let entry_name = format!("classes/{binary_name}.class");
        let result = match archive.by_name(&entry_name) {
            Ok(mut entry) => {
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut bytes)?;
                debug!("found {binary_name} in {}", jmod_path.display());
                Ok(Some(bytes))
            }
            Err(zip::result::ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(RuntimeError::from(std::io::Error::other(error))),
        };
        result
    }

    fn directory_bytes(&self, binary_name: &str) -> Result<Option<Vec<u8>>, RuntimeError> {
        for directory in &self.directories {
            let candidate = directory.join(format!("{binary_name}.class"));
            if candidate.is_file() {
                debug!("found {binary_name} at {}", candidate.display());
                return Ok(Some(std::fs::read(candidate)?));
            }
        }
        Ok(None)
    }
}

impl ClassProvider for ClassPath {
    fn class_bytes(&mut self, binary_name: &str) -> Result<Vec<u8>, RuntimeError> {
        if let Some(bytes) = self.jmod_bytes(binary_name)? {
            return Ok(bytes);
        }
        if let Some(bytes) = self.directory_bytes(binary_name)? {
            return Ok(bytes);
        }
        Err(RuntimeError::new(RuntimeErrorKind::ClassNotFound(
            binary_name.to_string(),
        )))
    }
}
