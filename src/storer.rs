use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::error::Error;

pub trait FileStorer {
    fn write(&self, bytes: Bytes) -> Result<String, Error>;
    fn read(&self, fetch_code: &str) -> Result<Bytes, Error>;
}

pub struct LocalStorer {
    path: String,
}

impl LocalStorer {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_owned() }
    }
}

impl FileStorer for LocalStorer {
    fn write(&self, bytes: Bytes) -> Result<String, Error> {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let name = format!("{:x}", hasher.finalize());
        let mut file = File::create(Path::new(&self.path).join(&name))?;
        file.write_all(&bytes)?;
        Ok(name)
    }
    fn read(&self, fetch_code: &str) -> Result<Bytes, Error> {
        let mut file = File::open(Path::new(&self.path).join(fetch_code))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(Bytes::from(content))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_and_read_back() {
        let dir = std::env::temp_dir().join("jobboard-storer-test");
        std::fs::create_dir_all(&dir).unwrap();
        let storer = LocalStorer::new(dir.to_str().unwrap());
        let code = storer.write(Bytes::from_static(b"resume body")).unwrap();
        assert_eq!(storer.read(&code).unwrap(), Bytes::from_static(b"resume body"));
    }

    #[test]
    fn test_same_content_same_code() {
        let dir = std::env::temp_dir().join("jobboard-storer-test");
        std::fs::create_dir_all(&dir).unwrap();
        let storer = LocalStorer::new(dir.to_str().unwrap());
        let a = storer.write(Bytes::from_static(b"logo")).unwrap();
        let b = storer.write(Bytes::from_static(b"logo")).unwrap();
        assert_eq!(a, b);
    }
}
