use std::collections::HashMap;

use actix_multipart::Multipart;
use bytes::Bytes;
use futures_util::TryStreamExt;

use crate::error::Error;
use crate::storer::FileStorer;

/// A multipart form flattened into text fields and stored files. File parts
/// are written through the storer and show up as fetch codes.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, String>,
}

impl FormData {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn require(&self, name: &str) -> Result<&str, Error> {
        self.get(name).ok_or_else(|| Error::BusinessError("All fields are required.".into()))
    }

    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

pub async fn collect_form<S: FileStorer>(payload: &mut Multipart, storer: &S) -> Result<FormData, Error> {
    let mut form = FormData::default();
    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().to_owned();
        let is_file = field.content_disposition().get_filename().is_some();
        let mut content = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            content.extend_from_slice(&chunk);
        }
        if is_file {
            // an empty file part means the browser submitted a blank input
            if content.is_empty() {
                continue;
            }
            let fetch_code = storer.write(Bytes::from(content))?;
            form.files.insert(name, fetch_code);
        } else {
            form.fields.insert(name, String::from_utf8_lossy(&content).into_owned());
        }
    }
    Ok(form)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_fields_do_not_satisfy_require() {
        let mut form = FormData::default();
        form.fields.insert("phone".into(), "".into());
        assert!(form.require("phone").is_err());
        assert!(form.require("missing").is_err());
        form.fields.insert("phone".into(), "12345".into());
        assert_eq!(form.require("phone").unwrap(), "12345");
    }
}
