use std::{collections::BTreeMap, ffi::CString};

use rsmpeg::avutil::AVDictionary;

use cstr::cstr;

use crate::error::{Error, Result};

/// Key/value options handed to FFmpeg when a codec context is opened.
#[derive(Default, Clone, Debug)]
pub struct Options {
    pairs: BTreeMap<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.pairs.insert(key.to_string(), value.to_string());
        self
    }

    pub fn to_av_dict(self) -> Result<AVDictionary> {
        let mut dict = AVDictionary::new(cstr!(""), cstr!(""), 0);

        for (key, value) in self.pairs {
            let c_key = CString::new(key.as_str()).map_err(|_| Error::InvalidOption(key.clone()))?;
            let c_value = CString::new(value).map_err(|_| Error::InvalidOption(key))?;
            dict = dict.set(&c_key, &c_value, 0);
        }

        Ok(dict)
    }
}
