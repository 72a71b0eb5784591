// SPDX-License-Identifier: MPL-2.0
use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Image(String),
    Config(String),
    Http(String),
    Metadata(String),
    /// The reference image carries no usable GPS EXIF block. This is the
    /// single expected terminal failure of an overlay run: without a
    /// reference point no projection is possible.
    NoGpsData,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(msg) => write!(f, "I/O error: {msg}"),
            Error::Image(msg) => write!(f, "image error: {msg}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Http(msg) => write!(f, "HTTP error: {msg}"),
            Error::Metadata(msg) => write!(f, "metadata error: {msg}"),
            Error::NoGpsData => write!(f, "no GPS data found in reference image"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
