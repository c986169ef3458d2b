use crate::error::{Error, ErrorKind};

pub type Result<T> = std::result::Result<T, Error>;

/// `verify_arg!(name, condition)` returns an `InvalidArgument` error from the
/// enclosing function when `condition` is false.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $cond:expr) => {
        if !($cond) {
            return Err($crate::result::failed_arg(stringify!($name), stringify!($cond)));
        }
    };
}

/// Like [`verify_arg!`], for checks on decoded bytes; fails with `InvalidFormat`.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $cond:expr) => {
        if !($cond) {
            return Err($crate::result::failed_data(stringify!($name), stringify!($cond)));
        }
    };
}

#[doc(hidden)]
#[cold]
pub fn failed_arg(name: &str, condition: &str) -> Error {
    ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: format!("requires {condition}"),
    }
    .into()
}

#[doc(hidden)]
#[cold]
pub fn failed_data(name: &str, condition: &str) -> Error {
    ErrorKind::InvalidFormat {
        element: name.to_string(),
        message: format!("expected {condition}"),
    }
    .into()
}
