//! Module implement utilities shared across the package.

use cbordata::{Cbor, FromCbor, IntoCbor};

use crate::{Error, Result};

#[macro_export]
macro_rules! read_file {
    ($fd:expr, $seek:expr, $n:expr, $msg:expr) => {{
        use std::convert::TryFrom;

        let mut buf = vec![0; usize::try_from($n).unwrap()];
        match $fd.seek($seek).and_then(|_| $fd.read(&mut buf)) {
            Ok(n) if n == buf.len() => Ok(buf),
            Ok(n) => {
                let m = buf.len();
                err_at!(Fatal, msg: "{}, short read {}/{} at {:?}", $msg, n, m, $seek)
            }
            Err(err) => err_at!(IOError, Err(err)),
        }
    }};
}

#[macro_export]
macro_rules! write_file {
    ($fd:expr, $buffer:expr, $file:expr, $msg:expr) => {{
        use std::io::Write;

        let n = err_at!(IOError, $fd.write($buffer))?;
        if n == $buffer.len() {
            Ok(n)
        } else {
            let m = $buffer.len();
            err_at!(Fatal, msg: "{}, short write {}/{} to {:?}", $msg, n, m, $file)
        }
    }};
}

/// Serialize `val` into its CBOR byte representation.
pub fn into_cbor_bytes<T>(val: T) -> Result<Vec<u8>>
where
    T: IntoCbor,
{
    let mut data = vec![];
    let val = err_at!(FailCbor, val.into_cbor())?;
    let n = err_at!(FailCbor, val.encode(&mut data))?;
    if n == data.len() {
        Ok(data)
    } else {
        err_at!(Fatal, msg: "cbor encoded {} bytes, buffered {}", n, data.len())
    }
}

/// Deserialize a `T` from CBOR bytes. Return the value and the number
/// of bytes consumed.
pub fn from_cbor_bytes<T>(mut data: &[u8]) -> Result<(T, usize)>
where
    T: FromCbor,
{
    let (val, n) = err_at!(FailCbor, Cbor::decode(&mut data))?;
    let val = err_at!(FailCbor, T::from_cbor(val))?;
    Ok((val, n))
}

#[cfg(test)]
#[path = "util_test.rs"]
mod util_test;
