//! Module implement a durable, file backed [Log].
//!
//! A journal is a single append-only file holding CBOR framed
//! `{seq, block}` entries. Loading a journal scans the file once to
//! build an in-memory `seq -> (fpos, length)` table, after which block
//! reads are a seek-and-read. A torn tail, the half written entry left
//! behind by a crash mid-append, is detected during the scan and
//! dropped; everything before it is served as usual.
//!
//! Single-writer discipline is enforced with an exclusive advisory
//! lock on the journal file, held from open until the [Journal] value
//! is dropped.

use cbordata::{Cbor, Cborize, FromCbor};
use fs2::FileExt;
use log::{debug, error};

use std::{
    convert::TryFrom,
    ffi,
    fmt::{self, Display},
    fs,
    io::{self, Read, Seek},
    path, result,
};

use crate::{alog::Log, read_file, util, write_file, Error, Result};

/// Configuration for [Journal] type.
#[derive(Debug, Clone)]
pub struct Config {
    /// Uniquely name Journal instances.
    pub name: String,
    /// Directory in which the journal file is stored.
    pub dir: ffi::OsString,
    /// Enable fsync for every append.
    pub fsync: bool,
}

impl<'a> arbitrary::Arbitrary<'a> for Config {
    fn arbitrary(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Self> {
        use std::env;

        let name: String = u.arbitrary()?;
        let dir = env::temp_dir().into_os_string();
        let fsync: bool = u.arbitrary()?;

        Ok(Config { name, dir, fsync })
    }
}

impl Config {
    pub fn new(dir: &ffi::OsStr, name: &str) -> Config {
        Config {
            name: name.to_string(),
            dir: dir.to_os_string(),
            fsync: true,
        }
    }

    pub fn set_fsync(&mut self, fsync: bool) -> &mut Self {
        self.fsync = fsync;
        self
    }
}

// One framed entry in the journal file. `block` is the appended
// byte string, opaque to the journal.
#[derive(Debug, Clone, Default, Eq, PartialEq, Cborize)]
struct Entry {
    seq: u64,
    block: Vec<u8>,
}

impl Entry {
    const ID: u32 = 0x0;
}

/// Durable [Log] implementation over a single `{dir}/{name}.jnl` file.
pub struct Journal {
    config: Config,
    location: ffi::OsString,
    file: fs::File,
    index: Vec<(u64, usize)>, // (fpos, length) per block, in seq order
    end: u64,
}

impl Display for Journal {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "journal<{:?}>", self.location)
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            panic!("fail to unlock journal {:?}: {}", self.location, err)
        }
    }
}

impl Journal {
    /// Start a fresh journal under `config.dir`. An existing journal
    /// file with the same name shall be removed.
    pub fn create(config: Config) -> Result<Journal> {
        let location = to_location(&config.dir, &config.name);

        fs::create_dir_all(&config.dir).ok();
        fs::remove_file(&location).ok(); // cleanup a single journal file

        let file = {
            let mut opts = fs::OpenOptions::new();
            err_at!(
                IOError,
                opts.read(true).append(true).create_new(true).open(&location)
            )?
        };
        err_at!(IOError, file.try_lock_exclusive(), "concurrent writer {:?}", location)?;

        debug!("created journal at {:?}", location);

        Ok(Journal {
            config,
            location,
            file,
            index: Vec::default(),
            end: 0,
        })
    }

    /// Load an existing journal under `config.dir`. Blocks upto the
    /// first undecodable entry are recovered, a torn tail is dropped.
    pub fn load(config: Config) -> Result<Journal> {
        let location = to_location(&config.dir, &config.name);

        let mut file = {
            let mut opts = fs::OpenOptions::new();
            err_at!(IOError, opts.read(true).append(true).open(&location))?
        };
        err_at!(IOError, file.try_lock_exclusive(), "concurrent writer {:?}", location)?;

        let len = err_at!(IOError, file.metadata())?.len();
        err_at!(IOError, file.seek(io::SeekFrom::Start(0)))?;

        let (mut index, mut fpos) = (vec![], 0_u64);
        while fpos < len {
            let entry = Cbor::decode(&mut file)
                .ok()
                .and_then(|(val, n)| Some((Entry::from_cbor(val).ok()?, n)));
            let (entry, n) = match entry {
                Some((entry, n)) => (entry, n),
                None => {
                    // shear the file back to the last whole entry
                    error!("dropping torn tail at {} of {:?}", fpos, location);
                    err_at!(IOError, file.set_len(fpos))?;
                    break;
                }
            };
            let seq = err_at!(FailConvert, u64::try_from(index.len()))?;
            if entry.seq != seq {
                return err_at!(Corrupt, msg: "block {} found at seq {}", entry.seq, seq);
            }
            index.push((fpos, n));
            fpos += err_at!(FailConvert, u64::try_from(n))?;
        }

        debug!("loaded journal at {:?}, {} blocks", location, index.len());

        Ok(Journal {
            config,
            location,
            file,
            index,
            end: fpos,
        })
    }

    pub fn to_location(&self) -> ffi::OsString {
        self.location.clone()
    }
}

impl Log for Journal {
    fn ready(&mut self) -> Result<()> {
        err_at!(IOError, self.file.metadata())?;
        Ok(())
    }

    fn len(&self) -> Result<u64> {
        err_at!(FailConvert, u64::try_from(self.index.len()))
    }

    fn get(&mut self, seq: u64) -> Result<Vec<u8>> {
        let off = err_at!(FailConvert, usize::try_from(seq))?;
        let (fpos, n) = match self.index.get(off) {
            Some((fpos, n)) => (*fpos, *n),
            None => return err_at!(IOError, msg: "missing block {}/{}", seq, self.index.len()),
        };

        let fd = &mut self.file;
        let data = read_file!(fd, io::SeekFrom::Start(fpos), n, "read journal block")?;
        let (entry, _) = util::from_cbor_bytes::<Entry>(&data)?;
        if entry.seq != seq {
            return err_at!(Corrupt, msg: "block {} found at seq {}", entry.seq, seq);
        }
        Ok(entry.block)
    }

    fn append(&mut self, block: &[u8]) -> Result<u64> {
        let seq = err_at!(FailConvert, u64::try_from(self.index.len()))?;
        let entry = Entry { seq, block: block.to_vec() };
        let data = util::into_cbor_bytes(entry)?;

        let fd = &mut self.file;
        write_file!(fd, &data, &self.location, "append journal block")?;
        if self.config.fsync {
            err_at!(IOError, self.file.sync_data())?;
        }

        self.index.push((self.end, data.len()));
        self.end += err_at!(FailConvert, u64::try_from(data.len()))?;
        Ok(seq)
    }
}

fn to_location(dir: &ffi::OsStr, name: &str) -> ffi::OsString {
    let file: ffi::OsString = format!("{}.jnl", name).into();
    let location: path::PathBuf = [dir, &file].iter().collect();
    location.into_os_string()
}

#[cfg(test)]
#[path = "journal_test.rs"]
mod journal_test;
