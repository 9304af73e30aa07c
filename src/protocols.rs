use crate::{
    io::{BinaryReadable, Endian, Source},
    Error, Result,
};

/// Length prefixed fields that declare more than this are rejected before anything is allocated.
pub(crate) const FIELD_LIMIT: usize = 1024;

fn check_limit(len: usize) -> Result<()> {
    if len > FIELD_LIMIT {
        Err(Error::OversizedField {
            len,
            limit: FIELD_LIMIT,
        })
    } else {
        Ok(())
    }
}

/// A null-terminated string, without a length prefix.
pub(crate) struct ZString;

impl<'bytes> BinaryReadable<'bytes> for ZString {
    type Item = &'bytes [u8];

    fn from_source(source: &mut Source<'bytes>, _: Endian) -> Result<Self::Item> {
        let window = source.peek_bytes(FIELD_LIMIT + 1);
        match window.iter().position(|&x| x == b'\0') {
            Some(len) => {
                let result = source.read_bytes(len)?;
                source.seek_relative(1)?; // skip null terminator
                Ok(result)
            }
            None if window.len() > FIELD_LIMIT => Err(Error::OversizedField {
                len: window.len(),
                limit: FIELD_LIMIT,
            }),
            None => Err(Error::TruncatedRead {
                wanted: window.len() + 1,
                remaining: window.len(),
            }),
        }
    }
}

/// A null-terminated string, prefixed by a byte which counts the terminator.
///
/// A prefix of zero is accepted as an empty string with no terminator.
pub(crate) struct BZString;

impl<'bytes> BinaryReadable<'bytes> for BZString {
    type Item = &'bytes [u8];

    fn from_source(source: &mut Source<'bytes>, endian: Endian) -> Result<Self::Item> {
        let len: u8 = source.read(endian)?;
        let result = source.read_bytes(len.into())?;
        match result.split_last() {
            None => Ok(result),
            Some((b'\0', rest)) => Ok(rest),
            Some(_) => Err(Error::CorruptHeader(
                "directory name is missing its null terminator",
            )),
        }
    }
}

/// A string prefixed by a byte length.
pub(crate) struct BString;

impl<'bytes> BinaryReadable<'bytes> for BString {
    type Item = &'bytes [u8];

    fn from_source(source: &mut Source<'bytes>, endian: Endian) -> Result<Self::Item> {
        let len: u8 = source.read(endian)?;
        source.read_bytes(len.into())
    }
}

/// A string prefixed by a word length.
pub(crate) struct WString;

impl<'bytes> BinaryReadable<'bytes> for WString {
    type Item = &'bytes [u8];

    fn from_source(source: &mut Source<'bytes>, endian: Endian) -> Result<Self::Item> {
        let len: u16 = source.read(endian)?;
        let len = usize::from(len);
        check_limit(len)?;
        source.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        io::{Endian, Source},
        protocols::{BString, BZString, WString, ZString, FIELD_LIMIT},
        Error,
    };

    #[test]
    fn zstring_stops_at_terminator() -> anyhow::Result<()> {
        let bytes = b"meshes\0rest";
        let mut source = Source::new(bytes);
        let name = source.read_protocol::<ZString>(Endian::Little)?;
        assert_eq!(name, b"meshes");
        assert_eq!(source.stream_position(), 7);
        Ok(())
    }

    #[test]
    fn zstring_without_terminator() -> anyhow::Result<()> {
        let bytes = b"abc";
        let mut source = Source::new(bytes);
        match source.read_protocol::<ZString>(Endian::Little) {
            Err(Error::TruncatedRead { .. }) => Ok(()),
            Err(err) => Err(err.into()),
            Ok(_) => anyhow::bail!("read should have failed"),
        }
    }

    #[test]
    fn zstring_with_implausible_length() -> anyhow::Result<()> {
        let bytes = vec![b'a'; FIELD_LIMIT * 2];
        let mut source = Source::new(&bytes);
        match source.read_protocol::<ZString>(Endian::Little) {
            Err(Error::OversizedField { limit, .. }) => {
                assert_eq!(limit, FIELD_LIMIT);
                Ok(())
            }
            Err(err) => Err(err.into()),
            Ok(_) => anyhow::bail!("read should have failed"),
        }
    }

    #[test]
    fn bzstring_strips_terminator() -> anyhow::Result<()> {
        let bytes = b"\x04abc\0";
        let mut source = Source::new(bytes);
        assert_eq!(source.read_protocol::<BZString>(Endian::Little)?, b"abc");

        let bytes = b"\x03abc";
        let mut source = Source::new(bytes);
        assert!(source.read_protocol::<BZString>(Endian::Little).is_err());

        let bytes = b"\x00";
        let mut source = Source::new(bytes);
        assert!(source.read_protocol::<BZString>(Endian::Little)?.is_empty());
        assert_eq!(source.remaining(), 0);
        Ok(())
    }

    #[test]
    fn prefixed_strings() -> anyhow::Result<()> {
        let bytes = b"\x02hi\x03\x00abc";
        let mut source = Source::new(bytes);
        assert_eq!(source.read_protocol::<BString>(Endian::Little)?, b"hi");
        assert_eq!(source.read_protocol::<WString>(Endian::Little)?, b"abc");

        let bytes = [0xFF, 0xFF];
        let mut source = Source::new(&bytes);
        match source.read_protocol::<WString>(Endian::Little) {
            Err(Error::OversizedField { len: 0xFFFF, .. }) => Ok(()),
            Err(err) => Err(err.into()),
            Ok(_) => anyhow::bail!("read should have failed"),
        }
    }
}
