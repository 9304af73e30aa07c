use crate::{Error, Result};
use core::mem;

#[derive(Clone, Copy)]
pub(crate) enum Endian {
    Little,
    Big,
}

pub(crate) trait BinaryReadable<'bytes> {
    type Item;

    fn from_source(source: &mut Source<'bytes>, endian: Endian) -> Result<Self::Item>;
}

macro_rules! make_binary_readable {
    ($t:ty) => {
        impl<'bytes> BinaryReadable<'bytes> for $t {
            type Item = $t;

            fn from_source(source: &mut Source<'bytes>, endian: Endian) -> Result<Self::Item> {
                const LEN: usize = mem::size_of::<$t>();
                let mut bytes = [0u8; LEN];
                bytes.copy_from_slice(source.read_bytes(LEN)?);
                Ok(match endian {
                    Endian::Little => Self::from_le_bytes(bytes),
                    Endian::Big => Self::from_be_bytes(bytes),
                })
            }
        }
    };
}

make_binary_readable!(u8);
make_binary_readable!(u16);
make_binary_readable!(u32);
make_binary_readable!(u64);

macro_rules! make_binary_readable_tuple {
    ($($t:ident),+) => {
        impl<'bytes, $($t,)+> BinaryReadable<'bytes> for ($($t,)+)
        where
            $($t: BinaryReadable<'bytes>,)+
        {
            type Item = ($($t::Item,)+);

            fn from_source(source: &mut Source<'bytes>, endian: Endian) -> Result<Self::Item> {
                Ok(($(
                    $t::from_source(source, endian)?,
                )+))
            }
        }
    };
}

make_binary_readable_tuple!(T0);
make_binary_readable_tuple!(T0, T1);
make_binary_readable_tuple!(T0, T1, T2);
make_binary_readable_tuple!(T0, T1, T2, T3);
make_binary_readable_tuple!(T0, T1, T2, T3, T4);
make_binary_readable_tuple!(T0, T1, T2, T3, T4, T5);
make_binary_readable_tuple!(T0, T1, T2, T3, T4, T5, T6);
make_binary_readable_tuple!(T0, T1, T2, T3, T4, T5, T6, T7);
make_binary_readable_tuple!(T0, T1, T2, T3, T4, T5, T6, T7, T8);

/// A bounds checked cursor over an archive's bytes.
///
/// Every read and seek is validated against the length of the underlying buffer before it happens.
pub(crate) struct Source<'bytes> {
    bytes: &'bytes [u8],
    pos: usize,
}

impl<'bytes> Source<'bytes> {
    #[must_use]
    pub(crate) fn new(bytes: &'bytes [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    #[must_use]
    pub(crate) fn stream_position(&self) -> usize {
        self.pos
    }

    pub(crate) fn read<T>(&mut self, endian: Endian) -> Result<T>
    where
        T: BinaryReadable<'bytes, Item = T>,
    {
        T::from_source(self, endian)
    }

    pub(crate) fn read_protocol<T>(&mut self, endian: Endian) -> Result<T::Item>
    where
        T: BinaryReadable<'bytes>,
    {
        T::from_source(self, endian)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'bytes [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(Error::TruncatedRead {
                wanted: len,
                remaining,
            });
        }

        let start = self.pos;
        self.pos += len;
        Ok(&self.bytes[start..self.pos])
    }

    pub(crate) fn peek_bytes(&self, len: usize) -> &'bytes [u8] {
        let end = self.pos + len.min(self.remaining());
        &self.bytes[self.pos..end]
    }

    pub(crate) fn save_restore_position<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        let position = self.pos;
        let result = f(self);
        self.pos = position;
        result
    }

    pub(crate) fn seek_absolute(&mut self, position: usize) -> Result<()> {
        if position > self.bytes.len() {
            Err(Error::OutOfRange {
                position,
                len: self.bytes.len(),
            })
        } else {
            self.pos = position;
            Ok(())
        }
    }

    pub(crate) fn seek_relative(&mut self, offset: usize) -> Result<()> {
        let position = self.pos.checked_add(offset).ok_or(Error::OutOfRange {
            position: usize::MAX,
            len: self.bytes.len(),
        })?;
        self.seek_absolute(position)
    }
}
