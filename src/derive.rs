macro_rules! reader {
    ($this:ident => $result:ty) => {
        impl crate::Sealed for $this {}

        impl<'bytes> crate::Reader<crate::Copied<'bytes>> for $this {
            type Error = crate::Error;
            type Item = $result;

            fn read(source: crate::Copied<'bytes>) -> crate::Result<Self::Item> {
                let backing = crate::containers::Backing::Owned(source.0.to_vec());
                Self::do_read(::std::sync::Arc::new(backing))
            }
        }

        impl crate::Reader<&::std::fs::File> for $this {
            type Error = crate::Error;
            type Item = $result;

            fn read(source: &::std::fs::File) -> crate::Result<Self::Item> {
                let backing = crate::containers::Backing::map(source)?;
                Self::do_read(::std::sync::Arc::new(backing))
            }
        }

        impl crate::Reader<&::std::path::Path> for $this {
            type Error = crate::Error;
            type Item = $result;

            fn read(source: &::std::path::Path) -> crate::Result<Self::Item> {
                let fd = ::std::fs::File::open(source)?;
                Self::read(&fd)
            }
        }
    };
}

pub(crate) use reader;

macro_rules! entries {
    ($this:ident) => {
        impl $this {
            /// Every entry, in the order it will be indexed.
            #[must_use]
            pub fn files(&self) -> &[crate::FileStruct] {
                &self.files
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.files.is_empty()
            }

            #[must_use]
            pub fn len(&self) -> usize {
                self.files.len()
            }
        }
    };
}

pub(crate) use entries;
