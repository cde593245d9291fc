//! Useful macros for implementing new wire types

#[macro_export]
/// Implement `serde::Serialize` and `serde::Deserialize` by passing through to the hex
macro_rules! impl_hex_serde {
    ($item:ty) => {
        impl serde::Serialize for $item {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let s = $crate::ser::ByteFormat::serialize_hex(self)
                    .map_err(|e| serde::ser::Error::custom(e.to_string()))?;
                serializer.serialize_str(&s)
            }
        }

        impl<'de> serde::Deserialize<'de> for $item {
            fn deserialize<D>(deserializer: D) -> Result<$item, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s: String = serde::Deserialize::deserialize(deserializer)?;
                <$item as $crate::ser::ByteFormat>::deserialize_hex(&s)
                    .map_err(|e| serde::de::Error::custom(e.to_string()))
            }
        }
    };
}

#[macro_export]
/// Wrap a fixed-length byte array in a newtype with a raw `ByteFormat`, hex `Display`/`FromStr`
/// and hex serde.
macro_rules! wrap_fixed_bytes {
    (
        $(#[$outer:meta])*
        $wrapper_name:ident, $len:expr
    ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $wrapper_name(pub [u8; $len]);

        impl $wrapper_name {
            /// The length of the wrapped bytes
            pub const LENGTH: usize = $len;

            /// Return a reference to the underlying bytes
            pub fn as_array(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $wrapper_name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $wrapper_name {
            fn as_ref(&self) -> &[u8] {
                &self.0[..]
            }
        }

        impl $crate::ser::ByteFormat for $wrapper_name {
            type Error = $crate::ser::SerError;

            fn serialized_length(&self) -> usize {
                $len
            }

            fn read_from<R>(reader: &mut R, _limit: usize) -> $crate::ser::SerResult<Self>
            where
                R: std::io::Read,
                Self: std::marker::Sized,
            {
                Ok(Self($crate::ser::read_array(reader)?))
            }

            fn write_to<W>(&self, writer: &mut W) -> $crate::ser::SerResult<usize>
            where
                W: std::io::Write,
            {
                writer.write_all(&self.0)?;
                Ok($len)
            }
        }

        impl std::fmt::Display for $wrapper_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&$crate::hex::encode(self.0))
            }
        }

        impl std::str::FromStr for $wrapper_name {
            type Err = $crate::ser::SerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as $crate::ser::ByteFormat>::deserialize_hex(s)
            }
        }

        $crate::impl_hex_serde!($wrapper_name);
    };
}

#[macro_export]
/// Make a new marked digest wrapping a 32-byte SHA-256 output.
macro_rules! mark_32_byte_hash {
    (
        $(#[$outer:meta])*
        $hash_name:ident
    ) => {
        $crate::wrap_fixed_bytes!(
            $(#[$outer])*
            $hash_name, 32
        );

        impl Default for $hash_name {
            fn default() -> Self {
                Self([0u8; 32])
            }
        }

        impl $crate::hashes::MarkedDigest for $hash_name {
            type Digest = [u8; 32];

            fn new(hash: [u8; 32]) -> Self {
                Self(hash)
            }

            fn internal(&self) -> [u8; 32] {
                self.0
            }

            fn bytes(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }
    };
}

#[cfg(test)]
mod test {
    use crate::hashes::MarkedDigest;
    use crate::ser::ByteFormat;

    wrap_fixed_bytes!(
        /// Test wrapper
        Short, 4
    );

    mark_32_byte_hash!(
        /// Test digest
        TestDigest
    );

    #[test]
    fn it_displays_and_parses_hex() {
        let s = Short([0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(s.to_string(), "deadbeef");
        assert_eq!("deadbeef".parse::<Short>().unwrap(), s);
        assert!("dead".parse::<Short>().is_err());
    }

    #[test]
    fn it_serdes_as_hex_strings() {
        let s = Short([1, 2, 3, 4]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"01020304\"");
        assert_eq!(serde_json::from_str::<Short>(&json).unwrap(), s);
    }

    #[test]
    fn it_marks_digests() {
        let d = TestDigest::new([7u8; 32]);
        assert_eq!(d.internal(), [7u8; 32]);
        assert_eq!(d.to_bytes().unwrap(), vec![7u8; 32]);
        assert_eq!(TestDigest::default().bytes(), vec![0u8; 32]);
    }
}
