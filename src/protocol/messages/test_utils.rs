//! Test-only helpers shared across the per-API codec test modules.

macro_rules! assert_write_versioned {
    ($req:expr, $version:expr, $want:expr) => {
        let mut buf = Vec::new();
        $req.write_versioned(&mut buf, ApiVersion($version)).unwrap();
        assert_eq!(buf, $want);
    };
}

pub(crate) use assert_write_versioned;

macro_rules! assert_read_versioned {
    ($ty:ty, $input:expr, $version:expr, $want:expr) => {
        let mut reader = std::io::Cursor::new($input);
        let got = <$ty>::read_versioned(&mut reader, ApiVersion($version)).unwrap();
        assert_eq!($want, got);
    };
}

pub(crate) use assert_read_versioned;
