macro_rules! info {
    ( $($arg:tt)+ ) => (
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)+);
    );
}

// A macro literally named `warn` cannot be re-imported through a
// single-segment `use`; it would collide with the builtin `warn`
// attribute. Define it under another name and rename on export.
macro_rules! warned {
    ( $($arg:tt)+ ) => (
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)+);
    );
}

pub(crate) use info;
pub(crate) use warned as warn;
