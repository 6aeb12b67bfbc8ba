/// A compile time size assertion, used to pin on-disk records to their format size.
#[macro_export]
macro_rules! const_assert_size {
    ($struct:ty, $size:expr) => {
        const _: () = assert!(core::mem::size_of::<$struct>() == ($size));
    };
}
