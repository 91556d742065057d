//! The default codec context is process-wide, so this file holds a single
//! test that walks through its whole lifecycle.

use ffistruct_layout::{
    configure, current, current_pack, size_of, string, structure, u8, CodecConfig, LayoutError,
    PackWidth,
};

fn codec(pack: PackWidth) -> CodecConfig {
    CodecConfig::from_fns(pack, |_: &str| 0, |_: u64| String::new())
}

#[test]
fn test_default_context_lifecycle() {
    let _ = env_logger::builder().is_test(true).try_init();
    let person = structure([("name", string()), ("age", u8())]);

    assert_eq!(size_of(&person), Err(LayoutError::NotConfigured));
    assert_eq!(current_pack(), Err(LayoutError::NotConfigured));
    assert!(current().is_err());

    configure(codec(PackWidth::Eight));
    assert_eq!(size_of(&person), Ok(16));
    assert_eq!(current().map(|c| c.pack).ok(), Some(PackWidth::Eight));

    // A second call swaps the stored context.
    configure(codec(PackWidth::Four));
    assert_eq!(size_of(&person), Ok(8));
    assert_eq!(current_pack(), Ok(PackWidth::Four));
}
