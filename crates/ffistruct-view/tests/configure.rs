//! Instantiation through the process-wide codec context. Kept to a single
//! test because the context is shared by every test in the binary.

use ffistruct_view::{
    configure, instantiate, string, structure, u32, CodecConfig, LayoutError, PackWidth, Value,
    ViewError,
};

#[test]
fn test_instantiate_uses_default_context() {
    let _ = env_logger::builder().is_test(true).try_init();
    let record = structure([("label", string()), ("count", u32())]);

    assert_eq!(
        instantiate(&record).unwrap_err(),
        ViewError::Layout(LayoutError::NotConfigured)
    );

    configure(CodecConfig::from_fns(
        PackWidth::Four,
        |s: &str| s.len() as u64,
        |p: u64| "?".repeat(p as usize),
    ));
    let instance = instantiate(&record).unwrap();
    assert_eq!(instance.size(), 8);

    instance.set("label", "four").unwrap();
    instance.set("count", 9).unwrap();
    assert_eq!(instance.to_bytes(), [4, 0, 0, 0, 9, 0, 0, 0]);
    assert_eq!(instance.get_value("label").unwrap(), Value::from("????"));
}
