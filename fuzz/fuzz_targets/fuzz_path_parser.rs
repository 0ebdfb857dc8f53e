#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 4096 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(attrs) = docops::parse_document_path(s) {
            let again = docops::parse_document_path(&docops::create_document_path(&attrs));
            assert_eq!(again.ok(), Some(attrs));
        }
    }
});
