#![no_main]
use libfuzzer_sys::fuzz_target;
use readable_dom::Document;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Build -> serialize -> build roundtrip should never panic
        let doc = Document::parse(s, "");
        let output = doc.outer_html(doc.root());
        let again = Document::parse(&output, "");
        let _ = again.text_content(again.root());
    }
});
