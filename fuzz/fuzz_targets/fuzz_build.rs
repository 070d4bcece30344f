#![no_main]
use libfuzzer_sys::fuzz_target;
use readable_dom::parse::{parse_fragment, Tag};
use readable_dom::Document;

fuzz_target!(|data: &[u8]| {
    // Decoding, parsing and building arbitrary bytes should never panic
    if let Ok(doc) = Document::parse_bytes(data, "https://example.com/") {
        let _ = doc.title();
        let _ = doc.get_elements_by_tag_name(doc.root(), "*");
    }
    if let Ok(s) = std::str::from_utf8(data) {
        let tree = parse_fragment(s, Tag::BODY);
        let mut doc = Document::new("");
        let body = doc.create_element("body");
        if readable_dom::builder::build_into(&mut doc, body, &tree).is_ok() {
            let _ = doc.text_content(body);
        }
    }
});
