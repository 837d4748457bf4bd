#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use url::Url;

use scrapeline::fetcher::{paragraph_text, pipeline::decode_body};

fuzz_target!(|data: &[u8]| {
    let url = Url::parse("https://example.com").unwrap();
    let body = Bytes::copy_from_slice(data);

    // Charset sniffing and paragraph extraction must never panic
    let page = decode_body(url, &body, "text/html");
    let _ = paragraph_text(&page.html);
    let _ = paragraph_text(&String::from_utf8_lossy(data));
});
