#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use shelfscan::extractor::{ExtractionSession, ProfileRegistry};
use shelfscan::fetcher::FetchedPage;

fuzz_target!(|data: &[u8]| {
    // Convert raw bytes to string, handling invalid UTF-8 gracefully
    let html = String::from_utf8_lossy(data).to_string();
    let page = FetchedPage::new(Url::parse("https://example.com").unwrap(), html);

    // No tier may panic, whatever the markup
    let registry = ProfileRegistry::builtin().unwrap();
    let mut session = ExtractionSession::new();
    for key in registry.keys() {
        let profile = registry.get(key).unwrap();
        session.extract_page(&profile, &page, None);
    }
});
