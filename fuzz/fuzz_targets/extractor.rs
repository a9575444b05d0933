#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use unfurl::SiteKind;
use unfurl::sites::analyze_markup;

fuzz_target!(|data: &[u8]| {
    let markup = String::from_utf8_lossy(data).to_string();
    let Ok(url) = Url::parse("https://example.com/post") else {
        return;
    };

    // Heuristics must never panic, whatever the markup.
    let _ = analyze_markup(&SiteKind::Generic, url.clone(), markup.as_str());
    let _ = analyze_markup(&SiteKind::Headline, url, markup);
});
