use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::time::Duration;

/// A built-in live page usable by name in page strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePreset {
    pub name: &'static str,
    pub url: &'static str,
    pub duration: Duration,
}

const fn preset(name: &'static str, url: &'static str, secs: u64) -> PagePreset {
    PagePreset {
        name,
        url,
        duration: Duration::from_secs(secs),
    }
}

pub static PAGE_LIST: [PagePreset; 15] = [
    preset("blank", "about:blank", 1),
    preset("amazon", "https://www.amazon.de/s?k=heizkissen", 5),
    preset("bing", "https://www.bing.com/images/search?q=not+a+squirrel", 5),
    preset("caf", "http://www.caf.fr", 6),
    preset("cnn", "https://cnn.com/", 7),
    preset("ecma262", "https://tc39.es/ecma262/#sec-numbers-and-dates", 10),
    preset("expedia", "https://www.expedia.com/", 7),
    preset("facebook", "https://facebook.com/shakira", 8),
    preset("maps", "https://goo.gl/maps/TEZde4y4Hc6r2oNN8", 10),
    preset("microsoft", "https://microsoft.com/", 6),
    preset("provincial", "http://www.provincial.com", 6),
    preset("sueddeutsche", "https://www.sueddeutsche.de/wirtschaft", 8),
    preset("theverge", "https://www.theverge.com/", 10),
    preset("timesofindia", "https://timesofindia.indiatimes.com/", 8),
    preset("twitter", "https://twitter.com/wernertwertzog?lang=en", 6),
];

lazy_static! {
    static ref PAGES: BTreeMap<&'static str, &'static PagePreset> =
        PAGE_LIST.iter().map(|page| (page.name, page)).collect();
}

pub fn lookup(name: &str) -> Option<&'static PagePreset> {
    PAGES.get(name).copied()
}

pub fn names() -> impl Iterator<Item = &'static str> {
    PAGE_LIST.iter().map(|page| page.name)
}
