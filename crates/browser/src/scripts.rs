//! JavaScript evaluated in the page.

/// Full document height, used to plan the reading scroll.
pub(crate) const SCROLL_HEIGHT_JS: &str =
    "document.body ? document.body.scrollHeight : document.documentElement.scrollHeight";

/// Scroll the viewport to an absolute offset.
pub(crate) fn scroll_to_js(y: i64) -> String {
    format!("window.scrollTo(0, {y}); true")
}

/// Make the captured DOM viewable offline:
/// lazy images are proxied through images.weserv.nl, protocol-relative
/// stylesheet links get an explicit scheme, and scripts are removed.
pub(crate) const REWRITE_DOM_JS: &str = r#"
(() => {
    for (const img of document.querySelectorAll('img[data-src]')) {
        img.setAttribute('src', 'https://images.weserv.nl/?url=' + img.getAttribute('data-src'));
    }
    for (const link of document.querySelectorAll('link[href]')) {
        const href = link.getAttribute('href');
        if (!href.startsWith('https:') && !href.startsWith('http:')) {
            link.setAttribute('href', 'https:' + href);
        }
    }
    for (const script of document.querySelectorAll('script')) {
        script.remove();
    }
    return true;
})()
"#;
