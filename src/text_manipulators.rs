use scraper::ElementRef;

/// Visible text of a node. Adjacent text nodes are joined with a space and
/// runs of whitespace collapsed, so `Mon<span>Jan 5</span>` reads
/// "Mon Jan 5" the way a browser renders it, not "MonJan 5".
pub fn extract_text(node: ElementRef) -> String {
    let joined = node.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn a same-site href into a full URL against the page it came from.
pub fn absolutize_href(base_url: &str, href: &str) -> String {
    if href.is_empty() || href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let origin = base_url
        .find("://")
        .map(|scheme_end| {
            let after_scheme = scheme_end + 3;
            match base_url[after_scheme..].find('/') {
                Some(path_start) => &base_url[..after_scheme + path_start],
                None => base_url,
            }
        })
        .unwrap_or(base_url);
    if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}
