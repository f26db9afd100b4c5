//! Presentation metadata derived from a page record.

use url::form_urlencoded;

use slugpress_content::{excerpt, strip_markup};
use slugpress_shared::{PageRecord, ShareLink};

/// Length cap for descriptions derived from page content.
pub const META_DESCRIPTION_CHARS: usize = 160;

/// The page's `meta_title` if set and non-blank, otherwise its title.
pub fn effective_meta_title(page: &PageRecord) -> String {
    non_blank(page.meta_title.as_deref()).unwrap_or(&page.title).to_string()
}

/// The page's `meta_description` if set and non-blank, otherwise the first
/// [`META_DESCRIPTION_CHARS`] characters of its content as plain text.
pub fn effective_meta_description(page: &PageRecord) -> String {
    match non_blank(page.meta_description.as_deref()) {
        Some(desc) => desc.to_string(),
        None => excerpt(&strip_markup(&page.content), META_DESCRIPTION_CHARS),
    }
}

/// Public URL of a page: `<origin>/<slug>`.
pub fn share_url(site_origin: &str, slug: &str) -> String {
    format!("{}/{}", site_origin.trim_end_matches('/'), slug.trim_start_matches('/'))
}

/// Share intents for the supported networks, in display order.
pub fn share_links(share_url: &str, text: &str) -> Vec<ShareLink> {
    let url = encode(share_url);
    let text = encode(text);

    vec![
        ShareLink {
            network: "twitter".into(),
            url: format!("https://twitter.com/intent/tweet?url={url}&text={text}"),
        },
        ShareLink {
            network: "facebook".into(),
            url: format!("https://www.facebook.com/sharer/sharer.php?u={url}"),
        },
        ShareLink {
            network: "linkedin".into(),
            url: format!("https://www.linkedin.com/sharing/share-offsite/?url={url}"),
        },
    ]
}

fn encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
