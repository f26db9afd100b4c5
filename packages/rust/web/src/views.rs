//! HTML views rendered with maud.
//!
//! These only consume [`PageViewModel`] and the site chrome read from settings.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use slugpress_shared::{PageViewModel, SettingsProvider, keys};

/// Site-wide values every view needs.
#[derive(Debug, Clone)]
pub struct SiteChrome {
    pub name: String,
    pub description: String,
    pub favicon: String,
}

impl SiteChrome {
    pub fn from_settings(settings: &dyn SettingsProvider) -> Self {
        Self {
            name: settings.get(keys::SITE_NAME, "slugpress"),
            description: settings.get(keys::SITE_DESCRIPTION, ""),
            favicon: settings.get(keys::FAVICON, "/favicon.ico"),
        }
    }
}

fn layout(site: &SiteChrome, title: &str, description: &str, head_extra: Markup, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | " (site.name) }
                @if !description.is_empty() {
                    meta name="description" content=(description);
                }
                link rel="icon" href=(site.favicon);
                (head_extra)
            }
            body {
                header { a href="/" { (site.name) } }
                main { (body) }
            }
        }
    }
}

/// A resolved page.
pub fn page(site: &SiteChrome, view: &PageViewModel) -> Markup {
    let head = html! {
        link rel="canonical" href=(view.share_url);
        meta property="og:title" content=(view.effective_meta_title);
        meta property="og:description" content=(view.effective_meta_description);
        meta property="og:url" content=(view.share_url);
        meta property="og:site_name" content=(site.name);
    };

    let body = html! {
        article {
            h1 class="page-title" { (view.title) }
            @if !view.table_of_contents.is_empty() {
                nav class="toc" aria-label="Table of contents" {
                    ol {
                        @for entry in &view.table_of_contents {
                            li class={ "toc-level-" (entry.level) } {
                                a href={ "#" (entry.anchor_id) } { (entry.text) }
                            }
                        }
                    }
                }
            }
            div class="content" { (PreEscaped(&view.renderable_content)) }
            footer {
                ul class="share" {
                    @for link in &view.share_links {
                        li { a href=(link.url) rel="noopener" target="_blank" { (link.network) } }
                    }
                }
            }
        }
    };

    layout(
        site,
        &view.effective_meta_title,
        &view.effective_meta_description,
        head,
        body,
    )
}

pub fn not_found(site: &SiteChrome) -> Markup {
    layout(
        site,
        "Page not found",
        &site.description,
        html! {},
        html! {
            h1 { "Page not found" }
            p { "The page you are looking for does not exist." }
        },
    )
}

/// Generic failure page. Never shows fault detail.
pub fn server_error(site: &SiteChrome) -> Markup {
    layout(
        site,
        "Something went wrong",
        &site.description,
        html! {},
        html! {
            h1 { "Something went wrong" }
            p { "Please try again later." }
        },
    )
}

pub fn maintenance(site: &SiteChrome, message: &str) -> Markup {
    layout(
        site,
        "Down for maintenance",
        &site.description,
        html! { meta name="robots" content="noindex"; },
        html! {
            h1 { "Down for maintenance" }
            p class="maintenance-message" { (message) }
        },
    )
}
