//! crates/ad_replacement_core/src/creative.rs
//!
//! Assembles the inline HTML document served in place of an ad slot.
//!
//! Both replacement endpoints redirect the slot to a `data:text/html,` URL: a
//! body sized to the slot holding the creative, with a caption banner laid
//! over the top edge.

use crate::domain::AdCandidate;

/// Where the versioned endpoint sends clicks when no ad matched.
pub const FALLBACK_HREF: &str = "https://brave.com/";

/// Caption shown when no ad matched.
pub const FALLBACK_CAPTION: &str = "Use Brave";

const PLACEHOLDER_ORIGIN: &str = "https://placeimg.com";

const CAPTION_STYLE: &str =
    "background-color:blue; color: white; font-weight: bold; position: absolute; top: 0;";

/// The pieces of a replacement creative before it is wrapped into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creative {
    /// Landing page the click should end up on.
    pub href: String,
    /// `<img>` markup for the creative.
    pub img: String,
    pub caption: String,
}

impl Creative {
    /// The creative served by the versioned endpoint.
    pub fn for_candidate(candidate: Option<&AdCandidate>, width: f64, height: f64) -> Self {
        match candidate {
            Some(ad) => Self {
                href: ad.lp.clone(),
                img: format!(r#"<img src="{}" />"#, escape_html(&ad.url)),
                caption: ad.name.clone(),
            },
            None => Self {
                href: FALLBACK_HREF.to_string(),
                img: format!(
                    r#"<img src="{}/{}/{}/any" />"#,
                    PLACEHOLDER_ORIGIN,
                    js_number(width),
                    js_number(height)
                ),
                caption: FALLBACK_CAPTION.to_string(),
            },
        }
    }

    /// Body markup for the versioned endpoint: the image wrapped in a link to
    /// the click-through URL rather than to the advertiser.
    pub fn linked_through(&self, click_url: &str) -> String {
        anchor(click_url, &self.img)
    }
}

/// Body markup and caption for the legacy endpoint, which links straight to
/// the advertiser and uses a differently shaped placeholder.
pub fn legacy_creative(candidate: Option<&AdCandidate>, width: f64, height: f64) -> (String, String) {
    match candidate {
        Some(ad) => (
            anchor(&ad.lp, &format!(r#"<img src="{}"/>"#, escape_html(&ad.url))),
            ad.name.clone(),
        ),
        None => (
            format!(
                r#"<img src="{}/{}/{}"/>"#,
                PLACEHOLDER_ORIGIN,
                js_number(width),
                js_number(height)
            ),
            FALLBACK_CAPTION.to_string(),
        ),
    }
}

fn anchor(href: &str, inner: &str) -> String {
    format!(r#"<a href="{}" target="_blank">{}</a>"#, escape_html(href), inner)
}

/// Wraps body markup and a caption into a `data:text/html,` URL.
pub fn data_url(width: f64, height: f64, body: &str, caption: &str) -> String {
    let html = format!(
        r#"<html><body style="width: {}px; height: {}px; padding: 0; margin: 0;">{body}<div style="{CAPTION_STYLE}">{}</div></body></html>"#,
        js_number(width),
        js_number(height),
        escape_html(caption)
    );
    format!("data:text/html,{}", encode_url_text(&html))
}

/// Renders a number the way a browser would print it: no trailing `.0`, and
/// exponent notation (`1e+21`, `1.5e-7`) outside `[1e-6, 1e21)`.
pub fn js_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if value == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return format!("{}", value);
    }
    let sci = format!("{:e}", value);
    match sci.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => sci,
    }
}

/// Escapes text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// Keeps the URL a legal header value: only visible ASCII and spaces pass
// through, `%` and `#` are always encoded.
fn encode_url_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'%' | b'#' => out.push_str(&format!("%{:02X}", byte)),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
