//! Display data derived from feature attributes.
//!
//! Monitored event feeds carry presentation hints in their attributes: a
//! `name`, an `html` fragment whose anchor holds the headline and article
//! link, a share image, and a unique id. [`CalloutData`] pulls those out so
//! a surrounding application can show a callout without touching raw
//! attributes.

use std::sync::LazyLock;

use regex_lite::Regex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::feature::Attributes;

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"title="([^"]+)""#).expect("title pattern compiles"));
static HREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("href pattern compiles"));

/// Presentation data extracted from one feature's attributes.
///
/// # Examples
/// ```
/// use geomon_core::{Attributes, CalloutData};
/// use serde_json::json;
///
/// let attributes = Attributes::from([
///     ("name".into(), json!("Protest reported")),
///     (
///         "html".into(),
///         json!(r#"<a href="https://news.example/4711" title="March downtown">…</a>"#),
///     ),
/// ]);
///
/// let callout = CalloutData::from_attributes(&attributes);
/// assert_eq!(callout.title.as_deref(), Some("Protest reported"));
/// assert_eq!(callout.detail.as_deref(), Some("March downtown"));
/// assert_eq!(callout.link.as_deref(), Some("https://news.example/4711"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalloutData {
    /// Headline, from the `name` attribute.
    pub title: Option<String>,
    /// Detail line: the `title="…"` capture of the `html` attribute, or the
    /// whole fragment when the pattern is absent.
    pub detail: Option<String>,
    /// Article link: the `href="…"` capture of the `html` attribute.
    pub link: Option<String>,
    /// Share image URL, from the `shareimage` attribute.
    pub image_url: Option<String>,
    /// Source-assigned unique id, from the `uid` attribute.
    pub unique_id: Option<String>,
}

impl CalloutData {
    /// Extract callout data from a feature's attributes.
    ///
    /// Absent or non-string attributes leave the corresponding field `None`.
    #[must_use]
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let mut callout = Self {
            title: string_attribute(attributes, "name"),
            image_url: string_attribute(attributes, "shareimage"),
            unique_id: string_attribute(attributes, "uid"),
            ..Self::default()
        };
        if let Some(html) = string_attribute(attributes, "html") {
            callout.detail = Some(
                capture(&TITLE_PATTERN, &html).map_or_else(|| html.clone(), ToOwned::to_owned),
            );
            callout.link = capture(&HREF_PATTERN, &html).map(ToOwned::to_owned);
        }
        callout
    }
}

fn string_attribute(attributes: &Attributes, name: &str) -> Option<String> {
    attributes
        .get(name)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn capture<'h>(pattern: &Regex, haystack: &'h str) -> Option<&'h str> {
    pattern
        .captures(haystack)
        .and_then(|captures| captures.get(1))
        .map(|capture| capture.as_str())
}
