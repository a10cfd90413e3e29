use serde::Deserialize;
use serde_json::Value;

use crate::utils::escape_html;

/// A catalog hit that has everything the autocomplete widget shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSearchResult {
    pub id: String,
    pub title: String,
    pub author: String,
    pub thumbnail: Option<String>,
}

#[derive(Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

// Only id, title and the first author must be well typed; the rest stays raw.
#[derive(Deserialize)]
struct VolumeInfo {
    title: String,
    authors: Vec<Value>,
    #[serde(rename = "imageLinks", default)]
    image_links: Option<Value>,
}

impl BookSearchResult {
    /// `None` unless the item has an id, a title and at least one author.
    pub fn from_item(item: &Value) -> Option<Self> {
        let volume = Volume::deserialize(item).ok()?;
        let author = volume.volume_info.authors.first()?.as_str()?.to_string();
        let thumbnail = volume
            .volume_info
            .image_links
            .as_ref()
            .and_then(|links| links.get("smallThumbnail"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Some(Self {
            id: volume.id,
            title: volume.volume_info.title,
            author,
            thumbnail,
        })
    }

    /// Markup the client-side autocomplete selector expects.
    pub fn snippet(&self, default_thumbnail: &str) -> String {
        let thumb = self.thumbnail.as_deref().unwrap_or(default_thumbnail);
        format!(
            concat!(
                "<span class=\"searchResWrapper\">",
                "<span class=\"searchRes\" id=\"{id}\">",
                "<img class=\"bookThumb\" src=\"{thumb}\">",
                "<span class=\"titleAndAuthors\">{title} ({author})</span>",
                "</span></span>\n"
            ),
            id = escape_html(&self.id),
            thumb = escape_html(thumb),
            title = escape_html(&self.title),
            author = escape_html(&self.author),
        )
    }
}

/// Lazily format the valid items, in order, skipping the rest.
pub fn format_results<'a>(
    items: &'a [Value],
    default_thumbnail: &'a str,
) -> impl Iterator<Item = String> + 'a {
    items
        .iter()
        .filter_map(BookSearchResult::from_item)
        .map(move |result| result.snippet(default_thumbnail))
}
