//! HTML fragments shown inside map markers and network nodes/edges.

use crate::error::Result;
use crate::media::{MediaKind, MediaRef};

const ARTIST_POPUP_STYLE: &str = r#"<style>
  .container-element { width: 600px; }
  .image-element, .text-element { display: inline-block; vertical-align: bottom; }
  .image-element { width: 200px; }
  .text-element { text-align: right; width: 300px; }
  .artist_name { font-family: 'proxima_nova_rgbold', Helvetica, Arial, sans-serif; font-size: 1.3em; }
  .artist_birth { font-family: 'FF Meta VF', 'Fira Sans', Helvetica, Arial, sans-serif; font-size: 0.9em; }
</style>"#;

const NODE_LABEL_STYLE: &str = r#"<style>
  artist_name { font-family: 'proxima_nova_rgbold', Helvetica, Arial, sans-serif; font-size: 1.8em; }
</style>"#;

const EDGE_POPUP_STYLE: &str = r#"<style>
  .edge_title { font-family: 'proxima_nova_rgbold', Helvetica, Arial, sans-serif; font-size: 1.3em; }
  .edge_subtitle { font-family: 'FF Meta VF', 'Fira Sans', Helvetica, Arial, sans-serif; font-size: 0.9em; }
</style>"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn img_tag(extension: &str, encoded: &str) -> String {
    format!(r#"<img src="data:image/{extension};base64,{encoded}">"#)
}

pub fn audio_tag(extension: &str, encoded: &str) -> String {
    format!(r#"<audio controls><source src="data:audio/{extension};base64,{encoded}"></audio>"#)
}

/// Embedding tag for a discovered media file; empty when there is none.
pub fn media_tag(media: Option<&MediaRef>) -> Result<String> {
    let Some(media) = media else {
        return Ok(String::new());
    };
    let encoded = media.encoded_base64()?;
    Ok(match media.kind() {
        MediaKind::Image => img_tag(media.extension(), &encoded),
        MediaKind::Audio => audio_tag(media.extension(), &encoded),
    })
}

/// Portrait on the left, name and birth line on the right, audio player below.
/// `img` and `audio` are trusted tags; `name` and `birth_line` are escaped.
pub fn artist_popup(img: &str, name: &str, birth_line: &str, audio: &str) -> String {
    format!(
        r#"<html>
<head>
{ARTIST_POPUP_STYLE}
</head>
<body>
<div class="container-element">
  <div class="image-element">
    {img}
  </div>
  <div class="text-element">
    <div class="artist_name">{name}</div>
    <div class="artist_birth">{birth_line}</div>
  </div>
</div>
<br>
{audio}
</body>
</html>
"#,
        name = escape(name),
        birth_line = escape(birth_line),
    )
}

pub fn node_label(name: &str) -> String {
    format!(
        "<html>\n<head>\n{NODE_LABEL_STYLE}\n</head>\n<body>\n<artist_name>{}</artist_name>\n</body>\n</html>\n",
        escape(name)
    )
}

pub fn edge_popup(title: &str, subtitle: &str, audio: &str) -> String {
    format!(
        "<html>\n<head>\n{EDGE_POPUP_STYLE}\n</head>\n<body>\n<div class=\"edge_title\">{}</div>\n<div class=\"edge_subtitle\">{}</div>\n<br>\n{audio}\n</body>\n</html>\n",
        escape(title),
        escape(subtitle)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup() {
        assert_eq!(escape(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
        assert_eq!(escape("Brassens"), "Brassens");
    }

    #[test]
    fn media_tags() {
        assert_eq!(img_tag("png", "AAA"), r#"<img src="data:image/png;base64,AAA">"#);
        assert_eq!(
            audio_tag("mp3", "BBB"),
            r#"<audio controls><source src="data:audio/mp3;base64,BBB"></audio>"#
        );
        assert_eq!(media_tag(None).unwrap(), "");
    }

    #[test]
    fn artist_popup_escapes_text_but_not_tags() {
        let html = artist_popup(&img_tag("png", "AAA"), "Ike & Tina", "03/15/1939 Sète", "");
        assert!(html.contains(r#"<img src="data:image/png;base64,AAA">"#));
        assert!(html.contains(r#"<div class="artist_name">Ike &amp; Tina</div>"#));
        assert!(html.contains("03/15/1939 Sète"));
    }

    #[test]
    fn node_and_edge_templates() {
        assert!(node_label("MC <Solaar>").contains("<artist_name>MC &lt;Solaar&gt;</artist_name>"));
        let edge = edge_popup("Song", "feat.", &audio_tag("wav", "CC"));
        assert!(edge.contains(r#"<div class="edge_title">Song</div>"#));
        assert!(edge.contains("data:audio/wav;base64,CC"));
    }
}
