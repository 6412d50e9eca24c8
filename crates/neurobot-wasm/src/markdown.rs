use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Render markdown to HTML
///
/// Raw HTML in the source is emitted as text and link or image targets with
/// a scheme other than http, https or mailto are dropped, so replies cannot
/// inject markup or script URLs.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    // hljs class so highlight.js picks up code blocks
    html_output
        .replace("<pre><code class=\"language-", "<pre><code class=\"hljs language-")
        .replace("<pre><code>", "<pre><code class=\"hljs\">")
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        log::warn!("dropping link target {:?}", url.as_ref());
        CowStr::Borrowed("")
    }
}

/// Relative URLs and the allowed schemes pass. Browsers ignore whitespace and
/// control characters inside a scheme, so those are stripped before checking.
fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let scheme_end = cleaned.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(end) if cleaned[end..].starts_with(':') => {
            ALLOWED_SCHEMES.contains(&&cleaned[..end])
        }
        _ => true,
    }
}

/// Render message content, with or without markdown
pub fn render_message_content(content: &str, use_markdown: bool) -> String {
    if use_markdown {
        render_markdown(content)
    } else {
        crate::utils::escape_html(content).replace('\n', "<br>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown() {
        let md = "# Résumé\n\nCeci est **important**.";
        let html = render_markdown(md);
        assert!(html.contains("<h1>"));
        assert!(html.contains("<strong>important</strong>"));
    }

    #[test]
    fn test_render_code_block() {
        let md = "```python\nprint('hi')\n```";
        let html = render_markdown(md);
        assert!(html.contains("<pre><code class=\"hljs language-python\">"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_script_links_are_dropped() {
        let html = render_markdown("[Cliquez ici](javascript:alert(document.cookie))");
        assert!(!html.to_lowercase().contains("javascript:"), "rendered: {}", html);
        assert!(html.contains("Cliquez ici"));

        let html = render_markdown("[x](JaVaScRiPt:alert(1)) ![y](vbscript:msgbox(1))");
        assert!(!html.to_lowercase().contains("script:"), "rendered: {}", html);

        let html = render_markdown("![x](data:text/html;base64,PHNjcmlwdD4=)");
        assert!(!html.contains("data:"), "rendered: {}", html);
    }

    #[test]
    fn test_safe_links_are_kept() {
        let html =
            render_markdown("[doc](https://example.com/a?b=1) [mail](mailto:a@b.fr) [rel](/aide#faq)");
        assert!(html.contains(r#"href="https://example.com/a?b=1""#));
        assert!(html.contains(r#"href="mailto:a@b.fr""#));
        assert!(html.contains(r#"href="/aide#faq""#));
    }

    #[test]
    fn test_plain_rendering_escapes_and_breaks_lines() {
        assert_eq!(render_message_content("a<b\nc", false), "a&lt;b<br>c");
    }
}
