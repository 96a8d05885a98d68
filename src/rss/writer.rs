//! Streaming RSS 2.0 writer.
//!
//! https://validator.w3.org/feed/docs/rss2.html

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{self, Write};
use tracing::{debug, error, info};

use super::types::{ChannelInfo, RssItem, WriterState, RSS_GENERATOR};
use super::util::entity_to_rss_item;
use crate::entity::NormalizedEntity;
use crate::error::{FeedError, Result};
use crate::TARGET_RENDER;

fn xml_error<E: std::fmt::Display>(err: E) -> FeedError {
    FeedError::Io(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

/// Writes an RSS document item by item.
///
/// The header goes out on `open()`, every `add_item()` appends one `<item>`,
/// and `close()` writes the footer. Calls out of that order fail with
/// `FeedError::InvalidState`. Use `scoped()` to have the footer written on
/// every exit path.
pub struct RssFeedWriter<W: Write> {
    writer: Writer<W>,
    channel: ChannelInfo,
    state: WriterState,
    items: usize,
}

impl<W: Write> RssFeedWriter<W> {
    pub fn new(out: W, channel: ChannelInfo) -> Self {
        Self {
            writer: Writer::new_with_indent(out, b' ', 2),
            channel,
            state: WriterState::NotStarted,
            items: 0,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Number of items written so far.
    pub fn items(&self) -> usize {
        self.items
    }

    fn expect_state(&self, expected: WriterState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(FeedError::InvalidState {
                operation,
                state: self.state.as_str(),
            })
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn write_text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.write(Event::Start(BytesStart::new(name)))?;
        self.write(Event::Text(BytesText::from_escaped(escape(text))))?;
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Write the XML declaration and the channel header.
    pub fn open(&mut self) -> Result<()> {
        self.expect_state(WriterState::NotStarted, "open the feed")?;
        debug!(target: TARGET_RENDER, "Writing RSS header for {}", self.channel.link);

        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        self.write(Event::Start(rss))?;
        self.write(Event::Start(BytesStart::new("channel")))?;

        let channel = self.channel.clone();
        self.write_text_element("title", &channel.title)?;
        self.write_text_element("link", &channel.link)?;
        if let Some(description) = &channel.description {
            self.write_text_element("description", description)?;
        }
        self.write_text_element("generator", RSS_GENERATOR)?;

        self.state = WriterState::HeaderWritten;
        Ok(())
    }

    /// Adds the provided item to the RSS XML stream
    pub fn add_item(&mut self, item: &RssItem) -> Result<()> {
        self.expect_state(WriterState::HeaderWritten, "add an item")?;
        info!(target: TARGET_RENDER, "add_item(): {}", item);

        self.write(Event::Start(BytesStart::new("item")))?;
        self.write_text_element("title", &item.title)?;

        // https://validator.w3.org/feed/docs/warning/MissingGuid.html
        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        self.write(Event::Start(guid))?;
        self.write(Event::Text(BytesText::from_escaped(escape(&item.link))))?;
        self.write(Event::End(BytesEnd::new("guid")))?;

        self.write_text_element("link", &item.link)?;
        self.write_text_element("description", &item.description)?;
        if let Some(published) = item.published {
            self.write_text_element("pubDate", &published.to_rfc2822())?;
        }
        self.write(Event::End(BytesEnd::new("item")))?;

        self.items += 1;
        Ok(())
    }

    pub fn add_entity(&mut self, entity: &NormalizedEntity) -> Result<()> {
        self.add_item(&entity_to_rss_item(entity))
    }

    /// Write the footer. The writer is finished afterwards, even if writing fails.
    pub fn close(&mut self) -> Result<()> {
        self.expect_state(WriterState::HeaderWritten, "close the feed")?;
        self.state = WriterState::FooterWritten;
        debug!(target: TARGET_RENDER, "Writing RSS footer after {} items", self.items);

        self.write(Event::End(BytesEnd::new("channel")))?;
        self.write(Event::End(BytesEnd::new("rss")))?;
        self.writer.get_mut().write_all(b"\n")?;
        self.writer.get_mut().flush()?;
        Ok(())
    }

    /// Open the feed and return a guard that closes it when dropped.
    pub fn scoped(&mut self) -> Result<OpenFeed<'_, W>> {
        self.open()?;
        Ok(OpenFeed { writer: self })
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// An opened feed; the footer is written exactly once when this goes out of
/// scope, whether through `finish()`, an early return or a panic unwinding.
pub struct OpenFeed<'w, W: Write> {
    writer: &'w mut RssFeedWriter<W>,
}

impl<W: Write> OpenFeed<'_, W> {
    pub fn add_item(&mut self, item: &RssItem) -> Result<()> {
        self.writer.add_item(item)
    }

    pub fn add_entity(&mut self, entity: &NormalizedEntity) -> Result<()> {
        self.writer.add_entity(entity)
    }

    pub fn items(&self) -> usize {
        self.writer.items()
    }

    /// Close the feed, reporting a failure to write the footer.
    pub fn finish(self) -> Result<()> {
        self.writer.close()
    }
}

impl<W: Write> Drop for OpenFeed<'_, W> {
    fn drop(&mut self) {
        if self.writer.state() == WriterState::HeaderWritten {
            if let Err(err) = self.writer.close() {
                error!(target: TARGET_RENDER, "Failed to write RSS footer: {}", err);
            }
        }
    }
}

/// Write a whole feed into `out`, with the items produced by `fill`.
///
/// The footer is written even when `fill` fails; its error is returned then.
pub fn write_feed<W, F>(out: W, channel: ChannelInfo, fill: F) -> Result<W>
where
    W: Write,
    F: FnOnce(&mut OpenFeed<'_, W>) -> Result<()>,
{
    let mut writer = RssFeedWriter::new(out, channel);

    {
        let mut feed = writer.scoped()?;
        let filled = fill(&mut feed);
        let closed = feed.finish();
        filled.and(closed)?;
    }

    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn channel() -> ChannelInfo {
        ChannelInfo {
            title: "Farerskie Kadry na Instagramie".to_string(),
            link: "https://www.instagram.com/farerskie.kadry/".to_string(),
            description: Some("Suma miliona drobnych, banalnych sytuacji".to_string()),
        }
    }

    fn entity(message: &str) -> NormalizedEntity {
        NormalizedEntity {
            message: message.to_string(),
            permalink_url: "https://www.instagram.com/p/abc/".to_string(),
            full_picture: Some("https://cdninstagram.example/media.jpg".to_string()),
            created_time: Utc.with_ymd_and_hms(2023, 3, 28, 21, 37, 58).unwrap(),
            outgoing_link: None,
            like_count: Some(3),
        }
    }

    fn output(writer: RssFeedWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner()).unwrap()
    }

    fn between<'a>(text: &'a str, open: &str, close: &str) -> &'a str {
        let start = text.find(open).unwrap() + open.len();
        let end = start + text[start..].find(close).unwrap();
        &text[start..end]
    }

    #[test]
    fn test_single_item_feed() {
        let mut writer = RssFeedWriter::new(Vec::new(), channel());
        writer.open().unwrap();
        writer.add_entity(&entity("Gásadalur #Vágar")).unwrap();
        writer.close().unwrap();
        assert_eq!(writer.state(), WriterState::FooterWritten);

        let xml = output(writer);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<rss version=\"2.0\">"));
        assert!(xml.contains("<generator>graph-feed</generator>"));
        assert_eq!(xml.matches("<item>").count(), 1);
        assert_eq!(xml.matches("</channel>").count(), 1);
        assert!(xml.trim_end().ends_with("</rss>"));

        let item = between(&xml, "<item>", "</item>");
        assert!(item.contains("<title>#Vágar</title>"));
        assert!(item.contains("<guid isPermaLink=\"false\">https://www.instagram.com/p/abc/</guid>"));
        assert!(item.contains("<link>https://www.instagram.com/p/abc/</link>"));
        assert!(item.contains("<pubDate>Tue, 28 Mar 2023 21:37:58 +0000</pubDate>"));
        assert_eq!(
            between(item, "<description>", "</description>"),
            "&lt;p&gt;&lt;img src=&quot;https://cdninstagram.example/media.jpg&quot; style=&quot;max-width: 500px; max-height: 500px&quot; class=&quot;fb-feed-image&quot;&gt;&lt;/p&gt;\n&lt;p&gt;Gásadalur #Vágar&lt;/p&gt;"
        );
    }

    #[test]
    fn test_output_parses_as_rss() {
        let mut writer = RssFeedWriter::new(Vec::new(), channel());
        writer.open().unwrap();
        writer.add_entity(&entity("Pierwszy #Sandoy")).unwrap();
        writer.add_entity(&entity("Drugi bez tagu & z <ostrymi> nawiasami")).unwrap();
        writer.close().unwrap();

        let bytes = writer.into_inner();
        let feed = feed_rs::parser::parse(bytes.as_slice()).unwrap();
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[0].title.as_ref().unwrap().content, "#Sandoy");
        assert_eq!(feed.entries[0].links[0].href, "https://www.instagram.com/p/abc/");
    }

    #[test]
    fn test_free_text_is_escaped() {
        let mut writer = RssFeedWriter::new(Vec::new(), channel());
        writer.open().unwrap();
        writer
            .add_item(&RssItem {
                title: "Tom & Jerry".to_string(),
                link: "https://example.com/?a=1&b=2".to_string(),
                description: "<script>&\"'".to_string(),
                published: None,
            })
            .unwrap();
        writer.close().unwrap();

        let xml = output(writer);
        assert!(xml.contains("<title>Tom &amp; Jerry</title>"));
        assert!(xml.contains("<link>https://example.com/?a=1&amp;b=2</link>"));
        assert!(xml.contains("<description>&lt;script&gt;&amp;&quot;&apos;</description>"));
        assert!(!xml.contains("<pubDate>"));
    }

    #[test]
    fn test_message_with_markup_is_escaped() {
        let mut writer = RssFeedWriter::new(Vec::new(), channel());
        writer.open().unwrap();
        writer.add_entity(&entity("<script>&\"'")).unwrap();
        writer.close().unwrap();

        let xml = output(writer);
        let description = between(&xml, "<description>&lt;p&gt;&lt;img", "</description>");
        assert!(description.contains("&lt;p&gt;&lt;script&gt;&amp;&quot;&apos;&lt;/p&gt;"));
        assert!(!description.contains('<'));
        assert!(!description.contains('"'));
        assert!(!description.contains('\''));
    }

    #[test]
    fn test_out_of_order_calls_fail() {
        let mut writer = RssFeedWriter::new(Vec::new(), channel());
        assert!(matches!(
            writer.add_entity(&entity("too early")),
            Err(FeedError::InvalidState { .. })
        ));
        assert!(matches!(writer.close(), Err(FeedError::InvalidState { .. })));

        writer.open().unwrap();
        assert!(matches!(writer.open(), Err(FeedError::InvalidState { .. })));
        writer.close().unwrap();

        assert!(matches!(
            writer.add_entity(&entity("too late")),
            Err(FeedError::InvalidState { .. })
        ));
        assert!(matches!(writer.close(), Err(FeedError::InvalidState { .. })));
        assert_eq!(writer.items(), 0);
        assert_eq!(output(writer).matches("</rss>").count(), 1);
    }

    #[test]
    fn test_scoped_feed_closes_on_drop() {
        let mut writer = RssFeedWriter::new(Vec::new(), channel());

        let produce = |writer: &mut RssFeedWriter<Vec<u8>>| -> Result<()> {
            let mut feed = writer.scoped()?;
            feed.add_entity(&entity("first"))?;
            Err(FeedError::MissingConfig("FB_TOKEN"))
        };
        assert!(produce(&mut writer).is_err());

        assert_eq!(writer.state(), WriterState::FooterWritten);
        let xml = output(writer);
        assert_eq!(xml.matches("<item>").count(), 1);
        assert_eq!(xml.matches("</channel>").count(), 1);
        assert_eq!(xml.matches("</rss>").count(), 1);
    }

    #[test]
    fn test_write_feed_keeps_fill_error_and_footer() {
        let mut out = Vec::new();
        let result = write_feed(&mut out, channel(), |feed| {
            feed.add_entity(&entity("first"))?;
            feed.add_entity(&entity("second"))?;
            assert_eq!(feed.items(), 2);
            Err(FeedError::TimeParse {
                value: "yesterday".to_string(),
                reason: "input contains invalid characters".to_string(),
            })
        });
        assert!(matches!(result, Err(FeedError::TimeParse { .. })));

        let xml = String::from_utf8(out).unwrap();
        assert_eq!(xml.matches("<item>").count(), 2);
        assert_eq!(xml.matches("</rss>").count(), 1);

        let out = write_feed(Vec::new(), channel(), |_| Ok(())).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert_eq!(xml.matches("<item>").count(), 0);
        assert_eq!(xml.matches("</rss>").count(), 1);
    }
}
