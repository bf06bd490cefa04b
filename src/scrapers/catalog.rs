//! Built-in source catalog.
//!
//! Lists the search portals and publisher feeds the digest knows about, and
//! builds the default adapter chain in priority order: Naver, Daum, then every
//! RSS feed behind one [`FeedDirectory`].

use itertools::Itertools;
use reqwest::Client;
use std::fmt;

use super::Source;
use super::feed::{FeedDirectory, FeedReader};
use super::search::SearchPortal;

/// Grouping used when listing sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Portal,
    National,
    Business,
    Technology,
    Wire,
    Broadcast,
    International,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Portal => "Search portals",
            Category::National => "National dailies",
            Category::Business => "Business press",
            Category::Technology => "IT / Tech",
            Category::Wire => "Wire services",
            Category::Broadcast => "Broadcasters",
            Category::International => "International (English)",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A publisher feed in the catalog.
#[derive(Debug, Clone, Copy)]
pub struct FeedInfo {
    pub name: &'static str,
    pub url: &'static str,
    pub category: Category,
}

const fn feed(name: &'static str, url: &'static str, category: Category) -> FeedInfo {
    FeedInfo { name, url, category }
}

/// Names of the scraped search portals, in query order.
pub const PORTALS: &[&str] = &["네이버뉴스", "다음뉴스"];

/// Publisher feeds, in query order.
pub const FEEDS: &[FeedInfo] = &[
    feed("조선일보", "https://www.chosun.com/arc/outboundfeeds/rss/?outputType=xml", Category::National),
    feed("중앙일보", "https://rss.joins.com/joins_news_list.xml", Category::National),
    feed("동아일보", "https://rss.donga.com/total.xml", Category::National),
    feed("한겨레", "https://www.hani.co.kr/rss/", Category::National),
    feed("경향신문", "https://www.khan.co.kr/rss/rssdata/total_news.xml", Category::National),
    feed("한국일보", "https://www.hankookilbo.com/RSS", Category::National),
    feed("세계일보", "https://www.segye.com/Articles/RSSList/segye_recent.xml", Category::National),
    feed("국민일보", "http://rss.kmib.co.kr/data/kmibRssAll.xml", Category::National),
    feed("매일경제", "https://www.mk.co.kr/rss/30000001/", Category::Business),
    feed("한국경제", "https://www.hankyung.com/feed/all-news", Category::Business),
    feed("서울경제", "https://www.sedaily.com/RSS/Section/", Category::Business),
    feed("머니투데이", "https://rss.mt.co.kr/mt_news.xml", Category::Business),
    feed("이데일리", "https://rss.edaily.co.kr/edaily_news.xml", Category::Business),
    feed("아시아경제", "https://www.asiae.co.kr/rss/all.htm", Category::Business),
    feed("파이낸셜뉴스", "https://www.fnnews.com/rss/fn_realnews_all.xml", Category::Business),
    feed("헤럴드경제", "http://biz.heraldcorp.com/common/rss_xml.php?ct=010000000000", Category::Business),
    feed("ZDNet Korea", "https://zdnet.co.kr/rss/all_news.xml", Category::Technology),
    feed("전자신문", "https://rss.etnews.com/Section901.xml", Category::Technology),
    feed("디지털타임스", "http://www.dt.co.kr/rss/all_news.xml", Category::Technology),
    feed("블로터", "https://www.bloter.net/feed", Category::Technology),
    feed("연합뉴스", "https://www.yna.co.kr/rss/all.xml", Category::Wire),
    feed("뉴시스", "https://www.newsis.com/rss/all_rss.xml", Category::Wire),
    feed("뉴스1", "https://www.news1.kr/rss/all_news.xml", Category::Wire),
    feed("KBS", "https://world.kbs.co.kr/rss/rss_news.htm?lang=k", Category::Broadcast),
    feed("MBC", "https://imnews.imbc.com/rss/news/news_00.xml", Category::Broadcast),
    feed("SBS", "https://news.sbs.co.kr/news/SectionRssFeed.do?sectionId=01&plink=RSSREADER", Category::Broadcast),
    feed("YTN", "https://www.ytn.co.kr/rss/headline.xml", Category::Broadcast),
    feed("JTBC", "https://fs.jtbc.co.kr/RSS/newsflash.xml", Category::Broadcast),
    feed("MBN", "https://www.mbn.co.kr/rss/", Category::Broadcast),
    feed("Reuters", "https://www.reutersagency.com/feed/", Category::International),
    feed("BBC", "http://feeds.bbci.co.uk/news/rss.xml", Category::International),
    feed("CNN", "http://rss.cnn.com/rss/edition.rss", Category::International),
    feed("TechCrunch", "https://techcrunch.com/feed/", Category::International),
    feed("The Verge", "https://www.theverge.com/rss/index.xml", Category::International),
    feed("Wired", "https://www.wired.com/feed/rss", Category::International),
    feed("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index", Category::International),
];

/// Every supported source name, portals first, grouped by category in
/// declaration order.
pub fn sources_by_category() -> Vec<(Category, Vec<&'static str>)> {
    let mut groups = vec![(Category::Portal, PORTALS.to_vec())];
    groups.extend(
        FEEDS
            .iter()
            .chunk_by(|f| f.category)
            .into_iter()
            .map(|(category, feeds)| (category, feeds.map(|f| f.name).collect())),
    );
    groups
}

/// Total number of supported sources.
pub fn source_count() -> usize {
    PORTALS.len() + FEEDS.len()
}

/// One reader per catalog feed.
pub fn feed_readers(client: &Client) -> Vec<FeedReader> {
    FEEDS
        .iter()
        .map(|f| FeedReader::new(f.name, f.url, client.clone()))
        .collect()
}

/// The default adapter chain: Naver, Daum, then all catalog feeds.
pub fn default_sources(client: &Client) -> Vec<Box<dyn Source>> {
    vec![
        Box::new(SearchPortal::naver(client.clone())),
        Box::new(SearchPortal::daum(client.clone())),
        Box::new(FeedDirectory::new("RSS feeds", feed_readers(client))),
    ]
}
