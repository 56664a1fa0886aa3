use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{header, Client, Url};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::time::sleep;

const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

pub const DEFAULT_SPIDER_SITES: [&str; 2] = ["https://www.riviantrackr.com", "https://www.rivianroamer.com"];
pub const DEFAULT_FEEDS: [&str; 1] = ["https://riviantrackr.com/sitemap.rss"];
pub const DEFAULT_PAGES: [&str; 2] = ["https://www.rivian.com", "https://rivian.com/support/support-documents"];

/// Elements whose text never ends up in a page file.
const EXCLUDED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "header", "iframe", "noscript"];

lazy_static! {
    static ref SEL_TITLE: Selector = Selector::parse("title").expect("valid selector");
    static ref SEL_BODY: Selector = Selector::parse("body").expect("valid selector");
    static ref SEL_A: Selector = Selector::parse("a[href]").expect("valid selector");
    static ref HSPACE: Regex = Regex::new(r"[ \t]+").expect("valid regex");
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n").expect("valid regex");
    /// Paths not worth indexing: per-station pages, profiles, pagination, auth.
    static ref SKIP_PATTERNS: Vec<Regex> = [
        r"^/charging/sites/",
        r"^/charging/networks/",
        r"^/leaderboards/",
        r"^/forum/members/",
        r"^/forum/posts/",
        r"^/forum/threads/.*/post-",
        r"^/forum/threads/.*/page-",
        r"^/forum/threads/.*/latest",
        r"^/forum/threads/\d+$",
        r"/login",
        r"/register",
        r"/account/",
        r"/sign-in",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect();
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub data_dir: PathBuf,
    /// Sites crawled from their root, following same-origin links.
    pub spider_sites: Vec<Url>,
    /// RSS feeds whose item links are fetched without following.
    pub feeds: Vec<Url>,
    /// Single pages fetched without following.
    pub extra_pages: Vec<Url>,
    pub delay: Duration,
    pub max_pages: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub respect_robots: bool,
}

impl CrawlConfig {
    /// The default knowledge-base sources with polite defaults, writing into `data_dir`.
    pub fn with_default_sources(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            data_dir: data_dir.into(),
            spider_sites: parse_urls(DEFAULT_SPIDER_SITES)?,
            feeds: parse_urls(DEFAULT_FEEDS)?,
            extra_pages: parse_urls(DEFAULT_PAGES)?,
            delay: Duration::from_millis(1500),
            max_pages: 5000,
            timeout: Duration::from_secs(12),
            user_agent: "kb-crawler/0.1".to_string(),
            respect_robots: true,
        })
    }
}

/// Parse seed URLs, falling back to `https://` for bare hosts.
pub fn parse_urls<I, S>(raw: I) -> Result<Vec<Url>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| {
            let s = s.as_ref().trim();
            Url::parse(s)
                .or_else(|_| Url::parse(&format!("https://{s}")))
                .with_context(|| format!("invalid url {s:?}"))
        })
        .collect()
}

/// One crawled page as written to the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFile {
    pub url: String,
    pub path: String,
    pub title: String,
    pub text: String,
    pub crawled_at: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub visited: usize,
    pub saved: usize,
    pub failed: usize,
}

#[derive(Debug)]
struct QueueItem {
    url: Url,
    follow: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Robots {
    allows: Vec<String>,
    disallows: Vec<String>,
    crawl_delay_ms: Option<u64>,
}

pub async fn crawl(cfg: &CrawlConfig) -> Result<CrawlSummary> {
    fs::create_dir_all(&cfg.data_dir).with_context(|| format!("creating {}", cfg.data_dir.display()))?;
    let client = Client::builder()
        .user_agent(cfg.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(cfg.timeout)
        .build()?;

    let mut queue: VecDeque<QueueItem> = VecDeque::new();
    let mut queued: HashSet<String> = HashSet::new();
    let mut enqueue = |queue: &mut VecDeque<QueueItem>, url: Url, follow: bool| {
        if queued.insert(url.to_string()) {
            queue.push_back(QueueItem { url, follow });
        }
    };

    for site in &cfg.spider_sites {
        enqueue(&mut queue, clean_url(site), true);
    }
    for feed in &cfg.feeds {
        let links = match fetch_feed_links(&client, feed).await {
            Ok(links) => links,
            Err(err) => {
                tracing::warn!(%feed, error = %format!("{err:#}"), "rss fetch failed");
                continue;
            }
        };
        tracing::info!(%feed, found = links.len(), "rss feed");
        for link in links {
            if !is_skipped(link.path()) {
                enqueue(&mut queue, link, false);
            }
        }
    }
    for page in &cfg.extra_pages {
        enqueue(&mut queue, clean_url(page), false);
    }

    tracing::info!(
        spider_sites = cfg.spider_sites.len(),
        feeds = cfg.feeds.len(),
        extra_pages = cfg.extra_pages.len(),
        data_dir = %cfg.data_dir.display(),
        "starting crawl"
    );

    let mut robots_cache: HashMap<String, Robots> = HashMap::new();
    let mut summary = CrawlSummary::default();
    while let Some(item) = queue.pop_front() {
        if summary.visited >= cfg.max_pages {
            tracing::info!(max_pages = cfg.max_pages, "page limit reached");
            break;
        }
        summary.visited += 1;

        let mut delay = cfg.delay;
        if cfg.respect_robots {
            let rules = robots_for(&client, &mut robots_cache, &item.url).await;
            if !path_allowed(item.url.path(), &rules) {
                tracing::info!(url = %item.url, "disallowed by robots.txt");
                continue;
            }
            if let Some(ms) = rules.crawl_delay_ms {
                delay = delay.max(Duration::from_millis(ms));
            }
        }

        tracing::info!(url = %item.url, "crawling");
        match crawl_page(&client, &item.url, cfg).await {
            Ok(Some(links)) => {
                summary.saved += 1;
                if item.follow {
                    for link in links {
                        if !is_skipped(link.path()) {
                            enqueue(&mut queue, link, true);
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(url = %item.url, error = %format!("{err:#}"), "crawl failed");
            }
        }

        if !queue.is_empty() {
            sleep(delay).await;
        }
    }

    tracing::info!(visited = summary.visited, saved = summary.saved, failed = summary.failed, "crawl complete");
    Ok(summary)
}

/// Fetch one page and write its page file. Returns the same-origin links on the
/// page, or `None` when the response was skipped (non-2xx, not HTML, too large).
async fn crawl_page(client: &Client, url: &Url, cfg: &CrawlConfig) -> Result<Option<Vec<Url>>> {
    let resp = client.get(url.clone()).send().await?;
    if !resp.status().is_success() {
        tracing::info!(%url, status = %resp.status(), "skipped");
        return Ok(None);
    }
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.contains("text/html") {
        tracing::info!(%url, content_type = %content_type, "skipped, not html");
        return Ok(None);
    }
    let bytes = resp.bytes().await?;
    if bytes.len() > MAX_PAGE_BYTES {
        tracing::info!(%url, bytes = bytes.len(), "skipped, too large");
        return Ok(None);
    }
    let html = String::from_utf8_lossy(&bytes);

    let doc = Html::parse_document(&html);
    let links = extract_links(&doc, url);
    let (title, text) = extract_content(&doc);

    let page = PageFile {
        url: url.to_string(),
        path: url.path().to_string(),
        title,
        text,
        crawled_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
    };
    let file = cfg.data_dir.join(page_file_name(url));
    fs::write(&file, serde_json::to_string_pretty(&page)?).with_context(|| format!("writing {}", file.display()))?;
    tracing::info!(file = %file.display(), chars = page.text.len(), "saved");
    Ok(Some(links))
}

async fn fetch_feed_links(client: &Client, feed: &Url) -> Result<Vec<Url>> {
    let resp = client.get(feed.clone()).send().await?.error_for_status()?;
    let xml = resp.bytes().await?;
    feed_links(&xml)
}

async fn robots_for(client: &Client, cache: &mut HashMap<String, Robots>, url: &Url) -> Robots {
    let host = url.host_str().unwrap_or_default().to_string();
    if let Some(rules) = cache.get(&host) {
        return rules.clone();
    }
    let robots_url = format!("{}://{}/robots.txt", url.scheme(), host);
    let txt = match client.get(&robots_url).send().await {
        Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
        _ => String::new(),
    };
    let rules = parse_robots(&txt);
    cache.insert(host, rules.clone());
    rules
}

/// Drop query and fragment and any trailing slash, so one page has one key.
pub fn clean_url(url: &Url) -> Url {
    let mut u = url.clone();
    u.set_query(None);
    u.set_fragment(None);
    let trimmed = u.path().trim_end_matches('/').to_string();
    u.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    u
}

pub fn is_skipped(path: &str) -> bool {
    SKIP_PATTERNS.iter().any(|re| re.is_match(path))
}

/// `{host}__{slug}.json` with `www.` dropped and dots in the host replaced.
pub fn page_file_name(url: &Url) -> String {
    let host = url.host_str().unwrap_or("unknown");
    let host = host.strip_prefix("www.").unwrap_or(host).replace('.', "_");
    let path = clean_url(url).path().to_string();
    let slug: String = if path == "/" {
        "index".to_string()
    } else {
        path.strip_prefix('/')
            .unwrap_or(&path)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect()
    };
    format!("{host}__{slug}.json")
}

/// Same-origin http(s) links on the page, cleaned, in document order.
pub fn extract_links(doc: &Html, page_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    doc.select(&SEL_A)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| page_url.join(href).ok())
        .filter(|u| u.scheme().starts_with("http") && u.origin() == page_url.origin())
        .map(|u| clean_url(&u))
        .filter(|u| seen.insert(u.to_string()))
        .collect()
}

/// Page title and visible body text, whitespace squeezed.
pub fn extract_content(doc: &Html) -> (String, String) {
    let title = doc
        .select(&SEL_TITLE)
        .next()
        .map(|n| n.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut raw = String::new();
    if let Some(body) = doc.select(&SEL_BODY).next() {
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else { continue };
            let hidden = node.ancestors().any(|a| {
                a.value().as_element().map_or(false, |e| EXCLUDED_ELEMENTS.contains(&e.name()))
            });
            if !hidden {
                raw.push_str(text);
            }
        }
    }
    (title, collapse_whitespace(&raw))
}

pub fn collapse_whitespace(text: &str) -> String {
    let squeezed = HSPACE.replace_all(text, " ");
    BLANK_LINES.replace_all(&squeezed, "\n").trim().to_string()
}

/// `<link>` values of every `<item>` in an RSS document. Items without a
/// parseable absolute link are dropped.
pub fn feed_links(xml: &[u8]) -> Result<Vec<Url>> {
    let channel = rss::Channel::read_from(xml).context("parsing rss feed")?;
    Ok(channel
        .items()
        .iter()
        .filter_map(|item| item.link())
        .filter_map(|link| Url::parse(link.trim()).ok())
        .map(|u| clean_url(&u))
        .collect())
}

pub fn parse_robots(txt: &str) -> Robots {
    // only the '*' group
    let mut active = false;
    let mut rules = Robots::default();
    for line in txt.lines() {
        let l = line.trim();
        if l.is_empty() || l.starts_with('#') { continue; }
        if let Some((k, v)) = l.split_once(':') {
            let val = v.trim();
            match k.trim().to_lowercase().as_str() {
                "user-agent" => active = val == "*",
                "allow" if active && !val.is_empty() => rules.allows.push(val.to_string()),
                "disallow" if active && !val.is_empty() => rules.disallows.push(val.to_string()),
                "crawl-delay" if active => {
                    if let Ok(n) = val.parse::<f64>() { rules.crawl_delay_ms = Some((n * 1000.0) as u64); }
                }
                _ => {}
            }
        }
    }
    rules
}

/// Longest matching rule wins; Allow wins ties.
pub fn path_allowed(path: &str, rules: &Robots) -> bool {
    let longest = |prefixes: &[String]| prefixes.iter().filter(|p| path.starts_with(p.as_str())).map(String::len).max();
    match (longest(rules.allows.as_slice()), longest(rules.disallows.as_slice())) {
        (Some(a), Some(d)) => a >= d,
        (_, None) => true,
        (None, Some(_)) => false,
    }
}
