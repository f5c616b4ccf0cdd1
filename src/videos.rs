//! 视频列表抓取
//!
//! 向视频列表接口发一次GET请求，把返回的 `vlist` 整理成页面脚本里
//! `defaultVideos` 数组的源码。请求失败不重试，由调用方输出 `{"error": ...}`。

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::FetchError;

pub const DEFAULT_ENDPOINT: &str = "https://api.bilibili.com/x/space/arc/search";
pub const DEFAULT_MID: &str = "510141669";
pub const DEFAULT_PAGE_SIZE: u32 = 30;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub endpoint: String,
    pub mid: String,
    pub page_size: u32,
    /// 播放量 >= 10000 时输出为 `1.2w`
    pub compact_views: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            mid: DEFAULT_MID.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            compact_views: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    list: Option<VideoList>,
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    vlist: Vec<RawVideo>,
}

#[derive(Debug, Deserialize)]
struct RawVideo {
    title: String,
    pic: String,
    length: String,
    /// 可能是数字，也可能是 "--"
    play: Value,
    bvid: String,
}

/// 页面脚本中的一条视频记录
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub id: usize,
    pub title: String,
    pub thumbnail: String,
    pub duration: String,
    /// JS 字面量：字符串或数字
    pub views: Value,
    pub category: String,
    pub kind: String,
    pub bvid: String,
}

/// 发起请求，返回原始JSON
pub async fn fetch_envelope(client: &Client, options: &FetchOptions) -> Result<Value, FetchError> {
    let page_size = options.page_size.to_string();
    info!("🌐 Fetching video list for {}", options.mid);
    debug!("   URL: {}", options.endpoint);

    let response = client
        .get(&options.endpoint)
        .query(&[
            ("mid", options.mid.as_str()),
            ("ps", page_size.as_str()),
            ("tid", "0"),
            ("pn", "1"),
            ("keyword", ""),
            ("order", "pubdate"),
        ])
        .header("User-Agent", USER_AGENT)
        .header("Referer", format!("https://space.bilibili.com/{}/video", options.mid))
        .header("Origin", "https://space.bilibili.com")
        .header("Accept", "application/json, text/plain, */*")
        .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
        .send()
        .await?;

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// 请求并生成输出文本
pub async fn fetch_videos(options: &FetchOptions) -> Result<String, FetchError> {
    let client = Client::new();
    let envelope = fetch_envelope(&client, options).await?;
    render_response(&envelope, options.compact_views)
}

/// `code == 0` 时生成数组源码；其他返回码作为 [`FetchError::Api`] 带回原始内容
pub fn render_response(envelope: &Value, compact_views: bool) -> Result<String, FetchError> {
    let code = envelope.get("code").and_then(Value::as_i64);
    if code != Some(0) {
        return Err(FetchError::Api {
            code,
            body: pretty(envelope),
        });
    }

    let parsed = Envelope::deserialize(envelope)?;
    debug!("Envelope code {}", parsed.code);
    let raw = parsed
        .data
        .and_then(|d| d.list)
        .map(|l| l.vlist)
        .unwrap_or_default();
    let records = to_records(raw, compact_views);
    info!("✅ Got {} videos", records.len());
    Ok(render_js_array(&records))
}

fn to_records(raw: Vec<RawVideo>, compact_views: bool) -> Vec<VideoRecord> {
    raw.into_iter()
        .enumerate()
        .map(|(i, v)| VideoRecord {
            id: i + 1,
            title: v.title,
            thumbnail: secure_url(&v.pic),
            duration: v.length,
            views: format_views(&v.play, compact_views),
            category: "other".to_string(),
            kind: "bilibili".to_string(),
            bvid: v.bvid,
        })
        .collect()
}

/// 缩略图强制使用 https
pub fn secure_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("http:") {
        format!("https:{}", rest)
    } else if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// 播放量字面量
///
/// 默认输出为字符串；compact 模式下不足一万保持数字，一万以上输出 `1.2w`
fn format_views(play: &Value, compact: bool) -> Value {
    match play {
        Value::Number(n) if compact => match n.as_u64() {
            Some(count) if count >= 10_000 => {
                Value::String(format!("{}w", to_fixed_1(count as f64 / 10_000.0)))
            }
            _ => play.clone(),
        },
        Value::Number(n) => Value::String(n.to_string()),
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

/// 与 JS `toFixed(1)` 一致：按 double 的精确值舍入，恰好一半时进位
fn to_fixed_1(x: f64) -> String {
    let exact = format!("{:.60}", x);
    let (int_part, frac) = exact.split_once('.').unwrap_or((exact.as_str(), "0"));
    let mut digits = frac.bytes().map(|b| u64::from(b - b'0'));
    let tenths = digits.next().unwrap_or(0);
    let round_up = digits.next().unwrap_or(0) >= 5;
    let scaled = int_part.parse::<u64>().unwrap_or(0) * 10 + tenths + u64::from(round_up);
    format!("{}.{}", scaled / 10, scaled % 10)
}

/// `const defaultVideos = [...]` 源码
pub fn render_js_array(records: &[VideoRecord]) -> String {
    let mut out = String::from("const defaultVideos = [\n");
    for record in records {
        out.push_str("    {\n");
        out.push_str(&format!("        id: {},\n", record.id));
        out.push_str(&format!("        title: {},\n", js_string(&record.title)));
        out.push_str(&format!("        thumbnail: {},\n", js_string(&record.thumbnail)));
        out.push_str(&format!("        duration: {},\n", js_string(&record.duration)));
        out.push_str(&format!("        views: {},\n", record.views));
        out.push_str(&format!(
            "        category: '{}', // Update category manually if needed\n",
            record.category
        ));
        out.push_str(&format!("        type: '{}',\n", record.kind));
        out.push_str(&format!("        bvid: {}\n", js_string(&record.bvid)));
        out.push_str("    },\n");
    }
    out.push_str("];");
    out
}

fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn error_object(message: &str) -> String {
    pretty(&serde_json::json!({ "error": message }))
}
