//! Marketplace URL handling: product ids, share-link detection, fallback affiliate links and embedded metadata.
use log::*;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;

static SHOPEE_SLUG_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"shopee\.[a-z.]+/.*-i\.(\d+)\.(\d+)").expect("static regex"));
static SHOPEE_PRODUCT_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"shopee\.[a-z.]+/product/(\d+)/(\d+)").expect("static regex"));
static TIKTOK_PRODUCT_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/product/(\d+)").expect("static regex"));
static TIKTOK_PRODUCT_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"product_id=(\d+)").expect("static regex"));

/// Hosts that only redirect to the real product page.
pub const SHORT_LINK_HOSTS: [&str; 4] = ["vt.tiktok.com", "vm.tiktok.com", "shp.ee", "s.shopee.vn"];

/// Query parameters that bloat TikTok share links without affecting where they lead.
pub const TIKTOK_NOISE_PARAMS: [&str; 5] = ["_svg", "checksum", "encode_params", "_r", "sec_uid"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopeeProductRef {
    pub shop_id: String,
    pub item_id: String,
}

/// Finds the shop and item ids in a Shopee product URL. Both the `…-i.<shop>.<item>` slug form and the
/// `/product/<shop>/<item>` form are recognised, as are `shopid`/`itemid` query parameters.
pub fn shopee_product_ref(url: &str) -> Option<ShopeeProductRef> {
    for pattern in [&*SHOPEE_SLUG_ID, &*SHOPEE_PRODUCT_PATH] {
        if let Some(caps) = pattern.captures(url) {
            return Some(ShopeeProductRef { shop_id: caps[1].to_string(), item_id: caps[2].to_string() });
        }
    }
    let parsed = Url::parse(url).ok()?;
    let param = |names: [&str; 2]| {
        parsed.query_pairs().find(|(k, _)| names.contains(&k.as_ref())).map(|(_, v)| v.into_owned())
    };
    let shop_id = param(["shopid", "shop"])?;
    let item_id = param(["itemid", "item"])?;
    Some(ShopeeProductRef { shop_id, item_id })
}

/// Finds the product id in a TikTok Shop URL (`/product/<id>`, `/view/product/<id>`, `@shop/product/<id>` or a
/// `product_id=<id>` parameter).
pub fn tiktok_product_id(url: &str) -> Option<String> {
    [&*TIKTOK_PRODUCT_PATH, &*TIKTOK_PRODUCT_PARAM]
        .iter()
        .find_map(|pattern| pattern.captures(url).map(|caps| caps[1].to_string()))
}

pub fn is_short_link(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .map(|host| SHORT_LINK_HOSTS.contains(&host.as_str()))
        .unwrap_or(false)
}

/// A trackable TikTok link built without the affiliate API: the product URL with our `affiliate_id` and the tracking id
/// as `sub1`, minus the share-link noise.
pub fn tiktok_fallback_link(resolved_url: &str, app_key: &str, tracking_id: Option<&str>) -> String {
    let tracking_id = tracking_id.filter(|s| !s.is_empty());
    let Ok(mut url) = Url::parse(resolved_url) else {
        debug!("🔗️ {resolved_url} is not a valid URL. Appending tracking parameters as-is");
        let params = [
            Some(app_key).filter(|k| !k.is_empty()).map(|k| format!("affiliate_id={k}")),
            tracking_id.map(|t| format!("sub1={t}")),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("&");
        if params.is_empty() {
            return resolved_url.to_string();
        }
        let separator = if resolved_url.contains('?') { '&' } else { '?' };
        return format!("{resolved_url}{separator}{params}");
    };
    let mut pairs = url
        .query_pairs()
        .filter(|(k, _)| !TIKTOK_NOISE_PARAMS.contains(&k.as_ref()) && k != "affiliate_id" && k != "sub1")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect::<Vec<_>>();
    if !app_key.is_empty() {
        pairs.push(("affiliate_id".into(), app_key.into()));
    }
    if let Some(t) = tracking_id {
        pairs.push(("sub1".into(), t.into()));
    }
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}

#[derive(Debug, Default, Deserialize)]
struct OgInfo {
    title: Option<String>,
    name: Option<String>,
    image: Option<String>,
    cover: Option<String>,
}

/// TikTok share links carry the product's Open Graph title and image as JSON in an `og_info` parameter.
/// Returns `(title, image)`, or `None` if neither is present.
pub fn og_info(resolved_url: &str) -> Option<(Option<String>, Option<String>)> {
    let url = Url::parse(resolved_url).ok()?;
    let raw = url.query_pairs().find(|(k, _)| k == "og_info").map(|(_, v)| v.into_owned())?;
    let info = serde_json::from_str::<OgInfo>(&raw)
        .map_err(|e| warn!("🔗️ Could not parse og_info. {e}"))
        .ok()?;
    let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
    let title = non_empty(info.title).or_else(|| non_empty(info.name));
    let image = non_empty(info.image).or_else(|| non_empty(info.cover));
    if title.is_none() && image.is_none() {
        return None;
    }
    Some((title, image))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shopee_ids() {
        let expected = Some(ShopeeProductRef { shop_id: "88201679".into(), item_id: "17638112223".into() });
        assert_eq!(shopee_product_ref("https://shopee.vn/Ao-thun-nam-i.88201679.17638112223?sp_atk=x"), expected);
        assert_eq!(shopee_product_ref("https://shopee.vn/product/88201679/17638112223"), expected);
        assert_eq!(shopee_product_ref("https://shopee.vn/universal-link?shopid=88201679&itemid=17638112223"), expected);
        assert_eq!(shopee_product_ref("https://shopee.vn/search?keyword=ao"), None);
        assert_eq!(shopee_product_ref("not a url"), None);
    }

    #[test]
    fn tiktok_ids() {
        assert_eq!(tiktok_product_id("https://shop.tiktok.com/view/product/1729587?region=VN").as_deref(), Some("1729587"));
        assert_eq!(tiktok_product_id("https://www.tiktok.com/@shop/product/1729588").as_deref(), Some("1729588"));
        assert_eq!(tiktok_product_id("https://www.tiktok.com/t/x?product_id=1729589").as_deref(), Some("1729589"));
        assert_eq!(tiktok_product_id("https://www.tiktok.com/@someone/video/123"), None);
    }

    #[test]
    fn short_links() {
        assert!(is_short_link("https://vt.tiktok.com/ZSabc/"));
        assert!(is_short_link("https://VM.tiktok.com/ZSabc/"));
        assert!(is_short_link("https://shp.ee/xyz"));
        assert!(!is_short_link("https://shop.tiktok.com/view/product/1"));
        assert!(!is_short_link("vt.tiktok.com"));
    }

    #[test]
    fn fallback_link_strips_noise() {
        let url = "https://shop.tiktok.com/view/product/1729587?region=VN&_svg=1&checksum=abc&encode_params=zzz&_r=1\
                   &sec_uid=s";
        let link = tiktok_fallback_link(url, "app123", Some("U1"));
        assert_eq!(link, "https://shop.tiktok.com/view/product/1729587?region=VN&affiliate_id=app123&sub1=U1");
        let link = tiktok_fallback_link("https://shop.tiktok.com/view/product/1?_r=1", "", None);
        assert_eq!(link, "https://shop.tiktok.com/view/product/1");
    }

    #[test]
    fn fallback_link_for_unparseable_urls() {
        assert_eq!(tiktok_fallback_link("tiktok product 1", "app", Some("U1")), "tiktok product 1?affiliate_id=app&sub1=U1");
        assert_eq!(tiktok_fallback_link("tiktok?x=1", "", Some("U1")), "tiktok?x=1&sub1=U1");
    }

    #[test]
    fn og_info_metadata() {
        let _ = env_logger::try_init();
        let url = "https://shop.tiktok.com/view/product/1?og_info=%7B%22title%22%3A%22Son%20m%C3%B4i%22%2C%22image%22%3A%22\
                   https%3A%2F%2Fimg%2Fa.jpg%22%7D";
        let (title, image) = og_info(url).unwrap();
        assert_eq!(title.as_deref(), Some("Son môi"));
        assert_eq!(image.as_deref(), Some("https://img/a.jpg"));
        let url = "https://shop.tiktok.com/view/product/1?og_info=%7B%22name%22%3A%22Kem%22%7D";
        assert_eq!(og_info(url), Some((Some("Kem".to_string()), None)));
        assert_eq!(og_info("https://shop.tiktok.com/view/product/1?og_info=%7B%7D"), None);
        assert_eq!(og_info("https://shop.tiktok.com/view/product/1?og_info=garbage"), None);
        assert_eq!(og_info("https://shop.tiktok.com/view/product/1"), None);
    }
}
