//! Extract stage: parses raw HTML, runs configured CSS-selector rules, and
//! opportunistically pulls structured (JSON-LD) and media data.

use super::value::Value;
use crate::error::CoreError;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SelectorRule {
    pub name: String,
    pub css_selector: String,
    pub attribute: Option<String>,
    pub multiple: bool,
}

fn node_value(el: scraper::ElementRef, attribute: &Option<String>) -> String {
    match attribute {
        Some(attr) => el.value().attr(attr).unwrap_or_default().to_string(),
        None => el.text().collect::<Vec<_>>().join("").trim().to_string(),
    }
}

pub fn extract(raw: &str, rules: &[SelectorRule]) -> Result<BTreeMap<String, Value>, CoreError> {
    let document = Html::parse_document(raw);
    let mut extracted = BTreeMap::new();

    for rule in rules {
        let selector = Selector::parse(&rule.css_selector)
            .map_err(|e| CoreError::Config(format!("invalid selector '{}': {e:?}", rule.css_selector)))?;

        if rule.multiple {
            let values: Vec<Value> = document
                .select(&selector)
                .map(|el| Value::String(node_value(el, &rule.attribute)))
                .collect();
            extracted.insert(rule.name.clone(), Value::List(values));
        } else if let Some(el) = document.select(&selector).next() {
            extracted.insert(rule.name.clone(), Value::String(node_value(el, &rule.attribute)));
        }
    }

    if let Some(structured) = extract_json_ld(&document) {
        extracted.insert("structured".to_string(), structured);
    }

    let media = extract_media(&document);
    if !media.is_empty() {
        extracted.insert("media".to_string(), Value::List(media));
    }

    Ok(extracted)
}

fn extract_json_ld(document: &Html) -> Option<Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for el in document.select(&selector) {
        let text: String = el.text().collect();
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => return json_to_value(json),
            Err(e) => debug!("json-ld parse failed, skipping: {e}"),
        }
    }
    None
}

fn json_to_value(json: serde_json::Value) -> Option<Value> {
    serde_json::from_value(json).ok()
}

fn extract_media(document: &Html) -> Vec<Value> {
    let mut media = Vec::new();
    let specs: &[(&str, &str)] = &[("img", "img"), ("video", "video, video source"), ("audio", "audio, audio source")];
    for (kind, selector_str) in specs {
        let Ok(selector) = Selector::parse(selector_str) else { continue };
        for el in document.select(&selector) {
            if let Some(src) = el.value().attr("src") {
                let mut map = BTreeMap::new();
                map.insert("kind".to_string(), Value::String((*kind).to_string()));
                map.insert("url".to_string(), Value::String(src.to_string()));
                media.push(Value::Map(map));
            }
        }
    }
    media
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_and_multiple_selectors() {
        let html = r#"<html><body><h1 class="title">Hello</h1><ul><li>a</li><li>b</li></ul></body></html>"#;
        let rules = vec![
            SelectorRule { name: "title".into(), css_selector: ".title".into(), attribute: None, multiple: false },
            SelectorRule { name: "items".into(), css_selector: "li".into(), attribute: None, multiple: true },
        ];
        let extracted = extract(html, &rules).unwrap();
        assert_eq!(extracted.get("title"), Some(&Value::String("Hello".to_string())));
        assert_eq!(
            extracted.get("items"),
            Some(&Value::List(vec![Value::String("a".to_string()), Value::String("b".to_string())]))
        );
    }

    #[test]
    fn collects_media_sources() {
        let html = r#"<html><body><img src="a.png"><video src="b.mp4"></video></body></html>"#;
        let extracted = extract(html, &[]).unwrap();
        let Value::List(media) = extracted.get("media").unwrap() else { panic!("expected list") };
        assert_eq!(media.len(), 2);
    }

    #[test]
    fn invalid_selector_is_a_config_error() {
        let rules = vec![SelectorRule { name: "bad".into(), css_selector: "[[".into(), attribute: None, multiple: false }];
        assert!(extract("<html></html>", &rules).is_err());
    }
}
