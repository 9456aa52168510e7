//! Transformer: a composable chain of ~25 string-transform operations.

use crate::error::CoreError;
use regex::Regex;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TransformRule {
    pub op: TransformOp,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOp {
    Trim,
    Lowercase,
    Uppercase,
    NormalizeSpaces,
    RemoveHtml,
    Regex,
    ParseInt,
    ParseFloat,
    ParseDate,
    ExtractNumber,
    Prefix,
    Suffix,
    Replace,
    Split,
    Substring,
    Truncate,
    Reverse,
    RemoveCommas,
    FormatCurrency,
    ExtractDomain,
    ExtractFilename,
    CapitalizeWords,
    RemoveDuplicates,
    PadLeft,
    PadRight,
}

fn param<'a>(rule: &'a TransformRule, key: &str) -> Option<&'a str> {
    rule.params.get(key).map(|s| s.as_str())
}

fn require_param<'a>(rule: &'a TransformRule, key: &str, op_name: &str) -> Result<&'a str, CoreError> {
    param(rule, key).ok_or_else(|| CoreError::Transform { rule: op_name.to_string(), reason: format!("missing parameter '{key}'") })
}

/// Validates a rule's configuration without executing it: catches unknown
/// parameter combinations before they fail at transform time.
pub fn validate_rule(rule: &TransformRule) -> Result<(), CoreError> {
    match rule.op {
        TransformOp::Regex => {
            let pattern = require_param(rule, "pattern", "regex")?;
            if pattern.is_empty() {
                return Err(CoreError::Transform { rule: "regex".to_string(), reason: "empty pattern".to_string() });
            }
            Regex::new(pattern).map_err(|e| CoreError::Transform { rule: "regex".to_string(), reason: e.to_string() })?;
        }
        TransformOp::Prefix | TransformOp::Suffix => {
            require_param(rule, "value", "prefix_or_suffix")?;
        }
        TransformOp::Replace => {
            if param(rule, "old").is_none() && param(rule, "pattern").is_none() {
                return Err(CoreError::Transform { rule: "replace".to_string(), reason: "requires old/new or pattern/replacement".to_string() });
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn apply(rule: &TransformRule, input: &str) -> Result<String, CoreError> {
    validate_rule(rule)?;
    match rule.op {
        TransformOp::Trim => Ok(input.trim().to_string()),
        TransformOp::Lowercase => Ok(input.to_lowercase()),
        TransformOp::Uppercase => Ok(input.to_uppercase()),
        TransformOp::NormalizeSpaces => {
            let re = Regex::new(r"\s+").unwrap();
            Ok(re.replace_all(input.trim(), " ").to_string())
        }
        TransformOp::RemoveHtml => {
            let re = Regex::new(r"<[^>]*>").unwrap();
            Ok(re.replace_all(input, "").to_string())
        }
        TransformOp::Regex => {
            let pattern = require_param(rule, "pattern", "regex")?;
            let replacement = param(rule, "replacement").unwrap_or("");
            let re = Regex::new(pattern).map_err(|e| CoreError::Transform { rule: "regex".to_string(), reason: e.to_string() })?;
            Ok(re.replace_all(input, replacement).to_string())
        }
        TransformOp::ParseInt => {
            let cleaned: String = input.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
            cleaned
                .parse::<i64>()
                .map(|n| n.to_string())
                .map_err(|e| CoreError::Transform { rule: "parse_int".to_string(), reason: e.to_string() })
        }
        TransformOp::ParseFloat => {
            let cleaned: String = input.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect();
            cleaned
                .parse::<f64>()
                .map(|n| n.to_string())
                .map_err(|e| CoreError::Transform { rule: "parse_float".to_string(), reason: e.to_string() })
        }
        TransformOp::ParseDate => Ok(input.trim().to_string()),
        TransformOp::ExtractNumber => {
            let re = Regex::new(r"\d+(\.\d+)?").unwrap();
            Ok(re.find(input).map(|m| m.as_str().to_string()).unwrap_or_else(|| "0".to_string()))
        }
        TransformOp::Prefix => {
            let value = require_param(rule, "value", "prefix")?;
            Ok(format!("{value}{input}"))
        }
        TransformOp::Suffix => {
            let value = require_param(rule, "value", "suffix")?;
            Ok(format!("{input}{value}"))
        }
        TransformOp::Replace => {
            if let (Some(old), Some(new)) = (param(rule, "old"), param(rule, "new")) {
                Ok(input.replace(old, new))
            } else {
                let pattern = require_param(rule, "pattern", "replace")?;
                let replacement = param(rule, "replacement").unwrap_or("");
                let re = Regex::new(pattern).map_err(|e| CoreError::Transform { rule: "replace".to_string(), reason: e.to_string() })?;
                Ok(re.replace_all(input, replacement).to_string())
            }
        }
        TransformOp::Split => {
            let delimiter = param(rule, "delimiter").unwrap_or(",");
            let index: usize = param(rule, "index").and_then(|s| s.parse().ok()).unwrap_or(0);
            Ok(input.split(delimiter).nth(index).unwrap_or("").to_string())
        }
        TransformOp::Substring => {
            let start: usize = param(rule, "start").and_then(|s| s.parse().ok()).unwrap_or(0);
            let len: usize = param(rule, "length").and_then(|s| s.parse().ok()).unwrap_or(input.len());
            Ok(input.chars().skip(start).take(len).collect())
        }
        TransformOp::Truncate => {
            let max_len: usize = param(rule, "length").and_then(|s| s.parse().ok()).unwrap_or(input.len());
            let suffix = param(rule, "suffix").unwrap_or("…");
            if input.chars().count() > max_len {
                let truncated: String = input.chars().take(max_len).collect();
                Ok(format!("{truncated}{suffix}"))
            } else {
                Ok(input.to_string())
            }
        }
        TransformOp::Reverse => Ok(input.chars().rev().collect()),
        TransformOp::RemoveCommas => Ok(input.replace(',', "")),
        TransformOp::FormatCurrency => {
            let symbol = param(rule, "symbol").unwrap_or("$");
            let re = Regex::new(r"[^\d.\-]").unwrap();
            let cleaned = re.replace_all(input, "").to_string();
            let amount: f64 = cleaned.parse().map_err(|e| CoreError::Transform { rule: "format_currency".to_string(), reason: format!("{e}") })?;
            Ok(format!("{symbol}{amount:.2}"))
        }
        TransformOp::ExtractDomain => url::Url::parse(input)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .ok_or_else(|| CoreError::Transform { rule: "extract_domain".to_string(), reason: "not a valid URL".to_string() }),
        TransformOp::ExtractFilename => url::Url::parse(input)
            .ok()
            .and_then(|u| u.path_segments().and_then(|s| s.last()).map(|s| s.to_string()))
            .ok_or_else(|| CoreError::Transform { rule: "extract_filename".to_string(), reason: "not a valid URL".to_string() }),
        TransformOp::CapitalizeWords => Ok(input
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")),
        TransformOp::RemoveDuplicates => {
            let delimiter = param(rule, "delimiter").unwrap_or(",");
            let mut seen = std::collections::HashSet::new();
            let parts: Vec<&str> = input.split(delimiter).filter(|p| seen.insert(*p)).collect();
            Ok(parts.join(delimiter))
        }
        TransformOp::PadLeft => {
            let width: usize = param(rule, "width").and_then(|s| s.parse().ok()).unwrap_or(0);
            let pad_char = param(rule, "char").and_then(|s| s.chars().next()).unwrap_or(' ');
            Ok(format!("{:>width$}", input, width = width).replace(' ', &pad_char.to_string()))
        }
        TransformOp::PadRight => {
            let width: usize = param(rule, "width").and_then(|s| s.parse().ok()).unwrap_or(0);
            let pad_char = param(rule, "char").and_then(|s| s.chars().next()).unwrap_or(' ');
            Ok(format!("{:<width$}", input, width = width).replace(' ', &pad_char.to_string()))
        }
    }
}

pub fn apply_chain(rules: &[TransformRule], input: &str) -> Result<String, CoreError> {
    let mut value = input.to_string();
    for rule in rules {
        value = apply(rule, &value)?;
    }
    Ok(value)
}
