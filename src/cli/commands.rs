//! CLI command implementations.

use std::time::Duration;

use serde_json::Value;

use crate::config::Config;
use crate::engine::StoreEngine;
use crate::types::{Record, StoreError, StoreResult};
use crate::uid::UidValidator;

/// Print a fresh identifier.
pub fn cmd_new_id(config: &Config, json: bool) -> StoreResult<()> {
    let uid = config.uid_generator()?.new_uid();
    if json {
        println!("{}", serde_json::json!({ "id": uid }));
    } else {
        println!("{}", uid);
    }
    Ok(())
}

/// Validate an identifier without touching any storage.
pub fn cmd_check(config: &Config, uid: &str, json: bool) -> StoreResult<()> {
    let generator = config.uid_generator()?;
    let result = generator.validate(uid);
    if json {
        let info = serde_json::json!({
            "id": uid,
            "valid": result.is_ok(),
            "normalized": result.as_ref().ok(),
        });
        println!("{}", info);
    } else if let Ok(normalized) = &result {
        println!("{:?} is valid (normalized: {})", uid, normalized);
    }
    result.map(|_| ())
}

/// Write a record. `ttl_secs == 0` stores it durably.
///
/// This is the only command that creates a missing data directory.
pub fn cmd_put(
    config: &Config,
    uid: Option<&str>,
    payload: &str,
    ttl_secs: u64,
    json: bool,
) -> StoreResult<()> {
    let mut config = config.clone();
    config.data.create = true;
    let engine = StoreEngine::open(&config)?;
    let uid = match uid {
        Some(uid) => uid.to_string(),
        None => engine.uid().new_uid(),
    };
    let payload: Value =
        serde_json::from_str(payload).map_err(|e| StoreError::serialization(&uid, e))?;
    let ttl = Duration::from_secs(ttl_secs);

    engine.store().put(&uid, &payload, Some(ttl))?;

    if ttl_secs > 0 {
        log::warn!(
            "Record {} is cache-only and disappears when this process exits",
            uid
        );
    }

    if json {
        println!(
            "{}",
            serde_json::json!({ "id": uid, "durable": ttl_secs == 0 })
        );
    } else if ttl_secs == 0 {
        println!("Stored {} in {}", uid, engine.persistent().root().display());
    } else {
        println!("Cached {} for {}s", uid, ttl_secs);
    }
    Ok(())
}

/// Bootstrap and read a record from the memory tier.
pub fn cmd_get(config: &Config, uid: &str, json: bool) -> StoreResult<()> {
    let engine = StoreEngine::open(config)?;
    let record = engine.store().get(uid)?;

    if json {
        print_json(&record_json(uid, &record)?);
    } else {
        println!("Record {}", uid);
        println!("  Created: {}", format_timestamp(&record));
        println!("  TTL: {}", format_ttl(record.ttl, record.is_durable()));
        println!(
            "  Payload: {}",
            serde_json::to_string_pretty(&record.payload).unwrap_or_default()
        );
    }
    Ok(())
}

/// Bootstrap and list every recovered record.
pub fn cmd_list(config: &Config, json: bool) -> StoreResult<()> {
    let engine = StoreEngine::open(config)?;
    let mut rows = Vec::new();
    for uid in engine.memory().uids() {
        // A record may expire between listing and reading; skip it.
        if let Ok(record) = engine.store().get(&uid) {
            rows.push((uid, record));
        }
    }

    if json {
        let items = rows
            .iter()
            .map(|(uid, r)| record_json(uid, r))
            .collect::<StoreResult<Vec<Value>>>()?;
        print_json(&Value::Array(items));
    } else if rows.is_empty() {
        println!("No records in {}", engine.persistent().root().display());
    } else {
        for (uid, record) in &rows {
            println!("{}  {}", uid, format_timestamp(record));
        }
    }
    Ok(())
}

/// Bootstrap and summarize the store.
pub fn cmd_stats(config: &Config, json: bool) -> StoreResult<()> {
    let engine = StoreEngine::open(config)?;
    let report = engine.report();
    let default_ttl = engine.memory().default_ttl();

    if json {
        print_json(&serde_json::json!({
            "data_path": engine.persistent().root().display().to_string(),
            "loaded": report.loaded,
            "cached": engine.memory().len(),
            "default_ttl_secs": default_ttl.as_secs(),
            "uid_format": engine.uid().format(),
        }));
    } else {
        println!("Store Statistics:");
        println!("  Data path: {}", engine.persistent().root().display());
        println!("  Records loaded: {}", report.loaded);
        println!("  Records cached: {}", engine.memory().len());
        println!("  Default TTL: {}", format_ttl(default_ttl, false));
        println!("  UID format: {}", engine.uid().format());
    }
    Ok(())
}

fn record_json(uid: &str, record: &Record) -> StoreResult<Value> {
    let mut value = serde_json::to_value(record).map_err(|e| StoreError::serialization(uid, e))?;
    if let Value::Object(map) = &mut value {
        map.insert("id".to_string(), Value::from(uid));
        map.insert("durable".to_string(), Value::from(record.is_durable()));
    }
    Ok(value)
}

fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

fn format_timestamp(record: &Record) -> String {
    record.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_ttl(ttl: Duration, durable: bool) -> String {
    if durable {
        return "forever".to_string();
    }
    let secs = ttl.as_secs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ttl() {
        assert_eq!(format_ttl(Duration::ZERO, true), "forever");
        assert_eq!(format_ttl(Duration::from_secs(42), false), "42s");
        assert_eq!(format_ttl(Duration::from_secs(125), false), "2m 5s");
        assert_eq!(format_ttl(Duration::from_secs(86_400), false), "24h 0m");
    }

    #[test]
    fn test_record_json_fields() {
        let created_at = chrono::DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let record = Record {
            payload: serde_json::json!({"title": "t"}),
            created_at,
            ttl: Duration::from_secs(90),
        };

        let value = record_json("ABC", &record).unwrap();
        assert_eq!(value["id"], "ABC");
        assert_eq!(value["durable"], false);
        assert_eq!(value["ttl_secs"], 90);
        assert_eq!(value["payload"]["title"], "t");
        assert_eq!(value["created_at"], "2024-05-01T12:00:00Z");
    }
}
