// src/classify/structured.rs
// =============================================================================
// Collects schema.org types from parsed JSON-LD.
//
// JSON-LD can nest types anywhere: top-level objects, arrays of objects,
// `@graph` lists, or properties like `author` and `mainEntity`. We walk the
// whole value tree and pick up every `@type`, stopping at a fixed depth so a
// pathological document cannot recurse forever.
// =============================================================================

use serde_json::Value;

/// Deepest nesting level the visitor descends into
pub const MAX_DEPTH: usize = 32;

/// Appends every `@type` found in `value` to `types`, skipping duplicates
pub fn collect_types(value: &Value, types: &mut Vec<String>) {
    visit(value, types, 0);
}

fn visit(value: &Value, types: &mut Vec<String>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }

    match value {
        Value::Object(map) => {
            if let Some(tag) = map.get("@type") {
                match tag {
                    Value::String(name) => push_type(types, name),
                    Value::Array(names) => {
                        for name in names.iter().filter_map(Value::as_str) {
                            push_type(types, name);
                        }
                    }
                    _ => {}
                }
            }
            for (key, child) in map {
                if key != "@type" {
                    visit(child, types, depth + 1);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                visit(item, types, depth + 1);
            }
        }
        _ => {}
    }
}

// "https://schema.org/Article" and "schema:Article" both become "Article"
fn push_type(types: &mut Vec<String>, raw: &str) {
    let name = raw
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(raw)
        .trim();
    if !name.is_empty() && !types.iter().any(|t| t == name) {
        types.push(name.to_string());
    }
}
