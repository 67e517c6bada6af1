//! Conflict resolution and cache merge algorithms.
//!
//! Three distinct operations with deliberately different semantics:
//!
//! - [`resolve`] reconciles a local and a server record that share an
//!   identity (last-writer-wins with a monotonic counter).
//! - [`merge_server_set`] folds a full server snapshot into the local
//!   cache at hydration time.
//! - [`apply_local_upsert`] applies a direct user action to the cache
//!   (the new values win, no timestamp comparison).

use kudosync_model::{now_epoch_millis, parse_epoch_millis, Exercise};

/// Reconciles a local and a server record sharing an identity.
///
/// The side with the greater-or-equal `updated_at` is *preferred* and
/// its fields overlay the other side's, with three exceptions:
///
/// - `thanks_count` is always `max(local, server)` - the counter is
///   monotonic and must not regress even under a stale overlay.
/// - `server_id` comes from whichever side has one, the server's
///   first - a confirmed id is never forgotten.
/// - `id` stays the local client id, which keys the local cache.
///
/// A missing or unparseable server timestamp counts as "now" (freshest);
/// a missing local timestamp counts as 0 (stalest); ties favor the
/// server. Wall-clock comparison is a known weakness under client clock
/// skew; the server-issued-version alternative is an open design
/// question and this implementation keeps the timestamp rule.
pub fn resolve(local: &Exercise, server: &Exercise) -> Exercise {
    let server_ms = server
        .updated_at
        .as_deref()
        .and_then(parse_epoch_millis)
        .unwrap_or_else(now_epoch_millis);
    let local_ms = local
        .updated_at
        .as_deref()
        .and_then(parse_epoch_millis)
        .unwrap_or(0);

    let (preferred, secondary) = if server_ms >= local_ms {
        (server, local)
    } else {
        (local, server)
    };

    let mut extra = secondary.extra.clone();
    for (key, value) in &preferred.extra {
        extra.insert(key.clone(), value.clone());
    }

    Exercise {
        id: local.id.clone(),
        server_id: server.server_id.clone().or_else(|| local.server_id.clone()),
        created_at: pick_timestamp(&preferred.created_at, &secondary.created_at),
        updated_at: pick_timestamp(&preferred.updated_at, &secondary.updated_at),
        thanks_count: local.thanks_count.max(server.thanks_count),
        extra,
    }
}

/// First non-empty value, preferred side first.
fn pick_timestamp(preferred: &Option<String>, secondary: &Option<String>) -> Option<String> {
    let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
    non_empty(preferred).or_else(|| non_empty(secondary))
}

/// Folds a full server record set into the local cache.
///
/// Seeds the result from the local cache, resolves pairwise where a
/// server record matches an existing entity, and appends unknown server
/// records as-is. Local-only records absent from the server response
/// are kept untouched - they may simply not be synced yet.
pub fn merge_server_set(local: &[Exercise], server: &[Exercise]) -> Vec<Exercise> {
    let mut result = local.to_vec();
    for incoming in server {
        match result.iter().position(|e| e.same_entity(incoming)) {
            Some(pos) => result[pos] = resolve(&result[pos], incoming),
            None => result.push(incoming.clone()),
        }
    }
    result
}

/// Applies an optimistic local write to the cache.
///
/// A direct user action, not a reconciliation: incoming values win for
/// every field they carry, with no timestamp comparison. Fields the
/// incoming record leaves unset (`server_id`, timestamps) keep their
/// cached values. Returns the entry as cached.
pub fn apply_local_upsert(cache: &mut Vec<Exercise>, incoming: &Exercise) -> Exercise {
    match cache.iter_mut().find(|e| e.same_entity(incoming)) {
        Some(existing) => {
            if incoming.server_id.is_some() {
                existing.server_id = incoming.server_id.clone();
            }
            if incoming.created_at.is_some() {
                existing.created_at = incoming.created_at.clone();
            }
            if incoming.updated_at.is_some() {
                existing.updated_at = incoming.updated_at.clone();
            }
            existing.thanks_count = incoming.thanks_count;
            for (key, value) in &incoming.extra {
                existing.extra.insert(key.clone(), value.clone());
            }
            existing.clone()
        }
        None => {
            cache.push(incoming.clone());
            incoming.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(id: &str, updated_at: Option<&str>, thanks: u64) -> Exercise {
        let mut ex = Exercise::new(id);
        ex.updated_at = updated_at.map(String::from);
        ex.thanks_count = thanks;
        ex
    }

    #[test]
    fn fresher_server_side_wins() {
        let local = record("a", Some("2024-01-01T00:00:00Z"), 1)
            .with_field("title", json!("old title"));
        let mut server = record("a", Some("2024-02-01T00:00:00Z"), 10)
            .with_field("title", json!("new title"));
        server.server_id = Some("srv-1".into());

        let merged = resolve(&local, &server);
        assert_eq!(merged.updated_at.as_deref(), Some("2024-02-01T00:00:00Z"));
        assert_eq!(merged.thanks_count, 10);
        assert_eq!(merged.extra["title"], json!("new title"));
        assert_eq!(merged.server_id.as_deref(), Some("srv-1"));
    }

    #[test]
    fn counter_never_regresses_even_when_local_preferred() {
        let local = record("a", Some("2024-03-01T00:00:00Z"), 10);
        let server = record("a", Some("2024-01-01T00:00:00Z"), 3);

        let merged = resolve(&local, &server);
        assert_eq!(merged.thanks_count, 10);
        assert_eq!(merged.updated_at.as_deref(), Some("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn counter_never_regresses_when_server_preferred() {
        let local = record("a", Some("2024-01-01T00:00:00Z"), 10);
        let server = record("a", Some("2024-02-01T00:00:00Z"), 3);

        let merged = resolve(&local, &server);
        assert_eq!(merged.thanks_count, 10);
    }

    #[test]
    fn equal_timestamps_favor_server() {
        let local =
            record("a", Some("2024-01-01T00:00:00Z"), 0).with_field("title", json!("local"));
        let server =
            record("a", Some("2024-01-01T00:00:00Z"), 0).with_field("title", json!("server"));

        let merged = resolve(&local, &server);
        assert_eq!(merged.extra["title"], json!("server"));
    }

    #[test]
    fn missing_server_timestamp_counts_as_freshest() {
        let local = record("a", Some("2024-06-01T00:00:00Z"), 0)
            .with_field("title", json!("local"));
        let server = record("a", None, 0).with_field("title", json!("server"));

        let merged = resolve(&local, &server);
        assert_eq!(merged.extra["title"], json!("server"));
        // The local side still supplies the only non-empty timestamp.
        assert_eq!(merged.updated_at.as_deref(), Some("2024-06-01T00:00:00Z"));
    }

    #[test]
    fn missing_local_timestamp_counts_as_stalest() {
        let local = record("a", None, 0).with_field("title", json!("local"));
        let server = record("a", Some("2000-01-01T00:00:00Z"), 0)
            .with_field("title", json!("server"));

        let merged = resolve(&local, &server);
        assert_eq!(merged.extra["title"], json!("server"));
    }

    #[test]
    fn server_id_is_never_forgotten() {
        let mut local = record("a", Some("2024-03-01T00:00:00Z"), 0);
        local.server_id = Some("srv-1".into());
        let server = record("a", Some("2024-01-01T00:00:00Z"), 0);

        let merged = resolve(&local, &server);
        assert_eq!(merged.server_id.as_deref(), Some("srv-1"));
    }

    #[test]
    fn secondary_fields_survive_where_preferred_lacks_them() {
        let local = record("a", Some("2024-01-01T00:00:00Z"), 0)
            .with_field("description", json!("only local has this"));
        let server = record("a", Some("2024-02-01T00:00:00Z"), 0)
            .with_field("title", json!("server title"));

        let merged = resolve(&local, &server);
        assert_eq!(merged.extra["title"], json!("server title"));
        assert_eq!(merged.extra["description"], json!("only local has this"));
    }

    #[test]
    fn hydration_keeps_local_only_records() {
        let local_only = record("unsynced", Some("2024-01-01T00:00:00Z"), 2);
        let known = record("a", Some("2024-01-01T00:00:00Z"), 1);

        let mut from_server = record("a", Some("2024-02-01T00:00:00Z"), 4);
        from_server.server_id = Some("srv-a".into());

        let merged = merge_server_set(&[local_only.clone(), known], &[from_server]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], local_only);
        assert_eq!(merged[1].thanks_count, 4);
        assert_eq!(merged[1].server_id.as_deref(), Some("srv-a"));
    }

    #[test]
    fn hydration_appends_unknown_server_records() {
        let merged = merge_server_set(&[], &[record("new", Some("2024-01-01T00:00:00Z"), 5)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].thanks_count, 5);
    }

    #[test]
    fn local_upsert_overlays_without_timestamp_comparison() {
        let mut cache = vec![record("a", Some("2024-06-01T00:00:00Z"), 3)
            .with_field("title", json!("old"))];

        // Older timestamp, but a direct user action still wins.
        let incoming = record("a", Some("2024-01-01T00:00:00Z"), 4)
            .with_field("title", json!("edited"));
        apply_local_upsert(&mut cache, &incoming);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].extra["title"], json!("edited"));
        assert_eq!(cache[0].thanks_count, 4);
        assert_eq!(cache[0].updated_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn local_upsert_keeps_known_server_id() {
        let mut existing = record("a", None, 0);
        existing.server_id = Some("srv-1".into());
        let mut cache = vec![existing];

        apply_local_upsert(&mut cache, &record("a", Some("2024-01-01T00:00:00Z"), 1));

        assert_eq!(cache[0].server_id.as_deref(), Some("srv-1"));
    }

    #[test]
    fn local_upsert_appends_new_entities() {
        let mut cache = vec![record("a", None, 0)];
        apply_local_upsert(&mut cache, &record("b", None, 0));
        assert_eq!(cache.len(), 2);
    }

    proptest! {
        #[test]
        fn merged_counter_is_at_least_both_sides(local_thanks in 0u64..1000, server_thanks in 0u64..1000) {
            let local = record("a", Some("2024-01-01T00:00:00Z"), local_thanks);
            let server = record("a", Some("2024-02-01T00:00:00Z"), server_thanks);

            let merged = resolve(&local, &server);
            prop_assert!(merged.thanks_count >= local_thanks);
            prop_assert!(merged.thanks_count >= server_thanks);
        }

        #[test]
        fn server_set_merge_preserves_every_identity(local_ids in proptest::collection::hash_set("[a-d]", 0..4), server_ids in proptest::collection::hash_set("[c-f]", 0..4)) {
            let local: Vec<Exercise> = local_ids.iter().map(|id| record(id, None, 0)).collect();
            let server: Vec<Exercise> = server_ids.iter().map(|id| record(id, None, 0)).collect();

            let merged = merge_server_set(&local, &server);

            for id in local_ids.iter().chain(server_ids.iter()) {
                prop_assert!(merged.iter().any(|e| e.id == *id));
            }
            // No duplicates either.
            let mut keys: Vec<&str> = merged.iter().map(|e| e.merge_key()).collect();
            keys.sort_unstable();
            keys.dedup();
            prop_assert_eq!(keys.len(), merged.len());
        }
    }
}
