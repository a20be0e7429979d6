//! Version selection.
//!
//! Picks the versions of an extension to download: one winner per platform
//! bucket after filtering, or a single fallback-platform version when no
//! bucket survives the platform filter.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use extmirror_core::{
    EngineMatch, FilterOptions, TargetPlatform, VersionKey, VersionRecord, engine_matches,
};

/// Select the versions to download under `filters`.
///
/// The result is sorted by precedence (highest first) and does not depend
/// on the order of `versions`.
pub fn select(versions: &[VersionRecord], filters: &FilterOptions) -> Vec<VersionRecord> {
    let engine = filters.required_engine_version.as_deref().and_then(|raw| {
        let parsed = VersionKey::parse(raw).map(|k| k.to_semver());
        if parsed.is_none() {
            warn!(engine = raw, "Unparseable engine version, not filtering by engine");
        }
        parsed
    });

    let mut winners: BTreeMap<TargetPlatform, &VersionRecord> = BTreeMap::new();
    let mut fallback: Option<&VersionRecord> = None;

    for version in versions {
        if version.prerelease && !filters.include_prerelease {
            continue;
        }

        if let (Some(engine), Some(constraint)) = (&engine, version.engine.as_deref()) {
            match engine_matches(constraint, engine) {
                EngineMatch::Compatible => {}
                EngineMatch::Incompatible => {
                    debug!(version = %version.version, constraint, "Engine constraint not satisfied");
                    continue;
                }
                EngineMatch::InvalidConstraint => {
                    warn!(
                        version = %version.version,
                        constraint,
                        "Unparseable engine constraint, skipping version"
                    );
                    continue;
                }
            }
        }

        let platform = version.target_platform;
        if filters.target_platform_fallback == Some(platform) {
            fallback = Some(higher(fallback, version));
        }

        if filters.accepts_platform(platform) {
            let slot = winners.entry(platform).or_insert(version);
            *slot = higher(Some(*slot), version);
        }
    }

    let mut selected: Vec<VersionRecord> = if winners.is_empty() {
        fallback.into_iter().cloned().collect()
    } else {
        winners.into_values().cloned().collect()
    };
    selected.sort_by(|a, b| b.cmp_precedence(a));
    selected
}

fn higher<'a>(current: Option<&'a VersionRecord>, candidate: &'a VersionRecord) -> &'a VersionRecord {
    match current {
        Some(current) if current.cmp_precedence(candidate).is_ge() => current,
        _ => candidate,
    }
}
