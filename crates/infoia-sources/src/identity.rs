use infoia_core::{IdentityStrategy, ItemId};
use sha2::{Digest, Sha256};

/// Derive the dedup identity of an item.
///
/// The result is a lowercase hex SHA-256 over the source id and the
/// strategy's key, so equal inputs always give equal identities across runs.
#[must_use]
pub fn derive_identity(
    source_id: &str,
    strategy: IdentityStrategy,
    canonical_url: &str,
    title: &str,
) -> ItemId {
    let key = match strategy {
        IdentityStrategy::Url => canonical_url.to_string(),
        IdentityStrategy::Title => normalize_title(title),
    };

    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(key.as_bytes());
    ItemId::new(format!("{:x}", hasher.finalize()))
}

fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
