use chrono::{DateTime, Utc};
use infoia_core::{Digest, SourceFailure, SummaryBlock};
use uuid::Uuid;

/// Build the run's [`Digest`] with a fresh run id.
///
/// Blocks are ordered by the fixed category order; entries keep the order
/// they were summarized in. The edition date is the UTC date of
/// `generated_at`.
#[must_use]
pub fn assemble<I>(blocks: I, generated_at: DateTime<Utc>, failures: Vec<SourceFailure>) -> Digest
where
    I: IntoIterator<Item = SummaryBlock>,
{
    let mut blocks: Vec<SummaryBlock> = blocks.into_iter().collect();
    blocks.sort_by_key(|b| b.category);

    Digest {
        run_id: Uuid::new_v4(),
        generated_at,
        edition: generated_at.date_naive(),
        blocks,
        source_failures: failures,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use infoia_core::Category;

    use super::*;

    #[test]
    fn blocks_follow_category_order() {
        let generated_at = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
        let blocks = vec![
            SummaryBlock::empty(Category::Research),
            SummaryBlock::empty(Category::Industry),
            SummaryBlock::empty(Category::Releases),
        ];

        let digest = assemble(blocks, generated_at, Vec::new());

        let order: Vec<Category> = digest.blocks.iter().map(|b| b.category).collect();
        assert_eq!(
            order,
            vec![Category::Industry, Category::Releases, Category::Research]
        );
        assert_eq!(digest.edition, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(digest.generated_at, generated_at);
    }

    #[test]
    fn each_assembly_gets_its_own_run_id() {
        let now = Utc::now();
        let a = assemble(Vec::new(), now, Vec::new());
        let b = assemble(Vec::new(), now, Vec::new());
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn failures_are_carried_through() {
        let failure = SourceFailure {
            source_id: "down".to_string(),
            reason: "unexpected status 500".to_string(),
        };
        let digest = assemble(Vec::new(), Utc::now(), vec![failure.clone()]);
        assert_eq!(digest.source_failures, vec![failure]);
    }
}
