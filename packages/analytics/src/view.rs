//! Filtered, sorted projections for region lists and the legend.

use feedback_map_analytics_models::{
    LegendEntry, RegionWithAggregate, SeverityFilter, SeverityTier,
};

use crate::encode::tier_color;

/// Filters regions by a case-insensitive name substring and a tier filter,
/// then sorts by count descending with ties broken by name ascending.
///
/// The search text is matched as given, surrounding whitespace included.
/// An empty search matches every region.
#[must_use]
pub fn project(
    regions: &[RegionWithAggregate],
    search_text: &str,
    severity_filter: SeverityFilter,
) -> Vec<RegionWithAggregate> {
    let needle = search_text.to_lowercase();

    let mut projected: Vec<RegionWithAggregate> = regions
        .iter()
        .filter(|r| needle.is_empty() || r.name().to_lowercase().contains(&needle))
        .filter(|r| severity_filter.matches(r.tier()))
        .cloned()
        .collect();

    projected.sort_by(|a, b| {
        b.count()
            .cmp(&a.count())
            .then_with(|| a.name().cmp(b.name()))
    });

    projected
}

/// One legend row per tier, most severe first, with the number of regions
/// currently in each tier. Tiers with no regions are still listed.
#[must_use]
pub fn legend(regions: &[RegionWithAggregate]) -> Vec<LegendEntry> {
    SeverityTier::all()
        .iter()
        .rev()
        .map(|&tier| LegendEntry {
            tier,
            label: tier.label(),
            color: tier_color(tier),
            region_count: regions.iter().filter(|r| r.tier() == tier).count(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use feedback_map_analytics_models::{AggregateSample, SentimentBreakdown};
    use feedback_map_geography_models::Region;

    use super::*;
    use crate::classify::classify;

    fn row(name: &str, count: u64, negative: u64, max: u64) -> RegionWithAggregate {
        let sample = AggregateSample::new(name, count, SentimentBreakdown::new(0, negative, 0));
        RegionWithAggregate {
            region: Region::new(name, 0.0, 0.0),
            classification: classify(&sample, max),
            sample,
        }
    }

    fn names(rows: &[RegionWithAggregate]) -> Vec<&str> {
        rows.iter().map(RegionWithAggregate::name).collect()
    }

    fn fixture() -> Vec<RegionWithAggregate> {
        vec![
            row("Kisumu", 30, 2, 100),
            row("Nairobi", 100, 60, 100),
            row("Mombasa", 20, 2, 100),
            row("Kiambu", 30, 20, 100),
            row("Lamu", 0, 0, 100),
        ]
    }

    #[test]
    fn sorted_by_count_then_name() {
        let projected = project(&fixture(), "", SeverityFilter::All);
        assert_eq!(
            names(&projected),
            vec!["Nairobi", "Kiambu", "Kisumu", "Mombasa", "Lamu"]
        );
        for pair in projected.windows(2) {
            assert!(pair[0].count() >= pair[1].count());
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let projected = project(&fixture(), "KI", SeverityFilter::All);
        assert_eq!(names(&projected), vec!["Kiambu", "Kisumu"]);

        assert!(project(&fixture(), "zzz", SeverityFilter::All).is_empty());
    }

    #[test]
    fn search_keeps_surrounding_whitespace() {
        let rows = vec![row("Trans Nzoia", 10, 0, 100), row("Nzoia", 20, 0, 100)];

        let projected = project(&rows, " Nzoia", SeverityFilter::All);
        assert_eq!(names(&projected), vec!["Trans Nzoia"]);

        let projected = project(&rows, "nzoia", SeverityFilter::All);
        assert_eq!(names(&projected), vec!["Nzoia", "Trans Nzoia"]);

        assert!(project(&rows, "  ", SeverityFilter::All).is_empty());
    }

    #[test]
    fn severity_filter_is_exact() {
        let all = fixture();
        for tier in SeverityTier::all() {
            let projected = project(&all, "", SeverityFilter::Tier(*tier));
            assert!(projected.iter().all(|r| r.tier() == *tier), "{tier:?}");
        }
        let critical = project(&all, "", SeverityFilter::Tier(SeverityTier::Critical));
        assert_eq!(names(&critical), vec!["Nairobi"]);
    }

    #[test]
    fn all_zero_counts_sort_by_name() {
        let rows = vec![row("Nyeri", 0, 0, 1), row("Embu", 0, 0, 1), row("Meru", 0, 0, 1)];
        let projected = project(&rows, "", SeverityFilter::All);
        assert_eq!(names(&projected), vec!["Embu", "Meru", "Nyeri"]);
        assert!(projected.iter().all(|r| r.tier() == SeverityTier::NoData));
    }

    #[test]
    fn legend_lists_every_tier_most_severe_first() {
        let entries = legend(&fixture());
        assert_eq!(entries.len(), SeverityTier::all().len());
        assert_eq!(entries[0].tier, SeverityTier::Critical);
        assert_eq!(entries.last().unwrap().tier, SeverityTier::NoData);
        for pair in entries.windows(2) {
            assert!(pair[0].tier.rank() >= pair[1].tier.rank());
        }

        let count_of = |tier| {
            entries
                .iter()
                .find(|e| e.tier == tier)
                .map(|e| e.region_count)
                .unwrap()
        };
        assert_eq!(count_of(SeverityTier::Critical), 1);
        assert_eq!(count_of(SeverityTier::NoData), 1);
        assert_eq!(count_of(SeverityTier::High), 0);
        assert_eq!(entries.iter().map(|e| e.region_count).sum::<usize>(), 5);
    }
}
