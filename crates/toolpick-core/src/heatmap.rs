use serde::Serialize;

use crate::attribute::Attribute;
use crate::record::{Scenario, ToolCard};
use crate::scoring::attribute_difference;

/// Mean absolute rating-vs-target gap for one attribute across a batch of
/// responses, plus how many responses contributed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttributeHeatmap {
    pub attribute: Attribute,
    pub avg_difference: f64,
    pub count: u64,
}

/// Summarize where picks diverge from scenario targets, one entry per
/// attribute in canonical order. Deliberately unweighted, unlike accuracy:
/// this is the diagnostic view of raw mismatch, so a zero-weight attribute
/// still shows up. An empty batch yields zeroed entries, never NaN.
pub fn calculate_attribute_heatmap(pairs: &[(&ToolCard, &Scenario)]) -> Vec<AttributeHeatmap> {
    let count = pairs.len() as u64;
    Attribute::ALL
        .into_iter()
        .map(|attribute| {
            let total: f64 = pairs
                .iter()
                .map(|(tool, scenario)| attribute_difference(tool, scenario, attribute))
                .sum();
            let avg_difference = if count > 0 {
                total / (count as f64)
            } else {
                0.0
            };
            AttributeHeatmap {
                attribute,
                avg_difference,
                count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValues;
    use crate::record::{ToolCategory, DEFAULT_TMAX_SECONDS};

    fn values(v: f64) -> AttributeValues {
        AttributeValues {
            ease: v,
            flexibility: v,
            collaboration: v,
            privacy: v,
            cost: v,
            speed: v,
            integrations: v,
            code: v,
            application: v.min(4.0),
            a11y: v,
        }
    }

    fn tool_with(ratings: AttributeValues) -> ToolCard {
        ToolCard {
            id: "tool-a".to_string(),
            name: "Tool A".to_string(),
            category: ToolCategory::NoCode,
            ratings,
            notes: String::new(),
        }
    }

    fn scenario_with(targets: AttributeValues) -> Scenario {
        Scenario {
            id: "scenario-a".to_string(),
            title: "Scenario A".to_string(),
            description: String::new(),
            targets,
            weights: values(1.0),
            tmax: DEFAULT_TMAX_SECONDS,
        }
    }

    #[test]
    fn empty_batch_yields_zeroed_entries() {
        let heatmap = calculate_attribute_heatmap(&[]);
        assert_eq!(heatmap.len(), 10);
        for entry in heatmap {
            assert_eq!(entry.avg_difference, 0.0);
            assert_eq!(entry.count, 0);
        }
    }

    #[test]
    fn exact_match_pair_has_zero_differences() {
        let tool = tool_with(values(3.0));
        let scenario = scenario_with(values(3.0));
        let heatmap = calculate_attribute_heatmap(&[(&tool, &scenario)]);
        for entry in heatmap {
            assert_eq!(entry.avg_difference, 0.0);
            assert_eq!(entry.count, 1);
        }
    }

    #[test]
    fn averages_are_per_attribute_and_unweighted() {
        let mut ratings = values(3.0);
        ratings.ease = 5.0;
        let far = tool_with(ratings);
        let near = tool_with(values(3.0));
        let mut scenario = scenario_with(values(3.0));
        // Zero weight on ease must not hide the mismatch from the heatmap.
        scenario.weights.ease = 0.0;

        let heatmap = calculate_attribute_heatmap(&[(&far, &scenario), (&near, &scenario)]);
        let ease = heatmap
            .iter()
            .find(|entry| entry.attribute == Attribute::Ease)
            .expect("ease entry");
        assert_eq!(ease.avg_difference, 1.0);
        assert_eq!(ease.count, 2);

        let cost = heatmap
            .iter()
            .find(|entry| entry.attribute == Attribute::Cost)
            .expect("cost entry");
        assert_eq!(cost.avg_difference, 0.0);
        assert_eq!(cost.count, 2);
    }
}
