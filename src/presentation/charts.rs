//! Chart specs derived from the churn aggregates, and the registry that owns
//! the live chart handles between refreshes.

use crate::domain::model::{ChurnAggregates, ChurnCounts};
use serde::Serialize;
use std::collections::BTreeMap;

const STAYED_COLOR: &str = "#36a2eb";
const CHURNED_COLOR: &str = "#ff6384";
const THIRD_COLOR: &str = "#ffcd56";
const STAYED_LABEL: &str = "Still active";
const CHURNED_LABEL: &str = "Cancelled";

pub const CHURN_PIE: &str = "churn_pie";
pub const GENDER_BAR: &str = "gender_bar";
pub const SUBSCRIPTION_TYPE_BAR: &str = "subscription_type_bar";
pub const SUBSCRIPTION_TYPE_DOUGHNUT: &str = "subscription_type_doughnut";
pub const CONTRACT_LENGTH_BAR: &str = "contract_length_bar";
pub const GENDER_RADAR: &str = "gender_radar";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Doughnut,
    Radar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<usize>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub stacked: bool,
}

/// A rendered chart that must be torn down before it is replaced.
pub trait ChartHandle {
    fn spec(&self) -> &ChartSpec;
    fn destroy(&mut self);
}

/// Handle for charts that only exist as serialized specs.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    spec: ChartSpec,
    destroyed: bool,
}

impl RenderedChart {
    pub fn new(spec: ChartSpec) -> Self {
        Self {
            spec,
            destroyed: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl ChartHandle for RenderedChart {
    fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    fn destroy(&mut self) {
        tracing::debug!("🗑️ Disposing chart '{}'", self.spec.title);
        self.destroyed = true;
    }
}

/// Named chart handles. At most one live handle per name.
pub struct ChartRegistry<H: ChartHandle> {
    charts: BTreeMap<String, H>,
}

impl<H: ChartHandle> Default for ChartRegistry<H> {
    fn default() -> Self {
        Self {
            charts: BTreeMap::new(),
        }
    }
}

impl<H: ChartHandle> ChartRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handle` under `name`, destroying the handle it replaces.
    pub fn replace(&mut self, name: impl Into<String>, handle: H) {
        if let Some(mut previous) = self.charts.insert(name.into(), handle) {
            previous.destroy();
        }
    }

    pub fn get(&self, name: &str) -> Option<&H> {
        self.charts.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.charts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn specs(&self) -> BTreeMap<&str, &ChartSpec> {
        self.charts
            .iter()
            .map(|(name, handle)| (name.as_str(), handle.spec()))
            .collect()
    }

    pub fn clear(&mut self) {
        for (_, mut handle) in std::mem::take(&mut self.charts) {
            handle.destroy();
        }
    }
}

/// Recreates all six charts from `aggregates`. With no records the existing
/// charts are left as they are and `false` is returned.
pub fn refresh_charts<H, F>(
    registry: &mut ChartRegistry<H>,
    aggregates: &ChurnAggregates,
    mut create: F,
) -> bool
where
    H: ChartHandle,
    F: FnMut(ChartSpec) -> H,
{
    if aggregates.total == 0 {
        tracing::error!("❌ No data to chart");
        return false;
    }

    for (name, spec) in build_chart_specs(aggregates) {
        registry.replace(name, create(spec));
    }
    true
}

pub fn build_chart_specs(aggregates: &ChurnAggregates) -> Vec<(&'static str, ChartSpec)> {
    let gender = [
        ("Male".to_string(), aggregates.gender.male),
        ("Female".to_string(), aggregates.gender.female),
    ];
    let subscription: Vec<(String, ChurnCounts)> = aggregates
        .subscription_type
        .iter()
        .map(|(label, counts)| (label.clone(), *counts))
        .collect();
    let contract: Vec<(String, ChurnCounts)> = aggregates
        .contract_length
        .iter()
        .map(|(label, counts)| (label.clone(), *counts))
        .collect();

    vec![
        (
            CHURN_PIE,
            ChartSpec {
                kind: ChartKind::Pie,
                title: "Churn distribution".to_string(),
                labels: vec![STAYED_LABEL.to_string(), CHURNED_LABEL.to_string()],
                datasets: vec![Dataset {
                    label: None,
                    data: vec![aggregates.stayed, aggregates.churned],
                    colors: vec![STAYED_COLOR.to_string(), CHURNED_COLOR.to_string()],
                }],
                stacked: false,
            },
        ),
        (GENDER_BAR, stacked_bar("Churn by gender", &gender)),
        (
            SUBSCRIPTION_TYPE_BAR,
            stacked_bar("Churn by subscription type", &subscription),
        ),
        (
            SUBSCRIPTION_TYPE_DOUGHNUT,
            ChartSpec {
                kind: ChartKind::Doughnut,
                title: "Customers by subscription type".to_string(),
                labels: subscription.iter().map(|(label, _)| label.clone()).collect(),
                datasets: vec![Dataset {
                    label: None,
                    data: subscription.iter().map(|(_, c)| c.total()).collect(),
                    colors: vec![
                        STAYED_COLOR.to_string(),
                        CHURNED_COLOR.to_string(),
                        THIRD_COLOR.to_string(),
                    ],
                }],
                stacked: false,
            },
        ),
        (
            CONTRACT_LENGTH_BAR,
            stacked_bar("Churn by contract length", &contract),
        ),
        (
            GENDER_RADAR,
            ChartSpec {
                kind: ChartKind::Radar,
                title: "Gender comparison".to_string(),
                labels: vec![STAYED_LABEL.to_string(), CHURNED_LABEL.to_string()],
                datasets: vec![
                    Dataset {
                        label: Some("Men".to_string()),
                        data: vec![aggregates.gender.male.stayed, aggregates.gender.male.churned],
                        colors: vec![STAYED_COLOR.to_string()],
                    },
                    Dataset {
                        label: Some("Women".to_string()),
                        data: vec![
                            aggregates.gender.female.stayed,
                            aggregates.gender.female.churned,
                        ],
                        colors: vec![CHURNED_COLOR.to_string()],
                    },
                ],
                stacked: false,
            },
        ),
    ]
}

fn stacked_bar(title: &str, categories: &[(String, ChurnCounts)]) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Bar,
        title: title.to_string(),
        labels: categories.iter().map(|(label, _)| label.clone()).collect(),
        datasets: vec![
            Dataset {
                label: Some(STAYED_LABEL.to_string()),
                data: categories.iter().map(|(_, c)| c.stayed).collect(),
                colors: vec![STAYED_COLOR.to_string()],
            },
            Dataset {
                label: Some(CHURNED_LABEL.to_string()),
                data: categories.iter().map(|(_, c)| c.churned).collect(),
                colors: vec![CHURNED_COLOR.to_string()],
            },
        ],
        stacked: true,
    }
}
